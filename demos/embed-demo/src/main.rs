//! Embeds a widget into an in-memory page and plays the widget's side of
//! the handshake.
//!
//! Run with: cargo run -p embed-demo
//!
//! Set `RUST_LOG=debug` to see every protocol message.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use widget_loader::dom::{MemoryDocument, MemoryOutbox};
use widget_loader_core::{DomError, EventBus, HostEvent};
use widget_loader_host::{
    GlobalSlot, LoaderConstructor, ScriptBootstrap, ScriptElementInjector, ScriptInjector,
    StaticUrlSource, WidgetHost,
};
use widget_loader_protocol::{TargetOrigin, WidgetMessage, decode, encode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let document = Arc::new(MemoryDocument::new());
    let outbox = Arc::new(MemoryOutbox::new());
    let bus = EventBus::new();
    let root = document
        .append_element(document.body(), "div", &[("class", "container")])
        .context("create host root")?;

    // The loader script "arrives" a little after it is injected.
    let slot = GlobalSlot::new();
    let script_tags = ScriptElementInjector::new(Arc::clone(&document), root);
    let constructor = LoaderConstructor::new(Arc::clone(&document), Arc::clone(&outbox));
    let loaded = slot.clone();
    let injector: Arc<dyn ScriptInjector> = Arc::new(move |src: &str| -> Result<(), DomError> {
        script_tags.inject(src)?;
        let loaded = loaded.clone();
        let constructor = constructor.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            loaded.set(constructor);
        });
        Ok(())
    });

    let mut host = WidgetHost::new(
        Arc::clone(&document),
        bus.clone(),
        root,
        ScriptBootstrap::new(slot, injector),
        StaticUrlSource::mock(),
    );
    host.mount().context("mount widget host")?;
    host.load().await.context("load widget")?;

    let frames = match host.loader() {
        Some(loader) => loader.frames().await,
        None => anyhow::bail!("widget host has no loader after load"),
    };

    // Play the widget: finish navigating, then announce readiness.
    for frame in &frames {
        bus.dispatch(HostEvent::FrameLoaded {
            frame: frame.frame.element,
        });
        let origin = TargetOrigin::for_url(&frame.url);
        bus.post_message(
            Some(frame.frame.content_window),
            origin.as_str(),
            encode(&WidgetMessage::Load).context("encode load")?,
        );
    }
    // Unrelated page chatter is ignored.
    bus.post_message(None, "https://ads.example.net", "{\"cmd\":\"refresh\"}");
    tokio::time::sleep(Duration::from_millis(50)).await;

    if let Some(loader) = host.loader() {
        loader.ping().await.context("ping widgets")?;
        loader.logout().await.context("log widgets out")?;
    }

    for message in outbox.messages() {
        let kind = decode(&message.data).map(|e| e.kind.as_str().to_string());
        tracing::info!(
            target_window = %message.target,
            origin = %message.target_origin,
            kind = kind.as_deref().unwrap_or("?"),
            "Delivered to widget"
        );
    }

    host.unmount().await;
    tracing::info!(listeners = bus.listener_count(), "Widget host unmounted");
    Ok(())
}
