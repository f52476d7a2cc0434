//! End-to-end scenarios for the widget loader against the in-memory page.

use std::sync::Arc;

use serde_json::{Value, json};
use widget_loader::{
    LoaderState, WidgetLoader,
    dom::{MemoryDocument, MemoryOutbox},
    find_containers,
};
use widget_loader_core::{ElementId, HostDocument, HostEvent, LoaderOptions, MessageEvent, WindowId};
use widget_loader_protocol::WidgetMessage;

const LOAD: &str = r#"{"moneyDesktop":true,"type":"load"}"#;

struct Page {
    doc: Arc<MemoryDocument>,
    outbox: Arc<MemoryOutbox>,
    loader: WidgetLoader<MemoryDocument, MemoryOutbox>,
}

impl Page {
    fn new() -> Self {
        let doc = Arc::new(MemoryDocument::new());
        let outbox = Arc::new(MemoryOutbox::new());
        let loader = WidgetLoader::new(
            LoaderOptions::default().with_autoload(false),
            Arc::clone(&doc),
            Arc::clone(&outbox),
        );
        Self { doc, outbox, loader }
    }

    fn placeholder(&self, attributes: &[(&str, &str)]) -> ElementId {
        let mut all = vec![("class", "md-widget")];
        all.extend_from_slice(attributes);
        let element = self.doc.append_element(self.doc.body(), "div", &all).unwrap();
        self.doc.set_text(element, "Loading...").unwrap();
        element
    }

    fn window_of(&self, index: usize) -> WindowId {
        self.loader.registry().iter().nth(index).unwrap().frame.content_window
    }
}

fn parse(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap()
}

#[test]
fn test_single_placeholder_scenario() {
    let mut page = Page::new();
    let container = page.placeholder(&[("data-url", "https://w.example.com/x"), ("data-width", "50%")]);

    assert_eq!(page.loader.load().unwrap(), 1);
    assert_eq!(page.loader.state(), LoaderState::Loaded);

    let record = page.loader.registry().iter().next().unwrap();
    assert_eq!(record.url, "https://w.example.com/x");
    assert_eq!(record.container, container);
    assert!(!record.is_loaded());

    let frame = record.frame.element;
    assert_eq!(page.doc.children(container).unwrap(), vec![frame]);
    assert_eq!(page.doc.attribute(frame, "width").unwrap().as_deref(), Some("50%"));
    assert_eq!(page.doc.attribute(frame, "height").unwrap().as_deref(), Some("600"));
}

#[test]
fn test_placeholder_without_url_is_skipped() {
    let mut page = Page::new();
    page.placeholder(&[("data-url", "https://w.example.com/x")]);
    let skipped = page.placeholder(&[]);

    assert_eq!(page.loader.load().unwrap(), 1);
    assert_eq!(page.loader.registry().len(), 1);
    assert!(page.doc.children(skipped).unwrap().is_empty());
    assert_eq!(page.doc.text(skipped).unwrap(), "Loading...");
}

#[test]
fn test_discovery_matches_exactly_the_valid_placeholders() {
    let page = Page::new();
    let a = page.placeholder(&[("data-url", "https://a.example.com")]);
    page.placeholder(&[("data-url", "")]);
    page.doc
        .append_element(page.doc.body(), "div", &[("data-url", "https://stray.example.com")])
        .unwrap();
    let b = page.placeholder(&[("data-url", "/b")]);

    let found: Vec<ElementId> = find_containers(page.doc.as_ref(), "md-widget")
        .unwrap()
        .into_iter()
        .map(|d| d.element)
        .collect();
    assert_eq!(found, vec![a, b]);
}

#[test]
fn test_load_message_configures_only_its_frame() {
    let mut page = Page::new();
    page.placeholder(&[
        ("data-url", "https://a.example.com/widget"),
        ("data-options", r#"{"mode":"accounts","limit":5}"#),
    ]);
    page.placeholder(&[("data-url", "https://b.example.com/widget")]);
    page.loader.load().unwrap();
    let first = page.window_of(0);

    assert!(page.loader.handle_message(&MessageEvent::new(LOAD, "https://a.example.com", Some(first))));

    let records: Vec<_> = page.loader.registry().iter().collect();
    assert!(records[0].is_loaded());
    assert!(!records[1].is_loaded());

    let posted = page.outbox.messages();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].target, first);
    assert_eq!(posted[0].target_origin, "https://a.example.com");
    assert_eq!(
        parse(&posted[0].data),
        json!({
            "moneyDesktop": true,
            "type": "configure",
            "options": { "mode": "accounts", "limit": 5 }
        })
    );
}

#[test]
fn test_repeated_load_reconfigures_without_new_transition() {
    let mut page = Page::new();
    page.placeholder(&[("data-url", "https://a.example.com/widget")]);
    page.loader.load().unwrap();
    let window = page.window_of(0);

    page.loader.handle_message(&MessageEvent::new(LOAD, "https://a.example.com", Some(window)));
    page.loader.handle_message(&MessageEvent::new(LOAD, "https://a.example.com", Some(window)));

    assert!(page.loader.registry().iter().next().unwrap().is_loaded());
    assert_eq!(page.outbox.messages_to(window).len(), 2);
}

#[test]
fn test_unmarked_messages_never_touch_state() {
    let mut page = Page::new();
    page.placeholder(&[("data-url", "https://a.example.com/widget")]);
    page.loader.load().unwrap();
    let window = page.window_of(0);

    for data in [
        r#"{"type":"load"}"#,
        r#"{"moneyDesktop":false,"type":"load"}"#,
        "webpackHotUpdate",
        r#"{"source":"react-devtools","payload":{}}"#,
        "",
    ] {
        assert!(!page.loader.handle_message(&MessageEvent::new(data, "https://a.example.com", Some(window))));
    }

    assert!(!page.loader.registry().iter().next().unwrap().is_loaded());
    assert!(page.outbox.is_empty());
}

#[test]
fn test_ping_reaches_every_frame_at_its_origin() {
    let mut page = Page::new();
    page.placeholder(&[("data-url", "https://a.example.com/widget")]);
    page.placeholder(&[("data-url", "http://localhost:3000/widget")]);
    page.placeholder(&[("data-url", "/relative/path")]);
    page.loader.load().unwrap();

    assert_eq!(page.loader.ping().unwrap(), 3);

    let posted = page.outbox.messages();
    let origins: Vec<&str> = posted.iter().map(|m| m.target_origin.as_str()).collect();
    assert_eq!(origins, vec!["https://a.example.com", "http://localhost:3000", "*"]);
    for (index, message) in posted.iter().enumerate() {
        assert_eq!(message.target, page.window_of(index));
        assert_eq!(parse(&message.data), json!({ "moneyDesktop": true, "type": "ping" }));
    }
}

#[test]
fn test_logout_skips_unreachable_frames() {
    let mut page = Page::new();
    page.placeholder(&[("data-url", "https://a.example.com/widget")]);
    page.placeholder(&[("data-url", "https://b.example.com/widget")]);
    page.loader.load().unwrap();
    page.outbox.close_window(page.window_of(0));

    assert_eq!(page.loader.logout().unwrap(), 1);
    let posted = page.outbox.messages();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].target, page.window_of(1));
}

#[test]
fn test_reload_replaces_registry() {
    let mut page = Page::new();
    page.placeholder(&[("data-url", "https://a.example.com/widget")]);
    page.placeholder(&[("data-url", "https://b.example.com/widget")]);

    assert_eq!(page.loader.load().unwrap(), 2);
    let first_pass: Vec<_> = page.loader.registry().iter().map(|r| r.id).collect();
    assert_eq!(page.loader.load().unwrap(), 2);
    let second_pass: Vec<_> = page.loader.registry().iter().map(|r| r.id).collect();

    assert_eq!(page.loader.registry().len(), 2);
    assert!(second_pass.iter().all(|id| !first_pass.contains(id)));
}

#[test]
fn test_frame_navigation_marks_container() {
    let mut page = Page::new();
    let container = page.placeholder(&[("data-url", "https://a.example.com/widget")]);
    page.loader.load().unwrap();
    let frame = page.loader.registry().iter().next().unwrap().frame.element;

    page.loader.handle_event(&HostEvent::FrameLoaded { frame });

    assert!(page.doc.has_class(container, "md-widget-loaded").unwrap());
    assert_eq!(page.doc.attribute(container, "data-loaded").unwrap().as_deref(), Some("true"));
    assert!(!page.loader.registry().iter().next().unwrap().is_loaded());
}

#[test]
fn test_custom_marker_class() {
    let doc = Arc::new(MemoryDocument::new());
    let outbox = Arc::new(MemoryOutbox::new());
    doc.append_element(doc.body(), "div", &[("class", "acme"), ("data-url", "https://a.example.com")])
        .unwrap();
    doc.append_element(doc.body(), "div", &[("class", "md-widget"), ("data-url", "https://b.example.com")])
        .unwrap();
    let mut loader = WidgetLoader::new(
        LoaderOptions::default().with_class_name("acme"),
        Arc::clone(&doc),
        outbox,
    );

    assert_eq!(loader.load().unwrap(), 1);
    assert_eq!(loader.registry().iter().next().unwrap().url, "https://a.example.com");
}

#[test]
fn test_dispose_releases_frames() {
    let mut page = Page::new();
    page.placeholder(&[("data-url", "https://a.example.com/widget")]);
    page.loader.load().unwrap();
    let window = page.window_of(0);

    page.loader.dispose();

    assert!(page.loader.registry().is_empty());
    assert!(!page.loader.handle_message(&MessageEvent::new(LOAD, "https://a.example.com", Some(window))));
    assert!(page.loader.broadcast(&WidgetMessage::Ping).is_err());
    assert!(page.outbox.is_empty());
    assert_eq!(page.doc.frames().unwrap().len(), 1);
}
