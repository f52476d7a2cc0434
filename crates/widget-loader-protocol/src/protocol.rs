//! Message envelope codec.
//!
//! The page-wide message channel carries traffic from unrelated senders, so
//! decoding is a filter first: anything that is not JSON, or lacks a truthy
//! marker field, is simply not ours.

use serde::Serialize;
use serde_json::{Map, Value};

/// Field that tags a message as belonging to the widget protocol.
pub const MARKER_FIELD: &str = "moneyDesktop";

/// Typed protocol message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetMessage {
    /// Widget → host: the widget page is ready.
    Load,
    /// Host → widget: per-widget configuration.
    Configure { options: Map<String, Value> },
    /// Host → every widget: end the session.
    Logout,
    /// Host → every widget: liveness probe.
    Ping,
}

impl WidgetMessage {
    /// Wire name of this message's `type`.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Load => MessageKind::Load,
            Self::Configure { .. } => MessageKind::Configure,
            Self::Logout => MessageKind::Logout,
            Self::Ping => MessageKind::Ping,
        }
    }
}

/// Value of an envelope's `type` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Load,
    Configure,
    Logout,
    Ping,
    /// Marked as ours, but not a type this side understands.
    Other(String),
}

impl MessageKind {
    fn parse(kind: &str) -> Self {
        match kind {
            "load" => Self::Load,
            "configure" => Self::Configure,
            "logout" => Self::Logout,
            "ping" => Self::Ping,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Load => "load",
            Self::Configure => "configure",
            Self::Logout => "logout",
            Self::Ping => "ping",
            Self::Other(kind) => kind,
        }
    }
}

/// A decoded protocol message.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// The `type` field.
    pub kind: MessageKind,
    /// Every other field except the marker.
    pub payload: Map<String, Value>,
}

impl Envelope {
    /// The `options` object carried by a `configure` message.
    #[must_use]
    pub fn options(&self) -> Option<&Map<String, Value>> {
        match self.kind {
            MessageKind::Configure => self.payload.get("options").and_then(Value::as_object),
            _ => None,
        }
    }

    /// Convert into a typed message, if the kind is known.
    #[must_use]
    pub fn into_message(self) -> Option<WidgetMessage> {
        match self.kind {
            MessageKind::Load => Some(WidgetMessage::Load),
            MessageKind::Configure => {
                let options = match self.payload.get("options") {
                    Some(Value::Object(options)) => options.clone(),
                    _ => Map::new(),
                };
                Some(WidgetMessage::Configure { options })
            }
            MessageKind::Logout => Some(WidgetMessage::Logout),
            MessageKind::Ping => Some(WidgetMessage::Ping),
            MessageKind::Other(_) => None,
        }
    }
}

/// Decode a raw channel message.
///
/// Returns `None` for anything that is not a marked protocol envelope.
#[must_use]
pub fn decode(raw: &str) -> Option<Envelope> {
    let Value::Object(mut fields) = serde_json::from_str::<Value>(raw).ok()? else {
        return None;
    };

    if !fields.remove(MARKER_FIELD).is_some_and(|marker| is_truthy(&marker)) {
        return None;
    }

    let kind = match fields.remove("type")? {
        Value::String(kind) => MessageKind::parse(&kind),
        _ => return None,
    };

    Some(Envelope {
        kind,
        payload: fields,
    })
}

#[derive(Serialize)]
struct Wire<'a> {
    #[serde(rename = "moneyDesktop")]
    marker: bool,
    #[serde(flatten)]
    message: &'a WidgetMessage,
}

/// Encode a message with the protocol marker set.
///
/// # Errors
/// Returns error if an option value cannot be serialized.
pub fn encode(message: &WidgetMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Wire {
        marker: true,
        message,
    })
}

/// Truthiness as the widget pages evaluate the marker.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_load() {
        let envelope = decode(r#"{"moneyDesktop":true,"type":"load"}"#).unwrap();
        assert_eq!(envelope.kind, MessageKind::Load);
        assert!(envelope.payload.is_empty());
        assert_eq!(envelope.into_message(), Some(WidgetMessage::Load));
    }

    #[test]
    fn test_decode_ignores_foreign_traffic() {
        assert!(decode("not json at all").is_none());
        assert!(decode("").is_none());
        assert!(decode("[1,2,3]").is_none());
        assert!(decode(r#""moneyDesktop""#).is_none());
        assert!(decode(r#"{"type":"load"}"#).is_none());
        assert!(decode(r#"{"moneyDesktop":false,"type":"load"}"#).is_none());
        assert!(decode(r#"{"moneyDesktop":0,"type":"load"}"#).is_none());
        assert!(decode(r#"{"moneyDesktop":"","type":"load"}"#).is_none());
        assert!(decode(r#"{"moneyDesktop":null,"type":"load"}"#).is_none());
    }

    #[test]
    fn test_decode_requires_string_type() {
        assert!(decode(r#"{"moneyDesktop":true}"#).is_none());
        assert!(decode(r#"{"moneyDesktop":true,"type":7}"#).is_none());
    }

    #[test]
    fn test_decode_accepts_truthy_markers() {
        for marker in ["1", "\"yes\"", "{}", "[]", "-2.5"] {
            let raw = format!(r#"{{"moneyDesktop":{marker},"type":"ping"}}"#);
            assert_eq!(decode(&raw).map(|e| e.kind), Some(MessageKind::Ping), "{raw}");
        }
    }

    #[test]
    fn test_decode_unknown_type_keeps_payload() {
        let envelope = decode(r#"{"moneyDesktop":true,"type":"resize","height":420}"#).unwrap();
        assert_eq!(envelope.kind, MessageKind::Other("resize".to_string()));
        assert_eq!(envelope.payload.get("height"), Some(&json!(420)));
        assert!(envelope.into_message().is_none());
    }

    #[test]
    fn test_encode_configure() {
        let mut options = Map::new();
        options.insert("theme".to_string(), json!("dark"));
        let raw = encode(&WidgetMessage::Configure { options }).unwrap();

        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            json!({ "moneyDesktop": true, "type": "configure", "options": { "theme": "dark" } })
        );

        let envelope = decode(&raw).unwrap();
        assert_eq!(envelope.options().and_then(|o| o.get("theme")), Some(&json!("dark")));
    }

    #[test]
    fn test_encode_broadcast_commands() {
        let logout: Value = serde_json::from_str(&encode(&WidgetMessage::Logout).unwrap()).unwrap();
        assert_eq!(logout, json!({ "moneyDesktop": true, "type": "logout" }));

        let ping: Value = serde_json::from_str(&encode(&WidgetMessage::Ping).unwrap()).unwrap();
        assert_eq!(ping, json!({ "moneyDesktop": true, "type": "ping" }));
    }
}
