//! Placeholder discovery.

use widget_loader_core::{DomError, ElementId, HostDocument};

/// Widget address attribute. Required.
pub const URL_ATTR: &str = "data-url";
/// Frame width attribute.
pub const WIDTH_ATTR: &str = "data-width";
/// Frame height attribute.
pub const HEIGHT_ATTR: &str = "data-height";
/// JSON object forwarded to the widget in `configure`.
pub const OPTIONS_ATTR: &str = "data-options";

/// A placeholder eligible for a widget frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderDescriptor {
    /// The placeholder element.
    pub element: ElementId,
    /// Non-empty widget address.
    pub url: String,
    /// Requested frame width.
    pub width: Option<String>,
    /// Requested frame height.
    pub height: Option<String>,
    /// Raw `data-options` JSON.
    pub options: Option<String>,
}

/// Find every element carrying `class_name` and a non-empty `data-url`.
///
/// Results are in document order. The document is only read.
///
/// # Errors
/// Returns error if the document cannot be read.
pub fn find_containers<D>(
    document: &D,
    class_name: &str,
) -> Result<Vec<PlaceholderDescriptor>, DomError>
where
    D: HostDocument + ?Sized,
{
    let mut found = Vec::new();

    for element in document.elements_with_class(class_name)? {
        let Some(url) = non_empty(document.attribute(element, URL_ATTR)?) else {
            continue;
        };

        found.push(PlaceholderDescriptor {
            element,
            url,
            width: non_empty(document.attribute(element, WIDTH_ATTR)?),
            height: non_empty(document.attribute(element, HEIGHT_ATTR)?),
            options: non_empty(document.attribute(element, OPTIONS_ATTR)?),
        });
    }

    Ok(found)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;

    #[test]
    fn test_only_marked_placeholders_with_url() {
        let doc = MemoryDocument::new();
        let body = doc.body();
        let first = doc
            .append_element(body, "div", &[("class", "md-widget"), ("data-url", "https://a.example.com")])
            .unwrap();
        doc.append_element(body, "div", &[("class", "md-widget")]).unwrap();
        doc.append_element(body, "div", &[("class", "md-widget"), ("data-url", "")]).unwrap();
        doc.append_element(body, "div", &[("class", "other"), ("data-url", "https://b.example.com")])
            .unwrap();
        let wrapper = doc.append_element(body, "section", &[]).unwrap();
        let nested = doc
            .append_element(
                wrapper,
                "div",
                &[("class", "card md-widget"), ("data-url", "/relative/path"), ("data-height", "300")],
            )
            .unwrap();

        let found = find_containers(&doc, "md-widget").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].element, first);
        assert_eq!(found[0].url, "https://a.example.com");
        assert_eq!(found[0].height, None);
        assert_eq!(found[1].element, nested);
        assert_eq!(found[1].height.as_deref(), Some("300"));
    }

    #[test]
    fn test_class_must_match_whole_token() {
        let doc = MemoryDocument::new();
        doc.append_element(
            doc.body(),
            "div",
            &[("class", "md-widget-loaded"), ("data-url", "https://a.example.com")],
        )
        .unwrap();

        assert!(find_containers(&doc, "md-widget").unwrap().is_empty());
    }

    #[test]
    fn test_empty_optional_attributes_are_absent() {
        let doc = MemoryDocument::new();
        doc.append_element(
            doc.body(),
            "div",
            &[
                ("class", "md-widget"),
                ("data-url", "https://a.example.com"),
                ("data-width", ""),
                ("data-options", ""),
            ],
        )
        .unwrap();

        let found = find_containers(&doc, "md-widget").unwrap();
        assert_eq!(found[0].width, None);
        assert_eq!(found[0].options, None);
    }
}
