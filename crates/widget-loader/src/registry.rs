//! Per-loader frame state.

use widget_loader_core::{ElementId, FrameHandle, FrameId, WidgetOptions, WindowId};

/// State for one embedded widget.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    /// Registry key.
    pub id: FrameId,
    /// The frame element and its content window.
    pub frame: FrameHandle,
    /// Options forwarded in `configure`.
    pub options: WidgetOptions,
    /// Placeholder hosting the frame. Only used for visual state.
    pub container: ElementId,
    /// Widget address.
    pub url: String,
    loaded: bool,
}

impl FrameRecord {
    /// Create a record that has not loaded yet.
    #[must_use]
    pub const fn new(
        id: FrameId,
        frame: FrameHandle,
        container: ElementId,
        url: String,
        options: WidgetOptions,
    ) -> Self {
        Self {
            id,
            frame,
            options,
            container,
            url,
            loaded: false,
        }
    }

    /// Whether the widget has announced itself with `load`.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Flag the widget as loaded. Returns `true` only on the first call.
    pub const fn mark_loaded(&mut self) -> bool {
        let first = !self.loaded;
        self.loaded = true;
        first
    }
}

/// Frames created by one `load()` pass, in registration order.
///
/// Inbound messages identify their sender only by window, so lookups scan
/// every record. Pages hold a handful of widgets at most.
#[derive(Debug, Default)]
pub struct FrameRegistry {
    records: Vec<FrameRecord>,
}

impl FrameRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record.
    ///
    /// Ids come from a process-wide counter and never collide; a collision
    /// panics in debug builds and replaces the old record otherwise.
    pub fn register(&mut self, record: FrameRecord) {
        let existing = self.records.iter().position(|r| r.id == record.id);
        debug_assert!(existing.is_none(), "duplicate frame id {}", record.id);

        match existing {
            Some(index) => self.records[index] = record,
            None => self.records.push(record),
        }
    }

    /// Find the record whose content window is `window`.
    pub fn lookup_by_sender(&mut self, window: WindowId) -> Option<&mut FrameRecord> {
        self.records
            .iter_mut()
            .find(|r| r.frame.content_window == window)
    }

    /// Get a record by id.
    #[must_use]
    pub fn get(&self, id: FrameId) -> Option<&FrameRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Iterate records in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FrameRecord> {
        self.records.iter()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Release every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl<'a> IntoIterator for &'a FrameRegistry {
    type Item = &'a FrameRecord;
    type IntoIter = std::slice::Iter<'a, FrameRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
