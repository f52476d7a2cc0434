//! In-memory document and outbox.
//!
//! Useful for tests, demos and headless hosts. Nothing is rendered.
//! Replaced and removed elements are discarded, so a long-lived document
//! only holds what it still shows plus detached elements it has not
//! attached yet.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use widget_loader_core::{DomError, ElementId, FrameHandle, HostDocument, MessagePoster, WindowId};

const FRAME_TAG: &str = "iframe";

#[derive(Debug)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    children: Vec<ElementId>,
    parent: Option<ElementId>,
    text: String,
    content_window: Option<WindowId>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
            text: String::new(),
            content_window: None,
        }
    }

    fn has_class(&self, class_name: &str) -> bool {
        self.attributes
            .get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
    }
}

#[derive(Debug)]
struct Inner {
    nodes: HashMap<ElementId, Node>,
    next_id: u64,
}

impl Inner {
    fn node(&self, id: ElementId) -> Result<&Node, DomError> {
        self.nodes.get(&id).ok_or(DomError::NotFound(id))
    }

    fn node_mut(&mut self, id: ElementId) -> Result<&mut Node, DomError> {
        self.nodes.get_mut(&id).ok_or(DomError::NotFound(id))
    }

    fn insert(&mut self, node: Node) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    fn detach(&mut self, child: ElementId) -> Result<(), DomError> {
        if let Some(parent) = self.node_mut(child)?.parent.take() {
            self.node_mut(parent)?.children.retain(|c| *c != child);
        }
        Ok(())
    }

    /// Drop `root` and every descendant. `root` must already be detached.
    fn discard(&mut self, root: ElementId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                stack.extend(node.children);
            }
        }
    }
}

/// In-memory host document rooted at a `body` element.
///
/// Only elements attached under `body` are visible to class lookups.
#[derive(Debug)]
pub struct MemoryDocument {
    inner: RwLock<Inner>,
    body: ElementId,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create a document holding an empty `body`.
    #[must_use]
    pub fn new() -> Self {
        let mut inner = Inner {
            nodes: HashMap::new(),
            next_id: 0,
        };
        let body = inner.insert(Node::new("body"));
        Self {
            inner: RwLock::new(inner),
            body,
        }
    }

    /// The root element.
    #[must_use]
    pub const fn body(&self) -> ElementId {
        self.body
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, DomError> {
        self.inner
            .read()
            .map_err(|e| DomError::Internal(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, DomError> {
        self.inner
            .write()
            .map_err(|e| DomError::Internal(e.to_string()))
    }

    /// Create an element with `attributes` and append it to `parent`.
    ///
    /// # Errors
    /// Returns error if `parent` does not exist.
    pub fn append_element(
        &self,
        parent: ElementId,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> Result<ElementId, DomError> {
        let element = self.create_element(tag)?;
        for (name, value) in attributes {
            self.set_attribute(element, name, value)?;
        }
        self.append_child(parent, element)?;
        Ok(element)
    }

    /// Children of an element.
    ///
    /// # Errors
    /// Returns error if the element does not exist.
    pub fn children(&self, element: ElementId) -> Result<Vec<ElementId>, DomError> {
        Ok(self.read()?.node(element)?.children.clone())
    }

    /// Parent of an element.
    ///
    /// # Errors
    /// Returns error if the element does not exist.
    pub fn parent(&self, element: ElementId) -> Result<Option<ElementId>, DomError> {
        Ok(self.read()?.node(element)?.parent)
    }

    /// Text content of an element.
    ///
    /// # Errors
    /// Returns error if the element does not exist.
    pub fn text(&self, element: ElementId) -> Result<String, DomError> {
        Ok(self.read()?.node(element)?.text.clone())
    }

    /// Tag name of an element.
    ///
    /// # Errors
    /// Returns error if the element does not exist.
    pub fn tag(&self, element: ElementId) -> Result<String, DomError> {
        Ok(self.read()?.node(element)?.tag.clone())
    }

    /// Whether an element's class list contains `class_name`.
    ///
    /// # Errors
    /// Returns error if the element does not exist.
    pub fn has_class(&self, element: ElementId, class_name: &str) -> Result<bool, DomError> {
        Ok(self.read()?.node(element)?.has_class(class_name))
    }

    /// Content window of a frame element.
    ///
    /// # Errors
    /// Returns error if the element does not exist.
    pub fn content_window(&self, element: ElementId) -> Result<Option<WindowId>, DomError> {
        Ok(self.read()?.node(element)?.content_window)
    }

    /// Number of elements the document holds, attached or not.
    ///
    /// # Errors
    /// Returns error if the document lock is poisoned.
    pub fn node_count(&self) -> Result<usize, DomError> {
        Ok(self.read()?.nodes.len())
    }

    /// Every frame element currently attached under `body`, in document order.
    ///
    /// # Errors
    /// Returns error if the document lock is poisoned.
    pub fn frames(&self) -> Result<Vec<FrameHandle>, DomError> {
        let inner = self.read()?;
        let mut frames = Vec::new();
        walk(&inner, self.body, &mut |id, node| {
            if let Some(content_window) = node.content_window {
                frames.push(FrameHandle {
                    element: id,
                    content_window,
                });
            }
        })?;
        Ok(frames)
    }
}

/// Pre-order traversal from `root`.
fn walk<F>(inner: &Inner, root: ElementId, visit: &mut F) -> Result<(), DomError>
where
    F: FnMut(ElementId, &Node),
{
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let node = inner.node(id)?;
        visit(id, node);
        stack.extend(node.children.iter().rev());
    }
    Ok(())
}

impl HostDocument for MemoryDocument {
    fn elements_with_class(&self, class_name: &str) -> Result<Vec<ElementId>, DomError> {
        let inner = self.read()?;
        let mut found = Vec::new();
        walk(&inner, self.body, &mut |id, node| {
            if node.has_class(class_name) {
                found.push(id);
            }
        })?;
        Ok(found)
    }

    fn attribute(&self, element: ElementId, name: &str) -> Result<Option<String>, DomError> {
        Ok(self.read()?.node(element)?.attributes.get(name).cloned())
    }

    fn set_attribute(
        &self,
        element: ElementId,
        name: &str,
        value: &str,
    ) -> Result<(), DomError> {
        self.write()?
            .node_mut(element)?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn add_class(&self, element: ElementId, class_name: &str) -> Result<(), DomError> {
        let mut inner = self.write()?;
        let node = inner.node_mut(element)?;
        if node.has_class(class_name) {
            return Ok(());
        }

        let classes = node.attributes.entry("class".to_string()).or_default();
        if !classes.is_empty() {
            classes.push(' ');
        }
        classes.push_str(class_name);
        Ok(())
    }

    fn create_element(&self, tag: &str) -> Result<ElementId, DomError> {
        Ok(self.write()?.insert(Node::new(tag)))
    }

    fn create_frame(&self) -> Result<FrameHandle, DomError> {
        let content_window = WindowId::new();
        let mut node = Node::new(FRAME_TAG);
        node.content_window = Some(content_window);
        let element = self.write()?.insert(node);
        Ok(FrameHandle {
            element,
            content_window,
        })
    }

    fn append_child(&self, parent: ElementId, child: ElementId) -> Result<(), DomError> {
        let mut inner = self.write()?;
        inner.node(parent)?;
        inner.detach(child)?;
        inner.node_mut(child)?.parent = Some(parent);
        inner.node_mut(parent)?.children.push(child);
        Ok(())
    }

    fn replace_children(&self, parent: ElementId, child: ElementId) -> Result<(), DomError> {
        let mut inner = self.write()?;
        inner.node(child)?;
        inner.detach(child)?;

        let node = inner.node_mut(parent)?;
        node.text.clear();
        let old = std::mem::take(&mut node.children);
        for orphan in old {
            inner.discard(orphan);
        }

        inner.node_mut(child)?.parent = Some(parent);
        inner.node_mut(parent)?.children.push(child);
        Ok(())
    }

    fn set_text(&self, element: ElementId, text: &str) -> Result<(), DomError> {
        let mut inner = self.write()?;
        let node = inner.node_mut(element)?;
        node.text = text.to_string();
        Ok(())
    }

    fn remove(&self, element: ElementId) -> Result<(), DomError> {
        if element == self.body {
            return Err(DomError::Internal("cannot remove body".to_string()));
        }

        let mut inner = self.write()?;
        inner.detach(element)?;
        inner.discard(element);
        Ok(())
    }
}

/// A message handed to [`MemoryOutbox`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    /// Recipient window.
    pub target: WindowId,
    /// Raw payload.
    pub data: String,
    /// Origin the delivery was restricted to.
    pub target_origin: String,
}

/// Records every posted message instead of delivering it.
#[derive(Debug, Default)]
pub struct MemoryOutbox {
    posted: RwLock<Vec<PostedMessage>>,
    closed: RwLock<HashSet<WindowId>>,
}

impl MemoryOutbox {
    /// Create an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make later posts to `window` fail.
    pub fn close_window(&self, window: WindowId) {
        if let Ok(mut closed) = self.closed.write() {
            closed.insert(window);
        }
    }

    /// Snapshot of everything posted so far.
    #[must_use]
    pub fn messages(&self) -> Vec<PostedMessage> {
        self.posted.read().map(|p| p.clone()).unwrap_or_default()
    }

    /// Messages posted to one window.
    #[must_use]
    pub fn messages_to(&self, window: WindowId) -> Vec<PostedMessage> {
        self.messages()
            .into_iter()
            .filter(|m| m.target == window)
            .collect()
    }

    /// Remove and return everything posted so far.
    #[must_use]
    pub fn take(&self) -> Vec<PostedMessage> {
        self.posted
            .write()
            .map(|mut p| std::mem::take(&mut *p))
            .unwrap_or_default()
    }

    /// Number of posted messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.posted.read().map(|p| p.len()).unwrap_or(0)
    }

    /// Whether nothing has been posted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MessagePoster for MemoryOutbox {
    fn post_message(
        &self,
        target: WindowId,
        data: &str,
        target_origin: &str,
    ) -> Result<(), DomError> {
        let closed = self
            .closed
            .read()
            .map_err(|e| DomError::Internal(e.to_string()))?;
        if closed.contains(&target) {
            return Err(DomError::WindowClosed(target));
        }

        self.posted
            .write()
            .map_err(|e| DomError::Internal(e.to_string()))?
            .push(PostedMessage {
                target,
                data: data.to_string(),
                target_origin: target_origin.to_string(),
            });
        Ok(())
    }
}
