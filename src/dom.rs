//! Element tree - the host page the widget renders into.
//!
//! A small retained tree: elements with a tag, id, class, inline style, text
//! and children. Each element carries a reactive `connected` flag that is true
//! while the element is reachable from the document root. The map host waits
//! on that flag before constructing its map.
//!
//! Components do not take a parent argument. They append to whatever element
//! is on top of the parent context stack (see [`push_parent`] / [`pop_parent`]).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

use crate::types::Style;

// =============================================================================
// Element
// =============================================================================

struct Node {
    id: Option<String>,
    class: Option<String>,
    style: Style,
    text: Option<String>,
    children: Vec<Element>,
    parent: Weak<ElementInner>,
}

struct ElementInner {
    tag: String,
    node: RefCell<Node>,
    /// Untracked mirror of `connected`.
    attached: Cell<bool>,
    connected: Signal<bool>,
}

/// A node in the element tree. Cloning yields another handle to the same node.
#[derive(Clone)]
pub struct Element(Rc<ElementInner>);

impl Element {
    pub fn new(tag: &str) -> Self {
        Self(Rc::new(ElementInner {
            tag: tag.to_string(),
            node: RefCell::new(Node {
                id: None,
                class: None,
                style: Style::new(),
                text: None,
                children: Vec::new(),
                parent: Weak::new(),
            }),
            attached: Cell::new(false),
            connected: signal(false),
        }))
    }

    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    pub fn id(&self) -> Option<String> {
        self.0.node.borrow().id.clone()
    }

    pub fn set_id(&self, id: &str) {
        self.0.node.borrow_mut().id = Some(id.to_string());
    }

    pub fn class_name(&self) -> Option<String> {
        self.0.node.borrow().class.clone()
    }

    pub fn set_class_name(&self, class: &str) {
        self.0.node.borrow_mut().class = Some(class.to_string());
    }

    pub fn style(&self) -> Style {
        self.0.node.borrow().style.clone()
    }

    pub fn set_style(&self, style: Style) {
        self.0.node.borrow_mut().style = style;
    }

    /// Own text of this element (not its descendants).
    pub fn text(&self) -> Option<String> {
        self.0.node.borrow().text.clone()
    }

    pub fn set_text_content(&self, text: &str) {
        self.0.node.borrow_mut().text = Some(text.to_string());
    }

    /// Concatenated text of this element and all descendants, in order.
    pub fn text_content(&self) -> String {
        let node = self.0.node.borrow();
        let mut out = node.text.clone().unwrap_or_default();
        for child in &node.children {
            out.push_str(&child.text_content());
        }
        out
    }

    pub fn children(&self) -> Vec<Element> {
        self.0.node.borrow().children.clone()
    }

    pub fn parent(&self) -> Option<Element> {
        self.0.node.borrow().parent.upgrade().map(Element)
    }

    /// Whether the element is reachable from the document root (untracked read).
    pub fn is_connected(&self) -> bool {
        self.0.attached.get()
    }

    /// Reactive view of [`Element::is_connected`]. Reading it inside an effect
    /// subscribes the effect to attach/detach.
    pub fn connected_signal(&self) -> Signal<bool> {
        self.0.connected.clone()
    }

    /// Append `child`, detaching it from any previous parent first.
    pub fn append_child(&self, child: &Element) {
        child.remove();
        {
            let mut node = self.0.node.borrow_mut();
            node.children.push(child.clone());
        }
        child.0.node.borrow_mut().parent = Rc::downgrade(&self.0);
        if self.is_connected() {
            child.set_connected(true);
        }
    }

    /// Remove `child` if it is a direct child. Returns whether it was.
    pub fn remove_child(&self, child: &Element) -> bool {
        let removed = {
            let mut node = self.0.node.borrow_mut();
            let before = node.children.len();
            node.children.retain(|c| c != child);
            node.children.len() != before
        };
        if removed {
            child.0.node.borrow_mut().parent = Weak::new();
            child.set_connected(false);
        }
        removed
    }

    /// Detach this element from its parent, if any.
    pub fn remove(&self) {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
    }

    /// Depth-first search for an element with `id`, including `self`.
    pub fn find_by_id(&self, id: &str) -> Option<Element> {
        if self.id().as_deref() == Some(id) {
            return Some(self.clone());
        }
        self.children().iter().find_map(|child| child.find_by_id(id))
    }

    /// Depth-first search for all elements with `class`, including `self`.
    pub fn find_by_class(&self, class: &str) -> Vec<Element> {
        let mut found = Vec::new();
        if self.class_name().as_deref() == Some(class) {
            found.push(self.clone());
        }
        for child in self.children() {
            found.extend(child.find_by_class(class));
        }
        found
    }

    fn set_connected(&self, connected: bool) {
        // Flip the whole subtree's mirrors first, then notify, so effects
        // reacting to one node already see a consistent tree.
        let mut changed = Vec::new();
        self.collect_connected_changes(connected, &mut changed);
        for sig in changed {
            sig.set(connected);
        }
    }

    fn collect_connected_changes(&self, connected: bool, changed: &mut Vec<Signal<bool>>) {
        if self.0.attached.get() != connected {
            self.0.attached.set(connected);
            changed.push(self.0.connected.clone());
        }
        for child in self.children() {
            child.collect_connected_changes(connected, changed);
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0.node.borrow();
        f.debug_struct("Element")
            .field("tag", &self.0.tag)
            .field("id", &node.id)
            .field("class", &node.class)
            .field("children", &node.children.len())
            .field("connected", &self.0.attached.get())
            .finish()
    }
}

// =============================================================================
// Document
// =============================================================================

struct DocumentInner {
    html: Element,
    body: Element,
    loaded: Cell<bool>,
    on_loaded: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// The host page: a connected `html` root with a `body`.
#[derive(Clone)]
pub struct Document(Rc<DocumentInner>);

impl Document {
    pub fn new() -> Self {
        let html = Element::new("html");
        html.set_connected(true);
        let body = Element::new("body");
        html.append_child(&body);
        Self(Rc::new(DocumentInner {
            html,
            body,
            loaded: Cell::new(false),
            on_loaded: RefCell::new(Vec::new()),
        }))
    }

    pub fn body(&self) -> Element {
        self.0.body.clone()
    }

    pub fn create_element(&self, tag: &str) -> Element {
        Element::new(tag)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        self.0.html.find_by_id(id)
    }

    pub fn is_loaded(&self) -> bool {
        self.0.loaded.get()
    }

    /// Run `callback` once the content has loaded; immediately if it already has.
    pub fn on_content_loaded(&self, callback: impl FnOnce() + 'static) {
        if self.is_loaded() {
            callback();
        } else {
            self.0.on_loaded.borrow_mut().push(Box::new(callback));
        }
    }

    /// Mark the content as loaded and run queued callbacks in order.
    pub fn finish_loading(&self) {
        if self.0.loaded.replace(true) {
            return;
        }
        let callbacks = std::mem::take(&mut *self.0.on_loaded.borrow_mut());
        for callback in callbacks {
            callback();
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Parent Context Stack
// =============================================================================

thread_local! {
    /// Stack of elements that newly rendered components append to.
    static PARENT_STACK: RefCell<Vec<Element>> = RefCell::new(Vec::new());
}

/// Element that components rendered now should append to.
pub fn current_parent() -> Option<Element> {
    PARENT_STACK.with(|stack| stack.borrow().last().cloned())
}

/// Push a parent element onto the stack.
pub fn push_parent(element: Element) {
    PARENT_STACK.with(|stack| stack.borrow_mut().push(element));
}

/// Pop a parent element from the stack.
pub fn pop_parent() {
    PARENT_STACK.with(|stack| {
        stack.borrow_mut().pop();
    });
}

/// Run `f` with `element` as the current parent.
pub fn with_parent<R>(element: &Element, f: impl FnOnce() -> R) -> R {
    push_parent(element.clone());
    let result = f();
    pop_parent();
    result
}

/// Append `element` to the current parent, if there is one.
pub fn attach_to_current_parent(element: &Element) {
    if let Some(parent) = current_parent() {
        parent.append_child(element);
    }
}

// =============================================================================
// Tests
// =============================================================================
