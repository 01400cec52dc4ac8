// Headless model of the hosting page.
//
// Elements live in an arena and are addressed by `NodeId`. Lookups by id,
// class and attribute only see elements that are still attached to the tree,
// so a removed alert block disappears from every query.

use crate::types::Rect;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Body,
    Form,
    Input,
    TextArea,
    Hidden,
    Button,
    Surface,
    Alert,
    Heading,
    List,
    ListItem,
}

#[derive(Clone, Debug)]
pub struct Element {
    pub kind: ElementKind,
    pub id: Option<String>,
    pub value: String,
    pub text: String,
    pub disabled: bool,
    /// Inline `background-color`, if any.
    pub background: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    /// On-page box (bounding client rect).
    pub rect: Rect,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    attached: bool,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            id: None,
            value: String::new(),
            text: String::new(),
            disabled: false,
            background: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            rect: Rect::default(),
            children: Vec::new(),
            parent: None,
            attached: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class_name(mut self, class_name: &str) -> Self {
        self.set_class_name(class_name);
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Replace the whole class list, like assigning `className`.
    pub fn set_class_name(&mut self, class_name: &str) {
        self.classes = class_name.split_whitespace().map(str::to_owned).collect();
    }

    pub fn class_name(&self) -> String {
        self.classes.join(" ")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScrollRequest {
    pub target: NodeId,
    pub behavior: ScrollBehavior,
}

#[derive(Clone, Debug)]
pub struct Page {
    nodes: Vec<Element>,
    by_id: HashMap<String, NodeId>,
    scroll: Option<ScrollRequest>,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    pub fn new() -> Self {
        let mut body = Element::new(ElementKind::Body);
        body.attached = true;
        Self { nodes: vec![body], by_id: HashMap::new(), scroll: None }
    }

    pub fn body(&self) -> NodeId {
        NodeId(0)
    }

    /// Append `element` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, element: Element) -> NodeId {
        let node = self.alloc(parent, element);
        self.nodes[parent.0].children.push(node);
        node
    }

    /// Insert `element` as the first child of `parent` (`afterbegin`).
    pub fn prepend(&mut self, parent: NodeId, element: Element) -> NodeId {
        let node = self.alloc(parent, element);
        self.nodes[parent.0].children.insert(0, node);
        node
    }

    fn alloc(&mut self, parent: NodeId, mut element: Element) -> NodeId {
        let node = NodeId(self.nodes.len());
        element.parent = Some(parent);
        element.children.clear();
        element.attached = self.nodes[parent.0].attached;
        if element.attached
            && let Some(id) = &element.id
        {
            self.by_id.entry(id.clone()).or_insert(node);
        }
        self.nodes.push(element);
        node
    }

    /// Detach `node` and its subtree from the document.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.body() {
            return;
        }
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            let el = &mut self.nodes[n.0];
            el.attached = false;
            if let Some(id) = &el.id
                && self.by_id.get(id) == Some(&n)
            {
                self.by_id.remove(id);
            }
            stack.extend(el.children.iter().copied());
        }
    }

    pub fn get_by_id(&self, id: &str) -> Option<NodeId> {
        self.by_id.get(id).copied()
    }

    pub fn element(&self, node: NodeId) -> &Element {
        &self.nodes[node.0]
    }

    pub fn element_mut(&mut self, node: NodeId) -> &mut Element {
        &mut self.nodes[node.0]
    }

    /// Attached elements carrying `class`, in document order.
    pub fn query_class(&self, class: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![self.body()];
        while let Some(n) = stack.pop() {
            let el = &self.nodes[n.0];
            if el.has_class(class) {
                found.push(n);
            }
            stack.extend(el.children.iter().rev().copied());
        }
        found
    }

    pub fn value(&self, id: &str) -> Option<&str> {
        self.get_by_id(id).map(|n| self.nodes[n.0].value.as_str())
    }

    /// Set an element's value by id; false when the element is absent.
    pub fn set_value(&mut self, id: &str, value: impl Into<String>) -> bool {
        match self.get_by_id(id) {
            Some(n) => {
                self.nodes[n.0].value = value.into();
                true
            }
            None => false,
        }
    }

    /// Own text followed by every descendant's, depth first.
    pub fn text_content(&self, node: NodeId) -> String {
        let el = &self.nodes[node.0];
        let mut out = el.text.clone();
        for &c in &el.children {
            out.push_str(&self.text_content(c));
        }
        out
    }

    pub fn scroll_into_view(&mut self, target: NodeId, behavior: ScrollBehavior) {
        self.scroll = Some(ScrollRequest { target, behavior });
    }

    pub fn last_scroll(&self) -> Option<ScrollRequest> {
        self.scroll
    }
}
