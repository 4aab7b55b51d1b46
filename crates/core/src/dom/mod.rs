use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::ParseOpts;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::collections::BTreeMap;

use crate::error::HarnessResult;

/// Index of a node inside a [`Document`]. Ids follow document (pre-)order,
/// so sorting ids sorts nodes the way they appear in the markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
    Element,
    Text,
    Document,
}

/// A node in the arena. Minimal — only what selectors and assertions need.
#[derive(Debug, Clone)]
pub struct DomNode {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
    pub node_type: NodeType,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Last id inside this node's subtree (itself when it has no children).
    subtree_end: NodeId,
}

impl DomNode {
    fn new(node_type: NodeType, parent: Option<NodeId>) -> Self {
        Self {
            tag: String::new(),
            attributes: BTreeMap::new(),
            text: String::new(),
            node_type,
            parent,
            children: Vec::new(),
            subtree_end: NodeId(0),
        }
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.get_attr("class").unwrap_or("").split_whitespace()
    }

    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }
}

/// A parsed page, stored as a flat arena so nodes can point at their parent.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<DomNode>,
}

impl Document {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &DomNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Element descendants of `id` in document order.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let end = self.node(id).subtree_end.0;
        (id.0 + 1..=end)
            .map(NodeId)
            .filter(|n| self.node(*n).is_element())
    }

    /// Element children of `id` in document order.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(|n| self.node(*n).is_element())
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.node(id).parent,
        }
    }

    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        id > ancestor && id <= self.node(ancestor).subtree_end
    }

    /// Whitespace-collapsed text content of the node and all its children.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.collect_text(id, &mut result);
        result
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        match node.node_type {
            NodeType::Text => {
                for word in node.text.split_whitespace() {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(word);
                }
            }
            _ => {
                for child in &node.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Current value of a form control as rendered.
    pub fn value(&self, id: NodeId) -> Option<String> {
        let node = self.node(id);
        match node.tag.as_str() {
            "input" => Some(node.get_attr("value").unwrap_or("").to_string()),
            "textarea" => Some(self.text_content(id)),
            "select" => {
                let options: Vec<NodeId> = self
                    .descendants(id)
                    .filter(|o| self.node(*o).tag == "option")
                    .collect();
                let chosen = options
                    .iter()
                    .find(|o| self.node(**o).attributes.contains_key("selected"))
                    .or_else(|| options.first())?;
                let option = self.node(*chosen);
                Some(
                    option
                        .get_attr("value")
                        .map(String::from)
                        .unwrap_or_else(|| self.text_content(*chosen)),
                )
            }
            _ => None,
        }
    }

    /// An element is visible unless it or an ancestor is hidden through the
    /// `hidden` attribute, a `hidden` class, or an inline `display: none`.
    pub fn is_visible(&self, id: NodeId) -> bool {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .all(|n| !hides(self.node(n)))
    }

    /// Child-index path from the root, stable for this snapshot.
    pub fn path_of(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            let index = self
                .node(parent)
                .children
                .iter()
                .position(|c| *c == current)
                .unwrap_or(0);
            path.push(index);
            current = parent;
        }
        path.reverse();
        path
    }

    pub fn node_at_path(&self, path: &[usize]) -> Option<NodeId> {
        let mut current = self.root();
        for index in path {
            current = *self.node(current).children.get(*index)?;
        }
        Some(current)
    }

    /// Short one-line rendering used in failure messages.
    pub fn describe(&self, id: NodeId) -> String {
        let node = self.node(id);
        if !node.is_element() {
            return self.text_content(id);
        }
        let mut out = format!("<{}", node.tag);
        for (name, value) in &node.attributes {
            out.push_str(&format!(" {}=\"{}\"", name, value));
        }
        out.push('>');
        let text = self.text_content(id);
        if text.chars().count() > 60 {
            out.extend(text.chars().take(57));
            out.push_str("...");
        } else {
            out.push_str(&text);
        }
        out
    }
}

fn hides(node: &DomNode) -> bool {
    if !node.is_element() {
        return false;
    }
    if node.attributes.contains_key("hidden") || node.has_class("hidden") {
        return true;
    }
    node.get_attr("style")
        .map(|style| {
            let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect();
            compact.to_lowercase().contains("display:none")
        })
        .unwrap_or(false)
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}

/// Parse an HTML string into a [`Document`].
pub fn parse_html(html: &str) -> HarnessResult<Document> {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: true,
            ..Default::default()
        },
        ..Default::default()
    };

    let dom = parse_document(RcDom::default(), opts)
        .from_utf8()
        .read_from(&mut html.as_bytes())?;

    let mut doc = Document { nodes: Vec::new() };
    convert_node(&dom.document, None, &mut doc);
    Ok(doc)
}

fn convert_node(handle: &Handle, parent: Option<NodeId>, doc: &mut Document) -> Option<NodeId> {
    let id = NodeId(doc.nodes.len());
    match &handle.data {
        NodeData::Document => {
            doc.nodes.push(DomNode::new(NodeType::Document, parent));
        }
        NodeData::Element { name, attrs, .. } => {
            let mut node = DomNode::new(NodeType::Element, parent);
            node.tag = name.local.to_string();
            for attr in attrs.borrow().iter() {
                node.attributes
                    .insert(attr.name.local.to_string(), attr.value.to_string());
            }
            let opaque = node.tag == "script" || node.tag == "style";
            doc.nodes.push(node);
            if opaque {
                doc.nodes[id.0].subtree_end = id;
                return Some(id);
            }
        }
        NodeData::Text { contents } => {
            let text = contents.borrow().to_string();
            // Whitespace-only text nodes carry no content
            if text.trim().is_empty() {
                return None;
            }
            let mut node = DomNode::new(NodeType::Text, parent);
            node.text = text;
            node.subtree_end = id;
            doc.nodes.push(node);
            return Some(id);
        }
        _ => return None, // Comments, PIs, doctypes → ignored
    }

    for child in handle.children.borrow().iter() {
        if let Some(child_id) = convert_node(child, Some(id), doc) {
            doc.nodes[id.0].children.push(child_id);
        }
    }
    doc.nodes[id.0].subtree_end = NodeId(doc.nodes.len() - 1);
    Some(id)
}
