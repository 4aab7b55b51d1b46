//! Snapshots of the application under test.

use serde::{Deserialize, Serialize};

use crate::dom::{self, Document, NodeId};
use crate::error::{HarnessError, HarnessResult};
use crate::selector::{self, Locator};

/// The rendered application at one instant: current route plus parsed DOM.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub document: Document,
}

/// Reference to an element the driver can act on. The path is a child-index
/// path from the document root and is only meaningful for the snapshot the
/// handle was resolved from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    pub path: Vec<usize>,
    pub tag: String,
    pub label: String,
}

impl Page {
    pub fn parse(url: &str, html: &str) -> HarnessResult<Self> {
        Ok(Self {
            url: url.to_string(),
            document: dom::parse_html(html)?,
        })
    }

    /// Every element matching the locator, in document order.
    pub fn find_all(&self, locator: &Locator) -> Vec<NodeId> {
        selector::query(&self.document, locator.selectors())
    }

    pub fn count(&self, locator: &Locator) -> usize {
        self.find_all(locator).len()
    }

    pub fn exists(&self, locator: &Locator) -> bool {
        !self.find_all(locator).is_empty()
    }

    /// Resolve exactly one element. Zero matches is `NoMatch`; several is
    /// `Ambiguous` unless the locator was built with `.first()`.
    pub fn find_one(&self, locator: &Locator) -> HarnessResult<NodeId> {
        let matches = self.find_all(locator);
        match matches.len() {
            0 => Err(HarnessError::NoMatch {
                locator: locator.to_string(),
            }),
            1 => Ok(matches[0]),
            _ if locator.is_first() => Ok(matches[0]),
            count => Err(HarnessError::Ambiguous {
                locator: locator.to_string(),
                count,
            }),
        }
    }

    pub fn handle(&self, id: NodeId) -> ElementHandle {
        let node = self.document.node(id);
        ElementHandle {
            path: self.document.path_of(id),
            tag: node.tag.clone(),
            label: self.document.describe(id),
        }
    }

    pub fn text(&self, id: NodeId) -> String {
        self.document.text_content(id)
    }

    pub fn value(&self, id: NodeId) -> Option<String> {
        self.document.value(id)
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.document.is_visible(id)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.document.node(id).get_attr(name)
    }
}
