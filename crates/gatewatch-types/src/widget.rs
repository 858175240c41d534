//! Declarative widget trees for host setting panels.

use serde::{Deserialize, Serialize};

/// A host-rendered UI element.
///
/// Panels describe their UI as data; the host owns the rendering and
/// delivers change events back by widget name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Widget {
    /// Titled container, laid out top to bottom.
    Section { title: String, children: Vec<Widget> },
    /// Static text block.
    Text { content: String },
    /// Labeled dropdown with a fixed option list.
    Select {
        /// Identifier change events refer to.
        name: String,
        label: String,
        /// Currently selected option.
        value: String,
        options: Vec<String>,
    },
}

impl Widget {
    /// Finds the value of the named select anywhere in the tree.
    pub fn select_value(&self, name: &str) -> Option<&str> {
        match self {
            Widget::Select { name: n, value, .. } if n == name => Some(value),
            Widget::Section { children, .. } => {
                children.iter().find_map(|c| c.select_value(name))
            }
            _ => None,
        }
    }
}
