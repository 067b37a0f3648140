//! Program documents: the serialized, nested form of a program tree.
//!
//! This is what submitters send and what storage persists. Converting a
//! tree to a document and back yields a tree with the same MSB checksums.

use serde::{Deserialize, Serialize};

use crate::model::{Component, Remaining};

use super::{Msb, NodeId, NodeKind, OrFolder, ProgramError, ProgramTree, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDocument {
    pub project_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub children: Vec<DocNode>,
}

/// One node of a program document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DocNode {
    Folder {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default)]
        children: Vec<DocNode>,
    },

    /// Alternatives. `number_of_items` is how many to observe; it
    /// defaults to all of them.
    Or {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        number_of_items: Option<u32>,
        #[serde(default)]
        children: Vec<DocNode>,
    },

    And {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default)]
        children: Vec<DocNode>,
    },

    Msb {
        title: String,
        #[serde(default)]
        priority: i32,
        #[serde(default)]
        remaining: Remaining,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        suspended: Option<String>,
        #[serde(default)]
        children: Vec<DocNode>,
    },

    Component {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        component: Component,
    },

    Reference {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        idref: String,
    },
}

impl ProgramDocument {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            title: None,
            children: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_child(mut self, child: DocNode) -> Self {
        self.children.push(child);
        self
    }
}

impl DocNode {
    pub fn msb(title: impl Into<String>, remaining: u32) -> Self {
        Self::Msb {
            title: title.into(),
            priority: 0,
            remaining: Remaining::Count(remaining),
            suspended: None,
            children: Vec::new(),
        }
    }

    pub fn folder(children: Vec<DocNode>) -> Self {
        Self::Folder {
            title: None,
            children,
        }
    }

    /// An Or-folder where every alternative should be observed.
    pub fn or(children: Vec<DocNode>) -> Self {
        Self::Or {
            title: None,
            number_of_items: None,
            children,
        }
    }

    /// An Or-folder where only `n` of the alternatives should be observed.
    pub fn or_choosing(n: u32, children: Vec<DocNode>) -> Self {
        Self::Or {
            title: None,
            number_of_items: Some(n),
            children,
        }
    }

    pub fn and(children: Vec<DocNode>) -> Self {
        Self::And {
            title: None,
            children,
        }
    }

    pub fn component(component: Component) -> Self {
        Self::Component {
            id: None,
            component,
        }
    }

    pub fn component_with_id(id: impl Into<String>, component: Component) -> Self {
        Self::Component {
            id: Some(id.into()),
            component,
        }
    }

    pub fn reference(idref: impl Into<String>) -> Self {
        Self::Reference {
            id: None,
            idref: idref.into(),
        }
    }

    /// Appends a child. Components and references have no children, so
    /// they are returned unchanged.
    pub fn with_child(mut self, child: DocNode) -> Self {
        match &mut self {
            Self::Folder { children, .. }
            | Self::Or { children, .. }
            | Self::And { children, .. }
            | Self::Msb { children, .. } => children.push(child),
            Self::Component { .. } | Self::Reference { .. } => {}
        }
        self
    }

    /// Sets an MSB's priority. Other nodes are returned unchanged.
    pub fn with_priority(mut self, value: i32) -> Self {
        if let Self::Msb { priority, .. } = &mut self {
            *priority = value;
        }
        self
    }

    /// Sets an MSB's remaining count. Other nodes are returned unchanged.
    pub fn with_remaining(mut self, value: Remaining) -> Self {
        if let Self::Msb { remaining, .. } = &mut self {
            *remaining = value;
        }
        self
    }

    pub fn with_title(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        match &mut self {
            Self::Folder { title, .. } | Self::Or { title, .. } | Self::And { title, .. } => {
                *title = Some(value);
            }
            Self::Msb { title, .. } => *title = value,
            Self::Component { .. } | Self::Reference { .. } => {}
        }
        self
    }
}

impl ProgramTree {
    /// Builds and validates a tree from its document form.
    pub fn from_document(doc: &ProgramDocument) -> Result<Self> {
        if doc.project_id.trim().is_empty() {
            return Err(ProgramError::EmptyProjectId);
        }
        let mut tree = Self::new(doc.project_id.clone());
        tree.title.clone_from(&doc.title);
        let root = tree.root();
        for child in &doc.children {
            tree.build(root, child)?;
        }
        tree.validate()?;
        Ok(tree)
    }

    fn build(&mut self, parent: NodeId, node: &DocNode) -> Result<()> {
        let (kind, children, number_of_items) = match node {
            DocNode::Folder { title, children } => (
                NodeKind::Folder {
                    title: title.clone(),
                },
                children.as_slice(),
                None,
            ),
            DocNode::Or {
                title,
                number_of_items,
                children,
            } => (
                NodeKind::Or(OrFolder {
                    title: title.clone(),
                    items_remaining: 0,
                }),
                children.as_slice(),
                Some(*number_of_items),
            ),
            DocNode::And { title, children } => (
                NodeKind::And {
                    title: title.clone(),
                },
                children.as_slice(),
                None,
            ),
            DocNode::Msb {
                title,
                priority,
                remaining,
                suspended,
                children,
            } => {
                let mut msb = Msb::new(title.clone(), *remaining);
                msb.priority = *priority;
                msb.suspended.clone_from(suspended);
                (NodeKind::Msb(msb), children.as_slice(), None)
            }
            DocNode::Component { id, component } => (
                NodeKind::Component {
                    id: id.clone(),
                    component: component.clone(),
                },
                &[][..],
                None,
            ),
            DocNode::Reference { id, idref } => (
                NodeKind::Reference {
                    id: id.clone(),
                    idref: idref.clone(),
                },
                &[][..],
                None,
            ),
        };

        let id = self.append(parent, kind)?;
        for child in children {
            self.build(id, child)?;
        }

        if let Some(number_of_items) = number_of_items {
            let alternatives = self
                .children(id)
                .iter()
                .filter(|&&c| matches!(self.kind(c), Some(NodeKind::Msb(_) | NodeKind::And { .. })))
                .count();
            if let Some(n) = number_of_items
                && usize::try_from(n).unwrap_or(usize::MAX) > alternatives
            {
                return Err(ProgramError::InvalidStructure {
                    node: id,
                    reason: "number of items exceeds the number of alternatives".to_string(),
                });
            }
            // Exhausted and removed alternatives can no longer be picked.
            let eligible = self.eligible_alternatives(id);
            if let Some(or) = self.or_folder_mut(id) {
                or.items_remaining = number_of_items.map_or(eligible, |n| n.min(eligible));
            }
        }
        Ok(())
    }

    /// Converts the tree back into its document form.
    pub fn to_document(&self) -> ProgramDocument {
        ProgramDocument {
            project_id: self.project_id.clone(),
            title: self.title.clone(),
            children: self
                .children(self.root())
                .iter()
                .map(|&c| self.doc_node(c))
                .collect(),
        }
    }

    fn doc_node(&self, id: NodeId) -> DocNode {
        let children = || -> Vec<DocNode> {
            self.children(id)
                .iter()
                .map(|&c| self.doc_node(c))
                .collect()
        };
        match self.kind(id) {
            Some(NodeKind::Or(or)) => DocNode::Or {
                title: or.title.clone(),
                number_of_items: Some(or.items_remaining),
                children: children(),
            },
            Some(NodeKind::And { title }) => DocNode::And {
                title: title.clone(),
                children: children(),
            },
            Some(NodeKind::Msb(msb)) => DocNode::Msb {
                title: msb.title.clone(),
                priority: msb.priority,
                remaining: msb.remaining,
                suspended: msb.suspended.clone(),
                children: children(),
            },
            Some(NodeKind::Component { id, component }) => DocNode::Component {
                id: id.clone(),
                component: component.clone(),
            },
            Some(NodeKind::Reference { id, idref }) => DocNode::Reference {
                id: id.clone(),
                idref: idref.clone(),
            },
            Some(NodeKind::Folder { title }) => DocNode::Folder {
                title: title.clone(),
                children: children(),
            },
            // The root is never reached through `children`.
            Some(NodeKind::Program) | None => DocNode::folder(Vec::new()),
        }
    }
}
