//! Structural validation of program trees.
//!
//! The lifecycle rewrites assume a shape that the document format alone
//! does not guarantee, so it is checked here whenever a tree is built:
//!
//! - Or-folders hold only MSBs and And-folders, and nothing below an
//!   Or-folder is another Or-folder.
//! - An Or-folder never has more picks left than alternatives.
//! - And-folders contain at least one MSB.
//! - MSBs hold only components and references, and never nest.
//! - Components and references never sit directly in an Or-folder.

use std::collections::BTreeMap;

use crate::model::Checksum;

use super::{NodeId, NodeKind, ProgramError, ProgramTree, Result};

impl ProgramTree {
    /// Checks the structural rules the lifecycle depends on.
    pub fn validate(&self) -> Result<()> {
        for node in self.descendants(self.root()) {
            self.validate_node(node)?;
        }
        Ok(())
    }

    fn validate_node(&self, id: NodeId) -> Result<()> {
        let invalid = |reason: &str| {
            Err(ProgramError::InvalidStructure {
                node: id,
                reason: reason.to_string(),
            })
        };
        let Some(kind) = self.kind(id) else {
            return Err(ProgramError::UnknownNode(id));
        };
        let parent_kind = self.parent(id).and_then(|p| self.kind(p));

        match kind {
            NodeKind::Program => return invalid("the program root cannot be nested"),
            NodeKind::Msb(_) => {
                if self.enclosing_msb(id).is_some() {
                    return invalid("an MSB cannot contain another MSB");
                }
            }
            NodeKind::Component { .. } | NodeKind::Reference { .. } => {
                if matches!(parent_kind, Some(NodeKind::Or(_))) {
                    return invalid("an or-folder may only contain MSBs and and-folders");
                }
            }
            NodeKind::Folder { .. } | NodeKind::And { .. } | NodeKind::Or(_) => {
                if matches!(parent_kind, Some(NodeKind::Msb(_))) {
                    return invalid("an MSB may only contain components and references");
                }
            }
        }

        if let NodeKind::Folder { .. } = kind
            && matches!(parent_kind, Some(NodeKind::Or(_)))
        {
            return invalid("an or-folder may only contain MSBs and and-folders");
        }

        if let NodeKind::And { .. } = kind
            && !self
                .descendants(id)
                .into_iter()
                .any(|n| self.msb(n).is_some())
        {
            return invalid("an and-folder must contain at least one MSB");
        }

        if let NodeKind::Or(or) = kind {
            if self.nearest_or(id).is_some() {
                return invalid("or-folders cannot be nested inside or-folders");
            }
            if or.items_remaining > self.eligible_alternatives(id) {
                return invalid("items remaining exceeds the eligible alternatives");
            }
        }
        Ok(())
    }

    /// Checksums shared by more than one MSB, with the MSBs that share them.
    ///
    /// Identical content is allowed; lookups by checksum use the first MSB
    /// in document order. MSBs whose checksum cannot be computed are ignored.
    pub fn duplicate_checksums(&self) -> BTreeMap<Checksum, Vec<NodeId>> {
        let mut by_checksum: BTreeMap<Checksum, Vec<NodeId>> = BTreeMap::new();
        for msb in self.msbs() {
            if let Ok(checksum) = self.checksum(msb) {
                by_checksum.entry(checksum).or_default().push(msb);
            }
        }
        by_checksum.retain(|_, nodes| nodes.len() > 1);
        by_checksum
    }
}
