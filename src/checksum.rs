//! Content checksums for MSBs.
//!
//! The checksum covers only an MSB's qualified components: its direct
//! component children in document order, with every reference replaced by
//! the component it points at. Titles, priorities, repeat counts, and
//! component ids are left out, so resubmitting a program that only changes
//! bookkeeping keeps every MSB's identity.
//!
//! The canonical form is the JSON serialization of the component list,
//! hashed with SHA-256 and truncated to 128 bits.

use sha2::{Digest, Sha256};

use crate::{
    model::{Checksum, Component},
    program::{NodeId, NodeKind, ProgramTree},
};

/// Bytes of digest kept in a checksum.
const CHECKSUM_BYTES: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    #[error("dangling reference: nothing has id '{idref}'")]
    DanglingReference { idref: String },

    #[error("cyclic reference through id '{idref}'")]
    CyclicReference { idref: String },

    #[error("node {0} is not an MSB")]
    NotAnMsb(NodeId),

    #[error("failed to serialize components: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, ChecksumError>;

/// Computes an MSB's checksum without consulting or filling its cache.
///
/// Prefer [`ProgramTree::checksum`], which caches the result.
pub fn compute(tree: &ProgramTree, msb: NodeId) -> Result<Checksum> {
    let components = qualified_components(tree, msb)?;
    let canonical = serde_json::to_vec(&components)?;
    let digest = Sha256::digest(&canonical);
    Ok(Checksum::from_digest(&digest[..CHECKSUM_BYTES]))
}

/// The MSB's direct components in document order, references substituted.
pub fn qualified_components(tree: &ProgramTree, msb: NodeId) -> Result<Vec<&Component>> {
    if tree.msb(msb).is_none() {
        return Err(ChecksumError::NotAnMsb(msb));
    }
    let mut components = Vec::new();
    for &child in tree.children(msb) {
        match tree.kind(child) {
            Some(NodeKind::Component { component, .. }) => components.push(component),
            Some(NodeKind::Reference { idref, .. }) => components.push(resolve(tree, idref)?),
            _ => {}
        }
    }
    Ok(components)
}

/// Follows a reference, and any reference it lands on, to a component.
fn resolve<'a>(tree: &'a ProgramTree, idref: &str) -> Result<&'a Component> {
    let mut visited: Vec<String> = Vec::new();
    let mut current = idref.to_string();
    loop {
        if visited.contains(&current) {
            return Err(ChecksumError::CyclicReference { idref: current });
        }
        let node = tree
            .lookup(&current)
            .ok_or_else(|| ChecksumError::DanglingReference {
                idref: current.clone(),
            })?;
        match tree.kind(node) {
            Some(NodeKind::Component { component, .. }) => return Ok(component),
            Some(NodeKind::Reference { idref: next, .. }) => {
                visited.push(std::mem::replace(&mut current, next.clone()));
            }
            _ => return Err(ChecksumError::DanglingReference { idref: current }),
        }
    }
}
