//! Science program trees.
//!
//! A program is a rooted tree of folders, Or-folders, And-folders, MSBs,
//! and components. Nodes live in an arena and refer to each other by
//! [`NodeId`], so moving a subtree is a re-parent of indices rather than a
//! deep copy, and a cloned tree is an independent snapshot.
//!
//! Component references (`idref`) are kept as explicit [`NodeKind::Reference`]
//! nodes and resolved on demand through the tree's id index.

mod document;
mod validate;

use std::{collections::HashMap, fmt, sync::OnceLock};

use tracing::warn;

use crate::{
    checksum::{self, ChecksumError},
    model::{Checksum, Component, MsbState, MsbSummary, Range, Remaining},
};

pub use document::{DocNode, ProgramDocument};

/// Errors raised while building or validating a program tree.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("invalid program structure at node {node}: {reason}")]
    InvalidStructure { node: NodeId, reason: String },

    #[error("duplicate id: {0}")]
    DuplicateId(String),

    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("project id must not be empty")]
    EmptyProjectId,
}

pub type Result<T> = core::result::Result<T, ProgramError>;

/// Index of a node within its [`ProgramTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A schedulable block: its bookkeeping, not its content.
#[derive(Debug, Clone)]
pub struct Msb {
    pub title: String,

    /// Lower values are scheduled first.
    pub priority: i32,

    pub remaining: Remaining,

    /// Observation label to resume at, if the MSB was suspended part way.
    pub suspended: Option<String>,

    checksum: OnceLock<Checksum>,
}

impl Msb {
    pub fn new(title: impl Into<String>, remaining: Remaining) -> Self {
        Self {
            title: title.into(),
            priority: 0,
            remaining,
            suspended: None,
            checksum: OnceLock::new(),
        }
    }

    pub fn state(&self) -> MsbState {
        self.remaining.state()
    }

    fn invalidate(&mut self) {
        self.checksum = OnceLock::new();
    }
}

/// "Observe some of these": alternatives with a count of picks left.
#[derive(Debug, Clone)]
pub struct OrFolder {
    pub title: Option<String>,
    pub items_remaining: u32,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The program root. Exactly one per tree.
    Program,

    Folder { title: Option<String> },

    Or(OrFolder),

    /// Nodes scheduled as one unit.
    And { title: Option<String> },

    Msb(Msb),

    /// Scientific content, optionally addressable by `id`.
    Component {
        id: Option<String>,
        component: Component,
    },

    /// Stands in for the node whose id is `idref`.
    Reference { id: Option<String>, idref: String },
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Program => "program",
            Self::Folder { .. } => "folder",
            Self::Or(_) => "or-folder",
            Self::And { .. } => "and-folder",
            Self::Msb(_) => "msb",
            Self::Component { .. } => "component",
            Self::Reference { .. } => "reference",
        }
    }

    /// Whether nodes of this kind may have children.
    pub fn is_container(&self) -> bool {
        !matches!(self, Self::Component { .. } | Self::Reference { .. })
    }

    /// The id other nodes can refer to this one by.
    pub fn alias(&self) -> Option<&str> {
        match self {
            Self::Component { id, .. } | Self::Reference { id, .. } => id.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }
}

/// An in-memory science program.
#[derive(Debug, Clone)]
pub struct ProgramTree {
    project_id: String,
    title: Option<String>,
    nodes: Vec<Node>,
    ids: HashMap<String, NodeId>,
}

impl ProgramTree {
    const ROOT: NodeId = NodeId(0);

    /// Creates a tree holding only the program root.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            title: None,
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Program,
            }],
            ids: HashMap::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ── Navigation ──

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(Node::kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Children in document order. Empty for unknown nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], Node::children)
    }

    pub fn msb(&self, id: NodeId) -> Option<&Msb> {
        match self.kind(id)? {
            NodeKind::Msb(msb) => Some(msb),
            _ => None,
        }
    }

    pub(crate) fn msb_mut(&mut self, id: NodeId) -> Option<&mut Msb> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Msb(msb) => Some(msb),
            _ => None,
        }
    }

    pub fn or_folder(&self, id: NodeId) -> Option<&OrFolder> {
        match self.kind(id)? {
            NodeKind::Or(or) => Some(or),
            _ => None,
        }
    }

    pub(crate) fn or_folder_mut(&mut self, id: NodeId) -> Option<&mut OrFolder> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Or(or) => Some(or),
            _ => None,
        }
    }

    /// Resolves an `id` attribute to its node.
    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    /// Iterates from the parent of `id` up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&n| self.parent(n))
    }

    /// All nodes below `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// Every MSB in document order.
    pub fn msbs(&self) -> Vec<NodeId> {
        self.descendants(Self::ROOT)
            .into_iter()
            .filter(|&n| self.msb(n).is_some())
            .collect()
    }

    /// The MSB a component or reference belongs to, if any.
    pub fn enclosing_msb(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).find(|&n| self.msb(n).is_some())
    }

    /// The closest Or-folder above `id`.
    pub fn nearest_or(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).find(|&n| self.or_folder(n).is_some())
    }

    /// The Or-folder above `id` together with the direct child of that
    /// Or-folder on the path to `id` (the unit that moves when `id` is observed).
    pub fn alternative_of(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        let or = self.nearest_or(id)?;
        let mut unit = id;
        while self.parent(unit) != Some(or) {
            unit = self.parent(unit)?;
        }
        Some((or, unit))
    }

    /// Whether a direct child of an Or-folder can still be picked.
    ///
    /// An MSB counts while eligible; an And-folder counts while any MSB in it does.
    pub fn is_eligible_alternative(&self, unit: NodeId) -> bool {
        match self.kind(unit) {
            Some(NodeKind::Msb(msb)) => msb.state() == MsbState::Eligible,
            Some(NodeKind::And { .. }) => self
                .descendants(unit)
                .into_iter()
                .filter_map(|n| self.msb(n))
                .any(|msb| msb.state() == MsbState::Eligible),
            _ => false,
        }
    }

    /// Number of direct children of `or` that can still be picked.
    pub fn eligible_alternatives(&self, or: NodeId) -> u32 {
        let count = self
            .children(or)
            .iter()
            .filter(|&&c| self.is_eligible_alternative(c))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    // ── Editing ──

    /// Appends a new node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId> {
        let parent_node = self
            .node(parent)
            .ok_or(ProgramError::UnknownNode(parent))?;
        if !parent_node.kind.is_container() {
            return Err(ProgramError::InvalidStructure {
                node: parent,
                reason: format!("a {} cannot have children", parent_node.kind.label()),
            });
        }
        if let Some(alias) = kind.alias()
            && self.ids.contains_key(alias)
        {
            return Err(ProgramError::DuplicateId(alias.to_string()));
        }

        let id = NodeId(self.nodes.len());
        if let Some(alias) = kind.alias() {
            self.ids.insert(alias.to_string(), id);
        }
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent.0].children.push(id);

        let owner = if self.msb(parent).is_some() {
            Some(parent)
        } else {
            self.enclosing_msb(parent)
        };
        if let Some(msb) = owner.and_then(|m| self.msb_mut(m)) {
            msb.invalidate();
        }
        Ok(id)
    }

    /// Replaces the content of a component node.
    ///
    /// Any MSB may reference the component, so every cached checksum is dropped.
    pub fn set_component(&mut self, id: NodeId, component: Component) -> Result<()> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind) {
            Some(NodeKind::Component { component: slot, .. }) => *slot = component,
            Some(other) => {
                return Err(ProgramError::InvalidStructure {
                    node: id,
                    reason: format!("a {} is not a component", other.label()),
                });
            }
            None => return Err(ProgramError::UnknownNode(id)),
        }
        for node in &mut self.nodes {
            if let NodeKind::Msb(msb) = &mut node.kind {
                msb.invalidate();
            }
        }
        Ok(())
    }

    /// Moves `unit` to sit immediately after `anchor` under `anchor`'s parent.
    ///
    /// Callers must have checked that both nodes exist, that `anchor` has a
    /// parent, and that `anchor` is not inside `unit`.
    pub(crate) fn relocate_after(&mut self, unit: NodeId, anchor: NodeId) {
        if let Some(old_parent) = self.nodes[unit.0].parent {
            self.nodes[old_parent.0].children.retain(|&c| c != unit);
        }
        let Some(new_parent) = self.nodes[anchor.0].parent else {
            return;
        };
        let siblings = &mut self.nodes[new_parent.0].children;
        let at = siblings
            .iter()
            .position(|&c| c == anchor)
            .map_or(siblings.len(), |p| p + 1);
        siblings.insert(at, unit);
        self.nodes[unit.0].parent = Some(new_parent);
    }

    // ── Identity ──

    /// The MSB's checksum, computed once and cached until its content changes.
    pub fn checksum(&self, msb: NodeId) -> core::result::Result<Checksum, ChecksumError> {
        let node = self.msb(msb).ok_or(ChecksumError::NotAnMsb(msb))?;
        if let Some(cached) = node.checksum.get() {
            return Ok(cached.clone());
        }
        let computed = checksum::compute(self, msb)?;
        // A concurrent reader may have filled the cache first; both values are equal.
        let _ = node.checksum.set(computed.clone());
        Ok(computed)
    }

    /// The first MSB in document order with the given checksum.
    ///
    /// MSBs whose references cannot be resolved never match.
    pub fn find_msb(&self, checksum: &Checksum) -> Option<NodeId> {
        self.msbs()
            .into_iter()
            .find(|&m| self.checksum(m).is_ok_and(|c| &c == checksum))
    }

    /// Flattens one MSB, with references resolved, into a summary.
    pub fn summary(&self, msb: NodeId) -> core::result::Result<MsbSummary, ChecksumError> {
        let node = self.msb(msb).ok_or(ChecksumError::NotAnMsb(msb))?;
        let checksum = self.checksum(msb)?;

        let mut summary = MsbSummary {
            project_id: self.project_id.clone(),
            checksum,
            title: node.title.clone(),
            priority: node.priority,
            remaining: node.remaining,
            suspended: node.suspended.clone(),
            target: None,
            instruments: Vec::new(),
            wavebands: Vec::new(),
            duration_secs: 0.0,
            tau: Range::UNBOUNDED,
            seeing: Range::UNBOUNDED,
            cloud: Range::UNBOUNDED,
            elevation: Range::UNBOUNDED,
            earliest: None,
            latest: None,
        };

        let mut seen_quality = false;
        let mut seen_constraints = false;
        for component in checksum::qualified_components(self, msb)? {
            match component {
                Component::Target(target) => {
                    if summary.target.is_none() {
                        summary.target = Some(target.clone());
                    }
                }
                Component::Instrument(inst) => {
                    if !summary.instruments.contains(&inst.name) {
                        summary.instruments.push(inst.name.clone());
                    }
                    if let Some(band) = &inst.waveband
                        && !summary.wavebands.contains(band)
                    {
                        summary.wavebands.push(band.clone());
                    }
                }
                Component::SiteQuality(quality) if !seen_quality => {
                    seen_quality = true;
                    summary.tau = quality.tau;
                    summary.seeing = quality.seeing;
                    summary.cloud = quality.cloud;
                }
                Component::SchedConstraints(constraints) if !seen_constraints => {
                    seen_constraints = true;
                    summary.elevation = constraints.elevation;
                    summary.earliest = constraints.earliest;
                    summary.latest = constraints.latest;
                }
                Component::Observation(obs) => summary.duration_secs += obs.duration_secs,
                Component::SiteQuality(_) | Component::SchedConstraints(_) => {}
            }
        }
        Ok(summary)
    }

    /// Summaries of every MSB in document order.
    ///
    /// MSBs whose references cannot be resolved are skipped and logged.
    pub fn summaries(&self) -> Vec<MsbSummary> {
        self.msbs()
            .into_iter()
            .filter_map(|m| match self.summary(m) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!(project = %self.project_id, node = %m, error = %e, "skipping MSB");
                    None
                }
            })
            .collect()
    }

    /// Number of MSBs still eligible for scheduling.
    pub fn active_count(&self) -> usize {
        self.msbs()
            .into_iter()
            .filter_map(|m| self.msb(m))
            .filter(|msb| msb.state() == MsbState::Eligible)
            .count()
    }
}
