//! MSB lifecycle: observing, removing, undoing, and suspending MSBs.
//!
//! Every operation is split in two. Planning reads the tree, checks every
//! precondition, and produces a [`Transition`]: the full list of steps.
//! Applying a transition cannot fail. A rejected operation therefore
//! leaves the tree exactly as it was.
//!
//! Observing an MSB that sits inside an Or-folder moves it out: the MSB,
//! or the And-folder directly below the Or-folder that holds it, is
//! re-inserted immediately after the Or-folder. The Or-folder then has
//! one pick fewer. When it has none left, every still-eligible MSB inside
//! it is withdrawn.

use tracing::{debug, info};

use crate::{
    model::{Checksum, MsbState, Remaining},
    program::{NodeId, NodeKind, ProgramTree},
};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("node {0} is not an MSB")]
    NotAnMsb(NodeId),

    #[error("cannot move MSB {msb} out of its or-folder: {reason}")]
    InvalidStructure { msb: NodeId, reason: String },
}

pub type Result<T> = core::result::Result<T, LifecycleError>;

/// A single change to a program tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The repeat count changed.
    SetRemaining {
        msb: NodeId,
        from: Remaining,
        to: Remaining,
    },

    /// The suspension label was set or cleared.
    SetSuspended { msb: NodeId, label: Option<String> },

    /// `unit` moved from inside `or` to just after it.
    Relocate { unit: NodeId, or: NodeId },

    /// The Or-folder's count of picks changed.
    SetItemsRemaining { or: NodeId, from: u32, to: u32 },

    /// The MSB was withdrawn because its Or-folder ran out of picks.
    Withdraw { msb: NodeId },
}

/// Everything one lifecycle operation does to a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub msb: NodeId,
    pub steps: Vec<Step>,
}

impl Transition {
    fn empty(msb: NodeId) -> Self {
        Self {
            msb,
            steps: Vec::new(),
        }
    }

    /// Whether applying this transition changes nothing.
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }

    /// MSBs withdrawn by an Or-folder running out of picks.
    pub fn withdrawn(&self) -> Vec<NodeId> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                Step::Withdraw { msb } => Some(*msb),
                _ => None,
            })
            .collect()
    }

    pub fn relocated(&self) -> Option<NodeId> {
        self.steps.iter().find_map(|s| match s {
            Step::Relocate { unit, .. } => Some(*unit),
            _ => None,
        })
    }
}

/// Result of a lifecycle operation addressed by checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied(Transition),

    /// No MSB in the tree has the checksum. Nothing changed.
    Missing,
}

// ── Planning ──

/// Plans one observation of `msb`.
///
/// Exhausted and removed MSBs are left alone.
pub fn plan_observe(tree: &ProgramTree, msb: NodeId) -> Result<Transition> {
    let node = tree.msb(msb).ok_or(LifecycleError::NotAnMsb(msb))?;
    let mut transition = Transition::empty(msb);
    if node.state() != MsbState::Eligible {
        return Ok(transition);
    }
    let alternative = alternative_unit(tree, msb)?;

    transition.steps.push(Step::SetRemaining {
        msb,
        from: node.remaining,
        to: node.remaining.decremented(),
    });
    if node.suspended.is_some() {
        transition.steps.push(Step::SetSuspended { msb, label: None });
    }

    if let Some((or, unit)) = alternative {
        transition.steps.push(Step::Relocate { unit, or });

        let picks = tree.or_folder(or).map_or(0, |f| f.items_remaining);
        let eligible_left = count(
            tree.children(or)
                .iter()
                .filter(|&&c| c != unit && tree.is_eligible_alternative(c)),
        );
        let to = picks.saturating_sub(1).min(eligible_left);
        transition.steps.push(Step::SetItemsRemaining {
            or,
            from: picks,
            to,
        });
        if to == 0 {
            transition
                .steps
                .extend(withdrawals(tree, or, |n| n == unit || is_within(tree, n, unit)));
        }
    }
    Ok(transition)
}

/// Plans an administrative withdrawal of `msb`.
pub fn plan_remove(tree: &ProgramTree, msb: NodeId) -> Result<Transition> {
    let node = tree.msb(msb).ok_or(LifecycleError::NotAnMsb(msb))?;
    let mut transition = Transition::empty(msb);
    if node.state() == MsbState::Removed {
        return Ok(transition);
    }
    let alternative = alternative_unit(tree, msb)?;

    transition.steps.push(Step::SetRemaining {
        msb,
        from: node.remaining,
        to: Remaining::Removed,
    });

    if let Some((or, unit)) = alternative {
        let unit_still_eligible = unit != msb
            && tree.descendants(unit).into_iter().any(|n| {
                n != msb && tree.msb(n).is_some_and(|m| m.state() == MsbState::Eligible)
            });
        let eligible_after = count(tree.children(or).iter().filter(|&&c| {
            if c == unit {
                unit_still_eligible
            } else {
                tree.is_eligible_alternative(c)
            }
        }));
        let picks = tree.or_folder(or).map_or(0, |f| f.items_remaining);
        if eligible_after < picks {
            transition.steps.push(Step::SetItemsRemaining {
                or,
                from: picks,
                to: eligible_after,
            });
            if eligible_after == 0 {
                transition.steps.extend(withdrawals(tree, or, |n| n == msb));
            }
        }
    }
    Ok(transition)
}

/// Plans reversing one observation. A removed MSB is reinstated with one
/// observation remaining. Or-folder moves are not reversed.
pub fn plan_undo(tree: &ProgramTree, msb: NodeId) -> Result<Transition> {
    let node = tree.msb(msb).ok_or(LifecycleError::NotAnMsb(msb))?;
    Ok(Transition {
        msb,
        steps: vec![Step::SetRemaining {
            msb,
            from: node.remaining,
            to: node.remaining.incremented(),
        }],
    })
}

/// Plans marking `msb` as suspended at the observation labelled `label`.
pub fn plan_suspend(tree: &ProgramTree, msb: NodeId, label: &str) -> Result<Transition> {
    let node = tree.msb(msb).ok_or(LifecycleError::NotAnMsb(msb))?;
    let mut transition = Transition::empty(msb);
    if node.suspended.as_deref() != Some(label) {
        transition.steps.push(Step::SetSuspended {
            msb,
            label: Some(label.to_string()),
        });
    }
    Ok(transition)
}

/// The enclosing Or-folder and the unit that moves out of it, if any.
///
/// The unit is the MSB itself or the And-folder holding it. Anything else
/// would mean pulling an MSB out of the middle of a group.
fn alternative_unit(tree: &ProgramTree, msb: NodeId) -> Result<Option<(NodeId, NodeId)>> {
    let Some((or, unit)) = tree.alternative_of(msb) else {
        return Ok(None);
    };
    match tree.kind(unit) {
        Some(NodeKind::Msb(_) | NodeKind::And { .. }) => {}
        Some(other) => {
            return Err(LifecycleError::InvalidStructure {
                msb,
                reason: format!("it sits inside a {} within the or-folder", other.label()),
            });
        }
        None => return Err(LifecycleError::NotAnMsb(msb)),
    }
    if tree.parent(or).is_none() {
        return Err(LifecycleError::InvalidStructure {
            msb,
            reason: "the or-folder has no parent".to_string(),
        });
    }
    Ok(Some((or, unit)))
}

/// Withdraw steps for every eligible MSB inside `or`, except those `skip` excludes.
fn withdrawals(tree: &ProgramTree, or: NodeId, skip: impl Fn(NodeId) -> bool) -> Vec<Step> {
    tree.descendants(or)
        .into_iter()
        .filter(|&n| !skip(n))
        .filter(|&n| tree.msb(n).is_some_and(|m| m.state() == MsbState::Eligible))
        .map(|msb| Step::Withdraw { msb })
        .collect()
}

fn is_within(tree: &ProgramTree, node: NodeId, ancestor: NodeId) -> bool {
    tree.ancestors(node).any(|a| a == ancestor)
}

fn count<I: Iterator>(iter: I) -> u32 {
    u32::try_from(iter.count()).unwrap_or(u32::MAX)
}

// ── Applying ──

/// Applies a planned transition. Never fails for a transition planned
/// against this same tree.
pub fn apply(tree: &mut ProgramTree, transition: &Transition) {
    for step in &transition.steps {
        match step {
            Step::SetRemaining { msb, to, .. } => {
                if let Some(node) = tree.msb_mut(*msb) {
                    node.remaining = *to;
                }
            }
            Step::SetSuspended { msb, label } => {
                if let Some(node) = tree.msb_mut(*msb) {
                    node.suspended.clone_from(label);
                }
            }
            Step::Relocate { unit, or } => tree.relocate_after(*unit, *or),
            Step::SetItemsRemaining { or, to, .. } => {
                if let Some(folder) = tree.or_folder_mut(*or) {
                    folder.items_remaining = *to;
                }
            }
            Step::Withdraw { msb } => {
                if let Some(node) = tree.msb_mut(*msb) {
                    node.remaining = Remaining::Removed;
                }
            }
        }
    }
}

// ── Operations by checksum ──

/// Records one observation of the MSB with `checksum`.
pub fn observe(tree: &mut ProgramTree, checksum: &Checksum) -> Result<Outcome> {
    run(tree, checksum, "observed", plan_observe)
}

/// Withdraws the MSB with `checksum` from scheduling.
pub fn remove(tree: &mut ProgramTree, checksum: &Checksum) -> Result<Outcome> {
    run(tree, checksum, "removed", plan_remove)
}

/// Reverses one observation of the MSB with `checksum`.
pub fn undo(tree: &mut ProgramTree, checksum: &Checksum) -> Result<Outcome> {
    run(tree, checksum, "undone", plan_undo)
}

/// Marks the MSB with `checksum` as suspended at `label`.
pub fn suspend(tree: &mut ProgramTree, checksum: &Checksum, label: &str) -> Result<Outcome> {
    run(tree, checksum, "suspended", |t, m| plan_suspend(t, m, label))
}

fn run(
    tree: &mut ProgramTree,
    checksum: &Checksum,
    verb: &str,
    plan: impl FnOnce(&ProgramTree, NodeId) -> Result<Transition>,
) -> Result<Outcome> {
    let Some(msb) = tree.find_msb(checksum) else {
        debug!(project = tree.project_id(), %checksum, verb, "MSB not in program, nothing to do");
        return Ok(Outcome::Missing);
    };
    let transition = plan(tree, msb)?;
    apply(tree, &transition);

    let remaining = tree.msb(msb).map(|m| m.remaining.to_string());
    info!(
        project = tree.project_id(),
        %checksum,
        verb,
        remaining = remaining.as_deref().unwrap_or("?"),
        withdrawn = transition.withdrawn().len(),
        "MSB {verb}"
    );
    Ok(Outcome::Applied(transition))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::program::{
        DocNode, Msb, OrFolder, ProgramDocument,
        tests::{instrument, target},
    };

    /// An MSB with content unique to `name`, so each has its own checksum.
    fn msb(name: &str, remaining: u32) -> DocNode {
        DocNode::msb(name, remaining).with_child(DocNode::component(target(name)))
    }

    fn tree(children: Vec<DocNode>) -> ProgramTree {
        let mut doc = ProgramDocument::new("M01");
        doc.children = children;
        ProgramTree::from_document(&doc).unwrap()
    }

    fn by_title(tree: &ProgramTree, title: &str) -> NodeId {
        tree.msbs()
            .into_iter()
            .find(|&m| tree.msb(m).unwrap().title == title)
            .unwrap()
    }

    fn checksum_of(tree: &ProgramTree, title: &str) -> Checksum {
        tree.checksum(by_title(tree, title)).unwrap()
    }

    fn remaining(tree: &ProgramTree, title: &str) -> Remaining {
        tree.msb(by_title(tree, title)).unwrap().remaining
    }

    fn first_or(tree: &ProgramTree) -> NodeId {
        tree.descendants(tree.root())
            .into_iter()
            .find(|&n| tree.or_folder(n).is_some())
            .unwrap()
    }

    fn items(tree: &ProgramTree) -> u32 {
        tree.or_folder(first_or(tree)).unwrap().items_remaining
    }

    /// Picks left never exceed the alternatives that can still be picked.
    fn assert_or_invariant(tree: &ProgramTree) {
        for node in tree.descendants(tree.root()) {
            if let Some(or) = tree.or_folder(node) {
                assert!(
                    or.items_remaining <= tree.eligible_alternatives(node),
                    "or-folder {node} has {} picks but {} eligible alternatives",
                    or.items_remaining,
                    tree.eligible_alternatives(node)
                );
            }
        }
    }

    /// For or-folders without an explicit number of items, picks left equal
    /// the alternatives that can still be picked.
    fn assert_or_count_exact(tree: &ProgramTree) {
        assert_or_invariant(tree);
        for node in tree.descendants(tree.root()) {
            if let Some(or) = tree.or_folder(node) {
                assert_eq!(
                    or.items_remaining,
                    tree.eligible_alternatives(node),
                    "or-folder {node} lost track of its eligible alternatives"
                );
            }
        }
    }

    fn observe_title(tree: &mut ProgramTree, title: &str) -> Outcome {
        let checksum = checksum_of(tree, title);
        let outcome = observe(tree, &checksum).unwrap();
        assert_or_invariant(tree);
        outcome
    }

    #[test]
    fn observe_counts_down_and_stops_at_zero() {
        let mut t = tree(vec![msb("A", 2)]);

        observe_title(&mut t, "A");
        assert_eq!(remaining(&t, "A"), Remaining::Count(1));
        assert_eq!(remaining(&t, "A").state(), MsbState::Eligible);

        observe_title(&mut t, "A");
        assert_eq!(remaining(&t, "A"), Remaining::Count(0));
        assert_eq!(remaining(&t, "A").state(), MsbState::Exhausted);

        let outcome = observe_title(&mut t, "A");
        assert_eq!(remaining(&t, "A"), Remaining::Count(0));
        assert!(matches!(outcome, Outcome::Applied(tr) if tr.is_noop()));
    }

    #[test]
    fn observing_removed_msb_changes_nothing() {
        let mut t = tree(vec![
            msb("A", 1).with_remaining(Remaining::Removed),
        ]);
        let outcome = observe_title(&mut t, "A");
        assert_eq!(remaining(&t, "A"), Remaining::Removed);
        assert!(matches!(outcome, Outcome::Applied(tr) if tr.is_noop()));
    }

    #[test]
    fn observed_alternative_moves_after_or_folder() {
        let mut t = tree(vec![
            DocNode::or(vec![msb("A", 1), msb("B", 1), msb("C", 1)]),
            msb("Tail", 1),
        ]);
        let or = first_or(&t);
        assert_eq!(items(&t), 3);

        let outcome = observe_title(&mut t, "B");

        let b = by_title(&t, "B");
        let tail = by_title(&t, "Tail");
        assert_eq!(t.children(t.root()), &[or, b, tail]);
        assert_eq!(t.parent(b), Some(t.root()));
        assert_eq!(items(&t), 2);
        assert_eq!(remaining(&t, "B"), Remaining::Count(0));
        assert_or_count_exact(&t);
        assert!(matches!(outcome, Outcome::Applied(tr) if tr.relocated() == Some(b)));
    }

    #[test]
    fn later_relocations_land_directly_after_or_folder() {
        let mut t = tree(vec![DocNode::or(vec![msb("A", 1), msb("B", 1), msb("C", 1)])]);
        let or = first_or(&t);

        observe_title(&mut t, "A");
        observe_title(&mut t, "B");

        let a = by_title(&t, "A");
        let b = by_title(&t, "B");
        assert_eq!(t.children(t.root()), &[or, b, a]);
        assert_or_count_exact(&t);
    }

    #[test]
    fn observing_every_alternative_empties_or_folder() {
        let mut t = tree(vec![DocNode::or(vec![msb("A", 1), msb("B", 1), msb("C", 1)])]);

        observe_title(&mut t, "A");
        assert_eq!(items(&t), 2);
        observe_title(&mut t, "B");
        assert_eq!(items(&t), 1);
        observe_title(&mut t, "C");
        assert_eq!(items(&t), 0);

        for title in ["A", "B", "C"] {
            assert_eq!(remaining(&t, title), Remaining::Count(0));
        }
        assert!(t.children(first_or(&t)).is_empty());
        assert_or_count_exact(&t);
    }

    #[test]
    fn spent_alternatives_do_not_count_as_picks() {
        let mut t = tree(vec![DocNode::or(vec![
            msb("A", 1),
            msb("B", 0),
            msb("C", 1).with_remaining(Remaining::Removed),
        ])]);
        assert_eq!(items(&t), 1);
        assert_or_count_exact(&t);

        observe_title(&mut t, "A");

        assert_eq!(items(&t), 0);
        assert_eq!(remaining(&t, "B"), Remaining::Count(0));
        assert_eq!(remaining(&t, "C"), Remaining::Removed);
        assert_or_count_exact(&t);
    }

    #[test]
    fn exhausting_picks_withdraws_unobserved_alternatives() {
        let mut t = tree(vec![DocNode::or_choosing(
            3,
            vec![msb("A", 1), msb("B", 1), msb("C", 1), msb("D", 1)],
        )]);

        observe_title(&mut t, "A");
        observe_title(&mut t, "B");
        assert_eq!(remaining(&t, "D"), Remaining::Count(1));

        let outcome = observe_title(&mut t, "C");

        assert_eq!(items(&t), 0);
        assert_eq!(remaining(&t, "D"), Remaining::Removed);
        assert_eq!(remaining(&t, "C"), Remaining::Count(0));
        let d = by_title(&t, "D");
        assert!(matches!(outcome, Outcome::Applied(tr) if tr.withdrawn() == vec![d]));
    }

    #[test]
    fn choosing_one_of_three_removes_the_others() {
        let mut t = tree(vec![DocNode::or_choosing(
            1,
            vec![msb("A", 1), msb("B", 2), msb("C", 1)],
        )]);

        observe_title(&mut t, "B");

        assert_eq!(remaining(&t, "B"), Remaining::Count(1));
        assert_eq!(remaining(&t, "A"), Remaining::Removed);
        assert_eq!(remaining(&t, "C"), Remaining::Removed);
        assert_eq!(t.active_count(), 1);
    }

    #[test]
    fn exhausted_alternative_is_not_withdrawn() {
        let mut t = tree(vec![DocNode::or_choosing(
            1,
            vec![msb("A", 1), msb("B", 0)],
        )]);

        observe_title(&mut t, "A");

        assert_eq!(remaining(&t, "B"), Remaining::Count(0));
    }

    #[test]
    fn multi_repeat_alternative_stays_eligible_outside() {
        let mut t = tree(vec![DocNode::or(vec![msb("A", 2), msb("B", 1)])]);

        observe_title(&mut t, "A");

        assert_eq!(remaining(&t, "A"), Remaining::Count(1));
        assert_eq!(t.nearest_or(by_title(&t, "A")), None);
        assert_eq!(items(&t), 1);

        // Observing it again is a plain decrement now.
        let outcome = observe_title(&mut t, "A");
        assert!(matches!(outcome, Outcome::Applied(tr) if tr.relocated().is_none()));
        assert_eq!(items(&t), 1);
        assert_or_count_exact(&t);
    }

    #[test]
    fn and_folder_moves_as_one_unit() {
        let mut t = tree(vec![DocNode::or(vec![
            DocNode::and(vec![
                DocNode::component(instrument("HARP")),
                msb("A1", 1),
                msb("A2", 1),
            ]),
            msb("B", 1),
        ])]);
        let or = first_or(&t);

        observe_title(&mut t, "A1");

        let a1 = by_title(&t, "A1");
        let a2 = by_title(&t, "A2");
        let and = t.parent(a1).unwrap();
        assert!(matches!(t.kind(and), Some(NodeKind::And { .. })));
        assert_eq!(t.parent(a2), Some(and));
        assert_eq!(t.children(t.root()), &[or, and]);
        assert_eq!(t.children(and).len(), 3);
        assert_eq!(items(&t), 1);
        assert_or_count_exact(&t);
    }

    #[test]
    fn withdrawal_reaches_into_nested_and_folders() {
        let mut t = tree(vec![DocNode::or_choosing(
            1,
            vec![
                msb("A", 1),
                DocNode::and(vec![msb("B1", 1), msb("B2", 1)]),
            ],
        )]);

        observe_title(&mut t, "A");

        assert_eq!(remaining(&t, "B1"), Remaining::Removed);
        assert_eq!(remaining(&t, "B2"), Remaining::Removed);
    }

    #[test]
    fn remove_sets_removed_directly() {
        let mut t = tree(vec![msb("A", 3), msb("B", 0)]);

        let a = checksum_of(&t, "A");
        remove(&mut t, &a).unwrap();
        assert_eq!(remaining(&t, "A"), Remaining::Removed);

        let b = checksum_of(&t, "B");
        remove(&mut t, &b).unwrap();
        assert_eq!(remaining(&t, "B"), Remaining::Removed);
    }

    #[test]
    fn removing_alternative_clamps_picks() {
        let mut t = tree(vec![DocNode::or(vec![msb("A", 1), msb("B", 1)])]);

        let a = checksum_of(&t, "A");
        remove(&mut t, &a).unwrap();
        assert_or_count_exact(&t);
        assert_eq!(items(&t), 1);

        let b = checksum_of(&t, "B");
        remove(&mut t, &b).unwrap();
        assert_or_count_exact(&t);
        assert_eq!(items(&t), 0);
    }

    #[test]
    fn removing_alternative_below_picks_leaves_count() {
        let mut t = tree(vec![DocNode::or_choosing(
            1,
            vec![msb("A", 1), msb("B", 1), msb("C", 1)],
        )]);

        let a = checksum_of(&t, "A");
        remove(&mut t, &a).unwrap();

        assert_eq!(items(&t), 1);
        assert_eq!(remaining(&t, "B"), Remaining::Count(1));
    }

    #[test]
    fn undo_increments_and_reinstates() {
        let mut t = tree(vec![msb("A", 0), msb("B", 1).with_remaining(Remaining::Removed)]);

        let a = checksum_of(&t, "A");
        undo(&mut t, &a).unwrap();
        assert_eq!(remaining(&t, "A"), Remaining::Count(1));

        let b = checksum_of(&t, "B");
        undo(&mut t, &b).unwrap();
        assert_eq!(remaining(&t, "B"), Remaining::Count(1));
    }

    #[test]
    fn suspend_then_observe_clears_label() {
        let mut t = tree(vec![msb("A", 2)]);
        let a = checksum_of(&t, "A");

        suspend(&mut t, &a, "obs-3").unwrap();
        assert_eq!(t.msb(by_title(&t, "A")).unwrap().suspended.as_deref(), Some("obs-3"));
        assert_eq!(remaining(&t, "A").state(), MsbState::Eligible);

        observe(&mut t, &a).unwrap();
        assert_eq!(t.msb(by_title(&t, "A")).unwrap().suspended, None);
    }

    #[test]
    fn missing_checksum_is_a_noop() {
        let mut t = tree(vec![msb("A", 1)]);
        let before = t.to_document();

        let outcome = observe(&mut t, &Checksum::from("0123456789abcdef0123456789abcdef")).unwrap();

        assert_eq!(outcome, Outcome::Missing);
        assert_eq!(t.to_document(), before);
    }

    #[test]
    fn partial_extraction_is_rejected_without_changes() {
        // Built by hand: validation would refuse a folder inside an or-folder.
        let mut t = ProgramTree::new("M01");
        let root = t.root();
        let or = t
            .append(
                root,
                NodeKind::Or(OrFolder {
                    title: None,
                    items_remaining: 1,
                }),
            )
            .unwrap();
        let folder = t.append(or, NodeKind::Folder { title: None }).unwrap();
        let a = t
            .append(folder, NodeKind::Msb(Msb::new("A", Remaining::Count(1))))
            .unwrap();
        let before = t.to_document();

        let err = plan_observe(&t, a).unwrap_err();

        assert!(matches!(err, LifecycleError::InvalidStructure { .. }));
        assert_eq!(t.to_document(), before);

        let checksum = t.checksum(a).unwrap();
        assert!(observe(&mut t, &checksum).is_err());
        assert_eq!(t.to_document(), before);
    }

    #[test]
    fn non_msb_node_is_rejected() {
        let t = tree(vec![msb("A", 1)]);
        let err = plan_observe(&t, t.root()).unwrap_err();
        assert!(matches!(err, LifecycleError::NotAnMsb(_)));
    }
}
