//! Parent/child cycle prevention for sub-items.
//!
//! Assigning `child` under `parent` is safe when walking up from `parent`
//! never reaches `child`. The walk is iterative, remembers every visited node
//! and stops after a bounded number of hops, so already-corrupted parent links
//! cannot make it loop forever.

use super::task::TaskId;
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;

/// Source of parent links. The server reads them inside the move transaction;
/// the client reads its projected view.
pub trait ParentLookup {
    type Error;

    /// Parent of `task_id`, or `None` for a root or an unknown task.
    fn parent_of(&self, task_id: TaskId) -> Result<Option<TaskId>, Self::Error>;
}

impl ParentLookup for HashMap<TaskId, Option<TaskId>> {
    type Error = Infallible;

    fn parent_of(&self, task_id: TaskId) -> Result<Option<TaskId>, Infallible> {
        Ok(self.get(&task_id).copied().flatten())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleCheck {
    /// The link can be written.
    Acyclic,
    /// `child` already hangs directly under `parent`; nothing to write.
    AlreadyChild,
    /// The link would close a loop, or the ancestor chain is unusable.
    Cycle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleGuard {
    max_depth: usize,
}

impl CycleGuard {
    pub fn new(max_depth: usize) -> Self {
        CycleGuard {
            max_depth: max_depth.max(1),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn check<L: ParentLookup>(&self, lookup: &L, child: TaskId, parent: TaskId) -> Result<CycleCheck, L::Error> {
        if child == parent {
            return Ok(CycleCheck::Cycle);
        }
        if lookup.parent_of(child)? == Some(parent) {
            return Ok(CycleCheck::AlreadyChild);
        }

        let mut visited = HashSet::new();
        let mut current = Some(parent);
        let mut hops = 0;

        while let Some(node) = current {
            if node == child {
                return Ok(CycleCheck::Cycle);
            }
            if !visited.insert(node) {
                tracing::warn!(task_id = node, "parent chain loops back on itself");
                return Ok(CycleCheck::Cycle);
            }
            if hops >= self.max_depth {
                tracing::warn!(parent, max_depth = self.max_depth, "parent chain exceeds the depth bound");
                return Ok(CycleCheck::Cycle);
            }
            hops += 1;
            current = lookup.parent_of(node)?;
        }

        Ok(CycleCheck::Acyclic)
    }

    pub fn would_create_cycle<L: ParentLookup>(&self, lookup: &L, child: TaskId, parent: TaskId) -> Result<bool, L::Error> {
        Ok(self.check(lookup, child, parent)? == CycleCheck::Cycle)
    }
}

impl Default for CycleGuard {
    fn default() -> Self {
        CycleGuard::new(64)
    }
}
