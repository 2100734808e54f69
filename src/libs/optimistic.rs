//! Client-side overlay of pending moves over the last known server state.
//!
//! The store keeps two layers:
//!
//! - **base**: tasks exactly as the server last returned them
//! - **overlays**: at most one pending record per task, holding the placement
//!   the user sees while the commit is in flight
//!
//! Every projection reads the base with the overlays applied on top. A record
//! ends in one of two ways: reconciliation folds the server's answer into the
//! base, rollback simply forgets the record. Either way the record leaves the
//! map, so a task's projected state is always "base" or "base + latest drop".
//!
//! A drop into an exhausted gap renumbers the target container for display:
//! the record carries the siblings' shifted positions, which apply on top of
//! the base until the record leaves. The server's answer then lists the
//! positions it actually wrote.
//!
//! Each applied move bumps a version counter. A commit carries the version it
//! was sent with; a response whose version no longer matches the task's
//! record is stale and must neither reconcile nor roll back.

use super::board::BoardSnapshot;
use super::container::{Container, ContainerRef};
use super::cycle_guard::CycleGuard;
use super::error::CommitError;
use super::move_task::MoveResponse;
use super::position::PositionAllocator;
use super::task::{BoardId, MoveIntent, Placement, SiblingPosition, Task, TaskId};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// The store as shared by a board session, its drag controller and the
/// commit pipeline. Never hold the lock across an `.await`.
pub type SharedStore = Arc<Mutex<OptimisticStore>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    Pending,
    Committed,
    RolledBack,
}

/// One optimistic move.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimisticUpdate {
    pub task_id: TaskId,
    pub overridden: Placement,
    /// Display-only positions for the target's siblings when the drop needed
    /// a renumbering pass.
    pub shifted: Vec<SiblingPosition>,
    pub intent: MoveIntent,
    pub status: UpdateStatus,
    pub created_at_version: u64,
}

/// Handed to the commit pipeline when a move is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommit {
    pub intent: MoveIntent,
    pub version: u64,
}

impl PendingCommit {
    pub fn task_id(&self) -> TaskId {
        self.intent.task_id
    }
}

/// What [`OptimisticStore::settle`] did with a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Committed(OptimisticUpdate),
    RolledBack(OptimisticUpdate),
    /// A newer drop replaced the record, or it is already gone.
    Stale { task_id: TaskId, version: u64 },
}

/// Display order within a container.
fn display_order(a: &Task, b: &Task) -> Ordering {
    a.position
        .total_cmp(&b.position)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Debug, Clone)]
pub struct OptimisticStore {
    board_id: BoardId,
    base: HashMap<TaskId, Task>,
    limits: HashMap<ContainerRef, u32>,
    overlays: HashMap<TaskId, OptimisticUpdate>,
    version: u64,
    allocator: PositionAllocator,
    guard: CycleGuard,
}

impl OptimisticStore {
    pub fn new(snapshot: BoardSnapshot, allocator: PositionAllocator) -> Self {
        let mut store = OptimisticStore {
            board_id: snapshot.board_id,
            base: HashMap::new(),
            limits: HashMap::new(),
            overlays: HashMap::new(),
            version: 0,
            allocator,
            guard: CycleGuard::default(),
        };
        store.replace_base(snapshot);
        store
    }

    pub fn with_guard(mut self, guard: CycleGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Swaps in a fresh server snapshot. Pending overlays stay on top; those
    /// whose task disappeared are dropped.
    pub fn replace_base(&mut self, snapshot: BoardSnapshot) {
        self.board_id = snapshot.board_id;
        self.base = snapshot.tasks.into_iter().map(|task| (task.id, task)).collect();
        self.limits = snapshot
            .limits
            .into_iter()
            .map(|limit| (limit.container, limit.wip_limit))
            .collect();

        let base = &self.base;
        self.overlays.retain(|task_id, _| base.contains_key(task_id));
    }

    pub fn base_task(&self, task_id: TaskId) -> Option<&Task> {
        self.base.get(&task_id)
    }

    pub fn projected_task(&self, task_id: TaskId) -> Option<Task> {
        let task = self.base.get(&task_id)?;
        let own = self.overlays.get(&task_id);
        let mut projected = match own {
            Some(update) => task.with_placement(&update.overridden),
            None => task.clone(),
        };
        let since = own.map_or(0, |update| update.created_at_version);
        if let Some(position) = self.shifted_position(&projected, since) {
            projected.position = position;
        }
        Some(projected)
    }

    /// Position given to `task` by the newest pending drop into its container
    /// that renumbered it after version `since`.
    fn shifted_position(&self, task: &Task, since: u64) -> Option<f64> {
        let container = task.container();
        self.overlays
            .values()
            .filter(|update| update.created_at_version > since && update.intent.to == container)
            .filter_map(|update| {
                update
                    .shifted
                    .iter()
                    .find(|sibling| sibling.task_id == task.id)
                    .map(|sibling| (update.created_at_version, sibling.position))
            })
            .max_by_key(|(version, _)| *version)
            .map(|(_, position)| position)
    }

    /// Every task as the user currently sees it, in display order.
    pub fn projected_tasks(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.base.keys().filter_map(|&task_id| self.projected_task(task_id)).collect();
        tasks.sort_by(display_order);
        tasks
    }

    pub fn wip_limit(&self, container: &ContainerRef) -> Option<u32> {
        self.limits.get(container).copied()
    }

    /// Projected members of `container` in display order.
    pub fn container_members(&self, container: &ContainerRef) -> Vec<Task> {
        let mut members: Vec<Task> = self
            .projected_tasks()
            .into_iter()
            .filter(|task| task.container() == *container)
            .collect();
        members.sort_by(display_order);
        members
    }

    pub fn container(&self, container: &ContainerRef) -> Container {
        let members = self.container_members(container).into_iter().map(|task| task.id).collect();
        Container::new(*container, self.wip_limit(container), members)
    }

    /// Index of the task within its projected container.
    pub fn index_of(&self, task_id: TaskId) -> Option<usize> {
        let task = self.projected_task(task_id)?;
        self.container_members(&task.container()).iter().position(|member| member.id == task_id)
    }

    pub fn pending(&self, task_id: TaskId) -> Option<&OptimisticUpdate> {
        self.overlays.get(&task_id)
    }

    pub fn pending_version(&self, task_id: TaskId) -> Option<u64> {
        self.overlays.get(&task_id).map(|update| update.created_at_version)
    }

    pub fn pending_count(&self) -> usize {
        self.overlays.len()
    }

    /// Pre-check against the projected parent links. The server decides.
    pub fn would_create_cycle(&self, child: TaskId, parent: TaskId) -> bool {
        let parents: HashMap<TaskId, Option<TaskId>> = self
            .base
            .keys()
            .filter_map(|&task_id| self.projected_task(task_id))
            .map(|task| (task.id, task.parent_id))
            .collect();
        self.guard
            .would_create_cycle(&parents, child, parent)
            .unwrap_or_else(|never| match never {})
    }

    /// Shows the move right away and records it as pending.
    ///
    /// Returns `None` when the task is not on this board. A record already
    /// pending for the task is replaced; its in-flight response becomes stale.
    pub fn apply_move_immediate(&mut self, intent: MoveIntent) -> Option<PendingCommit> {
        let current = self.projected_task(intent.task_id)?;

        let siblings: Vec<Task> = self
            .container_members(&intent.to)
            .into_iter()
            .filter(|member| member.id != intent.task_id)
            .collect();
        let positions: Vec<f64> = siblings.iter().map(|sibling| sibling.position).collect();
        let placed = self.allocator.place(&positions, intent.requested_index);
        let shifted: Vec<SiblingPosition> = match placed.renumbered {
            Some(fresh) => siblings
                .iter()
                .zip(fresh)
                .map(|(sibling, position)| SiblingPosition {
                    task_id: sibling.id,
                    position,
                })
                .collect(),
            None => Vec::new(),
        };
        let position = placed.position;
        let parent_id = intent.parent.resolve(current.parent_id);

        self.version += 1;
        let update = OptimisticUpdate {
            task_id: intent.task_id,
            overridden: Placement::new(intent.to, parent_id, position),
            shifted,
            intent: intent.clone(),
            status: UpdateStatus::Pending,
            created_at_version: self.version,
        };

        if self.overlays.insert(intent.task_id, update).is_some() {
            tracing::debug!(task_id = intent.task_id, version = self.version, "pending move replaced");
        }
        tracing::debug!(task_id = intent.task_id, container = %intent.to, position, version = self.version, "move applied optimistically");

        Some(PendingCommit {
            intent,
            version: self.version,
        })
    }

    /// Folds the server's task into the base and retires the record.
    pub fn reconcile(&mut self, task_id: TaskId, server_task: Task) -> Option<OptimisticUpdate> {
        self.base.insert(task_id, server_task);
        let mut update = self.overlays.remove(&task_id)?;
        update.status = UpdateStatus::Committed;
        Some(update)
    }

    /// Writes positions the server assigned during a renumbering pass into
    /// the base. Tasks this board does not know are ignored.
    pub fn apply_renumbered(&mut self, renumbered: &[SiblingPosition]) {
        for sibling in renumbered {
            if let Some(task) = self.base.get_mut(&sibling.task_id) {
                task.position = sibling.position;
            }
        }
    }

    /// Drops the record; the projection falls back to the base.
    pub fn rollback(&mut self, task_id: TaskId) -> Option<OptimisticUpdate> {
        let mut update = self.overlays.remove(&task_id)?;
        update.status = UpdateStatus::RolledBack;
        Some(update)
    }

    /// Applies a commit response unless a newer record superseded it.
    pub fn settle(&mut self, pending: &PendingCommit, outcome: &Result<MoveResponse, CommitError>) -> Settlement {
        let task_id = pending.task_id();
        if self.pending_version(task_id) != Some(pending.version) {
            return Settlement::Stale {
                task_id,
                version: pending.version,
            };
        }

        let settled = match outcome {
            Ok(response) => {
                self.apply_renumbered(&response.renumbered);
                self.reconcile(task_id, response.task.clone()).map(Settlement::Committed)
            }
            Err(_) => self.rollback(task_id).map(Settlement::RolledBack),
        };
        settled.unwrap_or(Settlement::Stale {
            task_id,
            version: pending.version,
        })
    }
}
