use super::container::ContainerRef;
use super::task::{BoardId, Task, TaskId};
use serde::{Deserialize, Serialize};

/// WIP limit of one container, as sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerLimit {
    pub container: ContainerRef,
    pub wip_limit: u32,
}

/// Authoritative state of a board: what the client overlay sits on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub board_id: BoardId,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub limits: Vec<ContainerLimit>,
}

impl BoardSnapshot {
    pub fn empty(board_id: BoardId) -> Self {
        BoardSnapshot {
            board_id,
            tasks: Vec::new(),
            limits: Vec::new(),
        }
    }
}

/// Published after every committed move. Realtime delivery is handled
/// elsewhere; receivers only learn that the board needs re-reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardInvalidation {
    pub board_id: BoardId,
    pub task_id: TaskId,
}
