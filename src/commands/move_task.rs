//! `boardsync move`: the client path end to end.
//!
//! Loads the board into a session, replays the move as a drag (start, hover,
//! drop), shows the optimistic result and waits for the server's verdict.

use crate::api::client::HttpTransport;
use crate::libs::commit::CommitReport;
use crate::libs::config::Config;
use crate::libs::drag::DragData;
use crate::libs::messages::Message;
use crate::libs::move_task::MoveSettings;
use crate::libs::session::BoardSession;
use crate::libs::task::{BoardId, ColumnId, SprintColumnId, SprintId, TaskId};
use crate::{msg_error_anyhow, msg_info, msg_success, msg_warning};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Task to move
    task: TaskId,

    /// Board the task belongs to
    #[arg(short, long)]
    board: BoardId,

    /// Target board column
    #[arg(long, conflicts_with_all = ["sprint_column", "backlog", "parent"])]
    column: Option<ColumnId>,

    /// Target sprint column (requires --sprint)
    #[arg(long, requires = "sprint", conflicts_with_all = ["backlog", "parent"])]
    sprint_column: Option<SprintColumnId>,

    /// Target sprint; alone it means the sprint backlog
    #[arg(long, conflicts_with_all = ["column", "backlog", "parent"])]
    sprint: Option<SprintId>,

    /// Target the board backlog
    #[arg(long, conflicts_with = "parent")]
    backlog: bool,

    /// Nest the task under this task, keeping its place
    #[arg(long)]
    parent: Option<TaskId>,

    /// Index among the target's other tasks; appends when omitted
    #[arg(short, long)]
    index: Option<usize>,
}

impl MoveArgs {
    fn target(&self) -> DragData {
        if let Some(parent) = self.parent {
            return DragData::Task {
                task_id: parent,
                sprint_id: None,
            };
        }
        match (self.column, self.sprint_column, self.sprint) {
            (Some(column_id), _, _) => DragData::Column { column_id },
            (None, Some(column_id), Some(sprint_id)) => DragData::SprintColumn { sprint_id, column_id },
            (None, _, Some(sprint_id)) => DragData::Sprint { sprint_id },
            _ => DragData::Backlog,
        }
    }
}

pub async fn cmd(move_args: MoveArgs) -> Result<()> {
    let config = Config::read()?;
    let transport = HttpTransport::new(&config.client_or_default())?;
    let settings = MoveSettings::from(&config.board_or_default());

    let mut session = BoardSession::open(transport, move_args.board, settings).await?;
    let target = move_args.target();

    session.drag_start(&DragData::Task {
        task_id: move_args.task,
        sprint_id: None,
    })?;

    let prospect = session.drag_over(&target, move_args.index)?;
    if !prospect.can_accept {
        if let Some(limit) = prospect.wip_limit {
            msg_warning!(Message::WipLimitReached {
                container: prospect.container.to_string(),
                limit,
            });
        }
    }

    let pending = match session.drop_at(Some(&target), move_args.index)? {
        Some(pending) => pending,
        None => {
            msg_info!(Message::TaskAlreadyInPlace(move_args.task));
            return Ok(());
        }
    };

    let index = session.store().lock().index_of(move_args.task).unwrap_or(prospect.index);
    msg_info!(Message::MoveApplied {
        task_id: move_args.task,
        container: pending.intent.to.to_string(),
        index,
    });

    let report = session.commit(pending).await;
    if report.recommends_refetch() {
        msg_info!(Message::RefetchRecommended(session.board_id()));
        let tasks = session.refresh().await?;
        msg_info!(Message::BoardRefreshed {
            board_id: session.board_id(),
            tasks,
        });
    }

    match report {
        CommitReport::Committed { task } => {
            msg_success!(Message::MoveReconciled {
                task_id: task.id,
                position: task.position,
            });
            Ok(())
        }
        CommitReport::RolledBack { intent, error } => {
            if error.is_retryable() {
                msg_info!(Message::RetryAvailable(intent.task_id));
            }
            Err(msg_error_anyhow!(Message::MoveRolledBack {
                task_id: intent.task_id,
                reason: error.to_string(),
            }))
        }
        CommitReport::Stale { task_id, version } => {
            msg_warning!(Message::StaleResponseDiscarded { task_id, version });
            Ok(())
        }
    }
}
