use crate::db::boards::Boards;
use crate::db::containers::Containers;
use crate::db::db::Db;
use crate::db::tasks::Tasks;
use crate::libs::container::ContainerRef;
use crate::libs::messages::Message;
use crate::libs::task::BoardId;
use crate::libs::view::{ContainerSection, View};
use crate::{msg_bail_anyhow, msg_info};
use anyhow::Result;
use clap::Args;
use rusqlite::Connection;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Board id
    board: BoardId,
}

pub fn cmd(show_args: ShowArgs) -> Result<()> {
    let db = Db::new()?;
    let board_id = show_args.board;

    if Boards::new(&db.conn).get(board_id)?.is_none() {
        msg_bail_anyhow!(Message::BoardNotFound(board_id));
    }

    let sections = board_sections(&db.conn, board_id)?;
    if sections.iter().all(|section| section.tasks.is_empty()) {
        msg_info!(Message::BoardEmpty(board_id));
    }

    View::board(&sections)
}

/// Board columns, then each sprint's columns and backlog, then the board backlog.
pub fn board_sections(conn: &Connection, board_id: BoardId) -> Result<Vec<ContainerSection>> {
    let containers = Containers::new(conn);
    let tasks = Tasks::new(conn);
    let mut sections = Vec::new();

    for column in containers.list_columns(board_id)? {
        sections.push(ContainerSection {
            tasks: tasks.members(&ContainerRef::Column {
                board_id,
                column_id: column.id,
            })?,
            title: column.name,
            wip_limit: column.wip_limit,
        });
    }

    for sprint in containers.list_sprints(board_id)? {
        for column in containers.list_sprint_columns(sprint.id)? {
            sections.push(ContainerSection {
                tasks: tasks.members(&ContainerRef::SprintColumn {
                    sprint_id: sprint.id,
                    sprint_column_id: column.id,
                })?,
                title: format!("{} / {}", sprint.name, column.name),
                wip_limit: column.wip_limit,
            });
        }
        sections.push(ContainerSection {
            tasks: tasks.members(&ContainerRef::SprintBacklog { sprint_id: sprint.id })?,
            title: format!("{} / Backlog", sprint.name),
            wip_limit: None,
        });
    }

    sections.push(ContainerSection {
        tasks: tasks.members(&ContainerRef::Backlog { board_id })?,
        title: "Backlog".to_string(),
        wip_limit: None,
    });

    Ok(sections)
}
