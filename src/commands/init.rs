//! Configuration and database initialization.
//!
//! Writes the configuration with every section filled in (an existing file is
//! kept unless `--force` is given), migrates the database and, with `--demo`,
//! seeds a small board to try moves against.

use crate::db::boards::Boards;
use crate::db::containers::Containers;
use crate::db::db::Db;
use crate::db::migrations::get_db_version;
use crate::db::tasks::Tasks;
use crate::libs::config::{Config, CONFIG_FILE_NAME};
use crate::libs::container::ContainerRef;
use crate::libs::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::libs::position::PositionAllocator;
use crate::libs::task::{BoardId, ColumnId, NewTask, UserId};
use crate::{msg_info, msg_print, msg_success};
use anyhow::Result;
use clap::Args;
use rusqlite::Connection;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Seed a demo board for the configured client user
    #[arg(long)]
    demo: bool,

    /// Overwrite an existing configuration file
    #[arg(short, long)]
    force: bool,
}

/// Ids of the seeded demo board.
#[derive(Debug, Clone)]
pub struct DemoBoard {
    pub board_id: BoardId,
    pub columns: Vec<(ColumnId, String, Option<u32>)>,
}

pub fn cmd(init_args: InitArgs) -> Result<()> {
    let config_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
    let config = if config_path.exists() && !init_args.force {
        msg_info!(Message::ConfigAlreadyExists(config_path.display().to_string()));
        Config::read()?.with_defaults()
    } else {
        let config = Config::read().unwrap_or_default().with_defaults();
        config.save()?;
        msg_success!(Message::ConfigSaved(config_path.display().to_string()));
        config
    };

    let db_path = config.server_or_default().database_path()?;
    let db = Db::open(&db_path)?;
    msg_success!(Message::DatabaseReady(db_path.display().to_string(), get_db_version(&db.conn)?));

    if init_args.demo {
        let user_id = config.client_or_default().user_id;
        let allocator = PositionAllocator::new(config.board_or_default().position_step);
        let demo = seed_demo(&db.conn, user_id, &allocator)?;

        msg_success!(Message::DemoBoardSeeded {
            board_id: demo.board_id,
            user_id,
        });
        for (column_id, name, wip_limit) in demo.columns {
            msg_print!(Message::DemoColumn { column_id, name, wip_limit });
        }
    }

    Ok(())
}

/// Creates an organization owned by `user_id` with one board: three columns
/// ("Doing" limited to 2), a sprint with two columns and a few tasks,
/// including one sub-item.
pub fn seed_demo(conn: &Connection, user_id: UserId, allocator: &PositionAllocator) -> Result<DemoBoard> {
    let boards = Boards::new(conn);
    let containers = Containers::new(conn);
    let tasks = Tasks::new(conn);

    let organization_id = boards.create_organization("Demo")?;
    boards.add_member(organization_id, user_id)?;
    let board_id = boards.create(organization_id, "Demo board")?;

    let mut columns = Vec::new();
    for (name, wip_limit) in [("To Do", None), ("Doing", Some(2)), ("Done", None)] {
        let column_id = containers.create_column(board_id, name, wip_limit)?;
        columns.push((column_id, name.to_string(), wip_limit));
    }
    let column = |index: usize| ContainerRef::Column {
        board_id,
        column_id: columns[index].0,
    };

    let sprint_id = containers.create_sprint(board_id, "Sprint 1")?;
    let sprint_todo = containers.create_sprint_column(sprint_id, "Sprint To Do", None)?;
    containers.create_sprint_column(sprint_id, "Sprint Doing", Some(3))?;

    let design = tasks.insert(&NewTask::new("Design the schema", board_id, column(0)), allocator)?;
    tasks.insert(&NewTask::new("Write migrations", board_id, column(0)), allocator)?;
    tasks.insert(&NewTask::new("Review the API", board_id, column(0)).with_parent(design.id), allocator)?;
    tasks.insert(&NewTask::new("Set up CI", board_id, column(1)), allocator)?;
    tasks.insert(&NewTask::new("Project kickoff", board_id, column(2)), allocator)?;
    tasks.insert(
        &NewTask::new(
            "Plan sprint goals",
            board_id,
            ContainerRef::SprintColumn {
                sprint_id,
                sprint_column_id: sprint_todo,
            },
        ),
        allocator,
    )?;
    tasks.insert(&NewTask::new("Estimate stories", board_id, ContainerRef::SprintBacklog { sprint_id }), allocator)?;
    tasks.insert(&NewTask::new("Collect feedback", board_id, ContainerRef::Backlog { board_id }), allocator)?;

    Ok(DemoBoard { board_id, columns })
}
