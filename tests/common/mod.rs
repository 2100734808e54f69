//! Shared board fixture for the integration tests.
#![allow(dead_code)]

use boardsync::db::boards::Boards;
use boardsync::db::containers::Containers;
use boardsync::db::db::Db;
use boardsync::db::tasks::Tasks;
use boardsync::libs::container::ContainerRef;
use boardsync::libs::position::PositionAllocator;
use boardsync::libs::task::{BoardId, ColumnId, NewTask, SprintColumnId, SprintId, Task, TaskId, UserId};
use rusqlite::Connection;
use std::path::PathBuf;
use tempfile::TempDir;
use test_context::AsyncTestContext;

pub const MEMBER: UserId = 1;
pub const OUTSIDER: UserId = 99;

/// One board owned by [`MEMBER`]:
///
/// - "To Do": `a`, `b`, `c`
/// - "Doing" (WIP limit 2): `d`, `e`
/// - "Done": `f`
/// - "Sprint 1" with "Sprint To Do" and "Sprint Doing" (WIP limit 1), both empty
/// - board backlog: `g`
///
/// plus a second board in another organization with one column and task `x`.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub board_id: BoardId,
    pub todo: ColumnId,
    pub doing: ColumnId,
    pub done: ColumnId,
    pub sprint: SprintId,
    pub sprint_todo: SprintColumnId,
    pub sprint_doing: SprintColumnId,
    pub a: TaskId,
    pub b: TaskId,
    pub c: TaskId,
    pub d: TaskId,
    pub e: TaskId,
    pub f: TaskId,
    pub g: TaskId,
    pub other_board: BoardId,
    pub other_column: ColumnId,
    pub other_sprint: SprintId,
    pub x: TaskId,
}

impl Fixture {
    pub fn column(&self, column_id: ColumnId) -> ContainerRef {
        ContainerRef::Column {
            board_id: self.board_id,
            column_id,
        }
    }

    pub fn sprint_column(&self, sprint_column_id: SprintColumnId) -> ContainerRef {
        ContainerRef::SprintColumn {
            sprint_id: self.sprint,
            sprint_column_id,
        }
    }
}

pub fn seed(conn: &Connection) -> Fixture {
    let allocator = PositionAllocator::default();
    let boards = Boards::new(conn);
    let containers = Containers::new(conn);
    let tasks = Tasks::new(conn);

    let organization = boards.create_organization("Acme").unwrap();
    boards.add_member(organization, MEMBER).unwrap();
    let board_id = boards.create(organization, "Product").unwrap();

    let todo = containers.create_column(board_id, "To Do", None).unwrap();
    let doing = containers.create_column(board_id, "Doing", Some(2)).unwrap();
    let done = containers.create_column(board_id, "Done", None).unwrap();
    let sprint = containers.create_sprint(board_id, "Sprint 1").unwrap();
    let sprint_todo = containers.create_sprint_column(sprint, "Sprint To Do", None).unwrap();
    let sprint_doing = containers.create_sprint_column(sprint, "Sprint Doing", Some(1)).unwrap();

    let column = |column_id| ContainerRef::Column { board_id, column_id };
    let insert = |title: &str, container| tasks.insert(&NewTask::new(title, board_id, container), &allocator).unwrap().id;

    let a = insert("a", column(todo));
    let b = insert("b", column(todo));
    let c = insert("c", column(todo));
    let d = insert("d", column(doing));
    let e = insert("e", column(doing));
    let f = insert("f", column(done));
    let g = insert("g", ContainerRef::Backlog { board_id });

    let other_organization = boards.create_organization("Elsewhere").unwrap();
    boards.add_member(other_organization, OUTSIDER).unwrap();
    let other_board = boards.create(other_organization, "Other").unwrap();
    let other_column = containers.create_column(other_board, "Other To Do", None).unwrap();
    let other_sprint = containers.create_sprint(other_board, "Other Sprint").unwrap();
    let x = tasks
        .insert(
            &NewTask::new(
                "x",
                other_board,
                ContainerRef::Column {
                    board_id: other_board,
                    column_id: other_column,
                },
            ),
            &allocator,
        )
        .unwrap()
        .id;

    Fixture {
        board_id,
        todo,
        doing,
        done,
        sprint,
        sprint_todo,
        sprint_doing,
        a,
        b,
        c,
        d,
        e,
        f,
        g,
        other_board,
        other_column,
        other_sprint,
        x,
    }
}

/// Ids of a container's members in display order.
pub fn member_ids(conn: &Connection, container: &ContainerRef) -> Vec<TaskId> {
    Tasks::new(conn).members(container).unwrap().iter().map(|task| task.id).collect()
}

pub fn task(conn: &Connection, task_id: TaskId) -> Task {
    Tasks::new(conn).get(task_id).unwrap().unwrap()
}

/// A migrated, seeded database in a temporary directory.
pub struct BoardContext {
    _temp_dir: TempDir,
    pub path: PathBuf,
    pub db: Db,
    pub fixture: Fixture,
}

impl AsyncTestContext for BoardContext {
    async fn setup() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("boardsync.db");
        let db = Db::open(&path).unwrap();
        let fixture = seed(&db.conn);
        BoardContext {
            _temp_dir: temp_dir,
            path,
            db,
            fixture,
        }
    }
}
