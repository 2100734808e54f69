/// Every user-facing message boardsync prints.
///
/// Text lives in `display.rs`; call sites only pick a variant and its data.
#[derive(Debug, Clone)]
pub enum Message {
    // === CONFIGURATION MESSAGES ===
    ConfigSaved(String), // path
    ConfigAlreadyExists(String), // path

    // === DATABASE MESSAGES ===
    DatabaseReady(String, u32), // path, schema version
    MigrationsFound(usize),        // count
    RunningMigration(u32, String), // version, name
    MigrationCompleted(u32),       // version
    MigrationFailed(u32, String),  // version, error
    AllMigrationsCompleted,
    DatabaseUpToDate,

    // === DEMO BOARD MESSAGES ===
    DemoBoardSeeded {
        board_id: i64,
        user_id: i64,
    },
    DemoColumn {
        column_id: i64,
        name: String,
        wip_limit: Option<u32>,
    },

    // === SERVER MESSAGES ===
    ServerListening(String), // address
    ServerStopped,
    MoveCommitted {
        task_id: i64,
        container: String,
    },
    MoveRejected {
        task_id: i64,
        reason: String,
    },
    InvalidationDropped(i64), // board id

    // === CLIENT MESSAGES ===
    DragStarted(i64),           // task id
    DragCancelled(i64),         // task id
    DropOutsideTargets(i64),    // task id
    DropTargetInvalid(String),  // reason
    TaskNotOnBoard(i64),        // task id
    MoveApplied {
        task_id: i64,
        container: String,
        index: usize,
    },
    MoveReconciled {
        task_id: i64,
        position: f64,
    },
    MoveRolledBack {
        task_id: i64,
        reason: String,
    },
    StaleResponseDiscarded {
        task_id: i64,
        version: u64,
    },
    RetryAvailable(i64),  // task id
    RefetchRecommended(i64), // board id
    BoardRefreshed {
        board_id: i64,
        tasks: usize,
    },
    BoardEmpty(i64), // board id
    BoardNotFound(i64), // board id
    TaskAlreadyInPlace(i64), // task id
    WipLimitReached {
        container: String,
        limit: u32,
    },
}
