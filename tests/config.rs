#[cfg(test)]
mod tests {
    use boardsync::libs::config::{BoardConfig, ClientConfig, Config, ServerConfig, DB_FILE_NAME};
    use boardsync::libs::move_task::MoveSettings;
    use parking_lot::{Mutex, MutexGuard};
    use std::path::PathBuf;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    /// Tests in this file swap HOME; they must not overlap.
    static ENV_LOCK: Mutex<()> = parking_lot::const_mutex(());

    /// Points HOME/LOCALAPPDATA at a temporary directory for the duration
    /// of a test.
    struct ConfigTestContext {
        _guard: MutexGuard<'static, ()>,
        temp_dir: TempDir,
    }

    impl TestContext for ConfigTestContext {
        fn setup() -> Self {
            let guard = ENV_LOCK.lock();
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var("HOME", temp_dir.path());
            std::env::set_var("LOCALAPPDATA", temp_dir.path());
            ConfigTestContext {
                _guard: guard,
                temp_dir,
            }
        }
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_default_config(_ctx: &mut ConfigTestContext) {
        let config = Config::default();
        assert!(config.server.is_none());
        assert!(config.client.is_none());
        assert!(config.board.is_none());
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_read_nonexistent_config(_ctx: &mut ConfigTestContext) {
        let config = Config::read().unwrap();
        assert_eq!(config.server, None);
        assert_eq!(config.client, None);
        assert_eq!(config.board_or_default(), BoardConfig::default());
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_save_and_read_config(_ctx: &mut ConfigTestContext) {
        let config = Config {
            server: Some(ServerConfig {
                bind: "0.0.0.0:9000".to_string(),
                database: Some(PathBuf::from("/tmp/board.db")),
            }),
            client: Some(ClientConfig {
                api_url: "https://boards.example.com".to_string(),
                user_id: 42,
                timeout_ms: 1_500,
            }),
            board: None,
        };
        config.save().unwrap();

        let read = Config::read().unwrap();
        assert_eq!(read.server, config.server);
        assert_eq!(read.client, config.client);
        assert!(read.board.is_none());
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_with_defaults_keeps_existing_sections(_ctx: &mut ConfigTestContext) {
        let config = Config {
            board: Some(BoardConfig {
                position_step: 10.0,
                max_parent_depth: 8,
            }),
            ..Config::default()
        }
        .with_defaults();

        assert_eq!(config.server, Some(ServerConfig::default()));
        assert_eq!(config.client, Some(ClientConfig::default()));
        assert_eq!(config.board_or_default().position_step, 10.0);

        let settings = MoveSettings::from(&config.board_or_default());
        assert_eq!(settings.allocator.step(), 10.0);
        assert_eq!(settings.guard.max_depth(), 8);
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_database_path_defaults_to_data_dir(ctx: &mut ConfigTestContext) {
        let path = ServerConfig::default().database_path().unwrap();
        assert!(path.starts_with(ctx.temp_dir.path()));
        assert!(path.ends_with(DB_FILE_NAME));
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_malformed_config_is_an_error(_ctx: &mut ConfigTestContext) {
        Config::default().save().unwrap();
        let path = boardsync::libs::data_storage::DataStorage::new()
            .get_path(boardsync::libs::config::CONFIG_FILE_NAME)
            .unwrap();
        std::fs::write(path, "{ not json").unwrap();

        assert!(Config::read().is_err());
    }
}
