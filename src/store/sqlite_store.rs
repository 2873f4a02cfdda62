use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use super::schema;

const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    pub(super) pool: Arc<Pool<SqliteConnectionManager>>,
}

impl SqliteCredentialStore {
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let pool = if path == Path::new(IN_MEMORY) {
            // Every connection would get its own private database; pin a single one
            Pool::builder()
                .max_size(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .build(SqliteConnectionManager::memory())?
        } else {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let manager = SqliteConnectionManager::file(path).with_init(|conn| {
                // Enable WAL mode for better concurrency
                conn.execute_batch(
                    "PRAGMA journal_mode = WAL;
                     PRAGMA synchronous = NORMAL;
                     PRAGMA busy_timeout = 5000;",
                )?;
                Ok(())
            });

            Pool::builder()
                .max_size(10)
                .min_idle(Some(2))
                .connection_timeout(Duration::from_secs(5))
                .build(manager)?
        };

        schema::initialize_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}
