use crate::backend::BackendKind;
use crate::config::ObjectStoreConfig;
use crate::error::{RedbError, VaultError, VaultResult};
use log::{debug, info};
use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::OnceCell;

const SCHEMA_TABLE: TableDefinition<&str, u32> = TableDefinition::new("__jsonvault_schema");
const VERSION_KEY: &str = "version";

/// Table definition for the entity collection named `name`.
pub(crate) fn collection(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

/// Lazily opens and memoizes the transactional database handle.
///
/// The first caller of [`connection`](Self::connection) opens the database and
/// runs the schema upgrade; callers arriving while that open is in flight
/// wait for it instead of starting their own. A failed open is not memoized,
/// so the next call tries again.
pub struct ConnectionManager {
    config: ObjectStoreConfig,
    db: OnceCell<Arc<Database>>,
    open_attempts: AtomicUsize,
}

impl ConnectionManager {
    pub fn new(config: ObjectStoreConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
            open_attempts: AtomicUsize::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    pub fn schema_version(&self) -> u32 {
        self.config.schema_version
    }

    /// Whether a connection has been opened and memoized
    pub fn is_open(&self) -> bool {
        self.db.initialized()
    }

    /// How many times an open has been started, successful or not
    pub fn open_attempts(&self) -> usize {
        self.open_attempts.load(Ordering::SeqCst)
    }

    /// The shared database handle, opening it on first use.
    pub async fn connection(&self) -> VaultResult<Arc<Database>> {
        self.db.get_or_try_init(|| self.open()).await.cloned()
    }

    async fn open(&self) -> VaultResult<Arc<Database>> {
        self.open_attempts.fetch_add(1, Ordering::SeqCst);
        let config = self.config.clone();
        let start = std::time::Instant::now();
        debug!("transactional: opening {}", config.path.display());

        let db = tokio::task::spawn_blocking(move || open_and_upgrade(&config))
            .await
            .map_err(open_failed)??;

        info!(
            "transactional: opened {} (schema v{}) in {:?}",
            self.config.path.display(),
            self.config.schema_version,
            start.elapsed()
        );
        Ok(Arc::new(db))
    }
}

fn open_failed(reason: impl std::fmt::Display) -> VaultError {
    VaultError::BackendOpen {
        backend: BackendKind::Transactional,
        reason: reason.to_string(),
    }
}

fn open_and_upgrade(config: &ObjectStoreConfig) -> VaultResult<Database> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| open_failed(format!("{}: {}", parent.display(), e)))?;
        }
    }

    let db = Database::create(&config.path)
        .map_err(|e| open_failed(format!("{}: {}", config.path.display(), e)))?;

    let stored = stored_version(&db).map_err(open_failed)?;
    match stored {
        Some(found) if found > config.schema_version => {
            return Err(open_failed(format!(
                "stored schema version {} is newer than requested version {}",
                found, config.schema_version
            )));
        }
        Some(found) if found == config.schema_version => {}
        _ => upgrade(&db, config, stored).map_err(open_failed)?,
    }
    Ok(db)
}

fn stored_version(db: &Database) -> Result<Option<u32>, RedbError> {
    let txn = db.begin_read()?;
    let table = match txn.open_table(SCHEMA_TABLE) {
        Ok(table) => table,
        Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(table.get(VERSION_KEY)?.map(|guard| guard.value()))
}

/// Create the collection if missing and record the configured version.
fn upgrade(db: &Database, config: &ObjectStoreConfig, from: Option<u32>) -> Result<(), RedbError> {
    let txn = db.begin_write()?;
    {
        txn.open_table(collection(&config.collection))?;
        let mut schema = txn.open_table(SCHEMA_TABLE)?;
        schema.insert(VERSION_KEY, config.schema_version)?;
    }
    txn.commit()?;
    debug!(
        "transactional: upgraded `{}` from {:?} to v{}",
        config.collection, from, config.schema_version
    );
    Ok(())
}
