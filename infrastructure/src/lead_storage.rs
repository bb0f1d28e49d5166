use chrono::{DateTime, Utc};
use domain::error::PersistenceError;
use domain::lead::{Lead, LeadStore};
use rusqlite::{params, Connection, Result as SqlResult};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// SQLite-backed append log of captured leads. Clones share one connection.
#[derive(Clone)]
pub struct LeadStorage {
    conn: Arc<Mutex<Connection>>,
}

impl LeadStorage {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
        }
        let conn = Connection::open(db_path).map_err(storage_err)?;
        Self::setup_db(&conn).map_err(storage_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Self::setup_db(&conn).map_err(storage_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn setup_db(conn: &Connection) -> SqlResult<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            CREATE TABLE IF NOT EXISTS leads (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT '',
                company TEXT NOT NULL DEFAULT '',
                message TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            );
        ",
        )
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, PersistenceError> {
        self.conn
            .lock()
            .map_err(|_| PersistenceError::Storage("lead store connection poisoned".to_string()))
    }

    pub fn insert(&self, lead: &Lead) -> Result<(), PersistenceError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO leads (id, name, email, phone, company, message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                lead.id,
                lead.name,
                lead.email,
                lead.phone,
                lead.company,
                lead.message,
                lead.created_at.to_rfc3339()
            ],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    pub fn get_all_leads(&self) -> Result<Vec<Lead>, PersistenceError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, email, phone, company, message, created_at
                 FROM leads ORDER BY seq",
            )
            .map_err(storage_err)?;
        let mut rows = stmt.query([]).map_err(storage_err)?;
        let mut leads = Vec::new();
        while let Some(row) = rows.next().map_err(storage_err)? {
            let created_at: String = row.get(6).map_err(storage_err)?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| PersistenceError::Storage(format!("bad created_at {created_at:?}: {e}")))?
                .with_timezone(&Utc);
            leads.push(Lead {
                id: row.get(0).map_err(storage_err)?,
                name: row.get(1).map_err(storage_err)?,
                email: row.get(2).map_err(storage_err)?,
                phone: row.get(3).map_err(storage_err)?,
                company: row.get(4).map_err(storage_err)?,
                message: row.get(5).map_err(storage_err)?,
                created_at,
            });
        }
        Ok(leads)
    }
}

impl LeadStore for LeadStorage {
    async fn append(&self, lead: Lead) -> Result<Lead, PersistenceError> {
        let store = self.clone();
        let lead = run_blocking(move || {
            store.insert(&lead)?;
            Ok(lead)
        })
        .await?;
        tracing::info!(lead_id = %lead.id, "stored lead");
        Ok(lead)
    }

    async fn list(&self) -> Result<Vec<Lead>, PersistenceError> {
        let store = self.clone();
        run_blocking(move || store.get_all_leads()).await
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T, PersistenceError>
where
    F: FnOnce() -> Result<T, PersistenceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| PersistenceError::Storage(format!("lead store task failed: {e}")))?
}

fn storage_err(e: rusqlite::Error) -> PersistenceError {
    PersistenceError::Storage(e.to_string())
}
