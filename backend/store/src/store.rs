use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection};
use tracing::info;

use docverify_core::Submission;

/// SQLite-backed submission store. Records are inserted once and never
/// updated or deleted.
pub struct SubmissionStore {
    conn: Mutex<Connection>,
}

impl SubmissionStore {
    /// Open or create the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let store = Self::with_connection(conn)?;
        info!(path = %path.display(), "Submission store opened");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS submissions (
                id TEXT PRIMARY KEY,
                submitted_at TEXT NOT NULL,
                has_mismatches INTEGER NOT NULL,
                form TEXT NOT NULL,
                documents TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_submissions_submitted_at ON submissions(submitted_at);",
        )
        .context("Failed to create submissions schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("submission store lock poisoned"))
    }

    /// Insert a submission.
    pub fn insert(&self, submission: &Submission) -> Result<()> {
        let form = serde_json::to_string(&submission.form)?;
        let documents = serde_json::to_string(&submission.documents)?;
        self.conn()?
            .execute(
                "INSERT INTO submissions (id, submitted_at, has_mismatches, form, documents)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    submission.id.to_string(),
                    submission.submission_date.to_rfc3339(),
                    submission.has_mismatches,
                    form,
                    documents,
                ],
            )
            .with_context(|| format!("Failed to insert submission {}", submission.id))?;
        Ok(())
    }

    /// Count all stored submissions.
    pub fn count(&self) -> Result<usize> {
        let count: usize = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM submissions", [], |row| row.get(0))?;
        Ok(count)
    }
}
