//! SQLite-based run history for pipeline invocations

use crate::error::Result;
use crate::models::{Invocation, Mode, TaskKind, TaskRun, TaskStatus};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// State manager recording invocations and per-task runs
#[derive(Clone)]
pub struct StateManager {
    conn: Arc<Mutex<Connection>>,
}

impl StateManager {
    /// Create a new state manager with SQLite database
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        // Keep the database lightweight for a per-project tool
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let manager = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        manager.init_schema()?;
        Ok(manager)
    }

    /// Create in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let manager = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        manager.init_schema()?;
        Ok(manager)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS invocations (
                id INTEGER PRIMARY KEY,
                task TEXT NOT NULL,
                mode TEXT NOT NULL,
                started_at TIMESTAMP NOT NULL,
                completed_at TIMESTAMP,
                status TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS task_runs (
                id INTEGER PRIMARY KEY,
                invocation_id INTEGER NOT NULL,
                task_name TEXT NOT NULL,
                kind TEXT NOT NULL,
                status TEXT NOT NULL,
                started_at TIMESTAMP NOT NULL,
                completed_at TIMESTAMP,
                duration_ms INTEGER,
                detail TEXT,
                FOREIGN KEY (invocation_id) REFERENCES invocations(id)
            );

            CREATE INDEX IF NOT EXISTS idx_invocations_task_started ON invocations(task, started_at DESC);
            CREATE INDEX IF NOT EXISTS idx_task_runs_invocation ON task_runs(invocation_id);
            CREATE INDEX IF NOT EXISTS idx_task_runs_status ON task_runs(status);
            ",
        )?;

        Ok(())
    }

    /// Record the start of a CLI invocation for a named task
    pub fn start_invocation(&self, task: &str, mode: Mode) -> Result<i64> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO invocations (task, mode, started_at, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                task,
                mode.to_string(),
                Utc::now(),
                TaskStatus::Running.to_string()
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Record invocation completion
    pub fn finish_invocation(&self, invocation_id: i64, status: TaskStatus) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "UPDATE invocations SET status = ?1, completed_at = ?2 WHERE id = ?3",
            params![status.to_string(), Utc::now(), invocation_id],
        )?;

        Ok(())
    }

    /// Record the start of one task run within an invocation
    pub fn start_task_run(
        &self,
        invocation_id: i64,
        task_name: &str,
        kind: TaskKind,
    ) -> Result<i64> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO task_runs (invocation_id, task_name, kind, status, started_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                invocation_id,
                task_name,
                kind.to_string(),
                TaskStatus::Running.to_string(),
                Utc::now()
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Record task run completion
    pub fn finish_task_run(
        &self,
        task_run_id: i64,
        status: TaskStatus,
        duration: Option<Duration>,
        detail: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "UPDATE task_runs SET status = ?1, completed_at = ?2, duration_ms = ?3, detail = ?4 WHERE id = ?5",
            params![
                status.to_string(),
                Utc::now(),
                duration.map(|d| d.as_millis() as i64),
                detail,
                task_run_id
            ],
        )?;

        Ok(())
    }

    /// Recent invocations, optionally filtered by requested task
    pub fn recent_invocations(&self, task: Option<&str>, limit: usize) -> Result<Vec<Invocation>> {
        let conn = self.conn.lock().unwrap();
        let mut invocations = Vec::new();

        if let Some(name) = task {
            let mut stmt = conn.prepare(
                "SELECT id, task, mode, started_at, completed_at, status
                 FROM invocations WHERE task = ?1
                 ORDER BY started_at DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![name, limit], map_invocation)?;
            for row in rows {
                invocations.push(row?);
            }
        } else {
            let mut stmt = conn.prepare(
                "SELECT id, task, mode, started_at, completed_at, status
                 FROM invocations ORDER BY started_at DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], map_invocation)?;
            for row in rows {
                invocations.push(row?);
            }
        }

        Ok(invocations)
    }

    /// Task runs recorded for one invocation
    pub fn task_runs_for(&self, invocation_id: i64) -> Result<Vec<TaskRun>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, invocation_id, task_name, kind, status, started_at, completed_at, duration_ms, detail
             FROM task_runs WHERE invocation_id = ?1 ORDER BY started_at",
        )?;

        let rows = stmt.query_map(params![invocation_id], |row| {
            Ok(TaskRun {
                id: row.get(0)?,
                invocation_id: row.get(1)?,
                task_name: row.get(2)?,
                kind: row.get(3)?,
                status: parse_task_status(&row.get::<_, String>(4)?),
                started_at: row.get(5)?,
                completed_at: row.get(6)?,
                duration_ms: row.get(7)?,
                detail: row.get(8)?,
            })
        })?;

        let mut runs = Vec::new();
        for row in rows {
            runs.push(row?);
        }

        Ok(runs)
    }
}

fn map_invocation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Invocation> {
    Ok(Invocation {
        id: row.get(0)?,
        task: row.get(1)?,
        mode: row.get(2)?,
        started_at: row.get(3)?,
        completed_at: row.get(4)?,
        status: parse_task_status(&row.get::<_, String>(5)?),
    })
}

fn parse_task_status(s: &str) -> TaskStatus {
    match s {
        "pending" => TaskStatus::Pending,
        "running" => TaskStatus::Running,
        "success" => TaskStatus::Success,
        "failed" => TaskStatus::Failed,
        "timeout" => TaskStatus::Timeout,
        _ => TaskStatus::Failed,
    }
}
