use std::{
    path::PathBuf,
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info};
use rusqlite::{params, Connection};
use tokio::sync::oneshot;

mod migrations;

use migrations::run_migrations;

/// An accepted decision as persisted, keyed `(document_id, target_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDecision {
    pub document_id: String,
    pub target_id: u32,
    pub character: char,
    pub reliability: f64,
    pub decided_at: DateTime<Utc>,
}

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("failed to join DB thread: {join_err:?}");
            }
        }
    }
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| anyhow!("invalid datetime '{value}': {err}"))
}

fn parse_character(value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(anyhow!("character column holds '{value}', expected one glyph")),
    }
}

/// Decision storage for the review core. All SQLite access happens on one
/// dedicated worker thread; callers submit closures through an async bridge.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("epitext-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("failed to enable WAL mode: {err}");
                }
                if let Err(err) = conn.pragma_update(None, "foreign_keys", "ON") {
                    error!("failed to enable foreign keys: {err}");
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => task(&mut conn),
                        DbCommand::Shutdown => break,
                    }
                }
            })
            .with_context(|| "failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("decision database initialized at {}", db_path.display());

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }

    /// Insert or replace the decision for one target.
    pub async fn upsert_decision(&self, decision: StoredDecision) -> Result<()> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO decisions (document_id, target_id, character, reliability, decided_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(document_id, target_id) DO UPDATE SET
                     character = excluded.character,
                     reliability = excluded.reliability,
                     decided_at = excluded.decided_at",
                params![
                    decision.document_id,
                    decision.target_id as i64,
                    decision.character.to_string(),
                    decision.reliability,
                    decision.decided_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to upsert decision")?;
            Ok(())
        })
        .await
    }

    pub async fn delete_decision(&self, document_id: &str, target_id: u32) -> Result<()> {
        let document_id = document_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "DELETE FROM decisions WHERE document_id = ?1 AND target_id = ?2",
                params![document_id, target_id as i64],
            )
            .with_context(|| "failed to delete decision")?;
            Ok(())
        })
        .await
    }

    /// All persisted decisions for one document, in target order. Used to
    /// rehydrate an inspection store at session start.
    pub async fn decisions_for_document(&self, document_id: &str) -> Result<Vec<StoredDecision>> {
        let document_id = document_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT document_id, target_id, character, reliability, decided_at
                 FROM decisions
                 WHERE document_id = ?1
                 ORDER BY target_id ASC",
            )?;

            let mut rows = stmt.query(params![document_id])?;
            let mut decisions = Vec::new();
            while let Some(row) = rows.next()? {
                let target_id: i64 = row.get(1)?;
                decisions.push(StoredDecision {
                    document_id: row.get(0)?,
                    target_id: u32::try_from(target_id)
                        .map_err(|_| anyhow!("target_id {target_id} out of range"))?,
                    character: parse_character(&row.get::<_, String>(2)?)?,
                    reliability: row.get(3)?,
                    decided_at: parse_datetime(&row.get::<_, String>(4)?)?,
                });
            }

            Ok(decisions)
        })
        .await
    }
}
