//! Embedded relational persistence (spec §4.2, component C2).
//!
//! Single-writer SQLite store behind a mutex, WAL journaling, FTS5 search
//! index, migration ledger, and HMAC tamper evidence on observations.
//! Grounded on `cocode-retrieval`'s `SqliteVecStore` (`Arc<Mutex<Connection>>`
//! wrapping a bundled rusqlite connection with perf pragmas).

mod error;
mod fts;
mod hmac_tag;
mod migrations;
pub mod types;

pub use error::Result;
pub use error::StoreErr;
pub use fts::escape_fts_query;
pub use types::*;

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;

/// Maximum size, in bytes, of a queue payload after scrubbing (spec §3).
pub const MAX_QUEUE_PAYLOAD_BYTES: usize = 100 * 1024;

pub fn now_epoch() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub struct Store {
    conn: Arc<Mutex<Connection>>,
    hmac_key: Vec<u8>,
}

impl Store {
    /// Open (creating if absent) the database at `dir/turnmem.db`. `dir`
    /// is created with mode 0700, the database file with mode 0600
    /// (spec §4.2, §6.3).
    pub fn open(dir: &Path, hmac_key: Vec<u8>) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|source| StoreErr::Permissions {
            path: dir.to_path_buf(),
            source,
        })?;
        harden_dir(dir)?;

        let db_path = dir.join("turnmem.db");
        let mut conn = Connection::open(&db_path).map_err(|source| StoreErr::Open {
            path: db_path.clone(),
            source,
        })?;
        harden_file(&db_path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -16000;",
        )
        .map_err(|source| StoreErr::Open {
            path: db_path.clone(),
            source,
        })?;

        migrations::run(&mut conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            hmac_key,
        })
    }

    /// In-memory store for tests: no file hardening, migrations still run.
    pub fn open_in_memory(hmac_key: Vec<u8>) -> Result<Self> {
        let mut conn = Connection::open_in_memory().map_err(|source| StoreErr::Open {
            path: "<memory>".into(),
            source,
        })?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|source| StoreErr::Open {
                path: "<memory>".into(),
                source,
            })?;
        migrations::run(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            hmac_key,
        })
    }

    pub fn close(self) {
        // Dropping `conn` closes the underlying connection; this method
        // exists to give callers an explicit, self-documenting shutdown
        // step matching spec §4.2's operation list.
        drop(self);
    }

    // ---------------------------------------------------------------
    // Sessions
    // ---------------------------------------------------------------

    /// Idempotent: a second call with the same `external_key` returns the
    /// same row rather than erroring or duplicating.
    pub fn create_session(&self, external_key: &str, project: &str) -> Result<Session> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR IGNORE INTO sessions (external_key, project, prompt_count, status, created_at)
             VALUES (?1, ?2, 0, 'active', ?3)",
            params![external_key, project, now_epoch()],
        )?;
        drop(conn);
        #[allow(clippy::expect_used)]
        Ok(self
            .get_session_by_key(external_key)?
            .expect("row was just inserted or already existed"))
    }

    /// Backfills `project` on an existing session if it was previously
    /// empty (used by the queue engine when a hook enqueues before the
    /// project is known; spec §4.5 `enqueue`).
    pub fn backfill_session_project(&self, session_id: i64, project: &str) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE sessions SET project = ?2
             WHERE id = ?1 AND (project IS NULL OR project = '')",
            params![session_id, project],
        )?;
        Ok(())
    }

    pub fn get_session_by_key(&self, external_key: &str) -> Result<Option<Session>> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id, external_key, project, first_prompt, prompt_count, status, created_at, completed_at
             FROM sessions WHERE external_key = ?1",
            params![external_key],
            row_to_session,
        )
        .optional()
        .map_err(StoreErr::from)
    }

    pub fn get_session_by_id(&self, id: i64) -> Result<Option<Session>> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id, external_key, project, first_prompt, prompt_count, status, created_at, completed_at
             FROM sessions WHERE id = ?1",
            params![id],
            row_to_session,
        )
        .optional()
        .map_err(StoreErr::from)
    }

    pub fn list_sessions(
        &self,
        project: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Session>> {
        let conn = self.lock();
        let sql = "SELECT id, external_key, project, first_prompt, prompt_count, status, created_at, completed_at
                    FROM sessions
                    WHERE (?1 IS NULL OR project = ?1)
                    ORDER BY created_at DESC
                    LIMIT ?2 OFFSET ?3";
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![project, limit, offset], row_to_session)?;
        collect(rows)
    }

    pub fn set_first_prompt(&self, session_id: i64, text: &str) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE sessions SET first_prompt = ?2 WHERE id = ?1 AND first_prompt IS NULL",
            params![session_id, text],
        )?;
        Ok(())
    }

    pub fn update_session_status(&self, id: i64, status: SessionStatus) -> Result<()> {
        let conn = self.lock();
        let completed_at = matches!(status, SessionStatus::Completed).then(now_epoch);
        conn.execute(
            "UPDATE sessions SET status = ?2, completed_at = COALESCE(?3, completed_at) WHERE id = ?1",
            params![id, status.as_str(), completed_at],
        )?;
        Ok(())
    }

    /// Atomically bump the prompt counter and return its new value.
    pub fn increment_prompt_counter(&self, session_id: i64) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "UPDATE sessions SET prompt_count = prompt_count + 1 WHERE id = ?1",
            params![session_id],
        )?;
        conn.query_row(
            "SELECT prompt_count FROM sessions WHERE id = ?1",
            params![session_id],
            |row| row.get(0),
        )
        .map_err(StoreErr::from)
    }

    // ---------------------------------------------------------------
    // User prompts
    // ---------------------------------------------------------------

    pub fn insert_user_prompt(
        &self,
        session_id: i64,
        prompt_number: i64,
        text: &str,
    ) -> Result<UserPrompt> {
        let conn = self.lock();
        let created_at = now_epoch();
        conn.execute(
            "INSERT INTO user_prompts (session_id, prompt_number, text, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, prompt_number, text, created_at],
        )?;
        let id = conn.last_insert_rowid();
        Ok(UserPrompt {
            id,
            session_id,
            prompt_number,
            text: text.to_string(),
            created_at,
        })
    }

    /// Most recent user prompt recorded for a session, if any — used by
    /// the compressor to fill in `user_goal` when processing a queued
    /// tool call (spec §6.2).
    pub fn get_latest_user_prompt(&self, session_id: i64) -> Result<Option<UserPrompt>> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id, session_id, prompt_number, text, created_at
             FROM user_prompts WHERE session_id = ?1 ORDER BY prompt_number DESC LIMIT 1",
            params![session_id],
            |row| {
                Ok(UserPrompt {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    prompt_number: row.get(2)?,
                    text: row.get(3)?,
                    created_at: row.get(4)?,
                })
            },
        )
        .optional()
        .map_err(StoreErr::from)
    }

    // ---------------------------------------------------------------
    // Observations
    // ---------------------------------------------------------------

    pub fn insert_observation(&self, new: NewObservation) -> Result<Observation> {
        let tag = hmac_tag::compute(&self.hmac_key, &new.compressed, &new.narrative);
        let created_at = now_epoch();
        let conn = self.lock();
        conn.execute(
            "INSERT INTO observations
                (session_id, prompt_number, tool_name, raw_input, compressed, obs_type, title, narrative, hmac, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                new.session_id,
                new.prompt_number,
                new.tool_name,
                new.raw_input,
                new.compressed,
                new.obs_type.as_str(),
                new.title,
                new.narrative,
                tag,
                created_at,
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Observation {
            id,
            session_id: new.session_id,
            prompt_number: new.prompt_number,
            tool_name: new.tool_name,
            raw_input: new.raw_input,
            compressed: new.compressed,
            obs_type: new.obs_type,
            title: new.title,
            narrative: new.narrative,
            hmac: Some(tag),
            created_at,
            hmac_valid: true,
        })
    }

    pub fn get_observation(&self, id: i64) -> Result<Option<Observation>> {
        let conn = self.lock();
        let obs = conn
            .query_row(
                "SELECT id, session_id, prompt_number, tool_name, raw_input, compressed, obs_type, title, narrative, hmac, created_at
                 FROM observations WHERE id = ?1",
                params![id],
                row_to_observation,
            )
            .optional()?;
        Ok(obs.map(|o| self.verify_observation(o)))
    }

    pub fn get_observations_by_ids(&self, ids: &[i64]) -> Result<Vec<Observation>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "SELECT id, session_id, prompt_number, tool_name, raw_input, compressed, obs_type, title, narrative, hmac, created_at
             FROM observations WHERE id IN ({placeholders}) ORDER BY created_at ASC"
        );
        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let params: Vec<&dyn rusqlite::ToSql> =
            ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
        let rows = stmt.query_map(params.as_slice(), row_to_observation)?;
        let observations = collect(rows)?;
        Ok(observations
            .into_iter()
            .map(|o| self.verify_observation(o))
            .collect())
    }

    pub fn list_observations(
        &self,
        project: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Observation>, i64)> {
        let conn = self.lock();
        let sql = "SELECT o.id, o.session_id, o.prompt_number, o.tool_name, o.raw_input, o.compressed,
                          o.obs_type, o.title, o.narrative, o.hmac, o.created_at
                   FROM observations o
                   JOIN sessions s ON s.id = o.session_id
                   WHERE (?1 IS NULL OR s.project = ?1)
                   ORDER BY o.created_at DESC
                   LIMIT ?2 OFFSET ?3";
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![project, limit, offset], row_to_observation)?;
        let observations = collect(rows)?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM observations o JOIN sessions s ON s.id = o.session_id
             WHERE (?1 IS NULL OR s.project = ?1)",
            params![project],
            |r| r.get(0),
        )?;
        drop(conn);
        Ok((
            observations
                .into_iter()
                .map(|o| self.verify_observation(o))
                .collect(),
            total,
        ))
    }

    pub fn observations_for_session(&self, session_id: i64) -> Result<Vec<Observation>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, session_id, prompt_number, tool_name, raw_input, compressed, obs_type, title, narrative, hmac, created_at
             FROM observations WHERE session_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![session_id], row_to_observation)?;
        let observations = collect(rows)?;
        Ok(observations
            .into_iter()
            .map(|o| self.verify_observation(o))
            .collect())
    }

    fn verify_observation(&self, mut obs: Observation) -> Observation {
        let valid = hmac_tag::verify(
            &self.hmac_key,
            &obs.compressed,
            &obs.narrative,
            obs.hmac.as_deref(),
        );
        if !valid {
            tracing::warn!(observation_id = obs.id, "HMAC mismatch on observation read");
        }
        obs.hmac_valid = valid;
        obs
    }

    // ---------------------------------------------------------------
    // Summaries
    // ---------------------------------------------------------------

    pub fn insert_summary(
        &self,
        session_id: i64,
        request: Option<String>,
        investigated: Option<String>,
        learned: Option<String>,
        completed: Option<String>,
        next_steps: Option<String>,
    ) -> Result<Summary> {
        let created_at = now_epoch();
        let conn = self.lock();
        conn.execute(
            "INSERT INTO summaries (session_id, request, investigated, learned, completed, next_steps, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![session_id, request, investigated, learned, completed, next_steps, created_at],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Summary {
            id,
            session_id,
            request,
            investigated,
            learned,
            completed,
            next_steps,
            created_at,
        })
    }

    pub fn recent_summaries(&self, project: Option<&str>, limit: i64) -> Result<Vec<Summary>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT sm.id, sm.session_id, sm.request, sm.investigated, sm.learned, sm.completed, sm.next_steps, sm.created_at
             FROM summaries sm
             JOIN sessions s ON s.id = sm.session_id
             WHERE (?1 IS NULL OR s.project = ?1)
             ORDER BY sm.created_at DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![project, limit], row_to_summary)?;
        collect(rows)
    }

    // ---------------------------------------------------------------
    // Queue
    // ---------------------------------------------------------------

    /// Size-capped, JSON-validated enqueue. `payload_json` must already
    /// have passed through the Scrubber.
    pub fn enqueue(
        &self,
        session_id: i64,
        item_type: QueueItemType,
        payload_json: &str,
    ) -> Result<QueueItem> {
        if payload_json.len() > MAX_QUEUE_PAYLOAD_BYTES {
            return Err(StoreErr::PayloadTooLarge {
                limit: MAX_QUEUE_PAYLOAD_BYTES,
                actual: payload_json.len(),
            });
        }
        serde_json::from_str::<serde_json::Value>(payload_json)
            .map_err(|source| StoreErr::InvalidPayload { source })?;

        let created_at = now_epoch();
        let conn = self.lock();
        conn.execute(
            "INSERT INTO queue_items (session_id, item_type, payload, status, retry_count, created_at)
             VALUES (?1, ?2, ?3, 'pending', 0, ?4)",
            params![session_id, item_type.as_str(), payload_json, created_at],
        )?;
        let id = conn.last_insert_rowid();
        Ok(QueueItem {
            id,
            session_id,
            item_type,
            payload: payload_json.to_string(),
            status: QueueStatus::Pending,
            retry_count: 0,
            error: None,
            created_at,
            started_at: None,
            completed_at: None,
        })
    }

    /// Oldest-first pending items, capped at `limit`.
    pub fn dequeue_pending(&self, limit: i64) -> Result<Vec<QueueItem>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, session_id, item_type, payload, status, retry_count, error, created_at, started_at, completed_at
             FROM queue_items WHERE status = 'pending' ORDER BY created_at ASC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], row_to_queue_item)?;
        collect(rows)
    }

    pub fn list_pending(&self) -> Result<Vec<QueueItem>> {
        self.dequeue_pending(i64::MAX)
    }

    pub fn mark_processing(&self, id: i64) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE queue_items SET status = 'processing', started_at = ?2 WHERE id = ?1",
            params![id, now_epoch()],
        )?;
        Ok(())
    }

    pub fn mark_processed(&self, id: i64) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE queue_items SET status = 'processed', completed_at = ?2 WHERE id = ?1",
            params![id, now_epoch()],
        )?;
        Ok(())
    }

    /// Retry-count increments only on failure. Requeues to `pending` with
    /// `started_at` cleared so the next attempt is a fresh processing run.
    pub fn requeue_after_failure(&self, id: i64, error: &str) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "UPDATE queue_items SET status = 'pending', retry_count = retry_count + 1,
                started_at = NULL, error = ?2 WHERE id = ?1",
            params![id, error],
        )?;
        conn.query_row(
            "SELECT retry_count FROM queue_items WHERE id = ?1",
            params![id],
            |r| r.get(0),
        )
        .map_err(StoreErr::from)
    }

    /// Does not touch `retry_count`: the failure that leads here was already
    /// counted by `requeue_after_failure`, so this only records the terminal
    /// status.
    pub fn mark_failed(&self, id: i64, error: &str) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE queue_items SET status = 'failed', error = ?2, completed_at = ?3 WHERE id = ?1",
            params![id, error, now_epoch()],
        )?;
        Ok(())
    }

    pub fn get_queue_item(&self, id: i64) -> Result<Option<QueueItem>> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id, session_id, item_type, payload, status, retry_count, error, created_at, started_at, completed_at
             FROM queue_items WHERE id = ?1",
            params![id],
            row_to_queue_item,
        )
        .optional()
        .map_err(StoreErr::from)
    }

    /// `status = processing AND now - started_at >= threshold_secs`.
    pub fn list_stuck(&self, threshold_secs: i64) -> Result<Vec<QueueItem>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, session_id, item_type, payload, status, retry_count, error, created_at, started_at, completed_at
             FROM queue_items
             WHERE status = 'processing' AND started_at IS NOT NULL AND (?1 - started_at) >= ?2",
        )?;
        let rows = stmt.query_map(params![now_epoch(), threshold_secs], row_to_queue_item)?;
        collect(rows)
    }

    /// Move every `processing` row back to `pending` (startup / explicit
    /// recovery, spec §4.5 `recoverStuck`). Returns the recovered ids.
    pub fn recover_stuck(&self, session_id: Option<i64>) -> Result<Vec<i64>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id FROM queue_items WHERE status = 'processing' AND (?1 IS NULL OR session_id = ?1)",
        )?;
        let ids: Vec<i64> = stmt
            .query_map(params![session_id], |r| r.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        conn.execute(
            "UPDATE queue_items SET status = 'pending', started_at = NULL
             WHERE status = 'processing' AND (?1 IS NULL OR session_id = ?1)",
            params![session_id],
        )?;
        Ok(ids)
    }

    pub fn queue_counts(&self) -> Result<QueueCounts> {
        let conn = self.lock();
        let mut counts = QueueCounts::default();
        let mut stmt =
            conn.prepare("SELECT status, COUNT(*) FROM queue_items GROUP BY status")?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?;
        for row in rows {
            let (status, count) = row?;
            match status.as_str() {
                "pending" => counts.pending = count,
                "processing" => counts.processing = count,
                "processed" => counts.processed = count,
                "failed" => counts.failed = count,
                _ => {}
            }
        }
        counts.stuck = conn.query_row(
            "SELECT COUNT(*) FROM queue_items WHERE status = 'processing' AND started_at IS NOT NULL AND (?1 - started_at) >= 300",
            params![now_epoch()],
            |r| r.get(0),
        )?;
        Ok(counts)
    }

    // ---------------------------------------------------------------
    // Search (raw primitives; progressive disclosure lives in turnmem-search)
    // ---------------------------------------------------------------

    pub fn search_index(
        &self,
        fts_query: &str,
        project: Option<&str>,
        limit: i64,
    ) -> Result<Vec<(Observation, f64)>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT o.id, o.session_id, o.prompt_number, o.tool_name, o.raw_input, o.compressed,
                    o.obs_type, o.title, o.narrative, o.hmac, o.created_at, bm25(observations_fts) AS rank
             FROM observations_fts
             JOIN observations o ON o.id = observations_fts.rowid
             JOIN sessions s ON s.id = o.session_id
             WHERE observations_fts MATCH ?1 AND (?2 IS NULL OR s.project = ?2)
             ORDER BY rank
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![fts_query, project, limit], |row| {
            Ok((row_to_observation(row)?, row.get::<_, f64>(11)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (obs, rank) = row?;
            out.push((self.verify_observation(obs), rank));
        }
        Ok(out)
    }

    pub fn search_by_type(
        &self,
        obs_type: ObsType,
        project: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Observation>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT o.id, o.session_id, o.prompt_number, o.tool_name, o.raw_input, o.compressed,
                    o.obs_type, o.title, o.narrative, o.hmac, o.created_at
             FROM observations o
             JOIN sessions s ON s.id = o.session_id
             WHERE o.obs_type = ?1 AND (?2 IS NULL OR s.project = ?2)
             ORDER BY o.created_at DESC
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![obs_type.as_str(), project, limit], row_to_observation)?;
        let observations = collect(rows)?;
        Ok(observations
            .into_iter()
            .map(|o| self.verify_observation(o))
            .collect())
    }

    pub fn search_by_date_range(
        &self,
        from: i64,
        to: i64,
        project: Option<&str>,
    ) -> Result<Vec<Observation>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT o.id, o.session_id, o.prompt_number, o.tool_name, o.raw_input, o.compressed,
                    o.obs_type, o.title, o.narrative, o.hmac, o.created_at
             FROM observations o
             JOIN sessions s ON s.id = o.session_id
             WHERE o.created_at >= ?1 AND o.created_at <= ?2 AND (?3 IS NULL OR s.project = ?3)
             ORDER BY o.created_at ASC",
        )?;
        let rows = stmt.query_map(params![from, to, project], row_to_observation)?;
        let observations = collect(rows)?;
        Ok(observations
            .into_iter()
            .map(|o| self.verify_observation(o))
            .collect())
    }

    pub fn stats(&self, project: Option<&str>) -> Result<ProjectStats> {
        let conn = self.lock();
        let observations: i64 = conn.query_row(
            "SELECT COUNT(*) FROM observations o JOIN sessions s ON s.id = o.session_id WHERE (?1 IS NULL OR s.project = ?1)",
            params![project],
            |r| r.get(0),
        )?;
        let summaries: i64 = conn.query_row(
            "SELECT COUNT(*) FROM summaries sm JOIN sessions s ON s.id = sm.session_id WHERE (?1 IS NULL OR s.project = ?1)",
            params![project],
            |r| r.get(0),
        )?;
        let sessions: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE (?1 IS NULL OR project = ?1)",
            params![project],
            |r| r.get(0),
        )?;
        Ok(ProjectStats {
            observations,
            summaries,
            sessions,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        #[allow(clippy::expect_used)]
        self.conn.lock().expect("store mutex poisoned")
    }
}

fn collect<T>(rows: rusqlite::MappedRows<'_, impl FnMut(&Row) -> rusqlite::Result<T>>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn row_to_session(row: &Row) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        external_key: row.get(1)?,
        project: row.get(2)?,
        first_prompt: row.get(3)?,
        prompt_count: row.get(4)?,
        status: SessionStatus::parse(&row.get::<_, String>(5)?),
        created_at: row.get(6)?,
        completed_at: row.get(7)?,
    })
}

fn row_to_observation(row: &Row) -> rusqlite::Result<Observation> {
    Ok(Observation {
        id: row.get(0)?,
        session_id: row.get(1)?,
        prompt_number: row.get(2)?,
        tool_name: row.get(3)?,
        raw_input: row.get(4)?,
        compressed: row.get(5)?,
        obs_type: ObsType::parse(&row.get::<_, String>(6)?),
        title: row.get(7)?,
        narrative: row.get(8)?,
        hmac: row.get(9)?,
        created_at: row.get(10)?,
        hmac_valid: true,
    })
}

fn row_to_summary(row: &Row) -> rusqlite::Result<Summary> {
    Ok(Summary {
        id: row.get(0)?,
        session_id: row.get(1)?,
        request: row.get(2)?,
        investigated: row.get(3)?,
        learned: row.get(4)?,
        completed: row.get(5)?,
        next_steps: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn row_to_queue_item(row: &Row) -> rusqlite::Result<QueueItem> {
    Ok(QueueItem {
        id: row.get(0)?,
        session_id: row.get(1)?,
        item_type: QueueItemType::parse(&row.get::<_, String>(2)?),
        payload: row.get(3)?,
        status: QueueStatus::parse(&row.get::<_, String>(4)?),
        retry_count: row.get(5)?,
        error: row.get(6)?,
        created_at: row.get(7)?,
        started_at: row.get(8)?,
        completed_at: row.get(9)?,
    })
}

#[cfg(unix)]
fn harden_dir(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700)).map_err(|source| {
        StoreErr::Permissions {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn harden_dir(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn harden_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(|source| {
        StoreErr::Permissions {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn harden_file(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "lib.test.rs"]
mod tests;
