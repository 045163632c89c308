//! SQLite-backed case store.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use super::schema::all_schema_statements;
use super::{CaseStore, StorageError};
use crate::agents::debate_agents::DebateRole;
use crate::agents::types::{Case, CaseConfig, CaseState, RoleConfig, TranscriptEntry};

const SELECT_CASE: &str = "SELECT * FROM cases";

/// Case store over a SQLite database file (or `sqlite::memory:`).
#[derive(Clone)]
pub struct SqliteCaseStore {
    pool: SqlitePool,
}

impl SqliteCaseStore {
    /// Opens (creating if needed) the database and applies the schema.
    ///
    /// Accepts `sqlite://path`, `sqlite::memory:` or a bare file path.
    pub async fn open(url: &str) -> Result<Self, StorageError> {
        let url = if url.starts_with("sqlite:") {
            url.to_string()
        } else {
            format!("sqlite://{}", url)
        };
        let in_memory = url.contains(":memory:");

        let mut opts = SqliteConnectOptions::from_str(&url)
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Normal);
        if !in_memory {
            opts = opts.journal_mode(SqliteJournalMode::Wal);
        }

        // An in-memory database lives as long as its last connection.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        };

        let pool = pool_options
            .connect_with(opts)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        for statement in all_schema_statements() {
            sqlx::query(statement).execute(&pool).await?;
        }

        tracing::info!(url = %url, "Case store opened");
        Ok(Self { pool })
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl std::fmt::Debug for SqliteCaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCaseStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl CaseStore for SqliteCaseStore {
    async fn create_case(&self, query: &str, config: &CaseConfig) -> Result<Case, StorageError> {
        let draft = Case::new(0, query, config.clone());
        let created_at = format_timestamp(&draft.created_at);

        let result = sqlx::query(
            "INSERT INTO cases (
                query, proposer_model, critic_model, judge_model,
                proposer_persona, critic_persona, judge_persona,
                state, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        )
        .bind(&draft.query)
        .bind(&draft.config.proposer.model)
        .bind(&draft.config.critic.model)
        .bind(&draft.config.judge.model)
        .bind(&draft.config.proposer.persona)
        .bind(&draft.config.critic.persona)
        .bind(&draft.config.judge.persona)
        .bind(draft.state.as_str())
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        let case = Case {
            id: result.last_insert_rowid(),
            ..draft
        };
        tracing::debug!(case_id = case.id, "Case created");
        Ok(case)
    }

    async fn load_case(&self, id: i64) -> Result<Option<Case>, StorageError> {
        let row = sqlx::query(&format!("{} WHERE id = ?1", SELECT_CASE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(case_from_row).transpose()
    }

    async fn save_case(&self, case: &Case) -> Result<(), StorageError> {
        let transcript = serde_json::to_string(&case.transcript)?;

        let result = sqlx::query(
            "UPDATE cases SET
                query = ?2,
                proposer_model = ?3, critic_model = ?4, judge_model = ?5,
                proposer_persona = ?6, critic_persona = ?7, judge_persona = ?8,
                state = ?9,
                proposer_output = ?10, critic_output = ?11, final_verdict = ?12,
                proposer_time = ?13, critic_time = ?14, judge_time = ?15,
                proposer_tokens = ?16, critic_tokens = ?17, judge_tokens = ?18,
                total_tokens = ?19, total_time = ?20,
                estimated_cost = ?21, judge_confidence = ?22,
                transcript = ?23,
                user_rating = ?24, user_feedback = ?25,
                updated_at = ?26
            WHERE id = ?1",
        )
        .bind(case.id)
        .bind(&case.query)
        .bind(&case.config.proposer.model)
        .bind(&case.config.critic.model)
        .bind(&case.config.judge.model)
        .bind(&case.config.proposer.persona)
        .bind(&case.config.critic.persona)
        .bind(&case.config.judge.persona)
        .bind(case.state.as_str())
        .bind(&case.proposer_output)
        .bind(&case.critic_output)
        .bind(&case.final_verdict)
        .bind(case.stage_time(DebateRole::Proposer))
        .bind(case.stage_time(DebateRole::Critic))
        .bind(case.stage_time(DebateRole::Judge))
        .bind(case.stage_tokens(DebateRole::Proposer) as i64)
        .bind(case.stage_tokens(DebateRole::Critic) as i64)
        .bind(case.stage_tokens(DebateRole::Judge) as i64)
        .bind(case.total_tokens as i64)
        .bind(case.total_time)
        .bind(case.estimated_cost)
        .bind(case.judge_confidence)
        .bind(&transcript)
        .bind(case.user_rating.map(i64::from))
        .bind(&case.user_feedback)
        .bind(format_timestamp(&case.updated_at))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(case.id));
        }
        Ok(())
    }

    async fn find_completed_by_query(&self, query: &str) -> Result<Option<Case>, StorageError> {
        let row = sqlx::query(&format!(
            "{} WHERE query = ?1 AND final_verdict IS NOT NULL \
             ORDER BY created_at DESC, id DESC LIMIT 1",
            SELECT_CASE
        ))
        .bind(query)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(case_from_row).transpose()
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Case>, StorageError> {
        let rows = sqlx::query(&format!(
            "{} ORDER BY created_at DESC, id DESC LIMIT ?1",
            SELECT_CASE
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(case_from_row).collect()
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("timestamp '{}': {}", raw, e)))
}

fn case_from_row(row: &SqliteRow) -> Result<Case, StorageError> {
    let state: String = row.try_get("state")?;
    let transcript: String = row.try_get("transcript")?;
    let transcript: Vec<TranscriptEntry> = serde_json::from_str(&transcript)?;
    let user_rating: Option<i64> = row.try_get("user_rating")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Case {
        id: row.try_get("id")?,
        query: row.try_get("query")?,
        config: CaseConfig {
            proposer: RoleConfig::new(
                row.try_get::<String, _>("proposer_model")?,
                row.try_get::<String, _>("proposer_persona")?,
            ),
            critic: RoleConfig::new(
                row.try_get::<String, _>("critic_model")?,
                row.try_get::<String, _>("critic_persona")?,
            ),
            judge: RoleConfig::new(
                row.try_get::<String, _>("judge_model")?,
                row.try_get::<String, _>("judge_persona")?,
            ),
        },
        state: CaseState::from_str(&state).map_err(StorageError::Corrupt)?,
        proposer_output: row.try_get("proposer_output")?,
        critic_output: row.try_get("critic_output")?,
        final_verdict: row.try_get("final_verdict")?,
        estimated_cost: row.try_get("estimated_cost")?,
        judge_confidence: row.try_get("judge_confidence")?,
        total_tokens: row.try_get::<i64, _>("total_tokens")?.max(0) as u64,
        total_time: row.try_get("total_time")?,
        transcript,
        user_rating: user_rating.and_then(|r| u8::try_from(r).ok()),
        user_feedback: row.try_get("user_feedback")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
