//! SQLite schema for the case store.

/// SQL schema for creating the cases table.
///
/// Configuration, outputs and per-stage metrics are flat columns; the
/// transcript is a JSON array in `transcript`.
pub const CREATE_CASES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS cases (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    query            TEXT    NOT NULL,

    -- Per-role configuration
    proposer_model   TEXT    NOT NULL,
    critic_model     TEXT    NOT NULL,
    judge_model      TEXT    NOT NULL,
    proposer_persona TEXT    NOT NULL,
    critic_persona   TEXT    NOT NULL,
    judge_persona    TEXT    NOT NULL,

    state            TEXT    NOT NULL DEFAULT 'NEW',

    -- Stage outputs
    proposer_output  TEXT,
    critic_output    TEXT,
    final_verdict    TEXT,

    -- Metrics
    proposer_time    REAL    NOT NULL DEFAULT 0,
    critic_time      REAL    NOT NULL DEFAULT 0,
    judge_time       REAL    NOT NULL DEFAULT 0,
    proposer_tokens  INTEGER NOT NULL DEFAULT 0,
    critic_tokens    INTEGER NOT NULL DEFAULT 0,
    judge_tokens     INTEGER NOT NULL DEFAULT 0,
    total_tokens     INTEGER NOT NULL DEFAULT 0,
    total_time       REAL    NOT NULL DEFAULT 0,
    estimated_cost   REAL    NOT NULL DEFAULT 0,
    judge_confidence REAL    NOT NULL DEFAULT 0,

    transcript       TEXT    NOT NULL DEFAULT '[]',

    -- User feedback
    user_rating      INTEGER,
    user_feedback    TEXT,

    created_at       TEXT    NOT NULL,
    updated_at       TEXT    NOT NULL
)
"#;

/// Index for history listing.
pub const CREATE_CASES_CREATED_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_cases_created_at ON cases(created_at DESC)";

/// Index for completed-case lookup by query.
pub const CREATE_CASES_QUERY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_cases_query ON cases(query)";

/// Returns all schema statements in the order they should be executed.
pub fn all_schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_CASES_TABLE,
        CREATE_CASES_CREATED_INDEX,
        CREATE_CASES_QUERY_INDEX,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_ordered() {
        let statements = all_schema_statements();
        assert_eq!(statements.len(), 3);
        assert!(statements[0].contains("CREATE TABLE IF NOT EXISTS cases"));
        assert!(statements.iter().skip(1).all(|s| s.contains("ON cases")));
    }
}
