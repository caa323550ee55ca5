use crate::error::StoreError;

const UNIQUE_VIOLATION: &str = "23505";

/// Map a driver error onto the typed store taxonomy.
pub fn classify(err: sqlx::Error, context: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let code = db_err.code();
        if let Some(classified) =
            classify_unique_violation(code.as_deref(), db_err.constraint(), db_err.table())
        {
            return classified;
        }
    }

    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound(context.to_string()),
        sqlx::Error::PoolTimedOut => StoreError::Timeout {
            operation: "acquire connection",
        },
        other => StoreError::Other(format!("Failed to {context}: {other}")),
    }
}

/// A unique violation on a `*_pkey` constraint means the serial counter
/// handed out a taken id; any other unique violation is a natural-key
/// duplicate.
pub fn classify_unique_violation(
    code: Option<&str>,
    constraint: Option<&str>,
    table: Option<&str>,
) -> Option<StoreError> {
    if code != Some(UNIQUE_VIOLATION) {
        return None;
    }

    let constraint = constraint.unwrap_or_default();
    if let Some(prefix) = constraint.strip_suffix("_pkey") {
        let table = table.unwrap_or(prefix).to_string();
        return Some(StoreError::ConflictSurrogateKey { table });
    }

    Some(StoreError::ConflictBenign {
        constraint: constraint.to_string(),
    })
}
