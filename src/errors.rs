use thiserror::Error;

/// Errors surfaced by the ranking pipeline and its store boundaries.
///
/// Non-convergence of the solver is deliberately not represented here:
/// an exhausted iteration budget still produces a result, annotated with
/// its final delta, and the caller judges quality from that.
#[derive(Error, Debug)]
pub enum AppError {
    /// The solver was handed a graph with zero nodes. Fatal to the run;
    /// nothing is persisted.
    #[error("communication graph is empty")]
    EmptyGraph,

    /// Extraction from the analytics store failed. The run aborts before
    /// any computation starts.
    #[error("data source error: {message}")]
    DataSource { message: String },

    /// A repository operation failed. In-memory results for the run are
    /// discarded; retries belong to the caller.
    #[error("persistence error: {message}")]
    Persistence { message: String },

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = AppError::DataSource {
            message: "failed to load message facts".into(),
        };
        assert_eq!(
            err.to_string(),
            "data source error: failed to load message facts"
        );

        let err = AppError::EmptyGraph;
        assert_eq!(err.to_string(), "communication graph is empty");
    }
}
