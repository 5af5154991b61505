//! Outbound persistence contract for computed ranks and edge weights.
//!
//! Every operation is a fallible remote call; a failure aborts the
//! caller's run and the in-memory results are discarded with it.

use crate::db::models::{CommunicationWeight, UserInfluenceRank};
use crate::errors::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, FromQueryResult, Statement, TransactionTrait,
};

#[async_trait]
pub trait RankRepository: Send + Sync {
    /// Upsert this run's influence records, one per user.
    async fn save_user_ranks(&self, ranks: &[UserInfluenceRank]) -> Result<(), AppError>;

    /// Upsert this run's edge weights, keyed (sender, recipient, date).
    async fn save_communication_weights(
        &self,
        weights: &[CommunicationWeight],
    ) -> Result<(), AppError>;

    /// One user's historical records within a date range, ascending.
    async fn user_rank_history(
        &self,
        user_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<UserInfluenceRank>, AppError>;

    /// Top-N records for a date, ordered by rank descending.
    async fn top_users_by_rank(
        &self,
        limit: u64,
        date: NaiveDate,
    ) -> Result<Vec<UserInfluenceRank>, AppError>;

    /// Edge weights stored for a date.
    async fn communication_weights(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<CommunicationWeight>, AppError>;
}

/// Repository writing to the MySQL analytics schema.
pub struct MySqlRankRepository {
    db: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct RankRow {
    user_id: i32,
    chat_rank: f64,
    rank_percentile: f64,
    category: String,
    calculation_date: NaiveDate,
    iteration_count: i32,
    convergence_delta: f64,
}

impl RankRow {
    fn into_model(self) -> Result<UserInfluenceRank, AppError> {
        let category = self.category.parse().map_err(|message: String| {
            AppError::Persistence { message }
        })?;
        Ok(UserInfluenceRank {
            user_id: self.user_id,
            chat_rank: self.chat_rank,
            rank_percentile: self.rank_percentile,
            category,
            calculation_date: self.calculation_date,
            iteration_count: self.iteration_count.max(0) as u32,
            convergence_delta: self.convergence_delta,
        })
    }
}

#[derive(Debug, FromQueryResult)]
struct WeightRow {
    sender_id: i32,
    recipient_id: i32,
    weight: f64,
    time_factor: f64,
    response_factor: f64,
    length_factor: f64,
    continuation_factor: f64,
    calculation_date: NaiveDate,
}

impl From<WeightRow> for CommunicationWeight {
    fn from(row: WeightRow) -> Self {
        Self {
            sender_id: row.sender_id,
            recipient_id: row.recipient_id,
            weight: row.weight,
            time_factor: row.time_factor,
            response_factor: row.response_factor,
            length_factor: row.length_factor,
            continuation_factor: row.continuation_factor,
            calculation_date: row.calculation_date,
        }
    }
}

impl MySqlRankRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RankRepository for MySqlRankRepository {
    async fn save_user_ranks(&self, ranks: &[UserInfluenceRank]) -> Result<(), AppError> {
        if ranks.is_empty() {
            return Ok(());
        }

        let txn = self.db.begin().await.map_err(|e| AppError::Persistence {
            message: format!("failed to open rank transaction: {e}"),
        })?;

        for rank in ranks {
            let stmt = Statement::from_sql_and_values(
                DbBackend::MySql,
                r#"
                INSERT INTO user_influence_rank
                    (user_id, chat_rank, rank_percentile, category,
                     calculation_date, iteration_count, convergence_delta)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON DUPLICATE KEY UPDATE
                    chat_rank = VALUES(chat_rank),
                    rank_percentile = VALUES(rank_percentile),
                    category = VALUES(category),
                    calculation_date = VALUES(calculation_date),
                    iteration_count = VALUES(iteration_count),
                    convergence_delta = VALUES(convergence_delta)
                "#,
                vec![
                    rank.user_id.into(),
                    rank.chat_rank.into(),
                    rank.rank_percentile.into(),
                    rank.category.as_str().into(),
                    rank.calculation_date.into(),
                    rank.iteration_count.into(),
                    rank.convergence_delta.into(),
                ],
            );

            txn.execute(stmt).await.map_err(|e| AppError::Persistence {
                message: format!("failed to save rank for user {}: {e}", rank.user_id),
            })?;
        }

        txn.commit().await.map_err(|e| AppError::Persistence {
            message: format!("failed to commit rank transaction: {e}"),
        })?;

        tracing::info!(count = ranks.len(), "saved user influence ranks");
        Ok(())
    }

    async fn save_communication_weights(
        &self,
        weights: &[CommunicationWeight],
    ) -> Result<(), AppError> {
        if weights.is_empty() {
            return Ok(());
        }

        let txn = self.db.begin().await.map_err(|e| AppError::Persistence {
            message: format!("failed to open weight transaction: {e}"),
        })?;

        for weight in weights {
            let stmt = Statement::from_sql_and_values(
                DbBackend::MySql,
                r#"
                INSERT INTO communication_weights
                    (sender_id, recipient_id, weight, time_factor, response_factor,
                     length_factor, continuation_factor, calculation_date)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON DUPLICATE KEY UPDATE
                    weight = VALUES(weight),
                    time_factor = VALUES(time_factor),
                    response_factor = VALUES(response_factor),
                    length_factor = VALUES(length_factor),
                    continuation_factor = VALUES(continuation_factor)
                "#,
                vec![
                    weight.sender_id.into(),
                    weight.recipient_id.into(),
                    weight.weight.into(),
                    weight.time_factor.into(),
                    weight.response_factor.into(),
                    weight.length_factor.into(),
                    weight.continuation_factor.into(),
                    weight.calculation_date.into(),
                ],
            );

            txn.execute(stmt).await.map_err(|e| AppError::Persistence {
                message: format!(
                    "failed to save weight from {} to {}: {e}",
                    weight.sender_id, weight.recipient_id
                ),
            })?;
        }

        txn.commit().await.map_err(|e| AppError::Persistence {
            message: format!("failed to commit weight transaction: {e}"),
        })?;

        tracing::info!(count = weights.len(), "saved communication weights");
        Ok(())
    }

    async fn user_rank_history(
        &self,
        user_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<UserInfluenceRank>, AppError> {
        let rows = RankRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::MySql,
            r#"
            SELECT user_id, chat_rank, rank_percentile, category,
                   calculation_date, iteration_count, convergence_delta
            FROM user_influence_rank
            WHERE user_id = ? AND calculation_date BETWEEN ? AND ?
            ORDER BY calculation_date ASC
            "#,
            vec![user_id.into(), start.into(), end.into()],
        ))
        .all(&self.db)
        .await
        .map_err(|e| AppError::Persistence {
            message: format!("failed to load rank history for user {user_id}: {e}"),
        })?;

        rows.into_iter().map(RankRow::into_model).collect()
    }

    async fn top_users_by_rank(
        &self,
        limit: u64,
        date: NaiveDate,
    ) -> Result<Vec<UserInfluenceRank>, AppError> {
        let rows = RankRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::MySql,
            r#"
            SELECT user_id, chat_rank, rank_percentile, category,
                   calculation_date, iteration_count, convergence_delta
            FROM user_influence_rank
            WHERE calculation_date = ?
            ORDER BY chat_rank DESC
            LIMIT ?
            "#,
            vec![date.into(), limit.into()],
        ))
        .all(&self.db)
        .await
        .map_err(|e| AppError::Persistence {
            message: format!("failed to load top users for {date}: {e}"),
        })?;

        rows.into_iter().map(RankRow::into_model).collect()
    }

    async fn communication_weights(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<CommunicationWeight>, AppError> {
        let rows = WeightRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::MySql,
            r#"
            SELECT sender_id, recipient_id, weight, time_factor, response_factor,
                   length_factor, continuation_factor, calculation_date
            FROM communication_weights
            WHERE calculation_date = ?
            "#,
            vec![date.into()],
        ))
        .all(&self.db)
        .await
        .map_err(|e| AppError::Persistence {
            message: format!("failed to load communication weights for {date}: {e}"),
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
