//! Inbound data contract: per-pair message observations.
//!
//! The ranking pipeline only requires that one call returns a
//! deterministic sender -> recipient -> observations mapping; how that
//! mapping was populated is this module's concern alone.

use crate::db::models::{MessageObservation, ObservationMap};
use crate::errors::AppError;
use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbBackend, FromQueryResult, Statement};
use std::collections::HashMap;

#[async_trait]
pub trait MessageDataService: Send + Sync {
    /// Observations for every communicating (sender, recipient) pair.
    async fn messages_for_ranking(&self) -> Result<ObservationMap, AppError>;
}

/// Data service reading the MySQL analytics schema.
///
/// Prefers the per-message `message_facts` table (latest fact per
/// (sender, recipient, chat), with reply detection and follow-up counts)
/// and falls back to aggregated `chat_facts` rows when no detailed facts
/// exist yet.
pub struct MySqlMessageDataService {
    db: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct MessageFactRow {
    sender_id: i32,
    recipient_id: i32,
    message_length: i32,
    response_time_minutes: f64,
    has_response: i64,
    follow_up_messages: i64,
}

#[derive(Debug, FromQueryResult)]
struct ChatFactRow {
    buyer_id: i32,
    seller_id: i32,
    total_messages: i32,
    avg_message_length: f64,
    avg_response_time_minutes: f64,
}

impl MySqlMessageDataService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn from_message_facts(&self) -> Result<ObservationMap, AppError> {
        let sql = r#"
            SELECT
                mf.sender_id,
                mf.recipient_id,
                mf.message_length,
                mf.response_time_minutes,
                CASE WHEN EXISTS (
                    SELECT 1 FROM message_facts mf2
                    WHERE mf2.recipient_id = mf.sender_id
                      AND mf2.sender_id = mf.recipient_id
                      AND mf2.chat_id = mf.chat_id
                ) THEN 1 ELSE 0 END AS has_response,
                (
                    SELECT COUNT(*) FROM message_facts mf3
                    WHERE mf3.chat_id = mf.chat_id
                      AND mf3.id > mf.id
                      AND (mf3.sender_id = mf.recipient_id OR mf3.recipient_id = mf.sender_id)
                ) AS follow_up_messages
            FROM message_facts mf
            WHERE mf.id IN (
                SELECT MAX(id) FROM message_facts
                GROUP BY sender_id, recipient_id, chat_id
            )
            ORDER BY mf.sender_id, mf.recipient_id
        "#;

        let rows = MessageFactRow::find_by_statement(Statement::from_string(
            DbBackend::MySql,
            sql.to_string(),
        ))
        .all(&self.db)
        .await
        .map_err(|e| AppError::DataSource {
            message: format!("failed to load message facts: {e}"),
        })?;

        let row_count = rows.len();
        let mut messages = ObservationMap::new();
        for row in rows {
            messages
                .entry(row.sender_id)
                .or_insert_with(HashMap::new)
                .entry(row.recipient_id)
                .or_default()
                .push(MessageObservation {
                    response_time_minutes: row.response_time_minutes,
                    message_length: row.message_length,
                    has_response: row.has_response != 0,
                    follow_up_messages: row.follow_up_messages as i32,
                });
        }

        tracing::info!(
            rows = row_count,
            senders = messages.len(),
            "loaded message facts"
        );

        Ok(messages)
    }

    /// Aggregated fallback: one synthetic observation per chat direction,
    /// splitting the total message count between the two.
    async fn from_chat_facts(&self) -> Result<ObservationMap, AppError> {
        let sql = r#"
            SELECT
                cf.buyer_id,
                cf.seller_id,
                cf.total_messages,
                cf.avg_message_length,
                cf.avg_response_time_minutes
            FROM chat_facts cf
            ORDER BY cf.buyer_id, cf.seller_id
        "#;

        let rows = ChatFactRow::find_by_statement(Statement::from_string(
            DbBackend::MySql,
            sql.to_string(),
        ))
        .all(&self.db)
        .await
        .map_err(|e| AppError::DataSource {
            message: format!("failed to load chat facts: {e}"),
        })?;

        let mut messages = ObservationMap::new();
        for row in rows {
            let observation = MessageObservation {
                response_time_minutes: row.avg_response_time_minutes,
                message_length: row.avg_message_length as i32,
                // Aggregated chats always reflect some interaction.
                has_response: true,
                follow_up_messages: row.total_messages / 2,
            };

            messages
                .entry(row.buyer_id)
                .or_insert_with(HashMap::new)
                .insert(row.seller_id, vec![observation.clone()]);
            messages
                .entry(row.seller_id)
                .or_insert_with(HashMap::new)
                .insert(row.buyer_id, vec![observation]);
        }

        tracing::info!(users = messages.len(), "loaded aggregated chat facts");

        Ok(messages)
    }
}

#[async_trait]
impl MessageDataService for MySqlMessageDataService {
    async fn messages_for_ranking(&self) -> Result<ObservationMap, AppError> {
        let detailed = self.from_message_facts().await?;
        if !detailed.is_empty() {
            return Ok(detailed);
        }

        tracing::info!("no detailed message facts found, using chat facts fallback");
        self.from_chat_facts().await
    }
}
