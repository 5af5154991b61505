//! ChatRank orchestration service.
//!
//! Wires the inbound data contract, the pure ranking pipeline, and the
//! outbound repository into one run:
//! 1. Extract per-pair observations
//! 2. Synthesize edge weights
//! 3. Build the communication graph
//! 4. Solve for converged ranks
//! 5. Derive percentiles and influence bands
//! 6. Persist ranks, then weights

use crate::db::data_service::MessageDataService;
use crate::db::repository::RankRepository;
use crate::errors::AppError;
use crate::ranking::{
    build_user_graph, normalize_and_categorize, solve, synthesize_weights, ChatRankConfig,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of one ranking run.
#[derive(Debug, Clone, Serialize)]
pub struct RankRunSummary {
    pub users_ranked: usize,
    pub edges: usize,
    pub iterations: u32,
    pub convergence_delta: f64,
    pub converged: bool,
}

pub struct ChatRankService {
    data: Arc<dyn MessageDataService>,
    repository: Arc<dyn RankRepository>,
}

impl ChatRankService {
    pub fn new(data: Arc<dyn MessageDataService>, repository: Arc<dyn RankRepository>) -> Self {
        Self { data, repository }
    }

    /// Execute one full ranking run with the given parameters.
    ///
    /// Any collaborator failure aborts the run and everything computed in
    /// memory is dropped with it; nothing is retried here.
    pub async fn run(&self, config: &ChatRankConfig) -> Result<RankRunSummary, AppError> {
        let start = Instant::now();
        let calculation_date = chrono::Utc::now().date_naive();

        // 1. Extract observations
        let messages = self.data.messages_for_ranking().await?;
        tracing::info!(senders = messages.len(), "extracted communication observations");

        // 2. Edge weights
        let weights_start = Instant::now();
        let weights = synthesize_weights(&messages, config, calculation_date);
        tracing::info!(
            edges = weights.len(),
            elapsed_ms = weights_start.elapsed().as_millis() as u64,
            "synthesized communication weights"
        );

        // 3. Graph
        let graph = build_user_graph(&weights);
        tracing::info!(users = graph.len(), "built communication graph");

        // 4. Solve
        let solve_start = Instant::now();
        let solution = solve(graph, config)?;
        if solution.converged {
            tracing::info!(
                iterations = solution.iterations,
                delta = solution.convergence_delta,
                elapsed_ms = solve_start.elapsed().as_millis() as u64,
                "rank computation converged"
            );
        } else {
            tracing::warn!(
                iterations = solution.iterations,
                delta = solution.convergence_delta,
                "rank computation exhausted its iteration budget"
            );
        }

        // 5. Percentiles and bands
        let ranks = normalize_and_categorize(&solution, calculation_date);

        // 6. Persist ranks, then weights
        self.repository.save_user_ranks(&ranks).await?;
        self.repository.save_communication_weights(&weights).await?;

        let summary = RankRunSummary {
            users_ranked: ranks.len(),
            edges: weights.len(),
            iterations: solution.iterations,
            convergence_delta: solution.convergence_delta,
            converged: solution.converged,
        };

        metrics::counter!("chatrank_runs_total").increment(1);
        metrics::counter!("chatrank_users_ranked_total").increment(summary.users_ranked as u64);
        metrics::histogram!("chatrank_iterations").record(f64::from(summary.iterations));
        metrics::histogram!("chatrank_run_duration_seconds").record(start.elapsed().as_secs_f64());

        tracing::info!(
            users = summary.users_ranked,
            edges = summary.edges,
            iterations = summary.iterations,
            total_ms = start.elapsed().as_millis() as u64,
            "chatrank run completed"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{
        CommunicationWeight, InfluenceCategory, MessageObservation, ObservationMap,
        UserInfluenceRank,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StaticDataService {
        messages: ObservationMap,
    }

    #[async_trait]
    impl MessageDataService for StaticDataService {
        async fn messages_for_ranking(&self) -> Result<ObservationMap, AppError> {
            Ok(self.messages.clone())
        }
    }

    #[derive(Default)]
    struct RecordingRepository {
        ranks: Mutex<Vec<UserInfluenceRank>>,
        weights: Mutex<Vec<CommunicationWeight>>,
        fail_rank_saves: bool,
    }

    #[async_trait]
    impl RankRepository for RecordingRepository {
        async fn save_user_ranks(&self, ranks: &[UserInfluenceRank]) -> Result<(), AppError> {
            if self.fail_rank_saves {
                return Err(AppError::Persistence {
                    message: "injected failure".into(),
                });
            }
            self.ranks.lock().unwrap().extend_from_slice(ranks);
            Ok(())
        }

        async fn save_communication_weights(
            &self,
            weights: &[CommunicationWeight],
        ) -> Result<(), AppError> {
            self.weights.lock().unwrap().extend_from_slice(weights);
            Ok(())
        }

        async fn user_rank_history(
            &self,
            _user_id: i32,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<UserInfluenceRank>, AppError> {
            Ok(Vec::new())
        }

        async fn top_users_by_rank(
            &self,
            _limit: u64,
            _date: NaiveDate,
        ) -> Result<Vec<UserInfluenceRank>, AppError> {
            Ok(Vec::new())
        }

        async fn communication_weights(
            &self,
            _date: NaiveDate,
        ) -> Result<Vec<CommunicationWeight>, AppError> {
            Ok(Vec::new())
        }
    }

    fn two_way_chat() -> ObservationMap {
        let observation = MessageObservation {
            response_time_minutes: 12.0,
            message_length: 60,
            has_response: true,
            follow_up_messages: 3,
        };

        let mut messages = ObservationMap::new();
        messages
            .entry(1)
            .or_insert_with(HashMap::new)
            .insert(2, vec![observation.clone(), observation.clone()]);
        messages
            .entry(2)
            .or_insert_with(HashMap::new)
            .insert(1, vec![observation]);
        messages
    }

    #[tokio::test]
    async fn test_run_persists_ranks_and_weights() {
        let repository = Arc::new(RecordingRepository::default());
        let service = ChatRankService::new(
            Arc::new(StaticDataService {
                messages: two_way_chat(),
            }),
            repository.clone(),
        );

        let summary = service.run(&ChatRankConfig::default()).await.unwrap();

        assert_eq!(summary.users_ranked, 2);
        assert_eq!(summary.edges, 2);
        assert!(summary.converged);

        let saved_ranks = repository.ranks.lock().unwrap();
        assert_eq!(saved_ranks.len(), 2);
        for rank in saved_ranks.iter() {
            assert_eq!(rank.iteration_count, summary.iterations);
            assert!(rank.chat_rank >= 0.0);
        }

        let saved_weights = repository.weights.lock().unwrap();
        assert_eq!(saved_weights.len(), 2);
    }

    #[tokio::test]
    async fn test_tied_users_land_in_the_top_band() {
        // A perfectly symmetric exchange gives both users one shared
        // rank, which collapses to percentile 1.0.
        let observation = MessageObservation {
            response_time_minutes: 5.0,
            message_length: 50,
            has_response: true,
            follow_up_messages: 1,
        };
        let mut messages = ObservationMap::new();
        messages
            .entry(1)
            .or_insert_with(HashMap::new)
            .insert(2, vec![observation.clone()]);
        messages
            .entry(2)
            .or_insert_with(HashMap::new)
            .insert(1, vec![observation]);

        let repository = Arc::new(RecordingRepository::default());
        let service = ChatRankService::new(
            Arc::new(StaticDataService { messages }),
            repository.clone(),
        );
        service.run(&ChatRankConfig::default()).await.unwrap();

        let saved_ranks = repository.ranks.lock().unwrap();
        for rank in saved_ranks.iter() {
            assert_eq!(rank.rank_percentile, 1.0);
            assert_eq!(rank.category, InfluenceCategory::High);
        }
    }

    #[tokio::test]
    async fn test_repository_failure_aborts_the_run() {
        let repository = Arc::new(RecordingRepository {
            fail_rank_saves: true,
            ..RecordingRepository::default()
        });
        let service = ChatRankService::new(
            Arc::new(StaticDataService {
                messages: two_way_chat(),
            }),
            repository.clone(),
        );

        let result = service.run(&ChatRankConfig::default()).await;
        assert!(matches!(result, Err(AppError::Persistence { .. })));

        // The weight save never runs; the run's results are discarded.
        assert!(repository.weights.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_observations_surface_as_empty_graph() {
        let service = ChatRankService::new(
            Arc::new(StaticDataService {
                messages: ObservationMap::new(),
            }),
            Arc::new(RecordingRepository::default()),
        );

        let result = service.run(&ChatRankConfig::default()).await;
        assert!(matches!(result, Err(AppError::EmptyGraph)));
    }
}
