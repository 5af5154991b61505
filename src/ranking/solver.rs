//! Iterative ChatRank solver.

use super::graph::UserNode;
use super::{round_to_thousandth, ChatRankConfig};
use crate::errors::AppError;
use std::collections::HashMap;

/// Converged (or budget-exhausted) ranks for one run.
#[derive(Debug, Clone)]
pub struct RankSolution {
    /// (user id, final rank), ascending by user id.
    pub ranks: Vec<(i32, f64)>,
    /// Iterations actually performed, 1-indexed. Never exceeds
    /// `max_iterations`.
    pub iterations: u32,
    /// Final max per-user rank change, rounded to three decimals.
    pub convergence_delta: f64,
    /// Whether the final delta beat the configured epsilon.
    pub converged: bool,
}

/// Run the fixed-point iteration until the largest per-user rank change
/// drops below `convergence_epsilon` or `max_iterations` is exhausted.
///
/// Each round snapshots every rank, then recomputes each user's rank as
/// `(1 - d) + d * sum(prev_rank[sender] * weight / out_degree[sender])`
/// over its incoming edges, skipping senders that are not nodes and
/// dividing only when the sender's out-degree is positive. The
/// teleportation term is `(1 - d)`, not the textbook `(1 - d) / n`;
/// see `test_teleport_term_is_not_divided_by_node_count`.
///
/// All per-user work follows one ascending-id order fixed up front, and
/// each node's incoming edges are summed in ascending sender order, so
/// identical input and config reproduce identical output bit for bit.
/// Exhausting the iteration budget is not an error: callers judge result
/// quality from the returned delta.
pub fn solve(
    mut graph: HashMap<i32, UserNode>,
    config: &ChatRankConfig,
) -> Result<RankSolution, AppError> {
    if graph.is_empty() {
        return Err(AppError::EmptyGraph);
    }

    tracing::debug!(users = graph.len(), "starting rank computation");

    let initial_rank = 1.0 / graph.len() as f64;
    for node in graph.values_mut() {
        node.rank = initial_rank;
        node.prev_rank = 0.0;
    }

    let mut user_ids: Vec<i32> = graph.keys().copied().collect();
    user_ids.sort_unstable();

    // Incoming edges per user, sorted by sender id and fixed once, so the
    // float summation order cannot drift between iterations or runs.
    let incoming_by_user: Vec<Vec<(i32, f64)>> = user_ids
        .iter()
        .map(|user_id| {
            let mut edges: Vec<(i32, f64)> = graph[user_id]
                .incoming_links
                .iter()
                .map(|(&sender_id, &weight)| (sender_id, weight))
                .collect();
            edges.sort_unstable_by_key(|&(sender_id, _)| sender_id);
            edges
        })
        .collect();

    let mut iterations = 0u32;
    let mut max_delta = 0.0f64;
    let mut converged = false;

    for _ in 0..config.max_iterations {
        iterations += 1;

        for user_id in &user_ids {
            if let Some(node) = graph.get_mut(user_id) {
                node.prev_rank = node.rank;
            }
        }

        for (index, user_id) in user_ids.iter().enumerate() {
            let mut sum = 0.0;
            for &(sender_id, weight) in &incoming_by_user[index] {
                let Some(sender) = graph.get(&sender_id) else {
                    // Unknown inbound sender: drop the contribution.
                    continue;
                };
                let mut contribution = sender.prev_rank * weight;
                if sender.out_degree > 0.0 {
                    contribution /= sender.out_degree;
                }
                sum += contribution;
            }

            let new_rank = (1.0 - config.damping_factor) + config.damping_factor * sum;
            if let Some(node) = graph.get_mut(user_id) {
                node.rank = new_rank;
            }
        }

        max_delta = 0.0;
        for user_id in &user_ids {
            let node = &graph[user_id];
            let delta = (node.rank - node.prev_rank).abs();
            if delta > max_delta {
                max_delta = delta;
            }
        }

        tracing::debug!(iteration = iterations, max_delta, "rank iteration");

        if max_delta < config.convergence_epsilon {
            converged = true;
            break;
        }
    }

    let ranks: Vec<(i32, f64)> = user_ids
        .iter()
        .map(|user_id| (*user_id, graph[user_id].rank))
        .collect();

    Ok(RankSolution {
        ranks,
        iterations,
        convergence_delta: round_to_thousandth(max_delta),
        converged,
    })
}
