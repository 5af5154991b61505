//! ChatRank: influence ranking over the directed communication graph.
//!
//! Pipeline: per-pair observations -> factor calculators -> weight
//! synthesizer -> graph builder -> rank solver -> percentile bands.
//! Everything in this module is pure, synchronous and free of shared
//! state; I/O stays at the service boundary.

pub mod factors;
pub mod graph;
pub mod percentile;
pub mod solver;
pub mod weights;

pub use graph::{build_user_graph, UserNode};
pub use percentile::normalize_and_categorize;
pub use solver::{solve, RankSolution};
pub use weights::synthesize_weights;

use serde::Deserialize;

/// Parameters for one ranking run. Passed by value into every call and
/// never mutated mid-run; callers may override any subset via
/// configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRankConfig {
    /// Weight of graph-propagated rank versus the constant baseline term.
    #[serde(default = "default_damping_factor")]
    pub damping_factor: f64,

    /// Hard bound on solver work.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Largest per-user rank change still counted as converged.
    #[serde(default = "default_convergence_epsilon")]
    pub convergence_epsilon: f64,

    /// Blend weight of the response-speed factor.
    #[serde(default = "default_time_factor")]
    pub time_factor: f64,

    /// Blend weight of the reply-share factor.
    #[serde(default = "default_response_factor")]
    pub response_factor: f64,

    /// Blend weight of the message-length factor.
    #[serde(default = "default_length_factor")]
    pub length_factor: f64,

    /// Blend weight of the conversation-activity factor.
    #[serde(default = "default_continuation_factor")]
    pub continuation_factor: f64,
}

impl Default for ChatRankConfig {
    fn default() -> Self {
        Self {
            damping_factor: default_damping_factor(),
            max_iterations: default_max_iterations(),
            convergence_epsilon: default_convergence_epsilon(),
            time_factor: default_time_factor(),
            response_factor: default_response_factor(),
            length_factor: default_length_factor(),
            continuation_factor: default_continuation_factor(),
        }
    }
}

fn default_damping_factor() -> f64 {
    0.85
}
fn default_max_iterations() -> u32 {
    100
}
fn default_convergence_epsilon() -> f64 {
    0.0001
}
fn default_time_factor() -> f64 {
    0.25
}
fn default_response_factor() -> f64 {
    0.10
}
fn default_length_factor() -> f64 {
    0.30
}
fn default_continuation_factor() -> f64 {
    0.35
}

/// Round to three decimal places, half away from zero. Applied to every
/// persisted factor, weight, rank, percentile and convergence delta.
pub fn round_to_thousandth(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChatRankConfig::default();
        assert_eq!(config.damping_factor, 0.85);
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.convergence_epsilon, 0.0001);
        assert_eq!(config.time_factor, 0.25);
        assert_eq!(config.response_factor, 0.10);
        assert_eq!(config.length_factor, 0.30);
        assert_eq!(config.continuation_factor, 0.35);
    }

    #[test]
    fn test_round_to_thousandth() {
        assert_eq!(round_to_thousandth(1.2345678), 1.235);
        assert_eq!(round_to_thousandth(1.2344), 1.234);
        assert_eq!(round_to_thousandth(0.0), 0.0);
        // Half rounds away from zero on both sides.
        assert_eq!(round_to_thousandth(-1.2345678), -1.235);
    }

    #[test]
    fn test_round_to_thousandth_is_idempotent() {
        for value in [0.0, 0.4985, 1.0 / 3.0, -7.7777, 123.456_789, 0.999_9] {
            let once = round_to_thousandth(value);
            assert_eq!(round_to_thousandth(once), once);
        }
    }
}
