//! Percentile normalization and influence bands.

use super::solver::RankSolution;
use super::round_to_thousandth;
use crate::db::models::{InfluenceCategory, UserInfluenceRank};
use chrono::NaiveDate;

/// Convert solved ranks into persisted influence records.
///
/// A user's percentile is the highest sorted position holding a value not
/// above the user's own rank, divided by `n - 1`; tied users therefore
/// all share the percentile of the highest equal position. Rank and
/// percentile are rounded to three decimals, and the solver's iteration
/// count and convergence delta are copied onto every record.
pub fn normalize_and_categorize(
    solution: &RankSolution,
    calculation_date: NaiveDate,
) -> Vec<UserInfluenceRank> {
    let mut sorted: Vec<f64> = solution.ranks.iter().map(|&(_, rank)| rank).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    solution
        .ranks
        .iter()
        .map(|&(user_id, rank)| {
            let percentile = percentile_of(&sorted, rank);
            UserInfluenceRank {
                user_id,
                chat_rank: round_to_thousandth(rank),
                rank_percentile: round_to_thousandth(percentile),
                category: InfluenceCategory::from_percentile(percentile),
                calculation_date,
                iteration_count: solution.iterations,
                convergence_delta: solution.convergence_delta,
            }
        })
        .collect()
}

/// Highest index with a value `<= rank`, over `len - 1`. A lone ranked
/// user has no peers to divide by and is defined as the top percentile.
fn percentile_of(sorted: &[f64], rank: f64) -> f64 {
    if sorted.len() <= 1 {
        return 1.0;
    }

    let position = sorted.partition_point(|value| *value <= rank).saturating_sub(1);
    position as f64 / (sorted.len() - 1) as f64
}
