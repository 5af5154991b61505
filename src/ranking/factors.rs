//! Factor calculators.
//!
//! Each turns the observation list for one (sender, recipient) pair into
//! one scalar. All four are pure functions of their input; an empty list
//! is always 0.0. Time and response factors stay in [0, 1]; length and
//! activity factors can exceed 1 before blending.

use crate::db::models::MessageObservation;

/// Decay rate applied to the average response latency, per minute.
const RESPONSE_DECAY: f64 = 0.01;

/// Baseline message length in characters.
const STANDARD_LENGTH: f64 = 50.0;

/// Cap on the length ratio so long essays cannot dominate the factor.
const MAX_LENGTH_RATIO: f64 = 2.0;

/// Baseline message count for a pair.
const STANDARD_COUNT: f64 = 7.0;

/// Boost applied to the activity reward.
const COUNT_BOOST: f64 = 1.5;

/// Response-speed factor: `exp(-0.01 * avg latency)` over the
/// observations that actually drew a timed response. Fast replies push
/// the factor toward 1; if no observation has a positive latency the
/// factor is 0.
pub fn time_factor(observations: &[MessageObservation]) -> f64 {
    if observations.is_empty() {
        return 0.0;
    }

    let mut total_minutes = 0.0;
    let mut responses = 0u32;
    for obs in observations {
        if obs.response_time_minutes > 0.0 {
            total_minutes += obs.response_time_minutes;
            responses += 1;
        }
    }

    if responses == 0 {
        return 0.0;
    }

    (-RESPONSE_DECAY * (total_minutes / f64::from(responses))).exp()
}

/// Share of observations that received a reply.
pub fn response_factor(observations: &[MessageObservation]) -> f64 {
    if observations.is_empty() {
        return 0.0;
    }

    let responded = observations.iter().filter(|o| o.has_response).count();
    responded as f64 / observations.len() as f64
}

/// Message-length factor: the average length over the baseline of 50
/// characters, capped at a ratio of 2.0 and mapped to
/// `0.5 + 0.5 * ratio`.
pub fn length_factor(observations: &[MessageObservation]) -> f64 {
    if observations.is_empty() {
        return 0.0;
    }

    let total: i64 = observations.iter().map(|o| i64::from(o.message_length)).sum();
    let average = total as f64 / observations.len() as f64;

    0.5 + 0.5 * (average / STANDARD_LENGTH).min(MAX_LENGTH_RATIO)
}

/// Conversation-activity factor: a sub-linear reward for pair volume,
/// `1.5 * sqrt(count) / sqrt(7)`.
pub fn message_count_factor(observations: &[MessageObservation]) -> f64 {
    if observations.is_empty() {
        return 0.0;
    }

    COUNT_BOOST * (observations.len() as f64).sqrt() / STANDARD_COUNT.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(
        response_time_minutes: f64,
        message_length: i32,
        has_response: bool,
    ) -> MessageObservation {
        MessageObservation {
            response_time_minutes,
            message_length,
            has_response,
            follow_up_messages: 0,
        }
    }

    #[test]
    fn test_all_factors_zero_on_empty_input() {
        assert_eq!(time_factor(&[]), 0.0);
        assert_eq!(response_factor(&[]), 0.0);
        assert_eq!(length_factor(&[]), 0.0);
        assert_eq!(message_count_factor(&[]), 0.0);
    }

    #[test]
    fn test_time_factor_ignores_unanswered_messages() {
        // Only the two timed responses count toward the average.
        let observations = vec![
            observation(10.0, 20, true),
            observation(0.0, 20, false),
            observation(30.0, 20, true),
        ];
        let expected = (-0.01f64 * 20.0).exp();
        assert!((time_factor(&observations) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_time_factor_zero_without_timed_responses() {
        let observations = vec![observation(0.0, 20, false), observation(0.0, 45, true)];
        assert_eq!(time_factor(&observations), 0.0);
    }

    #[test]
    fn test_time_factor_rewards_fast_replies() {
        let fast = vec![observation(1.0, 20, true)];
        let slow = vec![observation(600.0, 20, true)];
        assert!(time_factor(&fast) > 0.99);
        assert!(time_factor(&slow) < 0.01);
    }

    #[test]
    fn test_response_factor_is_reply_share() {
        let observations = vec![
            observation(5.0, 20, true),
            observation(0.0, 20, false),
            observation(0.0, 20, false),
            observation(2.0, 20, true),
        ];
        assert_eq!(response_factor(&observations), 0.5);
    }

    #[test]
    fn test_length_factor_caps_at_double_standard() {
        // 100 chars hits the 2.0 ratio cap exactly.
        let at_cap = vec![observation(0.0, 100, false)];
        assert_eq!(length_factor(&at_cap), 1.5);

        // 500 chars is capped to the same value.
        let beyond_cap = vec![observation(0.0, 500, false)];
        assert_eq!(length_factor(&beyond_cap), 1.5);

        // Standard length maps to 1.0.
        let standard = vec![observation(0.0, 50, false)];
        assert_eq!(length_factor(&standard), 1.0);
    }

    #[test]
    fn test_message_count_factor_at_baseline() {
        let observations: Vec<_> = (0..7).map(|_| observation(0.0, 20, false)).collect();
        assert!((message_count_factor(&observations) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_message_count_factor_single_message() {
        let observations = vec![observation(0.0, 20, false)];
        let expected = 1.5 / 7.0f64.sqrt();
        assert!((message_count_factor(&observations) - expected).abs() < 1e-12);
    }
}
