//! Weight synthesis: blends the four factors into one edge weight per
//! observed (sender, recipient) pair.

use super::{factors, round_to_thousandth, ChatRankConfig};
use crate::db::models::{CommunicationWeight, ObservationMap};
use chrono::NaiveDate;

/// Compute one `CommunicationWeight` per pair present in the observation
/// map, stamped with the run date.
///
/// Pairs are visited in ascending (sender, recipient) order so the emitted
/// list is identical across runs on identical input. Pairs with no
/// recorded observations never appear in the map and are therefore never
/// emitted. The blended weight and each stored factor are rounded to
/// three decimals.
pub fn synthesize_weights(
    messages: &ObservationMap,
    config: &ChatRankConfig,
    calculation_date: NaiveDate,
) -> Vec<CommunicationWeight> {
    let mut weights = Vec::new();

    let mut sender_ids: Vec<i32> = messages.keys().copied().collect();
    sender_ids.sort_unstable();

    for sender_id in sender_ids {
        let recipients = &messages[&sender_id];
        let mut recipient_ids: Vec<i32> = recipients.keys().copied().collect();
        recipient_ids.sort_unstable();

        for recipient_id in recipient_ids {
            let observations = &recipients[&recipient_id];

            let time = factors::time_factor(observations);
            let response = factors::response_factor(observations);
            let length = factors::length_factor(observations);
            let continuation = factors::message_count_factor(observations);

            let weight = config.time_factor * time
                + config.response_factor * response
                + config.length_factor * length
                + config.continuation_factor * continuation;

            weights.push(CommunicationWeight {
                sender_id,
                recipient_id,
                weight: round_to_thousandth(weight),
                time_factor: round_to_thousandth(time),
                response_factor: round_to_thousandth(response),
                length_factor: round_to_thousandth(length),
                continuation_factor: round_to_thousandth(continuation),
                calculation_date,
            });
        }
    }

    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::MessageObservation;
    use std::collections::HashMap;

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_empty_map_emits_no_weights() {
        let messages = ObservationMap::new();
        let weights = synthesize_weights(&messages, &ChatRankConfig::default(), run_date());
        assert!(weights.is_empty());
    }

    #[test]
    fn test_single_unanswered_long_message() {
        // One 100-char message with no reply: time and response factors
        // are 0, length hits the 2.0 ratio cap, activity is
        // 1.5 / sqrt(7). With default blend weights the combined weight
        // is 0.30 * 1.5 + 0.35 * 0.56695 = 0.49843, which rounds half
        // away from zero to 0.498.
        let mut messages = ObservationMap::new();
        messages.entry(1).or_insert_with(HashMap::new).insert(
            2,
            vec![MessageObservation {
                response_time_minutes: 0.0,
                message_length: 100,
                has_response: false,
                follow_up_messages: 1,
            }],
        );

        let weights = synthesize_weights(&messages, &ChatRankConfig::default(), run_date());
        assert_eq!(weights.len(), 1);

        let edge = &weights[0];
        assert_eq!(edge.sender_id, 1);
        assert_eq!(edge.recipient_id, 2);
        assert_eq!(edge.time_factor, 0.0);
        assert_eq!(edge.response_factor, 0.0);
        assert_eq!(edge.length_factor, 1.5);
        assert_eq!(edge.continuation_factor, 0.567);
        assert_eq!(edge.weight, 0.498);
        assert_eq!(edge.calculation_date, run_date());
    }

    #[test]
    fn test_pairs_emitted_in_sorted_order() {
        let observation = MessageObservation {
            response_time_minutes: 5.0,
            message_length: 40,
            has_response: true,
            follow_up_messages: 2,
        };

        let mut messages = ObservationMap::new();
        for (sender, recipient) in [(9, 1), (3, 7), (3, 2), (9, 4)] {
            messages
                .entry(sender)
                .or_insert_with(HashMap::new)
                .insert(recipient, vec![observation.clone()]);
        }

        let weights = synthesize_weights(&messages, &ChatRankConfig::default(), run_date());
        let pairs: Vec<(i32, i32)> = weights
            .iter()
            .map(|w| (w.sender_id, w.recipient_id))
            .collect();
        assert_eq!(pairs, vec![(3, 2), (3, 7), (9, 1), (9, 4)]);
    }

    #[test]
    fn test_factor_weights_scale_the_blend() {
        let mut messages = ObservationMap::new();
        messages.entry(1).or_insert_with(HashMap::new).insert(
            2,
            vec![MessageObservation {
                response_time_minutes: 0.0,
                message_length: 50,
                has_response: false,
                follow_up_messages: 0,
            }],
        );

        // Only the length factor carries weight: 1.0 * 1.0 = 1.0.
        let config = ChatRankConfig {
            time_factor: 0.0,
            response_factor: 0.0,
            length_factor: 1.0,
            continuation_factor: 0.0,
            ..ChatRankConfig::default()
        };

        let weights = synthesize_weights(&messages, &config, run_date());
        assert_eq!(weights[0].weight, 1.0);
    }
}
