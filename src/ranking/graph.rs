//! Communication graph assembly.

use crate::db::models::CommunicationWeight;
use std::collections::HashMap;

/// Vertex state for one ranking run. Owned by the solver for the
/// duration of a solve and discarded afterwards.
#[derive(Debug, Clone)]
pub struct UserNode {
    pub user_id: i32,
    /// Sender id -> edge weight for every edge pointing at this user.
    /// Keys are unique; a duplicate ordered pair overwrites.
    pub incoming_links: HashMap<i32, f64>,
    /// Sum of ALL outgoing edge weights across the whole graph,
    /// accumulated once at build time and never recomputed per
    /// iteration.
    pub out_degree: f64,
    pub rank: f64,
    pub prev_rank: f64,
}

impl UserNode {
    fn new(user_id: i32) -> Self {
        Self {
            user_id,
            incoming_links: HashMap::new(),
            out_degree: 0.0,
            rank: 0.0,
            prev_rank: 0.0,
        }
    }
}

/// Build the per-user adjacency map from the flat edge list.
///
/// First pass materializes a node for every user appearing on either side
/// of any edge, so a user who only ever sends still becomes a node.
/// Second pass records incoming links on recipients and accumulates
/// sender out-degrees.
pub fn build_user_graph(weights: &[CommunicationWeight]) -> HashMap<i32, UserNode> {
    let mut graph: HashMap<i32, UserNode> = HashMap::new();

    for edge in weights {
        graph
            .entry(edge.sender_id)
            .or_insert_with(|| UserNode::new(edge.sender_id));
        graph
            .entry(edge.recipient_id)
            .or_insert_with(|| UserNode::new(edge.recipient_id));
    }

    for edge in weights {
        if let Some(recipient) = graph.get_mut(&edge.recipient_id) {
            recipient.incoming_links.insert(edge.sender_id, edge.weight);
        }
        if let Some(sender) = graph.get_mut(&edge.sender_id) {
            sender.out_degree += edge.weight;
        }
    }

    graph
}
