//! ChatRank: influence ranking for a messaging platform.
//!
//! Derives a communication-strength weight for every ordered
//! (sender, recipient) pair from historical message statistics, assembles
//! the weights into a directed graph, solves a damped fixed-point
//! iteration for a converged rank per user, and maps ranks into
//! percentiles and influence bands.

pub mod config;
pub mod db;
pub mod errors;
pub mod ranking;
pub mod services;
