pub mod chatrank;

pub use chatrank::{ChatRankService, RankRunSummary};
