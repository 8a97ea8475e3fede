//! The typed result tree: per-die [`RollResult`]s grouped into [`RollResults`], grouped into
//! [`ResultGroup`]s.

mod result_group;
mod roll_result;
mod roll_results;

pub use result_group::{GroupElement, ResultGroup};
pub use roll_result::{DiceId, RollResult};
pub use roll_results::RollResults;
