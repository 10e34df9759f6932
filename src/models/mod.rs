//! Data models for calculator inputs and position plans.

mod inputs;
mod plan;

pub use inputs::{try_parse_amount, RawInputs, SizingInputs};
pub use plan::{PositionPlan, ProfitTarget};
