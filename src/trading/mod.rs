//! Trading logic: sizing configuration and the position sizer.

mod config;
mod position_sizer;

pub use config::{parse_reward_ratios, SizingConfig};
pub use position_sizer::PositionSizer;
