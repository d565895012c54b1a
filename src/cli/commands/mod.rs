mod refresh;
mod stats;

pub use refresh::cmd_refresh;
pub use stats::cmd_stats;
