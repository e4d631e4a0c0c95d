pub mod aggregator;
pub mod chart;
pub mod time_range;

pub use aggregator::*;
pub use chart::*;
pub use time_range::*;
