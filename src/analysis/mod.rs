pub mod blocks;
pub mod handlers;
pub mod optimal;
pub mod ranking;
pub mod recommend;

pub use blocks::{best_and_worst_blocks, extract_blocks, find_consistent_blocks, WeatherBlock};
pub use optimal::{find_avoid_ranges, select_optimal_block, AvoidRange, OptimalBlock};
pub use ranking::{rank_locations_for_date, RankedLocation};
pub use recommend::{recommend_best_times, RecommendationPeriod};
