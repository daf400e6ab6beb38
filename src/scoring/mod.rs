mod ranges;
mod rating;
mod symbols;
mod tables;

pub use ranges::{Bounds, RangeTable, ScoreBand};
pub use rating::{normalize_score, Rating};
pub use symbols::{base_symbol, symbol_info, SymbolInfo, WeatherClass, UNKNOWN_SYMBOL};
pub use tables::ScoringTables;
