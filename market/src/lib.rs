pub mod aggregator;
pub mod cache;
pub mod instrument;
pub mod signal;
pub mod source;
pub mod types;
pub mod watchlist;
pub mod yahoo;
