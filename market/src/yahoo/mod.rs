pub mod client;
pub mod types;

pub use client::YahooChartClient;
pub use types::*;
