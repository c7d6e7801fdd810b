//! Stats module - column statistics

mod calculator;

pub use calculator::{is_numeric, StatsCalculator};
