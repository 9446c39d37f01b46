//! Dynamic pricing of route segments.

mod calculator;
mod config;

pub use calculator::{PriceCalculator, PricingContext, aggregate};
pub use config::{CityTaxi, Coefficients, FeeTable, PricingConfig};
