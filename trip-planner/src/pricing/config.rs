//! Pricing configuration: per-km rates, coefficients and fee table.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveTime;

use crate::domain::{CityId, Money, Season, TransportType};

/// Booking-horizon and departure-time coefficients.
#[derive(Debug, Clone)]
pub struct Coefficients {
    /// Days ahead at or beyond which the early-booking discount applies.
    pub early_booking_days: i64,
    pub early_booking: f64,

    /// Days ahead (1..=this) in which the late-booking surcharge applies.
    pub late_booking_days: i64,
    pub late_booking: f64,

    /// Evening window, start inclusive, end exclusive.
    pub evening_start: NaiveTime,
    pub evening_end: NaiveTime,
    pub evening: f64,

    /// Added to the route-type coefficient per intermediate hub.
    pub per_hub: f64,

    /// Seasonal multipliers; a season missing here prices at 1.0.
    pub seasonal: HashMap<Season, f64>,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            early_booking_days: 30,
            early_booking: 0.9,
            late_booking_days: 7,
            late_booking: 1.2,
            evening_start: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
            evening_end: NaiveTime::from_hms_opt(23, 0, 0).unwrap_or(NaiveTime::MIN),
            evening: 1.1,
            per_hub: 0.1,
            seasonal: HashMap::new(),
        }
    }
}

/// Fixed fees and allowances.
#[derive(Debug, Clone)]
pub struct FeeTable {
    /// Taxi flag-fall.
    pub taxi_landing: Money,
    /// Taxi tariff for cities without their own entry (₽/km).
    pub default_taxi_per_km: f64,
    /// Terminal distance assumed when a city has none on record (km).
    pub default_station_distance_km: f64,

    /// Charged on any air booking that carries baggage.
    pub air_baggage_flat: Money,
    pub air_baggage_allowance_kg: f64,
    pub air_baggage_per_kg: Money,

    pub rail_baggage_allowance_kg: f64,
    pub rail_baggage_per_kg: Money,

    pub airport_fee: Money,
    pub check_in_fee: Money,

    /// Rail service fee as a share of base, with a floor.
    pub rail_fee_ratio: f64,
    pub rail_fee_min: Money,

    /// Insurance as a share of base, with a floor.
    pub insurance_ratio: f64,
    pub insurance_min: Money,

    /// Charged per transfer.
    pub transfer_fee: Money,
}

impl Default for FeeTable {
    fn default() -> Self {
        Self {
            taxi_landing: Money::from_kopecks(100_00),
            default_taxi_per_km: 30.0,
            default_station_distance_km: 15.0,
            air_baggage_flat: Money::from_kopecks(500_00),
            air_baggage_allowance_kg: 20.0,
            air_baggage_per_kg: Money::from_kopecks(200_00),
            rail_baggage_allowance_kg: 36.0,
            rail_baggage_per_kg: Money::from_kopecks(50_00),
            airport_fee: Money::from_kopecks(300_00),
            check_in_fee: Money::from_kopecks(200_00),
            rail_fee_ratio: 0.05,
            rail_fee_min: Money::from_kopecks(100_00),
            insurance_ratio: 0.02,
            insurance_min: Money::from_kopecks(150_00),
            transfer_fee: Money::from_kopecks(200_00),
        }
    }
}

/// Taxi tariff for one city.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityTaxi {
    pub per_km: f64,
    /// Typical distance from the centre to the airport or station (km).
    pub station_distance_km: Option<f64>,
}

/// All pricing parameters.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Base rate per transport type (₽/km).
    pub rates: BTreeMap<TransportType, f64>,
    pub coefficients: Coefficients,
    pub fees: FeeTable,
    pub city_taxi: HashMap<CityId, CityTaxi>,
}

impl PricingConfig {
    /// Rate per km for `transport`, or zero if it has none.
    pub fn rate_per_km(&self, transport: TransportType) -> f64 {
        self.rates.get(&transport).copied().unwrap_or(0.0)
    }

    /// Set the rate for one transport type.
    pub fn with_rate(mut self, transport: TransportType, per_km: f64) -> Self {
        self.rates.insert(transport, per_km);
        self
    }

    /// Add or replace a city taxi tariff.
    pub fn with_city_taxi(mut self, city: CityId, taxi: CityTaxi) -> Self {
        self.city_taxi.insert(city, taxi);
        self
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        let rates = BTreeMap::from([
            (TransportType::Airplane, 5.0),
            (TransportType::Train, 2.5),
            (TransportType::Bus, 2.0),
            (TransportType::Ferry, 3.0),
            (TransportType::WinterRoad, 3.5),
            (TransportType::Taxi, 25.0),
        ]);

        Self {
            rates,
            coefficients: Coefficients::default(),
            fees: FeeTable::default(),
            city_taxi: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rates() {
        let config = PricingConfig::default();
        assert_eq!(config.rate_per_km(TransportType::Airplane), 5.0);
        assert_eq!(config.rate_per_km(TransportType::Train), 2.5);
        assert_eq!(config.rate_per_km(TransportType::Bus), 2.0);
        assert_eq!(config.rate_per_km(TransportType::Ferry), 3.0);
        assert_eq!(config.rate_per_km(TransportType::WinterRoad), 3.5);
        assert_eq!(config.rate_per_km(TransportType::Taxi), 25.0);
    }

    #[test]
    fn overrides() {
        let config = PricingConfig::default()
            .with_rate(TransportType::Bus, 3.0)
            .with_city_taxi(
                CityId::parse("yakutsk").unwrap(),
                CityTaxi {
                    per_km: 40.0,
                    station_distance_km: Some(7.0),
                },
            );
        assert_eq!(config.rate_per_km(TransportType::Bus), 3.0);
        assert_eq!(config.city_taxi.len(), 1);
    }

    #[test]
    fn evening_window() {
        let c = Coefficients::default();
        assert_eq!(c.evening_start, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        assert_eq!(c.evening_end, NaiveTime::from_hms_opt(23, 0, 0).unwrap());
    }
}
