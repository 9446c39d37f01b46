//! Route search requests and their cache fingerprints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{CityId, ModeFilter, TransportType};

use super::error::PlanError;

/// Heaviest baggage accepted in a request (kg).
const MAX_BAGGAGE_KG: f64 = 200.0;

/// Most transfers a request may ask for.
const MAX_TRANSFERS_LIMIT: usize = 10;

/// Traveller preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TripPreferences {
    /// Allowed modes; empty means any.
    pub modes: Vec<TransportType>,
    pub max_transfers: Option<usize>,
    pub baggage_kg: f64,
    pub insurance: bool,
}

/// A request to build a route between two cities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub from_city: CityId,
    pub to_city: CityId,
    pub date: NaiveDate,
    /// Day the booking is made; today when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_date: Option<NaiveDate>,
    #[serde(default)]
    pub preferences: TripPreferences,
}

impl RouteRequest {
    pub fn new(from_city: CityId, to_city: CityId, date: NaiveDate) -> Self {
        Self {
            from_city,
            to_city,
            date,
            booking_date: None,
            preferences: TripPreferences::default(),
        }
    }

    pub fn with_modes(mut self, modes: &[TransportType]) -> Self {
        self.preferences.modes = modes.to_vec();
        self
    }

    pub fn with_max_transfers(mut self, n: usize) -> Self {
        self.preferences.max_transfers = Some(n);
        self
    }

    pub fn with_baggage(mut self, kg: f64) -> Self {
        self.preferences.baggage_kg = kg;
        self
    }

    pub fn with_insurance(mut self) -> Self {
        self.preferences.insurance = true;
        self
    }

    pub fn with_booking_date(mut self, date: NaiveDate) -> Self {
        self.booking_date = Some(date);
        self
    }

    pub fn mode_filter(&self) -> ModeFilter {
        ModeFilter::only(&self.preferences.modes)
    }

    /// Validate the request.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.from_city == self.to_city {
            return Err(PlanError::InvalidRequest(
                "origin and destination are the same city".to_string(),
            ));
        }

        let baggage = self.preferences.baggage_kg;
        if !baggage.is_finite() || !(0.0..=MAX_BAGGAGE_KG).contains(&baggage) {
            return Err(PlanError::InvalidRequest(format!(
                "baggage must be between 0 and {MAX_BAGGAGE_KG} kg"
            )));
        }

        if self
            .preferences
            .max_transfers
            .is_some_and(|n| n > MAX_TRANSFERS_LIMIT)
        {
            return Err(PlanError::InvalidRequest(format!(
                "at most {MAX_TRANSFERS_LIMIT} transfers may be requested"
            )));
        }

        if let Some(booked) = self.booking_date
            && booked > self.date
        {
            return Err(PlanError::InvalidRequest(
                "booking date is after the travel date".to_string(),
            ));
        }

        Ok(())
    }

    /// Normalized cache key for this request against `graph_version`.
    ///
    /// Identifiers cannot contain ':', so the fields never run together.
    pub fn fingerprint(&self, booking_date: NaiveDate, graph_version: &str) -> String {
        let modes = self.mode_filter();
        let modes = if modes.is_all() {
            "all".to_string()
        } else {
            modes
                .types()
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(",")
        };
        let transfers = self
            .preferences
            .max_transfers
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        let baggage_dag = (self.preferences.baggage_kg * 10.0).round() as i64;

        format!(
            "search:{}:{}:{}:{}:{}:{}:{}:{}:{}",
            self.from_city,
            self.to_city,
            self.date,
            booking_date,
            modes,
            transfers,
            baggage_dag,
            u8::from(self.preferences.insurance),
            graph_version
        )
    }
}
