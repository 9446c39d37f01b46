//! Dynamic per-segment pricing.
//!
//! `base = distance × rate(mode) × dateCoeff × timeCoeff × routeTypeCoeff × seasonCoeff`,
//! plus additional expenses (taxi, baggage, fees, transfer) computed from
//! the base and the trip context.

use chrono::{NaiveDate, NaiveTime};
use tracing::trace;

use crate::domain::{AdditionalExpenses, CityId, Money, PriceBreakdown, Season, TransportType};

use super::config::PricingConfig;

/// Inputs to the price of one segment.
#[derive(Debug, Clone)]
pub struct PricingContext {
    pub distance_km: f64,
    pub season: Season,
    /// Day the booking is made.
    pub booking_date: NaiveDate,
    pub travel_date: Option<NaiveDate>,
    pub departure_time: Option<NaiveTime>,
    pub baggage_kg: f64,
    pub insurance: bool,
    /// Transfers charged on this segment.
    pub transfers_count: u32,
}

impl PricingContext {
    /// Context for a trip on `travel_date`, booked on `booking_date`.
    pub fn new(distance_km: f64, booking_date: NaiveDate, travel_date: NaiveDate) -> Self {
        Self {
            distance_km,
            season: Season::of(travel_date),
            booking_date,
            travel_date: Some(travel_date),
            departure_time: None,
            baggage_kg: 0.0,
            insurance: false,
            transfers_count: 0,
        }
    }

    pub fn with_departure_time(mut self, time: NaiveTime) -> Self {
        self.departure_time = Some(time);
        self
    }

    pub fn with_baggage(mut self, kg: f64) -> Self {
        self.baggage_kg = kg;
        self
    }

    pub fn with_insurance(mut self, insurance: bool) -> Self {
        self.insurance = insurance;
        self
    }

    pub fn with_transfers(mut self, count: u32) -> Self {
        self.transfers_count = count;
        self
    }
}

/// Price calculator over a `PricingConfig`.
#[derive(Debug, Clone, Default)]
pub struct PriceCalculator {
    config: PricingConfig,
}

impl PriceCalculator {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Booking-horizon coefficient.
    pub fn date_coefficient(&self, ctx: &PricingContext) -> f64 {
        let c = &self.config.coefficients;
        let Some(travel) = ctx.travel_date else {
            return 1.0;
        };
        let days_ahead = (travel - ctx.booking_date).num_days();
        if days_ahead >= c.early_booking_days {
            c.early_booking
        } else if (1..=c.late_booking_days).contains(&days_ahead) {
            c.late_booking
        } else {
            1.0
        }
    }

    /// Departure-time coefficient.
    pub fn time_coefficient(&self, ctx: &PricingContext) -> f64 {
        let c = &self.config.coefficients;
        match ctx.departure_time {
            Some(t) if t >= c.evening_start && t < c.evening_end => c.evening,
            _ => 1.0,
        }
    }

    /// Seasonal multiplier for the travel season.
    pub fn season_coefficient(&self, ctx: &PricingContext) -> f64 {
        self.config
            .coefficients
            .seasonal
            .get(&ctx.season)
            .copied()
            .unwrap_or(1.0)
    }

    /// Route-type coefficient: 1.0 direct, plus a step per hub.
    pub fn route_type_coefficient(&self, hub_count: usize) -> f64 {
        1.0 + self.config.coefficients.per_hub * hub_count as f64
    }

    /// Computed base fare for one segment.
    pub fn calculate_base_price(
        &self,
        transport: TransportType,
        ctx: &PricingContext,
        hub_count: usize,
    ) -> Money {
        let distance = ctx.distance_km.max(0.0);
        let rate = self.config.rate_per_km(transport);
        let date = self.date_coefficient(ctx);
        let time = self.time_coefficient(ctx);
        let route = self.route_type_coefficient(hub_count);
        let season = self.season_coefficient(ctx);

        trace!(%transport, distance, rate, date, time, route, season, "Base price factors");
        Money::from_rubles(distance * rate * date * time * route * season)
    }

    /// Taxi, baggage, fees and transfer charges for one segment.
    pub fn calculate_additional_expenses(
        &self,
        transport: TransportType,
        ctx: &PricingContext,
        base: Money,
        origin_city: Option<&CityId>,
    ) -> AdditionalExpenses {
        let fees = &self.config.fees;

        let taxi = if transport.needs_terminal_taxi() {
            self.taxi_estimate(origin_city)
        } else {
            Money::ZERO
        };

        let baggage = match transport {
            TransportType::Airplane if ctx.baggage_kg > 0.0 => {
                let excess = (ctx.baggage_kg - fees.air_baggage_allowance_kg).max(0.0);
                fees.air_baggage_flat + per_kg(fees.air_baggage_per_kg, excess)
            }
            TransportType::Train => {
                let excess = (ctx.baggage_kg - fees.rail_baggage_allowance_kg).max(0.0);
                per_kg(fees.rail_baggage_per_kg, excess)
            }
            _ => Money::ZERO,
        };

        let mut service_fees = match transport {
            TransportType::Airplane => fees.airport_fee + fees.check_in_fee,
            TransportType::Train => share(base, fees.rail_fee_ratio).max(fees.rail_fee_min),
            _ => Money::ZERO,
        };
        if ctx.insurance {
            service_fees += share(base, fees.insurance_ratio).max(fees.insurance_min);
        }

        let transfer = fees.transfer_fee * ctx.transfers_count;

        AdditionalExpenses::new(taxi, baggage, service_fees, transfer)
    }

    /// Full breakdown for one segment.
    ///
    /// A declared fare replaces the computed base.
    pub fn price_segment(
        &self,
        transport: TransportType,
        ctx: &PricingContext,
        hub_count: usize,
        declared_fare: Option<Money>,
        origin_city: Option<&CityId>,
    ) -> PriceBreakdown {
        let base =
            declared_fare.unwrap_or_else(|| self.calculate_base_price(transport, ctx, hub_count));
        let expenses = self.calculate_additional_expenses(transport, ctx, base, origin_city);
        PriceBreakdown::new(base, expenses)
    }

    fn taxi_estimate(&self, city: Option<&CityId>) -> Money {
        let fees = &self.config.fees;
        let tariff = city.and_then(|c| self.config.city_taxi.get(c));
        let per_km = tariff.map_or(fees.default_taxi_per_km, |t| t.per_km);
        let km = tariff
            .and_then(|t| t.station_distance_km)
            .unwrap_or(fees.default_station_distance_km);
        fees.taxi_landing + Money::from_rubles(per_km * km)
    }
}

/// Sum breakdowns component by component.
pub fn aggregate<'a>(items: impl IntoIterator<Item = &'a PriceBreakdown>) -> PriceBreakdown {
    PriceBreakdown::sum(items.into_iter())
}

fn per_kg(rate: Money, kg: f64) -> Money {
    Money::from_rubles(rate.as_rubles() * kg.ceil())
}

fn share(amount: Money, ratio: f64) -> Money {
    Money::from_rubles(amount.as_rubles() * ratio)
}
