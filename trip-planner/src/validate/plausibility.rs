//! Plausibility checks: do the claimed attributes match what geography and
//! the tariff would predict?

use crate::domain::{
    Correction, CorrectionKind, IssueKind, RouteSegment, Season, ValidationIssue,
};
use crate::geometry::{haversine_km, path_length_km};
use crate::pricing::{PriceCalculator, PricingContext};

use super::config::ValidationConfig;

/// Findings that only warn.
pub fn plausibility_issues(
    segments: &[RouteSegment],
    hub_count: usize,
    config: &ValidationConfig,
    pricing: &PriceCalculator,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for (idx, seg) in segments.iter().enumerate() {
        let straight = haversine_km(&seg.from.coordinates, &seg.to.coordinates);
        issues.extend(distance_mismatch(idx, seg, straight, config));
        issues.extend(price_mismatch(idx, seg, hub_count, config, pricing));
        issues.extend(path_mismatch(idx, seg, straight, config));
    }
    issues
}

fn relative_diff(actual: f64, expected: f64) -> f64 {
    (actual - expected).abs() / expected
}

/// Closer to the threshold means less sure.
fn confidence(diff: f64, tolerance: f64) -> f64 {
    (1.0 - tolerance / diff).clamp(0.1, 0.95)
}

fn distance_mismatch(
    idx: usize,
    seg: &RouteSegment,
    straight: f64,
    config: &ValidationConfig,
) -> Option<ValidationIssue> {
    let expected = straight * config.circuity(seg.transport);
    if expected < 1.0 || !seg.distance_km.is_finite() {
        return None;
    }
    let diff = relative_diff(seg.distance_km, expected);
    (diff > config.distance_tolerance).then(|| {
        ValidationIssue::new(
            IssueKind::DistanceMismatch,
            Some(idx),
            format!(
                "declared {:.0} km, expected about {:.0} km for {}",
                seg.distance_km, expected, seg.transport
            ),
        )
        .with_correction(Correction {
            kind: CorrectionKind::Distance,
            suggested_value: expected.round(),
            confidence: confidence(diff, config.distance_tolerance),
        })
    })
}

fn price_mismatch(
    idx: usize,
    seg: &RouteSegment,
    hub_count: usize,
    config: &ValidationConfig,
    pricing: &PriceCalculator,
) -> Option<ValidationIssue> {
    // Booking horizon is unknown after the fact; judge at the neutral rate.
    let ctx = PricingContext {
        distance_km: seg.distance_km,
        season: Season::of(seg.departure.date()),
        booking_date: seg.departure.date(),
        travel_date: None,
        departure_time: Some(seg.departure.time()),
        baggage_kg: 0.0,
        insurance: false,
        transfers_count: 0,
    };
    let expected = pricing
        .calculate_base_price(seg.transport, &ctx, hub_count)
        .as_rubles();
    if expected <= 0.0 {
        return None;
    }
    let declared = seg.price.base().as_rubles();
    let diff = relative_diff(declared, expected);
    (diff > config.price_tolerance).then(|| {
        ValidationIssue::new(
            IssueKind::PriceMismatch,
            Some(idx),
            format!("base fare {declared:.2} ₽, expected about {expected:.2} ₽"),
        )
        .with_correction(Correction {
            kind: CorrectionKind::Price,
            suggested_value: expected.round(),
            confidence: confidence(diff, config.price_tolerance),
        })
    })
}

fn path_mismatch(
    idx: usize,
    seg: &RouteSegment,
    straight: f64,
    config: &ValidationConfig,
) -> Option<ValidationIssue> {
    let geometry = seg.geometry.as_ref()?;
    if straight < 1.0 || geometry.points.len() < 2 {
        return None;
    }
    let length = path_length_km(&geometry.points);
    let ratio = length / straight;

    let message = if seg.transport.is_terrain_following() && ratio <= config.min_terrain_path_ratio {
        format!("{} path is a straight line", seg.transport)
    } else if ratio > config.max_path_ratio {
        format!("path is {ratio:.1}x the straight-line distance")
    } else {
        return None;
    };

    Some(
        ValidationIssue::new(IssueKind::PathMismatch, Some(idx), message).with_correction(
            Correction {
                kind: CorrectionKind::PathLength,
                suggested_value: (straight * config.circuity(seg.transport)).round(),
                confidence: 0.5,
            },
        ),
    )
}
