//! Post-hoc route validation.
//!
//! Structural findings (gaps, impossible connections, self-contradicting
//! segments) make a route invalid. Plausibility findings (distance, price
//! and path length far from expectation) are warnings with suggested
//! corrections. Neither kind is an error: the route is always returned.

mod config;
mod plausibility;
mod structural;

pub use config::ValidationConfig;
pub use plausibility::plausibility_issues;
pub use structural::structural_issues;

use std::collections::BTreeSet;

use tracing::debug;

use crate::domain::{IssueKind, RouteSegment, ValidationIssue, ValidationResult};
use crate::pricing::PriceCalculator;

/// Runs both checks over a route's segments.
#[derive(Debug, Clone, Default)]
pub struct RouteValidator {
    config: ValidationConfig,
    pricing: PriceCalculator,
}

impl RouteValidator {
    pub fn new(config: ValidationConfig, pricing: PriceCalculator) -> Self {
        Self { config, pricing }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate `segments`, judging fares for a path through `hub_count` hubs.
    pub fn validate(&self, segments: &[RouteSegment], hub_count: usize) -> ValidationResult {
        let mut issues = structural_issues(segments, &self.config);
        issues.extend(plausibility_issues(segments, hub_count, &self.config, &self.pricing));

        let recommendations = recommendations(&issues);
        let result = ValidationResult::from_issues(segments.len(), issues, recommendations);
        debug!(
            valid = result.is_valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "Validated route"
        );
        result
    }
}

/// One recommendation per kind of finding, in order of first appearance.
fn recommendations(issues: &[ValidationIssue]) -> Vec<String> {
    let mut kinds: Vec<IssueKind> = Vec::new();
    for issue in issues {
        if !kinds.contains(&issue.kind) {
            kinds.push(issue.kind);
        }
    }
    kinds
        .into_iter()
        .map(|kind| {
            match kind {
                IssueKind::EmptySpace => {
                    "Add a connecting segment or a transfer between disconnected stops"
                }
                IssueKind::IncorrectConnection => "Use a transport mode the stops actually serve",
                IssueKind::UnrealisticRoute => {
                    "Check the schedule times, distances and season of each segment"
                }
                IssueKind::DistanceMismatch => "Replace the declared distance with the suggested value",
                IssueKind::PriceMismatch => "Review the fare against the current tariff",
                IssueKind::PathMismatch => "Re-route the segment geometry through the road network",
            }
            .to_string()
        })
        .collect()
}
