//! Validation result types attached to built routes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Consecutive segments do not touch.
    EmptySpace,
    /// A mode is used between stops that cannot serve it.
    IncorrectConnection,
    /// A segment contradicts itself (times, speed, distance).
    UnrealisticRoute,
    /// Declared distance differs from the geographic expectation.
    DistanceMismatch,
    /// Declared price differs from the tariff expectation.
    PriceMismatch,
    /// Path geometry is implausible for the mode.
    PathMismatch,
}

impl IssueKind {
    /// Structural kinds make a route invalid; plausibility kinds only warn.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            IssueKind::EmptySpace | IssueKind::IncorrectConnection | IssueKind::UnrealisticRoute
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::EmptySpace => "empty_space",
            IssueKind::IncorrectConnection => "incorrect_connection",
            IssueKind::UnrealisticRoute => "unrealistic_route",
            IssueKind::DistanceMismatch => "distance_mismatch",
            IssueKind::PriceMismatch => "price_mismatch",
            IssueKind::PathMismatch => "path_mismatch",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a suggested correction applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionKind {
    /// Distance in kilometres.
    Distance,
    /// Base price in roubles.
    Price,
    /// Geometry length in kilometres.
    PathLength,
}

/// A proposed replacement value for a flagged attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    #[serde(rename = "type")]
    pub kind: CorrectionKind,
    pub suggested_value: f64,
    /// In [0, 1].
    pub confidence: f64,
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub kind: IssueKind,
    /// Index of the offending segment; for adjacency issues, the first of the pair.
    pub segment_index: Option<usize>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<Correction>,
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, segment_index: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            kind,
            segment_index,
            message: message.into(),
            correction: None,
        }
    }

    pub fn with_correction(mut self, correction: Correction) -> Self {
        self.correction = Some(correction);
        self
    }
}

/// Per-segment summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentValidation {
    pub segment_index: usize,
    pub is_valid: bool,
    pub issues: Vec<IssueKind>,
}

/// Combined structural and plausibility verdict.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub segment_validations: Vec<SegmentValidation>,
    pub recommendations: Vec<String>,
}

impl ValidationResult {
    /// Assemble a result from findings for a route of `segment_count` segments.
    ///
    /// Structural kinds go to `errors`, the rest to `warnings`.
    pub fn from_issues(
        segment_count: usize,
        issues: Vec<ValidationIssue>,
        recommendations: Vec<String>,
    ) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            issues.into_iter().partition(|i| i.kind.is_structural());

        let segment_validations = (0..segment_count)
            .map(|idx| {
                let mut kinds: Vec<IssueKind> = errors
                    .iter()
                    .chain(warnings.iter())
                    .filter(|i| i.segment_index == Some(idx))
                    .map(|i| i.kind)
                    .collect();
                kinds.dedup();
                SegmentValidation {
                    segment_index: idx,
                    is_valid: !errors.iter().any(|e| e.segment_index == Some(idx)),
                    issues: kinds,
                }
            })
            .collect();

        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            segment_validations,
            recommendations,
        }
    }

    /// Whether anything at all was flagged.
    pub fn has_issues(&self) -> bool {
        !self.errors.is_empty() || !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_issues_invalidate() {
        let result = ValidationResult::from_issues(
            2,
            vec![
                ValidationIssue::new(IssueKind::EmptySpace, Some(0), "gap"),
                ValidationIssue::new(IssueKind::DistanceMismatch, Some(1), "far"),
            ],
            vec![],
        );

        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert!(!result.segment_validations[0].is_valid);
        assert!(result.segment_validations[1].is_valid);
        assert_eq!(result.segment_validations[1].issues, vec![IssueKind::DistanceMismatch]);
    }

    #[test]
    fn warnings_only_stay_valid() {
        let result = ValidationResult::from_issues(
            1,
            vec![ValidationIssue::new(IssueKind::PathMismatch, Some(0), "straight")],
            vec![],
        );
        assert!(result.is_valid);
        assert!(result.has_issues());
    }

    #[test]
    fn correction_serializes_type_field() {
        let issue = ValidationIssue::new(IssueKind::PriceMismatch, Some(0), "cheap").with_correction(
            Correction {
                kind: CorrectionKind::Price,
                suggested_value: 24500.0,
                confidence: 0.7,
            },
        );
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "price_mismatch");
        assert_eq!(json["correction"]["type"], "price");
        assert_eq!(json["correction"]["suggestedValue"], 24500.0);
    }
}
