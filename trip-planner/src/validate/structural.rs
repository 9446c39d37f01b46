//! Structural checks: does the route hold together at all?

use crate::domain::{IssueKind, RouteSegment, Season, TransportType, ValidationIssue};

use super::config::ValidationConfig;

/// Findings that make a route invalid.
pub fn structural_issues(segments: &[RouteSegment], config: &ValidationConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (idx, seg) in segments.iter().enumerate() {
        connection_issues(idx, seg, &mut issues);
        segment_issues(idx, seg, config, &mut issues);
    }

    for (idx, pair) in segments.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.to.id != next.from.id {
            issues.push(ValidationIssue::new(
                IssueKind::EmptySpace,
                Some(idx),
                format!(
                    "segment {} ends at {} but segment {} starts at {}",
                    idx,
                    prev.to.id,
                    idx + 1,
                    next.from.id
                ),
            ));
        }
        if next.departure < prev.arrival {
            issues.push(ValidationIssue::new(
                IssueKind::UnrealisticRoute,
                Some(idx + 1),
                format!(
                    "departs at {} before the previous arrival at {}",
                    next.departure, prev.arrival
                ),
            ));
        }
    }

    issues
}

fn connection_issues(idx: usize, seg: &RouteSegment, issues: &mut Vec<ValidationIssue>) {
    let mut flag = |message: String| {
        issues.push(ValidationIssue::new(IssueKind::IncorrectConnection, Some(idx), message));
    };

    if seg.transport == TransportType::Airplane {
        for stop in [&seg.from, &seg.to] {
            if !stop.is_airport {
                flag(format!("flight touches {} which is not an airport", stop.id));
            }
        }
    }

    if matches!(seg.transport, TransportType::Airplane | TransportType::Train)
        && seg.from.city_id == seg.to.city_id
        && seg.from.id != seg.to.id
    {
        flag(format!("{} segment within {}", seg.transport, seg.from.city_id));
    }
}

fn segment_issues(
    idx: usize,
    seg: &RouteSegment,
    config: &ValidationConfig,
    issues: &mut Vec<ValidationIssue>,
) {
    let mut flag = |message: String| {
        issues.push(ValidationIssue::new(IssueKind::UnrealisticRoute, Some(idx), message));
    };

    let elapsed = (seg.arrival - seg.departure).num_minutes();
    if seg.arrival <= seg.departure {
        flag(format!("arrival {} is not after departure {}", seg.arrival, seg.departure));
    } else if elapsed != seg.duration_minutes {
        flag(format!(
            "duration of {} min disagrees with {} min between departure and arrival",
            seg.duration_minutes, elapsed
        ));
    }

    if !seg.distance_km.is_finite() || seg.distance_km <= 0.0 {
        flag(format!("distance {} km is not positive", seg.distance_km));
    }

    if seg.from.id == seg.to.id {
        flag(format!("starts and ends at {}", seg.from.id));
    }

    if elapsed > 0 && seg.distance_km.is_finite() {
        let speed = seg.distance_km / (elapsed as f64 / 60.0);
        let max = config.max_speed_kmh(seg.transport);
        if speed > max {
            flag(format!(
                "{} at {:.0} km/h exceeds {:.0} km/h",
                seg.transport, speed, max
            ));
        }
    }

    if seg.transport == TransportType::WinterRoad {
        let season = Season::of(seg.departure.date());
        if season != Season::Winter {
            flag(format!("winter road used in {season}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{at, segment, stop_ref};
    use crate::domain::TransportType::{Airplane, Bus, Train, WinterRoad};

    fn kinds(issues: &[ValidationIssue]) -> Vec<(IssueKind, Option<usize>)> {
        issues.iter().map(|i| (i.kind, i.segment_index)).collect()
    }

    fn check(segments: &[RouteSegment]) -> Vec<ValidationIssue> {
        structural_issues(segments, &ValidationConfig::default())
    }

    #[test]
    fn clean_route_has_no_issues() {
        let a = stop_ref("a", "ca", 62.0, 129.7, true);
        let b = stop_ref("b", "cb", 55.4, 37.9, true);
        let c = stop_ref("c", "cc", 55.7, 37.6, false);
        let route = vec![
            segment(Airplane, a, b.clone(), 4900.0, at(2, "08:00"), at(2, "15:00"), 24500.0),
            segment(Bus, b, c, 40.0, at(2, "16:00"), at(2, "17:00"), 80.0),
        ];
        assert!(check(&route).is_empty());
    }

    #[test]
    fn gap_between_segments() {
        let a = stop_ref("a", "ca", 60.0, 100.0, false);
        let b = stop_ref("b", "cb", 60.0, 101.0, false);
        let x = stop_ref("x", "cx", 60.0, 102.0, false);
        let c = stop_ref("c", "cc", 60.0, 103.0, false);
        let route = vec![
            segment(Bus, a, b, 60.0, at(2, "08:00"), at(2, "09:00"), 120.0),
            segment(Bus, x, c, 60.0, at(2, "10:00"), at(2, "11:00"), 120.0),
        ];
        assert_eq!(kinds(&check(&route)), vec![(IssueKind::EmptySpace, Some(0))]);
    }

    #[test]
    fn flight_from_bus_stop() {
        let a = stop_ref("a", "ca", 60.0, 100.0, false);
        let b = stop_ref("b", "cb", 60.0, 110.0, true);
        let route = vec![segment(Airplane, a, b, 560.0, at(2, "08:00"), at(2, "10:00"), 2800.0)];
        assert_eq!(kinds(&check(&route)), vec![(IssueKind::IncorrectConnection, Some(0))]);
    }

    #[test]
    fn train_within_one_city() {
        let a = stop_ref("a", "moscow", 55.77, 37.65, false);
        let b = stop_ref("b", "moscow", 55.74, 37.66, false);
        let route = vec![segment(Train, a, b, 5.0, at(2, "08:00"), at(2, "08:20"), 12.0)];
        assert_eq!(kinds(&check(&route)), vec![(IssueKind::IncorrectConnection, Some(0))]);
    }

    #[test]
    fn inconsistent_segment() {
        let a = stop_ref("a", "ca", 60.0, 100.0, false);
        let b = stop_ref("b", "cb", 60.0, 101.0, false);

        let backwards = segment(Bus, a.clone(), b.clone(), 60.0, at(2, "09:00"), at(2, "08:00"), 120.0);
        assert!(kinds(&check(&[backwards])).contains(&(IssueKind::UnrealisticRoute, Some(0))));

        let mut lying = segment(Bus, a.clone(), b.clone(), 60.0, at(2, "08:00"), at(2, "09:00"), 120.0);
        lying.duration_minutes = 30;
        assert_eq!(check(&[lying]).len(), 1);

        let zero = segment(Bus, a.clone(), b.clone(), 0.0, at(2, "08:00"), at(2, "09:00"), 0.0);
        assert_eq!(check(&[zero]).len(), 1);

        let looped = segment(Bus, a.clone(), a.clone(), 10.0, at(2, "08:00"), at(2, "09:00"), 20.0);
        assert_eq!(check(&[looped]).len(), 1);

        let rocket = segment(Bus, a, b, 600.0, at(2, "08:00"), at(2, "09:00"), 1200.0);
        let issues = check(&[rocket]);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("km/h"));
    }

    #[test]
    fn overlapping_segments() {
        let a = stop_ref("a", "ca", 60.0, 100.0, false);
        let b = stop_ref("b", "cb", 60.0, 101.0, false);
        let c = stop_ref("c", "cc", 60.0, 102.0, false);
        let route = vec![
            segment(Bus, a, b.clone(), 60.0, at(2, "08:00"), at(2, "10:00"), 120.0),
            segment(Bus, b, c, 60.0, at(2, "09:00"), at(2, "10:30"), 120.0),
        ];
        assert_eq!(kinds(&check(&route)), vec![(IssueKind::UnrealisticRoute, Some(1))]);
    }

    #[test]
    fn winter_road_in_june() {
        let a = stop_ref("a", "ca", 66.0, 130.0, false);
        let b = stop_ref("b", "cb", 67.0, 131.0, false);
        // June in the fixtures
        let route = vec![segment(WinterRoad, a, b, 150.0, at(2, "08:00"), at(2, "12:00"), 525.0)];
        let issues = check(&route);
        assert_eq!(kinds(&issues), vec![(IssueKind::UnrealisticRoute, Some(0))]);
        assert!(issues[0].message.contains("summer"));
    }
}
