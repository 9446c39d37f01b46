//! Reference-data repositories: stops, cities and schedules.
//!
//! The planner reads through these traits. The in-memory implementations
//! back the CLI dataset loader and the tests.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::domain::{City, CityId, ScheduledLeg, Stop, StopId};

/// Errors from a repository backend.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Backend could not be reached
    #[error("repository unavailable: {0}")]
    Unavailable(String),

    /// Stored data failed validation
    #[error("corrupt {what}: {reason}")]
    Corrupt { what: String, reason: String },
}

/// Read access to stops and cities.
pub trait StopRepository: Send + Sync {
    fn all_real_stops(&self) -> Result<Vec<Stop>, RepositoryError>;

    fn all_virtual_stops(&self) -> Result<Vec<Stop>, RepositoryError>;

    fn find_real_stop(&self, id: &StopId) -> Result<Option<Stop>, RepositoryError>;

    fn find_virtual_stop(&self, id: &StopId) -> Result<Option<Stop>, RepositoryError>;

    fn all_cities(&self) -> Result<Vec<City>, RepositoryError>;

    /// All stops, real and virtual, in `city`.
    fn stops_in_city(&self, city: &CityId) -> Result<Vec<Stop>, RepositoryError>;

    /// A stop of either kind, real first.
    fn find_stop(&self, id: &StopId) -> Result<Option<Stop>, RepositoryError> {
        match self.find_real_stop(id)? {
            Some(stop) => Ok(Some(stop)),
            None => self.find_virtual_stop(id),
        }
    }

    fn find_city(&self, id: &CityId) -> Result<Option<City>, RepositoryError> {
        Ok(self.all_cities()?.into_iter().find(|c| &c.id == id))
    }
}

/// Read access to scheduled departures.
pub trait ScheduleRepository: Send + Sync {
    /// Legs from `from` to `to` that operate on `date`, by departure time.
    fn legs_between(
        &self,
        from: &StopId,
        to: &StopId,
        date: NaiveDate,
    ) -> Result<Vec<ScheduledLeg>, RepositoryError>;
}

/// Stops and cities held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStopRepository {
    stops: HashMap<StopId, Stop>,
    cities: BTreeMap<CityId, City>,
}

impl InMemoryStopRepository {
    pub fn new(stops: impl IntoIterator<Item = Stop>, cities: impl IntoIterator<Item = City>) -> Self {
        Self {
            stops: stops.into_iter().map(|s| (s.id.clone(), s)).collect(),
            cities: cities.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    fn sorted(&self, virtual_stops: bool) -> Vec<Stop> {
        let mut stops: Vec<Stop> = self
            .stops
            .values()
            .filter(|s| s.is_virtual() == virtual_stops)
            .cloned()
            .collect();
        stops.sort_by(|a, b| a.id.cmp(&b.id));
        stops
    }
}

impl StopRepository for InMemoryStopRepository {
    fn all_real_stops(&self) -> Result<Vec<Stop>, RepositoryError> {
        Ok(self.sorted(false))
    }

    fn all_virtual_stops(&self) -> Result<Vec<Stop>, RepositoryError> {
        Ok(self.sorted(true))
    }

    fn find_real_stop(&self, id: &StopId) -> Result<Option<Stop>, RepositoryError> {
        Ok(self.stops.get(id).filter(|s| !s.is_virtual()).cloned())
    }

    fn find_virtual_stop(&self, id: &StopId) -> Result<Option<Stop>, RepositoryError> {
        Ok(self.stops.get(id).filter(|s| s.is_virtual()).cloned())
    }

    fn all_cities(&self) -> Result<Vec<City>, RepositoryError> {
        Ok(self.cities.values().cloned().collect())
    }

    fn stops_in_city(&self, city: &CityId) -> Result<Vec<Stop>, RepositoryError> {
        let mut stops: Vec<Stop> = self
            .stops
            .values()
            .filter(|s| &s.city_id == city)
            .cloned()
            .collect();
        stops.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(stops)
    }

    fn find_city(&self, id: &CityId) -> Result<Option<City>, RepositoryError> {
        Ok(self.cities.get(id).cloned())
    }
}

/// Scheduled legs held in memory, grouped by stop pair.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScheduleRepository {
    legs: HashMap<(StopId, StopId), Vec<ScheduledLeg>>,
}

impl InMemoryScheduleRepository {
    pub fn new(legs: impl IntoIterator<Item = ScheduledLeg>) -> Self {
        let mut map: HashMap<(StopId, StopId), Vec<ScheduledLeg>> = HashMap::new();
        for leg in legs {
            map.entry((leg.from.clone(), leg.to.clone()))
                .or_default()
                .push(leg);
        }
        for legs in map.values_mut() {
            legs.sort_by_key(|l| l.departure);
        }
        Self { legs: map }
    }

    pub fn leg_count(&self) -> usize {
        self.legs.values().map(Vec::len).sum()
    }
}

impl ScheduleRepository for InMemoryScheduleRepository {
    fn legs_between(
        &self,
        from: &StopId,
        to: &StopId,
        date: NaiveDate,
    ) -> Result<Vec<ScheduledLeg>, RepositoryError> {
        let legs = self
            .legs
            .get(&(from.clone(), to.clone()))
            .map(|legs| legs.iter().filter(|l| l.runs_on(date)).cloned().collect())
            .unwrap_or_default();
        Ok(legs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinates, DaysOfWeek, RouteId};
    use chrono::NaiveTime;

    fn sid(s: &str) -> StopId {
        StopId::parse(s).unwrap()
    }

    fn cid(s: &str) -> CityId {
        CityId::parse(s).unwrap()
    }

    fn stop(id: &str, city: &str) -> Stop {
        Stop::new(sid(id), id.to_uppercase(), Coordinates::new(60.0, 100.0).unwrap(), cid(city))
    }

    fn repo() -> InMemoryStopRepository {
        InMemoryStopRepository::new(
            vec![
                stop("yks-air", "yakutsk").airport(),
                stop("yks-bus", "yakutsk"),
                stop("v-1", "yakutsk").virtual_stop(),
                stop("mow-air", "moscow").airport().hub(),
            ],
            vec![
                City::new(cid("yakutsk"), "Yakutsk"),
                City::new(cid("moscow"), "Moscow"),
            ],
        )
    }

    #[test]
    fn real_and_virtual_are_separate() {
        let repo = repo();
        assert_eq!(repo.all_real_stops().unwrap().len(), 3);
        assert_eq!(repo.all_virtual_stops().unwrap().len(), 1);

        assert!(repo.find_real_stop(&sid("v-1")).unwrap().is_none());
        assert!(repo.find_virtual_stop(&sid("v-1")).unwrap().is_some());
        assert!(repo.find_stop(&sid("v-1")).unwrap().is_some());
        assert!(repo.find_stop(&sid("mow-air")).unwrap().unwrap().is_hub);
        assert!(repo.find_stop(&sid("nope")).unwrap().is_none());
    }

    #[test]
    fn stops_in_city_sorted() {
        let repo = repo();
        let ids: Vec<String> = repo
            .stops_in_city(&cid("yakutsk"))
            .unwrap()
            .into_iter()
            .map(|s| s.id.to_string())
            .collect();
        assert_eq!(ids, vec!["v-1", "yks-air", "yks-bus"]);
        assert!(repo.stops_in_city(&cid("atlantis")).unwrap().is_empty());
    }

    #[test]
    fn cities() {
        let repo = repo();
        assert_eq!(repo.all_cities().unwrap().len(), 2);
        assert_eq!(repo.find_city(&cid("moscow")).unwrap().unwrap().name, "Moscow");
    }

    #[test]
    fn legs_filtered_by_weekday() {
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let leg = |dep, days: &str| ScheduledLeg {
            route_id: RouteId::parse("R1").unwrap(),
            from: sid("a"),
            to: sid("b"),
            departure: t(dep),
            arrival: t(dep + 1),
            arrival_day_offset: 0,
            days: DaysOfWeek::parse(days).unwrap(),
            fare: None,
            capacity: 100,
        };
        let repo = InMemoryScheduleRepository::new(vec![leg(14, "1234567"), leg(8, "1"), leg(10, "2")]);
        assert_eq!(repo.leg_count(), 3);

        // 2025-06-02 is a Monday.
        let monday = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let legs = repo.legs_between(&sid("a"), &sid("b"), monday).unwrap();
        let deps: Vec<_> = legs.iter().map(|l| l.departure).collect();
        assert_eq!(deps, vec![t(8), t(14)]);

        assert!(repo.legs_between(&sid("b"), &sid("a"), monday).unwrap().is_empty());
    }
}
