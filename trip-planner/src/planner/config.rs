//! Search configuration for the route planner.

use chrono::Duration;

/// Configuration parameters for route search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Transfers allowed when the request doesn't say.
    pub max_transfers: usize,

    /// An airport with fewer distinct neighbours than this is "small"
    /// and triggers hub routing.
    pub small_airport_threshold: usize,

    /// Maximum number of hubs inserted into one path.
    pub max_hubs: usize,

    /// Hubs tried per hub search, best ranked first.
    pub hub_candidates: usize,

    /// Minimum time required for a connection (minutes).
    pub min_connection_mins: i64,

    /// How many days past the ready date a schedule may roll over.
    pub max_rollover_days: u32,

    /// Cost added on the rail network whenever the train changes (minutes).
    pub rail_transfer_penalty_mins: u32,
}

impl SearchConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        max_transfers: usize,
        small_airport_threshold: usize,
        max_hubs: usize,
        min_connection_mins: i64,
        max_rollover_days: u32,
        rail_transfer_penalty_mins: u32,
    ) -> Self {
        Self {
            max_transfers,
            small_airport_threshold,
            max_hubs,
            min_connection_mins,
            max_rollover_days,
            rail_transfer_penalty_mins,
            ..Self::default()
        }
    }

    pub fn with_max_transfers(mut self, n: usize) -> Self {
        self.max_transfers = n;
        self
    }

    pub fn with_max_hubs(mut self, n: usize) -> Self {
        self.max_hubs = n;
        self
    }

    pub fn with_min_connection_mins(mut self, mins: i64) -> Self {
        self.min_connection_mins = mins;
        self
    }

    pub fn with_rail_transfer_penalty_mins(mut self, mins: u32) -> Self {
        self.rail_transfer_penalty_mins = mins;
        self
    }

    /// Returns the minimum connection time as a Duration.
    pub fn min_connection(&self) -> Duration {
        Duration::minutes(self.min_connection_mins)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_transfers: 3,
            small_airport_threshold: 3,
            max_hubs: 2,
            hub_candidates: 8,
            min_connection_mins: 60,
            max_rollover_days: 2,
            rail_transfer_penalty_mins: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SearchConfig::default();

        assert_eq!(config.max_transfers, 3);
        assert_eq!(config.small_airport_threshold, 3);
        assert_eq!(config.max_hubs, 2);
        assert_eq!(config.hub_candidates, 8);
        assert_eq!(config.min_connection_mins, 60);
        assert_eq!(config.max_rollover_days, 2);
        assert_eq!(config.rail_transfer_penalty_mins, 30);
        assert_eq!(config.min_connection(), Duration::minutes(60));
    }

    #[test]
    fn custom_config() {
        let config = SearchConfig::new(2, 4, 1, 45, 1, 20).with_max_hubs(3);

        assert_eq!(config.max_transfers, 2);
        assert_eq!(config.small_airport_threshold, 4);
        assert_eq!(config.max_hubs, 3);
        assert_eq!(config.min_connection_mins, 45);
        assert_eq!(config.max_rollover_days, 1);
        assert_eq!(config.rail_transfer_penalty_mins, 20);
    }
}
