//! Stops and cities: immutable reference data.

use serde::{Deserialize, Serialize};

use super::{CityId, Coordinates, StopId};

/// Whether a stop physically exists or was synthesized to connect the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    #[default]
    Real,
    Virtual,
}

/// A boarding point: airport, railway station, bus station, pier, ...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub coordinates: Coordinates,
    pub city_id: CityId,
    #[serde(default)]
    pub kind: StopKind,
    #[serde(default)]
    pub is_airport: bool,
    #[serde(default)]
    pub is_hub: bool,
}

impl Stop {
    /// Create a real, non-airport, non-hub stop.
    pub fn new(id: StopId, name: impl Into<String>, coordinates: Coordinates, city_id: CityId) -> Self {
        Self {
            id,
            name: name.into(),
            coordinates,
            city_id,
            kind: StopKind::Real,
            is_airport: false,
            is_hub: false,
        }
    }

    /// Mark this stop as an airport.
    pub fn airport(mut self) -> Self {
        self.is_airport = true;
        self
    }

    /// Mark this stop as a hub.
    pub fn hub(mut self) -> Self {
        self.is_hub = true;
        self
    }

    /// Mark this stop as virtual.
    pub fn virtual_stop(mut self) -> Self {
        self.kind = StopKind::Virtual;
        self
    }

    pub fn is_virtual(&self) -> bool {
        self.kind == StopKind::Virtual
    }
}

/// A city that groups one or more stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: CityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl City {
    pub fn new(id: CityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            region: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}
