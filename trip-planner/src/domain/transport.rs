//! Transport modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown transport type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transport type: {0}")]
pub struct UnknownTransportType(String);

/// Mode of a graph edge or route segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    Airplane,
    Train,
    Bus,
    Ferry,
    WinterRoad,
    Taxi,
}

impl TransportType {
    /// All transport types, in declaration order.
    pub const ALL: [TransportType; 6] = [
        TransportType::Airplane,
        TransportType::Train,
        TransportType::Bus,
        TransportType::Ferry,
        TransportType::WinterRoad,
        TransportType::Taxi,
    ];

    /// Snake-case name, as used in serialized data.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportType::Airplane => "airplane",
            TransportType::Train => "train",
            TransportType::Bus => "bus",
            TransportType::Ferry => "ferry",
            TransportType::WinterRoad => "winter_road",
            TransportType::Taxi => "taxi",
        }
    }

    /// Whether the real path follows terrain (roads, waterways, ice roads)
    /// and so should never be perfectly straight.
    pub fn is_terrain_following(&self) -> bool {
        matches!(
            self,
            TransportType::Bus
                | TransportType::Taxi
                | TransportType::Ferry
                | TransportType::WinterRoad
        )
    }

    /// Whether passengers typically need a taxi to reach the terminal.
    pub fn needs_terminal_taxi(&self) -> bool {
        matches!(self, TransportType::Airplane | TransportType::Train)
    }

    fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportType {
    type Err = UnknownTransportType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        TransportType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or(UnknownTransportType(s.to_string()))
    }
}

/// A set of allowed transport types, stored as a bitmask.
///
/// # Examples
///
/// ```
/// use trip_planner::domain::{ModeFilter, TransportType};
///
/// let rail = ModeFilter::only(&[TransportType::Train]);
/// assert!(rail.allows(TransportType::Train));
/// assert!(!rail.allows(TransportType::Bus));
/// assert!(ModeFilter::all().allows(TransportType::Ferry));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModeFilter(u8);

impl ModeFilter {
    /// Allow every transport type.
    pub fn all() -> Self {
        ModeFilter(TransportType::ALL.iter().fold(0, |acc, t| acc | t.bit()))
    }

    /// Allow only the given types. An empty slice allows everything.
    pub fn only(types: &[TransportType]) -> Self {
        if types.is_empty() {
            return Self::all();
        }
        ModeFilter(types.iter().fold(0, |acc, t| acc | t.bit()))
    }

    /// Whether `t` is allowed.
    pub fn allows(&self, t: TransportType) -> bool {
        self.0 & t.bit() != 0
    }

    /// Whether every type is allowed.
    pub fn is_all(&self) -> bool {
        *self == Self::all()
    }

    /// Whether exactly the rail mode is allowed.
    pub fn is_rail_only(&self) -> bool {
        *self == Self::only(&[TransportType::Train])
    }

    /// Allowed types in declaration order.
    pub fn types(&self) -> Vec<TransportType> {
        TransportType::ALL
            .into_iter()
            .filter(|t| self.allows(*t))
            .collect()
    }
}

impl Default for ModeFilter {
    fn default() -> Self {
        Self::all()
    }
}
