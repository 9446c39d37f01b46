//! Identifier types for stops, cities and routes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum accepted identifier length in bytes.
const MAX_ID_LEN: usize = 64;

/// Error returned when parsing an invalid identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} identifier: {reason}")]
pub struct InvalidId {
    kind: &'static str,
    reason: &'static str,
}

fn check_id(kind: &'static str, s: &str) -> Result<String, InvalidId> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err(InvalidId {
            kind,
            reason: "must not be empty",
        });
    }

    if trimmed.len() > MAX_ID_LEN {
        return Err(InvalidId {
            kind,
            reason: "must be at most 64 bytes",
        });
    }

    if trimmed.chars().any(|c| c.is_control() || c == ':') {
        return Err(InvalidId {
            kind,
            reason: "must not contain control characters or ':'",
        });
    }

    Ok(trimmed.to_string())
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an identifier, trimming surrounding whitespace.
            pub fn parse(s: &str) -> Result<Self, InvalidId> {
                check_id($kind, s).map(Self)
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = InvalidId;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a real or virtual stop (airport, station, pier, ...).
    ///
    /// # Examples
    ///
    /// ```
    /// use trip_planner::domain::StopId;
    ///
    /// let yks = StopId::parse(" yks-airport ").unwrap();
    /// assert_eq!(yks.as_str(), "yks-airport");
    ///
    /// assert!(StopId::parse("").is_err());
    /// assert!(StopId::parse("a:b").is_err());
    /// ```
    StopId,
    "stop"
);

id_type!(
    /// Identifier of a city.
    CityId,
    "city"
);

id_type!(
    /// Identifier of a carrier route (flight number, train number, ...).
    RouteId,
    "route"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_whitespace() {
        let id = StopId::parse("  svo  ").unwrap();
        assert_eq!(id.as_str(), "svo");
    }

    #[test]
    fn reject_empty() {
        assert!(StopId::parse("").is_err());
        assert!(CityId::parse("   ").is_err());
    }

    #[test]
    fn reject_separator_and_control() {
        assert!(RouteId::parse("SU:1").is_err());
        assert!(RouteId::parse("SU\n1").is_err());
    }

    #[test]
    fn reject_too_long() {
        let long = "x".repeat(65);
        assert!(CityId::parse(&long).is_err());
        assert!(CityId::parse(&"x".repeat(64)).is_ok());
    }

    #[test]
    fn error_names_kind() {
        let err = CityId::parse("").unwrap_err();
        assert_eq!(err.to_string(), "invalid city identifier: must not be empty");
    }

    #[test]
    fn debug_and_display() {
        let id = CityId::parse("yakutsk").unwrap();
        assert_eq!(format!("{id}"), "yakutsk");
        assert_eq!(format!("{id:?}"), "CityId(yakutsk)");
    }

    #[test]
    fn serde_rejects_invalid() {
        let ok: StopId = serde_json::from_str("\"dme\"").unwrap();
        assert_eq!(ok.as_str(), "dme");
        assert!(serde_json::from_str::<StopId>("\"\"").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Roundtrip: parse then as_str returns the original
        #[test]
        fn roundtrip(s in "[a-z0-9_-]{1,64}") {
            let id = StopId::parse(&s).unwrap();
            prop_assert_eq!(id.as_str(), s.as_str());
        }

        /// Strings containing ':' are always rejected
        #[test]
        fn colon_rejected(a in "[a-z]{1,10}", b in "[a-z]{1,10}") {
            let joined = format!("{}:{}", a, b);
            prop_assert!(RouteId::parse(&joined).is_err());
        }
    }
}
