//! City name suggestions.

use crate::domain::City;
use crate::repository::{RepositoryError, StopRepository};

/// Suggestions returned when the caller gives no limit.
pub const DEFAULT_LIMIT: usize = 10;

/// Largest limit honoured.
pub const MAX_LIMIT: usize = 50;

/// Cities whose name contains `query`, ignoring case.
///
/// Names starting with the query come first, then by name. `limit` is
/// clamped to `1..=MAX_LIMIT`. A blank query matches nothing.
pub fn autocomplete(
    stops: &dyn StopRepository,
    query: &str,
    limit: Option<usize>,
) -> Result<Vec<City>, RepositoryError> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(Vec::new());
    }
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let mut matches: Vec<(bool, String, City)> = stops
        .all_cities()?
        .into_iter()
        .filter_map(|city| {
            let name = city.name.to_lowercase();
            let pos = name.find(&needle)?;
            Some((pos != 0, name, city))
        })
        .collect();

    matches.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
    Ok(matches.into_iter().take(limit).map(|(_, _, c)| c).collect())
}
