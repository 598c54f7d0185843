use sha2::{Digest, Sha256};

use crate::types::{Coordinate, TagFilters};

/// Hex SHA-256 of the `|`-joined parts
pub fn compute_key(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(parts.join("|").as_bytes());
    hex::encode(hasher.finalize())
}

/// Key for a map-data query: same endpoint, center, radius and filters give the same key
pub fn poi_query_key(endpoint: &str, center: Coordinate, radius_m: f64, filters: &TagFilters) -> String {
    let radius = format!("{:.1}", radius_m);
    let filters = filters.keys().join(",");
    compute_key(&[endpoint, &center.key(), &radius, &filters])
}

/// Key for an isochrone request over an ordered list of locations
pub fn isochrone_key(endpoint: &str, locations: &[Coordinate], max_distance_km: f64) -> String {
    let locations = locations.iter().map(Coordinate::key).collect::<Vec<_>>().join(";");
    let distance = format!("{:.3}", max_distance_km);
    compute_key(&[endpoint, &locations, &distance])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_stable_hex() {
        let a = compute_key(&["a", "b"]);
        assert_eq!(a, compute_key(&["a", "b"]));
        assert_eq!(a.len(), 64);
        assert_ne!(a, compute_key(&["ab", ""]));
    }

    #[test]
    fn test_poi_key_depends_on_every_input() {
        let center = Coordinate::new(-6.2, 106.8);
        let filters = TagFilters::default();
        let base = poi_query_key("u", center, 1000.0, &filters);
        assert_eq!(base, poi_query_key("u", center, 1000.0, &filters));
        assert_ne!(base, poi_query_key("u", center, 2000.0, &filters));
        assert_ne!(base, poi_query_key("u", Coordinate::new(-6.3, 106.8), 1000.0, &filters));
        assert_ne!(base, poi_query_key("u", center, 1000.0, &TagFilters::new(["shop"])));
    }

    #[test]
    fn test_isochrone_key_is_order_sensitive() {
        let a = Coordinate::new(1.0, 2.0);
        let b = Coordinate::new(3.0, 4.0);
        assert_ne!(isochrone_key("u", &[a, b], 5.0), isochrone_key("u", &[b, a], 5.0));
    }
}
