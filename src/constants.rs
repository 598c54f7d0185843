/// Endpoint and environment constants shared across the codebase.
/// Values here are defaults; `config.toml` and the environment override them.

// Default service endpoints
pub const OVERPASS_DEFAULT_URL: &str = "https://overpass-api.de/api/interpreter";
pub const ORS_DEFAULT_URL: &str = "https://api.openrouteservice.org/v2/isochrones/driving-car";

// Source names used in logs, metrics and FetchFailure errors
pub const OVERPASS_SOURCE: &str = "overpass";
pub const ORS_SOURCE: &str = "openrouteservice";

// Environment variables (names kept compatible with existing .env files)
pub const ENV_OUTLET_DATA: &str = "OUTLET_DATA";
pub const ENV_ORS_API_KEY: &str = "ORS_API_KEY";
pub const ENV_ORS_URL: &str = "ORS_URL";
pub const ENV_OVERPASS_URL: &str = "OVERPASS_URL";
pub const ENV_CACHE: &str = "COVERAGE_CACHE";

pub const DEFAULT_OUTLET_DATA: &str = "./data/outlets.csv";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// The routing API rejects large location lists, so coordinates go out in groups of five.
pub const DEFAULT_ISOCHRONE_BATCH_SIZE: usize = 5;

/// Attributes requested for every isochrone polygon
pub const DEFAULT_ISOCHRONE_ATTRIBUTES: [&str; 3] = ["area", "reachfactor", "total_pop"];

/// Tag keys the map-data query asks for, in query order
pub const DEFAULT_TAG_FILTERS: [&str; 16] = [
    "shop",
    "amenity",
    "tourism",
    "office",
    "craft",
    "industrial",
    "leisure",
    "man_made",
    "building",
    "public_transport",
    "historic",
    "landuse",
    "natural",
    "waterway",
    "power",
    "telecom",
];

/// Tag keys used, in priority order, to describe an unnamed node
pub const DESCRIPTIVE_NAME_KEYS: [&str; 6] = ["shop", "amenity", "tourism", "office", "craft", "leisure"];

/// A display name containing this marker was synthesized from tags rather than
/// taken from the map data, and is left out of listings.
pub const SYNTHESIZED_NAME_MARKER: char = ':';
