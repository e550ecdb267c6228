/// User agent string for HTTP requests
pub const USER_AGENT: &str = "mcp-disaster-map/0.1.0";

/// National Weather Service API base URL
pub const NWS_API_BASE: &str = "https://api.weather.gov";

/// USGS earthquake GeoJSON summary feed base URL
pub const USGS_FEED_BASE: &str = "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary";

/// Continental-US center, used when a location string matches nothing
pub const DEFAULT_CENTER: (f64, f64) = (-98.5795, 39.8283);

/// Damage-model score given to records with no recorded impact
pub const MIN_SEVERITY_SCORE: f64 = 10.0;

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "DISASTER_MAP_CONFIG";
