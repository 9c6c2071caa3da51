/// Seconds a hotspot stays locked after an accepted capture.
pub const CAPTURE_COOLDOWN_SECS: u64 = 180;

/// Flat points paid to a challenger on an accepted capture.
pub const CONQUER_POINTS: u64 = 10;

/// Seconds of tenure per point paid to a displaced holder.
pub const DEFENSE_SCALAR_SECS: u64 = 60;

/// Trailing seconds within which a position sample counts as current.
pub const DISCOVERY_WINDOW_SECS: u64 = 60;

/// Proximity match threshold in kilometers (strict less-than).
pub const MAX_DISTANCE_KM: f64 = 0.1;

/// Mean Earth radius in kilometers, for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Prefix carried by every advertised beacon identifier.
pub const SSID_PREFIX: &str = "turf-";

/// Hex digits of derived suffix appended to the prefix.
pub const SSID_SUFFIX_LEN: usize = 12;

/// Display name rendered for a beacon nobody holds.
pub const UNCLAIMED_NAME: &str = "Unknown";

/// Display color rendered for a beacon nobody holds.
pub const UNCLAIMED_COLOR: &str = "FF3400";

/// Color assigned to freshly registered profiles.
pub const DEFAULT_PROFILE_COLOR: &str = "FF4081";
