use serde::{Deserialize, Serialize};

use crate::constants::{
    CAPTURE_COOLDOWN_SECS, CONQUER_POINTS, DEFENSE_SCALAR_SECS, DISCOVERY_WINDOW_SECS,
    MAX_DISTANCE_KM,
};

/// Gameplay constants operators may override at runtime.
///
/// The discovery window and the distance threshold have varied between
/// deployments, so both ride along as values instead of being baked into
/// the engines.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Seconds a hotspot stays locked after an accepted capture.
    pub capture_cooldown_secs: u64,
    /// Flat points paid to a challenger on an accepted capture.
    pub conquer_points: u64,
    /// Seconds of tenure per point paid to a displaced holder.
    pub defense_scalar_secs: u64,
    /// Trailing seconds within which a position sample counts as current.
    pub discovery_window_secs: u64,
    /// Proximity match threshold in kilometers, exclusive.
    pub max_distance_km: f64,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            capture_cooldown_secs: CAPTURE_COOLDOWN_SECS,
            conquer_points: CONQUER_POINTS,
            defense_scalar_secs: DEFENSE_SCALAR_SECS,
            discovery_window_secs: DISCOVERY_WINDOW_SECS,
            max_distance_km: MAX_DISTANCE_KM,
        }
    }
}
