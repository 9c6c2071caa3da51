use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::ident::UserId;
use crate::tunables::Tunables;

/// One GPS report. Append-only; samples age out of queries once they
/// fall off the discovery window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub source: UserId,
    pub point: GeoPoint,
    pub observed_at: u64,
}

/// A proximity match before identity resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearbyCandidate {
    pub source: UserId,
    pub distance_km: f64,
    pub observed_at: u64,
}

/// Reduce a recency-ordered position scan to proximity matches.
///
/// `samples` must be sorted most-recent-first. That makes the dedup a
/// single pass with a seen-set: the first sample encountered per source
/// is that source's latest, and every older duplicate is dropped.
/// The requester's own reports are skipped, anything at or past the
/// window edge is skipped, and a match requires a distance strictly
/// below `max_distance_km`. Output order is scan order; callers sort
/// client-side on the reported distance or timestamp if they care.
pub fn reduce_nearby(
    samples: &[PositionSample],
    requester: UserId,
    origin: GeoPoint,
    now: u64,
    tunables: &Tunables,
) -> Vec<NearbyCandidate> {
    let cutoff = now.saturating_sub(tunables.discovery_window_secs);
    let mut seen = HashSet::new();
    let mut matches = Vec::new();

    for sample in samples {
        if sample.source == requester || sample.observed_at <= cutoff {
            continue;
        }
        if !seen.insert(sample.source) {
            continue;
        }
        let distance_km = origin.great_circle_km(sample.point);
        if distance_km < tunables.max_distance_km {
            matches.push(NearbyCandidate {
                source: sample.source,
                distance_km,
                observed_at: sample.observed_at,
            });
        }
    }

    matches
}
