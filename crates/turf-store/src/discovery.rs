use serde::Serialize;

use turf_core::{GeoPoint, PositionSample, Tunables, UserId, reduce_nearby};

use crate::error::Result;
use crate::store::Store;

/// The proximity discovery engine: ingests position reports and answers
/// "who is near me right now" with one entry per source.
pub struct DiscoveryEngine<'a> {
    store: &'a Store,
    tunables: Tunables,
}

/// A proximity match with the source resolved to its device identity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NearbyEntry {
    pub id: UserId,
    pub distance: f64,
    pub observed_at: u64,
    pub device: String,
}

impl<'a> DiscoveryEngine<'a> {
    pub fn new(store: &'a Store, tunables: Tunables) -> Self {
        Self { store, tunables }
    }

    /// Append one report stamped `now`. Coordinates are taken as given;
    /// nonsense values land in the log and match nobody.
    pub fn record_position(&self, user: UserId, point: GeoPoint, now: u64) -> Result<()> {
        self.store.append_position(&PositionSample {
            source: user,
            point,
            observed_at: now,
        })
    }

    /// Everyone within the distance threshold whose latest report is
    /// still inside the discovery window, excluding the requester.
    /// Entries come back in scan order; distance and timestamp ride
    /// along for client-side sorting.
    pub fn find_nearby(
        &self,
        requester: UserId,
        origin: GeoPoint,
        now: u64,
    ) -> Result<Vec<NearbyEntry>> {
        let cutoff = now.saturating_sub(self.tunables.discovery_window_secs);
        let samples = self.store.positions_since(cutoff)?;
        let candidates = reduce_nearby(&samples, requester, origin, now, &self.tunables);

        let mut entries = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            // A missing account row renders as an empty device string
            // rather than failing the whole scan.
            let device = self.store.device_of(candidate.source)?.unwrap_or_default();
            entries.push(NearbyEntry {
                id: candidate.source,
                distance: candidate.distance_km,
                observed_at: candidate.observed_at,
                device,
            });
        }
        Ok(entries)
    }

    /// Drop reports that have aged out of the discovery window.
    pub fn prune_stale(&self, now: u64) -> Result<usize> {
        self.store
            .prune_positions(now.saturating_sub(self.tunables.discovery_window_secs))
    }
}
