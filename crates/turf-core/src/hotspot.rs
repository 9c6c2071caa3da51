use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ident::{HotspotId, UserId, derive_ssid, issue_token};
use crate::tunables::Tunables;

/// One physical beacon and its capture state.
///
/// Lifecycle: minted once by an administrator, identifier rotated by the
/// refresh operation, ownership rewritten by accepted captures. Never
/// deleted in normal operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub id: HotspotId,
    /// Immutable credential held by the beacon's administrator.
    pub token: String,
    /// Currently advertised identifier; replaced on every refresh.
    pub ssid: String,
    /// Unix seconds of the most recent accepted capture.
    pub last_capture_at: u64,
    /// Current holder, if any.
    pub conqueror: Option<UserId>,
    /// Bumped on every mutation; guards the capture read-modify-write.
    pub revision: i64,
}

/// A freshly minted beacon, before the store has assigned its row id.
#[derive(Clone, Debug, PartialEq)]
pub struct HotspotDraft {
    pub token: String,
    pub ssid: String,
    pub last_capture_at: u64,
}

impl HotspotDraft {
    /// Mint a new beacon record at `now`.
    ///
    /// `last_capture_at` is backdated by one full cooldown so the beacon
    /// is capturable the moment it is installed.
    pub fn mint(rng: &mut impl Rng, now: u64, tunables: &Tunables) -> Self {
        let token = issue_token(rng);
        let ssid = derive_ssid(&token);
        Self {
            token,
            ssid,
            last_capture_at: now.saturating_sub(tunables.capture_cooldown_secs),
        }
    }
}

/// Outcome of judging a capture attempt. Rejections are normal results,
/// not errors; the beacon's state is untouched either way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureDecision {
    /// The beacon is still cooling down from its previous capture.
    CoolingDown,
    /// The challenger already holds this beacon.
    AlreadyHeld,
    /// Capture goes through. `defense_bonus` is owed to the displaced
    /// holder, when there is one.
    Accepted { defense_bonus: u64 },
}

impl CaptureDecision {
    pub fn accepted(&self) -> bool {
        matches!(self, CaptureDecision::Accepted { .. })
    }
}

impl Hotspot {
    /// Judge a capture attempt at `now` without touching any state.
    ///
    /// Rejects while the cooldown runs, and always rejects the current
    /// holder: re-capturing your own beacon is not a points faucet. The
    /// defense bonus scales with how long the displaced holder kept the
    /// beacon, one point per `defense_scalar_secs` of tenure.
    pub fn evaluate_capture(
        &self,
        challenger: UserId,
        now: u64,
        tunables: &Tunables,
    ) -> CaptureDecision {
        let elapsed = now.saturating_sub(self.last_capture_at);
        if elapsed < tunables.capture_cooldown_secs {
            return CaptureDecision::CoolingDown;
        }
        if self.conqueror == Some(challenger) {
            return CaptureDecision::AlreadyHeld;
        }
        CaptureDecision::Accepted {
            defense_bonus: elapsed.checked_div(tunables.defense_scalar_secs).unwrap_or(0),
        }
    }
}
