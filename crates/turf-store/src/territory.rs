use rand::Rng;

use turf_core::{CaptureDecision, Hotspot, HotspotDraft, Tunables, UserId, derive_ssid};

use crate::error::Result;
use crate::ledger::ScoreLedger;
use crate::store::Store;

/// The hotspot capture and territory engine.
///
/// Owns the beacon lifecycle: installation, identifier rotation, and
/// the capture transaction that moves points between the displaced
/// holder and the challenger. Decision rules live in `turf_core`; this
/// type wires them to the injected store.
pub struct TerritoryEngine<'a> {
    store: &'a Store,
    tunables: Tunables,
}

/// What a capture attempt came to. Rejection is a normal outcome the
/// caller relays to the client, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub accepted: bool,
}

impl<'a> TerritoryEngine<'a> {
    pub fn new(store: &'a Store, tunables: Tunables) -> Self {
        Self { store, tunables }
    }

    /// Install a new beacon. The record is minted backdated by one
    /// cooldown, so it is capturable immediately.
    pub fn create(&self, rng: &mut impl Rng, now: u64) -> Result<Hotspot> {
        let draft = HotspotDraft::mint(rng, now, &self.tunables);
        let id = self.store.insert_hotspot(&draft)?;
        tracing::info!("installed hotspot {} advertising {}", id.0, draft.ssid);
        Ok(Hotspot {
            id,
            token: draft.token,
            ssid: draft.ssid,
            last_capture_at: draft.last_capture_at,
            conqueror: None,
            revision: 0,
        })
    }

    /// Administrative refresh: advance the advertised identifier one
    /// step along its derivation chain. Independent of capture state.
    pub fn rotate(&self, hotspot: &Hotspot) -> Result<String> {
        let next = derive_ssid(&hotspot.ssid);
        self.store.update_ssid(hotspot.id, &next)?;
        tracing::info!("hotspot {} now advertising {next}", hotspot.id.0);
        Ok(next)
    }

    pub fn by_ssid(&self, ssid: &str) -> Result<Option<Hotspot>> {
        self.store.hotspot_by_ssid(ssid)
    }

    pub fn by_token(&self, token: &str) -> Result<Option<Hotspot>> {
        self.store.hotspot_by_token(token)
    }

    /// Run a capture attempt against the snapshot the caller read.
    ///
    /// On acceptance the displaced holder collects the tenure bonus and
    /// the challenger collects the flat award, both through the ledger.
    /// The revision-guarded swap is the serialization point: of two
    /// racing challengers exactly one lands, and the loser is reported
    /// as rejected; by the time it could retry, the winner's capture
    /// has restarted the cooldown anyway.
    pub fn capture(&self, hotspot: &Hotspot, challenger: UserId, now: u64) -> Result<CaptureOutcome> {
        let decision = hotspot.evaluate_capture(challenger, now, &self.tunables);
        let CaptureDecision::Accepted { defense_bonus } = decision else {
            tracing::debug!(
                "capture of {} by {} rejected: {decision:?}",
                hotspot.ssid,
                challenger.0
            );
            return Ok(CaptureOutcome { accepted: false });
        };

        if !self
            .store
            .apply_capture(hotspot.id, hotspot.revision, now, challenger)?
        {
            tracing::debug!("capture of {} by {} lost the swap", hotspot.ssid, challenger.0);
            return Ok(CaptureOutcome { accepted: false });
        }

        let ledger = ScoreLedger::new(self.store);
        if let Some(previous) = hotspot.conqueror {
            ledger.increase(previous, defense_bonus)?;
        }
        ledger.increase(challenger, self.tunables.conquer_points)?;

        tracing::info!("hotspot {} captured by {}", hotspot.ssid, challenger.0);
        Ok(CaptureOutcome { accepted: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    fn setup() -> (Store, Tunables) {
        (Store::open_in_memory().unwrap(), Tunables::default())
    }

    fn register(store: &Store, device: &str) -> UserId {
        store
            .create_account(device, &format!("token-{device}"), device, "FF4081")
            .unwrap()
    }

    #[test]
    fn test_create_persists_and_is_capturable() {
        let (store, tunables) = setup();
        let engine = TerritoryEngine::new(&store, tunables);
        let user = register(&store, "device-a");
        let now = 1_000_000;

        let hotspot = engine.create(&mut rng(), now).unwrap();
        assert_eq!(hotspot.last_capture_at, now - tunables.capture_cooldown_secs);
        assert_eq!(
            engine.by_token(&hotspot.token).unwrap().unwrap(),
            hotspot
        );

        let outcome = engine.capture(&hotspot, user, now).unwrap();
        assert!(outcome.accepted);
        assert_eq!(
            engine.by_ssid(&hotspot.ssid).unwrap().unwrap().conqueror,
            Some(user)
        );
    }

    #[test]
    fn test_rotate_advances_identifier() {
        let (store, tunables) = setup();
        let engine = TerritoryEngine::new(&store, tunables);

        let hotspot = engine.create(&mut rng(), 1_000).unwrap();
        let next = engine.rotate(&hotspot).unwrap();

        assert_eq!(next, derive_ssid(&hotspot.ssid));
        assert!(engine.by_ssid(&hotspot.ssid).unwrap().is_none());
        let rotated = engine.by_ssid(&next).unwrap().unwrap();
        assert_eq!(rotated.id, hotspot.id);
        // Rotation does not touch capture state.
        assert_eq!(rotated.last_capture_at, hotspot.last_capture_at);
        assert_eq!(rotated.conqueror, hotspot.conqueror);
    }

    #[test]
    fn test_rejection_leaves_state_untouched() {
        let (store, tunables) = setup();
        let engine = TerritoryEngine::new(&store, tunables);
        let ledger = ScoreLedger::new(&store);
        let a = register(&store, "device-a");
        let b = register(&store, "device-b");
        let now = 1_000_000;

        let hotspot = engine.create(&mut rng(), now).unwrap();
        assert!(engine.capture(&hotspot, a, now).unwrap().accepted);

        let held = engine.by_ssid(&hotspot.ssid).unwrap().unwrap();
        let score_b = ledger.total_of(b).unwrap();

        let outcome = engine.capture(&held, b, now + 1).unwrap();
        assert!(!outcome.accepted);

        let after = engine.by_ssid(&hotspot.ssid).unwrap().unwrap();
        assert_eq!(after, held, "rejected capture must not mutate the record");
        assert_eq!(ledger.total_of(b).unwrap(), score_b, "no points on rejection");
    }

    #[test]
    fn test_self_capture_rejected_even_after_cooldown() {
        let (store, tunables) = setup();
        let engine = TerritoryEngine::new(&store, tunables);
        let a = register(&store, "device-a");
        let now = 1_000_000;

        let hotspot = engine.create(&mut rng(), now).unwrap();
        assert!(engine.capture(&hotspot, a, now).unwrap().accepted);

        let held = engine.by_ssid(&hotspot.ssid).unwrap().unwrap();
        let much_later = now + 100 * tunables.capture_cooldown_secs;
        assert!(!engine.capture(&held, a, much_later).unwrap().accepted);
    }

    #[test]
    fn test_stale_snapshot_loses_the_race() {
        let (store, tunables) = setup();
        let engine = TerritoryEngine::new(&store, tunables);
        let ledger = ScoreLedger::new(&store);
        let a = register(&store, "device-a");
        let b = register(&store, "device-b");
        let now = 1_000_000;

        let hotspot = engine.create(&mut rng(), now).unwrap();

        // Both challengers read the same pre-capture snapshot.
        let snapshot_a = engine.by_ssid(&hotspot.ssid).unwrap().unwrap();
        let snapshot_b = snapshot_a.clone();

        assert!(engine.capture(&snapshot_a, a, now).unwrap().accepted);
        assert!(!engine.capture(&snapshot_b, b, now).unwrap().accepted);

        // Exactly one flat award was paid out.
        assert_eq!(ledger.total_of(a).unwrap(), tunables.conquer_points);
        assert_eq!(ledger.total_of(b).unwrap(), 0);
        assert_eq!(
            engine.by_ssid(&hotspot.ssid).unwrap().unwrap().conqueror,
            Some(a)
        );
    }

    /// The full tug-of-war: A takes a fresh beacon, B is locked out by
    /// the cooldown, then takes over at +181 s with exact point deltas.
    #[test]
    fn test_capture_scoring_end_to_end() {
        let (store, tunables) = setup();
        let engine = TerritoryEngine::new(&store, tunables);
        let ledger = ScoreLedger::new(&store);
        let a = register(&store, "device-a");
        let b = register(&store, "device-b");
        let c = register(&store, "device-c");
        let t0 = 1_000_000;

        let hotspot = engine.create(&mut rng(), t0).unwrap();
        assert!(engine.capture(&hotspot, a, t0).unwrap().accepted);
        // First capture of an unclaimed beacon pays nobody a tenure bonus.
        assert_eq!(ledger.total_of(a).unwrap(), tunables.conquer_points);

        let held = engine.by_ssid(&hotspot.ssid).unwrap().unwrap();
        assert!(!engine.capture(&held, b, t0).unwrap().accepted);

        let t1 = t0 + 181;
        let held = engine.by_ssid(&hotspot.ssid).unwrap().unwrap();
        assert!(engine.capture(&held, b, t1).unwrap().accepted);

        // A defended for 181 s: floor(181 / 60) = 3 on top of the flat award.
        assert_eq!(
            ledger.total_of(a).unwrap(),
            tunables.conquer_points + 181 / tunables.defense_scalar_secs
        );
        assert_eq!(ledger.total_of(b).unwrap(), tunables.conquer_points);
        // Bystanders are untouched.
        assert_eq!(ledger.total_of(c).unwrap(), 0);

        let after = engine.by_ssid(&hotspot.ssid).unwrap().unwrap();
        assert_eq!(after.conqueror, Some(b));
        assert_eq!(after.last_capture_at, t1);
    }

    #[test]
    fn test_custom_cooldown_respected() {
        let (store, _) = setup();
        let tunables = Tunables {
            capture_cooldown_secs: 10,
            ..Tunables::default()
        };
        let engine = TerritoryEngine::new(&store, tunables);
        let a = register(&store, "device-a");
        let b = register(&store, "device-b");
        let now = 1_000;

        let hotspot = engine.create(&mut rng(), now).unwrap();
        assert!(engine.capture(&hotspot, a, now).unwrap().accepted);

        let held = engine.by_ssid(&hotspot.ssid).unwrap().unwrap();
        assert!(!engine.capture(&held, b, now + 9).unwrap().accepted);
        assert!(engine.capture(&held, b, now + 10).unwrap().accepted);
    }
}
