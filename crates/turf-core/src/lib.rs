//! Territory capture and proximity discovery rules.
//!
//! Pure decision logic for the turf service: who may capture a beacon
//! and when, what an accepted capture pays out, which position reports
//! count as "nearby", and how advertised beacon identifiers rotate.
//!
//! Zero I/O, no opinions about transport or persistence. The store
//! layer hands state in, these functions hand decisions back.

pub mod constants;
pub mod geo;
pub mod hotspot;
pub mod ident;
pub mod presence;
pub mod profile;
pub mod time;
pub mod tunables;

pub use geo::GeoPoint;
pub use hotspot::{CaptureDecision, Hotspot, HotspotDraft};
pub use ident::{HotspotId, UserId, derive_ssid, issue_token};
pub use presence::{NearbyCandidate, PositionSample, reduce_nearby};
pub use profile::{DisplayIdentity, valid_color, valid_name};
pub use time::{now_unix_secs, unix_to_iso8601};
pub use tunables::Tunables;
