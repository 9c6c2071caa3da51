use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{SSID_PREFIX, SSID_SUFFIX_LEN};

/// Surrogate profile identity. Row ids start at 1; absence is always
/// `Option<UserId>`, never a zero sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Surrogate beacon identity, assigned once at creation and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HotspotId(pub i64);

/// Mint an opaque credential: 32 hex chars drawn from the caller's RNG.
///
/// Used for both player session tokens and beacon administrator tokens.
/// Taking the RNG as a parameter keeps token streams reproducible under
/// a seeded generator in tests.
pub fn issue_token(rng: &mut impl Rng) -> String {
    Uuid::from_u128(rng.random::<u128>()).simple().to_string()
}

/// Derive the next advertised identifier from `seed`.
///
/// Each rotation feeds the current identifier through an FNV-1a mix, so
/// the sequence walks forward deterministically but cannot be walked
/// back from a sighted SSID. Uniqueness among live beacons is a soft
/// invariant; the store's unique index is the backstop.
pub fn derive_ssid(seed: &str) -> String {
    let mixed = fnv1a(&fnv1a(seed.as_bytes()).to_be_bytes());
    let hex = format!("{mixed:016x}");
    format!("{}{}", SSID_PREFIX, &hex[..SSID_SUFFIX_LEN])
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
