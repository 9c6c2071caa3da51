use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::{UNCLAIMED_COLOR, UNCLAIMED_NAME};

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{6}$").unwrap());

/// How a player is rendered on someone else's screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayIdentity {
    pub name: String,
    pub color: String,
}

impl DisplayIdentity {
    /// Placeholder identity for beacons nobody holds.
    pub fn unclaimed() -> Self {
        Self {
            name: UNCLAIMED_NAME.to_string(),
            color: UNCLAIMED_COLOR.to_string(),
        }
    }
}

/// Whether `code` is a 6-digit hex color, the only format clients render.
pub fn valid_color(code: &str) -> bool {
    HEX_COLOR.is_match(code)
}

/// Whether `name` works as a display name: non-blank, at most 32 chars.
pub fn valid_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed.chars().count() <= 32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_colors() {
        assert!(valid_color("FF4081"));
        assert!(valid_color("ff3400"));
        assert!(valid_color("012abc"));
    }

    #[test]
    fn test_invalid_colors() {
        assert!(!valid_color(""));
        assert!(!valid_color("FF40"));
        assert!(!valid_color("FF40811"));
        assert!(!valid_color("#FF4081"));
        assert!(!valid_color("GGGGGG"));
    }

    #[test]
    fn test_valid_names() {
        assert!(valid_name("ada"));
        assert!(valid_name("  padded  "));
        assert!(!valid_name(""));
        assert!(!valid_name("   "));
        assert!(!valid_name(&"x".repeat(33)));
    }

    #[test]
    fn test_unclaimed_identity() {
        let identity = DisplayIdentity::unclaimed();
        assert_eq!(identity.name, "Unknown");
        assert!(valid_color(&identity.color));
    }
}
