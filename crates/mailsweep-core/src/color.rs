//! Flag colors and their keyword encoding.
//!
//! Colors are carried as a 3-bit value spread across the
//! `$MailFlagBit0..2` keywords, alongside `$flagged`. Seven of the
//! eight bit patterns name a color; pattern 7 is unassigned.

use std::collections::BTreeMap;
use std::str::FromStr;

use mailsweep_jmap::methods::email::Patch;

use crate::error::Error;

const BIT_KEYWORDS: [&str; 3] = ["$MailFlagBit0", "$MailFlagBit1", "$MailFlagBit2"];

/// A flag color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagColor {
    /// Bit pattern 0.
    Red,
    /// Bit pattern 1.
    Orange,
    /// Bit pattern 2.
    Yellow,
    /// Bit pattern 3.
    Green,
    /// Bit pattern 4.
    Blue,
    /// Bit pattern 5.
    Purple,
    /// Bit pattern 6.
    Gray,
}

impl FlagColor {
    /// All colors, in bit order.
    pub const ALL: [Self; 7] = [
        Self::Red,
        Self::Orange,
        Self::Yellow,
        Self::Green,
        Self::Blue,
        Self::Purple,
        Self::Gray,
    ];

    /// The 3-bit encoding of this color.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Red => 0,
            Self::Orange => 1,
            Self::Yellow => 2,
            Self::Green => 3,
            Self::Blue => 4,
            Self::Purple => 5,
            Self::Gray => 6,
        }
    }

    /// Decodes a 3-bit pattern. Pattern 7 and anything wider decode to
    /// `None`.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Red),
            1 => Some(Self::Orange),
            2 => Some(Self::Yellow),
            3 => Some(Self::Green),
            4 => Some(Self::Blue),
            5 => Some(Self::Purple),
            6 => Some(Self::Gray),
            _ => None,
        }
    }

    /// The lowercase color name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Gray => "gray",
        }
    }

    /// Reads the color encoded in an email's keywords, if any.
    #[must_use]
    pub fn from_keywords(keywords: &BTreeMap<String, bool>) -> Option<Self> {
        let mut bits = 0u8;
        for (i, keyword) in BIT_KEYWORDS.iter().enumerate() {
            if keywords.get(*keyword).copied().unwrap_or(false) {
                bits |= 1 << i;
            }
        }
        Self::from_bits(bits)
    }
}

impl FromStr for FlagColor {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "orange" => Ok(Self::Orange),
            "yellow" => Ok(Self::Yellow),
            "green" => Ok(Self::Green),
            "blue" => Ok(Self::Blue),
            "purple" => Ok(Self::Purple),
            "gray" | "grey" => Ok(Self::Gray),
            _ => Err(Error::InvalidColor(value.to_string())),
        }
    }
}

impl std::fmt::Display for FlagColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the patch that flags an email, optionally with a color.
///
/// With a color, every bit keyword is written explicitly (set or
/// cleared) so a previous color cannot bleed through. Without one,
/// only `$flagged` is touched.
#[must_use]
pub fn flag_patch(color: Option<FlagColor>) -> Patch {
    let mut patch = Patch::new().set("keywords/$flagged", true);
    if let Some(color) = color {
        let bits = color.bits();
        for (i, keyword) in BIT_KEYWORDS.iter().enumerate() {
            let path = format!("keywords/{keyword}");
            if bits & (1 << i) == 0 {
                patch = patch.clear(path);
            } else {
                patch = patch.set(path, true);
            }
        }
    }
    patch
}

/// Builds the patch that removes the flag and any color bits.
#[must_use]
pub fn unflag_patch() -> Patch {
    let mut patch = Patch::new().clear("keywords/$flagged");
    for keyword in BIT_KEYWORDS {
        patch = patch.clear(format!("keywords/{keyword}"));
    }
    patch
}
