//! Modifier flag names and their serialization glyphs.
//!
//! Flags are attached to results as plain names — results never back-reference the modifier
//! that produced them, only its name as a string flag — so this lives below both `results` and
//! `modifiers` rather than inside either.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The name of a modifier that affected a roll, used both as the `modifiers` string and to look
/// up a glyph for `modifierFlags`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModifierFlag {
    /// `min`
    Min,
    /// `max`
    Max,
    /// `explode`
    Explode,
    /// `compound`
    Compound,
    /// `penetrate`
    Penetrate,
    /// `re-roll`
    ReRoll,
    /// `re-roll-once`
    ReRollOnce,
    /// `unique`
    Unique,
    /// `unique-once`
    UniqueOnce,
    /// `drop`
    Drop,
    /// `target-success`
    TargetSuccess,
    /// `target-failure`
    TargetFailure,
    /// `critical-success`
    CriticalSuccess,
    /// `critical-failure`
    CriticalFailure,
}

impl ModifierFlag {
    /// The name string as used in the `modifiers` array.
    pub fn name(self) -> &'static str {
        match self {
            ModifierFlag::Min => "min",
            ModifierFlag::Max => "max",
            ModifierFlag::Explode => "explode",
            ModifierFlag::Compound => "compound",
            ModifierFlag::Penetrate => "penetrate",
            ModifierFlag::ReRoll => "re-roll",
            ModifierFlag::ReRollOnce => "re-roll-once",
            ModifierFlag::Unique => "unique",
            ModifierFlag::UniqueOnce => "unique-once",
            ModifierFlag::Drop => "drop",
            ModifierFlag::TargetSuccess => "target-success",
            ModifierFlag::TargetFailure => "target-failure",
            ModifierFlag::CriticalSuccess => "critical-success",
            ModifierFlag::CriticalFailure => "critical-failure",
        }
    }

    /// The glyph used in the concatenated `modifierFlags` string.
    pub fn glyph(self) -> &'static str {
        match self {
            ModifierFlag::Min => "^",
            ModifierFlag::Max => "v",
            ModifierFlag::Explode => "!",
            ModifierFlag::Compound => "!",
            ModifierFlag::Penetrate => "p",
            ModifierFlag::ReRoll => "r",
            ModifierFlag::ReRollOnce => "ro",
            ModifierFlag::Unique => "u",
            ModifierFlag::UniqueOnce => "uo",
            ModifierFlag::Drop => "d",
            ModifierFlag::TargetSuccess => "*",
            ModifierFlag::TargetFailure => "_",
            ModifierFlag::CriticalSuccess => "**",
            ModifierFlag::CriticalFailure => "__",
        }
    }
}

impl Display for ModifierFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Concatenate the glyphs of `flags`, in iteration order.
pub fn flags_glyph_string(flags: &[ModifierFlag]) -> String {
    flags.iter().map(|f| f.glyph()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyphs_match_known_flag_set() {
        assert_eq!(ModifierFlag::Compound.glyph(), "!");
        assert_eq!(ModifierFlag::Explode.glyph(), "!");
        assert_eq!(ModifierFlag::CriticalFailure.glyph(), "__");
        assert_eq!(ModifierFlag::CriticalSuccess.glyph(), "**");
        assert_eq!(ModifierFlag::Drop.glyph(), "d");
        assert_eq!(ModifierFlag::Max.glyph(), "v");
        assert_eq!(ModifierFlag::Min.glyph(), "^");
        assert_eq!(ModifierFlag::Penetrate.glyph(), "p");
        assert_eq!(ModifierFlag::ReRoll.glyph(), "r");
        assert_eq!(ModifierFlag::ReRollOnce.glyph(), "ro");
        assert_eq!(ModifierFlag::TargetFailure.glyph(), "_");
        assert_eq!(ModifierFlag::TargetSuccess.glyph(), "*");
        assert_eq!(ModifierFlag::Unique.glyph(), "u");
        assert_eq!(ModifierFlag::UniqueOnce.glyph(), "uo");
    }

    #[test]
    fn concatenates_in_order() {
        let flags = [ModifierFlag::Explode, ModifierFlag::Penetrate];
        assert_eq!(flags_glyph_string(&flags), "!p");
    }
}
