use serde::{Deserialize, Serialize};

use crate::flag::ModifierFlag;

/// An index into a [`crate::dice_roll::DiceRoll`]'s internal die arena.
///
/// Informational only: it lets tooling trace a result back to the die that
/// produced it, but nothing in the evaluation pipeline requires it, and it never forms a cycle,
/// so it is excluded from serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiceId(pub usize);

/// The outcome of one sampled die face, plus whatever modifiers did to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollResult {
    /// The raw sampled integer, never changed after creation.
    #[serde(rename = "initialValue")]
    initial_value: f64,
    /// The display value; may be overwritten by min/max/re-roll/compound-explode.
    value: f64,
    /// The value contributed to totals; overwritten only by the target modifier, to -1/0/1.
    #[serde(rename = "calculationValue")]
    calculation_value: f64,
    /// Names of the modifiers that affected this roll, in the order they ran.
    modifiers: Vec<ModifierFlag>,
    /// Concatenated modifier glyphs, in the same order as `modifiers`.
    #[serde(rename = "modifierFlags")]
    modifier_flags: String,
    /// Whether this roll contributes to its container's total.
    #[serde(rename = "useInTotal")]
    use_in_total: bool,
    /// Informational back-reference to the die that produced this roll.
    #[serde(skip)]
    dice: Option<DiceId>,
    #[serde(rename = "type")]
    kind: ResultKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ResultKind {
    Result,
}

impl RollResult {
    /// Create a fresh result straight off the die: `value` and `calculation_value` default to
    /// `initial_value`, and it starts with no flags and `use_in_total = true`.
    pub fn new(initial_value: f64, dice: Option<DiceId>) -> Self {
        RollResult {
            initial_value,
            value: initial_value,
            calculation_value: initial_value,
            modifiers: Vec::new(),
            modifier_flags: String::new(),
            use_in_total: true,
            dice,
            kind: ResultKind::Result,
        }
    }

    /// The raw sampled integer.
    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }

    /// The current display value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Overwrite the display value (used by min/max/re-roll/compound-explode).
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    /// The value contributed to totals.
    pub fn calculation_value(&self) -> f64 {
        self.calculation_value
    }

    /// Overwrite the calculation value (used only by the target modifier).
    pub fn set_calculation_value(&mut self, value: f64) {
        self.calculation_value = value;
    }

    /// Whether this roll contributes to its container's total.
    pub fn use_in_total(&self) -> bool {
        self.use_in_total
    }

    /// Set whether this roll contributes to its container's total.
    pub fn set_use_in_total(&mut self, use_in_total: bool) {
        self.use_in_total = use_in_total;
    }

    /// The informational back-reference to the producing die.
    pub fn dice(&self) -> Option<DiceId> {
        self.dice
    }

    /// The flags attached so far, in the order they were added.
    pub fn modifiers(&self) -> &[ModifierFlag] {
        &self.modifiers
    }

    /// Attach a flag (idempotent: adding the same flag twice is a no-op).
    pub fn add_flag(&mut self, flag: ModifierFlag) {
        if !self.modifiers.contains(&flag) {
            self.modifiers.push(flag);
            self.modifier_flags = crate::flag::flags_glyph_string(&self.modifiers);
        }
    }

    /// Whether this result carries the given flag.
    pub fn has_flag(&self, flag: ModifierFlag) -> bool {
        self.modifiers.contains(&flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_result_defaults_value_and_calc_to_initial() {
        let r = RollResult::new(5.0, None);
        assert_eq!(r.value(), 5.0);
        assert_eq!(r.calculation_value(), 5.0);
        assert!(r.use_in_total());
        assert!(r.modifiers().is_empty());
    }

    #[test]
    fn add_flag_updates_glyph_string_and_is_idempotent() {
        let mut r = RollResult::new(6.0, None);
        r.add_flag(ModifierFlag::Explode);
        r.add_flag(ModifierFlag::Penetrate);
        r.add_flag(ModifierFlag::Explode);
        assert_eq!(r.modifiers(), &[ModifierFlag::Explode, ModifierFlag::Penetrate]);
        assert_eq!(r.modifier_flags, "!p");
    }
}
