use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use super::roll_result::RollResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ResultsKind {
    RollResults,
}

/// An ordered sequence of [`RollResult`]s produced by a single die.
///
/// `value` is `Σ calculation_value where use_in_total`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollResults {
    rolls: Vec<RollResult>,
    value: f64,
    #[serde(rename = "type")]
    kind: ResultsKind,
}

impl RollResults {
    /// Build from a vector of rolls, computing `value` immediately.
    pub fn new(rolls: Vec<RollResult>) -> Self {
        let value = Self::sum(&rolls);
        RollResults {
            rolls,
            value,
            kind: ResultsKind::RollResults,
        }
    }

    fn sum(rolls: &[RollResult]) -> f64 {
        rolls
            .iter()
            .filter(|r| r.use_in_total())
            .map(|r| r.calculation_value())
            .sum()
    }

    /// Recompute `value` after in-place mutation of the rolls (modifiers call this after running).
    pub fn recompute_value(&mut self) {
        self.value = Self::sum(&self.rolls);
    }

    /// The current total.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The underlying rolls.
    pub fn rolls(&self) -> &[RollResult] {
        &self.rolls
    }

    /// Mutable access to the underlying rolls, for modifiers.
    pub fn rolls_mut(&mut self) -> &mut Vec<RollResult> {
        &mut self.rolls
    }
}

impl Deref for RollResults {
    type Target = Vec<RollResult>;

    fn deref(&self) -> &Self::Target {
        &self.rolls
    }
}

impl DerefMut for RollResults {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.rolls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_sums_only_rolls_in_total() {
        let mut rolls = vec![RollResult::new(6.0, None), RollResult::new(2.0, None)];
        rolls[1].set_use_in_total(false);
        let rr = RollResults::new(rolls);
        assert_eq!(rr.value(), 6.0);
    }

    #[test]
    fn recompute_picks_up_mutations() {
        let mut rr = RollResults::new(vec![RollResult::new(6.0, None), RollResult::new(2.0, None)]);
        assert_eq!(rr.value(), 8.0);
        rr.rolls_mut()[0].set_calculation_value(1.0);
        rr.recompute_value();
        assert_eq!(rr.value(), 3.0);
    }
}
