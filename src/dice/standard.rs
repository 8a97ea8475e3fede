use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::modifiers::{Modifier, ModifierContext};
use crate::number_generator::NumberGenerator;
use crate::results::{DiceId, RollResult, RollResults};

/// `NdM`: `qty` dice with `sides` faces, sampled in `[min, max]` (default `[1, sides]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardDie {
    sides: u64,
    qty: u32,
    min: f64,
    max: f64,
    modifiers: Vec<Modifier>,
    #[serde(skip)]
    pub(crate) id: Option<DiceId>,
}

impl StandardDie {
    /// Build a standard die. Fails with [`Error::OutOfRange`] on non-positive sides or
    /// `qty` outside `[1, 999]`.
    pub fn new(qty: u32, sides: u64) -> Result<Self> {
        if sides == 0 {
            return Err(Error::OutOfRange("dice sides must be positive".into()));
        }
        if !(1..=999).contains(&qty) {
            return Err(Error::OutOfRange("dice quantity must be in [1, 999]".into()));
        }
        Ok(StandardDie {
            sides,
            qty,
            min: 1.0,
            max: sides as f64,
            modifiers: Vec::new(),
            id: None,
        })
    }

    /// Override the configured minimum face value.
    pub fn with_min(mut self, min: f64) -> Result<Self> {
        if !min.is_finite() {
            return Err(Error::InvalidArgument("die min must be finite".into()));
        }
        self.min = min;
        Ok(self)
    }

    /// Override the configured maximum face value.
    pub fn with_max(mut self, max: f64) -> Result<Self> {
        if !max.is_finite() {
            return Err(Error::InvalidArgument("die max must be finite".into()));
        }
        self.max = max;
        Ok(self)
    }

    /// The configured sides (used for notation and percentile's `%` rendering override).
    pub fn sides(&self) -> u64 {
        self.sides
    }

    /// Number of dice rolled.
    pub fn qty(&self) -> u32 {
        self.qty
    }

    /// Attach a modifier, keeping the set ordered by ascending [`Modifier::order`] with
    /// insertion-order tiebreak (a stable sort on every push achieves this).
    pub fn add_modifier(&mut self, modifier: Modifier) {
        self.modifiers.push(modifier);
        self.modifiers.sort_by_key(|m| m.order());
    }

    /// The attached modifiers, in execution order.
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// Sample one face (`rollOnce`).
    pub fn roll_once(&self, gen: &mut NumberGenerator) -> Result<RollResult> {
        let value = gen.integer(self.min as i64, self.max as i64)? as f64;
        Ok(RollResult::new(value, self.id))
    }

    /// Sample `qty` faces, then run every attached modifier in order.
    pub fn roll(&self, gen: &mut NumberGenerator) -> Result<RollResults> {
        let rolls: Result<Vec<RollResult>> =
            (0..self.qty).map(|_| self.roll_once(gen)).collect();
        let mut results = RollResults::new(rolls?);
        let mut modifiers = self.modifiers.clone();
        for modifier in &mut modifiers {
            modifier.run(&mut results, self, gen)?;
        }
        Ok(results)
    }

    /// Reconstruct `qty d sides` plus each modifier's notation.
    pub fn notation(&self) -> String {
        let mut s = format!("{}d{}", self.qty, self.sides);
        for m in &self.modifiers {
            s.push_str(&m.notation());
        }
        s
    }
}

impl ModifierContext for StandardDie {
    fn min(&self) -> f64 {
        self.min
    }

    fn max(&self) -> f64 {
        self.max
    }

    fn roll_one(&self, gen: &mut NumberGenerator) -> Result<f64> {
        Ok(self.roll_once(gen)?.initial_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number_generator::NumberGenerator;

    #[test]
    fn rejects_zero_sides() {
        assert!(matches!(StandardDie::new(1, 0), Err(Error::OutOfRange(_))));
    }

    #[test]
    fn rejects_qty_out_of_range() {
        assert!(matches!(StandardDie::new(0, 6), Err(Error::OutOfRange(_))));
        assert!(matches!(StandardDie::new(1000, 6), Err(Error::OutOfRange(_))));
    }

    #[test]
    fn max_engine_rolls_all_max() {
        let die = StandardDie::new(4, 6).unwrap();
        let mut gen = NumberGenerator::max_engine();
        let res = die.roll(&mut gen).unwrap();
        assert_eq!(res.value(), 24.0);
    }

    #[test]
    fn notation_round_trips() {
        let die = StandardDie::new(4, 6).unwrap();
        assert_eq!(die.notation(), "4d6");
    }
}
