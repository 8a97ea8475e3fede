use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::modifiers::{Modifier, ModifierContext};
use crate::number_generator::NumberGenerator;
use crate::results::{DiceId, RollResult, RollResults};

/// `dF` / `dF.1` / `dF.2`: a fudge/FATE die, `min = -1`, `max = +1`.
///
/// With `non_blanks = 2`, a roll is `uniform{1..3} - 2`. With `non_blanks = 1`, a roll samples
/// `{1..6}` and maps `1 -> -1`, `6 -> +1`, everything else to `0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FudgeDie {
    qty: u32,
    non_blanks: u8,
    modifiers: Vec<Modifier>,
    #[serde(skip)]
    id: Option<DiceId>,
}

impl FudgeDie {
    /// Build a fudge die. Fails with [`Error::OutOfRange`] unless `non_blanks` is 1 or 2, or
    /// `qty` is outside `[1, 999]`.
    pub fn new(qty: u32, non_blanks: u8) -> Result<Self> {
        if !(1..=999).contains(&qty) {
            return Err(Error::OutOfRange("dice quantity must be in [1, 999]".into()));
        }
        if non_blanks != 1 && non_blanks != 2 {
            return Err(Error::OutOfRange("fudge non-blanks must be 1 or 2".into()));
        }
        Ok(FudgeDie {
            qty,
            non_blanks,
            modifiers: Vec::new(),
            id: None,
        })
    }

    /// Attach a modifier, keeping the set ordered by ascending [`Modifier::order`].
    pub fn add_modifier(&mut self, modifier: Modifier) {
        self.modifiers.push(modifier);
        self.modifiers.sort_by_key(|m| m.order());
    }

    /// The attached modifiers, in execution order.
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// Sample one face.
    pub fn roll_once(&self, gen: &mut NumberGenerator) -> Result<RollResult> {
        let value = if self.non_blanks == 2 {
            gen.integer(1, 3)? - 2
        } else {
            match gen.integer(1, 6)? {
                1 => -1,
                6 => 1,
                _ => 0,
            }
        };
        Ok(RollResult::new(value as f64, self.id))
    }

    /// Sample `qty` faces and run modifiers.
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

    /// Reconstruct `qty dF` or `qty dF.1`/`qty dF.2` plus modifier notation.
    pub fn notation(&self) -> String {
        let mut s = format!("{}dF", self.qty);
        if self.non_blanks != 2 {
            s.push('.');
            s.push_str(&self.non_blanks.to_string());
        }
        for m in &self.modifiers {
            s.push_str(&m.notation());
        }
        s
    }
}

impl ModifierContext for FudgeDie {
    fn min(&self) -> f64 {
        -1.0
    }

    fn max(&self) -> f64 {
        1.0
    }

    fn roll_one(&self, gen: &mut NumberGenerator) -> Result<f64> {
        Ok(self.roll_once(gen)?.initial_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_non_blanks() {
        assert!(matches!(FudgeDie::new(1, 3), Err(Error::OutOfRange(_))));
    }

    #[test]
    fn min_engine_rolls_all_minus_one() {
        let die = FudgeDie::new(4, 2).unwrap();
        let mut gen = NumberGenerator::min_engine();
        assert_eq!(die.roll(&mut gen).unwrap().value(), -4.0);
    }

    #[test]
    fn max_engine_rolls_all_plus_one() {
        let die = FudgeDie::new(4, 2).unwrap();
        let mut gen = NumberGenerator::max_engine();
        assert_eq!(die.roll(&mut gen).unwrap().value(), 4.0);
    }

    #[test]
    fn notation_includes_non_blanks_suffix_unless_two() {
        assert_eq!(FudgeDie::new(2, 2).unwrap().notation(), "2dF");
        assert_eq!(FudgeDie::new(2, 1).unwrap().notation(), "2dF.1");
    }
}
