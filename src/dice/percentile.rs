use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::modifiers::{Modifier, ModifierContext};
use crate::number_generator::NumberGenerator;
use crate::results::{DiceId, RollResult, RollResults};

use super::standard::StandardDie;

/// `d%`: a 100-sided standard die whose notation renders `%` instead of `100` unless the caller
/// has asked sides to render literally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PercentileDie {
    inner: StandardDie,
    render_percent_sign: bool,
}

impl PercentileDie {
    /// Build a percentile die (`qty` dice, 100 sides).
    pub fn new(qty: u32) -> Result<Self> {
        Ok(PercentileDie {
            inner: StandardDie::new(qty, 100)?,
            render_percent_sign: true,
        })
    }

    /// Render sides as the literal number `100` instead of `%`.
    pub fn render_sides_literally(mut self) -> Self {
        self.render_percent_sign = false;
        self
    }

    /// Attach a modifier.
    pub fn add_modifier(&mut self, modifier: Modifier) {
        self.inner.add_modifier(modifier);
    }

    /// The attached modifiers, in execution order.
    pub fn modifiers(&self) -> &[Modifier] {
        self.inner.modifiers()
    }

    /// Sample one face.
    pub fn roll_once(&self, gen: &mut NumberGenerator) -> Result<RollResult> {
        self.inner.roll_once(gen)
    }

    /// Sample `qty` faces and run modifiers.
    pub fn roll(&self, gen: &mut NumberGenerator) -> Result<RollResults> {
        self.inner.roll(gen)
    }

    /// Informational back-reference id, if this die has been assigned one.
    pub fn dice_id(&self) -> Option<DiceId> {
        self.inner.id
    }

    /// Reconstruct notation, e.g. `4d%` or `4d100` with [`Self::render_sides_literally`].
    pub fn notation(&self) -> String {
        let mut s = format!(
            "{}d{}",
            self.inner.qty(),
            if self.render_percent_sign { "%".to_string() } else { self.inner.sides().to_string() }
        );
        for m in self.inner.modifiers() {
            s.push_str(&m.notation());
        }
        s
    }
}

impl ModifierContext for PercentileDie {
    fn min(&self) -> f64 {
        self.inner.min()
    }

    fn max(&self) -> f64 {
        self.inner.max()
    }

    fn roll_one(&self, gen: &mut NumberGenerator) -> Result<f64> {
        self.inner.roll_one(gen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notation_renders_percent_by_default() {
        let die = PercentileDie::new(4).unwrap();
        assert_eq!(die.notation(), "4d%");
    }

    #[test]
    fn notation_can_render_sides_literally() {
        let die = PercentileDie::new(4).unwrap().render_sides_literally();
        assert_eq!(die.notation(), "4d100");
    }

    #[test]
    fn max_engine_rolls_100() {
        let die = PercentileDie::new(1).unwrap();
        let mut gen = crate::number_generator::NumberGenerator::max_engine();
        assert_eq!(die.roll(&mut gen).unwrap().value(), 100.0);
    }
}
