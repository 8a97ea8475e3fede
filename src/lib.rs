//! A dice notation parser and evaluator for tabletop RPGs.
//!
//! Feed a notation string to [`DiceRoll::new`] and get back a typed result tree with per-roll
//! provenance, a final total, and reproducible min/max/average bounds:
//!
//! ```
//! use dicealg::DiceRoll;
//!
//! let roll = DiceRoll::new("4d6kh3 + 2").unwrap();
//! println!("{}", roll.output());
//! ```
//!
//! The pipeline is a straight line from text to result tree:
//! [`parser::parse`] turns notation into an [`ast::Expression`], [`ast::eval_expression`] walks
//! it sampling dice and running [`modifiers::Modifier`]s in their fixed order, and the resulting
//! [`results::ResultGroup`] is what [`DiceRoll`] reports totals from.
//!
//! Randomness is injected through [`number_generator::Engine`]; swap in
//! [`number_generator::NumberGenerator::min_engine`] or
//! [`number_generator::NumberGenerator::max_engine`] for deterministic bounds, which is exactly
//! how [`DiceRoll::min_total`]/[`DiceRoll::max_total`] are computed.

pub mod ast;
pub mod compare_point;
pub mod description;
pub mod dice;
pub mod dice_roll;
pub mod error;
pub mod eval;
pub mod flag;
pub mod modifiers;
pub mod number_generator;
pub mod parser;
pub mod results;

pub use compare_point::{ComparePoint, CompareOperator};
pub use description::{Description, DescriptionType};
pub use dice::{Die, FudgeDie, GroupModifier, PercentileDie, StandardDie};
pub use dice_roll::DiceRoll;
pub use error::{Error, Result};
pub use flag::ModifierFlag;
pub use modifiers::Modifier;
pub use number_generator::{Engine, NumberGenerator};
pub use results::{DiceId, GroupElement, ResultGroup, RollResult, RollResults};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_d6_with_max_engine_totals_twenty_four() {
        let mut gen = NumberGenerator::max_engine();
        let roll = DiceRoll::roll_with("4d6", &mut gen).unwrap();
        assert_eq!(roll.total(), 24.0);
    }

    #[test]
    fn rejects_empty_notation() {
        assert!(matches!(DiceRoll::new(""), Err(Error::MissingArgument(_))));
    }
}
