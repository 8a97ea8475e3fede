//! The three die kinds and the restricted set of modifiers a roll-group (`{...}`)
//! may carry.

pub mod fudge;
pub mod percentile;
pub mod standard;

pub use fudge::FudgeDie;
pub use percentile::PercentileDie;
pub use standard::StandardDie;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::flag::ModifierFlag;
use crate::modifiers::{End, Modifier, ModifierContext, SortDirection};
use crate::number_generator::NumberGenerator;
use crate::results::{GroupElement, ResultGroup, RollResult, RollResults};

/// Any one of the three dice kinds, unified so the evaluator can walk a notation's `Dice`
/// factors without matching on kind at every call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Die {
    /// `NdM`
    Standard(StandardDie),
    /// `Nd%`
    Percentile(PercentileDie),
    /// `NdF`
    Fudge(FudgeDie),
}

impl Die {
    /// Attach a modifier, keeping the die's set ordered by ascending [`Modifier::order`].
    pub fn add_modifier(&mut self, modifier: Modifier) {
        match self {
            Die::Standard(d) => d.add_modifier(modifier),
            Die::Percentile(d) => d.add_modifier(modifier),
            Die::Fudge(d) => d.add_modifier(modifier),
        }
    }

    /// The attached modifiers, in execution order.
    pub fn modifiers(&self) -> &[Modifier] {
        match self {
            Die::Standard(d) => d.modifiers(),
            Die::Percentile(d) => d.modifiers(),
            Die::Fudge(d) => d.modifiers(),
        }
    }

    /// Sample one face, bypassing modifiers (used by modifiers that need an extra roll).
    pub fn roll_once(&self, gen: &mut NumberGenerator) -> Result<RollResult> {
        match self {
            Die::Standard(d) => d.roll_once(gen),
            Die::Percentile(d) => d.roll_once(gen),
            Die::Fudge(d) => d.roll_once(gen),
        }
    }

    /// Sample the die's full quantity, then run its attached modifiers.
    pub fn roll(&self, gen: &mut NumberGenerator) -> Result<RollResults> {
        match self {
            Die::Standard(d) => d.roll(gen),
            Die::Percentile(d) => d.roll(gen),
            Die::Fudge(d) => d.roll(gen),
        }
    }

    /// Reconstruct this die's notation, including attached modifiers.
    pub fn notation(&self) -> String {
        match self {
            Die::Standard(d) => d.notation(),
            Die::Percentile(d) => d.notation(),
            Die::Fudge(d) => d.notation(),
        }
    }
}

impl ModifierContext for Die {
    fn min(&self) -> f64 {
        match self {
            Die::Standard(d) => d.min(),
            Die::Percentile(d) => d.min(),
            Die::Fudge(d) => d.min(),
        }
    }

    fn max(&self) -> f64 {
        match self {
            Die::Standard(d) => d.max(),
            Die::Percentile(d) => d.max(),
            Die::Fudge(d) => d.max(),
        }
    }

    fn roll_one(&self, gen: &mut NumberGenerator) -> Result<f64> {
        match self {
            Die::Standard(d) => d.roll_one(gen),
            Die::Percentile(d) => d.roll_one(gen),
            Die::Fudge(d) => d.roll_one(gen),
        }
    }
}

/// The subset of [`Modifier`] a roll-group (`{...}`) may carry.
///
/// A roll-group's sub-expressions can be arbitrary, heterogeneous expressions, so a group has no
/// well-defined `min()`/`max()` the way a die does: keep/drop/sort, which only need each
/// sub-expression's already-computed value, stay well-defined; explode/re-roll/unique/target/
/// critical, which all need to sample "one more face", do not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GroupModifier {
    /// Keep only the highest/lowest `qty` sub-expressions.
    Keep {
        /// Which end to keep.
        end: End,
        /// How many sub-expressions to keep.
        qty: usize,
    },
    /// Drop the highest/lowest `qty` sub-expressions.
    Drop {
        /// Which end to drop.
        end: End,
        /// How many sub-expressions to drop.
        qty: usize,
    },
    /// Stable-sort the sub-expressions by value.
    Sorting {
        /// Ascending or descending.
        direction: SortDirection,
    },
}

impl GroupModifier {
    /// Narrow a general [`Modifier`] down to the roll-group-eligible subset.
    ///
    /// Fails with [`Error::InvalidDieAction`] for any of the other ten kinds, since none of them
    /// has well-defined semantics over a group of heterogeneous sub-expressions.
    pub fn from_modifier(modifier: Modifier) -> Result<Self> {
        match modifier {
            Modifier::Keep { end, qty } => Ok(GroupModifier::Keep { end, qty }),
            Modifier::Drop { end, qty } => Ok(GroupModifier::Drop { end, qty }),
            Modifier::Sorting { direction } => Ok(GroupModifier::Sorting { direction }),
            other => Err(Error::InvalidDieAction(format!(
                "{} cannot be attached to a roll-group",
                other.name()
            ))),
        }
    }

    /// Reconstruct this modifier's notation, matching [`Modifier::notation`].
    pub fn notation(&self) -> String {
        match self {
            GroupModifier::Keep { end, qty } => format!("k{}{}", letter(*end), qty),
            GroupModifier::Drop { end, qty } => format!("d{}{}", letter(*end), qty),
            GroupModifier::Sorting { direction } => format!(
                "s{}",
                match direction {
                    SortDirection::Ascending => "a",
                    SortDirection::Descending => "d",
                }
            ),
        }
    }
}

fn letter(end: End) -> &'static str {
    match end {
        End::High => "h",
        End::Low => "l",
    }
}

/// Apply one group-level modifier to a roll-group's already-evaluated sub-expression results,
/// toggling `use_in_total` on the dropped ones or re-ordering them in place.
pub fn apply_group_modifier(groups: &mut [ResultGroup], modifier: &GroupModifier) {
    match modifier {
        GroupModifier::Keep { end, qty } => keep_or_drop(groups, *end, *qty, true),
        GroupModifier::Drop { end, qty } => keep_or_drop(groups, *end, *qty, false),
        GroupModifier::Sorting { direction } => {
            let ascending = matches!(direction, SortDirection::Ascending);
            sort_groups(groups, ascending);
            for g in groups.iter_mut() {
                sort_nested(g.results_mut(), ascending);
            }
        }
    }
}

fn sort_groups(groups: &mut [ResultGroup], ascending: bool) {
    groups.sort_by(|a, b| {
        if ascending {
            a.calculation_value().partial_cmp(&b.calculation_value()).unwrap()
        } else {
            b.calculation_value().partial_cmp(&a.calculation_value()).unwrap()
        }
    });
}

/// Recurse the same sort into nested `ResultGroup`/`RollResults` children so a sort applied at
/// one level keeps descendants internally sorted too.
fn sort_nested(elements: &mut [GroupElement], ascending: bool) {
    for element in elements.iter_mut() {
        match element {
            GroupElement::Group(g) => sort_nested(g.results_mut(), ascending),
            GroupElement::Rolls(rr) => rr.rolls_mut().sort_by(|a, b| {
                if ascending {
                    a.value().partial_cmp(&b.value()).unwrap()
                } else {
                    b.value().partial_cmp(&a.value()).unwrap()
                }
            }),
            GroupElement::Operator(_) | GroupElement::Number(_) => {}
        }
    }
}

fn keep_or_drop(groups: &mut [ResultGroup], end: End, qty: usize, is_keep: bool) {
    let n = groups.len();
    let mut indexed: Vec<(usize, f64)> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| (i, g.calculation_value()))
        .collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    let sorted_indices: Vec<usize> = indexed.into_iter().map(|(i, _)| i).collect();

    let drop_positions: std::ops::Range<usize> = match (is_keep, end) {
        (true, End::High) => 0..n.saturating_sub(qty),
        (true, End::Low) => qty.min(n)..n,
        (false, End::Low) => 0..qty.min(n),
        (false, End::High) => n.saturating_sub(qty)..n,
    };

    for &idx in &sorted_indices[drop_positions] {
        groups[idx].add_flag(ModifierFlag::Drop);
        groups[idx].set_use_in_total(false);
    }
}
