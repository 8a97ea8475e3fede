//! The 13 modifier kinds and their fixed execution order.
//!
//! Each die owns an ordered set of independent, composable modifiers; every attached modifier
//! runs, in ascending `order`, rather than a die picking just one.

use serde::{Deserialize, Serialize};

use crate::compare_point::ComparePoint;
use crate::error::{Error, Result};
use crate::flag::ModifierFlag;
use crate::number_generator::NumberGenerator;
use crate::results::RollResults;

/// Maximum number of times explode/re-roll/unique may iterate on a single die.
pub const ITERATION_CAP: u32 = 1000;

/// What a modifier needs from the die (or group) it is attached to: its bounds, for materializing
/// default compare points and detecting non-terminating configurations, and a way to sample one
/// more value the way that die samples.
pub trait ModifierContext {
    /// The die's configured minimum face value.
    fn min(&self) -> f64;
    /// The die's configured maximum face value.
    fn max(&self) -> f64;
    /// Sample one more value the way this context's die is sampled.
    fn roll_one(&self, gen: &mut NumberGenerator) -> Result<f64>;
}

/// `h` (highest) or `l` (lowest) end for keep/drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum End {
    /// `h`
    High,
    /// `l`
    Low,
}

impl End {
    /// Parse the single-letter token.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "h" => Ok(End::High),
            "l" => Ok(End::Low),
            other => Err(Error::OutOfRange(format!("keep/drop end {:?} must be h or l", other))),
        }
    }

    fn letter(self) -> &'static str {
        match self {
            End::High => "h",
            End::Low => "l",
        }
    }
}

/// `a` (ascending) or `d` (descending) direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// `a`
    Ascending,
    /// `d`
    Descending,
}

impl SortDirection {
    /// Parse the single-letter token.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "a" => Ok(SortDirection::Ascending),
            "d" => Ok(SortDirection::Descending),
            other => Err(Error::OutOfRange(format!(
                "sort direction {:?} must be a or d",
                other
            ))),
        }
    }

    fn letter(self) -> &'static str {
        match self {
            SortDirection::Ascending => "a",
            SortDirection::Descending => "d",
        }
    }
}

/// One of the 13 modifier kinds, with its parameters.
///
/// Variants are applied in ascending [`Modifier::order`]; two modifiers of equal order preserve
/// insertion order, which a stable sort on a vector populated in parse order
/// gives for free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Modifier {
    /// Clamp values below a bound up to it.
    Min(f64),
    /// Clamp values above a bound down to it.
    Max(f64),
    /// Re-roll and append on a match, optionally compounding into one result or penetrating.
    Explode {
        /// Compare point; defaults to `= context.max()` on first run if absent.
        compare_point: Option<ComparePoint>,
        /// Collapse the exploded chain into a single result.
        compound: bool,
        /// Decrement each new exploded roll by 1.
        penetrate: bool,
    },
    /// Replace the value on a match.
    ReRoll {
        /// Compare point; defaults to `= context.min()` on first run if absent.
        compare_point: Option<ComparePoint>,
        /// Stop after the first re-roll regardless of whether it still matches.
        once: bool,
    },
    /// Replace duplicate values (after the first occurrence) on a match.
    Unique {
        /// Compare point; when absent, any duplicate is eligible.
        compare_point: Option<ComparePoint>,
        /// Stop after the first re-roll regardless of whether it still duplicates.
        once: bool,
    },
    /// Keep only the highest/lowest `qty` rolls, flagging the rest as dropped.
    Keep {
        /// Which end to keep.
        end: End,
        /// How many rolls to keep.
        qty: usize,
    },
    /// Drop the highest/lowest `qty` rolls.
    Drop {
        /// Which end to drop.
        end: End,
        /// How many rolls to drop.
        qty: usize,
    },
    /// Mark successes/failures and set `calculation_value` to 1/-1/0.
    Target {
        /// Compare point for a success.
        success: ComparePoint,
        /// Optional compare point for a failure.
        failure: Option<ComparePoint>,
    },
    /// Flag rolls matching a (defaulted) compare point as critical successes.
    CriticalSuccess {
        /// Compare point; defaults to `= context.max()` on first run if absent.
        compare_point: Option<ComparePoint>,
    },
    /// Flag rolls matching a (defaulted) compare point as critical failures.
    CriticalFailure {
        /// Compare point; defaults to `= context.min()` on first run if absent.
        compare_point: Option<ComparePoint>,
    },
    /// Stable-sort the rolls.
    Sorting {
        /// Ascending or descending.
        direction: SortDirection,
    },
}

impl Modifier {
    /// The modifier's name (used as its flag and in error messages).
    pub fn name(&self) -> &'static str {
        match self {
            Modifier::Min(_) => "min",
            Modifier::Max(_) => "max",
            Modifier::Explode { .. } => "explode",
            Modifier::ReRoll { .. } => "re-roll",
            Modifier::Unique { .. } => "unique",
            Modifier::Keep { .. } => "keep",
            Modifier::Drop { .. } => "drop",
            Modifier::Target { .. } => "target",
            Modifier::CriticalSuccess { .. } => "critical-success",
            Modifier::CriticalFailure { .. } => "critical-failure",
            Modifier::Sorting { .. } => "sorting",
        }
    }

    /// The modifier's fixed position in the execution pipeline.
    pub fn order(&self) -> u8 {
        match self {
            Modifier::Min(_) => 1,
            Modifier::Max(_) => 2,
            Modifier::Explode { .. } => 3,
            Modifier::ReRoll { .. } => 4,
            Modifier::Unique { .. } => 5,
            Modifier::Keep { .. } => 6,
            Modifier::Drop { .. } => 7,
            Modifier::Target { .. } => 8,
            Modifier::CriticalSuccess { .. } => 9,
            Modifier::CriticalFailure { .. } => 10,
            Modifier::Sorting { .. } => 11,
        }
    }

    /// Reconstruct this modifier's notation.
    pub fn notation(&self) -> String {
        match self {
            Modifier::Min(v) => format!("min{}", crate::eval::format_number(*v)),
            Modifier::Max(v) => format!("max{}", crate::eval::format_number(*v)),
            Modifier::Explode {
                compare_point,
                compound,
                penetrate,
            } => {
                let mut s = String::from("!");
                if *compound {
                    s.push('!');
                }
                if *penetrate {
                    s.push('p');
                }
                if let Some(cp) = compare_point {
                    s.push_str(&cp.to_string());
                }
                s
            }
            Modifier::ReRoll { compare_point, once } => {
                let mut s = String::from("r");
                if *once {
                    s.push('o');
                }
                if let Some(cp) = compare_point {
                    s.push_str(&cp.to_string());
                }
                s
            }
            Modifier::Unique { compare_point, once } => {
                let mut s = String::from("u");
                if *once {
                    s.push('o');
                }
                if let Some(cp) = compare_point {
                    s.push_str(&cp.to_string());
                }
                s
            }
            Modifier::Keep { end, qty } => format!("k{}{}", end.letter(), qty),
            Modifier::Drop { end, qty } => format!("d{}{}", end.letter(), qty),
            Modifier::Target { success, failure } => {
                let mut s = success.to_string();
                if let Some(f) = failure {
                    s.push('f');
                    s.push_str(&f.to_string());
                }
                s
            }
            Modifier::CriticalSuccess { compare_point } => {
                let mut s = String::from("cs");
                if let Some(cp) = compare_point {
                    s.push_str(&cp.to_string());
                }
                s
            }
            Modifier::CriticalFailure { compare_point } => {
                let mut s = String::from("cf");
                if let Some(cp) = compare_point {
                    s.push_str(&cp.to_string());
                }
                s
            }
            Modifier::Sorting { direction } => format!("s{}", direction.letter()),
        }
    }

    /// Run this modifier over `rolls`, mutating it in place, then recompute its cached value.
    pub fn run(
        &mut self,
        rolls: &mut RollResults,
        ctx: &dyn ModifierContext,
        gen: &mut NumberGenerator,
    ) -> Result<()> {
        match self {
            Modifier::Min(bound) => {
                for r in rolls.rolls_mut() {
                    if r.value() < *bound {
                        r.set_value(*bound);
                        r.add_flag(ModifierFlag::Min);
                    }
                }
            }
            Modifier::Max(bound) => {
                for r in rolls.rolls_mut() {
                    if r.value() > *bound {
                        r.set_value(*bound);
                        r.add_flag(ModifierFlag::Max);
                    }
                }
            }
            Modifier::Explode {
                compare_point,
                compound,
                penetrate,
            } => run_explode(rolls, ctx, gen, compare_point, *compound, *penetrate)?,
            Modifier::ReRoll { compare_point, once } => {
                run_reroll(rolls, ctx, gen, compare_point, *once)?
            }
            Modifier::Unique { compare_point, once } => {
                run_unique(rolls, ctx, gen, compare_point, *once)?
            }
            Modifier::Keep { end, qty } => run_keep_drop(rolls, *end, *qty, true),
            Modifier::Drop { end, qty } => run_keep_drop(rolls, *end, *qty, false),
            Modifier::Target { success, failure } => {
                for r in rolls.rolls_mut() {
                    if success.matches(r.value()) {
                        r.add_flag(ModifierFlag::TargetSuccess);
                        r.set_calculation_value(1.0);
                    } else if failure.map(|f| f.matches(r.value())).unwrap_or(false) {
                        r.add_flag(ModifierFlag::TargetFailure);
                        r.set_calculation_value(-1.0);
                    } else {
                        r.set_calculation_value(0.0);
                    }
                }
            }
            Modifier::CriticalSuccess { compare_point } => {
                let cp = materialize(compare_point, ctx.max())?;
                for r in rolls.rolls_mut() {
                    if cp.matches(r.value()) {
                        r.add_flag(ModifierFlag::CriticalSuccess);
                    }
                }
            }
            Modifier::CriticalFailure { compare_point } => {
                let cp = materialize(compare_point, ctx.min())?;
                for r in rolls.rolls_mut() {
                    if cp.matches(r.value()) {
                        r.add_flag(ModifierFlag::CriticalFailure);
                    }
                }
            }
            Modifier::Sorting { direction } => {
                let ascending = matches!(direction, SortDirection::Ascending);
                rolls
                    .rolls_mut()
                    .sort_by(|a, b| {
                        if ascending {
                            a.value().partial_cmp(&b.value()).unwrap()
                        } else {
                            b.value().partial_cmp(&a.value()).unwrap()
                        }
                    });
            }
        }
        rolls.recompute_value();
        Ok(())
    }
}

fn materialize(compare_point: &mut Option<ComparePoint>, default_value: f64) -> Result<ComparePoint> {
    if let Some(cp) = compare_point {
        Ok(*cp)
    } else {
        let cp = ComparePoint::new(crate::compare_point::CompareOperator::Equal, default_value)?;
        *compare_point = Some(cp);
        Ok(cp)
    }
}

fn would_not_terminate(ctx: &dyn ModifierContext) -> bool {
    ctx.min() == ctx.max()
}

fn run_explode(
    rolls: &mut RollResults,
    ctx: &dyn ModifierContext,
    gen: &mut NumberGenerator,
    compare_point: &mut Option<ComparePoint>,
    compound: bool,
    penetrate: bool,
) -> Result<()> {
    if would_not_terminate(ctx) {
        return Err(Error::InvalidDieAction(
            "explode requires context.min != context.max".into(),
        ));
    }
    let cp = materialize(compare_point, ctx.max())?;
    let original = std::mem::take(rolls.rolls_mut());
    let mut rebuilt = Vec::with_capacity(original.len());

    for first in original {
        let mut chain = vec![first];
        let mut iterations: u32 = 0;
        while cp.matches(chain.last().unwrap().value()) && iterations < ITERATION_CAP {
            let mut next_value = ctx.roll_one(gen)?;
            let prev = chain.last_mut().unwrap();
            prev.add_flag(ModifierFlag::Explode);
            if penetrate {
                prev.add_flag(ModifierFlag::Penetrate);
                next_value -= 1.0;
            }
            let mut next = crate::results::RollResult::new(next_value, None);
            next.set_value(next_value);
            chain.push(next);
            iterations += 1;
        }

        if compound && chain.len() > 1 {
            let sum: f64 = chain.iter().map(|r| r.value()).sum();
            let mut merged = crate::results::RollResult::new(chain[0].initial_value(), chain[0].dice());
            merged.set_value(sum);
            merged.add_flag(ModifierFlag::Explode);
            merged.add_flag(ModifierFlag::Compound);
            if penetrate {
                merged.add_flag(ModifierFlag::Penetrate);
            }
            rebuilt.push(merged);
        } else {
            rebuilt.extend(chain);
        }
    }

    *rolls.rolls_mut() = rebuilt;
    Ok(())
}

fn run_reroll(
    rolls: &mut RollResults,
    ctx: &dyn ModifierContext,
    gen: &mut NumberGenerator,
    compare_point: &mut Option<ComparePoint>,
    once: bool,
) -> Result<()> {
    if would_not_terminate(ctx) {
        return Err(Error::InvalidDieAction(
            "re-roll requires context.min != context.max".into(),
        ));
    }
    let cp = materialize(compare_point, ctx.min())?;
    let flag = if once {
        ModifierFlag::ReRollOnce
    } else {
        ModifierFlag::ReRoll
    };
    for r in rolls.rolls_mut() {
        let mut iterations: u32 = 0;
        if once {
            if cp.matches(r.value()) {
                let new_value = ctx.roll_one(gen)?;
                r.set_value(new_value);
                r.add_flag(flag);
            }
        } else {
            while cp.matches(r.value()) && iterations < ITERATION_CAP {
                let new_value = ctx.roll_one(gen)?;
                r.set_value(new_value);
                r.add_flag(flag);
                iterations += 1;
            }
        }
    }
    Ok(())
}

fn run_unique(
    rolls: &mut RollResults,
    ctx: &dyn ModifierContext,
    gen: &mut NumberGenerator,
    compare_point: &mut Option<ComparePoint>,
    once: bool,
) -> Result<()> {
    if would_not_terminate(ctx) {
        return Err(Error::InvalidDieAction(
            "unique requires context.min != context.max".into(),
        ));
    }
    let cp = *compare_point;
    let flag = if once {
        ModifierFlag::UniqueOnce
    } else {
        ModifierFlag::Unique
    };
    let len = rolls.len();
    for i in 1..len {
        let mut iterations: u32 = 0;
        loop {
            let value = rolls.rolls()[i].value();
            let eligible = cp.map(|c| c.matches(value)).unwrap_or(true);
            let duplicates = rolls.rolls()[..i].iter().any(|earlier| earlier.value() == value);
            if !(eligible && duplicates) || iterations >= ITERATION_CAP {
                break;
            }
            let new_value = ctx.roll_one(gen)?;
            rolls.rolls_mut()[i].set_value(new_value);
            rolls.rolls_mut()[i].add_flag(flag);
            iterations += 1;
            if once {
                break;
            }
        }
    }
    Ok(())
}

fn run_keep_drop(rolls: &mut RollResults, end: End, qty: usize, is_keep: bool) {
    let n = rolls.len();
    let mut indexed: Vec<(usize, f64)> = rolls
        .rolls()
        .iter()
        .enumerate()
        .map(|(i, r)| (i, r.value()))
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
        let r = &mut rolls.rolls_mut()[idx];
        r.add_flag(ModifierFlag::Drop);
        r.set_use_in_total(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::RollResult;

    struct FixedContext {
        min: f64,
        max: f64,
        sequence: std::cell::RefCell<std::vec::IntoIter<f64>>,
    }

    impl ModifierContext for FixedContext {
        fn min(&self) -> f64 {
            self.min
        }
        fn max(&self) -> f64 {
            self.max
        }
        fn roll_one(&self, _gen: &mut NumberGenerator) -> Result<f64> {
            Ok(self.sequence.borrow_mut().next().unwrap_or(self.min))
        }
    }

    fn ctx(min: f64, max: f64, seq: Vec<f64>) -> FixedContext {
        FixedContext {
            min,
            max,
            sequence: std::cell::RefCell::new(seq.into_iter()),
        }
    }

    fn rolls(values: &[f64]) -> RollResults {
        RollResults::new(values.iter().map(|v| RollResult::new(*v, None)).collect())
    }

    #[test]
    fn keep_highest_two_of_four() {
        let mut rr = rolls(&[1.0, 5.0, 2.0, 6.0]);
        run_keep_drop(&mut rr, End::High, 2, true);
        rr.recompute_value();
        assert_eq!(rr.value(), 11.0);
        assert!(rr.rolls()[0].has_flag(ModifierFlag::Drop));
        assert!(rr.rolls()[2].has_flag(ModifierFlag::Drop));
        assert!(!rr.rolls()[1].has_flag(ModifierFlag::Drop));
        assert!(!rr.rolls()[3].has_flag(ModifierFlag::Drop));
    }

    #[test]
    fn explode_without_compound_flattens_chain() {
        let mut rr = rolls(&[6.0, 3.0]);
        let c = ctx(1.0, 6.0, vec![4.0]);
        let mut gen = NumberGenerator::min_engine();
        run_explode(&mut rr, &c, &mut gen, &mut None, false, false).unwrap();
        assert_eq!(rr.len(), 3);
        assert_eq!(rr.rolls()[0].value(), 6.0);
        assert!(rr.rolls()[0].has_flag(ModifierFlag::Explode));
        assert_eq!(rr.rolls()[1].value(), 4.0);
        assert_eq!(rr.rolls()[2].value(), 3.0);
    }

    #[test]
    fn explode_with_compound_collapses_to_one_result() {
        let mut rr = rolls(&[6.0]);
        let c = ctx(1.0, 6.0, vec![6.0, 2.0]);
        let mut gen = NumberGenerator::min_engine();
        run_explode(&mut rr, &c, &mut gen, &mut None, true, false).unwrap();
        assert_eq!(rr.len(), 1);
        assert_eq!(rr.rolls()[0].value(), 14.0);
        assert!(rr.rolls()[0].has_flag(ModifierFlag::Compound));
    }

    #[test]
    fn explode_penetrate_decrements_new_rolls() {
        let mut rr = rolls(&[6.0]);
        let c = ctx(1.0, 6.0, vec![6.0, 3.0]);
        let mut gen = NumberGenerator::min_engine();
        run_explode(&mut rr, &c, &mut gen, &mut None, false, true).unwrap();
        assert_eq!(rr.len(), 3);
        assert_eq!(rr.rolls()[1].value(), 5.0);
        assert_eq!(rr.rolls()[2].value(), 2.0);
    }

    #[test]
    fn explode_fails_when_min_equals_max() {
        let mut rr = rolls(&[1.0]);
        let c = ctx(1.0, 1.0, vec![]);
        let mut gen = NumberGenerator::min_engine();
        assert!(matches!(
            run_explode(&mut rr, &c, &mut gen, &mut None, false, false),
            Err(Error::InvalidDieAction(_))
        ));
    }

    #[test]
    fn reroll_once_replaces_value_not_initial() {
        let mut rr = rolls(&[1.0]);
        let c = ctx(1.0, 6.0, vec![4.0]);
        let mut gen = NumberGenerator::min_engine();
        let mut cp = Some(ComparePoint::new(crate::compare_point::CompareOperator::LessOrEqual, 2.0).unwrap());
        run_reroll(&mut rr, &c, &mut gen, &mut cp, true).unwrap();
        assert_eq!(rr.rolls()[0].value(), 4.0);
        assert_eq!(rr.rolls()[0].initial_value(), 1.0);
        assert!(rr.rolls()[0].has_flag(ModifierFlag::ReRollOnce));
    }

    #[test]
    fn unique_never_rerolls_first_occurrence() {
        let mut rr = rolls(&[3.0, 3.0, 3.0]);
        let c = ctx(1.0, 6.0, vec![5.0, 1.0]);
        let mut gen = NumberGenerator::min_engine();
        run_unique(&mut rr, &c, &mut gen, &mut None, false).unwrap();
        assert_eq!(rr.rolls()[0].value(), 3.0);
        assert!(!rr.rolls()[0].has_flag(ModifierFlag::Unique));
    }
}
