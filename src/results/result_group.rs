use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::eval::{self, Op};
use crate::flag::ModifierFlag;

use super::roll_results::RollResults;

/// One element of a [`ResultGroup`]'s ordered sequence.
///
/// Serializes untagged: an operator is a bare string, a number a bare JSON number, and the group
/// / roll-results variants serialize as their own structured objects, giving an "array of mixed
/// element shapes" wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupElement {
    /// A literal operator token (canonical spelling, e.g. `^` already rendered as `**`).
    Operator(String),
    /// A finite number literal.
    Number(f64),
    /// A nested group (parenthesized sub-expression, or a roll-group sub-expression).
    Group(ResultGroup),
    /// A sampled die's results.
    Rolls(RollResults),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum GroupKind {
    ResultGroup,
}

/// The typed tree node carrying provenance and calculation values for a (sub-)expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultGroup {
    results: Vec<GroupElement>,
    modifiers: Vec<ModifierFlag>,
    #[serde(rename = "modifierFlags")]
    modifier_flags: String,
    #[serde(rename = "isRollGroup")]
    is_roll_group: bool,
    #[serde(rename = "useInTotal")]
    use_in_total: bool,
    #[serde(rename = "calculationValue")]
    calculation_value: f64,
    value: f64,
    #[serde(rename = "type")]
    kind: GroupKind,
}

impl ResultGroup {
    /// Build a group from its elements, computing `value` immediately.
    ///
    /// `is_roll_group` distinguishes a brace-group (`{...}`) from a plain parenthesized/bare
    /// expression.
    pub fn new(results: Vec<GroupElement>, is_roll_group: bool) -> Result<Self> {
        let value = compute_value(&results)?;
        Ok(ResultGroup {
            results,
            modifiers: Vec::new(),
            modifier_flags: String::new(),
            is_roll_group,
            use_in_total: true,
            calculation_value: value,
            value,
            kind: GroupKind::ResultGroup,
        })
    }

    /// The group's elements.
    pub fn results(&self) -> &[GroupElement] {
        &self.results
    }

    /// Mutable access to the group's elements, for modifiers (e.g. sorting, keep/drop).
    pub fn results_mut(&mut self) -> &mut Vec<GroupElement> {
        &mut self.results
    }

    /// Recompute `value` (and reset `calculation_value` to match it unless overridden) after
    /// in-place mutation of `results`.
    pub fn recompute_value(&mut self) -> Result<()> {
        self.value = compute_value(&self.results)?;
        self.calculation_value = self.value;
        Ok(())
    }

    /// The group's computed arithmetic value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The value this group contributes to an enclosing group's arithmetic (defaults to `value`,
    /// may be overridden).
    pub fn calculation_value(&self) -> f64 {
        self.calculation_value
    }

    /// Override the contribution this group makes to its parent.
    pub fn set_calculation_value(&mut self, value: f64) {
        self.calculation_value = value;
    }

    /// Whether this group is a brace-group (`{...}`) rather than a plain expression.
    pub fn is_roll_group(&self) -> bool {
        self.is_roll_group
    }

    /// Whether this group contributes to its parent's total.
    pub fn use_in_total(&self) -> bool {
        self.use_in_total
    }

    /// Set whether this group contributes to its parent's total (used by group-level keep/drop).
    pub fn set_use_in_total(&mut self, use_in_total: bool) {
        self.use_in_total = use_in_total;
    }

    /// The flags attached at the group level.
    pub fn modifiers(&self) -> &[ModifierFlag] {
        &self.modifiers
    }

    /// Attach a group-level flag.
    pub fn add_flag(&mut self, flag: ModifierFlag) {
        if !self.modifiers.contains(&flag) {
            self.modifiers.push(flag);
            self.modifier_flags = crate::flag::flags_glyph_string(&self.modifiers);
        }
    }
}

/// Each element's contribution to the arithmetic sequence: either an operator token, or a
/// numeric value (possibly excluded when the element is a dropped child group).
enum Contribution {
    Operator(String),
    Value(f64),
    Excluded,
}

fn contribution(element: &GroupElement) -> Result<Contribution> {
    Ok(match element {
        GroupElement::Operator(op) => Contribution::Operator(op.clone()),
        GroupElement::Number(n) => Contribution::Value(*n),
        GroupElement::Group(g) => {
            if g.use_in_total() {
                Contribution::Value(g.calculation_value())
            } else {
                Contribution::Excluded
            }
        }
        GroupElement::Rolls(rr) => Contribution::Value(rr.value()),
    })
}

/// Compute a group's value: concatenate child contributions with operators/numbers and
/// arithmetic-evaluate; if no operators are present, sum the contributions.
fn compute_value(results: &[GroupElement]) -> Result<f64> {
    let mut values = Vec::new();
    let mut ops: Vec<Op> = Vec::new();
    let mut has_operator = false;

    for element in results {
        match contribution(element)? {
            Contribution::Operator(tok) => {
                has_operator = true;
                ops.push(Op::parse(&tok)?);
            }
            Contribution::Value(v) => values.push(v),
            Contribution::Excluded => {}
        }
    }

    if values.is_empty() {
        return Ok(0.0);
    }

    if has_operator {
        eval::evaluate_sequence(&values, &ops)
    } else {
        Ok(values.iter().sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_when_no_operators() {
        let rg = ResultGroup::new(
            vec![GroupElement::Number(3.0), GroupElement::Number(4.0)],
            true,
        )
        .unwrap();
        assert_eq!(rg.value(), 7.0);
    }

    #[test]
    fn evaluates_with_precedence_when_operators_present() {
        let rg = ResultGroup::new(
            vec![
                GroupElement::Number(4.0),
                GroupElement::Operator("+".into()),
                GroupElement::Number(2.0),
                GroupElement::Operator("*".into()),
                GroupElement::Number(3.0),
            ],
            false,
        )
        .unwrap();
        assert_eq!(rg.value(), 10.0);
    }

    #[test]
    fn excludes_dropped_sub_groups_from_sum() {
        let mut kept = ResultGroup::new(vec![GroupElement::Number(19.0)], false).unwrap();
        let mut dropped = ResultGroup::new(vec![GroupElement::Number(16.0)], false).unwrap();
        dropped.set_use_in_total(false);
        kept.set_use_in_total(true);
        let rg = ResultGroup::new(
            vec![GroupElement::Group(kept), GroupElement::Group(dropped)],
            true,
        )
        .unwrap();
        assert_eq!(rg.value(), 19.0);
    }
}
