//! The parsed notation tree and the evaluator that walks it.
//!
//! Evaluation is split into two passes: [`eval_expression`] walks the parsed tree substituting
//! rolled values for dice/group factors, and [`crate::results::ResultGroup::new`] arithmetic-
//! evaluates whatever numbers and operators are left, since the latter is already shared with
//! import/export.

use crate::description::{Description, DescriptionType};
use crate::dice::{apply_group_modifier, Die, GroupModifier};
use crate::error::Result;
use crate::eval::MathFn;
use crate::number_generator::NumberGenerator;
use crate::results::{GroupElement, ResultGroup};

/// One factor in an [`Expression`]: a dice roll, a number, a parenthesized sub-expression, a
/// math-function call, or a roll-group, plus whatever description trails it.
#[derive(Debug, Clone)]
pub enum Factor {
    /// A literal number.
    Number(f64),
    /// A die factor (standard, percentile, or fudge), with its own attached modifiers.
    Dice(Die),
    /// `(Expression)`: a parenthesized sub-expression, arithmetic-evaluated on its own.
    Paren(Box<Expression>),
    /// A math-function call over one or two argument expressions.
    Call(MathFn, Vec<Expression>),
    /// `{Expression, Expression, ...}`: a roll-group.
    RollGroup(RollGroupNode),
}

/// A parsed factor plus the first description attached to it, if any.
#[derive(Debug, Clone)]
pub struct FactorNode {
    /// The factor itself.
    pub factor: Factor,
    /// The nearest trailing description, if one was present. Only the first of several
    /// consecutive descriptions is retained.
    pub description: Option<Description>,
}

/// One element of a flat, already-precedence-free expression: either a factor or an operator
/// token between two factors.
#[derive(Debug, Clone)]
pub enum ExprElement {
    /// A parsed factor.
    Factor(FactorNode),
    /// A binary operator token, already canonicalized (`^` -> `**`).
    Operator(String),
}

/// A flat sequence of factors and operators, evaluated by precedence climbing once every dice
/// factor has been substituted with its rolled value.
pub type Expression = Vec<ExprElement>;

/// A parsed roll-group: several sub-expressions, each rolled independently, plus the group-level
/// modifiers attached after the closing brace.
#[derive(Debug, Clone)]
pub struct RollGroupNode {
    /// Each comma-separated sub-expression.
    pub sub_expressions: Vec<Expression>,
    /// Modifiers attached to the group as a whole (keep/drop/sorting only).
    pub modifiers: Vec<GroupModifier>,
}

/// Evaluate a flat expression into a [`ResultGroup`]: roll every dice/roll-group factor, keep
/// numbers and operators as-is, then let [`ResultGroup::new`] arithmetic-evaluate the result.
pub fn eval_expression(expr: &Expression, gen: &mut NumberGenerator) -> Result<ResultGroup> {
    let mut elements = Vec::with_capacity(expr.len());
    for item in expr {
        elements.push(match item {
            ExprElement::Operator(tok) => GroupElement::Operator(tok.clone()),
            ExprElement::Factor(node) => eval_factor(node, gen)?,
        });
    }
    ResultGroup::new(elements, false)
}

fn eval_factor(node: &FactorNode, gen: &mut NumberGenerator) -> Result<GroupElement> {
    Ok(match &node.factor {
        Factor::Number(n) => GroupElement::Number(*n),
        Factor::Dice(die) => GroupElement::Rolls(die.roll(gen)?),
        Factor::Paren(inner) => GroupElement::Group(eval_expression(inner, gen)?),
        Factor::Call(f, args) => {
            let mut values = Vec::with_capacity(args.len());
            for a in args {
                values.push(eval_expression(a, gen)?.value());
            }
            GroupElement::Number(f.apply(&values)?)
        }
        Factor::RollGroup(rg) => GroupElement::Group(eval_roll_group(rg, gen)?),
    })
}

/// Roll each sub-expression of a roll-group independently, apply the group's own modifiers over
/// the resulting sub-groups, then wrap them in one `isRollGroup=true` group.
fn eval_roll_group(rg: &RollGroupNode, gen: &mut NumberGenerator) -> Result<ResultGroup> {
    let mut sub_groups = Vec::with_capacity(rg.sub_expressions.len());
    for sub in &rg.sub_expressions {
        sub_groups.push(eval_expression(sub, gen)?);
    }
    for modifier in &rg.modifiers {
        apply_group_modifier(&mut sub_groups, modifier);
    }
    let elements = sub_groups.into_iter().map(GroupElement::Group).collect();
    ResultGroup::new(elements, true)
}

/// Reconstruct the notation text for a flat expression.
pub fn render_expression(expr: &Expression) -> String {
    let mut s = String::new();
    for item in expr {
        match item {
            ExprElement::Operator(tok) => s.push_str(tok),
            ExprElement::Factor(node) => s.push_str(&render_factor(node)),
        }
    }
    s
}

fn render_factor(node: &FactorNode) -> String {
    let mut s = match &node.factor {
        Factor::Number(n) => crate::eval::format_number(*n),
        Factor::Dice(die) => die.notation(),
        Factor::Paren(inner) => format!("({})", render_expression(inner)),
        Factor::Call(f, args) => {
            let rendered: Vec<String> = args.iter().map(|a| render_expression(a)).collect();
            format!("{}({})", f.name(), rendered.join(","))
        }
        Factor::RollGroup(rg) => render_roll_group(rg),
    };
    if let Some(desc) = &node.description {
        s.push_str(&render_description(desc));
    }
    s
}

fn render_roll_group(rg: &RollGroupNode) -> String {
    let subs: Vec<String> = rg.sub_expressions.iter().map(|s| render_expression(s)).collect();
    let mut s = format!("{{{}}}", subs.join(", "));
    for m in &rg.modifiers {
        s.push_str(&m.notation());
    }
    s
}

fn render_description(desc: &Description) -> String {
    match desc.kind() {
        DescriptionType::Inline => format!(" // {}", desc.text()),
        DescriptionType::Multiline => format!(" [{}]", desc.text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::StandardDie;
    use crate::number_generator::NumberGenerator;

    #[test]
    fn evaluates_flat_arithmetic_with_dice() {
        let expr: Expression = vec![
            ExprElement::Factor(FactorNode {
                factor: Factor::Dice(Die::Standard(StandardDie::new(2, 6).unwrap())),
                description: None,
            }),
            ExprElement::Operator("+".into()),
            ExprElement::Factor(FactorNode {
                factor: Factor::Number(4.0),
                description: None,
            }),
        ];
        let mut gen = NumberGenerator::max_engine();
        let rg = eval_expression(&expr, &mut gen).unwrap();
        assert_eq!(rg.value(), 16.0);
    }

    #[test]
    fn roll_group_keeps_highest_sub_expression() {
        let sub_a: Expression = vec![
            ExprElement::Factor(FactorNode {
                factor: Factor::Dice(Die::Standard(StandardDie::new(4, 6).unwrap())),
                description: None,
            }),
            ExprElement::Operator("+".into()),
            ExprElement::Factor(FactorNode {
                factor: Factor::Number(4.0),
                description: None,
            }),
        ];
        let sub_b: Expression = vec![ExprElement::Factor(FactorNode {
            factor: Factor::Dice(Die::Standard(StandardDie::new(2, 10).unwrap())),
            description: None,
        })];
        let rg_node = RollGroupNode {
            sub_expressions: vec![sub_a, sub_b],
            modifiers: vec![GroupModifier::Keep {
                end: crate::modifiers::End::High,
                qty: 1,
            }],
        };
        let mut gen = NumberGenerator::max_engine();
        let result = eval_roll_group(&rg_node, &mut gen).unwrap();
        // 4d6+4 = 28, 2d10 = 20 with max-engine; keep-highest-1 keeps the 28.
        assert_eq!(result.value(), 28.0);
    }
}
