//! Notation -> AST.
//!
//! A `pest`-derived grammar (`grammar.pest`) plus a set of `build_*` functions that walk the
//! resulting `Pairs` tree once into the crate's own AST (`crate::ast`), evaluating any
//! parenthesized pure-arithmetic quantity/sides expression eagerly, since dice counts and sides
//! must be known before a die can be constructed.

use pest::iterators::Pair;
use pest::Parser as PestParser;
use pest_derive::Parser;

use crate::ast::{Expression, ExprElement, Factor, FactorNode, RollGroupNode};
use crate::compare_point::{ComparePoint, CompareOperator};
use crate::description::{Description, DescriptionType};
use crate::dice::{Die, FudgeDie, GroupModifier, PercentileDie, StandardDie};
use crate::error::{Error, Result};
use crate::eval::{self, MathFn, Op};
use crate::modifiers::{End, Modifier, SortDirection};

#[derive(Parser)]
#[grammar = "parser/grammar.pest"]
pub(crate) struct RollParser;

/// Parse a notation string into a flat top-level [`Expression`].
///
/// Fails with [`Error::MissingArgument`] on an empty string, or [`Error::SyntaxError`] (carrying
/// position and expected-token information) when the notation does not match the grammar.
pub fn parse(notation: &str) -> Result<Expression> {
    if notation.is_empty() {
        return Err(Error::MissingArgument("notation".into()));
    }
    let mut pairs = RollParser::parse(Rule::main, notation)?;
    let main_pair = pairs.next().expect("main always produces one pair");
    let expr_pair = main_pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::expression)
        .expect("main always contains an expression");
    build_expression(expr_pair)
}

fn build_expression(pair: Pair<Rule>) -> Result<Expression> {
    let mut elements = Vec::new();
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::factor => elements.push(ExprElement::Factor(build_factor(p)?)),
            Rule::op => {
                let canon = Op::parse(p.as_str())?.notation().to_string();
                elements.push(ExprElement::Operator(canon));
            }
            other => unreachable!("unexpected rule in expression: {:?}", other),
        }
    }
    Ok(elements)
}

fn build_factor(pair: Pair<Rule>) -> Result<FactorNode> {
    let inner = pair.into_inner().next().expect("factor always has one child");
    match inner.as_rule() {
        Rule::math_call => build_math_call(inner),
        Rule::dice => build_dice(inner),
        Rule::roll_group => build_roll_group(inner),
        Rule::paren_expr => {
            let expr_pair = inner
                .into_inner()
                .next()
                .expect("paren_expr always wraps an expression");
            let expr = build_expression(expr_pair)?;
            Ok(FactorNode {
                factor: Factor::Paren(Box::new(expr)),
                description: None,
            })
        }
        Rule::number => {
            let n = parse_number(inner.as_str())?;
            Ok(FactorNode {
                factor: Factor::Number(n),
                description: None,
            })
        }
        other => unreachable!("unexpected factor child: {:?}", other),
    }
}

fn build_math_call(pair: Pair<Rule>) -> Result<FactorNode> {
    let inner = pair.into_inner().next().expect("math_call always has one child");
    let factor = match inner.as_rule() {
        Rule::unary_call => {
            let mut it = inner.into_inner();
            let fn_pair = it.next().expect("unary_call always names a function");
            let expr_pair = it.next().expect("unary_call always has an argument");
            let f = math_fn(fn_pair.as_str())?;
            Factor::Call(f, vec![build_expression(expr_pair)?])
        }
        Rule::binary_call => {
            let mut it = inner.into_inner();
            let fn_pair = it.next().expect("binary_call always names a function");
            let a = build_expression(it.next().expect("binary_call has a first argument"))?;
            let b = build_expression(it.next().expect("binary_call has a second argument"))?;
            let f = math_fn(fn_pair.as_str())?;
            Factor::Call(f, vec![a, b])
        }
        other => unreachable!("unexpected math_call child: {:?}", other),
    };
    Ok(FactorNode {
        factor,
        description: None,
    })
}

fn math_fn(name: &str) -> Result<MathFn> {
    MathFn::parse(name).ok_or_else(|| Error::InvalidOperator(name.to_string()))
}

fn build_dice(pair: Pair<Rule>) -> Result<FactorNode> {
    let mut it = pair.into_inner();
    let body = it.next().expect("dice always has a body");
    let die_inner = body.into_inner().next().expect("dice_body always has one child");
    let mut die = build_die_body(die_inner)?;
    let mut description = None;
    for p in it {
        match p.as_rule() {
            Rule::modifier => die.add_modifier(build_modifier(p)?),
            Rule::description => description = Some(build_description(p)?),
            other => unreachable!("unexpected dice trailer: {:?}", other),
        }
    }
    Ok(FactorNode {
        factor: Factor::Dice(die),
        description,
    })
}

fn build_die_body(pair: Pair<Rule>) -> Result<Die> {
    match pair.as_rule() {
        Rule::standard_die => {
            let mut it = pair.into_inner().peekable();
            let qty_pair = if it.peek().map(|p| p.as_rule()) == Some(Rule::qty_expr) {
                it.next()
            } else {
                None
            };
            let sides_pair = it.next().expect("standard_die always has sides");
            let qty = eval_qty_expr(qty_pair)?;
            let sides = eval_sides_expr(sides_pair)?;
            Ok(Die::Standard(StandardDie::new(qty, sides)?))
        }
        Rule::percentile_die => {
            let qty_pair = pair.into_inner().next();
            let qty = eval_qty_expr(qty_pair)?;
            Ok(Die::Percentile(PercentileDie::new(qty)?))
        }
        Rule::fudge_die => {
            let mut it = pair.into_inner().peekable();
            let qty_pair = if it.peek().map(|p| p.as_rule()) == Some(Rule::qty_expr) {
                it.next()
            } else {
                None
            };
            let qty = eval_qty_expr(qty_pair)?;
            let non_blanks = match it.next() {
                Some(fs) => fs.as_str().chars().last().unwrap().to_digit(10).unwrap() as u8,
                None => 2,
            };
            Ok(Die::Fudge(FudgeDie::new(qty, non_blanks)?))
        }
        other => unreachable!("unexpected dice_body child: {:?}", other),
    }
}

fn eval_qty_expr(pair: Option<Pair<Rule>>) -> Result<u32> {
    match pair {
        None => Ok(1),
        Some(p) => {
            let inner = p.into_inner().next().expect("qty_expr always has one child");
            match inner.as_rule() {
                Rule::qty => inner
                    .as_str()
                    .parse()
                    .map_err(|_| Error::InvalidArgument(format!("dice quantity {:?}", inner.as_str()))),
                Rule::arith_expr => Ok(eval_arith_expr(inner)? as u32),
                other => unreachable!("unexpected qty_expr child: {:?}", other),
            }
        }
    }
}

fn eval_sides_expr(pair: Pair<Rule>) -> Result<u64> {
    let inner = pair.into_inner().next().expect("sides_expr always has one child");
    match inner.as_rule() {
        Rule::sides => inner
            .as_str()
            .parse()
            .map_err(|_| Error::InvalidArgument(format!("dice sides {:?}", inner.as_str()))),
        Rule::arith_expr => Ok(eval_arith_expr(inner)? as u64),
        other => unreachable!("unexpected sides_expr child: {:?}", other),
    }
}

fn eval_arith_expr(pair: Pair<Rule>) -> Result<f64> {
    let mut values = Vec::new();
    let mut ops = Vec::new();
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::arith_factor => values.push(eval_arith_factor(p)?),
            Rule::op => ops.push(Op::parse(p.as_str())?),
            other => unreachable!("unexpected arith_expr child: {:?}", other),
        }
    }
    eval::evaluate_sequence(&values, &ops)
}

fn eval_arith_factor(pair: Pair<Rule>) -> Result<f64> {
    let inner = pair.into_inner().next().expect("arith_factor always has one child");
    match inner.as_rule() {
        Rule::number => parse_number(inner.as_str()),
        Rule::arith_expr => eval_arith_expr(inner),
        other => unreachable!("unexpected arith_factor child: {:?}", other),
    }
}

fn parse_number(s: &str) -> Result<f64> {
    s.parse()
        .map_err(|_| Error::InvalidArgument(format!("{:?} is not a number", s)))
}

fn build_roll_group(pair: Pair<Rule>) -> Result<FactorNode> {
    let mut sub_expressions = Vec::new();
    let mut modifiers = Vec::new();
    let mut description = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::expression => sub_expressions.push(build_expression(p)?),
            Rule::modifier => modifiers.push(GroupModifier::from_modifier(build_modifier(p)?)?),
            Rule::description => description = Some(build_description(p)?),
            other => unreachable!("unexpected roll_group child: {:?}", other),
        }
    }
    Ok(FactorNode {
        factor: Factor::RollGroup(RollGroupNode {
            sub_expressions,
            modifiers,
        }),
        description,
    })
}

fn build_modifier(pair: Pair<Rule>) -> Result<Modifier> {
    let inner = pair.into_inner().next().expect("modifier always has one child");
    match inner.as_rule() {
        Rule::explode_mod => {
            let mut compound = false;
            let mut penetrate = false;
            let mut compare_point = None;
            for p in inner.into_inner() {
                match p.as_rule() {
                    Rule::compound_flag => compound = true,
                    Rule::penetrate_flag => penetrate = true,
                    Rule::compare_point => compare_point = Some(build_compare_point(p)?),
                    other => unreachable!("unexpected explode_mod child: {:?}", other),
                }
            }
            Ok(Modifier::Explode {
                compare_point,
                compound,
                penetrate,
            })
        }
        Rule::reroll_mod => {
            let mut once = false;
            let mut compare_point = None;
            for p in inner.into_inner() {
                match p.as_rule() {
                    Rule::once_flag => once = true,
                    Rule::compare_point => compare_point = Some(build_compare_point(p)?),
                    other => unreachable!("unexpected reroll_mod child: {:?}", other),
                }
            }
            Ok(Modifier::ReRoll { compare_point, once })
        }
        Rule::unique_mod => {
            let mut once = false;
            let mut compare_point = None;
            for p in inner.into_inner() {
                match p.as_rule() {
                    Rule::once_flag => once = true,
                    Rule::compare_point => compare_point = Some(build_compare_point(p)?),
                    other => unreachable!("unexpected unique_mod child: {:?}", other),
                }
            }
            Ok(Modifier::Unique { compare_point, once })
        }
        Rule::keep_mod => {
            let mut it = inner.into_inner();
            let end = build_end(it.next().expect("keep_mod always has an end"))?;
            let qty = parse_qty(it.next().expect("keep_mod always has a qty"))?;
            Ok(Modifier::Keep { end, qty })
        }
        Rule::drop_mod => {
            let mut it = inner.into_inner();
            let end = build_end(it.next().expect("drop_mod always has an end"))?;
            let qty = parse_qty(it.next().expect("drop_mod always has a qty"))?;
            Ok(Modifier::Drop { end, qty })
        }
        Rule::crit_success_mod => {
            let compare_point = inner
                .into_inner()
                .next()
                .map(build_compare_point)
                .transpose()?;
            Ok(Modifier::CriticalSuccess { compare_point })
        }
        Rule::crit_fail_mod => {
            let compare_point = inner
                .into_inner()
                .next()
                .map(build_compare_point)
                .transpose()?;
            Ok(Modifier::CriticalFailure { compare_point })
        }
        Rule::sorting_mod => {
            let letter = inner.into_inner().next().expect("sorting_mod always has a direction");
            Ok(Modifier::Sorting {
                direction: SortDirection::parse(letter.as_str())?,
            })
        }
        Rule::max_mod => {
            let n = inner.into_inner().next().expect("max_mod always has a number");
            Ok(Modifier::Max(parse_number(n.as_str())?))
        }
        Rule::min_mod => {
            let n = inner.into_inner().next().expect("min_mod always has a number");
            Ok(Modifier::Min(parse_number(n.as_str())?))
        }
        Rule::target_mod => {
            let mut it = inner.into_inner();
            let success = build_compare_point(it.next().expect("target_mod always has a success CP"))?;
            let failure = it.next().map(build_compare_point).transpose()?;
            Ok(Modifier::Target { success, failure })
        }
        other => unreachable!("unexpected modifier child: {:?}", other),
    }
}

fn build_end(pair: Pair<Rule>) -> Result<End> {
    End::parse(pair.as_str())
}

fn parse_qty(pair: Pair<Rule>) -> Result<usize> {
    let qty: usize = pair
        .as_str()
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("keep/drop quantity {:?}", pair.as_str())))?;
    if qty == 0 {
        return Err(Error::OutOfRange("keep/drop quantity must be positive".into()));
    }
    Ok(qty)
}

fn build_compare_point(pair: Pair<Rule>) -> Result<ComparePoint> {
    let mut it = pair.into_inner();
    let op = it.next().expect("compare_point always has an operator");
    let value = it.next().expect("compare_point always has a value");
    ComparePoint::new(CompareOperator::parse(op.as_str())?, parse_number(value.as_str())?)
}

fn build_description(pair: Pair<Rule>) -> Result<Description> {
    // Multiple description forms may appear back to back; only the first is retained.
    let first = pair
        .into_inner()
        .next()
        .expect("description always has at least one form");
    let (text_pair, kind) = match first.as_rule() {
        Rule::desc_inline => (
            first
                .into_inner()
                .next()
                .expect("desc_inline always captures text"),
            DescriptionType::Inline,
        ),
        Rule::desc_multiline => (
            first
                .into_inner()
                .next()
                .expect("desc_multiline always captures text"),
            DescriptionType::Multiline,
        ),
        Rule::desc_bracket => (
            first
                .into_inner()
                .next()
                .expect("desc_bracket always captures text"),
            DescriptionType::Multiline,
        ),
        other => unreachable!("unexpected description child: {:?}", other),
    };
    Description::new(text_pair.as_str().trim(), kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number_generator::NumberGenerator;

    #[test]
    fn rejects_empty_notation() {
        assert!(matches!(parse(""), Err(Error::MissingArgument(_))));
    }

    #[test]
    fn parses_simple_standard_die() {
        let expr = parse("4d6").unwrap();
        assert_eq!(expr.len(), 1);
        let mut gen = NumberGenerator::max_engine();
        let rg = crate::ast::eval_expression(&expr, &mut gen).unwrap();
        assert_eq!(rg.value(), 24.0);
    }

    #[test]
    fn parses_percentile_and_fudge() {
        let mut gen = NumberGenerator::max_engine();
        let p = parse("2d%").unwrap();
        assert_eq!(crate::ast::eval_expression(&p, &mut gen).unwrap().value(), 200.0);

        let mut gen = NumberGenerator::max_engine();
        let f = parse("3dF").unwrap();
        assert_eq!(crate::ast::eval_expression(&f, &mut gen).unwrap().value(), 3.0);
    }

    #[test]
    fn parses_arithmetic_with_parens_and_functions() {
        let expr = parse("2d6 + floor(3.7)").unwrap();
        let mut gen = NumberGenerator::max_engine();
        let rg = crate::ast::eval_expression(&expr, &mut gen).unwrap();
        assert_eq!(rg.value(), 15.0);
    }

    #[test]
    fn parses_roll_group_with_keep() {
        let expr = parse("{4d6+4, 2d10}kh1").unwrap();
        assert_eq!(expr.len(), 1);
    }

    #[test]
    fn parses_target_and_critical_modifiers() {
        let expr = parse("2d20cs>=18").unwrap();
        assert_eq!(expr.len(), 1);
        let expr = parse("4d6>4").unwrap();
        assert_eq!(expr.len(), 1);
    }

    #[test]
    fn syntax_error_reports_position() {
        assert!(matches!(parse("4d"), Err(Error::SyntaxError(_))));
    }

    #[test]
    fn keep_drop_quantity_of_zero_is_out_of_range() {
        assert!(matches!(parse("4d6kh0"), Err(Error::OutOfRange(_))));
        assert!(matches!(parse("4d6dl0"), Err(Error::OutOfRange(_))));
    }
}
