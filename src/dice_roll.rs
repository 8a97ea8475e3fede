//! Binds a notation string to one evaluation and its totals.
//!
//! `DiceRoll` is the single public entry point most callers reach for. `min_total`/`max_total`
//! are computed by re-evaluating the same parsed expression with the number generator's engine
//! swapped at the call site — no global state to mutate or restore.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::ast::{self, Expression};
use crate::error::Result;
use crate::eval;
use crate::flag::flags_glyph_string;
use crate::number_generator::NumberGenerator;
use crate::parser;
use crate::results::{GroupElement, ResultGroup, RollResults};

/// One evaluated notation: its parsed form, the actual rolled result tree, and the totals
/// derived from it.
#[derive(Debug, Clone)]
pub struct DiceRoll {
    notation: String,
    expr: Expression,
    rolls: ResultGroup,
    total: f64,
    min_total: f64,
    max_total: f64,
    average_total: f64,
}

impl DiceRoll {
    /// Parse and roll `notation` using the platform-default engine.
    pub fn new(notation: &str) -> Result<Self> {
        Self::roll_with(notation, &mut NumberGenerator::default_engine())
    }

    /// Parse and roll `notation` using the given generator.
    pub fn roll_with(notation: &str, gen: &mut NumberGenerator) -> Result<Self> {
        let expr = parser::parse(notation)?;
        let rolls = ast::eval_expression(&expr, gen)?;
        Self::from_parts(notation.to_string(), expr, rolls)
    }

    fn from_parts(notation: String, expr: Expression, rolls: ResultGroup) -> Result<Self> {
        let total = eval::round2(rolls.value());
        let min_total = eval::round2(ast::eval_expression(&expr, &mut NumberGenerator::min_engine())?.value());
        let max_total = eval::round2(ast::eval_expression(&expr, &mut NumberGenerator::max_engine())?.value());
        let average_total = eval::round2((min_total + max_total) / 2.0);
        Ok(DiceRoll {
            notation,
            expr,
            rolls,
            total,
            min_total,
            max_total,
            average_total,
        })
    }

    /// The original notation string.
    pub fn notation(&self) -> &str {
        &self.notation
    }

    /// The actual rolled result tree.
    pub fn rolls(&self) -> &ResultGroup {
        &self.rolls
    }

    /// The actual total: `rolls.value()` rounded to 2 decimal places.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// The lowest total this notation could produce.
    pub fn min_total(&self) -> f64 {
        self.min_total
    }

    /// The highest total this notation could produce.
    pub fn max_total(&self) -> f64 {
        self.max_total
    }

    /// The midpoint of `min_total` and `max_total`.
    pub fn average_total(&self) -> f64 {
        self.average_total
    }

    /// Render the human-readable `notation: results = total` form.
    pub fn output(&self) -> String {
        format!(
            "{}: {} = {}",
            self.notation,
            render_result_group(&self.rolls),
            eval::format_number(self.total)
        )
    }

    /// Serialize this roll to the documented `{notation, output, total, ..., rolls, type}` JSON
    /// shape.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.wire())?)
    }

    fn wire(&self) -> DiceRollWire {
        DiceRollWire {
            notation: self.notation.clone(),
            output: self.output(),
            total: self.total,
            min_total: self.min_total,
            max_total: self.max_total,
            average_total: self.average_total,
            rolls: self.rolls.clone(),
            kind: DiceRollKind::DiceRoll,
        }
    }

    /// Export `{notation, rolls}` as a JSON string, suitable for [`DiceRoll::import`].
    pub fn export(&self) -> Result<String> {
        let payload = ImportPayload {
            notation: self.notation.clone(),
            rolls: Some(self.rolls.clone()),
        };
        Ok(serde_json::to_string(&payload)?)
    }

    /// Export the same payload as [`DiceRoll::export`], base64-encoded.
    pub fn export_base64(&self) -> Result<String> {
        Ok(BASE64.encode(self.export()?))
    }

    /// Reconstruct a [`DiceRoll`] from a previously exported payload.
    ///
    /// Accepts a JSON string, or a base64 string wrapping one. When the payload carries `rolls`,
    /// the notation is not re-rolled: the result tree and total come straight from the payload.
    /// Without `rolls`, this behaves like [`DiceRoll::new`] for the given notation. Unrecognized
    /// shapes fail with [`crate::error::Error::DataFormat`].
    pub fn import(input: &str) -> Result<Self> {
        let payload = match serde_json::from_str::<ImportPayload>(input) {
            Ok(payload) => payload,
            Err(_) => {
                let decoded = BASE64.decode(input.trim()).map_err(|_| {
                    crate::error::Error::DataFormat("not JSON or base64-encoded JSON".into())
                })?;
                let text = String::from_utf8(decoded).map_err(|_| {
                    crate::error::Error::DataFormat("base64 payload is not valid UTF-8".into())
                })?;
                serde_json::from_str(&text)?
            }
        };
        Self::from_payload(payload)
    }

    fn from_payload(payload: ImportPayload) -> Result<Self> {
        let expr = parser::parse(&payload.notation)?;
        match payload.rolls {
            Some(rolls) => Self::from_parts(payload.notation, expr, rolls),
            None => Self::roll_with(&payload.notation, &mut NumberGenerator::default_engine()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ImportPayload {
    notation: String,
    #[serde(default)]
    rolls: Option<ResultGroup>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum DiceRollKind {
    DiceRoll,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiceRollWire {
    notation: String,
    output: String,
    total: f64,
    min_total: f64,
    max_total: f64,
    average_total: f64,
    rolls: ResultGroup,
    #[serde(rename = "type")]
    kind: DiceRollKind,
}

fn render_result_group(rg: &ResultGroup) -> String {
    let inner = if rg.is_roll_group() {
        let parts: Vec<String> = rg
            .results()
            .iter()
            .map(|e| match e {
                GroupElement::Group(g) => render_result_group(g),
                other => render_group_element(other),
            })
            .collect();
        format!("{{{}}}", parts.join(", "))
    } else {
        rg.results().iter().map(render_group_element).collect::<String>()
    };
    if rg.modifiers().is_empty() {
        inner
    } else {
        format!("({}){}", inner, flags_glyph_string(rg.modifiers()))
    }
}

fn render_group_element(e: &GroupElement) -> String {
    match e {
        GroupElement::Operator(s) => s.clone(),
        GroupElement::Number(n) => eval::format_number(*n),
        GroupElement::Group(g) => render_result_group(g),
        GroupElement::Rolls(rr) => render_roll_results(rr),
    }
}

fn render_roll_results(rr: &RollResults) -> String {
    let parts: Vec<String> = rr
        .rolls()
        .iter()
        .map(|r| format!("{}{}", eval::format_number(r.value()), flags_glyph_string(r.modifiers())))
        .collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_standard_die_output() {
        let mut gen = NumberGenerator::max_engine();
        let roll = DiceRoll::roll_with("4d6", &mut gen).unwrap();
        assert_eq!(roll.total(), 24.0);
        assert_eq!(roll.output(), "4d6: [6, 6, 6, 6] = 24");
    }

    #[test]
    fn min_max_bracket_the_actual_total() {
        let roll = DiceRoll::new("4d6").unwrap();
        assert!(roll.min_total() <= roll.total());
        assert!(roll.total() <= roll.max_total());
        assert_eq!(roll.min_total(), 4.0);
        assert_eq!(roll.max_total(), 24.0);
    }

    #[test]
    fn export_then_import_round_trips_total_without_rerolling() {
        let mut gen = NumberGenerator::max_engine();
        let roll = DiceRoll::roll_with("4d6kh2", &mut gen).unwrap();
        let exported = roll.export().unwrap();
        let imported = DiceRoll::import(&exported).unwrap();
        assert_eq!(imported.total(), roll.total());
        assert_eq!(imported.notation(), roll.notation());
    }

    #[test]
    fn export_base64_then_import_round_trips() {
        let mut gen = NumberGenerator::max_engine();
        let roll = DiceRoll::roll_with("2d10", &mut gen).unwrap();
        let exported = roll.export_base64().unwrap();
        let imported = DiceRoll::import(&exported).unwrap();
        assert_eq!(imported.total(), roll.total());
    }

    #[test]
    fn import_rejects_garbage() {
        assert!(matches!(
            DiceRoll::import("not json or base64 at all!!"),
            Err(crate::error::Error::DataFormat(_))
        ));
    }
}
