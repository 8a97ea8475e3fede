//! End-to-end notation-to-total scenarios, each driving the evaluator with a fixed sequence of
//! "dice faces" instead of real randomness via a small deterministic test engine.

use std::collections::VecDeque;

use dicealg::number_generator::{Engine, NumberGenerator, Range};
use dicealg::DiceRoll;

struct SequenceEngine {
    values: VecDeque<i64>,
    min: i64,
}

impl SequenceEngine {
    fn new(values: impl IntoIterator<Item = i64>) -> Self {
        SequenceEngine {
            values: values.into_iter().collect(),
            min: 0,
        }
    }
}

impl Engine for SequenceEngine {
    fn next(&mut self) -> u64 {
        let target = self
            .values
            .pop_front()
            .expect("scenario consumed more rolls than it provided");
        (target - self.min) as u64
    }

    fn set_range(&mut self, range: Range) {
        self.min = range.min;
    }
}

fn gen(values: impl IntoIterator<Item = i64>) -> NumberGenerator {
    NumberGenerator::new(Box::new(SequenceEngine::new(values)))
}

#[test]
fn four_d6_sums_plain_total() {
    let mut g = NumberGenerator::max_engine();
    let roll = DiceRoll::roll_with("4d6", &mut g).unwrap();
    assert_eq!(roll.total(), 24.0);
    assert_eq!(roll.output(), "4d6: [6, 6, 6, 6] = 24");
}

#[test]
fn explode_chains_append_and_total_includes_every_sub_roll() {
    let mut g = gen([6, 3, 6, 1, 4, 2]);
    let roll = DiceRoll::roll_with("4d6!", &mut g).unwrap();
    assert_eq!(roll.total(), 22.0);
}

#[test]
fn keep_highest_two_of_four_drops_the_rest() {
    let mut g = gen([1, 5, 2, 6]);
    let roll = DiceRoll::roll_with("4d6kh2", &mut g).unwrap();
    assert_eq!(roll.total(), 11.0);
}

#[test]
fn critical_success_flags_without_changing_total() {
    let mut g = gen([20, 17]);
    let roll = DiceRoll::roll_with("2d20cs>=18", &mut g).unwrap();
    assert_eq!(roll.total(), 37.0);
    let first = &roll.rolls().results()[0];
    if let dicealg::GroupElement::Rolls(rr) = first {
        assert!(rr.rolls()[0].has_flag(dicealg::ModifierFlag::CriticalSuccess));
    } else {
        panic!("expected a Rolls element");
    }
}

#[test]
fn bare_compare_point_infers_target_modifier() {
    let mut g = gen([6, 3, 5, 4]);
    let roll = DiceRoll::roll_with("4d6>4", &mut g).unwrap();
    assert_eq!(roll.total(), 2.0);
}

#[test]
fn roll_group_keep_retains_higher_sub_expression_sum() {
    let mut g = gen([3, 3, 3, 3, 9, 10]);
    let roll = DiceRoll::roll_with("{4d6+4, 2d10}kh1", &mut g).unwrap();
    assert_eq!(roll.total(), 19.0);
}

#[test]
fn math_function_participates_in_arithmetic() {
    let mut g = gen([4, 5]);
    let roll = DiceRoll::roll_with("2d6 + floor(3.7)", &mut g).unwrap();
    assert_eq!(roll.total(), 12.0);
}

#[test]
fn reroll_once_replaces_value_but_not_initial_value() {
    let mut g = gen([1, 4]);
    let roll = DiceRoll::roll_with("1d6ro<2", &mut g).unwrap();
    assert_eq!(roll.total(), 4.0);
    if let dicealg::GroupElement::Rolls(rr) = &roll.rolls().results()[0] {
        assert_eq!(rr.rolls()[0].initial_value(), 1.0);
        assert_eq!(rr.rolls()[0].value(), 4.0);
        assert!(rr.rolls()[0].has_flag(dicealg::ModifierFlag::ReRollOnce));
    } else {
        panic!("expected a Rolls element");
    }
}

#[test]
fn min_total_and_max_total_bracket_every_actual_roll() {
    let mut g = gen([1, 5, 2, 6]);
    let roll = DiceRoll::roll_with("4d6kh2", &mut g).unwrap();
    assert!(roll.min_total() <= roll.total());
    assert!(roll.total() <= roll.max_total());
}

#[test]
fn export_import_round_trip_preserves_total_and_notation() {
    let mut g = gen([6, 3, 5, 4]);
    let roll = DiceRoll::roll_with("4d6>4", &mut g).unwrap();
    let imported = DiceRoll::import(&roll.export().unwrap()).unwrap();
    assert_eq!(imported.total(), roll.total());
    assert_eq!(imported.notation(), roll.notation());
}
