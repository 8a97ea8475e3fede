//! Roll a handful of notations and print their output strings.

use dicealg::DiceRoll;

fn main() {
    let notations = ["4d6kh3 + 2", "{4d6+4, 2d10}kh1", "2d20cs>=18", "1d6ro<2"];

    for notation in notations {
        match DiceRoll::new(notation) {
            Ok(roll) => println!("{}", roll.output()),
            Err(e) => eprintln!("{notation}: {e}"),
        }
    }
}
