//! Scaffold art for each error count.

/// One drawing per error count, 0 through 9 (a game is lost when the
/// count first exceeds 8, so stage 9 is the complete hangman).
const STAGES: [&str; 10] = [
    r"




_________
",
    r"

 |
 |
 |
_|_______
",
    r"  ____
 |
 |
 |
_|_______
",
    r"  ____
 |/
 |
 |
_|_______
",
    r"  ____
 |/  |
 |
 |
_|_______
",
    r"  ____
 |/  |
 |   O
 |
_|_______
",
    r"  ____
 |/  |
 |   O
 |   |
_|_______
",
    r"  ____
 |/  |
 |   O
 |  /|
_|_______
",
    r"  ____
 |/  |
 |   O
 |  /|\
_|_______
",
    r"  ____
 |/  |
 |   O
 |  /|\
_|_ / \__
",
];

/// The scaffold for an error count, clamped to the final stage.
pub fn render(error_count: u32) -> &'static str {
    let index = (error_count as usize).min(STAGES.len() - 1);
    STAGES[index]
}
