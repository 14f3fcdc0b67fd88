//! Text normalization used before comparing recited text with verse text.
//! The output is never meant for display.

fn is_kept(c: char) -> bool {
    matches!(c,
        '\u{0621}'..='\u{063A}'
        | '\u{0641}'..='\u{064A}'
        | '\u{0660}'..='\u{0669}'
        | 'a'..='z'
        | 'A'..='Z'
        | '0'..='9'
        | ' ')
}

/// Keeps Arabic base letters, Arabic-Indic digits, ASCII letters and digits and
/// spaces. Diacritics, punctuation and every other code point are dropped.
pub fn normalize(text: &str) -> String {
    text.chars().filter(|&c| is_kept(c)).collect()
}
