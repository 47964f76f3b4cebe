//! The whitespace set used by the whitespace-removal pass.
//!
//! This is the ECMAScript `WhiteSpace` + `LineTerminator` set, plus U+180E
//! (MONGOLIAN VOWEL SEPARATOR). It is not `char::is_whitespace`: that one
//! accepts U+0085 and rejects U+180E and U+FEFF.

/// Returns `true` for a member of the whitespace set.
pub fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}'..='\u{000D}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{180E}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// Returns `true` when `value` has at least one character and every
/// character is in the whitespace set. The empty string is not
/// whitespace-only.
pub fn is_whitespace_only(value: &str) -> bool {
    !value.is_empty() && value.chars().all(is_whitespace)
}
