//! Surname phonetic coding.
//!
//! American Soundex with the H/W transparency rule: consonants with the same
//! class separated by `h` or `w` collapse into one digit, while a vowel
//! between them keeps both. Codes are letter + three digits, zero-padded.
//!
//! The coder is ASCII-focused. Cyrillic and other non-Latin names are
//! expected to arrive with transliterated variants from upstream
//! normalization; input with no ASCII letters yields no code, and callers
//! treat that as "no phonetic key" rather than an error.

use serde::{Deserialize, Serialize};

/// A 4-character Soundex code, e.g. `P361` for "Petrov".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneticCode(String);

impl PhoneticCode {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Soundex digit class for a letter, `None` for vowels, `h`, `w`, and `y`.
fn digit_class(c: char) -> Option<u8> {
    match c {
        'B' | 'F' | 'P' | 'V' => Some(1),
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => Some(2),
        'D' | 'T' => Some(3),
        'L' => Some(4),
        'M' | 'N' => Some(5),
        'R' => Some(6),
        _ => None,
    }
}

/// Computes the Soundex code of a name.
///
/// Returns `None` when the input contains no ASCII letters.
pub fn soundex(name: &str) -> Option<PhoneticCode> {
    let mut letters = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase());

    let first = letters.next()?;
    let mut code = String::with_capacity(4);
    code.push(first);

    // The first letter's class still suppresses an immediately following
    // same-class consonant (Pfister -> P236, not P136).
    let mut last_class = digit_class(first);

    for c in letters {
        if code.len() == 4 {
            break;
        }
        match digit_class(c) {
            Some(class) => {
                if last_class != Some(class) {
                    code.push((b'0' + class) as char);
                }
                last_class = Some(class);
            }
            None => {
                // h and w are transparent; vowels reset adjacency.
                if c != 'H' && c != 'W' {
                    last_class = None;
                }
            }
        }
    }

    while code.len() < 4 {
        code.push('0');
    }

    Some(PhoneticCode(code))
}

/// Whether two names share a phonetic code.
///
/// False when either side yields no code.
pub fn phonetic_eq(a: &str, b: &str) -> bool {
    match (soundex(a), soundex(b)) {
        (Some(ca), Some(cb)) => ca == cb,
        _ => false,
    }
}
