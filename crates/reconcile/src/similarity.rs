//! String similarity and phonetic coding.

/// Minimum single-character edits (insert, delete, substitute) between `a` and `b`.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Normalized similarity in `[0, 1]`: `1 - distance / max(len(a), len(b))`.
/// Lengths are in chars. Two empty strings are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a, b) as f64 / max_len as f64
}

/// Soundex digit class for a letter, `None` for anything without a class.
fn soundex_class(c: char) -> Option<char> {
    match c.to_ascii_uppercase() {
        'B' | 'F' | 'P' | 'V' => Some('1'),
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => Some('2'),
        'D' | 'T' => Some('3'),
        'L' => Some('4'),
        'M' | 'N' => Some('5'),
        'R' => Some('6'),
        _ => None,
    }
}

/// Four-character Soundex code: first letter kept, following letters mapped to
/// digit classes, adjacent repeats collapsed (a repeat of the first letter's own
/// class included), padded with `0`. Characters without a class are dropped but
/// separate repeats. Empty input gives an empty code.
pub fn soundex(s: &str) -> String {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut code = String::with_capacity(4);
    code.push(first.to_ascii_uppercase());
    let mut len = 1;

    let mut last = soundex_class(first);
    for c in chars {
        if len == 4 {
            break;
        }
        let class = soundex_class(c);
        if let Some(digit) = class {
            if class != last {
                code.push(digit);
                len += 1;
            }
        }
        last = class;
    }

    for _ in len..4 {
        code.push('0');
    }
    code
}
