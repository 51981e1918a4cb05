const ALPHABET: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

/// Bijective base-26 numeral used as a disambiguation suffix.
///
/// `-1` encodes to the empty string, `0` to `"a"`, `25` to `"z"`, `26` to
/// `"aa"` and so on. There is no zero symbol, so every counter value maps to a
/// distinct string and shorter strings always come first.
///
/// # Panics
///
/// Panics when `n < -1`. Counters start at `-1` and only grow, so a smaller
/// value is a bug in the caller.
pub fn encode_letters(n: i64) -> String {
    assert!(n >= -1, "letter counter must be >= -1, got {n}");

    let mut out = Vec::new();
    let mut n = n;
    while n >= 0 {
        out.push(ALPHABET[(n % 26) as usize] as char);
        n = n / 26 - 1;
    }
    out.iter().rev().collect()
}

/// Inverse of [`encode_letters`]. Returns `None` for anything outside `a..=z`.
pub fn decode_letters(value: &str) -> Option<i64> {
    let mut n = 0i64;
    for ch in value.chars() {
        if !ch.is_ascii_lowercase() {
            return None;
        }
        let digit = i64::from(ch as u8 - b'a') + 1;
        n = n.checked_mul(26)?.checked_add(digit)?;
    }
    Some(n - 1)
}
