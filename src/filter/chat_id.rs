//! Chat-id normalization.
//!
//! Supergroups and channels show up as `-1001234567890` (marked), `1001234567890`
//! (sign lost somewhere along the way) or `1234567890` (bare), and small groups as
//! `-1234567890`.  Configuration data uses all of these interchangeably, so both
//! sides are expanded into their equivalent forms and compared as sets.

/// Marker digits of supergroup and channel ids, after the sign.
pub const SUPERGROUP_PREFIX: &str = "100";

/// Return every equivalent representation of `raw`, most specific first.
/// Never fails; the trimmed input itself is always the first element.
///
/// `-1001234567890` expands to `1001234567890` (sign stripped) and
/// `1234567890` (marker stripped); `1001234567890` expands to the bare id too.
pub fn normalize(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let mut forms: Vec<String> = vec![raw.to_string()];

    let mut push = |form: &str| {
        if !form.is_empty() && !forms.iter().any(|f| f == form) {
            forms.push(form.to_string());
        }
    };

    let unsigned = raw.strip_prefix('-').filter(|u| is_digits(u));
    if let Some(unsigned) = unsigned {
        push(unsigned);
    }

    if let Some(bare) = unsigned.unwrap_or(raw).strip_prefix(SUPERGROUP_PREFIX) {
        if is_digits(bare) {
            push(bare);
        }
    }

    forms
}

/// `true` when any representation of `a` equals any representation of `b`.
pub fn same_chat(a: &str, b: &str) -> bool {
    let left = normalize(a);
    normalize(b).iter().any(|form| left.contains(form))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
