/// Map an arbitrary string onto the metric-name charset.
///
/// `.`, `-`, `#` and spaces become `_`; the result is ASCII-lowercased.
/// Total and idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '.' | '-' | '#' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Prefix prepended to every adjusted name of a facade.
///
/// Empty when the normalized prefix is empty, otherwise `<prefix>_`.
pub(crate) fn prefix_for(raw_prefix: &str) -> String {
    let norm = normalize(raw_prefix);
    if norm.is_empty() {
        norm
    } else {
        format!("{norm}_")
    }
}
