//! Text normalization applied before vectorization

/// Normalize raw message text for the classifier
///
/// Lower-cases, replaces every character that is neither alphanumeric nor
/// whitespace with a space, then collapses whitespace runs. Total and
/// idempotent.
pub fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase();

    let mut out = String::with_capacity(lowered.len());
    for word in lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
    {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }

    out
}
