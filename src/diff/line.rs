use regex::Regex;
use std::sync::LazyLock;

/// An added or removed line carrying nothing but whitespace, a `//` comment
/// or a single `/* ... */` comment closed on the same line.
#[allow(clippy::expect_used)]
static NOISE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-][ \t]*(?://.*)?(?:/\*[^*]*\*+/)?[ \t]*$").expect("Invalid noise pattern")
});

/// Line position in the resulting file, negated for noise lines.
pub type Anchor = i64;

/// Whether a `+`/`-` line is whitespace or comment only.
pub fn is_noise(line: &str) -> bool {
    NOISE_PATTERN.is_match(line)
}

/// Anchor `line` at `position`, with the sign carrying its substance.
pub fn anchor(position: u32, line: &str) -> Anchor {
    let position = Anchor::from(position);
    if is_noise(line) { -position } else { position }
}
