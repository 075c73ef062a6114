/// Literal value the export uses for accounts with no license assigned.
pub const UNLICENSED: &str = "Unlicensed";

/// Split a raw license field into trimmed tokens.
///
/// A null field, or one equal to the `unlicensed` sentinel after trimming
/// (case-sensitive, normally [`UNLICENSED`]), yields no tokens. Empty tokens
/// are dropped; the remaining order is preserved.
pub fn tokenize(raw: Option<&str>, unlicensed: &str) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    if raw.trim() == unlicensed {
        return Vec::new();
    }

    raw.split('+')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
