//! Askama filters for admin templates.

use std::fmt::Display;

/// Characters of an id kept by `short_id`.
const SHORT_ID_LEN: usize = 8;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Tail of a backend id, uppercased, for tables: `#{{ order.id|short_id }}`.
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn short_id(id: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(shorten(&id.to_string()))
}

fn shorten(id: &str) -> String {
    let start = id
        .char_indices()
        .rev()
        .nth(SHORT_ID_LEN - 1)
        .map_or(0, |(i, _)| i);
    id[start..].to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_keeps_tail() {
        assert_eq!(shorten("64f1c2a9e7b3d0a1b2c3d4e5"), "B2C3D4E5");
        assert_eq!(shorten("abc"), "ABC");
        assert_eq!(shorten(""), "");
    }
}
