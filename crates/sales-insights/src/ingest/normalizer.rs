/// Strips invisible characters and collapses inner whitespace so that
/// `"\u{feff}Ad  Spend ($) "` matches `"Ad Spend ($)"`. Case is preserved.
pub(crate) fn normalize_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}', '\u{a0}'], " ");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_header_removes_invisible_characters() {
        assert_eq!(normalize_header("\u{feff}Ad  Spend ($) "), "Ad Spend ($)");
        assert_eq!(normalize_header("Time\u{a0}of Day"), "Time of Day");
        assert_eq!(normalize_header("daily revenue ($)"), "daily revenue ($)");
    }
}
