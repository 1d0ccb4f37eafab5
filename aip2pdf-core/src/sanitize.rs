//! Display names to filesystem names.

/// Replaces every character that is neither alphanumeric nor a space with `_`.
///
/// AIP names contain slashes, dots and parentheses.
/// Distinct names may collapse to the same result; that is accepted.
pub fn sanitize_for_path(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == ' ' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_alphanumerics_and_spaces() {
        assert_eq!(sanitize_for_path("AD 2 EDDF 1"), "AD 2 EDDF 1");
    }

    #[test]
    fn replaces_punctuation_and_separators() {
        assert_eq!(
            sanitize_for_path("Frankfurt/Main (EDDF) 1-1.2"),
            "Frankfurt_Main _EDDF_ 1_1_2"
        );
    }

    #[test]
    fn keeps_non_ascii_letters() {
        assert_eq!(sanitize_for_path("Düsseldorf"), "Düsseldorf");
    }
}
