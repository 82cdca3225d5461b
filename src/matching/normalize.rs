use unaccent::unaccent;

/// Ligatures and letters that accent stripping alone does not expand.
const FOLDS: &[(char, &str)] = &[('ß', "ss"), ('æ', "ae"), ('œ', "oe"), ('ø', "o"), ('ł', "l")];

/// Normalize text for fuzzy comparison.
///
/// Applies: lowercase, `&` -> `and`, diacritic and ligature folding, then
/// keeps only ASCII letters and digits. Whitespace and punctuation are
/// dropped entirely, so `"AC/DC"` and `"ac dc"` both become `"acdc"`.
pub fn normalize_for_comparison(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let lowered = text.to_lowercase().replace('&', "and");

    let mut folded = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        match FOLDS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => folded.push_str(to),
            None => folded.push(c),
        }
    }

    unaccent(&folded)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Split on whitespace and normalize each token, dropping tokens that
/// normalize to nothing (e.g. a lone `-`).
pub fn normalized_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(normalize_for_comparison)
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation_and_whitespace() {
        assert_eq!(normalize_for_comparison("Don't Stop Me Now!"), "dontstopmenow");
        assert_eq!(normalize_for_comparison("  AC/DC "), "acdc");
        assert_eq!(normalize_for_comparison(""), "");
    }

    #[test]
    fn test_normalize_folds_diacritics() {
        assert_eq!(normalize_for_comparison("Beyoncé"), "beyonce");
        assert_eq!(normalize_for_comparison("Mötley Crüe"), "motleycrue");
        assert_eq!(normalize_for_comparison("Niña"), "nina");
    }

    #[test]
    fn test_normalize_folds_ligatures() {
        assert_eq!(normalize_for_comparison("Straße"), "strasse");
        assert_eq!(normalize_for_comparison("Æon"), "aeon");
        assert_eq!(normalize_for_comparison("Œuvre"), "oeuvre");
    }

    #[test]
    fn test_normalize_ampersand() {
        assert_eq!(normalize_for_comparison("Simon & Garfunkel"), "simonandgarfunkel");
        assert_eq!(
            normalize_for_comparison("Simon & Garfunkel"),
            normalize_for_comparison("Simon and Garfunkel")
        );
    }

    #[test]
    fn test_normalized_tokens() {
        assert_eq!(
            normalized_tokens("Hall & Oates - Live"),
            vec!["hall", "and", "oates", "live"]
        );
    }
}
