//! Lucene query construction for the MusicBrainz recording search.

const LUCENE_SPECIAL: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\',
    '/',
];

/// Recordings released before this year are not searched for separately.
pub const OLDER_SEARCH_CUTOFF_YEAR: i32 = 1950;

/// Backslash-escape Lucene special characters.
pub fn escape_lucene(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if LUCENE_SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn artist_and_recording(artist: &str, title: &str) -> String {
    format!(
        r#"artist:"{}" AND recording:"{}""#,
        escape_lucene(artist),
        escape_lucene(title)
    )
}

/// Official singles/albums only, excluding live and compilation releases.
/// Most likely to surface the original studio recording.
pub fn official_release_query(artist: &str, title: &str) -> String {
    format!(
        "{} AND status:official AND (primarytype:single OR primarytype:album) \
         AND NOT secondarytype:live AND NOT secondarytype:compilation",
        artist_and_recording(artist, title)
    )
}

pub fn general_query(artist: &str, title: &str) -> String {
    artist_and_recording(artist, title)
}

/// Recordings first released strictly before `earliest_year`.
pub fn older_than_query(artist: &str, title: &str, earliest_year: i32) -> String {
    format!(
        "{} AND firstreleasedate:[1900 TO {}]",
        artist_and_recording(artist, title),
        earliest_year - 1
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_lucene() {
        assert_eq!(escape_lucene("AC/DC"), r"AC\/DC");
        assert_eq!(escape_lucene("What's Up?"), r"What's Up\?");
        assert_eq!(escape_lucene("Earth, Wind & Fire"), r"Earth, Wind \& Fire");
        assert_eq!(escape_lucene(r#"Say "Hi""#), r#"Say \"Hi\""#);
    }

    #[test]
    fn test_general_query() {
        assert_eq!(
            general_query("Queen", "Bohemian Rhapsody"),
            r#"artist:"Queen" AND recording:"Bohemian Rhapsody""#
        );
    }

    #[test]
    fn test_official_release_query_filters() {
        let query = official_release_query("Queen", "Bohemian Rhapsody");
        assert!(query.starts_with(r#"artist:"Queen" AND recording:"Bohemian Rhapsody""#));
        assert!(query.contains("status:official"));
        assert!(query.contains("NOT secondarytype:live"));
        assert!(query.contains("NOT secondarytype:compilation"));
    }

    #[test]
    fn test_older_than_query_range() {
        let query = older_than_query("Queen", "Bohemian Rhapsody", 1976);
        assert!(query.ends_with("firstreleasedate:[1900 TO 1975]"));
    }
}
