//! Text helpers for target-language strings.

/// Map a macronised vowel to its plain form.
fn demacron(c: char) -> char {
    match c {
        'ā' => 'a',
        'ē' => 'e',
        'ī' => 'i',
        'ō' => 'o',
        'ū' => 'u',
        'Ā' => 'A',
        'Ē' => 'E',
        'Ī' => 'I',
        'Ō' => 'O',
        'Ū' => 'U',
        other => other,
    }
}

/// Strip macrons, e.g. "kōrero" -> "korero".
pub fn strip_macrons(s: &str) -> String {
    s.chars().map(demacron).collect()
}

/// Whether the string contains any macronised vowel.
pub fn contains_macrons(s: &str) -> bool {
    s.chars().any(|c| demacron(c) != c)
}

/// Lowercase with macrons stripped, for comparisons and search.
pub fn fold(s: &str) -> String {
    strip_macrons(s).to_lowercase()
}

/// Case-insensitive comparison that ignores macrons.
pub fn eq_ignoring_macrons(a: &str, b: &str) -> bool {
    fold(a) == fold(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_macrons() {
        assert_eq!(strip_macrons("kōrero"), "korero");
        assert_eq!(strip_macrons("ĀKONGA"), "AKONGA");
        assert_eq!(strip_macrons("kai"), "kai");
    }

    #[test]
    fn test_contains_macrons() {
        assert!(contains_macrons("whānau"));
        assert!(!contains_macrons("whanau"));
    }

    #[test]
    fn test_eq_ignoring_macrons() {
        assert!(eq_ignoring_macrons("Whānau", "whanau"));
        assert!(!eq_ignoring_macrons("whānau", "whenua"));
    }
}
