//! Theme equivalence: decides whether two cluster labels describe the same topic.

/// Tokens must be longer than this many characters to count toward overlap.
const MIN_TOKEN_CHARS: usize = 3;

/// Overlapping token pairs needed before two themes are treated as equivalent.
const MIN_OVERLAPPING_PAIRS: usize = 2;

/// Lowercase and trim a theme into its comparison key.
#[must_use]
pub fn normalize_theme(theme: &str) -> String {
    theme.trim().to_lowercase()
}

/// Returns `true` if two themes refer to the same topic.
///
/// Checked in order, first hit wins:
/// 1. equal after [`normalize_theme`];
/// 2. either contains the other;
/// 3. at least two token pairs (tokens longer than three characters) where
///    one token contains the other.
///
/// An empty theme only matches another empty theme.
#[must_use]
pub fn themes_are_similar(a: &str, b: &str) -> bool {
    let a = normalize_theme(a);
    let b = normalize_theme(b);

    if a == b {
        return true;
    }
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a.contains(&b) || b.contains(&a) {
        return true;
    }

    overlapping_token_pairs(&a, &b) >= MIN_OVERLAPPING_PAIRS
}

fn significant_tokens(theme: &str) -> Vec<&str> {
    theme
        .split_whitespace()
        .filter(|token| token.chars().count() > MIN_TOKEN_CHARS)
        .collect()
}

fn overlapping_token_pairs(a: &str, b: &str) -> usize {
    let tokens_a = significant_tokens(a);
    let tokens_b = significant_tokens(b);

    tokens_a
        .iter()
        .map(|ta| {
            tokens_b
                .iter()
                .filter(|tb| ta.contains(**tb) || tb.contains(*ta))
                .count()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize_theme("  Pricing Questions \n"), "pricing questions");
    }

    #[test]
    fn exact_match_ignores_case_and_whitespace() {
        assert!(themes_are_similar("Pricing Questions", "  pricing questions "));
    }

    #[test]
    fn containment_in_either_direction() {
        assert!(themes_are_similar("Pricing", "Pricing questions"));
        assert!(themes_are_similar("questions about pricing", "PRICING"));
    }

    #[test]
    fn two_overlapping_tokens_match() {
        assert!(themes_are_similar(
            "tiktok growth tips",
            "growth tips for creators"
        ));
    }

    #[test]
    fn token_containment_counts_as_overlap() {
        // "camera" is contained in "cameras".
        assert!(themes_are_similar("camera settings help", "cameras and settings"));
    }

    #[test]
    fn single_overlapping_token_does_not_match() {
        assert!(!themes_are_similar("tiktok growth tips", "tiktok questions"));
    }

    #[test]
    fn short_tokens_are_ignored() {
        // Shared tokens are all three characters or fewer.
        assert!(!themes_are_similar("how to get gym art", "why get art now gym"));
    }

    #[test]
    fn pricing_questions_paraphrase_matches() {
        assert!(themes_are_similar(
            "Pricing questions",
            "questions about pricing"
        ));
    }

    #[test]
    fn empty_theme_only_matches_empty() {
        assert!(themes_are_similar("", "   "));
        assert!(!themes_are_similar("", "pricing"));
        assert!(!themes_are_similar("pricing", ""));
    }

    #[test]
    fn similarity_is_symmetric() {
        let pairs = [
            ("tiktok growth tips", "growth tips for creators"),
            ("gear recommendations", "camera gear"),
            ("editing software", "editing workflow tips"),
        ];
        for (a, b) in pairs {
            assert_eq!(themes_are_similar(a, b), themes_are_similar(b, a), "{a} / {b}");
        }
    }
}
