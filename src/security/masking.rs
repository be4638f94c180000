//! Secret masking for log output
//!
//! Replaces every occurrence of a known secret with a fixed placeholder
//! before text is logged.

use aho_corasick::AhoCorasick;

/// Masks a set of known secrets in arbitrary text
///
/// # Examples
///
/// ```
/// use npm_workspace_publisher::security::SecretMasker;
///
/// let masker = SecretMasker::new([("abc123", "TOKEN")]);
/// assert_eq!(masker.mask("_authToken=abc123"), "_authToken=TOKEN");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SecretMasker {
    matcher: Option<AhoCorasick>,
    placeholders: Vec<String>,
}

impl SecretMasker {
    /// Build a masker from `(secret, placeholder)` pairs.
    ///
    /// Empty secrets are ignored.
    pub fn new<'a, I>(secrets: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let (patterns, placeholders): (Vec<&str>, Vec<String>) = secrets
            .into_iter()
            .filter(|(secret, _)| !secret.is_empty())
            .map(|(secret, placeholder)| (secret, placeholder.to_string()))
            .unzip();

        // Leftmost-longest so a secret that contains another is masked whole
        let matcher = if patterns.is_empty() {
            None
        } else {
            AhoCorasick::builder()
                .match_kind(aho_corasick::MatchKind::LeftmostLongest)
                .build(&patterns)
                .ok()
        };

        Self {
            matcher,
            placeholders,
        }
    }

    /// Replace every known secret in `text`
    pub fn mask(&self, text: &str) -> String {
        match &self.matcher {
            Some(matcher) => matcher.replace_all(text, self.placeholders.as_slice()),
            None => text.to_string(),
        }
    }
}
