//! Language tags, region detection and the language fallback chain used for
//! localized catalog requests.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::media::ApiError;

pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_REGION: &str = "US";

const PLATFORM_LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

fn language_subtag() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z]{2,3}$").expect("valid language pattern"))
}

/// A normalized `language[-Script][-Region]` tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag(String);

impl LanguageTag {
    /// Normalizes a raw locale string such as `fr_fr`, `zh-hant-tw` or
    /// `de_DE.UTF-8`. Returns `None` when the language subtag is not 2-3
    /// letters (`C`, `POSIX`, empty strings).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let raw = raw.split(['.', '@']).next().unwrap_or_default();
        let mut subtags = raw.split(['-', '_']).filter(|s| !s.is_empty());

        let language = subtags.next()?;
        if !language_subtag().is_match(language) {
            return None;
        }

        let mut normalized = language.to_ascii_lowercase();
        for subtag in subtags {
            normalized.push('-');
            normalized.push_str(&normalize_subtag(subtag));
        }
        Some(Self(normalized))
    }

    pub fn default_tag() -> Self {
        Self(DEFAULT_LANGUAGE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn language(&self) -> &str {
        self.0.split('-').next().unwrap_or_default()
    }

    /// The 2-letter region subtag, if the tag carries one.
    pub fn region(&self) -> Option<&str> {
        self.0
            .split('-')
            .skip(1)
            .find(|s| s.len() == 2 && s.chars().all(|c| c.is_ascii_uppercase()))
    }

    pub fn with_region(&self, region: &str) -> Self {
        Self(format!(
            "{}-{}",
            self.language(),
            region.to_ascii_uppercase()
        ))
    }
}

fn normalize_subtag(subtag: &str) -> String {
    let alphabetic = subtag.chars().all(|c| c.is_ascii_alphabetic());
    match subtag.len() {
        2 if alphabetic => subtag.to_ascii_uppercase(),
        4 if alphabetic => {
            let lower = subtag.to_ascii_lowercase();
            let mut chars = lower.chars();
            chars
                .next()
                .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                .unwrap_or_default()
        }
        _ => subtag.to_ascii_lowercase(),
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, deduplicated, never-empty list of tags tried one after another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackChain {
    tags: Vec<LanguageTag>,
}

impl FallbackChain {
    pub fn from_tags(tags: impl IntoIterator<Item = LanguageTag>) -> Result<Self, ApiError> {
        let mut seen = HashSet::new();
        let tags: Vec<LanguageTag> = tags
            .into_iter()
            .filter(|tag| seen.insert(tag.clone()))
            .collect();

        if tags.is_empty() {
            return Err(ApiError::InvalidInput(String::from(
                "fallback chain must contain at least one tag",
            )));
        }
        Ok(Self { tags })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LanguageTag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.to_string()).collect()
    }
}

impl<'a> IntoIterator for &'a FallbackChain {
    type Item = &'a LanguageTag;
    type IntoIter = std::slice::Iter<'a, LanguageTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

/// The locale reported by the operating system, e.g. `fr_FR.UTF-8`.
pub fn platform_locale() -> Option<String> {
    PLATFORM_LOCALE_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
}

/// The first user tag that normalizes, else `en-US`.
fn effective_user_tag<S: AsRef<str>>(user_locale_tags: &[S]) -> LanguageTag {
    user_locale_tags
        .iter()
        .find_map(|tag| LanguageTag::parse(tag.as_ref()))
        .unwrap_or_else(LanguageTag::default_tag)
}

/// Region from the user tag, else from the platform locale, else none.
pub fn detect_region(user_tag: Option<&LanguageTag>, platform_locale: Option<&str>) -> Option<String> {
    user_tag
        .and_then(|tag| tag.region().map(String::from))
        .or_else(|| {
            platform_locale
                .and_then(LanguageTag::parse)
                .and_then(|tag| tag.region().map(String::from))
        })
}

/// Builds the fallback chain: the user's language first, then the content's
/// original language flavored with the user's region, then `en-US`.
pub fn build_chain<S: AsRef<str>>(
    user_locale_tags: &[S],
    original_language: Option<&str>,
    platform_locale: Option<&str>,
) -> FallbackChain {
    let region = detect_region(Some(&effective_user_tag(user_locale_tags)), platform_locale);
    build_chain_for_region(user_locale_tags, original_language, region.as_deref())
}

/// Same as [`build_chain`] with the region already resolved.
pub fn build_chain_for_region<S: AsRef<str>>(
    user_locale_tags: &[S],
    original_language: Option<&str>,
    region: Option<&str>,
) -> FallbackChain {
    let mut tags = vec![effective_user_tag(user_locale_tags)];
    if let Some(original) = original_language.and_then(LanguageTag::parse) {
        let candidate = match region {
            Some(region) => original.with_region(region),
            None => original,
        };
        tags.push(candidate);
    }
    tags.push(LanguageTag::default_tag());

    FallbackChain::from_tags(tags).unwrap_or_else(|_| FallbackChain {
        tags: vec![LanguageTag::default_tag()],
    })
}

/// The user's locale preferences, resolved once per client.
#[derive(Debug, Clone)]
pub struct LocaleContext {
    user_tags: Vec<String>,
    platform_locale: Option<String>,
    region_override: Option<String>,
}

impl LocaleContext {
    pub fn new(user_tags: Vec<String>, platform_locale: Option<String>) -> Self {
        Self {
            user_tags,
            platform_locale,
            region_override: None,
        }
    }

    /// Uses the platform locale both for region detection and, when no
    /// preference was configured, as the user's language.
    pub fn from_env(user_tags: Vec<String>) -> Self {
        let platform = platform_locale();
        let user_tags = if user_tags.is_empty() {
            platform.iter().cloned().collect()
        } else {
            user_tags
        };
        Self::new(user_tags, platform)
    }

    pub fn with_region_override(mut self, region: Option<String>) -> Self {
        self.region_override = region
            .map(|r| r.trim().to_ascii_uppercase())
            .filter(|r| r.len() == 2 && r.chars().all(|c| c.is_ascii_alphabetic()));
        self
    }

    pub fn region(&self) -> Option<String> {
        self.region_override.clone().or_else(|| {
            detect_region(
                Some(&effective_user_tag(&self.user_tags)),
                self.platform_locale.as_deref(),
            )
        })
    }

    pub fn chain(&self, original_language: Option<&str>) -> FallbackChain {
        build_chain_for_region(&self.user_tags, original_language, self.region().as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(raw: &str) -> String {
        LanguageTag::parse(raw).map(|t| t.to_string()).unwrap_or_default()
    }

    #[test]
    fn normalizes_case_and_separators() {
        assert_eq!(tag("fr_fr"), "fr-FR");
        assert_eq!(tag("EN-us"), "en-US");
        assert_eq!(tag("zh-hant-tw"), "zh-Hant-TW");
        assert_eq!(tag("es-419"), "es-419");
        assert_eq!(tag("de_DE.UTF-8"), "de-DE");
        assert!(LanguageTag::parse("C").is_none());
        assert!(LanguageTag::parse("").is_none());
    }

    #[test]
    fn region_only_counts_two_letter_subtags() {
        assert_eq!(LanguageTag::parse("zh-Hant-TW").unwrap().region(), Some("TW"));
        assert_eq!(LanguageTag::parse("es-419").unwrap().region(), None);
        assert_eq!(LanguageTag::parse("fr").unwrap().region(), None);
    }

    #[test]
    fn chain_puts_original_language_in_user_region() {
        let chain = build_chain(&["fr-FR"], Some("en"), None);
        assert_eq!(chain.to_strings(), vec!["fr-FR", "en-FR", "en-US"]);
    }

    #[test]
    fn chain_collapses_default_tag() {
        let chain = build_chain(&["en-US"], None, None);
        assert_eq!(chain.to_strings(), vec!["en-US"]);
    }

    #[test]
    fn chain_is_idempotent() {
        let first = build_chain(&["ja-JP"], Some("ko"), None);
        let second = build_chain(&["ja-JP"], Some("ko"), None);
        assert_eq!(first, second);
        assert_eq!(first.to_strings(), vec!["ja-JP", "ko-JP", "en-US"]);
    }

    #[test]
    fn chain_without_user_tags_starts_at_default() {
        let empty: [&str; 0] = [];
        let chain = build_chain(&empty, Some("it"), None);
        assert_eq!(chain.to_strings(), vec!["en-US", "it-US"]);
    }

    #[test]
    fn region_falls_back_to_platform_locale() {
        let chain = build_chain(&["fr"], Some("en"), Some("fr_CA.UTF-8"));
        assert_eq!(chain.to_strings(), vec!["fr", "en-CA", "en-US"]);

        let chain = build_chain(&["fr"], Some("en"), Some("C"));
        assert_eq!(chain.to_strings(), vec!["fr", "en", "en-US"]);
    }

    #[test]
    fn skips_unparseable_user_tags() {
        let chain = build_chain(&["", "pt_br"], None, None);
        assert_eq!(chain.to_strings(), vec!["pt-BR", "en-US"]);
    }

    #[test]
    fn empty_chain_is_rejected() {
        assert!(FallbackChain::from_tags(Vec::new()).is_err());
    }

    #[test]
    fn context_region_override_wins() {
        let context = LocaleContext::new(vec![String::from("fr-FR")], None)
            .with_region_override(Some(String::from("be")));
        assert_eq!(context.region().as_deref(), Some("BE"));
        assert_eq!(
            context.chain(Some("en")).to_strings(),
            vec!["fr-FR", "en-BE", "en-US"]
        );
    }
}
