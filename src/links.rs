use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bhttps?://[^\s<>]+").expect("valid URL regex"));

/// Punctuation that ends a sentence rather than a link
const TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"', '*', '_', '~', '|'];

/// Find the first `http(s)` link in a chat message.
///
/// Sentence punctuation after the link and `<...>` wrapping are left out.
pub fn extract_first_url(text: &str) -> Option<&str> {
    URL_REGEX
        .find_iter(text)
        .map(|m| trim_trailing(m.as_str()))
        .find(|candidate| Url::parse(candidate).is_ok_and(|url| url.host_str().is_some()))
}

fn trim_trailing(mut candidate: &str) -> &str {
    loop {
        let trimmed = candidate.trim_end_matches(TRAILING);
        // keep a closing paren only if the link opened one
        let trimmed = match trimmed.strip_suffix(')') {
            Some(rest) if !rest.contains('(') => rest,
            _ => trimmed,
        };
        if trimmed == candidate {
            return candidate;
        }
        candidate = trimmed;
    }
}
