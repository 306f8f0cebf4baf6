//! Detection of bare links in post and status text.

use std::{future::Future, ops::Range, sync::LazyLock};

use {regex::Regex, tracing::warn};

/// Bare `http(s)` links. Trailing punctuation is left out of the match so
/// that "see https://example.com." does not capture the full stop.
pub const LINK_PATTERN: &str = r#"https?://[^\s<>"]*[^\s<>".,;:!?)\]'"]"#;

static LINK_RE: LazyLock<Option<Regex>> = LazyLock::new(|| match Regex::new(LINK_PATTERN) {
    Ok(re) => Some(re),
    Err(e) => {
        warn!(error = %e, "link pattern failed to compile");
        None
    },
});

pub fn link_regex() -> Option<&'static Regex> {
    LINK_RE.as_ref()
}

fn link_ranges(text: &str) -> Vec<Range<usize>> {
    link_regex()
        .map(|re| re.find_iter(text).map(|m| m.range()).collect())
        .unwrap_or_default()
}

/// Every link in `text`, in order of appearance.
pub fn find_links(text: &str) -> Vec<&str> {
    link_ranges(text).into_iter().map(|r| &text[r]).collect()
}

/// Rewrite every link in `text` with the output of `replace`. Links are
/// processed one at a time, in order; the text between them is copied
/// unchanged.
pub async fn replace_links_with<F, Fut>(text: &str, mut replace: F) -> String
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = String>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for range in link_ranges(text) {
        out.push_str(&text[last..range.start]);
        out.push_str(&replace(text[range.clone()].to_string()).await);
        last = range.end;
    }
    out.push_str(&text[last..]);
    out
}
