use std::sync::LazyLock;

use {
    pulldown_cmark::{Event, Parser, Tag},
    regex::Regex,
    tracing::warn,
};

use crate::models::ContentFormat;

static IMG_SRC_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    match Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(error = %e, "img pattern failed to compile");
            None
        },
    }
});

/// Source of the first image in a post body, if any.
pub fn first_image(content: &str, format: ContentFormat) -> Option<String> {
    match format {
        ContentFormat::Markdown => first_markdown_image(content)
            // Markdown bodies may embed raw HTML.
            .or_else(|| first_html_image(content)),
        ContentFormat::Html | ContentFormat::Plain => first_html_image(content),
    }
}

fn first_markdown_image(content: &str) -> Option<String> {
    Parser::new(content).find_map(|event| match event {
        Event::Start(Tag::Image { dest_url, .. }) if !dest_url.is_empty() => {
            Some(dest_url.into_string())
        },
        _ => None,
    })
}

fn first_html_image(content: &str) -> Option<String> {
    IMG_SRC_RE
        .as_ref()?
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
