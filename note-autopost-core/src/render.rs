//! Markup → HTML conversion for generated articles.
//!
//! This is an ordered list of independent line/regex substitutions, not a parser:
//!   1. headings (`###`, `##`, and optionally `#`) anchored at line start
//!   2. list items (`- text`), emitted without any `<ul>` container
//!   3. inline `**strong**`
//!   4. optional fenced code blocks
//!   5. paragraph wrapping of `\n\n`-separated blocks that don't already start with a block tag
//!      (inline tags such as `<strong>` still get wrapped)
//!
//! Later rules never look inside earlier output specially, so headings inside list items or
//! `**` inside fenced code come out with odd nesting. Rendering never fails.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

/// Toggles for the rules that differ between deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Convert `# text` lines to `<h1>`.
    pub h1: bool,
    /// Convert ```` ```fenced``` ```` spans to `<pre><code>`.
    pub code_blocks: bool,
    /// Keep blank blocks as `<p></p>` instead of dropping them.
    pub keep_empty_paragraphs: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            h1: true,
            code_blocks: true,
            keep_empty_paragraphs: false,
        }
    }
}

const BLOCK_TAGS: [&str; 17] = [
    "address", "blockquote", "div", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "ol",
    "p", "pre", "table", "ul",
];

/// Whether `block` opens with a block-level element and so must not be wrapped in `<p>`.
fn starts_with_block_tag(block: &str) -> bool {
    let Some(rest) = block.strip_prefix('<') else {
        return false;
    };
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    BLOCK_TAGS.contains(&name.as_str())
}

struct Rules {
    h3: Regex,
    h2: Regex,
    h1: Regex,
    list_item: Regex,
    strong: Regex,
    code_block: Regex,
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| {
        let compile = |pattern: &str| Regex::new(pattern).expect("static render pattern is valid");
        Rules {
            h3: compile(r"(?m)^### (.+)$"),
            h2: compile(r"(?m)^## (.+)$"),
            h1: compile(r"(?m)^# (.+)$"),
            list_item: compile(r"(?m)^- (.+)$"),
            strong: compile(r"\*\*(.+?)\*\*"),
            code_block: compile(r"(?s)```(.+?)```"),
        }
    })
}

/// Render with [`RenderOptions::default`].
pub fn render(markup: &str) -> String {
    render_with(markup, &RenderOptions::default())
}

pub fn render_with(markup: &str, options: &RenderOptions) -> String {
    let rules = rules();
    let mut html = markup.replace("\r\n", "\n");

    html = rules.h3.replace_all(&html, "<h3>$1</h3>").into_owned();
    html = rules.h2.replace_all(&html, "<h2>$1</h2>").into_owned();
    if options.h1 {
        html = rules.h1.replace_all(&html, "<h1>$1</h1>").into_owned();
    }
    html = rules.list_item.replace_all(&html, "<li>$1</li>").into_owned();
    html = rules.strong.replace_all(&html, "<strong>$1</strong>").into_owned();
    if options.code_blocks {
        html = rules
            .code_block
            .replace_all(&html, "<pre><code>$1</code></pre>")
            .into_owned();
    }

    let paragraphs: Vec<String> = html
        .split("\n\n")
        .map(str::trim)
        .filter(|block| options.keep_empty_paragraphs || !block.is_empty())
        .map(|block| {
            if starts_with_block_tag(block) {
                block.to_string()
            } else {
                format!("<p>{block}</p>")
            }
        })
        .collect();

    debug!(
        input_len = markup.len(),
        blocks = paragraphs.len(),
        "Rendered markup to HTML"
    );
    paragraphs.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_tag_detection() {
        assert!(starts_with_block_tag("<h2>x</h2>"));
        assert!(starts_with_block_tag("<li>x</li>"));
        assert!(starts_with_block_tag("<pre><code>x</code></pre>"));
        assert!(starts_with_block_tag("<DIV class=\"a\">x</DIV>"));
        assert!(!starts_with_block_tag("<strong>x</strong> tail"));
        assert!(!starts_with_block_tag("<em>x</em>"));
        assert!(!starts_with_block_tag("plain"));
    }
}
