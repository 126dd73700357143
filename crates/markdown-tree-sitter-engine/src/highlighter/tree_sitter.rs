use super::{SpanKind, SyntaxHighlighter};
use crate::convert::{Converter, escape::escape_html};
use markdown_tree_sitter_config::HighlighterOpts;

/// Highlighter registered as `tree-sitter`.
///
/// No grammar is loaded yet: code is only HTML-escaped so it can be embedded
/// safely, and blocks get their `<pre><code>` container.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeSitter;

impl TreeSitter {
    pub const NAME: &'static str = "tree-sitter";

    pub const BLOCK_OPEN: &'static str = "<pre><code>";
    pub const BLOCK_CLOSE: &'static str = "</code></pre>";

    pub fn render(fragment: &str, kind: SpanKind) -> String {
        Self::wrap(&escape_html(fragment), kind)
    }

    fn wrap(escaped: &str, kind: SpanKind) -> String {
        match kind {
            SpanKind::Block => {
                let mut out = String::with_capacity(
                    Self::BLOCK_OPEN.len() + escaped.len() + Self::BLOCK_CLOSE.len(),
                );
                out.push_str(Self::BLOCK_OPEN);
                out.push_str(escaped);
                out.push_str(Self::BLOCK_CLOSE);
                out
            }
            SpanKind::Inline => escaped.to_string(),
        }
    }
}

impl SyntaxHighlighter for TreeSitter {
    fn call(
        &self,
        converter: &Converter<'_>,
        raw_text: &str,
        _language: Option<&str>,
        kind: SpanKind,
        _options: &HighlighterOpts,
    ) -> String {
        Self::wrap(&converter.escape_html(raw_text), kind)
    }
}
