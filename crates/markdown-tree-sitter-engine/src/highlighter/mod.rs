//! Syntax highlighters the converter can delegate code to.
//!
//! A highlighter is looked up by name in a [`Registry`] and invoked once per
//! code block or inline code span. It returns finished markup; the converter
//! adds the surrounding container and CSS classes derived from the language.

pub mod registry;
pub mod tree_sitter;

pub use registry::Registry;
pub use tree_sitter::TreeSitter;

use crate::convert::Converter;
use markdown_tree_sitter_config::HighlighterOpts;

/// Where a code fragment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    /// Fenced or indented code block.
    Block,
    /// Backtick code span inside running text.
    Inline,
}

/// The call shape a converter uses to invoke a highlighter.
///
/// Implementations must be pure with respect to their inputs: the converter
/// may share one instance across threads and conversions.
pub trait SyntaxHighlighter: Send + Sync {
    /// Render `raw_text` to HTML.
    ///
    /// `language` is the label from the fence info string or a `language-*`
    /// class, passed through exactly as written.
    fn call(
        &self,
        converter: &Converter<'_>,
        raw_text: &str,
        language: Option<&str>,
        kind: SpanKind,
        options: &HighlighterOpts,
    ) -> String;
}
