pub mod convert;
pub mod highlighter;

// Re-export key types for easier usage
pub use convert::{Conversion, ConvertError, Converter, Options, to_html};
pub use highlighter::{Registry, SpanKind, SyntaxHighlighter, TreeSitter};
pub use markdown_tree_sitter_config::HighlighterOpts;

/// Version of the highlighter crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
