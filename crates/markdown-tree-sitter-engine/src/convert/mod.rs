//! Markdown to HTML conversion.
//!
//! Parsing and most of the HTML output come from `pulldown-cmark`. Code
//! blocks and code spans are intercepted and handed to the configured
//! [`SyntaxHighlighter`]; the result is spliced back into the event stream as
//! raw HTML.

pub mod escape;
pub mod ial;

use crate::highlighter::{Registry, SpanKind, SyntaxHighlighter};
use ial::Attributes;
use markdown_tree_sitter_config::{Config, HighlighterOpts};
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Parser, Tag, TagEnd, TextMergeStream};
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Error retrieving language configuration for scope '{scope}': Language not found")]
    LanguageNotFound { scope: String, parsers_dir: PathBuf },
}

/// Conversion settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    /// Registered name of the highlighter; `None` disables highlighting.
    pub syntax_highlighter: Option<String>,
    pub syntax_highlighter_opts: HighlighterOpts,
}

impl Options {
    pub fn with_highlighter(mut self, name: impl Into<String>) -> Self {
        self.syntax_highlighter = Some(name.into());
        self
    }

    pub fn with_highlighter_opts(mut self, opts: HighlighterOpts) -> Self {
        self.syntax_highlighter_opts = opts;
        self
    }
}

impl From<Config> for Options {
    fn from(config: Config) -> Self {
        Self {
            syntax_highlighter: config.syntax_highlighter,
            syntax_highlighter_opts: config.syntax_highlighter_opts,
        }
    }
}

/// Output of a conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    pub html: String,
    pub warnings: Vec<String>,
}

struct ActiveHighlighter {
    name: String,
    highlighter: Arc<dyn SyntaxHighlighter>,
}

pub struct Converter<'r> {
    options: Options,
    registry: &'r Registry,
}

impl Converter<'static> {
    pub fn new(options: Options) -> Self {
        Self::with_registry(options, Registry::builtin())
    }
}

impl<'r> Converter<'r> {
    pub fn with_registry(options: Options, registry: &'r Registry) -> Self {
        Self { options, registry }
    }

    /// Escaping utility offered to highlighters.
    pub fn escape_html<'a>(&self, text: &'a str) -> Cow<'a, str> {
        escape::escape_html(text)
    }

    pub fn convert(&self, markdown: &str) -> Result<Conversion, ConvertError> {
        let mut warnings = Vec::new();
        let highlighter = self.active_highlighter(&mut warnings);

        let mut events = TextMergeStream::new(Parser::new(markdown)).peekable();
        let mut rendered: Vec<Event<'_>> = Vec::new();
        // Alt text is written as plain text, so code inside it stays untouched.
        let mut image_depth = 0usize;

        while let Some(event) = events.next() {
            match event {
                event @ Event::Start(Tag::Image { .. }) => {
                    image_depth += 1;
                    rendered.push(event);
                }
                event @ Event::End(TagEnd::Image) => {
                    image_depth = image_depth.saturating_sub(1);
                    rendered.push(event);
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let language = block_language(&kind);
                    let mut code = String::new();
                    for inner in events.by_ref() {
                        match inner {
                            Event::End(TagEnd::CodeBlock) => break,
                            Event::Text(text) => code.push_str(&text),
                            _ => {}
                        }
                    }
                    let html =
                        self.convert_codeblock(&code, language.as_deref(), highlighter.as_ref())?;
                    rendered.push(Event::Html(CowStr::from(html)));
                }
                Event::Code(code) if image_depth == 0 => {
                    let mut attrs = Attributes::default();
                    if let Some(Event::Text(next)) = events.peek_mut()
                        && let Some((parsed, consumed)) = ial::parse_span_ial(next)
                    {
                        attrs = parsed;
                        *next = CowStr::from(next[consumed..].to_string());
                    }
                    let html = self.convert_codespan(&code, attrs, highlighter.as_ref())?;
                    rendered.push(Event::InlineHtml(CowStr::from(html)));
                }
                other => rendered.push(other),
            }
        }

        let mut html = String::with_capacity(markdown.len() * 3 / 2);
        pulldown_cmark::html::push_html(&mut html, rendered.into_iter());

        Ok(Conversion { html, warnings })
    }

    fn active_highlighter(&self, warnings: &mut Vec<String>) -> Option<ActiveHighlighter> {
        let name = self.options.syntax_highlighter.as_deref()?;
        match self.registry.syntax_highlighter(name) {
            Some(highlighter) => Some(ActiveHighlighter {
                name: name.to_string(),
                highlighter,
            }),
            None => {
                let warning = format!("The configured syntax highlighter {name} is not available.");
                log::warn!("{warning}");
                warnings.push(warning);
                None
            }
        }
    }

    fn convert_codeblock(
        &self,
        code: &str,
        language: Option<&str>,
        highlighter: Option<&ActiveHighlighter>,
    ) -> Result<String, ConvertError> {
        if let Some(active) = highlighter {
            let highlighted = self.highlight(active, code, language, SpanKind::Block)?;
            let mut attrs = Attributes::default();
            attrs.add_highlighter_class(&active.name, language);
            return Ok(format!("<div{}>{highlighted}</div>\n", attrs.to_html()));
        }

        let escaped = escape::escape_html(code);
        let body = chomp(&escaped);
        let mut code_attrs = Attributes::default();
        if let Some(language) = language {
            code_attrs.set("class", format!("language-{language}"));
        }
        Ok(format!(
            "<pre><code{}>{body}\n</code></pre>\n",
            code_attrs.to_html()
        ))
    }

    fn convert_codespan(
        &self,
        code: &str,
        mut attrs: Attributes,
        highlighter: Option<&ActiveHighlighter>,
    ) -> Result<String, ConvertError> {
        let language = attrs.language().map(str::to_string);
        let body = match highlighter {
            Some(active) => {
                let highlighted =
                    self.highlight(active, code, language.as_deref(), SpanKind::Inline)?;
                attrs.add_highlighter_class(&active.name, language.as_deref());
                highlighted
            }
            None => escape::escape_html(code).into_owned(),
        };
        Ok(format!("<code{}>{body}</code>", attrs.to_html()))
    }

    fn highlight(
        &self,
        active: &ActiveHighlighter,
        code: &str,
        language: Option<&str>,
        kind: SpanKind,
    ) -> Result<String, ConvertError> {
        if let Some(scope) = language {
            self.resolve_language(scope)?;
        }
        log::debug!(
            "highlighting {kind:?} code ({} bytes, language {language:?}) with {}",
            code.len(),
            active.name
        );
        Ok(active.highlighter.call(
            self,
            code,
            language,
            kind,
            &self.options.syntax_highlighter_opts,
        ))
    }

    /// Check that a language scope can be looked up in the configured
    /// parsers directory. Without a directory there is nothing to resolve.
    fn resolve_language(&self, scope: &str) -> Result<(), ConvertError> {
        match &self.options.syntax_highlighter_opts.tree_sitter_parsers_dir {
            Some(dir) if !dir.is_dir() => Err(ConvertError::LanguageNotFound {
                scope: scope.to_string(),
                parsers_dir: dir.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// Convert `markdown` to HTML in one go. Warnings are only logged.
pub fn to_html(markdown: &str, options: &Options) -> Result<String, ConvertError> {
    Converter::new(options.clone())
        .convert(markdown)
        .map(|conversion| conversion.html)
}

fn block_language(kind: &CodeBlockKind<'_>) -> Option<String> {
    match kind {
        CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_string),
        CodeBlockKind::Indented => None,
    }
}

/// Drop one trailing line ending.
fn chomp(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .or_else(|| text.strip_suffix('\r'))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn tree_sitter() -> Options {
        Options::default().with_highlighter("tree-sitter")
    }

    #[test]
    fn plain_paragraph_passes_through() {
        let html = to_html("Hello *world*", &Options::default()).unwrap();
        assert_eq!(html, "<p>Hello <em>world</em></p>\n");
    }

    #[test]
    fn unhighlighted_block_gets_language_class() {
        let html = to_html("~~~python\nprint('Hello, World!')\n~~~\n", &Options::default())
            .unwrap();
        assert_eq!(
            html,
            "<pre><code class=\"language-python\">print('Hello, World!')\n</code></pre>\n"
        );
    }

    #[test]
    fn unhighlighted_block_without_language() {
        let html = to_html("    a < b\n", &Options::default()).unwrap();
        assert_eq!(html, "<pre><code>a &lt; b\n</code></pre>\n");
    }

    #[test]
    fn unhighlighted_empty_block_keeps_single_newline() {
        let html = to_html("```\n```\n", &Options::default()).unwrap();
        assert_eq!(html, "<pre><code>\n</code></pre>\n");
    }

    #[test]
    fn highlighted_block_is_wrapped_in_div() {
        let html = to_html("```rust extra words\nfn main() {}\n```\n", &tree_sitter()).unwrap();
        assert_eq!(
            html,
            "<div class=\"language-rust highlighter-tree-sitter\"><pre><code>fn main() {}\n</code></pre></div>\n"
        );
    }

    #[test]
    fn highlighted_block_without_language() {
        let html = to_html("```\nx\n```\n", &tree_sitter()).unwrap();
        assert_eq!(
            html,
            "<div class=\"highlighter-tree-sitter\"><pre><code>x\n</code></pre></div>\n"
        );
    }

    #[test]
    fn highlighted_empty_block() {
        let html = to_html("```text\n```\n", &tree_sitter()).unwrap();
        assert_eq!(
            html,
            "<div class=\"language-text highlighter-tree-sitter\"><pre><code></code></pre></div>\n"
        );
    }

    #[rstest]
    #[case::no_highlighter(Options::default(), "<p>Use <code>a&amp;b</code> here.</p>\n")]
    #[case::tree_sitter(
        tree_sitter(),
        "<p>Use <code class=\"highlighter-tree-sitter\">a&amp;b</code> here.</p>\n"
    )]
    fn inline_code_without_ial(#[case] options: Options, #[case] expected: &str) {
        assert_eq!(to_html("Use `a&b` here.", &options).unwrap(), expected);
    }

    #[test]
    fn inline_ial_is_consumed_without_highlighter() {
        let html = to_html("Run `ls`{: .cmd #first} now.", &Options::default()).unwrap();
        assert_eq!(
            html,
            "<p>Run <code class=\"cmd\" id=\"first\">ls</code> now.</p>\n"
        );
    }

    #[test]
    fn inline_ial_language_with_highlighter() {
        let html = to_html("`x<y`{: class=\"language-c\" .wide}", &tree_sitter()).unwrap();
        insta::assert_snapshot!(
            html.trim_end(),
            @r#"<p><code class="language-c wide highlighter-tree-sitter">x&lt;y</code></p>"#
        );
    }

    #[rstest]
    #[case::no_highlighter(Options::default())]
    #[case::tree_sitter(tree_sitter())]
    fn code_in_image_alt_stays_plain_text(#[case] options: Options) {
        let html = to_html("![see `x<y` here](a.png)", &options).unwrap();
        assert_eq!(html, "<p><img src=\"a.png\" alt=\"see x&lt;y here\" /></p>\n");
    }

    #[test]
    fn code_after_image_is_still_converted() {
        let html = to_html("![`a`](i.png) `b`", &tree_sitter()).unwrap();
        assert_eq!(
            html,
            "<p><img src=\"i.png\" alt=\"a\" /> <code class=\"highlighter-tree-sitter\">b</code></p>\n"
        );
    }

    #[test]
    fn highlighters_escape_through_the_converter() {
        struct Bracketed;

        impl SyntaxHighlighter for Bracketed {
            fn call(
                &self,
                converter: &Converter<'_>,
                raw_text: &str,
                _language: Option<&str>,
                _kind: SpanKind,
                _options: &HighlighterOpts,
            ) -> String {
                format!("[{}]", converter.escape_html(raw_text))
            }
        }

        let mut registry = Registry::empty();
        registry.add_syntax_highlighter("bracketed", Arc::new(Bracketed));
        let converter =
            Converter::with_registry(Options::default().with_highlighter("bracketed"), &registry);

        let conversion = converter.convert("`a&b`").unwrap();

        assert_eq!(
            conversion.html,
            "<p><code class=\"highlighter-bracketed\">[a&amp;b]</code></p>\n"
        );
        assert!(conversion.warnings.is_empty());
    }

    #[test]
    fn text_that_only_looks_like_ial_is_kept() {
        let html = to_html("`a` {: .x}", &Options::default()).unwrap();
        assert_eq!(html, "<p><code>a</code> {: .x}</p>\n");
    }

    #[test]
    fn code_inside_list_and_quote() {
        let markdown = "- item\n\n  ```sh\n  echo <hi>\n  ```\n\n> quoted `q`\n";
        let html = to_html(markdown, &tree_sitter()).unwrap();

        assert!(html.contains(
            "<div class=\"language-sh highlighter-tree-sitter\"><pre><code>echo &lt;hi&gt;\n</code></pre></div>"
        ));
        assert!(html.contains("<code class=\"highlighter-tree-sitter\">q</code>"));
    }

    #[test]
    fn unknown_highlighter_warns_and_falls_back() {
        let converter = Converter::new(Options::default().with_highlighter("rouge"));
        let conversion = converter
            .convert("```ruby\nputs 1\n```\n\n`x`\n")
            .unwrap();

        assert_eq!(
            conversion.html,
            "<pre><code class=\"language-ruby\">puts 1\n</code></pre>\n<p><code>x</code></p>\n"
        );
        assert_eq!(
            conversion.warnings,
            vec!["The configured syntax highlighter rouge is not available.".to_string()]
        );
    }

    #[test]
    fn missing_parsers_dir_fails_for_labelled_code() {
        let options = tree_sitter().with_highlighter_opts(
            HighlighterOpts::default().with_parsers_dir("/definitely/not/a/parsers/dir"),
        );
        let err = to_html("~~~source.python\nprint(1)\n~~~\n", &options).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error retrieving language configuration for scope 'source.python': Language not found"
        );
    }

    #[test]
    fn missing_parsers_dir_ignored_for_unlabelled_code() {
        let options = tree_sitter().with_highlighter_opts(
            HighlighterOpts::default().with_parsers_dir("/definitely/not/a/parsers/dir"),
        );
        let html = to_html("`plain`", &options).unwrap();
        assert_eq!(html, "<p><code class=\"highlighter-tree-sitter\">plain</code></p>\n");
    }

    #[test]
    fn missing_parsers_dir_ignored_without_highlighter() {
        let options = Options::default().with_highlighter_opts(
            HighlighterOpts::default().with_parsers_dir("/definitely/not/a/parsers/dir"),
        );
        assert!(to_html("```python\nx\n```\n", &options).is_ok());
    }

    #[test]
    fn options_from_config() {
        let config = Config {
            syntax_highlighter: Some("tree-sitter".to_string()),
            syntax_highlighter_opts: HighlighterOpts::default().with_parsers_dir("/p"),
        };
        let options = Options::from(config);

        assert_eq!(options.syntax_highlighter.as_deref(), Some("tree-sitter"));
        assert_eq!(
            options.syntax_highlighter_opts.tree_sitter_parsers_dir,
            Some(PathBuf::from("/p"))
        );
    }

    #[rstest]
    #[case("", "")]
    #[case("a\n", "a")]
    #[case("a\r\n", "a")]
    #[case("a\n\n", "a\n")]
    #[case("a", "a")]
    fn chomp_drops_one_line_ending(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(chomp(input), expected);
    }
}
