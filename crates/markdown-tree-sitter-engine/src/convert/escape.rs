use std::borrow::Cow;

/// Escape text for an HTML element body: `&`, `<` and `>` only.
///
/// Quotes are left as written.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    html_escape::encode_text(text)
}

/// Escape a value placed inside a double-quoted HTML attribute.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(value)
}
