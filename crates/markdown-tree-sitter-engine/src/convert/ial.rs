//! Span inline attribute lists, e.g. `` `code`{: class="language-rust" } ``.
//!
//! Only the attribute forms are understood: `key="value"`, `key='value'`,
//! `.class` and `#id`. Bare names (references to attribute list
//! definitions) are accepted and ignored.

use super::escape::escape_attribute;
use regex::Regex;
use std::sync::LazyLock;

static SPAN_IAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{:((?:\\\}|[^}])*)\}").expect("span IAL pattern is valid"));

static IAL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)
        (?P<key>[A-Za-z0-9_][\w-]*)=(?:"(?P<dq>(?:\\"|[^"])*)"|'(?P<sq>(?:\\'|[^'])*)')
        | \.(?P<class>[\w-]+)
        | \#(?P<id>[\w-]+)
        | (?P<reference>[A-Za-z0-9_][\w-]*)
        "#,
    )
    .expect("IAL token pattern is valid")
});

static LANGUAGE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\blanguage-(\S+)").expect("language class pattern is valid"));

/// Ordered HTML attributes of an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set `key`, keeping its original position when it already exists.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn append_class(&mut self, class: &str) {
        let joined = match self.get("class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set("class", joined);
    }

    /// Language named by the first `language-*` class.
    pub fn language(&self) -> Option<&str> {
        let class = self.get("class")?;
        LANGUAGE_CLASS
            .captures(class)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Mark the element as rendered by highlighter `name`.
    ///
    /// With a language, the first `language-*` class is rewritten to it, or
    /// a `language-*` class is put in front when there is none.
    pub fn add_highlighter_class(&mut self, name: &str, language: Option<&str>) {
        self.append_class(&format!("highlighter-{name}"));
        let Some(language) = language else {
            return;
        };

        let class = self.get("class").unwrap_or_default();
        let rewritten = match LANGUAGE_CLASS.find(class) {
            Some(found) => {
                let mut out = class.to_string();
                out.replace_range(found.range(), &format!("language-{language}"));
                out
            }
            None => format!("language-{language} {class}"),
        };
        self.set("class", rewritten);
    }

    /// Render as ` key="value"` pairs, ready to follow a tag name.
    pub fn to_html(&self) -> String {
        self.entries
            .iter()
            .map(|(key, value)| format!(" {key}=\"{}\"", escape_attribute(value)))
            .collect()
    }
}

/// Parse a span IAL at the very start of `text`.
///
/// Returns the attributes and the number of bytes the IAL occupies.
pub fn parse_span_ial(text: &str) -> Option<(Attributes, usize)> {
    let caps = SPAN_IAL.captures(text)?;
    let consumed = caps.get(0)?.end();
    let body = caps.get(1).map_or("", |m| m.as_str());

    let mut attrs = Attributes::default();
    for token in IAL_TOKEN.captures_iter(body) {
        if let Some(key) = token.name("key") {
            let value = token
                .name("dq")
                .map(|v| v.as_str().replace("\\\"", "\""))
                .or_else(|| token.name("sq").map(|v| v.as_str().replace("\\'", "'")))
                .unwrap_or_default();
            attrs.set(key.as_str(), value.replace("\\}", "}"));
        } else if let Some(class) = token.name("class") {
            attrs.append_class(class.as_str());
        } else if let Some(id) = token.name("id") {
            attrs.set("id", id.as_str());
        }
    }

    Some((attrs, consumed))
}
