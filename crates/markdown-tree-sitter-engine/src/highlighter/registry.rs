use super::{SyntaxHighlighter, TreeSitter};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

static BUILTIN: LazyLock<Registry> = LazyLock::new(Registry::default);

/// Name to highlighter lookup table consulted by the converter.
#[derive(Clone)]
pub struct Registry {
    highlighters: HashMap<String, Arc<dyn SyntaxHighlighter>>,
}

impl Registry {
    pub fn empty() -> Self {
        Self {
            highlighters: HashMap::new(),
        }
    }

    /// Process-wide table holding the built-in highlighters.
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    /// Register `highlighter` under `name`, replacing any previous entry.
    pub fn add_syntax_highlighter(
        &mut self,
        name: impl Into<String>,
        highlighter: Arc<dyn SyntaxHighlighter>,
    ) {
        self.highlighters.insert(name.into(), highlighter);
    }

    pub fn syntax_highlighter(&self, name: &str) -> Option<Arc<dyn SyntaxHighlighter>> {
        self.highlighters.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.highlighters.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.highlighters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.add_syntax_highlighter(TreeSitter::NAME, Arc::new(TreeSitter));
        registry
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("highlighters", &self.names())
            .finish()
    }
}
