//! Page title made of a fixed base and a stack of segments.

use std::fmt;

/// Title accumulator: `base`, then each segment after `separator`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SiteTitle {
    base: String,
    separator: String,
    segments: Vec<String>,
}

impl SiteTitle {
    pub fn new(base: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            separator: separator.into(),
            segments: Vec::new(),
        }
    }

    /// The rendered title.
    #[must_use]
    pub fn full(&self) -> String {
        if self.segments.is_empty() {
            return self.base.clone();
        }
        format!(
            "{}{}{}",
            self.base,
            self.separator,
            self.segments.join(&self.separator)
        )
    }

    /// Replace all segments with `title`.
    pub fn set(&mut self, title: impl Into<String>) {
        self.reset();
        self.push(title);
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    pub fn reset(&mut self) {
        self.segments.clear();
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for SiteTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full())
    }
}
