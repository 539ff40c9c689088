use regex::{Regex, RegexBuilder};

use crate::models::non_empty;

pub type Normalizer = fn(&str) -> Option<String>;

/// One named pattern class for a field.
#[derive(Debug, Clone)]
pub struct PatternRule {
    class: &'static str,
    regex: Regex,
    normalize: Normalizer,
}

impl PatternRule {
    pub fn new(class: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            class,
            regex: Regex::new(pattern)?,
            normalize: non_empty,
        })
    }

    pub fn case_insensitive(class: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            class,
            regex: RegexBuilder::new(pattern).case_insensitive(true).build()?,
            normalize: non_empty,
        })
    }

    pub fn with_normalizer(mut self, normalize: Normalizer) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn class(&self) -> &'static str {
        self.class
    }

    /// Leftmost occurrence in `haystack`, normalized.
    pub fn find(&self, haystack: &str) -> Option<String> {
        self.regex
            .find(haystack)
            .and_then(|found| (self.normalize)(found.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub class: &'static str,
    pub value: String,
}

/// Pattern classes tried in declaration order; the first class with any
/// match wins, whatever its position in the text.
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    rules: Vec<PatternRule>,
}

impl PatternList {
    pub fn new(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    pub fn first_match(&self, haystack: &str) -> Option<RuleMatch> {
        self.rules.iter().find_map(|rule| {
            rule.find(haystack).map(|value| RuleMatch {
                class: rule.class(),
                value,
            })
        })
    }
}
