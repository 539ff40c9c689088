use regex::Regex;
use thiserror::Error;

use crate::lexicon::{BrandLexicon, CategoryLexicon};
use crate::models::{non_empty, Explanation, ExtractionResult, Field, FieldTrace};
use crate::pattern::{PatternList, PatternRule, RuleMatch};

const CAPITALIZED_WORD: &str = r"\b[A-Z][a-z]+\b";

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid pattern for class `{class}`: {source}")]
    Pattern {
        class: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// All extraction rules, built once and shared read-only.
#[derive(Debug, Clone)]
pub struct RuleSet {
    postal: PatternList,
    brands: BrandLexicon,
    capitalized_word: Regex,
    categories: CategoryLexicon,
    time: PatternList,
}

impl RuleSet {
    pub fn try_default() -> Result<Self, RuleError> {
        Self::with_lexicons(BrandLexicon::default(), CategoryLexicon::default())
    }

    pub fn with_lexicons(
        brands: BrandLexicon,
        categories: CategoryLexicon,
    ) -> Result<Self, RuleError> {
        Ok(Self {
            postal: postal_rules()?,
            brands,
            capitalized_word: Regex::new(CAPITALIZED_WORD).map_err(|source| {
                RuleError::Pattern {
                    class: "capitalized_word",
                    source,
                }
            })?,
            categories,
            time: time_rules()?,
        })
    }

    pub fn extract(&self, text: &str) -> ExtractionResult {
        let lowered = text.to_lowercase();
        ExtractionResult {
            postal_code: self.postal_code(text).map(|hit| hit.value),
            brand: self.brand(text, &lowered).map(|trace| trace.value),
            category: self.category(&lowered).map(|trace| trace.value),
            time_preference: self.time_preference(&lowered).map(|hit| hit.value),
        }
    }

    pub fn explain(&self, text: &str) -> Explanation {
        let lowered = text.to_lowercase();
        let mut traces = Vec::new();

        if let Some(hit) = self.postal_code(text) {
            traces.push(rule_trace(Field::PostalCode, hit));
        }
        if let Some(trace) = self.brand(text, &lowered) {
            traces.push(trace);
        }
        if let Some(trace) = self.category(&lowered) {
            traces.push(trace);
        }
        if let Some(hit) = self.time_preference(&lowered) {
            traces.push(rule_trace(Field::TimePreference, hit));
        }

        let mut result = ExtractionResult::empty();
        for trace in &traces {
            let slot = match trace.field {
                Field::PostalCode => &mut result.postal_code,
                Field::Brand => &mut result.brand,
                Field::Category => &mut result.category,
                Field::TimePreference => &mut result.time_preference,
            };
            *slot = Some(trace.value.clone());
        }

        Explanation { result, traces }
    }

    fn postal_code(&self, text: &str) -> Option<RuleMatch> {
        self.postal.first_match(text)
    }

    fn brand(&self, text: &str, lowered: &str) -> Option<FieldTrace> {
        if let Some(brand) = self.brands.find_in(lowered) {
            return Some(FieldTrace {
                field: Field::Brand,
                rule: "lexicon",
                keyword: Some(brand.to_lowercase()),
                value: brand.to_string(),
            });
        }

        // Any capitalized word counts; sentence-initial words are accepted
        // false positives.
        self.capitalized_word
            .find(text)
            .and_then(|word| non_empty(word.as_str()))
            .map(|value| FieldTrace {
                field: Field::Brand,
                rule: "capitalized_word",
                keyword: None,
                value,
            })
    }

    fn category(&self, lowered: &str) -> Option<FieldTrace> {
        self.categories.find_in(lowered).map(|hit| FieldTrace {
            field: Field::Category,
            rule: "lexicon",
            keyword: Some(hit.keyword.to_string()),
            value: hit.category.to_string(),
        })
    }

    fn time_preference(&self, lowered: &str) -> Option<RuleMatch> {
        self.time.first_match(lowered)
    }
}

fn rule_trace(field: Field, hit: RuleMatch) -> FieldTrace {
    FieldTrace {
        field,
        rule: hit.class,
        keyword: None,
        value: hit.value,
    }
}

fn postal_rules() -> Result<PatternList, RuleError> {
    Ok(PatternList::new(vec![
        rule("us_zip", r"\b\d{5}(?:-\d{4})?\b")?,
        rule_ci("ca_postal", r"\b[A-Z]\d[A-Z]\s?\d[A-Z]\d\b")?,
        rule("generic_numeric", r"\b\d{4,6}\b")?,
    ]))
}

// Applied to lower-cased text; case-insensitivity keeps the classes robust
// when called on raw input.
fn time_rules() -> Result<PatternList, RuleError> {
    Ok(PatternList::new(vec![
        rule_ci("absolute_day", r"\b(today|tonight|tomorrow|yesterday)\b")?,
        rule_ci("day_part", r"\b(morning|afternoon|evening|night)\b")?,
        rule_ci(
            "relative_day",
            r"\b(next|this)\s+(week|month|monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
        )?,
        rule_ci("urgency", r"\b(asap|urgent|immediate)\b")?,
        rule_ci("clock_time", r"\b\d{1,2}:\d{2}\s*(?:am|pm)?\b")?,
        rule_ci("duration", r"\b(in\s+\d+\s+(?:hour|day|week|month)s?)\b")?,
    ]))
}

fn rule(class: &'static str, pattern: &str) -> Result<PatternRule, RuleError> {
    PatternRule::new(class, pattern).map_err(|source| RuleError::Pattern { class, source })
}

fn rule_ci(class: &'static str, pattern: &str) -> Result<PatternRule, RuleError> {
    PatternRule::case_insensitive(class, pattern)
        .map_err(|source| RuleError::Pattern { class, source })
}
