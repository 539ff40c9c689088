use serde::Serialize;

/// The four fields pulled out of a free-text request.
///
/// Every field is either absent or a non-empty, trimmed string. The wire
/// names (`zip`, `time_pref`) are the public response schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    #[serde(rename = "zip")]
    pub postal_code: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "time_pref")]
    pub time_preference: Option<String>,
}

impl ExtractionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn found_fields(&self) -> usize {
        [
            &self.postal_code,
            &self.brand,
            &self.category,
            &self.time_preference,
        ]
        .iter()
        .filter(|field| field.is_some())
        .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    Rules,
    Delegate,
    Fallback,
}

impl ExtractionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rules => "rules",
            Self::Delegate => "delegate",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub result: ExtractionResult,
    pub source: ExtractionSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    PostalCode,
    Brand,
    Category,
    TimePreference,
}

/// Which rule produced a field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldTrace {
    pub field: Field,
    /// Pattern class name, `lexicon`, or `capitalized_word`.
    pub rule: &'static str,
    /// Lexicon keyword that hit, when the rule is lexicon based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub result: ExtractionResult,
    pub traces: Vec<FieldTrace>,
}

/// Trims `raw` and turns the empty string into absence.
pub fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
