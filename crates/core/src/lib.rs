pub mod extract;
pub mod lexicon;
pub mod models;
pub mod pattern;

pub use extract::{RuleError, RuleSet};
pub use lexicon::{BrandLexicon, CategoryHit, CategoryLexicon};
pub use models::*;
pub use pattern::{PatternList, PatternRule, RuleMatch};
