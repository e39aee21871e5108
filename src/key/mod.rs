use std::fmt;

use serde::{Deserialize, Serialize};

use crate::reference::{IncomeBracket, Language, Region};

/// Cache key for one (region, bracket, language) request.
///
/// Equality and hashing use the four components directly, so two keys can
/// only collide when every component is equal. `Display` renders the
/// familiar `US-3000-6000-en` form; an open-ended bracket renders its upper
/// bound as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanKey {
    pub region: String,
    pub min: u64,
    pub max: Option<u64>,
    pub language: String,
}

pub fn build_key(region: &Region, bracket: &IncomeBracket, language: &Language) -> PlanKey {
    PlanKey {
        region: region.code.clone(),
        min: bracket.min,
        max: bracket.max,
        language: language.code.clone(),
    }
}

impl PlanKey {
    /// Same request in another language.
    pub fn with_language(&self, language: &Language) -> PlanKey {
        PlanKey { language: language.code.clone(), ..self.clone() }
    }
}

impl fmt::Display for PlanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}-{}-{}-{}", self.region, self.min, max, self.language),
            None => write!(f, "{}-{}-null-{}", self.region, self.min, self.language),
        }
    }
}
