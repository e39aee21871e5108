use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::PlanError;

/// ========================================
/// Request/Response contract with the generation service
/// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    /// Zero or low income: survival wins and growth paths.
    SurvivalAndGrowth,
    /// Everyone else: ideal allocation of a monthly income.
    Allocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Professional,
    Supportive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub template: Template,
    pub tone: Tone,
    pub zero_income: bool,
    pub low_income: bool,
    pub target_income: u64,
    pub language: String,
    pub prompt: String,
    /// JSON Schema the response must satisfy.
    pub schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCategory {
    pub name: String,
    pub percentage: f64,
    pub amount: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub estimated_monthly_income: f64,
    pub currency: String,
    pub breakdown: Vec<BudgetCategory>,
    pub summary: String,
    pub actionable_tips: Vec<String>,
    pub investment_advice: String,
    pub quote: String,
    pub life_goal: String,
}

impl Plan {
    pub fn percentage_total(&self) -> f64 {
        self.breakdown.iter().map(|c| c.percentage).sum()
    }

    pub fn amount_total(&self) -> f64 {
        self.breakdown.iter().map(|c| c.amount).sum()
    }

    /// Whether the breakdown adds up to 100% within `tolerance` percentage
    /// points. Informational: unbalanced plans are still displayed.
    pub fn is_balanced(&self, tolerance: f64) -> bool {
        (self.percentage_total() - 100.0).abs() <= tolerance
    }
}

/// Parse raw service text into a [`Plan`].
///
/// Empty text means the service produced nothing and is reported as
/// unavailable. Text that is not a plan fails closed.
pub fn parse_plan(text: &str) -> Result<Plan, PlanError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(PlanError::GenerationUnavailable("empty response payload".into()));
    }

    match serde_json::from_str::<Plan>(trimmed) {
        Ok(plan) => Ok(plan),
        Err(strict_err) => {
            // Fallback: the model wrapped the object in prose or code fences.
            if let Some(obj) = extract_first_json_object(trimmed) {
                if obj.len() != trimmed.len() {
                    return serde_json::from_str::<Plan>(obj)
                        .map_err(|e| PlanError::InvalidPlanPayload(e.to_string()));
                }
            }
            Err(PlanError::InvalidPlanPayload(strict_err.to_string()))
        }
    }
}

/// Extracts the first top-level JSON object substring from a string.
/// Braces inside string literals are ignored; returns None if unbalanced.
fn extract_first_json_object(s: &str) -> Option<&str> {
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in s.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' if start.is_some() => in_string = true,
            b'{' => {
                if start.is_none() {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|st| &s[st..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
