use serde_json::{json, Value};

use crate::reference::{IncomeBracket, Language, Region};
use crate::wire::{GenerationRequest, Template, Tone};

fn tone_instruction(tone: Tone) -> &'static str {
    match tone {
        Tone::Professional => "Tone: Professional and helpful.",
        Tone::Supportive => {
            "Tone: Highly motivational, compassionate, optimistic and empowering. \
             Focus on potential, future growth and immediate survival wins. \
             Make the user feel supported and hopeful."
        }
    }
}

fn zero_income_prompt(region: &Region, language: &Language, tone: Tone) -> String {
    format!(
r#"Role: Compassionate local financial advisor for {name}.
Task: Provide survival strategies and resources for a person with zero income (unemployed).
Context: Social safety nets and economy of {name}.
Language: {lang} ({lang_code}). Write every text field in this language.
{tone}

Output JSON with:
- estimatedMonthlyIncome: 0, or the typical welfare amount available in {name}.
- breakdown: categories Housing, Food, Job Search, Essentials. Allocate 0 for every amount.
- summary: 2 sentences. Open with strong encouragement; stress that this is temporary and help exists.
- actionableTips: 5 tips strictly specific to {name}: named government aid schemes, local NGOs, food banks, free upskilling platforms.
- investmentAdvice: 1 paragraph titled "Your Path to Growth" on finding work, gig work or high-demand skills in {name}.
- quote: A famous, inspiring quote about resilience, hope or new beginnings.
- lifeGoal: One concrete, immediate goal (e.g. "Secure a part-time role within 30 days" or "Build an emergency fund of {symbol}500")."#,
        name = region.name,
        lang = language.name,
        lang_code = language.code,
        tone = tone_instruction(tone),
        symbol = region.currency_symbol,
    )
}

fn allocation_prompt(
    region: &Region,
    language: &Language,
    tone: Tone,
    target_income: u64,
    growth_focus: bool,
) -> String {
    let advice = if growth_focus {
        r#"titled "Path to Financial Growth": increasing income, side hustles and education"#.to_string()
    } else {
        format!(
            "on asset classes actually available in {}: specific mutual funds, gold schemes, property markets",
            region.name
        )
    };
    format!(
r#"Role: Local financial advisor for {name}.
Task: Create an ideal budget allocation for a monthly income of {income} {currency}.
Context: Economy of {name}.
Language: {lang} ({lang_code}). Write every text field in this language.
{tone}

Output JSON with:
- estimatedMonthlyIncome: Net monthly income, using {income} as the gross base and deducting approximate taxes.
- breakdown: categories Housing, Food, Transport, Utilities, Savings, Personal, Health. Amounts must sum to the net income and percentages to 100.
- summary: 2 sentences, motivating about what this income can achieve in {name}.
- actionableTips: 5 saving tips strictly specific to {name}: local apps, bank account types, discount cards, cultural money-saving habits.
- investmentAdvice: 1 paragraph {advice}.
- quote: A famous, inspiring quote about wealth, success or financial discipline.
- lifeGoal: One ambitious yet achievable financial life goal for this income in {name} (e.g. a down payment in a major city, or a portfolio of {symbol}10,000)."#,
        name = region.name,
        income = target_income,
        currency = region.currency_code,
        lang = language.name,
        lang_code = language.code,
        tone = tone_instruction(tone),
        advice = advice,
        symbol = region.currency_symbol,
    )
}

/// Output schema required of every plan response, whatever the template.
pub fn plan_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "estimatedMonthlyIncome": { "type": "number", "description": "Net monthly income used for calculation" },
            "currency": { "type": "string" },
            "breakdown": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "percentage": { "type": "number" },
                        "amount": { "type": "number" },
                        "color": { "type": "string", "description": "Hex colour for charts" }
                    },
                    "required": ["name", "percentage", "amount", "color"],
                    "additionalProperties": false
                }
            },
            "summary": { "type": "string" },
            "actionableTips": { "type": "array", "items": { "type": "string" } },
            "investmentAdvice": { "type": "string" },
            "quote": { "type": "string", "description": "An inspiring quote relevant to the financial context" },
            "lifeGoal": { "type": "string", "description": "A specific financial life goal to motivate the user" }
        },
        "required": [
            "estimatedMonthlyIncome", "currency", "breakdown", "summary",
            "actionableTips", "investmentAdvice", "quote", "lifeGoal"
        ],
        "additionalProperties": false
    })
}

pub fn build(region: &Region, bracket: &IncomeBracket, language: &Language) -> GenerationRequest {
    let zero_income = bracket.is_zero();
    let low_income = bracket.is_low(region);
    let target_income = bracket.target_income();

    let (template, tone) = if zero_income || low_income {
        (Template::SurvivalAndGrowth, Tone::Supportive)
    } else {
        (Template::Allocation, Tone::Professional)
    };

    let prompt = if zero_income {
        zero_income_prompt(region, language, tone)
    } else {
        allocation_prompt(region, language, tone, target_income, low_income)
    };

    GenerationRequest {
        template,
        tone,
        zero_income,
        low_income,
        target_income,
        language: language.code.clone(),
        prompt,
        schema: plan_schema(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{find_language, find_region};

    fn en() -> Language {
        find_language("en").unwrap()
    }

    #[test]
    fn standard_bracket_uses_allocation_template() {
        let us = Region::new("US", "United States", "USD", "$", "North America", 3000);
        let req = build(&us, &IncomeBracket::new(3000, Some(6000), ""), &en());
        assert!(!req.zero_income);
        assert!(!req.low_income);
        assert_eq!(req.template, Template::Allocation);
        assert_eq!(req.tone, Tone::Professional);
        assert_eq!(req.target_income, 6000);
        assert!(req.prompt.contains("6000 USD"));
        assert!(req.prompt.contains("asset classes"));
    }

    #[test]
    fn zero_income_selects_survival_regardless_of_scale() {
        for code in ["US", "IN", "JP"] {
            let region = find_region(code).unwrap();
            let req = build(&region, &IncomeBracket::new(0, Some(0), ""), &en());
            assert!(req.zero_income);
            assert_eq!(req.target_income, 0);
            assert_eq!(req.template, Template::SurvivalAndGrowth);
            assert!(req.prompt.contains("zero income"));
        }
    }

    #[test]
    fn low_income_gets_growth_framing() {
        let us = find_region("US").unwrap();
        let req = build(&us, &IncomeBracket::new(1, Some(3000), ""), &en());
        assert!(req.low_income);
        assert!(!req.zero_income);
        assert_eq!(req.template, Template::SurvivalAndGrowth);
        assert_eq!(req.tone, Tone::Supportive);
        assert!(req.prompt.contains("Path to Financial Growth"));
    }

    #[test]
    fn open_ended_bracket_is_never_low() {
        let us = find_region("US").unwrap();
        let req = build(&us, &IncomeBracket::new(24000, None, ""), &en());
        assert!(!req.low_income);
        assert_eq!(req.target_income, 24000);
        assert_eq!(req.template, Template::Allocation);
    }

    #[test]
    fn schema_always_requires_every_plan_field() {
        let us = find_region("US").unwrap();
        for bracket in crate::reference::income_brackets(&us) {
            let req = build(&us, &bracket, &en());
            let required = req.schema["required"].as_array().unwrap();
            assert_eq!(required.len(), 8);
            let item_required = req.schema["properties"]["breakdown"]["items"]["required"]
                .as_array()
                .unwrap();
            assert_eq!(item_required.len(), 4);
        }
    }

    #[test]
    fn prompt_names_requested_language() {
        let us = find_region("US").unwrap();
        let es = find_language("es").unwrap();
        let req = build(&us, &IncomeBracket::new(3000, Some(6000), ""), &es);
        assert_eq!(req.language, "es");
        assert!(req.prompt.contains("Español (es)"));
    }
}
