//! Built-in reference data: regions, languages and per-region income brackets.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub code: String,
    pub name: String,
    pub currency_code: String,
    pub currency_symbol: String,
    pub group: String,
    /// Monthly amount separating low incomes from the rest.
    pub base_scale: u64,
}

/// Half-open range `[min, max)`. `max == None` means "and above".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeBracket {
    pub min: u64,
    pub max: Option<u64>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

impl Region {
    pub fn new(
        code: &str,
        name: &str,
        currency_code: &str,
        currency_symbol: &str,
        group: &str,
        base_scale: u64,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            currency_code: currency_code.into(),
            currency_symbol: currency_symbol.into(),
            group: group.into(),
            base_scale,
        }
    }

    /// `12000` -> `"$12,000"`
    pub fn format_amount(&self, amount: u64) -> String {
        format!("{}{}", self.currency_symbol, group_digits(amount))
    }
}

impl IncomeBracket {
    pub fn new(min: u64, max: Option<u64>, label: impl Into<String>) -> Self {
        Self { min, max, label: label.into() }
    }

    pub fn is_zero(&self) -> bool {
        self.min == 0 && self.max == Some(0)
    }

    pub fn is_low(&self, region: &Region) -> bool {
        matches!(self.max, Some(max) if max <= region.base_scale)
    }

    /// Budgeting base: the upper bound when present, otherwise the lower bound.
    pub fn target_income(&self) -> u64 {
        match self.max {
            Some(max) if max > 0 => max,
            _ => self.min,
        }
    }
}

impl Language {
    pub fn new(code: &str, name: &str) -> Self {
        Self { code: code.into(), name: name.into() }
    }
}

pub fn regions() -> Vec<Region> {
    vec![
        Region::new("US", "United States", "USD", "$", "North America", 3000),
        Region::new("CA", "Canada", "CAD", "$", "North America", 3500),
        Region::new("BR", "Brazil", "BRL", "R$", "South America", 3000),
        Region::new("GB", "United Kingdom", "GBP", "£", "Europe", 2500),
        Region::new("DE", "Germany", "EUR", "€", "Europe", 2500),
        Region::new("IN", "India", "INR", "₹", "Asia", 30000),
        Region::new("JP", "Japan", "JPY", "¥", "Asia", 250000),
        Region::new("NG", "Nigeria", "NGN", "₦", "Africa", 150000),
    ]
}

pub fn languages() -> Vec<Language> {
    vec![
        Language::new("en", "English"),
        Language::new("es", "Español"),
        Language::new("fr", "Français"),
        Language::new("de", "Deutsch"),
        Language::new("pt", "Português"),
        Language::new("hi", "हिन्दी"),
        Language::new("ja", "日本語"),
        Language::new("zh", "中文"),
    ]
}

pub fn default_language() -> Language {
    Language::new("en", "English")
}

pub fn find_region(code: &str) -> Option<Region> {
    regions().into_iter().find(|r| r.code.eq_ignore_ascii_case(code))
}

pub fn find_language(code: &str) -> Option<Language> {
    languages().into_iter().find(|l| l.code.eq_ignore_ascii_case(code))
}

/// Brackets offered for a region, scaled from its base scale.
pub fn income_brackets(region: &Region) -> Vec<IncomeBracket> {
    let b = region.base_scale;
    let amt = |v: u64| region.format_amount(v);
    vec![
        IncomeBracket::new(0, Some(0), "No income"),
        IncomeBracket::new(1, Some(b), format!("Under {}", amt(b))),
        IncomeBracket::new(b, Some(2 * b), format!("{} - {}", amt(b), amt(2 * b))),
        IncomeBracket::new(2 * b, Some(4 * b), format!("{} - {}", amt(2 * b), amt(4 * b))),
        IncomeBracket::new(4 * b, Some(8 * b), format!("{} - {}", amt(4 * b), amt(8 * b))),
        IncomeBracket::new(8 * b, None, format!("{}+", amt(8 * b))),
    ]
}

fn group_digits(v: u64) -> String {
    let digits = v.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(3000), "3,000");
        assert_eq!(group_digits(1234567), "1,234,567");
    }

    #[test]
    fn brackets_scale_from_base() {
        let us = find_region("us").unwrap();
        let brackets = income_brackets(&us);
        assert_eq!(brackets.len(), 6);
        assert!(brackets[0].is_zero());
        assert_eq!(brackets[2].min, 3000);
        assert_eq!(brackets[2].max, Some(6000));
        assert_eq!(brackets[2].label, "$3,000 - $6,000");
        assert_eq!(brackets[5].max, None);
        assert_eq!(brackets[5].label, "$24,000+");
    }

    #[test]
    fn classification_rules() {
        let us = find_region("US").unwrap();
        let zero = IncomeBracket::new(0, Some(0), "none");
        assert!(zero.is_zero());
        assert!(zero.is_low(&us));

        let low = IncomeBracket::new(1, Some(3000), "low");
        assert!(!low.is_zero());
        assert!(low.is_low(&us));

        let mid = IncomeBracket::new(3000, Some(6000), "mid");
        assert!(!mid.is_low(&us));

        let open = IncomeBracket::new(24000, None, "open");
        assert!(!open.is_low(&us));
        assert!(!open.is_zero());
    }

    #[test]
    fn target_income_prefers_max() {
        assert_eq!(IncomeBracket::new(3000, Some(6000), "").target_income(), 6000);
        assert_eq!(IncomeBracket::new(24000, None, "").target_income(), 24000);
        assert_eq!(IncomeBracket::new(0, Some(0), "").target_income(), 0);
    }

    #[test]
    fn lookups_are_case_insensitive() {
        assert_eq!(find_language("ES").unwrap().code, "es");
        assert!(find_region("xx").is_none());
    }
}
