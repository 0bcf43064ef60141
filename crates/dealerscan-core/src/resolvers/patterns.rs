//! Regex patterns shared by the field resolvers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Dealer business vocabulary (matched on lowercased text)
    pub static ref BUSINESS_KEYWORD: Regex = Regex::new(
        r"\b(tractors?|motors|agency|agencies|implements|equipment|enterprises)\b"
    ).unwrap();

    // Model table rows (matched on uppercased text), branded form first
    pub static ref MODEL_ROW_BRANDED: Regex = Regex::new(
        r"\b(?:SWARAJ|MAHINDRA|MF|JD)\s*\d{3,4}\s*[A-Z]{1,3}\b"
    ).unwrap();

    pub static ref MODEL_ROW_BARE: Regex = Regex::new(
        r"\b\d{3,4}\s*[A-Z]{1,3}\b"
    ).unwrap();

    // Configuration noise around model names
    pub static ref MODEL_NOISE: Regex = Regex::new(
        r"\b(HP|WD|CYLINDER|CATG|TRACTOR|PTO|TYRE|SIZE|X)\b"
    ).unwrap();

    pub static ref LEADING_BRAND: Regex = Regex::new(
        r"^(SWARAJ|MAHINDRA|MF|JD)\s+"
    ).unwrap();

    // Canonical model core, e.g. "575 DI", "MF 241R"
    pub static ref MODEL_CORE: Regex = Regex::new(
        r"\b(?:MF|SWARAJ|MAHINDRA|JD)?\s*\d{3,4}\s*[A-Z]{1,3}\b"
    ).unwrap();

    // Horsepower values: 2-3 digits, optional decimals
    pub static ref HP_NUMBER: Regex = Regex::new(
        r"\b\d{2,3}(\.\d+)?\b"
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    pub static ref NON_ALNUM: Regex = Regex::new(r"[^A-Z0-9 ]").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_model_row_patterns() {
        let row = "1 MAHINDRA 575 DI XP PLUS 1 750000";
        assert_eq!(MODEL_ROW_BRANDED.find(row).unwrap().as_str(), "MAHINDRA 575 DI");
        assert_eq!(MODEL_ROW_BARE.find("2 744 FE 1").unwrap().as_str(), "744 FE");
    }

    #[test]
    fn test_business_keywords() {
        let text = "shree ram tractors and implements";
        assert_eq!(BUSINESS_KEYWORD.find_iter(text).count(), 2);
        assert_eq!(BUSINESS_KEYWORD.find_iter("tractorsworld").count(), 0);
    }

    #[test]
    fn test_hp_number() {
        let found: Vec<&str> = HP_NUMBER
            .find_iter("engine 47.5 hp, 3 cyl, 2400 rpm")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["47.5"]);
    }
}
