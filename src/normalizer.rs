use crate::config::SetMapping;
use crate::model::{FetchError, Grade};
use std::collections::HashMap;

/// Maps a free-form grade label onto a `Grade`. Absent or unknown labels are raw.
pub fn normalize_grade(label: Option<&str>) -> Grade {
    let Some(label) = label else {
        return Grade::Raw;
    };
    let compact: String = label
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    match compact.as_str() {
        "psa 8" | "psa8" => Grade::Psa8,
        "psa 9" | "psa9" => Grade::Psa9,
        "psa 10" | "psa10" => Grade::Psa10,
        _ => Grade::Raw,
    }
}

/// Whether an upstream listing type denotes an auction.
pub fn is_auction_type(kind: &str) -> bool {
    let kind = kind.to_lowercase();
    kind.contains("auction") || kind.contains("enchère")
}

/// Resolves set codes or set names to the sales upstream's set identity.
pub struct SetResolver {
    mapping: HashMap<String, SetMapping>,
}

impl SetResolver {
    pub fn new(mapping: HashMap<String, SetMapping>) -> Self {
        Self { mapping }
    }

    pub fn resolve(&self, set_name: &str) -> Result<&SetMapping, FetchError> {
        self.mapping
            .get(set_name)
            .or_else(|| self.mapping.get(set_name.trim()))
            .ok_or_else(|| FetchError::NotFound(format!("set not found: {}", set_name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grades_are_case_and_space_insensitive() {
        assert_eq!(normalize_grade(Some("PSA 10")), Grade::Psa10);
        assert_eq!(normalize_grade(Some("psa  9")), Grade::Psa9);
        assert_eq!(normalize_grade(Some("Psa8")), Grade::Psa8);
        assert_eq!(normalize_grade(Some("BGS 9.5")), Grade::Raw);
        assert_eq!(normalize_grade(Some("")), Grade::Raw);
        assert_eq!(normalize_grade(None), Grade::Raw);
    }

    #[test]
    fn detects_auction_listing_types() {
        assert!(is_auction_type("Auction"));
        assert!(is_auction_type("Enchère"));
        assert!(!is_auction_type("Buy It Now"));
    }

    #[test]
    fn unknown_set_is_not_found() {
        let mut mapping = HashMap::new();
        mapping.insert(
            "base1".to_string(),
            SetMapping { name: "Base Set".into(), id: "1".into() },
        );
        let resolver = SetResolver::new(mapping);
        assert_eq!(resolver.resolve("base1").unwrap().id, "1");
        assert!(matches!(resolver.resolve("nope"), Err(FetchError::NotFound(_))));
    }
}
