use crate::constants::{DESCRIPTIVE_NAME_KEYS, SYNTHESIZED_NAME_MARKER};
use crate::types::Tags;

/// Name to show for a node: its `name` tag when present and non-empty,
/// otherwise a description built from the first descriptive tag it carries
/// (e.g. `amenity=cafe` becomes `"Amenity: Cafe"`). `None` when neither exists.
pub fn display_name(tags: &Tags) -> Option<String> {
    if let Some(name) = tags.get("name").filter(|n| !n.is_empty()) {
        return Some(name.clone());
    }

    DESCRIPTIVE_NAME_KEYS.iter().find_map(|key| {
        tags.get(*key)
            .map(|value| format!("{}{} {}", capitalize(key), SYNTHESIZED_NAME_MARKER, capitalize(value)))
    })
}

/// Whether a display name carries the synthesized-name marker
pub fn is_synthesized(name: &str) -> bool {
    name.contains(SYNTHESIZED_NAME_MARKER)
}

/// Upper-case the first character and lower-case the rest
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_name_tag_wins() {
        let t = tags(&[("name", "Toko Roti"), ("shop", "bakery")]);
        assert_eq!(display_name(&t).as_deref(), Some("Toko Roti"));
    }

    #[test]
    fn test_empty_name_falls_back_to_description() {
        let t = tags(&[("name", ""), ("amenity", "cafe")]);
        assert_eq!(display_name(&t).as_deref(), Some("Amenity: Cafe"));
    }

    #[test]
    fn test_descriptive_key_priority() {
        // shop is tried before amenity
        let t = tags(&[("amenity", "atm"), ("shop", "FAST_food")]);
        assert_eq!(display_name(&t).as_deref(), Some("Shop: Fast_food"));
    }

    #[test]
    fn test_no_name_source() {
        assert_eq!(display_name(&tags(&[("natural", "tree")])), None);
        assert_eq!(display_name(&Tags::new()), None);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("bAKERY"), "Bakery");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("école"), "École");
    }

    #[test]
    fn test_is_synthesized() {
        assert!(is_synthesized("Amenity: Cafe"));
        assert!(!is_synthesized("Bank Mandiri"));
    }
}
