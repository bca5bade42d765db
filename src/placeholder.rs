//! Placeholder substitution for subjects and bodies.
//!
//! Templates use `{{key}}` tokens. Substitution is a sequence of literal
//! find-and-replace passes, one per key, applied in ascending key order.
//! Because passes are sequential, a key whose token is a substring of another
//! key's token makes the result order-dependent; the deterministic key order
//! documents that quirk rather than correcting it.

use std::collections::BTreeMap;

/// Replace every `{{key}}` token in `text` with the corresponding value.
///
/// Keys with no matching token are ignored; tokens with no matching key are
/// left untouched.
///
/// ```
/// use std::collections::BTreeMap;
///
/// let mut params = BTreeMap::new();
/// params.insert("name".to_string(), "Alice".to_string());
///
/// let out = herald::replace_placeholders("Hello {{name}}, re {{order}}", &params);
/// assert_eq!(out, "Hello Alice, re {{order}}");
/// ```
pub fn replace_placeholders(text: &str, params: &BTreeMap<String, String>) -> String {
    let mut result = text.to_string();
    for (key, value) in params {
        result = replace_token(&result, key, value);
    }
    result
}

/// Replace every occurrence of a single `{{key}}` token.
pub fn replace_token(text: &str, key: &str, value: &str) -> String {
    text.replace(&format!("{{{{{}}}}}", key), value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_basic_replacement() {
        let out = replace_placeholders(
            "Dear {{name}}, your ref is {{ref}}.",
            &params(&[("name", "Alice"), ("ref", "A-17")]),
        );
        assert_eq!(out, "Dear Alice, your ref is A-17.");
    }

    #[test]
    fn test_repeated_token() {
        let out = replace_placeholders("{{x}} and {{x}}", &params(&[("x", "one")]));
        assert_eq!(out, "one and one");
    }

    #[test]
    fn test_unmatched_token_untouched() {
        let out = replace_placeholders("Hello {{missing}}", &params(&[("name", "Alice")]));
        assert_eq!(out, "Hello {{missing}}");
    }

    #[test]
    fn test_empty_params() {
        let out = replace_placeholders("Hello {{name}}", &BTreeMap::new());
        assert_eq!(out, "Hello {{name}}");
    }

    #[test]
    fn test_no_reexpansion_on_second_pass() {
        // A value containing a foreign token is not expanded by a later pass
        // over the same params when no key matches it.
        let p = params(&[("name", "{{other}}")]);
        let once = replace_placeholders("Hi {{name}}", &p);
        assert_eq!(once, "Hi {{other}}");
        let twice = replace_placeholders(&once, &p);
        assert_eq!(twice, "Hi {{other}}");
    }

    #[test]
    fn test_keys_applied_in_ascending_order() {
        // "a" is applied before "ab"; by then the {{ab}} token is intact, so
        // only the {{a}} token was consumed by the first pass.
        let out = replace_placeholders("{{a}} {{ab}}", &params(&[("a", "1"), ("ab", "2")]));
        assert_eq!(out, "1 2");
    }
}
