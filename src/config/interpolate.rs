//! `${VAR}` / `${VAR@default}` expansion for config values.
//!
//! Unknown variables without a default are left verbatim so a typo shows up
//! in the status log instead of silently becoming an empty string.

use regex::Regex;
use std::sync::LazyLock;

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^@}]*)(?:@([^}]*))?\}").unwrap());

/// Expand against the process environment.
pub fn expand_env(value: &str) -> String {
    expand_with(value, |name| std::env::var(name).ok())
}

/// Expand using an arbitrary lookup. Empty lookups count as unset.
pub fn expand_with<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    VARIABLE
        .replace_all(value, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match lookup(name).filter(|v| !v.is_empty()) {
                Some(v) => v,
                None => match caps.get(2) {
                    Some(default) => default.as_str().to_string(),
                    None => caps[0].to_string(),
                },
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn substitutes_known_variable() {
        let out = expand_with("Bearer ${TOKEN}", env(&[("TOKEN", "abc")]));
        assert_eq!(out, "Bearer abc");
    }

    #[test]
    fn falls_back_to_default() {
        let out = expand_with("${HOST@https://fs.example.test}/scan", env(&[]));
        assert_eq!(out, "https://fs.example.test/scan");
    }

    #[test]
    fn empty_variable_uses_default() {
        let out = expand_with("${TOKEN@fallback}", env(&[("TOKEN", "")]));
        assert_eq!(out, "fallback");
    }

    #[test]
    fn empty_default_is_honoured() {
        let out = expand_with("x${MISSING@}y", env(&[]));
        assert_eq!(out, "xy");
    }

    #[test]
    fn unknown_without_default_is_left_alone() {
        let out = expand_with("${MISSING}", env(&[]));
        assert_eq!(out, "${MISSING}");
    }

    #[test]
    fn multiple_occurrences() {
        let out = expand_with("${A}-${B@2}-${A}", env(&[("A", "1")]));
        assert_eq!(out, "1-2-1");
    }
}
