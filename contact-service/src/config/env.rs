use std::collections::HashMap;

/// Read-only view over environment-style settings.
///
/// Production reads the process environment; tests hand in a map so
/// resolution never depends on ambient state.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;

    /// Trimmed value of `key`, treating blank values as unset.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// First non-blank value among `keys`, in priority order.
    fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.non_empty(key))
    }

    fn flag(&self, key: &str) -> bool {
        matches!(
            self.non_empty(key).map(|v| v.to_ascii_lowercase()).as_deref(),
            Some("1" | "true" | "yes" | "on")
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_blank_values_are_unset() {
        let vars = env(&[("A", "   "), ("B", " value ")]);
        assert_eq!(vars.non_empty("A"), None);
        assert_eq!(vars.non_empty("B").as_deref(), Some("value"));
        assert_eq!(vars.non_empty("C"), None);
    }

    #[test]
    fn test_first_of_respects_priority() {
        let vars = env(&[("SECOND", "b"), ("THIRD", "c"), ("FIRST", "")]);
        assert_eq!(
            vars.first_of(&["FIRST", "SECOND", "THIRD"]).as_deref(),
            Some("b")
        );
        assert_eq!(vars.first_of(&["MISSING"]), None);
    }

    #[test]
    fn test_flag_parsing() {
        let vars = env(&[("ON", "TRUE"), ("NUM", "1"), ("OFF", "false")]);
        assert!(vars.flag("ON"));
        assert!(vars.flag("NUM"));
        assert!(!vars.flag("OFF"));
        assert!(!vars.flag("UNSET"));
    }
}
