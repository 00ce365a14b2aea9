//! Static provider price tables and model resolution.
//!
//! Rates are USD per million tokens. Lookup runs in two stages: an exact,
//! case-insensitive `(provider, model)` index, then a scan over the
//! provider's models in declaration order for the first one whose name
//! contains the query. The fallback lets `claude-sonnet-4-5` resolve to
//! `claude-sonnet-4-5-20250929`; reordering the table changes which entry a
//! partial name lands on.

use serde::Serialize;
use std::collections::HashMap;

/// Billing rates for one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceEntry {
    pub provider: String,
    pub model: String,
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
    /// Rate for input tokens served from the prompt cache (0 when unsupported).
    pub cached_per_mtok: f64,
}

impl PriceEntry {
    pub fn new(
        provider: &str,
        model: &str,
        input_per_mtok: f64,
        output_per_mtok: f64,
        cached_per_mtok: f64,
    ) -> Self {
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            input_per_mtok,
            output_per_mtok,
            cached_per_mtok,
        }
    }
}

/// (provider, model, input, output, cached)
const BUILTIN_PRICES: &[(&str, &str, f64, f64, f64)] = &[
    ("openai", "gpt-4o", 2.50, 10.00, 1.25),
    ("openai", "gpt-4o-mini", 0.15, 0.60, 0.075),
    ("openai", "gpt-4.1", 2.00, 8.00, 0.50),
    ("openai", "gpt-4.1-mini", 0.40, 1.60, 0.10),
    ("openai", "gpt-4.1-nano", 0.10, 0.40, 0.025),
    ("openai", "o3", 10.00, 40.00, 2.50),
    ("openai", "o3-mini", 1.10, 4.40, 0.55),
    ("openai", "o4-mini", 1.10, 4.40, 0.275),
    ("anthropic", "claude-opus-4-6", 15.00, 75.00, 7.50),
    ("anthropic", "claude-sonnet-4-5-20250929", 3.00, 15.00, 1.50),
    ("anthropic", "claude-haiku-4-5-20251001", 0.80, 4.00, 0.40),
    ("google", "gemini-2.5-pro", 1.25, 10.00, 0.315),
    ("google", "gemini-2.5-flash", 0.15, 0.60, 0.0375),
    ("google", "gemini-2.0-flash", 0.10, 0.40, 0.025),
    ("groq", "llama-3.3-70b", 0.59, 0.79, 0.0),
    ("groq", "llama-3.1-8b", 0.05, 0.08, 0.0),
    ("groq", "llama-4-scout", 0.11, 0.34, 0.0),
    ("groq", "deepseek-r1-distill-70b", 0.75, 0.99, 0.0),
    ("deepseek", "deepseek-r1", 0.55, 2.19, 0.14),
    ("deepseek", "deepseek-v3", 0.27, 1.10, 0.07),
];

/// Immutable price table with a two-stage resolver.
#[derive(Debug, Clone)]
pub struct PriceTable {
    entries: Vec<PriceEntry>,
    exact: HashMap<(String, String), usize>,
}

impl PriceTable {
    /// Build a table from entries in declaration order. On duplicate
    /// `(provider, model)` keys the first declaration wins.
    pub fn new(entries: Vec<PriceEntry>) -> Self {
        let mut exact = HashMap::with_capacity(entries.len());
        for (i, e) in entries.iter().enumerate() {
            exact.entry(normalize_key(&e.provider, &e.model)).or_insert(i);
        }
        Self { entries, exact }
    }

    /// The table shipped with the binary.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_PRICES
                .iter()
                .map(|&(p, m, i, o, c)| PriceEntry::new(p, m, i, o, c))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[PriceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve billing rates for `(provider, model)`.
    ///
    /// Returns `None` for unknown models; callers price those at zero.
    pub fn resolve(&self, provider: &str, model: &str) -> Option<&PriceEntry> {
        let (provider, model) = normalize_key(provider, model);
        if let Some(&i) = self.exact.get(&(provider.clone(), model.clone())) {
            return Some(&self.entries[i]);
        }
        self.entries.iter().find(|e| {
            e.provider.to_lowercase() == provider && e.model.to_lowercase().contains(&model)
        })
    }

    /// Entries grouped by provider, providers in first-appearance order.
    pub fn by_provider(&self) -> Vec<(&str, Vec<&PriceEntry>)> {
        let mut groups: Vec<(&str, Vec<&PriceEntry>)> = Vec::new();
        for e in &self.entries {
            match groups.iter_mut().find(|(p, _)| *p == e.provider) {
                Some((_, list)) => list.push(e),
                None => groups.push((e.provider.as_str(), vec![e])),
            }
        }
        groups
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize_key(provider: &str, model: &str) -> (String, String) {
    (provider.to_lowercase(), model.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_case_insensitive() {
        let t = PriceTable::builtin();
        let e = t.resolve("OpenAI", "GPT-4o").unwrap();
        assert_eq!(e.model, "gpt-4o");
        assert!((e.input_per_mtok - 2.50).abs() < f64::EPSILON);
    }

    #[test]
    fn exact_match_beats_earlier_substring() {
        // "gpt-4o" is a substring of "gpt-4o-mini"; the exact entry wins either way,
        // and an exact "gpt-4o-mini" must not fall back to "gpt-4o".
        let t = PriceTable::builtin();
        assert_eq!(t.resolve("openai", "gpt-4o-mini").unwrap().model, "gpt-4o-mini");
        assert_eq!(t.resolve("openai", "o3").unwrap().model, "o3");
    }

    #[test]
    fn partial_name_resolves_to_first_declared() {
        let t = PriceTable::builtin();
        assert_eq!(
            t.resolve("anthropic", "sonnet").unwrap().model,
            "claude-sonnet-4-5-20250929"
        );
        // "gpt-4.1" is exact; "4.1-" is partial and hits gpt-4.1-mini before nano.
        assert_eq!(t.resolve("openai", "4.1-").unwrap().model, "gpt-4.1-mini");
        assert_eq!(t.resolve("openai", "mini").unwrap().model, "gpt-4o-mini");
    }

    #[test]
    fn fallback_is_scoped_to_provider() {
        let t = PriceTable::builtin();
        // deepseek-r1-distill-70b lives under groq, deepseek-r1 under deepseek.
        assert_eq!(t.resolve("deepseek", "r1").unwrap().model, "deepseek-r1");
        assert_eq!(t.resolve("groq", "deepseek").unwrap().model, "deepseek-r1-distill-70b");
        assert!(t.resolve("google", "claude").is_none());
    }

    #[test]
    fn unknown_model_or_provider() {
        let t = PriceTable::builtin();
        assert!(t.resolve("openai", "gpt-9").is_none());
        assert!(t.resolve("mistral", "gpt-4o").is_none());
    }

    #[test]
    fn duplicate_keys_keep_first_declaration() {
        let t = PriceTable::new(vec![
            PriceEntry::new("acme", "m1", 1.0, 2.0, 0.0),
            PriceEntry::new("ACME", "M1", 9.0, 9.0, 9.0),
        ]);
        assert!((t.resolve("acme", "m1").unwrap().input_per_mtok - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn groups_follow_declaration_order() {
        let t = PriceTable::builtin();
        let providers: Vec<&str> = t.by_provider().iter().map(|(p, _)| *p).collect();
        assert_eq!(providers, ["openai", "anthropic", "google", "groq", "deepseek"]);
        let groups = t.by_provider();
        assert_eq!(groups[0].1.len(), 8);
        assert_eq!(groups[1].1[0].model, "claude-opus-4-6");
        assert_eq!(t.len(), 20);
    }
}
