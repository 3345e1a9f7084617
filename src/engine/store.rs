// Wardsim Engine — Response Store
//
// Owns the ordered rule list plus the persistence port behind it. The wire
// and on-disk format is a flat JSON array of rules, always written whole —
// last write wins, no patching. A missing or corrupt backing file degrades
// to an empty store with a warning; the simulator must keep talking even
// when its memory is gone.
//
// The maintenance CRUD surface addresses rules by stable uuid, never by
// position — the list reorders only by append, but ids survive reloads.

use crate::atoms::error::EngineResult;
use crate::atoms::traits::RulePersistence;
use crate::atoms::types::{new_rule_id, KeywordEntry, ResponseRule};
use log::{info, warn};
use std::path::PathBuf;

// ── Store ──────────────────────────────────────────────────────────────────

pub struct ResponseStore {
    rules: Vec<ResponseRule>,
    port: Box<dyn RulePersistence>,
}

impl ResponseStore {
    /// Load the store through its port. Any load failure is non-fatal:
    /// the store starts empty and the next persist rebuilds the file.
    pub fn load(port: Box<dyn RulePersistence>) -> Self {
        let mut rules = match port.load() {
            Ok(rules) => rules,
            Err(e) => {
                warn!("[store] Load failed, starting with an empty store: {}", e);
                Vec::new()
            }
        };

        // Legacy files carry no ids — assign them on first load.
        let mut assigned = 0;
        for rule in &mut rules {
            if rule.id.is_empty() {
                rule.id = new_rule_id();
                assigned += 1;
            }
        }
        if assigned > 0 {
            info!("[store] Assigned ids to {} legacy rule(s)", assigned);
        }

        info!("[store] Loaded {} rule(s)", rules.len());
        ResponseStore { rules, port }
    }

    pub fn rules(&self) -> &[ResponseRule] {
        &self.rules
    }

    /// Mutable access for the learning engine. Callers are responsible for
    /// calling `persist()` once their mutations are complete.
    pub fn rules_mut(&mut self) -> &mut Vec<ResponseRule> {
        &mut self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Write the whole store through the port.
    pub fn persist(&self) -> EngineResult<()> {
        self.port.save(&self.rules)
    }

    // ── Maintenance CRUD ───────────────────────────────────────────────

    /// Replace the entire store (the bulk-overwrite endpoint).
    pub fn replace_all(&mut self, mut rules: Vec<ResponseRule>) -> EngineResult<()> {
        for rule in &mut rules {
            if rule.id.is_empty() {
                rule.id = new_rule_id();
            }
        }
        self.rules = rules;
        self.persist()
    }

    /// Manually create a rule from a comma-separated keyword list.
    /// Returns the new rule's id.
    pub fn create_manual(&mut self, keyword_csv: &str, reply: &str) -> EngineResult<String> {
        let keywords: Vec<KeywordEntry> = keyword_csv
            .split(',')
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(KeywordEntry::new)
            .collect();
        if keywords.is_empty() {
            return Err("at least one non-empty keyword is required".into());
        }
        if reply.trim().is_empty() {
            return Err("reply must not be empty".into());
        }

        let id = new_rule_id();
        self.rules.push(ResponseRule {
            id: id.clone(),
            keywords,
            reply: reply.to_string(),
        });
        self.persist()?;
        Ok(id)
    }

    /// Update a rule by id. Returns false if no rule has that id.
    pub fn update(
        &mut self,
        id: &str,
        keywords: Vec<KeywordEntry>,
        reply: String,
    ) -> EngineResult<bool> {
        let Some(rule) = self.rules.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        if keywords.is_empty() || reply.trim().is_empty() {
            return Err("keywords and reply must not be empty".into());
        }
        rule.keywords = keywords;
        rule.reply = reply;
        self.persist()?;
        Ok(true)
    }

    /// Delete a rule by id. Returns false if no rule has that id.
    pub fn remove(&mut self, id: &str) -> EngineResult<bool> {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != id);
        if self.rules.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }
}

// ── JSON file port ─────────────────────────────────────────────────────────

/// The production port: one pretty-printed JSON array file, fully
/// overwritten on every save.
pub struct JsonFileRules {
    path: PathBuf,
}

impl JsonFileRules {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileRules { path: path.into() }
    }
}

impl RulePersistence for JsonFileRules {
    fn load(&self) -> EngineResult<Vec<ResponseRule>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, rules: &[ResponseRule]) -> EngineResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(rules)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

// ── In-memory port ─────────────────────────────────────────────────────────

/// Port with no backing file. Used by tests, and as the seed store when the
/// service runs without a data directory.
pub struct MemoryRules {
    seed: Vec<ResponseRule>,
}

impl MemoryRules {
    pub fn empty() -> Self {
        MemoryRules { seed: Vec::new() }
    }

    pub fn with_rules(seed: Vec<ResponseRule>) -> Self {
        MemoryRules { seed }
    }
}

impl RulePersistence for MemoryRules {
    fn load(&self) -> EngineResult<Vec<ResponseRule>> {
        Ok(self.seed.clone())
    }

    fn save(&self, _rules: &[ResponseRule]) -> EngineResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::error::EngineError;

    fn rule(words: &[&str], reply: &str) -> ResponseRule {
        ResponseRule {
            id: new_rule_id(),
            keywords: words.iter().map(|w| KeywordEntry::new(*w)).collect(),
            reply: reply.to_string(),
        }
    }

    #[test]
    fn file_round_trip_preserves_order_and_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");

        let mut first = rule(&["anxious", "sleep"], "first reply");
        first.keywords[0].weight = 4;
        let rules = vec![first, rule(&["ward"], "second reply")];

        let port = JsonFileRules::new(&path);
        port.save(&rules).unwrap();
        let reloaded = JsonFileRules::new(&path).load().unwrap();
        assert_eq!(reloaded, rules);
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let port = JsonFileRules::new(dir.path().join("absent.json"));
        assert!(port.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_degrades_to_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, "not json at all {{{").unwrap();

        // The port itself reports the parse failure…
        assert!(matches!(
            JsonFileRules::new(&path).load(),
            Err(EngineError::Serialization(_))
        ));
        // …and the store swallows it, starting empty.
        let store = ResponseStore::load(Box::new(JsonFileRules::new(&path)));
        assert!(store.is_empty());
    }

    #[test]
    fn legacy_rules_without_ids_get_ids_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        // Pre-id rules file: keywords and reply only.
        std::fs::write(
            &path,
            r#"[{"keywords":[{"word":"你好","weight":1}],"reply":"我... 我還好，護理師。"}]"#,
        )
        .unwrap();

        let store = ResponseStore::load(Box::new(JsonFileRules::new(&path)));
        assert_eq!(store.len(), 1);
        assert!(!store.rules()[0].id.is_empty());
        assert_eq!(store.rules()[0].keywords[0].word, "你好");
    }

    #[test]
    fn create_manual_splits_and_trims_keywords() {
        let mut store = ResponseStore::load(Box::new(MemoryRules::empty()));
        let id = store
            .create_manual(" sleep , appetite ,, mood ", "I am fine, really.")
            .unwrap();
        assert_eq!(store.len(), 1);
        let rule = &store.rules()[0];
        assert_eq!(rule.id, id);
        let words: Vec<&str> = rule.keywords.iter().map(|k| k.word.as_str()).collect();
        assert_eq!(words, vec!["sleep", "appetite", "mood"]);
    }

    #[test]
    fn create_manual_rejects_empty_input() {
        let mut store = ResponseStore::load(Box::new(MemoryRules::empty()));
        assert!(store.create_manual(" , ,", "reply").is_err());
        assert!(store.create_manual("sleep", "   ").is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn update_and_remove_by_stable_id() {
        let mut store = ResponseStore::load(Box::new(MemoryRules::with_rules(vec![
            rule(&["sleep"], "A"),
            rule(&["mood"], "B"),
        ])));
        let id = store.rules()[1].id.clone();

        let updated = store
            .update(&id, vec![KeywordEntry::new("appetite")], "B2".into())
            .unwrap();
        assert!(updated);
        assert_eq!(store.rules()[1].reply, "B2");
        // Order and the other rule are untouched.
        assert_eq!(store.rules()[0].reply, "A");

        assert!(store.remove(&id).unwrap());
        assert_eq!(store.len(), 1);
        assert!(!store.remove("no-such-id").unwrap());
        assert!(!store.update("no-such-id", vec![KeywordEntry::new("x")], "y".into()).unwrap());
    }

    #[test]
    fn replace_all_assigns_missing_ids() {
        let mut store = ResponseStore::load(Box::new(MemoryRules::empty()));
        let mut incoming = rule(&["sleep"], "A");
        incoming.id = String::new();
        store.replace_all(vec![incoming]).unwrap();
        assert!(!store.rules()[0].id.is_empty());
    }
}
