// Wardsim Engine — Keyword Matcher
//
// Scans the rule store in insertion order and scores each rule by how many
// of its keywords occur as substrings of the utterance. Case-sensitive,
// exact containment, no tokenization or stemming — a trainee who types
// "sleepless" hits a "sleep" keyword, which is the intended looseness.
//
// The best rule is replaced only on a strictly greater count, so the
// first-inserted rule wins ties. Total function: always returns a result,
// falling back to the silence default at count 0.

use crate::atoms::constants::SILENCE_REPLY;
use crate::atoms::types::{MatchResult, ResponseRule};

/// Find the best-matching rule for one utterance.
pub fn find_best_match(utterance: &str, rules: &[ResponseRule]) -> MatchResult {
    let mut best = MatchResult {
        count: 0,
        reply: SILENCE_REPLY.to_string(),
        rule_index: None,
    };

    for (index, rule) in rules.iter().enumerate() {
        let count = hit_count(utterance, rule);
        if count > best.count {
            best = MatchResult {
                count,
                reply: rule.reply.clone(),
                rule_index: Some(index),
            };
        }
    }

    best
}

/// Count how many of a rule's keywords occur in the utterance.
/// Empty keyword words never count — `str::contains("")` is trivially true
/// and would turn a malformed rule into a match-everything trap.
fn hit_count(utterance: &str, rule: &ResponseRule) -> usize {
    rule.keywords
        .iter()
        .filter(|k| !k.word.is_empty() && utterance.contains(k.word.as_str()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::types::KeywordEntry;

    fn rule(words: &[&str], reply: &str) -> ResponseRule {
        ResponseRule {
            id: format!("rule-{}", reply),
            keywords: words.iter().map(|w| KeywordEntry::new(*w)).collect(),
            reply: reply.to_string(),
        }
    }

    #[test]
    fn full_overlap_hits_every_keyword() {
        let rules = vec![rule(&["anxious", "sleep", "appetite"], "R")];
        let m = find_best_match("feeling anxious, no sleep, no appetite", &rules);
        assert_eq!(m.count, 3);
        assert_eq!(m.reply, "R");
        assert_eq!(m.rule_index, Some(0));
    }

    #[test]
    fn no_match_returns_silence_default() {
        let rules = vec![rule(&["voices", "window"], "R")];
        let m = find_best_match("how was breakfast", &rules);
        assert_eq!(m.count, 0);
        assert_eq!(m.reply, SILENCE_REPLY);
        assert_eq!(m.rule_index, None);
    }

    #[test]
    fn empty_store_returns_silence_default() {
        let m = find_best_match("hello", &[]);
        assert_eq!(m.count, 0);
        assert_eq!(m.rule_index, None);
    }

    #[test]
    fn ties_keep_the_earlier_rule() {
        let rules = vec![
            rule(&["sleep", "night"], "first"),
            rule(&["sleep", "night"], "second"),
        ];
        let m = find_best_match("can't sleep at night", &rules);
        assert_eq!(m.count, 2);
        assert_eq!(m.reply, "first");
        assert_eq!(m.rule_index, Some(0));
    }

    #[test]
    fn strictly_greater_count_replaces_best() {
        let rules = vec![
            rule(&["sleep"], "weak"),
            rule(&["sleep", "night", "awake"], "strong"),
        ];
        let m = find_best_match("awake all night, no sleep", &rules);
        assert_eq!(m.reply, "strong");
        assert_eq!(m.count, 3);
    }

    #[test]
    fn matching_is_case_sensitive_substring() {
        let rules = vec![rule(&["Sleep"], "R")];
        assert_eq!(find_best_match("no sleep lately", &rules).count, 0);
        assert_eq!(find_best_match("no Sleep lately", &rules).count, 1);
        // Substring containment, no word boundaries:
        assert_eq!(find_best_match("Sleepless again", &rules).count, 1);
    }

    #[test]
    fn count_never_exceeds_rule_keyword_count() {
        let rules = vec![rule(&["a!", "b?"], "R")];
        let m = find_best_match("a! a! b? b? b?", &rules);
        assert_eq!(m.count, 2);
    }

    #[test]
    fn empty_keyword_word_never_matches() {
        let mut r = rule(&["sleep"], "R");
        r.keywords.push(KeywordEntry::new(""));
        let m = find_best_match("no overlap here", &[r]);
        assert_eq!(m.count, 0);
    }

    #[test]
    fn deterministic_for_fixed_input_and_order() {
        let rules = vec![
            rule(&["mood", "food"], "a"),
            rule(&["mood", "ward"], "b"),
        ];
        let first = find_best_match("mood on the ward", &rules);
        let second = find_best_match("mood on the ward", &rules);
        assert_eq!(first, second);
    }
}
