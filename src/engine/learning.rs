// Wardsim Engine — Learning Engine
//
// Two jobs, both pure functions over the rule list (persistence stays with
// the session, which writes the store once per turn):
//
//   1. Fallback learning — a generative turn becomes a new stored rule when
//      the utterance yields enough keywords, the spoken reply is long enough
//      to be worth replaying, and no rule already has that exact reply.
//      Append-only: rules are never removed or merged automatically.
//   2. Reinforcement — after any turn whose best match had at least one
//      keyword hit, every keyword of the matched rule that occurs in the
//      utterance gets its weight bumped by 1. Weights never decrease.

use crate::atoms::constants::{
    KEYWORD_SEPARATORS, MAX_EXTRACTED_KEYWORDS, MIN_KEYWORD_CHARS, MIN_LEARN_KEYWORDS,
    MIN_LEARN_REPLY_CHARS,
};
use crate::atoms::types::{new_rule_id, KeywordEntry, ResponseRule};
use log::info;

// ── Keyword extraction ─────────────────────────────────────────────────────

/// Split an utterance into candidate keywords.
///
/// Separators are Unicode whitespace plus a fixed punctuation set covering
/// both ASCII and full-width East-Asian marks. Tokens shorter than
/// `MIN_KEYWORD_CHARS` characters are dropped; the first
/// `MAX_EXTRACTED_KEYWORDS` survivors are kept in utterance order, each
/// with weight 1.
pub fn extract_keywords(text: &str) -> Vec<KeywordEntry> {
    text.split(|c: char| c.is_whitespace() || KEYWORD_SEPARATORS.contains(&c))
        .filter(|token| token.chars().count() >= MIN_KEYWORD_CHARS)
        .take(MAX_EXTRACTED_KEYWORDS)
        .map(KeywordEntry::new)
        .collect()
}

// ── Fallback learning ──────────────────────────────────────────────────────

/// Try to turn a fallback turn into a new stored rule.
///
/// Gates (all must hold):
///   • ≥ MIN_LEARN_KEYWORDS extractable keywords in the utterance
///   • reply strictly longer than MIN_LEARN_REPLY_CHARS characters
///   • no existing rule with the identical reply string
///
/// Returns whether a rule was appended. Idempotent: running the same
/// utterance/reply pair twice never duplicates.
pub fn learn_from_fallback(
    rules: &mut Vec<ResponseRule>,
    utterance: &str,
    reply: &str,
) -> bool {
    let keywords = extract_keywords(utterance);
    if keywords.len() < MIN_LEARN_KEYWORDS {
        return false;
    }
    if reply.chars().count() <= MIN_LEARN_REPLY_CHARS {
        return false;
    }
    if rules.iter().any(|r| r.reply == reply) {
        return false;
    }

    info!(
        "[engine] Learned rule from fallback: {} keyword(s), reply {} chars",
        keywords.len(),
        reply.chars().count()
    );
    rules.push(ResponseRule {
        id: new_rule_id(),
        keywords,
        reply: reply.to_string(),
    });
    true
}

// ── Reinforcement ──────────────────────────────────────────────────────────

/// Bump the weight of every keyword of `rules[rule_index]` that occurs in
/// the utterance. Returns how many keywords were reinforced.
///
/// The containment re-check matters: the matcher found *some* of the rule's
/// keywords in the utterance — only those contributors get credit, not the
/// rule's whole keyword list.
pub fn reinforce(rules: &mut [ResponseRule], rule_index: usize, utterance: &str) -> usize {
    let Some(rule) = rules.get_mut(rule_index) else {
        return 0;
    };

    let mut bumped = 0;
    for keyword in &mut rule.keywords {
        if !keyword.word.is_empty() && utterance.contains(keyword.word.as_str()) {
            keyword.weight += 1;
            bumped += 1;
        }
    }
    bumped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(words: &[&str], reply: &str) -> ResponseRule {
        ResponseRule {
            id: new_rule_id(),
            keywords: words.iter().map(|w| KeywordEntry::new(*w)).collect(),
            reply: reply.to_string(),
        }
    }

    // ── extraction ─────────────────────────────────────────────────────

    #[test]
    fn extraction_splits_on_whitespace_and_punctuation() {
        let kws = extract_keywords("cannot sleep, eats nothing!");
        let words: Vec<&str> = kws.iter().map(|k| k.word.as_str()).collect();
        assert_eq!(words, vec!["cannot", "sleep", "eats", "nothing"]);
        assert!(kws.iter().all(|k| k.weight == 1));
    }

    #[test]
    fn extraction_splits_on_fullwidth_punctuation() {
        let kws = extract_keywords("你好嗎，最近睡眠如何。食慾！還好？");
        let words: Vec<&str> = kws.iter().map(|k| k.word.as_str()).collect();
        assert_eq!(words, vec!["你好嗎", "最近睡眠如何", "食慾", "還好"]);
    }

    #[test]
    fn extraction_drops_short_tokens() {
        let kws = extract_keywords("I am so very tired");
        let words: Vec<&str> = kws.iter().map(|k| k.word.as_str()).collect();
        // "I" is a single character and is dropped.
        assert_eq!(words, vec!["am", "so", "very", "tired"]);
    }

    #[test]
    fn extraction_caps_at_five_tokens_in_order() {
        let kws = extract_keywords("one two three four five six seven");
        let words: Vec<&str> = kws.iter().map(|k| k.word.as_str()).collect();
        assert_eq!(words, vec!["one", "two", "three", "four", "five"]);
    }

    #[test]
    fn extraction_of_blank_text_is_empty() {
        assert!(extract_keywords("   ").is_empty());
        assert!(extract_keywords(", . ! ?").is_empty());
    }

    // ── fallback learning ──────────────────────────────────────────────

    #[test]
    fn short_reply_is_not_learned() {
        let mut rules = vec![];
        // "ok." is 3 chars — fails the > 5 gate.
        assert!(!learn_from_fallback(&mut rules, "how do you feel today", "ok."));
        assert!(rules.is_empty());
    }

    #[test]
    fn reply_of_exactly_five_chars_is_not_learned() {
        let mut rules = vec![];
        assert!(!learn_from_fallback(&mut rules, "how do you feel today", "12345"));
        assert!(rules.is_empty());
    }

    #[test]
    fn too_few_keywords_is_not_learned() {
        let mut rules = vec![];
        assert!(!learn_from_fallback(
            &mut rules,
            "hi",
            "a perfectly long generated reply"
        ));
        assert!(rules.is_empty());
    }

    #[test]
    fn qualifying_turn_appends_exactly_one_rule() {
        let mut rules = vec![rule(&["old"], "existing reply")];
        let reply = "I have not slept since they moved me to this room.";
        assert!(learn_from_fallback(&mut rules, "tell me about your sleep", reply));
        assert_eq!(rules.len(), 2);
        let learned = &rules[1];
        assert_eq!(learned.reply, reply);
        assert!(!learned.id.is_empty());
        assert!(learned.keywords.len() >= 2);
    }

    #[test]
    fn duplicate_reply_is_idempotent() {
        let mut rules = vec![];
        let reply = "They keep whispering outside my door at night.";
        assert!(learn_from_fallback(&mut rules, "who is whispering there", reply));
        assert!(!learn_from_fallback(&mut rules, "who is whispering there", reply));
        // Even from a different utterance, an identical reply never duplicates.
        assert!(!learn_from_fallback(&mut rules, "completely different words", reply));
        assert_eq!(rules.len(), 1);
    }

    // ── reinforcement ──────────────────────────────────────────────────

    #[test]
    fn contributing_keywords_gain_exactly_one() {
        let mut rules = vec![rule(&["sleep", "appetite"], "R")];
        let bumped = reinforce(&mut rules, 0, "no sleep again last night");
        assert_eq!(bumped, 1);
        assert_eq!(rules[0].keywords[0].weight, 2); // "sleep" contributed
        assert_eq!(rules[0].keywords[1].weight, 1); // "appetite" did not
    }

    #[test]
    fn other_rules_are_untouched() {
        let mut rules = vec![rule(&["sleep"], "A"), rule(&["sleep"], "B")];
        reinforce(&mut rules, 0, "about sleep");
        assert_eq!(rules[0].keywords[0].weight, 2);
        assert_eq!(rules[1].keywords[0].weight, 1);
    }

    #[test]
    fn out_of_range_index_is_a_no_op() {
        let mut rules = vec![rule(&["sleep"], "A")];
        assert_eq!(reinforce(&mut rules, 5, "about sleep"), 0);
        assert_eq!(rules[0].keywords[0].weight, 1);
    }

    #[test]
    fn weights_are_monotonic_over_repeated_turns() {
        let mut rules = vec![rule(&["voices"], "R")];
        for expected in 2..=6 {
            reinforce(&mut rules, 0, "the voices again");
            assert_eq!(rules[0].keywords[0].weight, expected);
        }
    }
}
