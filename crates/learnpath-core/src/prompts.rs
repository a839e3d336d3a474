// Copyright (c) 2025-2026 Learnpath Contributors
//
// SPDX-License-Identifier: MIT
//! Prompt composition: the user's goal plus the fixed instructional template,
//! capped at a hard word budget so the composed prompt fits the local
//! engine's context window.

/// Hard ceiling on the composed prompt, in whitespace-delimited words.
pub const MAX_PROMPT_WORDS: usize = 1800;

/// Fixed instructions appended to every goal.
const INSTRUCTIONS: &str = "\
You are an expert learning path generator. \
Provide a detailed, day-wise learning path for the user goal above. \
Do not output any actions or thoughts, only the final answer.
Use the available tools to find high-quality videos for each day of the path. \
For each day, list the topics to cover, the selected videos with their links, \
and a short practice exercise. \
When a document or notes integration is available, save the finished plan \
there and include a link to the saved copy.
Begin the final answer with \"Here is your comprehensive learning path\".";

/// Compose the final prompt for one invocation.
pub fn compose_prompt(goal: &str) -> String {
    let composed = format!("User Goal: {goal}\n{INSTRUCTIONS}");
    truncate_words(&composed, MAX_PROMPT_WORDS)
}

/// Keep the first `max_words` whitespace-delimited words of `text`.
///
/// The cut is a verbatim prefix of the input – no ellipsis, no attempt to
/// respect sentence boundaries.  This is a lossy hard budget.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let mut count = 0;
    let mut in_word = false;
    for (i, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            count += 1;
            if count > max_words {
                return text[..i].trim_end().to_string();
            }
        }
    }
    text.to_string()
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn word_count(s: &str) -> usize {
        s.split_whitespace().count()
    }

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(truncate_words("a b c", 10), "a b c");
    }

    #[test]
    fn text_at_the_budget_is_unchanged() {
        let text = "one two three";
        assert_eq!(truncate_words(text, 3), text);
    }

    #[test]
    fn over_budget_text_keeps_exactly_max_words() {
        let text: String = (0..50).map(|i| format!("w{i} ")).collect();
        let out = truncate_words(&text, 20);
        assert_eq!(word_count(&out), 20);
    }

    #[test]
    fn truncation_is_a_verbatim_prefix() {
        let text = "alpha  beta\ngamma\tdelta epsilon";
        let out = truncate_words(text, 3);
        assert!(text.starts_with(&out), "{out:?} is not a prefix of {text:?}");
        assert_eq!(word_count(&out), 3);
    }

    #[test]
    fn composed_prompt_starts_with_the_goal() {
        let p = compose_prompt("I want to learn python basics in 3 days");
        assert!(p.starts_with("User Goal: I want to learn python basics in 3 days"));
        assert!(p.contains("day-wise learning path"));
    }

    #[test]
    fn composed_prompt_is_capped_at_the_word_budget() {
        let goal: String = (0..3000).map(|i| format!("goal{i} ")).collect();
        let p = compose_prompt(&goal);
        assert_eq!(word_count(&p), MAX_PROMPT_WORDS);
    }

    #[test]
    fn oversized_prompt_is_a_prefix_of_the_untruncated_composition() {
        let goal: String = (0..3000).map(|i| format!("goal{i} ")).collect();
        let untruncated = format!("User Goal: {goal}\n");
        let p = compose_prompt(&goal);
        assert!(untruncated.starts_with(&p));
    }
}
