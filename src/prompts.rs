/// Keeps the first `budget` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

pub fn summary_prompt(text: &str, budget: usize) -> String {
    format!(
        "Summarize the following information:\n\n{}",
        truncate_chars(text, budget)
    )
}

pub fn followup_prompt(summary: &str, question: &str) -> String {
    format!(
        "Using the following summary as context:\n\n{}\n\nAnswer this follow-up question: {}",
        summary, question
    )
}
