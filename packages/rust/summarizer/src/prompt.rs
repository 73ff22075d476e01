//! Prompt construction for article summaries.

use newsdesk_shared::FeedEntry;

/// Persona and output template sent as the system message with every request.
pub const SYSTEM_PROMPT: &str = r#"You are a cynical, expert tech editor.
Summarize this news into a blog post entry.
Output ONLY the HTML for the article inside a <article> tag.
Format:
<article>
  <h3>[Catchy Title Here]</h3>
  <p class="meta">[Date] • [Source Name]</p>
  <p>[Summary paragraph 1]</p>
  <div class="verdict"><strong>Verdict:</strong> [One sentence opinion]</div>
  <a href="[Original Link]" class="btn">Read Source &rarr;</a>
</article>
"#;

/// Per-item user message: title, link, and summary (empty when absent).
pub fn user_message(entry: &FeedEntry) -> String {
    format!(
        "Title: {}\nLink: {}\nSummary: {}",
        entry.title,
        entry.link,
        entry.summary_or_empty()
    )
}
