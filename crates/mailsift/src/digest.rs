//! Plain-text rendering of an inbox page.

use std::fmt::Write;

use chrono::{DateTime, Local};
use mailsift_core::{BatchItem, DecodedMessage, InboxPage};

/// Longest body preview printed per message.
const PREVIEW_CHARS: usize = 160;

/// Renders the page as a numbered digest.
pub fn render(page: &InboxPage) -> String {
    if page.items.is_empty() {
        return "Inbox is empty.\n".to_string();
    }

    let mut out = String::new();
    for (index, item) in page.items.iter().enumerate() {
        let number = index + 1;
        match item {
            BatchItem::Decoded(message) => render_message(&mut out, number, message),
            BatchItem::Failed { id, error } => {
                let _ = writeln!(out, "{number:>3}. [unavailable] {id}: {error}");
            }
        }
    }

    let failed = page.failed_count();
    if failed > 0 {
        let _ = writeln!(out, "\n{failed} message(s) could not be fetched.");
    }
    if page.next_page_token.is_some() {
        let _ = writeln!(out, "More messages are available.");
    }
    out
}

fn render_message(out: &mut String, number: usize, message: &DecodedMessage) {
    let marker = if message.is_unread() { '*' } else { ' ' };
    let subject: &str = if message.subject.is_empty() {
        "(no subject)"
    } else {
        &message.subject
    };
    let _ = writeln!(out, "{number:>3}.{marker} {subject}");
    let _ = writeln!(
        out,
        "      {} | {}",
        message.from,
        format_date_local(&message.date)
    );

    let preview = collapse(if message.body_text.trim().is_empty() {
        &message.snippet
    } else {
        &message.body_text
    });
    if !preview.is_empty() {
        let _ = writeln!(out, "      {}", truncate(&preview, PREVIEW_CHARS));
    }
}

/// Formats an RFC 2822 date in local time; other formats pass through.
fn format_date_local(date: &str) -> String {
    DateTime::parse_from_rfc2822(date)
        .or_else(|_| DateTime::parse_from_rfc3339(date))
        .map_or_else(
            |_| date.to_string(),
            |dt| {
                dt.with_timezone(&Local)
                    .format("%a, %d %b %Y %H:%M")
                    .to_string()
            },
        )
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates a string to a maximum length with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
