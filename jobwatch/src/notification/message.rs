//! Alert text for new postings.

use crate::domain::Posting;

/// Characters of description included in an email alert.
pub const EMAIL_DESCRIPTION_CHARS: usize = 500;

const MISSING: &str = "N/A";

fn or_missing(value: &str) -> &str {
    if value.trim().is_empty() { MISSING } else { value }
}

/// Escape text for Telegram HTML parse mode and email HTML bodies.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Truncate to `limit` characters, appending `suffix` when anything was cut.
pub fn truncate_chars(text: &str, limit: usize, suffix: &str) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let budget = limit.saturating_sub(suffix.chars().count());
    let truncated: String = text.chars().take(budget).collect();
    format!("{truncated}{suffix}")
}

/// Telegram message in HTML parse mode.
pub fn telegram_html(posting: &Posting) -> String {
    let mut text = format!(
        "\u{1f514} <b>New Job Found!</b>\n\n\
         <b>Title:</b> {}\n\
         <b>Company:</b> {}\n\
         <b>Location:</b> {}\n\
         <b>Source:</b> {}",
        escape_html(or_missing(&posting.title)),
        escape_html(or_missing(&posting.organization)),
        escape_html(or_missing(&posting.location)),
        escape_html(or_missing(&posting.source)),
    );
    if !posting.url.trim().is_empty() {
        text.push_str(&format!(
            "\n\n<a href=\"{}\">View Job</a>",
            escape_html(&posting.url)
        ));
    }
    text
}

pub fn email_subject(posting: &Posting) -> String {
    format!(
        "\u{1f514} New Job: {} at {}",
        or_missing(&posting.title),
        or_missing(&posting.organization)
    )
}

fn description_excerpt(posting: &Posting) -> String {
    if posting.description.trim().is_empty() {
        "No description available".to_string()
    } else {
        truncate_chars(&posting.description, EMAIL_DESCRIPTION_CHARS, "...")
    }
}

pub fn email_text(posting: &Posting) -> String {
    format!(
        "New Job Opportunity Found!\n\n\
         Title: {}\nCompany: {}\nLocation: {}\nSource: {}\nPosted: {}\n\n\
         {}\n\n{}",
        or_missing(&posting.title),
        or_missing(&posting.organization),
        or_missing(&posting.location),
        or_missing(&posting.source),
        or_missing(&posting.posted_date),
        description_excerpt(posting),
        or_missing(&posting.url),
    )
}

pub fn email_html(posting: &Posting) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #333;">
    <div style="background-color: #f5f5f5; padding: 20px; border-radius: 5px;">
        <h2 style="color: #0066cc;">New Job Opportunity Found!</h2>
        <p><strong>Title:</strong> {title}</p>
        <p><strong>Company:</strong> {company}</p>
        <p><strong>Location:</strong> {location}</p>
        <p><strong>Source:</strong> {source}</p>
        <p><strong>Posted:</strong> {posted}</p>
        <p><strong>Description:</strong><br>{description}</p>
        <p><a href="{url}" style="background-color: #0066cc; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px; display: inline-block;">View Full Job</a></p>
    </div>
</body>
</html>"#,
        title = escape_html(or_missing(&posting.title)),
        company = escape_html(or_missing(&posting.organization)),
        location = escape_html(or_missing(&posting.location)),
        source = escape_html(or_missing(&posting.source)),
        posted = escape_html(or_missing(&posting.posted_date)),
        description = escape_html(&description_excerpt(posting)),
        url = escape_html(&posting.url),
    )
}
