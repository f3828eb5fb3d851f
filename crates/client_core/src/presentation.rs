use chrono::{DateTime, Utc};

fn count_label(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

pub fn like_count_label(count: usize) -> String {
    count_label(count, "like", "likes")
}

pub fn comment_count_label(count: usize) -> String {
    count_label(count, "comment", "comments")
}

/// Creation date as `dd.mm.yyyy`.
pub fn created_on(created_at: &DateTime<Utc>) -> String {
    created_at.format("%d.%m.%Y").to_string()
}

/// Event website without its `https://` prefix.
pub fn website_display(url: &str) -> &str {
    url.strip_prefix("https://").unwrap_or(url)
}
