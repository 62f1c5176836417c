//! Human-readable digest of a notification batch.
use crate::model::NotificationBatch;

pub const DEFAULT_HEADER: &str = "新着ニュース:";

/// Render the digest.
///
/// Layout: the header and a blank line, then per site (batch order) the site
/// name followed by `:` and a blank line, then one `- title` / `  url` block
/// per article, each followed by a blank line. Sites are separated by two
/// extra blank lines.
pub fn format_batch(batch: &NotificationBatch, header: &str) -> String {
    let mut message = String::new();
    message.push_str(header);
    message.push_str("\n\n");
    for site in batch.sites() {
        message.push_str(&site.site);
        message.push_str(":\n\n");
        for entry in &site.entries {
            message.push_str("- ");
            message.push_str(&entry.title);
            message.push_str("\n  ");
            message.push_str(&entry.url);
            message.push_str("\n\n");
        }
        message.push_str("\n\n");
    }
    message
}
