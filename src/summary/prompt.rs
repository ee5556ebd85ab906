//! Prompt template for profile summaries

use crate::types::ProfileData;

/// Render the fixed summary prompt for `data`
pub fn build_prompt(data: &ProfileData) -> String {
    format!(
        "You are a social media analyst.\n\
Analyze the user's social profile and briefly describe their main personality traits, \
interests and social activity in 5-7 sentences.\n\
\n\
Basic information:\n\
- Name: {} {}\n\
- City: {}\n\
- About: {}\n\
- Friends: {}\n\
- Gifts: {}\n\
\n\
Wall activity:\n\
- Posts: {}\n\
- Average post length: {:.1} characters\n\
- Average engagement: {:.2}\n\
- Activity density (posts per month): {:.2}\n\
\n\
Write a natural, readable summary without mentioning technical details or metrics.",
        data.user.first_name,
        data.user.last_name,
        data.user.city,
        data.user.about,
        data.friends.len(),
        data.gifts.len(),
        data.wall.len(),
        data.vector.average_post_len,
        data.vector.engagement_rate,
        data.vector.posts_per_month,
    )
}

/// Keep at most `max_chars` characters, never splitting one
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
