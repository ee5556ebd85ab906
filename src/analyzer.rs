//! Engagement metrics from raw social data

use chrono::Duration;

use crate::types::{ActivityVector, Friend, Gift, WallPost};

/// Length of a "month" when converting the posting span
const MONTH_DAYS: i64 = 30;

/// Compute the activity vector for one wall/gifts/friends sample.
///
/// The posting span is floored at one month, so posts bunched on a single
/// day do not inflate `posts_per_month`. `average_post_len` counts bytes of
/// UTF-8 text.
pub fn compute(wall: &[WallPost], gifts: &[Gift], friends: &[Friend]) -> ActivityVector {
    if wall.is_empty() {
        return ActivityVector {
            posts_per_month: 0.0,
            average_post_len: 0.0,
            engagement_rate: 0.0,
            gifts_count: gifts.len(),
            friends_count: friends.len(),
            profile_completeness: 0.0,
        };
    }

    let mut min_date = wall[0].date;
    let mut max_date = wall[0].date;
    let mut total_len: usize = 0;
    let mut total_engagement: i64 = 0;

    for post in wall {
        min_date = min_date.min(post.date);
        max_date = max_date.max(post.date);
        total_len += post.text.len();
        total_engagement = total_engagement.saturating_add(post.engagement().max(0));
    }

    let span = max_date - min_date;
    let months = span_months(span).max(1.0);
    let posts = wall.len() as f64;

    ActivityVector {
        posts_per_month: posts / months,
        average_post_len: total_len as f64 / posts,
        engagement_rate: total_engagement as f64 / posts,
        gifts_count: gifts.len(),
        friends_count: friends.len(),
        profile_completeness: 0.0,
    }
}

fn span_months(span: Duration) -> f64 {
    span.num_seconds() as f64 / (MONTH_DAYS * 24 * 3600) as f64
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn post(id: i64, day: i64, text: &str) -> WallPost {
        WallPost::new(id, Utc.timestamp_opt(day * 86400, 0).unwrap(), text)
    }

    fn gift(id: i64) -> Gift {
        Gift {
            id,
            text: String::new(),
        }
    }

    #[test]
    fn test_empty_wall_keeps_counts() {
        let v = compute(&[], &[gift(1)], &[]);
        assert_eq!(v.posts_per_month, 0.0);
        assert_eq!(v.average_post_len, 0.0);
        assert_eq!(v.engagement_rate, 0.0);
        assert_eq!(v.gifts_count, 1);
        assert_eq!(v.friends_count, 0);
        assert_eq!(v.profile_completeness, 0.0);
    }

    #[test]
    fn test_two_posts_one_day_apart() {
        let wall = vec![post(1, 0, "hello"), post(2, 1, "world")];
        let v = compute(&wall, &[], &[]);
        assert_eq!(v.posts_per_month, 2.0);
        assert_eq!(v.average_post_len, 5.0);
        assert_eq!(v.engagement_rate, 0.0);
    }

    #[test]
    fn test_span_longer_than_a_month() {
        // 4 posts over 60 days = 2 months
        let wall = vec![post(1, 0, "a"), post(2, 20, "b"), post(3, 40, "c"), post(4, 60, "d")];
        let v = compute(&wall, &[], &[]);
        assert!((v.posts_per_month - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_unordered_dates() {
        let wall = vec![post(1, 60, "x"), post(2, 0, "y")];
        let v = compute(&wall, &[], &[]);
        assert!((v.posts_per_month - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_engagement_rate_is_mean_of_interactions() {
        let mut a = post(1, 0, "a");
        a.likes = 10;
        a.comments = 2;
        a.reposts = 3;
        a.views = 1000;
        let mut b = post(2, 1, "b");
        b.likes = 5;
        let v = compute(&[a, b], &[], &[]);
        assert_eq!(v.engagement_rate, 10.0);
    }

    #[test]
    fn test_huge_counters_saturate() {
        let mut a = post(1, 0, "a");
        a.likes = i64::MAX;
        a.comments = 1;
        a.reposts = i64::MAX;
        assert_eq!(a.engagement(), i64::MAX);

        let b = a.clone();
        let v = compute(&[a, b], &[], &[]);
        assert_eq!(v.engagement_rate, i64::MAX as f64 / 2.0);
    }

    #[test]
    fn test_completeness_is_always_zero() {
        let wall = vec![post(1, 0, "hello")];
        let v = compute(&wall, &[gift(1), gift(2)], &[]);
        assert_eq!(v.profile_completeness, 0.0);
        assert_eq!(v.gifts_count, 2);
    }
}
