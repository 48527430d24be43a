//! Scheduler state tracking.

use chrono::{DateTime, Utc};

use crate::twitter::PostReceipt;

/// In-memory record of what the scheduler has posted.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    /// Number of dishes posted since startup.
    pub posts: u64,

    /// Receipt of the most recent post.
    pub last_receipt: Option<PostReceipt>,

    /// When the most recent post was published.
    pub last_posted_at: Option<DateTime<Utc>>,
}

impl SchedulerState {
    /// Creates an empty scheduler state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful post.
    pub fn record_post(&mut self, receipt: &PostReceipt) {
        self.posts += 1;
        self.last_receipt = Some(receipt.clone());
        self.last_posted_at = Some(Utc::now());
    }

    /// Text of the most recent post.
    #[must_use]
    pub fn last_dish(&self) -> Option<&str> {
        self.last_receipt.as_ref().map(|receipt| receipt.text.as_str())
    }

    /// One-line summary for logs.
    #[must_use]
    pub fn summary(&self) -> String {
        match (self.last_dish(), self.last_posted_at) {
            (Some(dish), Some(at)) => format!(
                "{} post(s), last at {}: \"{}\"",
                self.posts,
                at.format("%Y-%m-%d %H:%M:%S UTC"),
                dish
            ),
            _ => "no posts".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt(id: &str, text: &str) -> PostReceipt {
        PostReceipt {
            id: id.to_owned(),
            text: text.to_owned(),
        }
    }

    #[test]
    fn test_default_state() {
        let state = SchedulerState::new();
        assert_eq!(state.posts, 0);
        assert!(state.last_dish().is_none());
        assert_eq!(state.summary(), "no posts");
    }

    #[test]
    fn test_record_post() {
        let mut state = SchedulerState::new();
        state.record_post(&receipt("1", "spicy soup , sweet pie"));
        state.record_post(&receipt("2", "grilled duck , fried plum"));

        assert_eq!(state.posts, 2);
        assert_eq!(state.last_dish(), Some("grilled duck , fried plum"));
        assert!(state.last_posted_at.is_some());
    }

    #[test]
    fn test_summary() {
        let mut state = SchedulerState::new();
        state.record_post(&receipt("1", "spicy soup , sweet pie"));

        let summary = state.summary();
        assert!(summary.starts_with("1 post(s), last at "), "{summary}");
        assert!(summary.ends_with(": \"spicy soup , sweet pie\""), "{summary}");
    }
}
