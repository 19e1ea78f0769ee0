//! Publish/close window of a question.
//!
//! Every predicate is a pure function of the two stored instants and the
//! instant passed in by the caller. Nothing here reads the clock.

use chrono::{DateTime, Duration, Utc};
use polls_db::entities::question;

/// How far back "recently" reaches.
pub const RECENT_WINDOW: Duration = Duration::days(1);

/// The time window during which a question is visible and votable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VotingWindow {
    /// Visible from this instant on.
    pub publish_at: DateTime<Utc>,
    /// Voting is closed from this instant on.
    pub close_at: DateTime<Utc>,
}

impl VotingWindow {
    /// Create a window from its two instants.
    #[must_use]
    pub const fn new(publish_at: DateTime<Utc>, close_at: DateTime<Utc>) -> Self {
        Self {
            publish_at,
            close_at,
        }
    }

    /// `publish_at <= now`.
    #[must_use]
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.publish_at <= now
    }

    /// `close_at <= now`.
    #[must_use]
    pub fn is_closed(&self, now: DateTime<Utc>) -> bool {
        self.close_at <= now
    }

    /// Published and not yet closed. Closing wins when both instants coincide.
    #[must_use]
    pub fn can_vote(&self, now: DateTime<Utc>) -> bool {
        self.is_published(now) && !self.is_closed(now)
    }

    /// `publish_at` lies in `[now - 1 day, now]`.
    #[must_use]
    pub fn was_published_recently(&self, now: DateTime<Utc>) -> bool {
        within_recent(self.publish_at, now)
    }

    /// `close_at` lies in `[now - 1 day, now]`.
    #[must_use]
    pub fn was_closed_recently(&self, now: DateTime<Utc>) -> bool {
        within_recent(self.close_at, now)
    }
}

fn within_recent(at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - RECENT_WINDOW <= at && at <= now
}

impl From<&question::Model> for VotingWindow {
    fn from(question: &question::Model) -> Self {
        Self::new(question.publish_at, question.close_at)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn window(publish_offset: Duration, close_offset: Duration) -> VotingWindow {
        VotingWindow::new(now() + publish_offset, now() + close_offset)
    }

    #[test]
    fn test_open_window_is_votable() {
        let w = window(Duration::days(-1), Duration::days(1));
        assert!(w.is_published(now()));
        assert!(!w.is_closed(now()));
        assert!(w.can_vote(now()));
    }

    #[test]
    fn test_future_question_is_not_votable() {
        let w = window(Duration::days(30), Duration::days(60));
        assert!(!w.is_published(now()));
        assert!(!w.can_vote(now()));
    }

    #[test]
    fn test_closed_question_is_not_votable() {
        let w = window(Duration::days(-30), Duration::days(-1));
        assert!(w.is_published(now()));
        assert!(w.is_closed(now()));
        assert!(!w.can_vote(now()));
    }

    #[test]
    fn test_publish_equals_close_equals_now() {
        let w = VotingWindow::new(now(), now());
        assert!(w.is_published(now()));
        assert!(w.is_closed(now()));
        assert!(!w.can_vote(now()));
    }

    #[test]
    fn test_can_vote_matches_definition_over_grid() {
        let offsets = [
            Duration::days(-2),
            Duration::seconds(-1),
            Duration::zero(),
            Duration::seconds(1),
            Duration::days(2),
        ];
        for publish in offsets {
            for close in offsets {
                let w = window(publish, close);
                let expected = w.publish_at <= now() && w.close_at > now();
                assert_eq!(w.can_vote(now()), expected, "publish {publish} close {close}");
            }
        }
    }

    #[test]
    fn test_was_published_recently_boundaries() {
        let future = window(Duration::days(30), Duration::days(60));
        assert!(!future.was_published_recently(now()));

        let just_too_old = window(
            -(Duration::days(1) + Duration::seconds(1)),
            Duration::days(1),
        );
        assert!(!just_too_old.was_published_recently(now()));

        let recent = window(
            -(Duration::hours(23) + Duration::minutes(59) + Duration::seconds(59)),
            Duration::days(1),
        );
        assert!(recent.was_published_recently(now()));

        let exactly_one_day = window(-Duration::days(1), Duration::days(1));
        assert!(exactly_one_day.was_published_recently(now()));

        let right_now = window(Duration::zero(), Duration::days(1));
        assert!(right_now.was_published_recently(now()));
    }

    #[test]
    fn test_was_closed_recently() {
        let closed_an_hour_ago = window(Duration::days(-10), Duration::hours(-1));
        assert!(closed_an_hour_ago.was_closed_recently(now()));

        let closed_long_ago = window(Duration::days(-10), Duration::days(-5));
        assert!(!closed_long_ago.was_closed_recently(now()));

        let still_open = window(Duration::days(-10), Duration::hours(1));
        assert!(!still_open.was_closed_recently(now()));
    }

    #[test]
    fn test_from_question_model() {
        let model = question::Model {
            id: 1,
            text: "What's up?".to_string(),
            publish_at: now(),
            close_at: now() + Duration::days(1),
            created_at: now(),
            updated_at: None,
        };
        let w = VotingWindow::from(&model);
        assert_eq!(w.publish_at, model.publish_at);
        assert_eq!(w.close_at, model.close_at);
    }
}
