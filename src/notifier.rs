use std::time::{Duration, Instant};

pub const NOTIFY_DURATION: Duration = Duration::from_secs(4);

/// Single transient message. A new message replaces the current one and
/// restarts its timer.
#[derive(Debug)]
pub struct Notifier {
    current: Option<(String, Instant)>,
    duration: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(NOTIFY_DURATION)
    }
}

impl Notifier {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: None,
            duration,
        }
    }

    pub fn notify(&mut self, message: impl Into<String>, now: Instant) {
        self.current = Some((message.into(), now + self.duration));
    }

    /// The message still on screen at `now`, if any.
    pub fn visible(&self, now: Instant) -> Option<&str> {
        match &self.current {
            Some((msg, until)) if now < *until => Some(msg.as_str()),
            _ => None,
        }
    }

    /// The most recent message, ignoring expiry.
    #[cfg(test)]
    pub fn last(&self) -> Option<&str> {
        self.current.as_ref().map(|(msg, _)| msg.as_str())
    }

    /// Drop the message once it has expired. Returns true when it changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if matches!(&self.current, Some((_, until)) if now >= *until) {
            self.current = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_expires_after_four_seconds() {
        let t0 = Instant::now();
        let mut n = Notifier::default();
        n.notify("Error al conectar con el backend.", t0);
        assert_eq!(n.visible(t0), Some("Error al conectar con el backend."));
        assert!(n.visible(t0 + Duration::from_millis(3999)).is_some());
        assert!(!n.tick(t0 + Duration::from_millis(3999)));
        assert!(n.visible(t0 + NOTIFY_DURATION).is_none());
        assert!(n.tick(t0 + NOTIFY_DURATION));
        assert!(n.visible(t0).is_none());
    }

    #[test]
    fn last_call_wins_and_restarts_timer() {
        let t0 = Instant::now();
        let mut n = Notifier::default();
        n.notify("first", t0);
        n.notify("second", t0 + Duration::from_secs(3));
        assert_eq!(n.visible(t0 + Duration::from_secs(5)), Some("second"));
        assert!(n.visible(t0 + Duration::from_secs(7)).is_none());
    }

    #[test]
    fn empty_notifier_shows_nothing() {
        let mut n = Notifier::default();
        assert!(n.visible(Instant::now()).is_none());
        assert!(!n.tick(Instant::now()));
    }
}
