use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serenity::model::id::UserId;
use serenity::prelude::TypeMapKey;

/// Per-user cooldown tracker for the like command. One timestamp per user,
/// process-lifetime only; nothing is persisted across restarts.
pub struct Cooldowns {
    window: Duration,
    users: HashMap<UserId, Instant>
}

pub enum CooldownCheck {
    Allowed,
    OnCooldown { remaining: Duration }
}

impl TypeMapKey for Cooldowns {
    type Value = Arc<Mutex<Cooldowns>>;
}

impl Cooldowns {
    pub fn new(window: Duration) -> Self {
        Cooldowns { window, users: HashMap::new() }
    }

    /// Checks whether a user may invoke the command, and on success records
    /// `now` as their new last-invocation time in the same operation.
    ///
    /// The timestamp is charged up front: if the upstream call afterwards
    /// fails, the user still waits out the window. Callers must hold the
    /// tracker's lock across this call only, never across an await.
    pub fn check_and_record(&mut self, user: UserId, now: Instant) -> CooldownCheck {
        if let Some(last) = self.users.get(&user) {
            let elapsed = now.saturating_duration_since(*last);

            if elapsed < self.window {
                return CooldownCheck::OnCooldown { remaining: self.window - elapsed };
            }
        }

        self.users.insert(user, now);

        // Drop entries whose window has passed, so the map stays bounded by
        // the set of recently active users.
        let window = self.window;
        self.users.retain(|_, last| now.saturating_duration_since(*last) < window);

        CooldownCheck::Allowed
    }

    #[cfg(test)]
    fn tracked_users(&self) -> usize {
        self.users.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(30);

    fn user(id: u64) -> UserId {
        UserId::new(id)
    }

    #[test]
    fn first_invocation_is_allowed() {
        let mut cooldowns = Cooldowns::new(WINDOW);
        assert!(matches!(cooldowns.check_and_record(user(1), Instant::now()), CooldownCheck::Allowed));
    }

    #[test]
    fn second_invocation_within_window_is_denied_with_remaining() {
        let mut cooldowns = Cooldowns::new(WINDOW);
        let start = Instant::now();

        assert!(matches!(cooldowns.check_and_record(user(1), start), CooldownCheck::Allowed));

        match cooldowns.check_and_record(user(1), start + Duration::from_secs(10)) {
            CooldownCheck::OnCooldown { remaining } => assert_eq!(remaining, Duration::from_secs(20)),
            CooldownCheck::Allowed => panic!("expected denial within the window")
        }
    }

    #[test]
    fn denied_invocation_does_not_refresh_the_timestamp() {
        let mut cooldowns = Cooldowns::new(WINDOW);
        let start = Instant::now();

        cooldowns.check_and_record(user(1), start);
        cooldowns.check_and_record(user(1), start + Duration::from_secs(29));

        // Had the denial refreshed the timestamp, this would still be denied.
        assert!(matches!(
            cooldowns.check_and_record(user(1), start + Duration::from_secs(30)),
            CooldownCheck::Allowed
        ));
    }

    #[test]
    fn invocation_after_window_is_allowed_and_recharges() {
        let mut cooldowns = Cooldowns::new(WINDOW);
        let start = Instant::now();

        cooldowns.check_and_record(user(1), start);
        assert!(matches!(
            cooldowns.check_and_record(user(1), start + Duration::from_secs(31)),
            CooldownCheck::Allowed
        ));

        // The allowed call recorded a fresh timestamp unconditionally.
        assert!(matches!(
            cooldowns.check_and_record(user(1), start + Duration::from_secs(32)),
            CooldownCheck::OnCooldown { .. }
        ));
    }

    #[test]
    fn users_are_tracked_independently() {
        let mut cooldowns = Cooldowns::new(WINDOW);
        let start = Instant::now();

        cooldowns.check_and_record(user(1), start);
        assert!(matches!(cooldowns.check_and_record(user(2), start), CooldownCheck::Allowed));
    }

    #[test]
    fn expired_entries_are_swept() {
        let mut cooldowns = Cooldowns::new(WINDOW);
        let start = Instant::now();

        for id in 1..=5 {
            cooldowns.check_and_record(user(id), start);
        }
        assert_eq!(cooldowns.tracked_users(), 5);

        cooldowns.check_and_record(user(6), start + Duration::from_secs(60));
        assert_eq!(cooldowns.tracked_users(), 1);
    }
}
