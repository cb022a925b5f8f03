//! Daily close schedule — rounds close at a fixed UTC time of day.
//!
//! The next deadline is always the next strictly-future occurrence of the
//! configured time: a round created at 05:59 closes a minute later, a round
//! created at 06:00 sharp runs until tomorrow.

use eggvote_types::Timestamp;

const SECS_PER_DAY: u64 = 86_400;

/// The configured close time of day (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CloseSchedule {
    hour: u8,
    minute: u8,
}

impl CloseSchedule {
    /// Create a schedule closing daily at `hour:minute` UTC.
    ///
    /// # Panics
    /// Panics if `hour >= 24` or `minute >= 60`. Configuration validates
    /// user input before constructing one.
    pub fn new(hour: u8, minute: u8) -> Self {
        assert!(hour < 24, "close hour out of range");
        assert!(minute < 60, "close minute out of range");
        Self { hour, minute }
    }

    /// Seconds past midnight of the configured close time.
    fn target_in_day(&self) -> u64 {
        self.hour as u64 * 3_600 + self.minute as u64 * 60
    }

    /// The next occurrence of the close time strictly after `now`.
    pub fn next_deadline(&self, now: Timestamp) -> Timestamp {
        let day_start = (now.as_secs() / SECS_PER_DAY) * SECS_PER_DAY;
        let today_target = day_start + self.target_in_day();
        if today_target > now.as_secs() {
            Timestamp::new(today_target)
        } else {
            Timestamp::new(today_target + SECS_PER_DAY)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2021-01-01 00:00:00 UTC, a known day boundary.
    const DAY_START: u64 = 1_609_459_200;

    fn six_am() -> CloseSchedule {
        CloseSchedule::new(6, 0)
    }

    #[test]
    fn before_target_closes_today() {
        let now = Timestamp::new(DAY_START + 3 * 3_600);
        let deadline = six_am().next_deadline(now);
        assert_eq!(deadline, Timestamp::new(DAY_START + 6 * 3_600));
    }

    #[test]
    fn after_target_closes_tomorrow() {
        let now = Timestamp::new(DAY_START + 7 * 3_600);
        let deadline = six_am().next_deadline(now);
        assert_eq!(deadline, Timestamp::new(DAY_START + SECS_PER_DAY + 6 * 3_600));
    }

    #[test]
    fn exactly_at_target_closes_tomorrow() {
        let now = Timestamp::new(DAY_START + 6 * 3_600);
        let deadline = six_am().next_deadline(now);
        assert_eq!(deadline, Timestamp::new(DAY_START + SECS_PER_DAY + 6 * 3_600));
        assert!(deadline.secs_until(now) > 0);
    }

    #[test]
    fn minute_component_respected() {
        let schedule = CloseSchedule::new(23, 45);
        let now = Timestamp::new(DAY_START);
        let deadline = schedule.next_deadline(now);
        assert_eq!(
            deadline,
            Timestamp::new(DAY_START + 23 * 3_600 + 45 * 60)
        );
    }

    #[test]
    #[should_panic(expected = "close hour out of range")]
    fn rejects_invalid_hour() {
        CloseSchedule::new(24, 0);
    }
}
