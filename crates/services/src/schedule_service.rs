use chrono::{DateTime, Utc};

use prep_core::Clock;
use prep_core::schedule::{
    ScheduleEntry, ScheduleItem, classify, filter_visible, sort_by_date,
};

/// Dashboard-facing schedule facade that hides the time source.
///
/// All classification is pure and recomputed per call; the service only
/// supplies "now" so hosts and tests share one clock.
#[derive(Debug, Clone)]
pub struct ScheduleService {
    clock: Clock,
}

impl ScheduleService {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self { clock }
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Every entry classified against the service clock, input order kept.
    #[must_use]
    pub fn all_items(&self, entries: &[ScheduleEntry]) -> Vec<ScheduleItem> {
        classify(entries, self.clock.now())
    }

    /// What the "upcoming exams" widget shows: today and future entries,
    /// soonest first.
    #[must_use]
    pub fn upcoming_items(&self, entries: &[ScheduleEntry]) -> Vec<ScheduleItem> {
        sort_by_date(filter_visible(self.all_items(entries)), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use prep_core::model::EntryId;
    use prep_core::schedule::{ExamCategory, ScheduleStatus, dday_label};
    use prep_core::time::{fixed_clock, fixed_now};

    fn entry(title: &str, offset_days: i64) -> ScheduleEntry {
        ScheduleEntry::new(
            EntryId::random(),
            title,
            fixed_now().date_naive() + Duration::days(offset_days),
            ExamCategory::Sat,
        )
    }

    #[test]
    fn all_items_preserve_input_order() {
        let service = ScheduleService::new(fixed_clock());
        let items = service.all_items(&[entry("late", 20), entry("soon", 1), entry("gone", -3)]);

        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["late", "soon", "gone"]);
        assert_eq!(items[2].status, ScheduleStatus::Past);
    }

    #[test]
    fn upcoming_items_hide_past_and_sort_soonest_first() {
        let service = ScheduleService::new(fixed_clock());
        let items = service.upcoming_items(&[
            entry("late", 20),
            entry("today", 0),
            entry("gone", -3),
            entry("soon", 4),
        ]);

        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["today", "soon", "late"]);
        assert_eq!(dday_label(items[0].days_until), "D-DAY");
        assert!(items[1].is_urgent);
        assert!(!items[2].is_urgent);
    }
}
