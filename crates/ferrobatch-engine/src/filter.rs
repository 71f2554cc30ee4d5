//! Name and age filtering of scanned files

use chrono::{DateTime, Days, Local, NaiveDate};
use ferrobatch_types::{AgeWindowPolicy, Candidate, NamePattern, Task};

/// Calendar window a creation date must fall in
///
/// Built once per task from the clock reading taken at task start, so every
/// candidate of that task is judged against the same cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionWindow {
    cutoff: Option<NaiveDate>,
}

impl SelectionWindow {
    /// Window for `max_age_days`, where 0 means unbounded
    pub fn new(max_age_days: u32, policy: AgeWindowPolicy, today: NaiveDate) -> Self {
        if max_age_days == 0 {
            return Self::unbounded();
        }

        let lookback = Days::new(u64::from(policy.lookback_days(max_age_days)));
        let cutoff = today.checked_sub_days(lookback).unwrap_or(NaiveDate::MIN);
        Self {
            cutoff: Some(cutoff),
        }
    }

    /// Window that admits every date
    pub fn unbounded() -> Self {
        Self { cutoff: None }
    }

    /// Earliest admitted date, `None` when unbounded
    pub fn cutoff(&self) -> Option<NaiveDate> {
        self.cutoff
    }

    /// Check if a creation date is inside the window
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.cutoff.map_or(true, |cutoff| date >= cutoff)
    }
}

/// Name pattern and age window applied to candidates
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    name_pattern: NamePattern,
    window: SelectionWindow,
}

impl FilterCriteria {
    /// Create criteria from a pattern and a window
    pub fn new(name_pattern: NamePattern, window: SelectionWindow) -> Self {
        Self {
            name_pattern,
            window,
        }
    }

    /// Criteria for a task evaluated at `now`
    pub fn for_task(task: &Task, policy: AgeWindowPolicy, now: DateTime<Local>) -> Self {
        Self::new(
            task.name_pattern.clone(),
            SelectionWindow::new(task.max_age_days, policy, now.date_naive()),
        )
    }

    /// The age window
    pub fn window(&self) -> &SelectionWindow {
        &self.window
    }

    /// Check a bare file name against the pattern
    pub fn matches_name(&self, file_name: &str) -> bool {
        self.name_pattern.is_match(file_name)
    }

    /// Check both the name and the creation date of a candidate
    pub fn matches(&self, candidate: &Candidate) -> bool {
        candidate
            .file_name()
            .is_some_and(|name| self.matches_name(&name))
            && self.window.contains(candidate.creation_date())
    }

    /// Keep the candidates that match, in their original order
    pub fn select<I>(&self, candidates: I) -> Vec<Candidate>
    where
        I: IntoIterator<Item = Candidate>,
    {
        candidates
            .into_iter()
            .filter(|candidate| self.matches(candidate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn created_on(name: &str, day: NaiveDate) -> Candidate {
        let at = Local
            .from_local_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
            .earliest()
            .unwrap();
        Candidate::new(format!("/in/{}", name), at)
    }

    fn criteria(pattern: &str, max_age_days: u32, today: NaiveDate) -> FilterCriteria {
        FilterCriteria::new(
            NamePattern::new(pattern).unwrap(),
            SelectionWindow::new(max_age_days, AgeWindowPolicy::InclusiveToday, today),
        )
    }

    #[test]
    fn test_zero_days_is_unbounded() {
        let window = SelectionWindow::new(0, AgeWindowPolicy::FullDays, date(2025, 3, 26));
        assert_eq!(window, SelectionWindow::unbounded());
        assert!(window.contains(date(1970, 1, 1)));
        assert!(window.contains(NaiveDate::MIN));
    }

    #[rstest]
    #[case(AgeWindowPolicy::InclusiveToday, 1, date(2025, 3, 26))]
    #[case(AgeWindowPolicy::InclusiveToday, 7, date(2025, 3, 20))]
    #[case(AgeWindowPolicy::FullDays, 1, date(2025, 3, 25))]
    #[case(AgeWindowPolicy::FullDays, 7, date(2025, 3, 19))]
    fn test_cutoff(
        #[case] policy: AgeWindowPolicy,
        #[case] max_age_days: u32,
        #[case] expected: NaiveDate,
    ) {
        let window = SelectionWindow::new(max_age_days, policy, date(2025, 3, 26));
        assert_eq!(window.cutoff(), Some(expected));
    }

    #[test]
    fn test_cutoff_saturates_at_earliest_date() {
        let window = SelectionWindow::new(u32::MAX, AgeWindowPolicy::FullDays, date(1, 1, 1));
        assert_eq!(window.cutoff(), Some(NaiveDate::MIN));
    }

    #[test]
    fn test_one_day_selects_today_only() {
        let today = date(2025, 3, 26);
        let criteria = criteria(r"Analyse_.*\.xlsx", 1, today);

        let selected = criteria.select(vec![
            created_on("Analyse_1.xlsx", today),
            created_on("Analyse_2.xlsx", date(2025, 3, 25)),
            created_on("Other.xlsx", today),
        ]);

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].path, std::path::PathBuf::from("/in/Analyse_1.xlsx"));
    }

    #[test]
    fn test_select_keeps_order() {
        let today = date(2025, 3, 26);
        let criteria = criteria(".*", 0, today);
        let input: Vec<_> = ["c.txt", "a.txt", "b.txt"]
            .iter()
            .map(|name| created_on(name, today))
            .collect();

        assert_eq!(criteria.select(input.clone()), input);
    }

    #[test]
    fn test_name_match_is_not_anchored() {
        let criteria = criteria("Analyse_", 0, date(2025, 3, 26));
        assert!(criteria.matches_name("Weekly_Analyse_2025.xlsx"));
        assert!(!criteria.matches_name("analyse_2025.xlsx"));
    }

    proptest! {
        #[test]
        fn test_inclusive_window_boundaries(
            max_age_days in 1u32..3650,
            offset in 0u32..3650,
            day_of_year in 1u32..366,
        ) {
            let today = NaiveDate::from_yo_opt(2024, day_of_year).unwrap();
            let window = SelectionWindow::new(max_age_days, AgeWindowPolicy::InclusiveToday, today);
            let created = today - Days::new(u64::from(offset));
            prop_assert_eq!(window.contains(created), offset < max_age_days);
        }

        #[test]
        fn test_full_days_window_boundaries(
            max_age_days in 1u32..3650,
            offset in 0u32..3650,
        ) {
            let today = date(2025, 3, 26);
            let window = SelectionWindow::new(max_age_days, AgeWindowPolicy::FullDays, today);
            let created = today - Days::new(u64::from(offset));
            prop_assert_eq!(window.contains(created), offset <= max_age_days);
        }

        #[test]
        fn test_select_is_idempotent(
            names in proptest::collection::vec("[A-Za-z_]{1,8}\\.(txt|xlsx)", 0..20),
            offsets in proptest::collection::vec(0u64..30, 20),
            max_age_days in 0u32..10,
        ) {
            let today = date(2025, 3, 26);
            let criteria = criteria(r"^[A-M].*\.xlsx$", max_age_days, today);
            let candidates: Vec<_> = names
                .iter()
                .zip(offsets.iter())
                .map(|(name, offset)| created_on(name, today - Days::new(*offset)))
                .collect();

            let once = criteria.select(candidates);
            let twice = criteria.select(once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}
