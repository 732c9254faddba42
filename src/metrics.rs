use crate::models::{DailyCompletionSample, DerivedPoint, Habit, HabitStats};
use chrono::{Duration, Local, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// Days in the trailing progress window, today included.
pub const PROGRESS_WINDOW_DAYS: i64 = 31;

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Sums habit points per completion date, ascending by calendar date.
/// Dates that are not `YYYY-MM-DD` are skipped.
pub fn points_series(habits: &[Habit]) -> Vec<DerivedPoint> {
    let mut totals: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for habit in habits {
        for date in habit.completed_dates.iter().filter_map(|d| parse_date(d)) {
            *totals.entry(date).or_default() += u32::from(habit.points);
        }
    }

    totals
        .into_iter()
        .map(|(date, points)| DerivedPoint {
            date: date_key(date),
            points,
        })
        .collect()
}

pub fn completion_series(habit: &Habit) -> Vec<DailyCompletionSample> {
    completion_series_at(today(), habit)
}

pub fn completion_series_at(today: NaiveDate, habit: &Habit) -> Vec<DailyCompletionSample> {
    (0..PROGRESS_WINDOW_DAYS)
        .rev()
        .map(|offset| {
            let date = date_key(today - Duration::days(offset));
            let completed = u8::from(habit.is_completed_on(&date));
            DailyCompletionSample { date, completed }
        })
        .collect()
}

pub fn habit_stats(habit: &Habit) -> HabitStats {
    habit_stats_at(today(), habit)
}

pub fn habit_stats_at(today: NaiveDate, habit: &Habit) -> HabitStats {
    let dates: BTreeSet<NaiveDate> = habit
        .completed_dates
        .iter()
        .filter_map(|d| parse_date(d))
        .collect();

    // An open today does not break a streak that ran through yesterday.
    let anchor = if dates.contains(&today) {
        Some(today)
    } else {
        today.pred_opt().filter(|yesterday| dates.contains(yesterday))
    };
    let mut current_streak = 0;
    if let Some(mut day) = anchor {
        while dates.contains(&day) {
            current_streak += 1;
            match day.pred_opt() {
                Some(prev) => day = prev,
                None => break,
            }
        }
    }

    let mut longest_streak = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for date in &dates {
        run = match previous {
            Some(prev) if *date - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest_streak = longest_streak.max(run);
        previous = Some(*date);
    }

    let window_start = today - Duration::days(PROGRESS_WINDOW_DAYS - 1);
    let completed_in_window = dates.range(window_start..=today).count();

    HabitStats {
        current_streak,
        longest_streak,
        completion_rate: completed_in_window as f64 / PROGRESS_WINDOW_DAYS as f64,
    }
}
