use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

pub type HabitId = Uuid;

pub const MIN_POINTS: u8 = 1;
pub const MAX_POINTS: u8 = 10;
pub const DEFAULT_POINTS: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub points: u8,
    #[serde(default)]
    pub completed_dates: BTreeSet<String>,
    #[serde(default)]
    pub description: String,
}

impl Habit {
    pub fn is_completed_on(&self, date: &str) -> bool {
        self.completed_dates.contains(date)
    }
}

/// Clamps any requested point value into `[MIN_POINTS, MAX_POINTS]`.
pub fn clamp_points(points: i64) -> u8 {
    points.clamp(i64::from(MIN_POINTS), i64::from(MAX_POINTS)) as u8
}

/// Persisted collection. Vector order is the presentation order.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HabitData {
    pub habits: Vec<Habit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewHabit {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Merge patch: `None` leaves the field untouched. Unknown JSON fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed_dates: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedPoint {
    pub date: String,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCompletionSample {
    pub date: String,
    pub completed: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub completion_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub habit: Habit,
    pub series: Vec<DailyCompletionSample>,
    pub stats: HabitStats,
}
