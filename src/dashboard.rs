//! View state for the dashboard and habit detail pages.
//!
//! `Dashboard` owns the habit list as shown to the user. Every mutation is
//! applied locally first and returns the [`Command`] that has to reach the
//! store for the change to persist.

use crate::metrics::{completion_series_at, date_key, habit_stats_at, points_series, today};
use crate::models::{
    clamp_points, DailyCompletionSample, DerivedPoint, Habit, HabitId, HabitPatch, HabitStats,
    NewHabit,
};
use chrono::{Duration, NaiveDate};

pub const PLACEHOLDER_NAME: &str = "Unnamed Habit";
pub const WEEK_DAYS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create(NewHabitCommand),
    Update { id: HabitId, patch: HabitPatch },
    Delete(HabitId),
    Reorder(Vec<HabitId>),
}

/// `NewHabit` carries `Option`s meant for JSON input; the dashboard always
/// knows its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabitCommand {
    pub name: String,
}

impl From<NewHabitCommand> for NewHabit {
    fn from(command: NewHabitCommand) -> Self {
        NewHabit {
            name: command.name,
            points: None,
            description: Some(String::new()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Enter,
    Escape,
    Other,
}

impl EditKey {
    pub fn from_name(key: &str) -> Self {
        match key {
            "Enter" => Self::Enter,
            "Escape" | "Esc" => Self::Escape,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Dashboard,
    HabitDetail(HabitDetail),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NameEdit {
    index: usize,
    draft: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Drag {
    source: usize,
    target: usize,
}

/// Detail page state: which habit, plus the unsaved description draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitDetail {
    index: usize,
    draft: String,
}

impl HabitDetail {
    fn open(index: usize, habit: &Habit) -> Self {
        Self {
            index,
            draft: habit.description.clone(),
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    habits: Vec<Habit>,
    current_date: NaiveDate,
    view: View,
    new_habit_input: String,
    editing: Option<NameEdit>,
    drag: Option<Drag>,
}

impl Dashboard {
    pub fn new(habits: Vec<Habit>, current_date: NaiveDate) -> Self {
        Self {
            habits,
            current_date,
            view: View::Dashboard,
            new_habit_input: String::new(),
            editing: None,
            drag: None,
        }
    }

    pub fn for_today(habits: Vec<Habit>) -> Self {
        Self::new(habits, today())
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    pub fn position_of(&self, id: HabitId) -> Option<usize> {
        self.habits.iter().position(|habit| habit.id == id)
    }

    /// Seven consecutive days starting at `current_date`.
    pub fn week_days(&self) -> Vec<NaiveDate> {
        (0..WEEK_DAYS as i64)
            .map(|offset| self.current_date + Duration::days(offset))
            .collect()
    }

    pub fn points_series(&self) -> Vec<DerivedPoint> {
        points_series(&self.habits)
    }

    pub fn open_detail(&mut self, index: usize) -> bool {
        let Some(habit) = self.habits.get(index) else {
            return false;
        };
        self.view = View::HabitDetail(HabitDetail::open(index, habit));
        true
    }

    pub fn back(&mut self) {
        self.view = View::Dashboard;
    }

    pub fn set_new_habit_input(&mut self, value: impl Into<String>) {
        self.new_habit_input = value.into();
    }

    pub fn new_habit_input(&self) -> &str {
        &self.new_habit_input
    }

    /// Blank input is ignored. The habit shows up once the store has assigned
    /// its id and the caller passes it to [`Dashboard::accept_created`].
    pub fn add_habit(&mut self) -> Option<Command> {
        let name = self.new_habit_input.trim().to_string();
        if name.is_empty() {
            return None;
        }
        self.new_habit_input.clear();
        Some(Command::Create(NewHabitCommand { name }))
    }

    pub fn accept_created(&mut self, habit: Habit) {
        self.habits.push(habit);
    }

    pub fn delete_habit(&mut self, index: usize) -> Option<Command> {
        if index >= self.habits.len() {
            return None;
        }
        let removed = self.habits.remove(index);
        self.reset_transient_state();
        Some(Command::Delete(removed.id))
    }

    /// Symmetric toggle: a completed date is removed, any other date added.
    pub fn toggle_completion(&mut self, index: usize, date: NaiveDate) -> Option<Command> {
        let habit = self.habits.get_mut(index)?;
        let key = date_key(date);
        if !habit.completed_dates.remove(&key) {
            habit.completed_dates.insert(key);
        }
        Some(Command::Update {
            id: habit.id,
            patch: HabitPatch {
                completed_dates: Some(habit.completed_dates.iter().cloned().collect()),
                ..HabitPatch::default()
            },
        })
    }

    pub fn set_points(&mut self, index: usize, points: i64) -> Option<Command> {
        let habit = self.habits.get_mut(index)?;
        habit.points = clamp_points(points);
        Some(Command::Update {
            id: habit.id,
            patch: HabitPatch {
                points: Some(i64::from(habit.points)),
                ..HabitPatch::default()
            },
        })
    }

    pub fn start_rename(&mut self, index: usize) -> bool {
        let Some(habit) = self.habits.get(index) else {
            return false;
        };
        self.editing = Some(NameEdit {
            index,
            draft: habit.name.clone(),
        });
        true
    }

    pub fn editing_index(&self) -> Option<usize> {
        self.editing.as_ref().map(|edit| edit.index)
    }

    pub fn set_rename_draft(&mut self, value: impl Into<String>) {
        if let Some(edit) = self.editing.as_mut() {
            edit.draft = value.into();
        }
    }

    /// Commits on blur. Blank drafts fall back to [`PLACEHOLDER_NAME`].
    pub fn commit_rename(&mut self) -> Option<Command> {
        let edit = self.editing.take()?;
        let habit = self.habits.get_mut(edit.index)?;
        let trimmed = edit.draft.trim();
        habit.name = if trimmed.is_empty() {
            PLACEHOLDER_NAME.to_string()
        } else {
            trimmed.to_string()
        };
        Some(Command::Update {
            id: habit.id,
            patch: HabitPatch {
                name: Some(habit.name.clone()),
                ..HabitPatch::default()
            },
        })
    }

    pub fn cancel_rename(&mut self) {
        self.editing = None;
    }

    pub fn rename_key(&mut self, key: EditKey) -> Option<Command> {
        match key {
            EditKey::Enter => self.commit_rename(),
            EditKey::Escape => {
                self.cancel_rename();
                None
            }
            EditKey::Other => None,
        }
    }

    pub fn drag_start(&mut self, index: usize) {
        if index < self.habits.len() {
            self.drag = Some(Drag {
                source: index,
                target: index,
            });
        }
    }

    /// Tracks the hover target only; the list is rearranged on [`Dashboard::drop_dragged`].
    pub fn drag_over(&mut self, index: usize) {
        if let Some(drag) = self.drag.as_mut() {
            drag.target = index.min(self.habits.len().saturating_sub(1));
        }
    }

    /// Row order as it would look if the dragged row were dropped now.
    pub fn preview_order(&self) -> Vec<&Habit> {
        let mut order: Vec<&Habit> = self.habits.iter().collect();
        if let Some(drag) = self.drag {
            let moved = order.remove(drag.source);
            order.insert(drag.target, moved);
        }
        order
    }

    pub fn drop_dragged(&mut self) -> Option<Command> {
        let drag = self.drag.take()?;
        if drag.source == drag.target {
            return None;
        }
        let moved = self.habits.remove(drag.source);
        self.habits.insert(drag.target, moved);
        self.reset_transient_state();
        Some(Command::Reorder(self.habits.iter().map(|habit| habit.id).collect()))
    }

    /// Ends a drag that never dropped; nothing moves.
    pub fn drag_end(&mut self) {
        self.drag = None;
    }

    pub fn detail(&self) -> Option<(&Habit, &HabitDetail)> {
        match &self.view {
            View::HabitDetail(detail) => self.habits.get(detail.index).map(|h| (h, detail)),
            View::Dashboard => None,
        }
    }

    pub fn edit_description(&mut self, value: impl Into<String>) {
        if let View::HabitDetail(detail) = &mut self.view {
            detail.draft = value.into();
        }
    }

    /// Saves the description draft. Unchanged drafts issue no write.
    pub fn blur_description(&mut self) -> Option<Command> {
        let View::HabitDetail(detail) = &self.view else {
            return None;
        };
        let habit = self.habits.get_mut(detail.index)?;
        if habit.description == detail.draft {
            return None;
        }
        habit.description = detail.draft.clone();
        Some(Command::Update {
            id: habit.id,
            patch: HabitPatch {
                description: Some(habit.description.clone()),
                ..HabitPatch::default()
            },
        })
    }

    pub fn detail_progress(&self, today: NaiveDate) -> Option<(Vec<DailyCompletionSample>, HabitStats)> {
        self.detail()
            .map(|(habit, _)| (completion_series_at(today, habit), habit_stats_at(today, habit)))
    }

    // Positions shift after a delete or move, so index-based state is stale.
    fn reset_transient_state(&mut self) {
        self.editing = None;
        self.drag = None;
        if let View::HabitDetail(_) = self.view {
            self.view = View::Dashboard;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn habit(name: &str) -> Habit {
        Habit {
            id: Uuid::new_v4(),
            name: name.into(),
            points: 1,
            completed_dates: Default::default(),
            description: String::new(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn board(names: &[&str]) -> Dashboard {
        Dashboard::new(names.iter().map(|n| habit(n)).collect(), today())
    }

    fn names(dashboard: &Dashboard) -> Vec<&str> {
        dashboard.habits().iter().map(|h| h.name.as_str()).collect()
    }

    #[test]
    fn add_trims_and_ignores_blank_input() {
        let mut dashboard = board(&[]);
        dashboard.set_new_habit_input("   ");
        assert_eq!(dashboard.add_habit(), None);

        dashboard.set_new_habit_input("  Read  ");
        let command = dashboard.add_habit().unwrap();
        assert_eq!(
            command,
            Command::Create(NewHabitCommand { name: "Read".into() })
        );
        assert!(dashboard.new_habit_input().is_empty());

        dashboard.accept_created(habit("Read"));
        assert_eq!(names(&dashboard), vec!["Read"]);
    }

    #[test]
    fn delete_by_position() {
        let mut dashboard = board(&["A", "B", "C"]);
        let id = dashboard.habits()[1].id;
        assert_eq!(dashboard.delete_habit(1), Some(Command::Delete(id)));
        assert_eq!(names(&dashboard), vec!["A", "C"]);
        assert_eq!(dashboard.delete_habit(5), None);
    }

    #[test]
    fn toggle_twice_restores_dates() {
        let mut dashboard = board(&["A"]);
        let date = today();
        let before = dashboard.habits()[0].completed_dates.clone();

        dashboard.toggle_completion(0, date);
        assert!(dashboard.habits()[0].is_completed_on("2024-06-03"));
        let command = dashboard.toggle_completion(0, date).unwrap();

        assert_eq!(dashboard.habits()[0].completed_dates, before);
        match command {
            Command::Update { patch, .. } => assert_eq!(patch.completed_dates, Some(vec![])),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn points_are_clamped() {
        let mut dashboard = board(&["A"]);
        dashboard.set_points(0, 99);
        assert_eq!(dashboard.habits()[0].points, 10);
        let command = dashboard.set_points(0, -4).unwrap();
        assert_eq!(dashboard.habits()[0].points, 1);
        match command {
            Command::Update { patch, .. } => assert_eq!(patch.points, Some(1)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rename_to_whitespace_uses_placeholder() {
        let mut dashboard = board(&["A"]);
        assert!(dashboard.start_rename(0));
        dashboard.set_rename_draft("   ");
        dashboard.commit_rename();
        assert_eq!(dashboard.habits()[0].name, PLACEHOLDER_NAME);
        assert_eq!(dashboard.editing_index(), None);
    }

    #[test]
    fn rename_commits_on_enter_and_cancels_on_escape() {
        let mut dashboard = board(&["A"]);
        dashboard.start_rename(0);
        dashboard.set_rename_draft("Swim");
        assert_eq!(dashboard.rename_key(EditKey::from_name("Escape")), None);
        assert_eq!(names(&dashboard), vec!["A"]);

        dashboard.start_rename(0);
        dashboard.set_rename_draft("  Swim ");
        assert_eq!(dashboard.rename_key(EditKey::Other), None);
        assert!(dashboard.rename_key(EditKey::from_name("Enter")).is_some());
        assert_eq!(names(&dashboard), vec!["Swim"]);
    }

    #[test]
    fn drop_moves_dragged_row() {
        let mut dashboard = board(&["A", "B", "C"]);
        dashboard.drag_start(0);
        dashboard.drag_over(1);
        dashboard.drag_over(2);
        let preview: Vec<_> = dashboard.preview_order().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(preview, vec!["B", "C", "A"]);
        assert_eq!(names(&dashboard), vec!["A", "B", "C"]);

        let command = dashboard.drop_dragged().unwrap();
        assert_eq!(names(&dashboard), vec!["B", "C", "A"]);
        let ids: Vec<_> = dashboard.habits().iter().map(|h| h.id).collect();
        assert_eq!(command, Command::Reorder(ids));
    }

    #[test]
    fn drag_end_without_drop_keeps_order() {
        let mut dashboard = board(&["A", "B"]);
        dashboard.drag_start(1);
        dashboard.drag_over(0);
        dashboard.drag_end();
        assert_eq!(dashboard.drop_dragged(), None);
        assert_eq!(names(&dashboard), vec!["A", "B"]);
    }

    #[test]
    fn week_starts_at_current_date() {
        let dashboard = board(&[]);
        let days = dashboard.week_days();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], today());
        assert_eq!(days[6], today() + Duration::days(6));
    }

    #[test]
    fn detail_view_round_trip() {
        let mut dashboard = board(&["A", "B"]);
        assert!(!dashboard.open_detail(9));
        assert!(dashboard.open_detail(1));
        assert_eq!(dashboard.detail().unwrap().0.name, "B");

        dashboard.edit_description("every morning");
        assert_eq!(dashboard.habits()[1].description, "");
        let command = dashboard.blur_description().unwrap();
        assert_eq!(dashboard.habits()[1].description, "every morning");
        assert!(matches!(command, Command::Update { .. }));
        assert_eq!(dashboard.blur_description(), None);

        let (series, _) = dashboard.detail_progress(today()).unwrap();
        assert_eq!(series.len(), 31);

        dashboard.back();
        assert_eq!(dashboard.view(), &View::Dashboard);
        assert!(dashboard.detail().is_none());
    }

    #[test]
    fn points_series_follows_local_edits() {
        let mut dashboard = board(&["A", "B"]);
        dashboard.set_points(1, 3);
        dashboard.toggle_completion(0, today());
        dashboard.toggle_completion(1, today());
        let series = dashboard.points_series();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].points, 4);
    }
}
