//! Server-rendered dashboard. Each form post replays one user action on a
//! freshly loaded [`Dashboard`], sends the resulting command to the store and
//! redirects back to the page.

use crate::dashboard::{Command, Dashboard, EditKey};
use crate::errors::{AppError, StoreError};
use crate::metrics::{parse_date, today};
use crate::models::Habit;
use crate::state::AppState;
use crate::storage::{parse_id, HabitStore};
use crate::ui::{render_dashboard, render_detail};
use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    Form,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NameForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct PointsForm {
    pub points: String,
}

#[derive(Debug, Deserialize)]
pub struct ReorderForm {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Deserialize)]
pub struct DescriptionForm {
    #[serde(default)]
    pub description: String,
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let dashboard = load_dashboard(&state).await;
    Html(render_dashboard(&dashboard))
}

pub async fn habit_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let mut dashboard = load_dashboard(&state).await;
    let index = locate(&dashboard, &id)?;
    dashboard.open_detail(index);
    Ok(Html(render_detail(&dashboard, today())))
}

pub async fn add_habit(
    State(state): State<AppState>,
    Form(form): Form<NameForm>,
) -> Result<Redirect, AppError> {
    let mut dashboard = load_dashboard(&state).await;
    dashboard.set_new_habit_input(form.name);
    if let Some(command) = dashboard.add_habit() {
        if let Some(habit) = apply_command(&state.store, command).await? {
            dashboard.accept_created(habit);
        }
    }
    Ok(Redirect::to("/"))
}

pub async fn toggle_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ToggleForm>,
) -> Result<Redirect, AppError> {
    let date = parse_date(&form.date)
        .ok_or_else(|| AppError::bad_request("date must be YYYY-MM-DD"))?;
    let mut dashboard = load_dashboard(&state).await;
    let index = locate(&dashboard, &id)?;
    if let Some(command) = dashboard.toggle_completion(index, date) {
        apply_command(&state.store, command).await?;
    }
    Ok(Redirect::to("/"))
}

pub async fn update_points(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<PointsForm>,
) -> Result<Redirect, AppError> {
    let points: i64 = form
        .points
        .trim()
        .parse()
        .map_err(|_| AppError::bad_request("points must be a whole number"))?;
    let mut dashboard = load_dashboard(&state).await;
    let index = locate(&dashboard, &id)?;
    if let Some(command) = dashboard.set_points(index, points) {
        apply_command(&state.store, command).await?;
    }
    Ok(Redirect::to("/"))
}

/// A post without `key` is a blur commit.
pub async fn rename_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<NameForm>,
) -> Result<Redirect, AppError> {
    let mut dashboard = load_dashboard(&state).await;
    let index = locate(&dashboard, &id)?;
    dashboard.start_rename(index);
    dashboard.set_rename_draft(form.name);
    let command = match form.key.as_deref() {
        Some(key) => dashboard.rename_key(EditKey::from_name(key)),
        None => dashboard.commit_rename(),
    };
    if let Some(command) = command {
        apply_command(&state.store, command).await?;
    }
    Ok(Redirect::to("/"))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let mut dashboard = load_dashboard(&state).await;
    let index = locate(&dashboard, &id)?;
    if let Some(command) = dashboard.delete_habit(index) {
        apply_command(&state.store, command).await?;
    }
    Ok(Redirect::to("/"))
}

pub async fn reorder_habits(
    State(state): State<AppState>,
    Form(form): Form<ReorderForm>,
) -> Result<Redirect, AppError> {
    let mut dashboard = load_dashboard(&state).await;
    dashboard.drag_start(form.from);
    dashboard.drag_over(form.to);
    if let Some(command) = dashboard.drop_dragged() {
        apply_command(&state.store, command).await?;
    }
    Ok(Redirect::to("/"))
}

pub async fn save_description(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<DescriptionForm>,
) -> Result<Redirect, AppError> {
    let mut dashboard = load_dashboard(&state).await;
    let index = locate(&dashboard, &id)?;
    dashboard.open_detail(index);
    dashboard.edit_description(form.description);
    if let Some(command) = dashboard.blur_description() {
        apply_command(&state.store, command).await?;
    }
    Ok(Redirect::to(&format!("/habits/{id}")))
}

async fn load_dashboard(state: &AppState) -> Dashboard {
    Dashboard::for_today(state.store.list_all().await)
}

fn locate(dashboard: &Dashboard, raw_id: &str) -> Result<usize, AppError> {
    let id = parse_id(raw_id)?;
    dashboard
        .position_of(id)
        .ok_or_else(|| StoreError::NotFound(raw_id.to_string()).into())
}

/// Sends a dashboard command to the store. Returns the habit a `Create` produced.
pub async fn apply_command(
    store: &HabitStore,
    command: Command,
) -> Result<Option<Habit>, StoreError> {
    match command {
        Command::Create(new_habit) => store.create(new_habit.into()).await.map(Some),
        Command::Update { id, patch } => store.update(id, patch).await.map(|_| None),
        Command::Delete(id) => store.delete(id).await.map(|_| None),
        Command::Reorder(ids) => store.reorder(&ids).await.map(|_| None),
    }
}
