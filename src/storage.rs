use crate::errors::StoreError;
use crate::metrics::{date_key, parse_date};
use crate::models::{clamp_points, Habit, HabitData, HabitId, HabitPatch, NewHabit, DEFAULT_POINTS};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// JSON-file backed habit collection.
///
/// Writes are applied to a copy of the collection and only replace the
/// in-memory state once the file has been written.
#[derive(Debug)]
pub struct HabitStore {
    path: PathBuf,
    data: Mutex<HabitData>,
}

impl HabitStore {
    pub fn new(path: PathBuf, data: HabitData) -> Self {
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub async fn open(path: PathBuf) -> Self {
        let data = load_data(&path).await;
        info!(path = %path.display(), habits = data.habits.len(), "habit store opened");
        Self::new(path, data)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn list_all(&self) -> Vec<Habit> {
        self.data.lock().await.habits.clone()
    }

    pub async fn get(&self, id: HabitId) -> Result<Habit, StoreError> {
        let data = self.data.lock().await;
        data.habits
            .iter()
            .find(|habit| habit.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub async fn create(&self, new_habit: NewHabit) -> Result<Habit, StoreError> {
        let name = new_habit.name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("name is required".into()));
        }

        let habit = Habit {
            id: Uuid::new_v4(),
            name: name.to_string(),
            points: new_habit.points.map(clamp_points).unwrap_or(DEFAULT_POINTS),
            completed_dates: Default::default(),
            description: new_habit.description.unwrap_or_default(),
        };

        let mut data = self.data.lock().await;
        let mut next = data.clone();
        next.habits.push(habit.clone());
        self.commit(&mut data, next).await?;

        info!(id = %habit.id, name = %habit.name, "habit created");
        Ok(habit)
    }

    pub async fn update(&self, id: HabitId, patch: HabitPatch) -> Result<Habit, StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let habit = next
            .habits
            .iter_mut()
            .find(|habit| habit.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        apply_patch(habit, patch)?;
        let updated = habit.clone();

        self.commit(&mut data, next).await?;
        debug!(id = %id, "habit updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: HabitId) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let position = data
            .habits
            .iter()
            .position(|habit| habit.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut next = data.clone();
        next.habits.remove(position);
        self.commit(&mut data, next).await?;

        info!(id = %id, "habit deleted");
        Ok(())
    }

    /// Moves the named habits to the front in the given sequence. Habits not
    /// named keep their relative order after them; unknown ids are ignored.
    pub async fn reorder(&self, ids: &[HabitId]) -> Result<Vec<Habit>, StoreError> {
        let mut data = self.data.lock().await;
        let mut remaining = data.habits.clone();
        let mut ordered = Vec::with_capacity(remaining.len());
        for id in ids {
            if let Some(position) = remaining.iter().position(|habit| habit.id == *id) {
                ordered.push(remaining.remove(position));
            }
        }
        ordered.extend(remaining);

        let next = HabitData { habits: ordered };
        self.commit(&mut data, next).await?;

        info!(count = ids.len(), "habits reordered");
        Ok(data.habits.clone())
    }

    async fn commit(&self, current: &mut HabitData, next: HabitData) -> Result<(), StoreError> {
        persist_data(&self.path, &next).await?;
        *current = next;
        Ok(())
    }
}

/// Malformed ids can never name a stored habit, so they are reported as unknown.
pub fn parse_id(raw: &str) -> Result<HabitId, StoreError> {
    Uuid::parse_str(raw.trim()).map_err(|_| StoreError::NotFound(raw.to_string()))
}

fn apply_patch(habit: &mut Habit, patch: HabitPatch) -> Result<(), StoreError> {
    if let Some(name) = patch.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("name must not be empty".into()));
        }
        habit.name = name.to_string();
    }
    if let Some(points) = patch.points {
        habit.points = clamp_points(points);
    }
    if let Some(description) = patch.description {
        habit.description = description;
    }
    if let Some(dates) = patch.completed_dates {
        habit.completed_dates = dates.into_iter().map(normalize_date).collect();
    }
    Ok(())
}

/// Zero-pads parseable dates so one calendar day has one key. Anything else is
/// stored as given.
fn normalize_date(raw: String) -> String {
    parse_date(&raw).map(date_key).unwrap_or(raw)
}

/// An unparsable file is moved to `<name>.corrupt` so the next write cannot
/// overwrite the history it still holds.
pub async fn load_data(path: &Path) -> HabitData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                let backup = corrupt_path(path);
                match fs::rename(path, &backup).await {
                    Ok(()) => warn!(backup = %backup.display(), "moved unreadable data file aside"),
                    Err(err) => error!("failed to move unreadable data file aside: {err}"),
                }
                HabitData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => HabitData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            HabitData::default()
        }
    }
}

pub fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".corrupt");
    path.with_file_name(name)
}

pub async fn persist_data(path: &Path, data: &HabitData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data).map_err(StoreError::storage)?;
    fs::write(path, payload).await.map_err(|err| {
        error!(path = %path.display(), "failed to write data file: {err}");
        StoreError::storage(err)
    })
}
