use crate::storage::HabitStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<HabitStore>,
}

impl AppState {
    pub fn new(store: HabitStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}
