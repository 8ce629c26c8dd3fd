use crate::food_log::FoodLogStore;
use crate::storage::FileStorage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FoodLogStore<FileStorage>>,
}

impl AppState {
    pub fn new(storage: FileStorage) -> Self {
        Self {
            store: Arc::new(FoodLogStore::new(storage)),
        }
    }

    pub fn storage(&self) -> &FileStorage {
        self.store.storage()
    }
}
