pub mod app;
pub mod capture;
pub mod config;
pub mod errors;
pub mod food_log;
pub mod handlers;
pub mod models;
pub mod presenter;
pub mod state;
pub mod storage;
pub mod ui;
pub mod workout;

pub use app::router;
pub use config::Config;
pub use food_log::FoodLogStore;
pub use state::AppState;
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
