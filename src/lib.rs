pub mod app;
pub mod config;
pub mod errors;
pub mod export;
pub mod filter;
pub mod handlers;
pub mod kv;
pub mod models;
pub mod stats;
pub mod storage;
pub mod store;
pub mod ui;
pub mod state;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::{load_records, persist_records};
pub use store::CheckpointStore;
