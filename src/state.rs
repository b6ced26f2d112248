use crate::errors::AppError;
use crate::kv::MemoryKv;
use crate::storage::persist_records;
use crate::store::CheckpointStore;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::{Mutex, MutexGuard};
use tracing::error;

pub type Store = CheckpointStore<MemoryKv>;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub store: Arc<Mutex<Store>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, kv: MemoryKv) -> Self {
        Self {
            data_path,
            store: Arc::new(Mutex::new(CheckpointStore::new(kv))),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().await
    }
}

/// On a failed write the store is put back to `snapshot`.
pub async fn commit(state: &AppState, store: &mut Store, snapshot: MemoryKv) -> Result<(), AppError> {
    if let Err(err) = persist_records(&state.data_path, store.kv()).await {
        error!("failed to write data file: {}", err.message);
        store.restore(snapshot);
        return Err(err);
    }
    Ok(())
}
