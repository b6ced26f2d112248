use crate::errors::AppError;
use crate::kv::MemoryKv;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

pub async fn load_records(path: &Path) -> MemoryKv {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<MemoryKv>(&bytes) {
            Ok(kv) => {
                info!(records = kv.records().len(), "loaded data file");
                kv
            }
            Err(err) => {
                error!("failed to parse data file: {err}");
                MemoryKv::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => MemoryKv::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            MemoryKv::default()
        }
    }
}

pub async fn persist_records(path: &Path, kv: &MemoryKv) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(kv).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}
