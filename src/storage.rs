use crate::errors::AppError;
use crate::models::AppData;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info};

pub async fn ensure_parent_dir(path: &Path) -> Result<(), std::io::Error> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<AppData>(&bytes) {
            Ok(data) => {
                info!(
                    users = data.users.len(),
                    bets = data.bets.len(),
                    "loaded data from {}",
                    path.display()
                );
                data
            }
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    let tmp = temp_path(path);
    fs::write(&tmp, payload).await.map_err(AppError::internal)?;
    fs::rename(&tmp, path).await.map_err(AppError::internal)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::open_session;
    use chrono::Utc;

    fn scratch_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("bet_tracker_{}_{name}", std::process::id()));
        path.push("state.json");
        path
    }

    #[tokio::test]
    async fn persisted_data_loads_back() {
        let path = scratch_path("roundtrip");
        ensure_parent_dir(&path).await.unwrap();

        let mut data = AppData::default();
        open_session(&mut data, "user_abc", 7, Utc::now());
        persist_data(&path, &data).await.unwrap();

        let loaded = load_data(&path).await;
        assert_eq!(loaded.sessions.len(), 1);
        assert_eq!(loaded.sessions[0].user_id, "user_abc");
        assert!(!temp_path(&path).exists());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn missing_or_corrupt_file_starts_empty() {
        let path = scratch_path("corrupt");
        assert!(load_data(&path).await.bets.is_empty());

        ensure_parent_dir(&path).await.unwrap();
        std::fs::write(&path, b"{not json").unwrap();
        assert!(load_data(&path).await.users.is_empty());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
