use crate::models::AppData;
use crate::settings::Settings;
use crate::sportsdb::SportsDbClient;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub settings: Arc<Settings>,
    pub sportsdb: SportsDbClient,
}

impl AppState {
    pub fn new(settings: Settings, data: AppData) -> Self {
        let sportsdb = SportsDbClient::new(
            settings.sportsdb_base_url(),
            settings.sportsdb_api_key(),
            settings.sportsdb_enabled(),
        );
        Self {
            data_path: settings.data_path(),
            data: Arc::new(Mutex::new(data)),
            settings: Arc::new(settings),
            sportsdb,
        }
    }
}

#[cfg(test)]
pub(crate) fn scratch_state(name: &str, data: AppData) -> AppState {
    let mut path = std::env::temp_dir();
    path.push(format!("bet_tracker_{}_{name}", std::process::id()));
    std::fs::create_dir_all(&path).unwrap();
    path.push("state.json");
    let settings = Settings {
        app_data_path: Some(path.to_string_lossy().into_owned()),
        sportsdb_enabled: Some(false),
        ..Settings::default()
    };
    AppState::new(settings, data)
}
