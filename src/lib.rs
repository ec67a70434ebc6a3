pub mod app;
pub mod auth;
pub mod bets;
pub mod coolbet;
pub mod csv_io;
pub mod currency;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod report;
pub mod settings;
pub mod sport;
pub mod sportsdb;
pub mod state;
pub mod stats;
pub mod storage;

pub use app::router;
pub use settings::{load_settings, Settings};
pub use state::AppState;
pub use storage::{ensure_parent_dir, load_data};
