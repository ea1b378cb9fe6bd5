pub mod answer;
pub mod commands;
pub mod config;
pub mod delivery;
pub mod llm;
pub mod state;

pub use config::Settings;
pub use state::AppState;
