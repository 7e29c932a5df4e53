// Ground Zero - Nuclear Detonation Effects Mapper
// Main entry point for Tauri application

mod api_client;
mod effects;
mod fallout;
mod state_manager;

use state_manager::{clear_results, describe_location, get_display_state, run_simulation, AppState};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // SIM_SERVER_URL may come from a local .env during development
    dotenv::dotenv().ok();
    env_logger::init();

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .manage(AppState::new())
        .invoke_handler(tauri::generate_handler![
            run_simulation,
            get_display_state,
            clear_results,
            describe_location,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
