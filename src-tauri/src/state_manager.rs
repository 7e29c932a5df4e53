// State Manager - Parameter snapshots, request orchestration, display state
// Holds the last displayed simulation and provides Tauri commands for frontend

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tauri::State;

use crate::api_client::{
    BlastEffectsResult, CalculationRequest, FalloutGridResult, SimClient, SimError,
    DEFAULT_SERVER_URL,
};
use crate::effects::{
    classify_blast, classify_radiation, classify_thermal, estimate_casualties, CasualtyEstimate,
    PopulationDensityClass,
};
use crate::fallout::{sample_fallout_grid, FalloutPoint};

// =============================================================================
// PARAMETER SNAPSHOT
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GroundZero {
    pub longitude: f64,
    pub latitude: f64,
}

impl GroundZero {
    /// `41.0082°N, 28.9784°E` style label for the map panel.
    pub fn describe(&self) -> String {
        let lat_hemisphere = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let lon_hemisphere = if self.longitude >= 0.0 { 'E' } else { 'W' };
        format!(
            "{:.4}°{}, {:.4}°{}",
            self.latitude.abs(),
            lat_hemisphere,
            self.longitude.abs(),
            lon_hemisphere
        )
    }
}

/// Immutable snapshot of the user's settings, captured once per calculation
/// trigger and passed by value through the whole pipeline. Slider edits made
/// while a request is in flight cannot alter its payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub yield_kt: f64,
    pub burst_height_m: f64,
    pub wind_speed_mps: f64,
    pub wind_direction_deg: f64,
    pub atmosphere_fraction: f64,
    pub distance_m: f64,
    pub ground_zero: GroundZero,
    pub population_density: PopulationDensityClass,
}

impl SimulationParameters {
    /// `12 m/s NE` style wind summary.
    pub fn describe_wind(&self) -> String {
        format!(
            "{} m/s {}",
            self.wind_speed_mps,
            wind_compass(self.wind_direction_deg)
        )
    }
}

/// 8-point compass label for a wind direction in degrees.
pub fn wind_compass(direction_deg: f64) -> &'static str {
    const DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let index = (direction_deg.rem_euclid(360.0) / 45.0).round() as usize % 8;
    DIRECTIONS[index]
}

impl From<&SimulationParameters> for CalculationRequest {
    fn from(p: &SimulationParameters) -> Self {
        Self {
            yield_kt: p.yield_kt,
            distance: p.distance_m,
            burst_height: p.burst_height_m,
            wind_speed: p.wind_speed_mps,
            wind_direction: p.wind_direction_deg,
            atmosphere: p.atmosphere_fraction,
            latitude: p.ground_zero.latitude,
            longitude: p.ground_zero.longitude,
        }
    }
}

// =============================================================================
// SERIALIZABLE VIEW FOR FRONTEND
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct EffectDescriptions {
    pub blast: &'static str,
    pub thermal: &'static str,
    pub radiation: &'static str,
}

/// Casualty percentages for the three chart bars, each clamped to [0,100].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CasualtyBars {
    pub fatalities_pct: f64,
    pub injuries_pct: f64,
    pub affected_pct: f64,
}

/// Everything the results panel and overlay need from one simulation run.
/// Built from both responses together; a failed run never produces one.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationView {
    pub parameters: SimulationParameters,
    pub blast: BlastEffectsResult,
    pub effects: EffectDescriptions,
    pub casualties: CasualtyEstimate,
    pub casualty_bars: CasualtyBars,
    pub fallout_points: Vec<FalloutPoint>,
    pub wind: String,
    pub location: String,
    pub computed_at: DateTime<Utc>,
}

/// Interpret a matched pair of responses into a display view.
pub fn build_view(
    parameters: SimulationParameters,
    blast: BlastEffectsResult,
    fallout: &FalloutGridResult,
) -> SimulationView {
    let effects = EffectDescriptions {
        blast: classify_blast(blast.overpressure_kpa),
        thermal: classify_thermal(blast.thermal_cal_per_cm2),
        radiation: classify_radiation(blast.prompt_radiation_sv),
    };

    let casualties = estimate_casualties(
        blast.overpressure_kpa,
        blast.thermal_cal_per_cm2,
        parameters.distance_m,
        parameters.population_density,
    );
    let casualty_bars = CasualtyBars {
        fatalities_pct: casualties.fatalities_pct(),
        injuries_pct: casualties.injuries_pct(),
        affected_pct: casualties.affected_pct(),
    };

    let fallout_points = sample_fallout_grid(fallout);
    let wind = parameters.describe_wind();
    let location = parameters.ground_zero.describe();

    SimulationView {
        parameters,
        blast,
        effects,
        casualties,
        casualty_bars,
        fallout_points,
        wind,
        location,
        computed_at: Utc::now(),
    }
}

// =============================================================================
// GLOBAL STATE
// =============================================================================

pub struct AppState {
    /// Last successfully displayed simulation, if any.
    pub display: Arc<RwLock<Option<SimulationView>>>,
    /// Request generation counter; only the latest token may publish.
    pub generation: Arc<RwLock<u64>>,
    pub server_url: String,
}

impl AppState {
    pub fn new() -> Self {
        let server_url =
            std::env::var("SIM_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        Self {
            display: Arc::new(RwLock::new(None)),
            generation: Arc::new(RwLock::new(0)),
            server_url,
        }
    }

    /// Register a new calculation trigger, invalidating any in-flight one.
    pub fn begin_request(&self) -> u64 {
        let mut generation = self.generation.write();
        *generation += 1;
        *generation
    }

    /// Publish a finished view unless a newer trigger superseded its token.
    /// Stale results are discarded so the display never rolls back to an
    /// older parameter snapshot on late arrival.
    pub fn publish_if_current(&self, token: u64, view: SimulationView) -> Option<SimulationView> {
        let mut display = self.display.write();
        if *self.generation.read() != token {
            log::info!("discarding superseded simulation result (token {token})");
            return None;
        }
        *display = Some(view.clone());
        Some(view)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TAURI COMMANDS
// =============================================================================

/// Run one full simulation for the given parameter snapshot.
///
/// Both remote calculations are issued concurrently with the identical
/// payload. The display updates only if both succeed (both-or-neither:
/// a partial update could pair effect numbers with an overlay from a
/// different snapshot). Returns `Ok(None)` when a newer trigger superseded
/// this one while it was in flight; the caller simply drops that result.
#[tauri::command]
pub async fn run_simulation(
    state: State<'_, AppState>,
    parameters: SimulationParameters,
) -> Result<Option<SimulationView>, String> {
    let token = state.begin_request();

    let client = SimClient::new(state.server_url.clone());
    let request = CalculationRequest::from(&parameters);

    let (blast, fallout) = tokio::join!(
        client.calculate_blast(&request),
        client.calculate_fallout(&request),
    );
    let (blast, fallout) = merge_responses(blast, fallout)?;

    let view = build_view(parameters, blast, &fallout);
    Ok(state.publish_if_current(token, view))
}

/// Collapse the two independent responses into one outcome.
///
/// Either failure aborts the combined update with the single user-visible
/// failure class, so the display never pairs blast numbers with a fallout
/// overlay from a different run.
fn merge_responses(
    blast: Result<BlastEffectsResult, SimError>,
    fallout: Result<FalloutGridResult, SimError>,
) -> Result<(BlastEffectsResult, FalloutGridResult), String> {
    match (blast, fallout) {
        (Ok(blast), Ok(fallout)) => Ok((blast, fallout)),
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("simulation request failed: {e}");
            Err("Simulation failed".to_string())
        }
    }
}

#[tauri::command]
pub fn get_display_state(state: State<AppState>) -> Option<SimulationView> {
    state.display.read().clone()
}

#[tauri::command]
pub fn clear_results(state: State<AppState>) {
    // Also bumps the generation so an in-flight request cannot repopulate
    // the display after the user cleared it.
    state.begin_request();
    *state.display.write() = None;
}

/// Coordinate label for the map click handler.
#[tauri::command]
pub fn describe_location(longitude: f64, latitude: f64) -> String {
    GroundZero {
        longitude,
        latitude,
    }
    .describe()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_parameters() -> SimulationParameters {
        SimulationParameters {
            yield_kt: 100.0,
            burst_height_m: 500.0,
            wind_speed_mps: 5.0,
            wind_direction_deg: 90.0,
            atmosphere_fraction: 0.5,
            distance_m: 1000.0,
            ground_zero: GroundZero {
                longitude: 28.9784,
                latitude: 41.0082,
            },
            population_density: PopulationDensityClass::Urban,
        }
    }

    fn test_blast() -> BlastEffectsResult {
        BlastEffectsResult {
            overpressure_kpa: 250.0,
            dynamic_pressure_kpa: 80.0,
            arrival_time_sec: 1.8,
            positive_phase_duration_sec: 0.7,
            thermal_cal_per_cm2: 30.0,
            ignition_probability: 0.9,
            prompt_radiation_sv: 7.0,
            residual_radiation_sv_per_h: 0.02,
        }
    }

    fn test_fallout(n: usize, contamination: f64) -> FalloutGridResult {
        FalloutGridResult {
            longitude: vec![vec![29.0; n]; n],
            latitude: vec![vec![41.0; n]; n],
            contamination: vec![vec![contamination; n]; n],
        }
    }

    #[test]
    fn view_combines_both_results() {
        let view = build_view(test_parameters(), test_blast(), &test_fallout(4, 5.0));

        assert_eq!(view.effects.blast, "Reinforced concrete buildings destroyed");
        assert_eq!(view.effects.thermal, "Second-degree burns, clothing ignites");
        assert_eq!(view.effects.radiation, "50% fatal within 30 days (LD50)");
        assert_eq!(view.casualties.population, 31_415);
        assert_eq!(view.fallout_points.len(), 16);
        assert_eq!(view.wind, "5 m/s E");
        assert_eq!(view.location, "41.0082°N, 28.9784°E");
    }

    #[test]
    fn casualty_bars_are_clamped_percentages() {
        let mut blast = test_blast();
        blast.overpressure_kpa = 1e6;
        blast.thermal_cal_per_cm2 = 1e6;
        let view = build_view(test_parameters(), blast, &test_fallout(2, 0.0));

        assert!(view.casualty_bars.fatalities_pct <= 100.0);
        assert!(view.casualty_bars.injuries_pct <= 100.0);
        assert_eq!(view.casualty_bars.affected_pct, 100.0);
    }

    #[test]
    fn ground_zero_describes_all_hemispheres() {
        let sw = GroundZero {
            longitude: -58.3816,
            latitude: -34.6037,
        };
        assert_eq!(sw.describe(), "34.6037°S, 58.3816°W");
        let ne = GroundZero {
            longitude: 139.6917,
            latitude: 35.6895,
        };
        assert_eq!(ne.describe(), "35.6895°N, 139.6917°E");
    }

    #[test]
    fn wind_compass_covers_all_octants() {
        assert_eq!(wind_compass(0.0), "N");
        assert_eq!(wind_compass(45.0), "NE");
        assert_eq!(wind_compass(90.0), "E");
        assert_eq!(wind_compass(180.0), "S");
        assert_eq!(wind_compass(270.0), "W");
        assert_eq!(wind_compass(315.0), "NW");
        // Rounds back around to north near the top of the circle.
        assert_eq!(wind_compass(350.0), "N");
    }

    #[test]
    fn stale_token_does_not_publish() {
        let state = AppState::new();
        let first = state.begin_request();
        let second = state.begin_request();

        let view = build_view(test_parameters(), test_blast(), &test_fallout(2, 5.0));
        assert!(
            state.publish_if_current(first, view.clone()).is_none(),
            "superseded token must not publish"
        );
        assert!(state.display.read().is_none(), "display stays untouched");

        assert!(state.publish_if_current(second, view).is_some());
        assert!(state.display.read().is_some());
    }

    #[test]
    fn clearing_invalidates_in_flight_requests() {
        let state = AppState::new();
        let token = state.begin_request();

        // User clears before the response lands.
        state.begin_request();
        *state.display.write() = None;

        let view = build_view(test_parameters(), test_blast(), &test_fallout(2, 5.0));
        assert!(state.publish_if_current(token, view).is_none());
        assert!(state.display.read().is_none());
    }

    #[test]
    fn either_call_failing_yields_single_failure() {
        let blast_failed = merge_responses(
            Err(SimError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)),
            Ok(test_fallout(2, 1.0)),
        );
        assert_eq!(blast_failed.unwrap_err(), "Simulation failed");

        let fallout_failed = merge_responses(
            Ok(test_blast()),
            Err(SimError::InvalidResponse("unexpected end of input".to_string())),
        );
        assert_eq!(fallout_failed.unwrap_err(), "Simulation failed");
    }

    #[test]
    fn failed_fallout_call_leaves_blast_display_untouched() {
        let state = AppState::new();
        let token = state.begin_request();
        let previous = build_view(test_parameters(), test_blast(), &test_fallout(2, 5.0));
        state.publish_if_current(token, previous).unwrap();

        // Next run: blast succeeds but fallout comes back malformed. The
        // merge fails before any view is built, so nothing is published
        // and the earlier result stays on display.
        let _token = state.begin_request();
        let merged = merge_responses(
            Ok(test_blast()),
            Err(SimError::InvalidResponse("truncated body".to_string())),
        );
        assert!(merged.is_err());

        let display = state.display.read();
        let view = display.as_ref().expect("previous result survives the failed run");
        assert_eq!(view.blast.overpressure_kpa, 250.0);
        assert_eq!(view.fallout_points.len(), 4);
    }

    #[test]
    fn request_payload_matches_snapshot() {
        let parameters = test_parameters();
        let request = CalculationRequest::from(&parameters);
        assert_eq!(request.yield_kt, 100.0);
        assert_eq!(request.distance, 1000.0);
        assert_eq!(request.latitude, 41.0082);
        assert_eq!(request.longitude, 28.9784);
    }
}
