// Simulation Server API Client
// Posts detonation parameters to the remote blast/fallout calculation service

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback server address when SIM_SERVER_URL is not set
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

// =============================================================================
// ERRORS
// =============================================================================

/// Failures observable on the client side of a calculation request.
///
/// `Network`, `Status` and `InvalidResponse` all collapse to a single
/// user-visible failure at the command boundary; `DataInvariant` never
/// reaches the user and causes the consumer to fail closed instead.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server returned status: {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to parse response: {0}")]
    InvalidResponse(String),
    #[error("inconsistent simulation data: {0}")]
    DataInvariant(String),
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Request body shared by both calculation endpoints.
///
/// Field names match the server contract; `yield` is a Rust keyword and is
/// renamed on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct CalculationRequest {
    #[serde(rename = "yield")]
    pub yield_kt: f64,
    pub distance: f64,
    pub burst_height: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub atmosphere: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Raw numeric output of `POST /calculate-blast`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlastEffectsResult {
    pub overpressure_kpa: f64,
    pub dynamic_pressure_kpa: f64,
    pub arrival_time_sec: f64,
    pub positive_phase_duration_sec: f64,
    pub thermal_cal_per_cm2: f64,
    pub ignition_probability: f64,
    pub prompt_radiation_sv: f64,
    pub residual_radiation_sv_per_h: f64,
}

/// Raw output of `POST /calculate-fallout`: three parallel N x N grids over
/// a longitude/latitude mesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FalloutGridResult {
    pub longitude: Vec<Vec<f64>>,
    pub latitude: Vec<Vec<f64>>,
    pub contamination: Vec<Vec<f64>>,
}

impl FalloutGridResult {
    /// Validate the square/equal-dimension invariant and return N.
    ///
    /// A well-behaved server never violates this; on violation the caller
    /// is expected to render nothing rather than crash the display.
    pub fn grid_size(&self) -> Result<usize, SimError> {
        let n = self.longitude.len();
        if self.latitude.len() != n || self.contamination.len() != n {
            return Err(SimError::DataInvariant(format!(
                "grid row counts differ: lon={} lat={} contamination={}",
                n,
                self.latitude.len(),
                self.contamination.len()
            )));
        }
        for grid in [&self.longitude, &self.latitude, &self.contamination] {
            if let Some(row) = grid.iter().find(|row| row.len() != n) {
                return Err(SimError::DataInvariant(format!(
                    "grid is not square: expected {} columns, found {}",
                    n,
                    row.len()
                )));
            }
        }
        Ok(n)
    }
}

// =============================================================================
// API CLIENT
// =============================================================================

pub struct SimClient {
    base_url: String,
    client: reqwest::Client,
}

impl SimClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Blast effects (overpressure, thermal, radiation) at the chosen distance.
    pub async fn calculate_blast(
        &self,
        request: &CalculationRequest,
    ) -> Result<BlastEffectsResult, SimError> {
        self.post_json("/calculate-blast", request).await
    }

    /// Fallout contamination grid around ground zero.
    pub async fn calculate_fallout(
        &self,
        request: &CalculationRequest,
    ) -> Result<FalloutGridResult, SimError> {
        self.post_json("/calculate-fallout", request).await
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        request: &CalculationRequest,
    ) -> Result<T, SimError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SimError::Status(status));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SimError::InvalidResponse(e.to_string()))
    }
}
