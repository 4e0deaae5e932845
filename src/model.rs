/// Wire types for the /simulate endpoint.
///
/// `SimulationRequest.particles` / `potential` and
/// `SimulationResponse.energy` / `wavefunction` are the minimal contract;
/// every other field is additive, so clients that only read those keep
/// working.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub particles: u32,
    pub potential: String,
    #[serde(default)]
    pub grid_points: Option<usize>,
    #[serde(default)]
    pub extent: Option<f64>,
    /// When set, the response carries this many Monte Carlo positions
    /// drawn from the density.
    #[serde(default)]
    pub samples: Option<usize>,
}

impl SimulationRequest {
    pub fn new(particles: u32, potential: &str) -> Self {
        SimulationRequest {
            particles,
            potential: potential.to_string(),
            grid_points: None,
            extent: None,
            samples: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelInfo {
    pub level: u32,
    pub occupancy: u32,
    pub energy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub energy: f64,
    /// Total position density sampled on `grid`.
    pub wavefunction: Vec<f64>,
    pub grid: Vec<f64>,
    pub levels: Vec<LevelInfo>,
    pub entropy: f64,
    pub mean_x: f64,
    pub mean_x2: f64,
    pub potential: String,
    pub particles: u32,
    pub positions: Option<Vec<f64>>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
