/// Turns a wire request into a wire response: validation, solving,
/// observables, history, and a cache over the deterministic part.

use crate::history;
use crate::model::{LevelInfo, SimulationRequest, SimulationResponse};
use crate::observables::{position_moments, shannon_entropy};
use crate::solver::{
    density_profile, ground_state_energy, level_occupancies, sample_positions, Potential,
    SimulationParams, DEFAULT_EXTENT, DEFAULT_GRID_POINTS, MAX_PARTICLES,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, info};

/// Cache key: every input the deterministic part of the response depends on.
/// Extent is keyed in millionths to stay hashable.
type CacheKey = (u32, Potential, usize, i64);

#[derive(Clone)]
struct CachedRun {
    energy: f64,
    grid: Vec<f64>,
    density: Vec<f64>,
    levels: Vec<LevelInfo>,
    entropy: f64,
    mean_x: f64,
    mean_x2: f64,
}

static RUN_CACHE: Lazy<RwLock<HashMap<CacheKey, CachedRun>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Run one simulation request end to end.
pub fn run_simulation(req: &SimulationRequest) -> Result<SimulationResponse, String> {
    let potential = Potential::from_request(&req.potential)
        .ok_or_else(|| format!("unknown potential '{}'", req.potential))?;
    let params = SimulationParams::new(req.particles, potential)
        .ok_or_else(|| "particles must be at least 1".to_string())?
        .with_grid(
            req.grid_points.unwrap_or(DEFAULT_GRID_POINTS),
            req.extent.unwrap_or(DEFAULT_EXTENT),
        );

    let run = cached_run(params);
    debug!(
        particles = params.particles,
        potential = potential.as_str(),
        energy = run.energy,
        "simulation solved"
    );

    // Positions are Monte Carlo, so they are drawn fresh per request
    let positions = req
        .samples
        .filter(|&count| count > 0)
        .map(|count| sample_positions(&run.grid, &run.density, count.min(500_000)));

    let note = if SimulationParams::clamped(req.particles, req.grid_points, req.extent) {
        Some(format!(
            "inputs clamped: particles <= {MAX_PARTICLES}, grid_points in [16, 4096], extent in [1, 50]"
        ))
    } else {
        None
    };

    let entry = history::record(
        params.particles,
        potential.as_str(),
        run.energy,
        run.entropy,
    )?;
    info!(
        seq = entry.seq,
        particles = params.particles,
        potential = potential.as_str(),
        energy = run.energy,
        "simulation completed"
    );

    Ok(SimulationResponse {
        energy: run.energy,
        wavefunction: run.density,
        grid: run.grid,
        levels: run.levels,
        entropy: run.entropy,
        mean_x: run.mean_x,
        mean_x2: run.mean_x2,
        potential: potential.as_str().to_string(),
        particles: params.particles,
        positions,
        note,
    })
}

fn cache_key(params: SimulationParams) -> CacheKey {
    (
        params.particles,
        params.potential,
        params.grid_points,
        (params.extent * 1e6) as i64,
    )
}

fn cached_run(params: SimulationParams) -> CachedRun {
    let key = cache_key(params);
    if let Ok(cache) = RUN_CACHE.read() {
        if let Some(hit) = cache.get(&key) {
            debug!(particles = params.particles, "run cache hit");
            return hit.clone();
        }
    }

    let energy = ground_state_energy(params);
    let (grid, density) = density_profile(params);
    let entropy = shannon_entropy(&density);
    let (mean_x, mean_x2) = position_moments(&grid, &density);
    let levels = level_occupancies(params.particles, params.potential)
        .into_iter()
        .map(|lv| LevelInfo {
            level: lv.level,
            occupancy: lv.occupancy,
            energy: lv.energy,
        })
        .collect();

    let run = CachedRun {
        energy,
        grid,
        density,
        levels,
        entropy,
        mean_x,
        mean_x2,
    };
    if let Ok(mut cache) = RUN_CACHE.write() {
        cache.insert(key, run.clone());
    }
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SimulationRequest;

    #[test]
    fn test_single_particle_harmonic() {
        let req = SimulationRequest::new(1, "harmonic");
        let resp = run_simulation(&req).unwrap();
        assert!((resp.energy - 0.5).abs() < 1e-12);
        assert_eq!(resp.wavefunction.len(), resp.grid.len());
        assert_eq!(resp.wavefunction.len(), 100);
        assert_eq!(resp.levels.len(), 1);
        assert!(resp.positions.is_none());
        assert!(resp.note.is_none());
    }

    #[test]
    fn test_square_well_energy_scales() {
        let one = run_simulation(&SimulationRequest::new(1, "square_well")).unwrap();
        let three = run_simulation(&SimulationRequest::new(3, "square_well")).unwrap();
        // Adding particles opens higher modes
        assert!(three.energy > one.energy);
        assert_eq!(three.levels.len(), 2);
    }

    #[test]
    fn test_unknown_potential_rejected() {
        let err = run_simulation(&SimulationRequest::new(1, "coulomb")).unwrap_err();
        assert!(err.contains("coulomb"));
    }

    #[test]
    fn test_zero_particles_rejected() {
        assert!(run_simulation(&SimulationRequest::new(0, "harmonic")).is_err());
    }

    #[test]
    fn test_clamped_inputs_noted() {
        let resp = run_simulation(&SimulationRequest::new(10_000, "harmonic")).unwrap();
        assert_eq!(resp.particles, MAX_PARTICLES);
        assert!(resp.note.is_some());
    }

    #[test]
    fn test_requested_positions_present() {
        let mut req = SimulationRequest::new(2, "harmonic");
        req.samples = Some(200);
        let resp = run_simulation(&req).unwrap();
        let positions = resp.positions.unwrap();
        assert!(!positions.is_empty());
        assert!(positions.iter().all(|&x| x.abs() <= 5.0));
    }

    #[test]
    fn test_cache_returns_identical_results() {
        let req = SimulationRequest::new(4, "harmonic");
        let a = run_simulation(&req).unwrap();
        let b = run_simulation(&req).unwrap();
        assert_eq!(a.energy, b.energy);
        assert_eq!(a.wavefunction, b.wavefunction);
    }
}
