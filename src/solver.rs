/// Exact eigenstates for the two textbook potentials the service offers,
/// plus non-interacting many-body filling on top of them.
/// Natural units throughout: hbar = m = omega = 1, well width L = 1.

use std::f64::consts::PI;

/// Largest particle count the solver accepts. Level 63 is the highest
/// orbital the normalized Hermite recurrence is exercised at.
pub const MAX_PARTICLES: u32 = 64;

pub const DEFAULT_GRID_POINTS: usize = 100;
pub const DEFAULT_EXTENT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Potential {
    Harmonic,
    SquareWell,
}

impl Potential {
    /// Parse the wire string. Unknown potentials are a request error,
    /// never silently defaulted.
    pub fn from_request(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "harmonic" => Some(Potential::Harmonic),
            "square_well" => Some(Potential::SquareWell),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Potential::Harmonic => "harmonic",
            Potential::SquareWell => "square_well",
        }
    }
}

/// Validated solver inputs.
/// particles: number of spin-1/2 fermions (1 ..= MAX_PARTICLES)
/// grid_points: samples in the density profile
/// extent: half-width of the harmonic grid (the well always spans [0, 1])
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub particles: u32,
    pub potential: Potential,
    pub grid_points: usize,
    pub extent: f64,
}

impl SimulationParams {
    pub fn new(particles: u32, potential: Potential) -> Option<Self> {
        if particles == 0 {
            return None;
        }
        Some(SimulationParams {
            particles: particles.min(MAX_PARTICLES),
            potential,
            grid_points: DEFAULT_GRID_POINTS,
            extent: DEFAULT_EXTENT,
        })
    }

    pub fn with_grid(mut self, grid_points: usize, extent: f64) -> Self {
        self.grid_points = grid_points.clamp(16, 4096);
        self.extent = extent.clamp(1.0, 50.0);
        self
    }

    /// True when `new` or `with_grid` had to pull an input back into range.
    pub fn clamped(particles: u32, grid_points: Option<usize>, extent: Option<f64>) -> bool {
        particles > MAX_PARTICLES
            || grid_points.is_some_and(|g| !(16..=4096).contains(&g))
            || extent.is_some_and(|e| !(1.0..=50.0).contains(&e))
    }
}

/// Energy of harmonic level n (n = 0, 1, 2, ...): E_n = n + 1/2
pub fn harmonic_energy(n: u32) -> f64 {
    n as f64 + 0.5
}

/// Energy of square-well mode n (n = 1, 2, 3, ...): E_n = n^2 pi^2 / 2
pub fn square_well_energy(n: u32) -> f64 {
    let n_f = n as f64;
    0.5 * n_f * n_f * PI * PI
}

/// Normalized harmonic-oscillator eigenfunction psi_n(x).
///
/// Uses the normalized three-term recurrence
///   psi_n = x sqrt(2/n) psi_{n-1} - sqrt((n-1)/n) psi_{n-2}
/// which folds the 2^n n! normalization into the iteration, so it stays
/// finite for every level the solver reaches.
pub fn harmonic_wavefunction(x: f64, n: u32) -> f64 {
    // psi_0 = pi^(-1/4) exp(-x^2/2)
    let psi0 = (-0.5 * x * x).exp() / PI.powf(0.25);
    if n == 0 {
        return psi0;
    }
    let psi1 = x * 2.0_f64.sqrt() * psi0;
    if n == 1 {
        return psi1;
    }

    let mut prev = psi0;
    let mut curr = psi1;
    for k in 2..=n {
        let k_f = k as f64;
        let next = x * (2.0 / k_f).sqrt() * curr - ((k_f - 1.0) / k_f).sqrt() * prev;
        prev = curr;
        curr = next;
    }
    curr
}

/// Normalized infinite-square-well eigenfunction on [0, 1]:
/// psi_n(x) = sqrt(2) sin(n pi x), zero outside the well.
pub fn square_well_wavefunction(x: f64, n: u32) -> f64 {
    if !(0.0..=1.0).contains(&x) {
        return 0.0;
    }
    2.0_f64.sqrt() * (n as f64 * PI * x).sin()
}

/// Single-particle energy of the level with index `level` (0-based).
pub fn level_energy(potential: Potential, level: u32) -> f64 {
    match potential {
        Potential::Harmonic => harmonic_energy(level),
        // Well modes count from 1
        Potential::SquareWell => square_well_energy(level + 1),
    }
}

fn level_wavefunction(potential: Potential, level: u32, x: f64) -> f64 {
    match potential {
        Potential::Harmonic => harmonic_wavefunction(x, level),
        Potential::SquareWell => square_well_wavefunction(x, level + 1),
    }
}

/// One occupied single-particle level of the many-body ground state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OccupiedLevel {
    pub level: u32,
    pub occupancy: u32,
    pub energy: f64,
}

/// Fill levels bottom-up with spin-1/2 fermions, two per spatial level.
pub fn level_occupancies(particles: u32, potential: Potential) -> Vec<OccupiedLevel> {
    let mut levels = Vec::new();
    let mut remaining = particles;
    let mut level = 0u32;
    while remaining > 0 {
        let occupancy = remaining.min(2);
        levels.push(OccupiedLevel {
            level,
            occupancy,
            energy: level_energy(potential, level),
        });
        remaining -= occupancy;
        level += 1;
    }
    levels
}

/// Total ground-state energy: sum of occupancy-weighted level energies.
pub fn ground_state_energy(params: SimulationParams) -> f64 {
    level_occupancies(params.particles, params.potential)
        .iter()
        .map(|lv| lv.occupancy as f64 * lv.energy)
        .sum()
}

/// Uniform grid the density is sampled on. The harmonic grid is symmetric
/// about the origin; the well grid spans the box.
pub fn build_grid(params: SimulationParams) -> Vec<f64> {
    let (lo, hi) = match params.potential {
        Potential::Harmonic => (-params.extent, params.extent),
        Potential::SquareWell => (0.0, 1.0),
    };
    let count = params.grid_points.max(2);
    let denom = (count - 1) as f64;
    (0..count)
        .map(|i| lo + (hi - lo) * (i as f64) / denom)
        .collect()
}

/// Total position density n(x) = sum_levels occupancy * |psi_level(x)|^2,
/// evaluated on `build_grid`. Integrates to the particle count.
pub fn density_profile(params: SimulationParams) -> (Vec<f64>, Vec<f64>) {
    let grid = build_grid(params);
    let levels = level_occupancies(params.particles, params.potential);
    let density = grid
        .iter()
        .map(|&x| {
            levels
                .iter()
                .map(|lv| {
                    let psi = level_wavefunction(params.potential, lv.level, x);
                    lv.occupancy as f64 * psi * psi
                })
                .sum()
        })
        .collect();
    (grid, density)
}

/// Draw `count` positions from the density by rejection sampling against a
/// uniform proposal over the grid span.
pub fn sample_positions(grid: &[f64], density: &[f64], count: usize) -> Vec<f64> {
    use rand::Rng;

    if grid.len() < 2 || grid.len() != density.len() {
        return Vec::new();
    }
    let max_density = density.iter().cloned().fold(0.0_f64, f64::max);
    if max_density <= 0.0 {
        return Vec::new();
    }

    let lo = grid[0];
    let hi = grid[grid.len() - 1];
    if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return Vec::new();
    }
    let mut rng = rand::thread_rng();
    let mut samples = Vec::with_capacity(count);

    let mut attempts = 0usize;
    let max_attempts = count.saturating_mul(100).max(1000);
    while samples.len() < count && attempts < max_attempts {
        attempts += 1;
        let x = lo + rng.gen::<f64>() * (hi - lo);
        let p = interp_density(x, grid, density);
        if rng.gen::<f64>() < p / max_density {
            samples.push(x);
        }
    }
    samples
}

/// Linear interpolation of the density between grid points.
fn interp_density(x: f64, grid: &[f64], density: &[f64]) -> f64 {
    if x <= grid[0] {
        return density[0];
    }
    let last = grid.len() - 1;
    if x >= grid[last] {
        return density[last];
    }
    let idx = match grid.binary_search_by(|v| v.total_cmp(&x)) {
        Ok(i) => return density[i],
        Err(i) => i.min(last),
    };
    if idx == 0 {
        return density[0];
    }
    let (x0, x1) = (grid[idx - 1], grid[idx]);
    let (d0, d1) = (density[idx - 1], density[idx]);
    let t = if x1 > x0 { (x - x0) / (x1 - x0) } else { 0.0 };
    d0 + (d1 - d0) * t
}

/// Trapezoid integral over a uniform grid.
pub fn trapezoid(grid: &[f64], values: &[f64]) -> f64 {
    if grid.len() < 2 || grid.len() != values.len() {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 1..grid.len() {
        total += 0.5 * (values[i] + values[i - 1]) * (grid[i] - grid[i - 1]);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm_squared(grid: &[f64], psi: &[f64]) -> f64 {
        let sq: Vec<f64> = psi.iter().map(|v| v * v).collect();
        trapezoid(grid, &sq)
    }

    #[test]
    fn test_potential_parsing() {
        assert_eq!(Potential::from_request("harmonic"), Some(Potential::Harmonic));
        assert_eq!(Potential::from_request("Harmonic"), Some(Potential::Harmonic));
        assert_eq!(
            Potential::from_request("square_well"),
            Some(Potential::SquareWell)
        );
        assert_eq!(Potential::from_request("coulomb"), None);
        assert_eq!(Potential::from_request(""), None);
    }

    #[test]
    fn test_params_validation() {
        assert!(SimulationParams::new(0, Potential::Harmonic).is_none());
        let p = SimulationParams::new(1, Potential::Harmonic).unwrap();
        assert_eq!(p.particles, 1);
        assert_eq!(p.grid_points, DEFAULT_GRID_POINTS);

        // Oversized inputs clamp instead of failing
        let p = SimulationParams::new(1000, Potential::SquareWell).unwrap();
        assert_eq!(p.particles, MAX_PARTICLES);
        let p = p.with_grid(1_000_000, 500.0);
        assert_eq!(p.grid_points, 4096);
        assert_eq!(p.extent, 50.0);
        assert!(SimulationParams::clamped(1000, None, None));
        assert!(!SimulationParams::clamped(3, Some(200), Some(6.0)));
    }

    #[test]
    fn test_energy_levels() {
        assert_eq!(harmonic_energy(0), 0.5);
        assert_eq!(harmonic_energy(1), 1.5);
        assert!((square_well_energy(1) - PI * PI / 2.0).abs() < 1e-12);
        assert!((square_well_energy(2) - 2.0 * PI * PI).abs() < 1e-12);

        // Strictly increasing in the level index for both potentials
        for pot in [Potential::Harmonic, Potential::SquareWell] {
            for level in 0..10 {
                assert!(level_energy(pot, level + 1) > level_energy(pot, level));
            }
        }
    }

    #[test]
    fn test_harmonic_wavefunction_normalized() {
        let params = SimulationParams {
            particles: 1,
            potential: Potential::Harmonic,
            grid_points: 2001,
            extent: 12.0,
        };
        let grid = build_grid(params);
        for n in [0, 1, 5, 20] {
            let psi: Vec<f64> = grid.iter().map(|&x| harmonic_wavefunction(x, n)).collect();
            let norm = norm_squared(&grid, &psi);
            assert!((norm - 1.0).abs() < 1e-3, "level {n} norm {norm}");
        }
    }

    #[test]
    fn test_harmonic_wavefunction_parity() {
        // psi_n(-x) = (-1)^n psi_n(x)
        for n in 0..6 {
            let sign = if n % 2 == 0 { 1.0 } else { -1.0 };
            for &x in &[0.3, 1.1, 2.7] {
                let lhs = harmonic_wavefunction(-x, n);
                let rhs = sign * harmonic_wavefunction(x, n);
                assert!((lhs - rhs).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_square_well_wavefunction() {
        // Vanishes at the walls and outside
        for n in 1..5 {
            assert!(square_well_wavefunction(0.0, n).abs() < 1e-12);
            assert!(square_well_wavefunction(1.0, n).abs() < 1e-9);
            assert_eq!(square_well_wavefunction(-0.1, n), 0.0);
            assert_eq!(square_well_wavefunction(1.1, n), 0.0);
        }
        // Ground mode peaks at the center with sqrt(2)
        assert!((square_well_wavefunction(0.5, 1) - 2.0_f64.sqrt()).abs() < 1e-12);

        let params = SimulationParams {
            particles: 1,
            potential: Potential::SquareWell,
            grid_points: 2001,
            extent: DEFAULT_EXTENT,
        };
        let grid = build_grid(params);
        for n in 1..6 {
            let psi: Vec<f64> = grid
                .iter()
                .map(|&x| square_well_wavefunction(x, n))
                .collect();
            let norm = norm_squared(&grid, &psi);
            assert!((norm - 1.0).abs() < 1e-3, "mode {n} norm {norm}");
        }
    }

    #[test]
    fn test_level_filling() {
        // 5 fermions: 2 + 2 + 1
        let levels = level_occupancies(5, Potential::Harmonic);
        let occ: Vec<u32> = levels.iter().map(|lv| lv.occupancy).collect();
        assert_eq!(occ, vec![2, 2, 1]);
        let total: u32 = occ.iter().sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_ground_state_energy() {
        let p = |n| SimulationParams::new(n, Potential::Harmonic).unwrap();
        assert!((ground_state_energy(p(1)) - 0.5).abs() < 1e-12);
        // Two particles pair in the lowest level
        assert!((ground_state_energy(p(2)) - 1.0).abs() < 1e-12);
        // Third particle opens level 1: 0.5 + 0.5 + 1.5
        assert!((ground_state_energy(p(3)) - 2.5).abs() < 1e-12);

        let w = SimulationParams::new(1, Potential::SquareWell).unwrap();
        assert!((ground_state_energy(w) - PI * PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_density_integrates_to_particle_count() {
        for potential in [Potential::Harmonic, Potential::SquareWell] {
            for particles in [1, 2, 7] {
                let params = SimulationParams::new(particles, potential)
                    .unwrap()
                    .with_grid(2001, 12.0);
                let (grid, density) = density_profile(params);
                let total = trapezoid(&grid, &density);
                assert!(
                    (total - particles as f64).abs() < 1e-2,
                    "{particles} particles in {} integrate to {total}",
                    potential.as_str()
                );
                assert!(density.iter().all(|&d| d >= 0.0));
            }
        }
    }

    #[test]
    fn test_sample_positions_stay_in_range() {
        let params = SimulationParams::new(2, Potential::SquareWell).unwrap();
        let (grid, density) = density_profile(params);
        let samples = sample_positions(&grid, &density, 500);
        assert!(!samples.is_empty());
        assert!(samples.iter().all(|&x| (0.0..=1.0).contains(&x)));
    }

    #[test]
    fn test_sample_positions_degenerate_input() {
        assert!(sample_positions(&[], &[], 10).is_empty());
        assert!(sample_positions(&[0.0, 1.0], &[0.0, 0.0], 10).is_empty());
    }

    #[test]
    fn test_sample_positions_tolerates_nan_grid() {
        // A NaN grid point must not panic the interpolation; rejection
        // simply never accepts and the sampler gives up
        let samples = sample_positions(&[f64::NAN, 1.0], &[1.0, 1.0], 10);
        assert!(samples.iter().all(|x| x.is_finite()));
        let samples = sample_positions(&[0.0, f64::NAN, 1.0], &[1.0, 1.0, 1.0], 10);
        assert!(samples.iter().all(|x| x.is_finite()));
    }
}
