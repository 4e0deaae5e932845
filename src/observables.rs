/// Scalar quantities derived from a sampled density profile.

/// Shannon entropy of the normalized density, -sum p ln(p).
/// The 1e-10 floor keeps empty bins out of the logarithm.
pub fn shannon_entropy(density: &[f64]) -> f64 {
    let total: f64 = density.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    -density
        .iter()
        .map(|&d| {
            let p = d / total;
            p * (p + 1e-10).ln()
        })
        .sum::<f64>()
}

/// First and second position moments <x> and <x^2> under the normalized
/// density. Zero-density input yields (0, 0).
pub fn position_moments(grid: &[f64], density: &[f64]) -> (f64, f64) {
    if grid.len() != density.len() {
        return (0.0, 0.0);
    }
    let total: f64 = density.iter().sum();
    if total <= 0.0 {
        return (0.0, 0.0);
    }
    let mut mean = 0.0;
    let mut mean_sq = 0.0;
    for (&x, &d) in grid.iter().zip(density.iter()) {
        let p = d / total;
        mean += p * x;
        mean_sq += p * x * x;
    }
    (mean, mean_sq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{density_profile, Potential, SimulationParams};

    #[test]
    fn test_entropy_uniform_distribution() {
        // Uniform over n bins -> ln(n)
        let density = vec![1.0; 64];
        let entropy = shannon_entropy(&density);
        assert!((entropy - 64.0_f64.ln()).abs() < 1e-6);
    }

    #[test]
    fn test_entropy_concentrated_distribution() {
        // All weight in one bin -> essentially zero
        let mut density = vec![0.0; 64];
        density[10] = 3.0;
        assert!(shannon_entropy(&density).abs() < 1e-6);
    }

    #[test]
    fn test_entropy_degenerate_input() {
        assert_eq!(shannon_entropy(&[]), 0.0);
        assert_eq!(shannon_entropy(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_moments_of_symmetric_density() {
        let params = SimulationParams::new(2, Potential::Harmonic).unwrap();
        let (grid, density) = density_profile(params);
        let (mean, mean_sq) = position_moments(&grid, &density);
        // Harmonic ground state is symmetric about the origin with <x^2> = 1/2
        assert!(mean.abs() < 1e-9);
        assert!((mean_sq - 0.5).abs() < 1e-2);
    }

    #[test]
    fn test_moments_degenerate_input() {
        assert_eq!(position_moments(&[], &[]), (0.0, 0.0));
        assert_eq!(position_moments(&[1.0], &[0.0]), (0.0, 0.0));
    }
}
