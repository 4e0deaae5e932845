mod client;
mod history;
mod model;
mod observables;
mod simulate;
mod solver;

use client::SimulationClient;
use model::{SimulationRequest, SimulationResponse};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Local runner: solves a request in-process, or forwards it to a running
/// server with --remote (the same POST the embedded frontend makes).
struct CliArgs {
    particles: u32,
    potential: String,
    grid_points: Option<usize>,
    remote: Option<String>,
    out: Option<PathBuf>,
    show_history: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut positional = Vec::new();
    let mut remote = None;
    let mut out = None;
    let mut show_history = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--remote" => {
                remote = Some(iter.next().ok_or("--remote requires a URL")?.to_string());
            }
            "--out" => {
                out = Some(PathBuf::from(iter.next().ok_or("--out requires a path")?));
            }
            "--history" => show_history = true,
            other => positional.push(other.to_string()),
        }
    }

    if show_history {
        if remote.is_none() {
            return Err("--history requires --remote URL".to_string());
        }
        return Ok(CliArgs {
            particles: 0,
            potential: String::new(),
            grid_points: None,
            remote,
            out,
            show_history,
        });
    }

    if positional.len() < 2 {
        return Err(
            "usage: qsim <particles> <potential> [grid_points] [--remote URL] [--out FILE] | qsim --history --remote URL"
                .to_string(),
        );
    }
    let particles: u32 = positional[0]
        .parse()
        .map_err(|_| format!("invalid particle count '{}'", positional[0]))?;
    let grid_points = match positional.get(2) {
        Some(raw) => Some(
            raw.parse::<usize>()
                .map_err(|_| format!("invalid grid size '{raw}'"))?,
        ),
        None => None,
    };

    Ok(CliArgs {
        particles,
        potential: positional[1].clone(),
        grid_points,
        remote,
        out,
        show_history,
    })
}

async fn print_remote_history(base_url: &str) -> Result<(), String> {
    let client = SimulationClient::new(base_url)?;
    let runs = client.history().await?;
    if runs.is_empty() {
        println!("no runs recorded");
        return Ok(());
    }
    for run in runs {
        println!(
            "#{:<4} {:>3} particle(s)  {:<12} E = {:.6}  entropy {:.4}",
            run.seq, run.particles, run.potential, run.energy, run.entropy
        );
    }
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn print_summary(response: &SimulationResponse) {
    println!(
        "{} particles in the {} potential",
        response.particles, response.potential
    );
    println!("ground-state energy: {:.6}", response.energy);
    println!(
        "entropy: {:.4}   <x>: {:.4}   <x^2>: {:.4}",
        response.entropy, response.mean_x, response.mean_x2
    );
    for lv in &response.levels {
        println!(
            "  level {:>2}  occupancy {}  energy {:.6}",
            lv.level, lv.occupancy, lv.energy
        );
    }
    if let Some(note) = &response.note {
        println!("note: {note}");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    if cli.show_history {
        // parse_args guarantees the URL is present
        let base_url = cli.remote.as_deref().unwrap_or_default();
        return match print_remote_history(base_url).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                error!(error = %message, "history fetch failed");
                eprintln!("history fetch failed: {message}");
                ExitCode::FAILURE
            }
        };
    }

    let mut request = SimulationRequest::new(cli.particles, &cli.potential);
    request.grid_points = cli.grid_points;

    let result = match &cli.remote {
        Some(base_url) => {
            info!(%base_url, "running against remote server");
            match SimulationClient::new(base_url) {
                Ok(client) => client.simulate(&request).await,
                Err(e) => Err(e),
            }
        }
        None => simulate::run_simulation(&request),
    };

    let response = match result {
        Ok(response) => response,
        Err(message) => {
            error!(error = %message, "simulation failed");
            eprintln!("simulation failed: {message}");
            return ExitCode::FAILURE;
        }
    };

    print_summary(&response);

    if let Some(path) = &cli.out {
        if let Err(message) = history::export_results(path, &response) {
            error!(error = %message, "export failed");
            eprintln!("export failed: {message}");
            return ExitCode::FAILURE;
        }
        info!(path = %path.display(), "results written");
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_basic_args() {
        let cli = parse_args(&strs(&["3", "harmonic"])).unwrap();
        assert_eq!(cli.particles, 3);
        assert_eq!(cli.potential, "harmonic");
        assert!(cli.grid_points.is_none());
        assert!(cli.remote.is_none());
    }

    #[test]
    fn test_parse_flags() {
        let cli = parse_args(&strs(&[
            "2",
            "square_well",
            "256",
            "--remote",
            "http://localhost:8000",
            "--out",
            "run.json",
        ]))
        .unwrap();
        assert_eq!(cli.grid_points, Some(256));
        assert_eq!(cli.remote.as_deref(), Some("http://localhost:8000"));
        assert_eq!(cli.out, Some(PathBuf::from("run.json")));
    }

    #[test]
    fn test_parse_history_mode() {
        let cli = parse_args(&strs(&["--history", "--remote", "http://localhost:8000"])).unwrap();
        assert!(cli.show_history);
        // History mode is remote-only
        assert!(parse_args(&strs(&["--history"])).is_err());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_args(&strs(&["3"])).is_err());
        assert!(parse_args(&strs(&["many", "harmonic"])).is_err());
        assert!(parse_args(&strs(&["3", "harmonic", "--remote"])).is_err());
    }
}
