use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use tracing::{error, info, warn};

#[path = "../solver.rs"]
mod solver;
#[path = "../observables.rs"]
mod observables;
#[path = "../model.rs"]
mod model;
#[path = "../history.rs"]
mod history;
#[path = "../simulate.rs"]
mod simulate;

use model::{ErrorResponse, SimulationRequest};

const DEFAULT_PORT: u16 = 8000;

const INDEX_HTML: &str = r##"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Quantum Simulation</title>
    <style>
      html, body { margin: 0; padding: 0; min-height: 100%; background: #0b0c10; color: #e6e6e6; font-family: "Segoe UI", sans-serif; }
      #panel { max-width: 640px; margin: 40px auto; background: rgba(10,12,16,0.9); padding: 18px; border: 1px solid #2a2f36; border-radius: 10px; }
      .brand { font-size: 18px; font-weight: 600; letter-spacing: 0.02em; }
      .section { margin-top: 14px; padding-top: 10px; border-top: 1px solid #1f2630; }
      .section-title { font-size: 11px; text-transform: uppercase; letter-spacing: 0.12em; color: #9aa3ad; margin-bottom: 6px; }
      .row { display: flex; align-items: center; gap: 8px; margin-top: 6px; flex-wrap: wrap; }
      .row label { font-size: 12px; color: #a7b0ba; min-width: 120px; }
      input, select { background: #0f141b; color: #e6e6e6; border: 1px solid #2a2f36; border-radius: 6px; padding: 5px 7px; font-size: 13px; }
      input[type="number"] { width: 80px; }
      button { background: #1a2736; color: #e6e6e6; border: 1px solid #3c6a9e; border-radius: 6px; padding: 7px 14px; font-size: 13px; cursor: pointer; }
      button:disabled { opacity: 0.6; cursor: default; }
      #status { margin-top: 10px; font-size: 12px; color: #b2bac4; min-height: 16px; }
      #results { display: none; }
      #energy { font-size: 15px; color: #cbe3ff; }
      #observables { font-size: 12px; color: #9aa3ad; margin-top: 4px; }
      #wavefunction { font-size: 11px; color: #8d97a2; margin-top: 8px; max-height: 120px; overflow: auto; word-break: break-all; }
      #plot { margin-top: 10px; width: 100%; height: 160px; background: #0f141b; border: 1px solid #1f2630; border-radius: 6px; }
      #historyList { font-size: 12px; color: #9aa3ad; margin: 6px 0 0; padding-left: 18px; }
      a { color: #6fa8dc; font-size: 12px; }
    </style>
  </head>
  <body>
    <div id="panel">
      <div class="brand">Quantum Simulation</div>
      <div class="section">
        <div class="section-title">Inputs</div>
        <div class="row">
          <label for="particles">Number of Particles</label>
          <input id="particles" type="number" min="1" value="1" />
        </div>
        <div class="row">
          <label for="potential">Potential Type</label>
          <select id="potential">
            <option value="harmonic" selected>Harmonic</option>
            <option value="square_well">Square Well</option>
          </select>
        </div>
        <div class="row">
          <button id="run">Run Simulation</button>
          <a href="/info">Info</a>
        </div>
        <div id="status">Ready.</div>
      </div>
      <div id="results" class="section">
        <div class="section-title">Simulation Results</div>
        <div id="energy"></div>
        <div id="observables"></div>
        <canvas id="plot" width="600" height="160"></canvas>
        <div id="wavefunction"></div>
      </div>
      <div class="section">
        <div class="section-title">Recent Runs</div>
        <ul id="historyList"></ul>
      </div>
    </div>
    <script>
      const runButton = document.getElementById("run");
      const statusEl = document.getElementById("status");
      const resultsEl = document.getElementById("results");
      const energyEl = document.getElementById("energy");
      const observablesEl = document.getElementById("observables");
      const wavefunctionEl = document.getElementById("wavefunction");
      const historyEl = document.getElementById("historyList");
      const plot = document.getElementById("plot");

      function drawDensity(grid, density) {
        const ctx = plot.getContext("2d");
        const w = plot.width;
        const h = plot.height;
        ctx.clearRect(0, 0, w, h);
        const max = Math.max(...density, 1e-12);
        ctx.beginPath();
        for (let i = 0; i < density.length; i++) {
          const x = (i / (density.length - 1)) * (w - 8) + 4;
          const y = h - 6 - (density[i] / max) * (h - 16);
          if (i === 0) ctx.moveTo(x, y); else ctx.lineTo(x, y);
        }
        ctx.strokeStyle = "#6fa8dc";
        ctx.lineWidth = 1.5;
        ctx.stroke();
      }

      async function refreshHistory() {
        try {
          const response = await fetch("/history");
          if (!response.ok) return;
          const runs = await response.json();
          historyEl.innerHTML = "";
          for (const run of runs.slice(0, 8)) {
            const item = document.createElement("li");
            item.textContent = `#${run.seq}  ${run.particles} particle(s), ${run.potential}: E = ${run.energy.toFixed(4)}`;
            historyEl.appendChild(item);
          }
        } catch (err) {
          console.error("Error loading history:", err);
        }
      }

      async function runSimulation() {
        const particles = Number(document.getElementById("particles").value);
        const potential = document.getElementById("potential").value;
        runButton.disabled = true;
        statusEl.textContent = "Running...";
        try {
          const response = await fetch("/simulate", {
            method: "POST",
            headers: { "Content-Type": "application/json" },
            body: JSON.stringify({ particles, potential }),
          });
          if (!response.ok) {
            const body = await response.json().catch(() => null);
            throw new Error(body && body.error ? body.error : `server returned ${response.status}`);
          }
          const data = await response.json();
          energyEl.textContent = `Energy: ${data.energy}`;
          observablesEl.textContent =
            `entropy ${data.entropy.toFixed(4)}  ⟨x⟩ ${data.mean_x.toFixed(4)}  ⟨x²⟩ ${data.mean_x2.toFixed(4)}`;
          wavefunctionEl.textContent = `Wavefunction: ${data.wavefunction.join(", ")}`;
          drawDensity(data.grid, data.wavefunction);
          resultsEl.style.display = "block";
          statusEl.textContent = data.note ? `Done. ${data.note}` : "Done.";
          refreshHistory();
        } catch (err) {
          // Previous results stay on screen; only the status line changes
          console.error("Error running simulation:", err);
          statusEl.textContent = err.toString();
        } finally {
          runButton.disabled = false;
        }
      }

      runButton.addEventListener("click", () => {
        runSimulation();
      });
      refreshHistory();
    </script>
  </body>
</html>
"##;

const INFO_HTML: &str = r##"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>Quantum Simulation - Info</title>
    <style>
      body { background: #0b0c10; color: #e6e6e6; font-family: "Segoe UI", sans-serif; max-width: 640px; margin: 40px auto; padding: 0 16px; }
      h1 { font-size: 20px; }
      code { background: #0f141b; border: 1px solid #2a2f36; border-radius: 4px; padding: 1px 5px; }
      a { color: #6fa8dc; }
    </style>
  </head>
  <body>
    <h1>Quantum Simulation</h1>
    <p>
      Solves the ground state of non-interacting spin-&#189; fermions in a
      one-dimensional potential, in natural units (&#8463; = m = &#969; = 1,
      well width 1). Two per spatial level, filled bottom-up.
    </p>
    <p>
      <code>POST /simulate</code> with
      <code>{ "particles": 1, "potential": "harmonic" }</code>
      (or <code>"square_well"</code>) returns the total energy and the position
      density sampled on a uniform grid, plus per-level occupancies, the
      density entropy, and position moments. Optional fields:
      <code>grid_points</code>, <code>extent</code>, <code>samples</code>.
    </p>
    <p><code>GET /history</code> lists recent runs. <a href="/">Back</a></p>
  </body>
</html>
"##;

async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn info() -> impl IntoResponse {
    Html(INFO_HTML)
}

async fn simulate_handler(Json(request): Json<SimulationRequest>) -> impl IntoResponse {
    info!(
        particles = request.particles,
        potential = %request.potential,
        "simulation requested"
    );

    // The solve is pure CPU work; keep it off the runtime workers
    let result = tokio::task::spawn_blocking(move || simulate::run_simulation(&request)).await;

    match result {
        Ok(Ok(response)) => Json(response).into_response(),
        Ok(Err(message)) => {
            warn!(error = %message, "simulation rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse { error: message }),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "simulation task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "simulation task failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn history_handler() -> impl IntoResponse {
    match history::recent(50) {
        Ok(runs) => Json(runs).into_response(),
        Err(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error: message }),
        )
            .into_response(),
    }
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn port_from_env() -> u16 {
    std::env::var("QSIM_PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_logging();

    let app = Router::new()
        .route("/", get(index))
        .route("/info", get(info))
        .route("/simulate", post(simulate_handler))
        .route("/history", get(history_handler));

    let addr = SocketAddr::from(([127, 0, 0, 1], port_from_env()));
    info!(%addr, "serving quantum simulation");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("bind {addr}: {e}"))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| format!("serve: {e}"))
}
