/// Typed client for a running qsim server; issues the same POST the
/// embedded frontend sends.

use crate::model::{ErrorResponse, SimulationRequest, SimulationResponse};
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SimulationClient {
    base_url: String,
    http: reqwest::Client,
}

impl SimulationClient {
    pub fn new(base_url: &str) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| format!("build http client: {e}"))?;
        Ok(SimulationClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub async fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationResponse, String> {
        let url = format!("{}/simulate", self.base_url);
        debug!(%url, particles = request.particles, "posting simulation request");

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| format!("post {url}: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            // Prefer the server's own error message when it sent one
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error,
                Err(_) => format!("server returned {status}"),
            };
            return Err(message);
        }

        response
            .json::<SimulationResponse>()
            .await
            .map_err(|e| format!("decode response: {e}"))
    }

    pub async fn history(&self) -> Result<Vec<crate::history::RunRecord>, String> {
        let url = format!("{}/history", self.base_url);
        self.http
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("get {url}: {e}"))?
            .json()
            .await
            .map_err(|e| format!("decode history: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let client = SimulationClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url, "http://localhost:8000");
        let client = SimulationClient::new("http://localhost:8000").unwrap();
        assert_eq!(client.base_url, "http://localhost:8000");
    }
}
