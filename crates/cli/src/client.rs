//! API client for the AgriSage prediction server

use agrisage_lib::{predictor::TaskDescription, FeatureSet, HealthResponse, PredictionResult};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the prediction server
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            anyhow::bail!("API error ({}): {}", status, message);
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn predict(&self, task: &str, features: &FeatureSet) -> Result<PredictionResult> {
        let request = PredictRequest { task, features };
        let response: PredictResponse = self.post("api/predict", &request).await?;
        Ok(response.result)
    }

    pub async fn tasks(&self) -> Result<Vec<TaskDescription>> {
        let catalog: TaskCatalog = self.get("api/tasks").await?;
        Ok(catalog.tasks)
    }

    /// Server health; degraded and unhealthy bodies are returned, not errors
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.base_url.join("healthz").context("Invalid path")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        response.json().await.context("Failed to parse health response")
    }
}

// API request/response types

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    task: &'a str,
    features: &'a FeatureSet,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    result: PredictionResult,
}

#[derive(Debug, Deserialize)]
struct TaskCatalog {
    tasks: Vec<TaskDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
