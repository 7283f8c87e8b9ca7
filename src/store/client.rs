use crate::config::InfluxConfig;
use crate::store::error::StoreError;
use crate::store::flux::{parse_annotated_csv, FluxTable};
use crate::store::point::Point;
use log::{debug, info, warn};
use reqwest::Client;

/// Connection to the time-series store over its v2 HTTP API.
///
/// Holds the shared process-wide `reqwest::Client`, so all store traffic
/// reuses one connection pool. The client keeps no local cache; every call
/// is network I/O.
#[derive(Debug, Clone)]
pub struct InfluxClient {
    http: Client,
    url: String,
    org: String,
    token: String,
    bucket: String,
}

impl InfluxClient {
    pub fn new(config: &InfluxConfig, http: Client) -> InfluxClient {
        InfluxClient {
            http,
            url: config.url.trim_end_matches('/').to_string(),
            org: config.org.clone(),
            token: config.token.clone(),
            bucket: config.bucket.clone(),
        }
    }

    /// The bucket queries run against.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Writes a batch of points in one request. A store-level failure is
    /// returned as-is; no partial retry happens here, the caller decides.
    pub async fn write(&self, points: &[Point]) -> Result<(), StoreError> {
        let body = points
            .iter()
            .filter_map(Point::to_line_protocol)
            .collect::<Vec<_>>()
            .join("\n");
        if body.is_empty() {
            info!("no points to write, skipping store write");
            return Ok(());
        }

        let url = format!("{}/api/v2/write", self.url);
        let response = self
            .http
            .post(&url)
            .query(&[
                ("org", self.org.as_str()),
                ("bucket", self.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.token))
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::NetworkRequest(url.clone(), e))?;

        Self::check_status(url, response)?;
        debug!("wrote {} points to bucket {}", points.len(), self.bucket);
        Ok(())
    }

    /// Executes a fully-formed Flux query and returns the result tables.
    pub async fn query(&self, flux: &str) -> Result<Vec<FluxTable>, StoreError> {
        let url = format!("{}/api/v2/query", self.url);
        let response = self
            .http
            .post(&url)
            .query(&[("org", self.org.as_str())])
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.token))
            .header(reqwest::header::CONTENT_TYPE, "application/vnd.flux")
            .header(reqwest::header::ACCEPT, "application/csv")
            .body(flux.to_string())
            .send()
            .await
            .map_err(|e| StoreError::NetworkRequest(url.clone(), e))?;

        let response = Self::check_status(url, response)?;
        let body = response.text().await.map_err(StoreError::ResponseBody)?;
        parse_annotated_csv(&body)
    }

    fn check_status(url: String, response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        match response.error_for_status() {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!("store request to {} failed: {:?}", url, e);
                Err(if let Some(status) = e.status() {
                    StoreError::HttpStatus { url, status, source: e }
                } else {
                    StoreError::NetworkRequest(url, e)
                })
            }
        }
    }
}
