//! HTTP Provider Client
//!
//! One `reqwest::Client` for all three APIs. Every failure (transport,
//! non-2xx status, undecodable body) is retried `http_max_retries` times
//! with linear backoff, then logged and returned as `RawResponse::Empty`.

use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace, warn};

use super::{curve, stakedao, yearn, ProviderClient, RawResponse, Scope, Source};
use crate::config::Config;

/// Backoff step between retries
const RETRY_BACKOFF_MS: u64 = 500;

pub struct HttpProviderClient {
    http_client: Client,
    curve_api_url: String,
    yearn_api_url: String,
    stakedao_api_url: String,
    max_retries: u32,
}

impl HttpProviderClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .wrap_err("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            curve_api_url: config.curve_api_url.trim_end_matches('/').to_string(),
            yearn_api_url: config.yearn_api_url.trim_end_matches('/').to_string(),
            stakedao_api_url: config.stakedao_api_url.trim_end_matches('/').to_string(),
            max_retries: config.http_max_retries,
        })
    }

    /// URL serving `scope`, `None` when the provider can't cover the chain
    pub fn endpoint(&self, scope: &Scope) -> Option<String> {
        let chain = scope.chain.as_ref();
        match scope.source {
            Source::CurvePools => Some(format!("{}/getPools/all/{}", self.curve_api_url, chain?)),
            Source::CurveBaseApys => Some(format!("{}/getBaseApys/{}", self.curve_api_url, chain?)),
            Source::CurveVolumes => Some(format!("{}/getVolumes/{}", self.curve_api_url, chain?)),
            Source::CurveGauges => Some(format!("{}/getAllGauges", self.curve_api_url)),
            Source::YearnVaults => Some(format!(
                "{}/{}/vaults/all",
                self.yearn_api_url,
                chain?.chain_id()?
            )),
            Source::StakeDaoStrategies => Some(format!(
                "{}/strategies/curve/{}.json",
                self.stakedao_api_url,
                chain?.chain_id()?
            )),
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let mut attempt = 0;
        loop {
            match self.try_get_json(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    debug!("Retry {}/{} for {}: {:#}", attempt, self.max_retries, url, e);
                    let backoff = Duration::from_millis(RETRY_BACKOFF_MS * attempt as u64);
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_get_json(&self, url: &str) -> Result<Value> {
        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(eyre!("HTTP {}", status));
        }
        Ok(response.json::<Value>().await?)
    }
}

/// Decode a body into the variant for `source`
pub fn decode(source: Source, body: Value) -> Result<RawResponse> {
    Ok(match source {
        Source::CurvePools => RawResponse::Pools(curve::decode_pools(body)?),
        Source::CurveBaseApys => RawResponse::BaseApys(curve::decode_base_apys(body)?),
        Source::CurveVolumes => RawResponse::Volumes(curve::decode_volumes(body)?),
        Source::CurveGauges => RawResponse::Gauges(curve::decode_gauges(body)?),
        Source::YearnVaults => RawResponse::YearnVaults(yearn::decode_vaults(body)?),
        Source::StakeDaoStrategies => {
            RawResponse::StakeDaoStrategies(stakedao::decode_strategies(body)?)
        }
    })
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn fetch(&self, scope: &Scope) -> RawResponse {
        let Some(url) = self.endpoint(scope) else {
            debug!("No endpoint for {} - skipping", scope);
            return RawResponse::Empty;
        };

        trace!("GET {}", url);
        match self.get_json(&url).await.and_then(|body| decode(scope.source, body)) {
            Ok(response) => {
                debug!("{}: {} entries", scope, response.len());
                response
            }
            Err(e) => {
                warn!("API request failed for {}: {:#}", scope, e);
                RawResponse::Empty
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Chain;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client() -> HttpProviderClient {
        HttpProviderClient::new(&Config {
            curve_api_url: "https://curve.test/v1/".to_string(),
            yearn_api_url: "https://yearn.test".to_string(),
            stakedao_api_url: "https://sd.test/api".to_string(),
            http_max_retries: 0,
            ..Config::default()
        })
        .unwrap()
    }

    /// Local server answering every request with `status` and `body`.
    /// Returns the base URL and the number of requests served.
    async fn serve(status: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}/v1", addr), hits)
    }

    fn client_for(curve_api_url: String, http_max_retries: u32) -> HttpProviderClient {
        HttpProviderClient::new(&Config {
            curve_api_url,
            http_max_retries,
            ..Config::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoints() {
        let client = client();
        let eth = Chain::new("ethereum");

        assert_eq!(
            client.endpoint(&Scope::new(&eth, Source::CurvePools)).as_deref(),
            Some("https://curve.test/v1/getPools/all/ethereum")
        );
        assert_eq!(
            client.endpoint(&Scope::gauges()).as_deref(),
            Some("https://curve.test/v1/getAllGauges")
        );
        assert_eq!(
            client.endpoint(&Scope::new(&Chain::new("arbitrum"), Source::YearnVaults)).as_deref(),
            Some("https://yearn.test/42161/vaults/all")
        );
        assert_eq!(
            client.endpoint(&Scope::new(&eth, Source::StakeDaoStrategies)).as_deref(),
            Some("https://sd.test/api/strategies/curve/1.json")
        );
    }

    #[test]
    fn test_unknown_chain_has_no_aggregator_endpoint() {
        let client = client();
        let chain = Chain::new("unknown-l3");
        assert!(client.endpoint(&Scope::new(&chain, Source::YearnVaults)).is_none());
        assert!(client.endpoint(&Scope::new(&chain, Source::CurvePools)).is_some());
    }

    #[tokio::test]
    async fn test_unknown_chain_fetch_is_empty() {
        let client = client();
        let scope = Scope::new(&Chain::new("unknown-l3"), Source::StakeDaoStrategies);
        assert!(client.fetch(&scope).await.is_empty());
    }

    #[tokio::test]
    async fn test_refused_connection_retries_then_empty() {
        // nothing listens on port 1
        let client = client_for("http://127.0.0.1:1/v1".to_string(), 2);
        let scope = Scope::new(&Chain::new("ethereum"), Source::CurvePools);

        let started = Instant::now();
        assert!(client.fetch(&scope).await.is_empty());
        // 500 ms + 1000 ms of backoff
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_empty() {
        let (url, hits) = serve("200 OK", r#"{"success":false}"#).await;
        let client = client_for(url, 0);
        let scope = Scope::new(&Chain::new("ethereum"), Source::CurvePools);

        assert!(client.fetch(&scope).await.is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_status_is_retried_then_empty() {
        let (url, hits) = serve("500 Internal Server Error", "{}").await;
        let client = client_for(url, 1);
        let scope = Scope::new(&Chain::new("ethereum"), Source::CurveBaseApys);

        assert!(client.fetch(&scope).await.is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_valid_body_decodes() {
        let (url, _) = serve(
            "200 OK",
            r#"{"success":true,"data":{"poolData":[{"address":"0xAAA","name":"3pool"}]}}"#,
        )
        .await;
        let client = client_for(url, 0);
        let scope = Scope::new(&Chain::new("ethereum"), Source::CurvePools);

        let response = client.fetch(&scope).await;
        assert_eq!(response.pools().len(), 1);
        assert_eq!(response.pools()[0].name.as_deref(), Some("3pool"));
    }

    #[test]
    fn test_decode_dispatch() {
        let pools = decode(
            Source::CurvePools,
            json!({"data": {"poolData": [{"address": "0x1", "name": "x"}]}}),
        )
        .unwrap();
        assert_eq!(pools.pools().len(), 1);

        assert!(decode(Source::YearnVaults, json!({"data": []})).is_err());
    }
}
