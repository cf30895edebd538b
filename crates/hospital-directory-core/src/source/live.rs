//! HTTP client for the hosted hospital record service.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::config::DirectoryConfig;
use crate::directory::{FilterEngine, Normalizer};
use crate::models::{Comment, FilterCriteria, Hospital, NewComment, NewHospital, StatsSummary};

use super::envelope::{
    decode_comment, decode_created, decode_detail, decode_listing, decode_search, decode_updated,
};
use super::{HospitalSource, ListPage, SourceError, SourceKind, SourceResult};

/// Source backed by the record service.
pub struct LiveSource {
    client: Client,
    config: DirectoryConfig,
    normalizer: Normalizer,
}

impl LiveSource {
    pub fn new(config: &DirectoryConfig) -> SourceResult<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            config: config.clone(),
            normalizer: Normalizer::for_live(),
        })
    }

    /// Send a request and read the body as JSON.
    ///
    /// 404 maps to [`SourceError::NotFound`] for `subject`; other non-2xx
    /// statuses are errors. Empty or malformed bodies read as `Value::Null`
    /// so the envelope decoders can degrade them.
    async fn send(&self, request: RequestBuilder, subject: &str) -> SourceResult<Value> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();

        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(subject.to_string()));
        }
        if !status.is_success() {
            tracing::warn!("Record service returned {} for {}", status, url);
            return Err(SourceError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        match serde_json::from_slice(&body) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!("Malformed JSON from {}: {}", url, e);
                Ok(Value::Null)
            }
        }
    }
}

#[async_trait]
impl HospitalSource for LiveSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Live
    }

    async fn list(&self, page: u32, page_size: u32) -> SourceResult<ListPage> {
        let url = self.config.endpoint("hospitals/listhospital");
        tracing::debug!("GET {} page={} limit={}", url, page, page_size);

        let mut request = self.client.get(&url);
        if page > 0 {
            request = request.query(&[("page", page), ("limit", page_size)]);
        }
        let payload = self.send(request, "listing").await?;
        Ok(decode_listing(&self.normalizer, payload))
    }

    async fn stats(&self) -> SourceResult<StatsSummary> {
        let url = self.config.endpoint("hospitals/stats");
        tracing::debug!("GET {}", url);

        let payload = self.send(self.client.get(&url), "stats").await?;
        Ok(StatsSummary::parse(&payload))
    }

    async fn search(&self, criteria: &FilterCriteria) -> SourceResult<Vec<Hospital>> {
        let url = self.config.endpoint("hospitals/search_hospital");
        let params = FilterEngine::to_query(criteria);
        tracing::debug!("GET {} with {} filter param(s)", url, params.len());

        let payload = self
            .send(self.client.get(&url).query(&params), "search")
            .await?;
        Ok(decode_search(&self.normalizer, payload))
    }

    async fn get_by_id(&self, id: &str) -> SourceResult<Hospital> {
        let url = self.config.endpoint(&format!("hospitals/{}", id));
        tracing::debug!("GET {}", url);

        let payload = self.send(self.client.get(&url), id).await?;
        decode_detail(&self.normalizer, id, payload)
    }

    async fn create(&self, hospital: &NewHospital) -> SourceResult<Hospital> {
        let url = self.config.endpoint("hospitals/addhospital");
        tracing::debug!("POST {} ({})", url, hospital.name);

        let payload = self
            .send(self.client.post(&url).json(hospital), &hospital.name)
            .await?;
        let created = decode_created(&self.normalizer, hospital, payload)?;
        tracing::info!("Created hospital {} in {}", created.id, created.state);
        Ok(created)
    }

    async fn add_comment(&self, id: &str, comment: &NewComment) -> SourceResult<Comment> {
        let url = self.config.endpoint(&format!("hospitals/{}/comment", id));
        tracing::debug!("POST {}", url);

        let payload = self.send(self.client.post(&url).json(comment), id).await?;
        Ok(decode_comment(comment, payload))
    }

    async fn update(&self, id: &str, hospital: &NewHospital) -> SourceResult<Hospital> {
        let url = self.config.endpoint(&format!("hospitals/{}", id));
        tracing::debug!("PUT {}", url);

        let payload = self.send(self.client.put(&url).json(hospital), id).await?;
        decode_updated(&self.normalizer, id, hospital, payload)
    }

    async fn delete(&self, id: &str) -> SourceResult<()> {
        let url = self.config.endpoint(&format!("hospitals/deletehospitals/{}", id));
        tracing::debug!("DELETE {}", url);

        self.send(self.client.delete(&url), id).await?;
        tracing::info!("Deleted hospital {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_kind_and_endpoints() {
        let source = LiveSource::new(&DirectoryConfig::live("https://api.example.com/v1/hospitals/")).unwrap();
        assert_eq!(source.kind(), SourceKind::Live);
        assert_eq!(
            source.config.endpoint("hospitals/listhospital"),
            "https://api.example.com/v1/hospitals/hospitals/listhospital"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        let mut config = DirectoryConfig::live("http://127.0.0.1:1");
        config.request_timeout = Duration::from_millis(500);
        let source = LiveSource::new(&config).unwrap();

        let result = source.stats().await;
        assert!(matches!(result, Err(SourceError::Network(_))));
    }

    /// Serve one canned HTTP response on a local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> DirectoryConfig {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = vec![0u8; 8192];
            let _ = stream.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
        });

        let mut config = DirectoryConfig::live(format!("http://{}", addr));
        config.request_timeout = Duration::from_secs(5);
        config
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let config = serve_once("404 Not Found", r#"{"message":"Hospital not found"}"#).await;
        let source = LiveSource::new(&config).unwrap();

        let result = source.get_by_id("abc").await;
        assert!(matches!(result, Err(SourceError::NotFound(id)) if id == "abc"));
    }

    #[tokio::test]
    async fn test_server_error_is_status() {
        let config = serve_once("500 Internal Server Error", r#"{"message":"boom"}"#).await;
        let source = LiveSource::new(&config).unwrap();

        match source.list(1, 10).await {
            Err(SourceError::Status { status, url }) => {
                assert_eq!(status, 500);
                assert!(url.contains("hospitals/listhospital"));
            }
            other => panic!("expected status error, got {:?}", other.map(|p| p.groups.len())),
        }
    }

    #[tokio::test]
    async fn test_malformed_stats_body_degrades() {
        let config = serve_once("200 OK", "{ not json").await;
        let source = LiveSource::new(&config).unwrap();

        let stats = source.stats().await.unwrap();
        assert_eq!(stats, StatsSummary::default());
        assert!(!stats.totals_reported);
    }

    #[tokio::test]
    async fn test_empty_listing_body_degrades() {
        let config = serve_once("200 OK", "").await;
        let source = LiveSource::new(&config).unwrap();

        let page = source.list(1, 10).await.unwrap();
        assert!(page.groups.is_empty());
        assert!(page.meta.is_none());
    }

    #[tokio::test]
    async fn test_live_records_use_symbol() {
        let config = serve_once(
            "200 OK",
            r#"{"_id":"x","state":"Lagos","delivery_cost":{"normal":5000,"currency":"USD","updatedAt":"2025-03-01"}}"#,
        )
        .await;
        let source = LiveSource::new(&config).unwrap();

        let hospital = source.get_by_id("x").await.unwrap();
        assert_eq!(hospital.delivery_cost.currency, crate::models::LIVE_CURRENCY_SYMBOL);
    }
}
