use crate::app::ports::{HttpClientPort, HttpResponse};
use crate::config::HttpConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .gzip(true)
            .deflate(true)
            .build()?;
        Ok(Self { client })
    }

    async fn read(resp: reqwest::Response) -> std::result::Result<HttpResponse, String> {
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = resp.bytes().await.map_err(|e| e.to_string())?.to_vec();
        tracing::debug!("HTTP response: status={}, size={} bytes", status, bytes.len());
        Ok(HttpResponse { status, bytes, content_type })
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> std::result::Result<HttpResponse, String> {
        tracing::info!("HTTP GET request to: {}", url);
        let resp = self.client.get(url).query(query).send().await.map_err(|e| e.to_string())?;
        Self::read(resp).await
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> std::result::Result<HttpResponse, String> {
        tracing::info!("HTTP POST request to: {}", url);
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let resp = request.send().await.map_err(|e| e.to_string())?;
        Self::read(resp).await
    }
}
