use crate::app::ports::{HttpClientPort, HttpRequest, HttpResponse};
use async_trait::async_trait;
use reqwest::Method;
use std::time::Duration;

/// `HttpClientPort` backed by a single shared reqwest client
pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    /// Without a timeout the reqwest default applies
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self { client: builder.build()? })
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|e| e.to_string())?;
        tracing::debug!("HTTP {} request to: {}", method, request.url);

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let resp = builder.send().await.map_err(|e| e.to_string())?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| e.to_string())?.to_vec();
        tracing::debug!("HTTP response: status={}, size={} bytes", status, body.len());
        Ok(HttpResponse { status, body })
    }
}
