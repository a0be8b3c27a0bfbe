use crate::backend::requests::{Request, RequestBody};
use futures::StreamExt;
use log::debug;
use reqwest::{Client as ReqwestClient, Response};
use std::error::Error;
use url::Url;

pub const BASE_URL: &str = "https://speed.cloudflare.com";

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct Client {
    client: ReqwestClient,
    base_url: Url,
}

impl Client {
    pub fn new(mut base_url: Url) -> Self {
        // Url::join replaces the last path segment unless the base ends
        // with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Client { client: ReqwestClient::new(), base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request's endpoint against the base URL.
    pub fn url_for<R: Request>(&self, request: &R) -> Result<Url, BoxError> {
        let endpoint = request.endpoint();
        let endpoint = endpoint.trim_start_matches('/');

        Ok(self.base_url.join(endpoint)?)
    }

    /// Send a request and decode its response.
    pub async fn send<R: Request>(
        &self,
        request: R,
    ) -> Result<R::Response, BoxError> {
        let response = self.execute(&request).await?;

        let text = response.text().await?;

        // Cloudflare often returns JSON with a text/plain content-type
        if let Ok(parsed) = serde_json::from_str::<R::Response>(&text) {
            return Ok(parsed);
        }

        let deserialized = serde_plain::from_str(&text)?;

        Ok(deserialized)
    }

    /// Send a request and drain its body, returning the number of bytes
    /// received.
    pub async fn receive<R: Request>(
        &self,
        request: &R,
    ) -> Result<u64, BoxError> {
        let response = self.execute(request).await?;
        let mut stream = response.bytes_stream();
        let mut received = 0u64;

        while let Some(chunk) = stream.next().await {
            received += chunk?.len() as u64;
        }

        Ok(received)
    }

    /// Send a request and return the raw response once the status has been
    /// checked.
    pub async fn execute<R: Request>(
        &self,
        request: &R,
    ) -> Result<Response, BoxError> {
        let url = self.url_for(request)?;
        debug!("{} {}", R::METHOD, url);

        let builder = self
            .client
            .request(R::METHOD, url)
            .headers(request.headers());

        let builder = match request.body() {
            RequestBody::None => builder,
            RequestBody::Bytes(bytes) => builder.body(bytes),
        };

        let response = builder.send().await?.error_for_status()?;

        Ok(response)
    }
}

impl Default for Client {
    fn default() -> Self {
        let base_url = Url::parse(BASE_URL).expect("BASE_URL is a valid URL");
        Self::new(base_url)
    }
}
