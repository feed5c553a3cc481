use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};

use super::{Endpoint, HttpResponse, MultipartBody, Transport};
use crate::error::TransportError;

/// [`Transport`] over HTTP using reqwest.
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    /// `timeout` bounds the whole request, including upload and body read.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(TransportError::Url(base_url.to_string()));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    async fn build_form(body: MultipartBody) -> Result<Form, TransportError> {
        let mut form = Form::new();
        for part in body.parts() {
            let bytes = part.file.read_content().await?;
            log::debug!("Attaching {} ({} bytes)", part.file.name(), bytes.len());
            form = form.part(
                part.field,
                Part::bytes(bytes).file_name(part.file.name().to_string()),
            );
        }
        Ok(form)
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn post_multipart(
        &self,
        endpoint: Endpoint,
        body: MultipartBody,
    ) -> Result<HttpResponse, TransportError> {
        let url = self.url(endpoint);
        let count = body.len();
        let form = Self::build_form(body).await?;

        log::info!("POST {url} ({count} file(s))");
        let resp = self.client.post(&url).multipart(form).send().await?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().await?.to_vec();
        log::debug!("{url} answered {status} with {} bytes", body.len());

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}
