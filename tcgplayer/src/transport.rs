//! The "send a request, get JSON back" seam the API client is built on.
//!
//! [`HttpTransport`] talks to the real endpoints through reqwest. Anything
//! else that can produce the same JSON (a recorded fixture, a browser driven
//! fetcher) can implement [`Transport`] and be handed to
//! [`HttpClient::with_transport`](crate::HttpClient::with_transport).
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Response;
use serde_json::Value;
use std::time::Duration;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value>;

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration, user_agent: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if let Some(user_agent) = user_agent {
            builder = builder.user_agent(user_agent);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn read_json(response: Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::Response(status, text));
        }

        serde_json::from_str(&text).map_err(|_| Error::MalformedResponse(text))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self.client.get(url).send().await?;
        Self::read_json(response).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self.client.post(url).json(body).send().await?;
        Self::read_json(response).await
    }
}

#[cfg(test)]
pub(crate) use fake::FakeTransport;

#[cfg(test)]
mod fake {
    use super::*;
    use std::sync::Mutex;

    type Handler = Box<dyn Fn(&str, Option<&Value>) -> Result<Value> + Send + Sync>;

    /// Answers every request with a scripted handler and records what was
    /// sent.
    pub(crate) struct FakeTransport {
        handler: Handler,
        requests: Mutex<Vec<(String, Option<Value>)>>,
    }

    impl FakeTransport {
        pub(crate) fn new<F>(handler: F) -> Self
        where
            F: Fn(&str, Option<&Value>) -> Result<Value> + Send + Sync + 'static,
        {
            Self {
                handler: Box::new(handler),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn requests(&self) -> Vec<(String, Option<Value>)> {
            self.requests.lock().unwrap().clone()
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn answer(&self, url: &str, body: Option<&Value>) -> Result<Value> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), body.cloned()));
            (self.handler)(url, body)
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get_json(&self, url: &str) -> Result<Value> {
            self.answer(url, None)
        }

        async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
            self.answer(url, Some(body))
        }
    }
}
