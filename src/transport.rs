// Copyright 2024 Dmitry Tantsur <dtantsur@protonmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP transport.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use log::trace;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode, Url};
use static_assertions::{assert_impl_all, assert_obj_safe};

use super::tls::{self, TlsSettings};
use super::Error;

/// Default connect and request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// An HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Full URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Optional body.
    pub body: Option<String>,
}

impl Request {
    /// Create a request without headers and body.
    #[inline]
    pub fn new(method: Method, url: Url) -> Request {
        Request {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Set headers, replacing existing ones with the same names.
    #[inline]
    pub fn with_headers(mut self, headers: HeaderMap) -> Request {
        self.headers.extend(headers);
        self
    }

    /// Set a body.
    #[inline]
    pub fn with_body<S: Into<String>>(mut self, body: S) -> Request {
        self.body = Some(body.into());
        self
    }
}

/// An HTTP response with the body read in full.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: String,
}

impl Response {
    /// A header value as a string, if present and valid.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `Content-Type` without parameters.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::trim)
    }
}

/// Executes HTTP requests.
#[async_trait]
pub trait Transport: Debug + Send + Sync {
    /// Execute a request and read the whole response.
    async fn execute(&self, request: Request) -> Result<Response, Error>;
}

assert_obj_safe!(Transport);

/// Creates transports with the given TLS material.
pub trait Connector: Debug + Send + Sync {
    /// Create a new transport.
    fn connect(&self, tls: &TlsSettings) -> Result<Box<dyn Transport>, Error>;
}

assert_obj_safe!(Connector);

/// Transport on top of `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

assert_impl_all!(HttpTransport: Send, Sync);

impl HttpTransport {
    /// Wrap an existing client.
    #[inline]
    pub fn new(client: Client) -> HttpTransport {
        HttpTransport { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: Request) -> Result<Response, Error> {
        trace!("Sending HTTP {} request to {}", request.method, request.url);
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        trace!("HTTP request to {} returned {}", response.url(), status);
        let body = response.text().await?;
        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

/// Connector creating `reqwest` clients.
#[derive(Debug, Clone, Copy)]
pub struct HttpConnector {
    connect_timeout: Duration,
    timeout: Duration,
}

impl Default for HttpConnector {
    fn default() -> HttpConnector {
        HttpConnector {
            connect_timeout: DEFAULT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HttpConnector {
    /// Create a connector with default timeouts.
    #[inline]
    pub fn new() -> HttpConnector {
        HttpConnector::default()
    }

    /// Override the timeouts.
    #[inline]
    pub fn with_timeouts(mut self, connect_timeout: Duration, timeout: Duration) -> HttpConnector {
        self.connect_timeout = connect_timeout;
        self.timeout = timeout;
        self
    }
}

impl Connector for HttpConnector {
    fn connect(&self, settings: &TlsSettings) -> Result<Box<dyn Transport>, Error> {
        let builder = Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout);
        let client = tls::configure(builder, settings)?.build()?;
        Ok(Box::new(HttpTransport::new(client)))
    }
}
