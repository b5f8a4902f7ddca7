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

//! Established connection: transport, shared headers and credentials.

use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use digest_auth::{AuthContext, HttpMethod, WwwAuthenticateHeader};
use log::{debug, trace};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{StatusCode, Url};

use super::transport::{Request, Response, Transport};
use super::url::same_origin;
use super::utils::secret_hash;
use super::{Error, ErrorKind};

/// Password credentials used for the target server only.
#[derive(Clone, PartialEq, Eq)]
pub(crate) enum Credentials {
    Basic { username: String, password: String },
    Digest { username: String, password: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (scheme, username, password) = match self {
            Credentials::Basic { username, password } => ("Basic", username, password),
            Credentials::Digest { username, password } => ("Digest", username, password),
        };
        write!(
            f,
            "{} {{ username: {}, password: hash({}) }}",
            scheme,
            username,
            secret_hash(password)
        )
    }
}

/// A live connection to an OCCI server.
///
/// Holds the transport, the headers added to every request for the server (media type
/// negotiation, authentication tokens) and password credentials. Headers and credentials are
/// only sent to the scheme, host and port of the target server.
pub struct ConnectionContext {
    transport: Box<dyn Transport>,
    target: Url,
    headers: HeaderMap,
    credentials: Option<Credentials>,
    challenge: Option<WwwAuthenticateHeader>,
}

impl fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("transport", &self.transport)
            .field("target", &self.target.as_str())
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("credentials", &self.credentials)
            .field("challenge", &self.challenge.is_some())
            .finish()
    }
}

impl ConnectionContext {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        target: Url,
        headers: HeaderMap,
        credentials: Option<Credentials>,
    ) -> ConnectionContext {
        ConnectionContext {
            transport,
            target,
            headers,
            credentials,
            challenge: None,
        }
    }

    /// URL of the target server.
    #[inline]
    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Headers added to every request for the target server.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set a header, replacing any header with the same name.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        trace!("Installing connection header {}", name);
        let _ = self.headers.insert(name, value);
    }

    /// Send a request.
    ///
    /// Requests for the target server get the shared headers (request headers take precedence)
    /// and the credentials. A digest challenge is answered once.
    pub async fn send(&mut self, mut request: Request) -> Result<Response, Error> {
        let in_scope = same_origin(&self.target, &request.url);
        if in_scope {
            let mut headers = self.headers.clone();
            headers.extend(request.headers);
            request.headers = headers;
            self.authorize(&mut request)?;
        }

        let response = self.transport.execute(request.clone()).await?;
        if response.status != StatusCode::UNAUTHORIZED || !in_scope {
            return Ok(response);
        }

        if let Some(Credentials::Digest { .. }) = self.credentials {
            if let Some(challenge) = digest_challenge(&response) {
                debug!("Answering a digest challenge from {}", self.target);
                self.challenge = Some(digest_auth::parse(challenge).map_err(|e| {
                    Error::new(
                        ErrorKind::ProtocolError,
                        format!("invalid digest challenge: {}", e),
                    )
                })?);
                self.authorize(&mut request)?;
                return self.transport.execute(request).await;
            }
        }

        Ok(response)
    }

    fn authorize(&mut self, request: &mut Request) -> Result<(), Error> {
        let value = match self.credentials {
            Some(Credentials::Basic {
                ref username,
                ref password,
            }) => {
                let encoded =
                    general_purpose::STANDARD.encode(format!("{}:{}", username, password));
                format!("Basic {}", encoded)
            }
            Some(Credentials::Digest {
                ref username,
                ref password,
            }) => {
                let Some(ref mut challenge) = self.challenge else {
                    return Ok(());
                };
                let uri = match request.url.query() {
                    Some(query) => format!("{}?{}", request.url.path(), query),
                    None => request.url.path().to_string(),
                };
                let context = AuthContext::new_with_method(
                    username.as_str(),
                    password.as_str(),
                    uri,
                    request.body.as_ref().map(|b| b.as_bytes()),
                    HttpMethod::from(request.method.as_str()),
                );
                challenge
                    .respond(&context)
                    .map_err(|e| {
                        Error::new(
                            ErrorKind::AuthenticationFailed,
                            format!("cannot answer the digest challenge: {}", e),
                        )
                    })?
                    .to_header_string()
            }
            None => return Ok(()),
        };
        let mut value = HeaderValue::from_str(&value)?;
        value.set_sensitive(true);
        let _ = request.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

fn digest_challenge(response: &Response) -> Option<&str> {
    response
        .headers
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| {
            v.get(..7)
                .map(|s| s.eq_ignore_ascii_case("digest "))
                .unwrap_or(false)
        })
}

#[cfg(test)]
pub(crate) mod test {
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
    use reqwest::{Method, Url};

    use super::{ConnectionContext, Credentials};
    use crate::transport::test::{response, MockServer};
    use crate::transport::Request;

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("text/plain"));
        headers
    }

    fn context(server: &MockServer, credentials: Option<Credentials>) -> ConnectionContext {
        ConnectionContext::new(
            Box::new(server.clone()),
            Url::parse("https://occi.example.com:11443/").unwrap(),
            headers(),
            credentials,
        )
    }

    #[tokio::test]
    async fn test_headers_scoped_to_target() {
        let server = MockServer::new(|_| response(200, &[], ""));
        let mut ctx = context(
            &server,
            Some(Credentials::Basic {
                username: "user".into(),
                password: "pass".into(),
            }),
        );

        let _ = ctx
            .send(Request::new(
                Method::GET,
                Url::parse("https://occi.example.com:11443/-/").unwrap(),
            ))
            .await
            .unwrap();
        let _ = ctx
            .send(Request::new(
                Method::POST,
                Url::parse("https://keystone.example.com:5000/v2.0/tokens").unwrap(),
            ))
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].headers.get(ACCEPT).unwrap(), "text/plain");
        assert_eq!(
            requests[0].headers.get(AUTHORIZATION).unwrap(),
            "Basic dXNlcjpwYXNz"
        );
        assert!(requests[1].headers.get(ACCEPT).is_none());
        assert!(requests[1].headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_request_headers_take_precedence() {
        let server = MockServer::new(|_| response(200, &[], ""));
        let mut ctx = context(&server, None);
        let mut own = HeaderMap::new();
        let _ = own.insert(ACCEPT, HeaderValue::from_static("text/uri-list"));
        let _ = ctx
            .send(
                Request::new(
                    Method::GET,
                    Url::parse("https://occi.example.com:11443/compute/").unwrap(),
                )
                .with_headers(own),
            )
            .await
            .unwrap();
        assert_eq!(
            server.requests()[0].headers.get(ACCEPT).unwrap(),
            "text/uri-list"
        );
        assert_eq!(ctx.headers().get(ACCEPT).unwrap(), "text/plain");
    }

    #[tokio::test]
    async fn test_digest_challenge() {
        let server = MockServer::new(|req| {
            if req.headers.contains_key(AUTHORIZATION) {
                response(200, &[], "")
            } else {
                response(
                    401,
                    &[(
                        "WWW-Authenticate",
                        r#"Digest realm="occi", qop="auth", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#,
                    )],
                    "",
                )
            }
        });
        let mut ctx = context(
            &server,
            Some(Credentials::Digest {
                username: "user".into(),
                password: "pass".into(),
            }),
        );
        let url = Url::parse("https://occi.example.com:11443/-/").unwrap();
        let resp = ctx.send(Request::new(Method::HEAD, url.clone())).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(server.requests().len(), 2);

        // The challenge is reused.
        let resp = ctx.send(Request::new(Method::GET, url)).await.unwrap();
        assert_eq!(resp.status, 200);
        let requests = server.requests();
        assert_eq!(requests.len(), 3);
        let auth = requests[2].headers.get(AUTHORIZATION).unwrap().to_str().unwrap();
        assert!(auth.starts_with("Digest "));
        assert!(auth.contains("username=\"user\""));
        assert!(auth.contains("uri=\"/-/\""));
    }

    #[tokio::test]
    async fn test_no_credentials_401() {
        let server = MockServer::new(|_| response(401, &[("WWW-Authenticate", "Digest realm=\"x\", nonce=\"y\"")], ""));
        let mut ctx = context(&server, None);
        let resp = ctx
            .send(Request::new(
                Method::HEAD,
                Url::parse("https://occi.example.com:11443/-/").unwrap(),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status, 401);
        assert_eq!(server.requests().len(), 1);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let creds = Credentials::Basic {
            username: "user".into(),
            password: "very-secret".into(),
        };
        let text = format!("{:?}", creds);
        assert!(text.contains("user"));
        assert!(!text.contains("very-secret"));
    }
}
