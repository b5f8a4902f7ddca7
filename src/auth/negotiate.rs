// Copyright 2019 Dmitry Tantsur <dtantsur@protonmail.com>
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

//! Connection negotiation: probe, challenge and fallback.

use lazy_static::lazy_static;
use log::{debug, error};
use regex::Regex;
use reqwest::header::{HeaderMap, WWW_AUTHENTICATE};
use reqwest::{Method, StatusCode, Url};

use super::keystone;
use super::Authentication;
use crate::connection::ConnectionContext;
use crate::transport::{Connector, Request, Response};
use crate::url;
use crate::{Error, ErrorKind};

/// Path of the model discovery document.
pub(crate) const MODEL_PATH: &str = "/-/";

lazy_static! {
    static ref KEYSTONE_CHALLENGE: Regex = Regex::new(r"^(?:Keystone|snf-auth) uri='(.+)'$")
        .expect("Keystone challenge regex must compile");
}

/// Extract the Keystone URI from a challenge.
fn keystone_uri(response: &Response) -> Result<String, Error> {
    let header = response
        .headers
        .get(WWW_AUTHENTICATE)
        .ok_or_else(|| {
            Error::new(
                ErrorKind::ProtocolError,
                "missing WWW-Authenticate header in the response",
            )
            .with_status(response.status)
        })?
        .to_str()
        .unwrap_or_default();
    KEYSTONE_CHALLENGE
        .captures(header)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            Error::new(
                ErrorKind::ProtocolError,
                format!("incorrect WWW-Authenticate content: {}", header),
            )
            .with_status(response.status)
        })
}

fn probe_failed(status: StatusCode) -> Error {
    Error::new(ErrorKind::AuthenticationFailed, status.to_string()).with_status(status)
}

/// Establish an authenticated connection to the endpoint.
///
/// Sends a `HEAD` probe for the model document. A 200 means the connection is ready. A 401 with a
/// Keystone challenge is delegated to the fallback authentication over the same connection. Any
/// other outcome fails with the status line.
pub(crate) async fn negotiate(
    auth: &Authentication,
    connector: &dyn Connector,
    endpoint: &Url,
    headers: HeaderMap,
) -> Result<ConnectionContext, Error> {
    if !auth.is_transport_capable() {
        return Err(Error::new(
            ErrorKind::AuthenticationFailed,
            format!(
                "{} authentication cannot be used to connect directly",
                auth.name()
            ),
        ));
    }

    debug!(
        "Connecting to {} using {} authentication",
        endpoint,
        auth.name()
    );
    let transport = connector.connect(&auth.tls_settings())?;
    let mut context =
        ConnectionContext::new(transport, endpoint.clone(), headers, auth.credentials());

    let probe = url::server_path(endpoint, MODEL_PATH)?;
    let response = context.send(Request::new(Method::HEAD, probe)).await?;
    match response.status {
        StatusCode::OK => {
            debug!("Authenticated against {}", endpoint);
            Ok(context)
        }
        StatusCode::UNAUTHORIZED => {
            let fallback = auth.fallback().ok_or_else(|| {
                error!("{} rejected {} authentication", endpoint, auth.name());
                probe_failed(response.status)
            })?;
            let uri = keystone_uri(&response)?;
            debug!(
                "{} requested Keystone authentication at {}, falling back",
                endpoint, uri
            );
            keystone::authenticate(&mut context, &fallback, &uri).await?;
            debug!("Authenticated against {} via Keystone", endpoint);
            Ok(context)
        }
        other => {
            error!("Probe of {} returned {}", endpoint, other);
            Err(probe_failed(other))
        }
    }
}

#[cfg(test)]
pub mod test {
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
    use reqwest::{Method, Url};

    use super::{keystone_uri, negotiate};
    use crate::auth::Authentication;
    use crate::transport::test::{response, MockServer};
    use crate::ErrorKind;

    fn endpoint() -> Url {
        Url::parse("https://occi.example.com:11443/").unwrap()
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("text/plain"));
        headers
    }

    #[tokio::test]
    async fn test_head_request_ok() {
        let server = MockServer::new(|_| response(200, &[], ""));
        let auth = Authentication::basic("user", "pass").with_ca_file("/tmp/ca.pem");
        let ctx = negotiate(&auth, &server, &endpoint(), headers())
            .await
            .unwrap();
        assert_eq!(ctx.target(), &endpoint());
        assert_eq!(server.connects(), 1);
        assert!(server.last_settings().unwrap().trust.is_custom());

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::HEAD);
        assert_eq!(requests[0].url.as_str(), "https://occi.example.com:11443/-/");
        assert_eq!(requests[0].headers.get(ACCEPT).unwrap(), "text/plain");
    }

    #[tokio::test]
    async fn test_head_request_unexpected_status() {
        let server = MockServer::new(|_| response(403, &[], ""));
        let err = negotiate(&Authentication::none(), &server, &endpoint(), headers())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        assert_eq!(err.message(), "403 Forbidden");
        assert_eq!(err.status().unwrap(), 403);
    }

    #[tokio::test]
    async fn test_unauthorized_without_fallback() {
        let server = MockServer::new(|_| {
            response(
                401,
                &[("WWW-Authenticate", "Keystone uri='https://k.example.com/'")],
                "",
            )
        });
        let err = negotiate(&Authentication::none(), &server, &endpoint(), headers())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        assert_eq!(err.message(), "401 Unauthorized");
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_challenge() {
        for challenge in &[
            "Basic realm=\"occi\"",
            "Keystone uri=https://k.example.com/",
        ] {
            let value = challenge.to_string();
            let server = MockServer::new(move |_| {
                response(401, &[("WWW-Authenticate", value.as_str())], "")
            });
            let err = negotiate(
                &Authentication::basic("user", "pass"),
                &server,
                &endpoint(),
                headers(),
            )
            .await
            .err()
            .unwrap();
            assert_eq!(err.kind(), ErrorKind::ProtocolError);
            assert!(err.is_communication());
        }
    }

    #[test]
    fn test_challenge_prefixes() {
        for (challenge, uri) in &[
            ("Keystone uri='https://k.example.com/'", "https://k.example.com/"),
            (
                "snf-auth uri='https://astakos.example.com/identity/v2.0'",
                "https://astakos.example.com/identity/v2.0",
            ),
        ] {
            let resp = response(401, &[("WWW-Authenticate", *challenge)], "");
            assert_eq!(keystone_uri(&resp).unwrap(), *uri);
        }
        let resp = response(401, &[("WWW-Authenticate", "Negotiate uri='https://k/'")], "");
        assert_eq!(
            keystone_uri(&resp).err().unwrap().kind(),
            ErrorKind::ProtocolError
        );
    }

    #[tokio::test]
    async fn test_missing_challenge() {
        let server = MockServer::new(|_| response(401, &[], ""));
        let err = negotiate(
            &Authentication::voms("/tmp/proxy"),
            &server,
            &endpoint(),
            headers(),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::ProtocolError);
    }

    #[tokio::test]
    async fn test_keystone_not_transport_capable() {
        let server = MockServer::new(|_| response(200, &[], ""));
        let auth = Authentication::keystone(Authentication::basic("u", "p"));
        let err = negotiate(&auth, &server, &endpoint(), headers())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        assert_eq!(server.connects(), 0);
    }
}
