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

//! Keystone (Identity V2) token exchange.

use log::{debug, trace};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};

use super::protocol::{AuthRoot, TenantsRoot, TokenRoot};
use super::Authentication;
use crate::connection::ConnectionContext;
use crate::transport::{Request, Response};
use crate::url;
use crate::{Error, ErrorKind};

const X_AUTH_TOKEN: HeaderName = HeaderName::from_static("x-auth-token");

fn token_header(token: &str) -> Result<HeaderValue, Error> {
    let mut value = HeaderValue::from_str(token)?;
    value.set_sensitive(true);
    Ok(value)
}

fn json_headers(token: Option<&str>) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    let json = HeaderValue::from_static("application/json");
    let _ = headers.insert(CONTENT_TYPE, json.clone());
    let _ = headers.insert(ACCEPT, json);
    if let Some(token) = token {
        let _ = headers.insert(X_AUTH_TOKEN, token_header(token)?);
    }
    Ok(headers)
}

fn check(response: Response, url: &Url) -> Result<Response, Error> {
    if response.status == StatusCode::OK {
        Ok(response)
    } else {
        Err(Error::new(
            ErrorKind::AuthenticationFailed,
            format!("Keystone request to {} returned {}", url, response.status),
        )
        .with_status(response.status))
    }
}

async fn request_token(
    context: &mut ConnectionContext,
    url: &Url,
    body: &AuthRoot,
    token: Option<&str>,
) -> Result<String, Error> {
    let request = Request::new(Method::POST, url.clone())
        .with_headers(json_headers(token)?)
        .with_body(serde_json::to_string(body)?);
    let response = check(context.send(request).await?, url)?;
    let root: TokenRoot = serde_json::from_str(&response.body)?;
    Ok(root.access.token.id)
}

async fn list_tenants(
    context: &mut ConnectionContext,
    url: &Url,
    token: &str,
) -> Result<Vec<String>, Error> {
    let request = Request::new(Method::GET, url.clone()).with_headers(json_headers(Some(token))?);
    let response = check(context.send(request).await?, url)?;
    let root: TenantsRoot = serde_json::from_str(&response.body)?;
    Ok(root.tenants.into_iter().map(|t| t.name).collect())
}

/// Obtain a tenant-scoped token and install it into the connection.
///
/// Tenants are tried in the order Keystone lists them, failures for individual tenants are
/// skipped.
pub(crate) async fn authenticate(
    context: &mut ConnectionContext,
    auth: &Authentication,
    uri: &str,
) -> Result<(), Error> {
    let root = url::keystone_root(uri)?;
    let tokens_url = url::append(&root, "tokens")?;
    let tenants_url = url::append(&root, "tenants")?;

    let unscoped = request_token(context, &tokens_url, &auth.keystone_payload(None)?, None).await?;
    debug!("Received an unscoped token from {}", root);

    let tenants = list_tenants(context, &tenants_url, &unscoped).await?;
    trace!("Keystone at {} lists tenants {:?}", root, tenants);

    for tenant in tenants {
        let body = auth.keystone_payload(Some(&tenant))?;
        match request_token(context, &tokens_url, &body, Some(&unscoped)).await {
            Ok(scoped) => {
                debug!("Received a token scoped to tenant {}", tenant);
                context.set_header(X_AUTH_TOKEN, token_header(&scoped)?);
                return Ok(());
            }
            Err(err) => debug!("Tenant {} cannot be used: {}", tenant, err),
        }
    }

    Err(Error::new(
        ErrorKind::AuthenticationFailed,
        "no suitable tenant found",
    ))
}
