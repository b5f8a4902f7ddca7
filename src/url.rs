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

//! Handy primitives for working with URLs.

use reqwest::Url;

use super::Error;

/// Resolve a server-advertised path (or absolute URL) against the endpoint host.
#[inline]
pub fn server_path(endpoint: &Url, path: &str) -> Result<Url, Error> {
    endpoint.join(path).map_err(Error::from)
}

/// Resolve a caller-supplied location.
///
/// Absolute URLs are returned as they are, anything else is appended to the endpoint.
pub fn full_uri(endpoint: &Url, location: &str) -> Result<Url, Error> {
    match Url::parse(location) {
        Ok(url) if url.has_host() => Ok(url),
        _ => {
            let base = endpoint.as_str().trim_end_matches('/');
            let location = location.trim_start_matches('/');
            Url::parse(&format!("{}/{}", base, location)).map_err(Error::from)
        }
    }
}

/// Append `?action=<term>` to a location.
///
/// The location is extended literally, an existing query is kept in front of the action.
#[inline]
pub fn with_action(url: &Url, term: &str) -> Result<Url, Error> {
    Url::parse(&format!("{}?action={}", url, term)).map_err(Error::from)
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(first: &Url, second: &Url) -> bool {
    first.scheme() == second.scheme()
        && first.host_str() == second.host_str()
        && first.port_or_known_default() == second.port_or_known_default()
}

/// Normalize a Keystone URI to its v2.0 API root.
pub fn keystone_root(uri: &str) -> Result<Url, Error> {
    let mut url = Url::parse(uri)?;
    let mut path = url.path().trim_end_matches('/').to_string();
    if !path.ends_with("/v2.0") {
        path.push_str("/v2.0");
    }
    url.set_path(&path);
    Ok(url)
}

/// Append a path segment to a URL without a trailing slash.
#[inline]
pub fn append(url: &Url, segment: &str) -> Result<Url, Error> {
    Url::parse(&format!("{}/{}", url.as_str().trim_end_matches('/'), segment))
        .map_err(Error::from)
}
