// Copyright 2020 Dmitry Tantsur <dtantsur@protonmail.com>
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

//! Support for the `occi.yaml` configuration file.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::render::MediaType;
use crate::utils;
use crate::{Authentication, Client, Error, ErrorKind};

const CONFIG_FILE: &str = "occi.yaml";

/// Configuration of one OCCI endpoint.
///
/// This is the value type of the `clouds` mapping in `occi.yaml`:
///
/// ```yaml
/// clouds:
///   example:
///     endpoint: https://occi.example.com:11443
///     auth_type: basic
///     username: demo
///     password: secret
///     cacert: /etc/ssl/occi-ca.pem
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudConfig {
    /// OCCI endpoint URL.
    pub endpoint: String,
    /// One of `none` (the default), `basic`, `digest`, `x509` or `voms`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
    /// User name for `basic` and `digest`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password for `basic` and `digest`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Certificate file for `x509` and `voms`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<PathBuf>,
    /// Password of the `x509` certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_password: Option<String>,
    /// CA bundle to trust.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cacert: Option<PathBuf>,
    /// Directory with CA certificates to trust.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capath: Option<PathBuf>,
    /// Media type, `text/plain` by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Root {
    #[serde(default)]
    clouds: HashMap<String, CloudConfig>,
}

fn required<'a, T>(value: &'a Option<T>, auth_type: &str, what: &str) -> Result<&'a T, Error> {
    value.as_ref().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("{} authentication requires {}", auth_type, what),
        )
    })
}

impl CloudConfig {
    /// Configuration for an endpoint without authentication.
    pub fn new<S: Into<String>>(endpoint: S) -> CloudConfig {
        CloudConfig {
            endpoint: endpoint.into(),
            ..CloudConfig::default()
        }
    }

    /// Authentication described by this configuration.
    pub fn authentication(&self) -> Result<Authentication, Error> {
        let auth_type = self.auth_type.as_deref().unwrap_or("none");
        let auth = match auth_type {
            "none" => Authentication::none(),
            "basic" => Authentication::basic(
                required(&self.username, auth_type, "a user name")?,
                required(&self.password, auth_type, "a password")?,
            ),
            "digest" => Authentication::digest(
                required(&self.username, auth_type, "a user name")?,
                required(&self.password, auth_type, "a password")?,
            ),
            "x509" => Authentication::x509(
                required(&self.certificate, auth_type, "a certificate")?,
                self.certificate_password.clone().unwrap_or_default(),
            )?,
            "voms" => Authentication::voms(required(&self.certificate, auth_type, "a certificate")?),
            other => {
                return Err(Error::new(
                    ErrorKind::InvalidConfig,
                    format!("Unsupported authentication type: {}", other),
                ))
            }
        };

        let auth = match self.cacert {
            Some(ref cacert) => auth.with_ca_file(cacert),
            None => auth,
        };
        Ok(match self.capath {
            Some(ref capath) => auth.with_ca_path(capath),
            None => auth,
        })
    }

    /// Media type described by this configuration.
    pub fn media_type(&self) -> Result<MediaType, Error> {
        match self.media_type {
            Some(ref value) => value
                .parse()
                .map_err(|e: Error| e.into_kind(ErrorKind::InvalidConfig)),
            None => Ok(MediaType::default()),
        }
    }

    /// Create a client from this configuration without connecting.
    pub fn client(&self) -> Result<Client, Error> {
        Client::new(&self.endpoint, self.authentication()?, self.media_type()?)
    }
}

impl fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CloudConfig")
            .field("endpoint", &self.endpoint)
            .field("auth_type", &self.auth_type)
            .field("username", &self.username)
            .field(
                "password",
                &self.password.as_deref().map(utils::secret_hash),
            )
            .field("certificate", &self.certificate)
            .field(
                "certificate_password",
                &self.certificate_password.as_deref().map(utils::secret_hash),
            )
            .field("cacert", &self.cacert)
            .field("capath", &self.capath)
            .field("media_type", &self.media_type)
            .finish()
    }
}

fn candidates() -> Vec<PathBuf> {
    let mut result = vec![PathBuf::from(CONFIG_FILE)];
    if let Some(mut home) = dirs::home_dir() {
        home.push(".config/occi");
        home.push(CONFIG_FILE);
        result.push(home);
    } else {
        warn!("Cannot find home directory");
    }
    result.push(Path::new("/etc/occi").join(CONFIG_FILE));
    result
}

fn find_config(candidates: Vec<PathBuf>) -> Option<PathBuf> {
    candidates.into_iter().find(|path| path.is_file())
}

fn read_cloud(path: &Path, name: &str) -> Result<CloudConfig, Error> {
    debug!("Loading cloud {} from {}", name, path.display());
    let content = File::open(path).map_err(|e| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Cannot read {}: {}", path.display(), e),
        )
    })?;

    let mut root: Root = serde_yaml::from_reader(content).map_err(|e| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Cannot parse {}: {}", path.display(), e),
        )
    })?;

    root.clouds
        .remove(name)
        .ok_or_else(|| Error::new(ErrorKind::InvalidConfig, format!("No such cloud: {}", name)))
}

/// Load a cloud configuration from `occi.yaml`.
///
/// The file is searched in the current directory, `~/.config/occi` and `/etc/occi`, the first
/// one found is used.
pub fn cloud_config<S: AsRef<str>>(cloud_name: S) -> Result<CloudConfig, Error> {
    let path = find_config(candidates()).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("{} was not found in any location", CONFIG_FILE),
        )
    })?;
    read_cloud(&path, cloud_name.as_ref())
}

/// Create a `Client` from the `occi.yaml` configuration file.
pub fn from_config<S: AsRef<str>>(cloud_name: S) -> Result<Client, Error> {
    cloud_config(cloud_name)?.client()
}
