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

//! Support for `OCCI_` environment variables.

use std::env;

use super::config::{self, CloudConfig};
use crate::{Client, Error, ErrorKind};

// This is only used for unit testing.
trait Environment {
    fn get(&self, name: &'static str) -> Result<String, Error>;
}

#[derive(Debug, Clone, Copy)]
struct RealEnvironment;

impl Environment for RealEnvironment {
    fn get(&self, name: &'static str) -> Result<String, Error> {
        env::var(name).map_err(|_| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("Required environment variable {} is not provided", name),
            )
        })
    }
}

#[inline]
fn cloud_from_env<E: Environment>(env: &E) -> Result<CloudConfig, Error> {
    Ok(CloudConfig {
        endpoint: env.get("OCCI_ENDPOINT")?,
        auth_type: env.get("OCCI_AUTH_TYPE").ok(),
        username: env.get("OCCI_USERNAME").ok(),
        password: env.get("OCCI_PASSWORD").ok(),
        certificate: env.get("OCCI_CERTIFICATE").ok().map(From::from),
        certificate_password: env.get("OCCI_CERTIFICATE_PASSWORD").ok(),
        cacert: env.get("OCCI_CACERT").ok().map(From::from),
        capath: env.get("OCCI_CAPATH").ok().map(From::from),
        media_type: env.get("OCCI_MEDIA_TYPE").ok(),
    })
}

#[inline]
fn _from_env<E: Environment>(env: E) -> Result<Client, Error> {
    if let Ok(cloud_name) = env.get("OCCI_CLOUD") {
        return config::from_config(cloud_name);
    }

    cloud_from_env(&env)?.client()
}

/// Create a `Client` from environment variables.
///
/// `OCCI_ENDPOINT` is required. Supported values of `OCCI_AUTH_TYPE` are `none` (the default),
/// `basic`, `digest`, `x509` and `voms`. When `OCCI_CLOUD` is set, the named cloud is loaded
/// from `occi.yaml` instead.
pub fn from_env() -> Result<Client, Error> {
    _from_env(RealEnvironment)
}

#[cfg(test)]
pub mod test {
    use std::collections::HashMap;
    use std::path::Path;

    use maplit::hashmap;

    use super::{Environment, _from_env};
    use crate::auth::AuthMethod;
    use crate::{Error, ErrorKind, MediaType};

    impl Environment for HashMap<&'static str, &'static str> {
        fn get(&self, name: &'static str) -> Result<String, Error> {
            self.get(name)
                .cloned()
                .map(From::from)
                .ok_or_else(|| Error::new(ErrorKind::InvalidInput, name))
        }
    }

    #[test]
    fn test_none() {
        let env = hashmap! {
            "OCCI_ENDPOINT" => "https://occi.example.com:11443",
        };

        let client = _from_env(env).unwrap();
        assert_eq!(client.authentication().method(), &AuthMethod::None);
        assert_eq!(client.media_type(), MediaType::TextPlain);
        assert_eq!(client.endpoint().port(), Some(11443));
    }

    #[test]
    fn test_basic() {
        let env = hashmap! {
            "OCCI_ENDPOINT" => "https://occi.example.com",
            "OCCI_AUTH_TYPE" => "basic",
            "OCCI_USERNAME" => "admin",
            "OCCI_PASSWORD" => "password",
            "OCCI_MEDIA_TYPE" => "text/occi",
        };

        let client = _from_env(env).unwrap();
        assert_eq!(client.authentication().name(), "basic");
        assert_eq!(client.media_type(), MediaType::TextOcci);
    }

    #[test]
    fn test_digest_missing_password() {
        let env = hashmap! {
            "OCCI_ENDPOINT" => "https://occi.example.com",
            "OCCI_AUTH_TYPE" => "digest",
            "OCCI_USERNAME" => "admin",
        };

        let err = _from_env(env).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_x509() {
        let env = hashmap! {
            "OCCI_ENDPOINT" => "https://occi.example.com",
            "OCCI_AUTH_TYPE" => "x509",
            "OCCI_CERTIFICATE" => "/home/user/.globus/usercert.p12",
            "OCCI_CERTIFICATE_PASSWORD" => "secret",
            "OCCI_CAPATH" => "/etc/grid-security/certificates",
        };

        let client = _from_env(env).unwrap();
        let auth = client.authentication();
        assert_eq!(auth.name(), "x509");
        assert_eq!(
            auth.certificate(),
            Some(Path::new("/home/user/.globus/usercert.p12"))
        );
        assert_eq!(
            auth.trust().ca_path.as_deref(),
            Some(Path::new("/etc/grid-security/certificates"))
        );
    }

    #[test]
    fn test_x509_without_password() {
        let env = hashmap! {
            "OCCI_ENDPOINT" => "https://occi.example.com",
            "OCCI_AUTH_TYPE" => "x509",
            "OCCI_CERTIFICATE" => "/home/user/.globus/usercert.pem",
        };

        let err = _from_env(env).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_voms() {
        let env = hashmap! {
            "OCCI_ENDPOINT" => "https://occi.example.com",
            "OCCI_AUTH_TYPE" => "voms",
            "OCCI_CERTIFICATE" => "/tmp/x509up_u1000",
            "OCCI_CACERT" => "/etc/ssl/ca.pem",
        };

        let client = _from_env(env).unwrap();
        assert_eq!(client.authentication().name(), "voms");
        assert!(client.authentication().trust().is_custom());
    }

    #[test]
    fn test_missing_endpoint() {
        let env = hashmap! {
            "OCCI_AUTH_TYPE" => "none",
        };

        let err = _from_env(env).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.message(), "OCCI_ENDPOINT");
    }

    #[test]
    fn test_unsupported_auth_type() {
        let env = hashmap! {
            "OCCI_ENDPOINT" => "https://occi.example.com",
            "OCCI_AUTH_TYPE" => "keystone",
        };

        let err = _from_env(env).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }
}
