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

//! Authentication strategies.
//!
//! An [Authentication](struct.Authentication.html) describes how to reach an OCCI server: which
//! credentials or client certificate to present and which certificate authorities to trust.
//! Password and certificate strategies fall back to Keystone when the server answers the probe
//! with a Keystone challenge:
//!
//! ```rust
//! let auth = occi_client::auth::Authentication::basic("user", "pa$$w0rd")
//!     .with_ca_file("/etc/ssl/certs/occi-ca.pem");
//! assert_eq!(auth.name(), "basic");
//! assert!(auth.fallback().is_some());
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use static_assertions::assert_impl_all;

use super::connection::Credentials;
use super::tls::{ClientCertificate, TlsSettings, Trust};
use super::utils::secret_hash;
use super::{Error, ErrorKind};

mod keystone;
mod negotiate;
mod protocol;

pub(crate) use negotiate::{negotiate, MODEL_PATH};

/// Authentication method.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// No authentication.
    None,
    /// HTTP basic authentication.
    Basic {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
    /// HTTP digest authentication.
    Digest {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
    /// TLS client certificate.
    X509 {
        /// Path to a PEM or PKCS#12 (`.p12`) file.
        certificate: PathBuf,
        /// Certificate password.
        password: String,
    },
    /// VOMS proxy certificate (PEM, no password).
    Voms {
        /// Path to the proxy certificate.
        certificate: PathBuf,
    },
    /// Keystone token exchange on behalf of another method.
    Keystone {
        /// Method providing credentials for Keystone.
        original: Box<AuthMethod>,
    },
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthMethod::None => f.write_str("None"),
            AuthMethod::Basic { username, password } => write!(
                f,
                "Basic {{ username: {}, password: hash({}) }}",
                username,
                secret_hash(password)
            ),
            AuthMethod::Digest { username, password } => write!(
                f,
                "Digest {{ username: {}, password: hash({}) }}",
                username,
                secret_hash(password)
            ),
            AuthMethod::X509 {
                certificate,
                password,
            } => write!(
                f,
                "X509 {{ certificate: {:?}, password: hash({}) }}",
                certificate,
                secret_hash(password)
            ),
            AuthMethod::Voms { certificate } => {
                write!(f, "Voms {{ certificate: {:?} }}", certificate)
            }
            AuthMethod::Keystone { original } => {
                write!(f, "Keystone {{ original: {:?} }}", original)
            }
        }
    }
}

impl AuthMethod {
    fn name(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::Basic { .. } => "basic",
            AuthMethod::Digest { .. } => "digest",
            AuthMethod::X509 { .. } => "x509",
            AuthMethod::Voms { .. } => "voms",
            AuthMethod::Keystone { .. } => "keystone",
        }
    }

    fn identity(&self) -> Option<ClientCertificate> {
        match self {
            AuthMethod::X509 {
                certificate,
                password,
            } => Some(ClientCertificate::new(certificate.clone(), password.clone())),
            AuthMethod::Voms { certificate } => Some(ClientCertificate::new(certificate.clone(), "")),
            AuthMethod::Keystone { original } => original.identity(),
            _ => None,
        }
    }

    fn credentials(&self) -> Option<Credentials> {
        match self {
            AuthMethod::Basic { username, password } => Some(Credentials::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            AuthMethod::Digest { username, password } => Some(Credentials::Digest {
                username: username.clone(),
                password: password.clone(),
            }),
            AuthMethod::Keystone { original } => original.credentials(),
            _ => None,
        }
    }
}

/// Authentication against an OCCI server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authentication {
    method: AuthMethod,
    trust: Trust,
}

assert_impl_all!(Authentication: Send, Sync);

impl Default for Authentication {
    fn default() -> Authentication {
        Authentication::none()
    }
}

impl Authentication {
    fn from_method(method: AuthMethod) -> Authentication {
        Authentication {
            method,
            trust: Trust::default(),
        }
    }

    /// No authentication.
    #[inline]
    pub fn none() -> Authentication {
        Authentication::from_method(AuthMethod::None)
    }

    /// HTTP basic authentication.
    pub fn basic<S1, S2>(username: S1, password: S2) -> Authentication
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Authentication::from_method(AuthMethod::Basic {
            username: username.into(),
            password: password.into(),
        })
    }

    /// HTTP digest authentication.
    pub fn digest<S1, S2>(username: S1, password: S2) -> Authentication
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Authentication::from_method(AuthMethod::Digest {
            username: username.into(),
            password: password.into(),
        })
    }

    /// TLS client certificate authentication.
    ///
    /// Fails if the password is empty.
    pub fn x509<P, S>(certificate: P, password: S) -> Result<Authentication, Error>
    where
        P: Into<PathBuf>,
        S: Into<String>,
    {
        let password = password.into();
        if password.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "X509 authentication requires a certificate password",
            ));
        }
        Ok(Authentication::from_method(AuthMethod::X509 {
            certificate: certificate.into(),
            password,
        }))
    }

    /// VOMS proxy certificate authentication.
    pub fn voms<P: Into<PathBuf>>(certificate: P) -> Authentication {
        Authentication::from_method(AuthMethod::Voms {
            certificate: certificate.into(),
        })
    }

    /// Keystone token exchange using the credentials of another authentication.
    ///
    /// This method cannot be used to connect directly, it is only reachable as a fallback.
    pub fn keystone(original: Authentication) -> Authentication {
        Authentication {
            method: AuthMethod::Keystone {
                original: Box::new(original.method),
            },
            trust: original.trust,
        }
    }

    /// Trust CA certificates from a PEM file instead of the system roots.
    ///
    /// Takes precedence over [with_ca_path](#method.with_ca_path).
    #[inline]
    pub fn with_ca_file<P: Into<PathBuf>>(mut self, path: P) -> Authentication {
        self.trust.ca_file = Some(path.into());
        self
    }

    /// Trust every `*.pem` file in a directory instead of the system roots.
    #[inline]
    pub fn with_ca_path<P: Into<PathBuf>>(mut self, path: P) -> Authentication {
        self.trust.ca_path = Some(path.into());
        self
    }

    /// Authentication method.
    #[inline]
    pub fn method(&self) -> &AuthMethod {
        &self.method
    }

    /// Trust settings.
    #[inline]
    pub fn trust(&self) -> &Trust {
        &self.trust
    }

    /// Client certificate path, if any.
    pub fn certificate(&self) -> Option<&Path> {
        match self.method {
            AuthMethod::X509 {
                ref certificate, ..
            }
            | AuthMethod::Voms { ref certificate } => Some(certificate),
            _ => None,
        }
    }

    /// Short name of the method.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.method.name()
    }

    /// Authentication to try when the server sends a Keystone challenge.
    pub fn fallback(&self) -> Option<Authentication> {
        match self.method {
            AuthMethod::Basic { .. }
            | AuthMethod::Digest { .. }
            | AuthMethod::X509 { .. }
            | AuthMethod::Voms { .. } => Some(Authentication::keystone(self.clone())),
            AuthMethod::None | AuthMethod::Keystone { .. } => None,
        }
    }

    /// Whether a connection can be established with this method alone.
    #[inline]
    pub fn is_transport_capable(&self) -> bool {
        !matches!(self.method, AuthMethod::Keystone { .. })
    }

    pub(crate) fn tls_settings(&self) -> TlsSettings {
        TlsSettings {
            trust: self.trust.clone(),
            identity: self.method.identity(),
        }
    }

    pub(crate) fn credentials(&self) -> Option<Credentials> {
        self.method.credentials()
    }

    /// Keystone request body for this method and an optional tenant.
    pub(crate) fn keystone_payload(
        &self,
        tenant: Option<&str>,
    ) -> Result<protocol::AuthRoot, Error> {
        let original = match self.method {
            AuthMethod::Keystone { ref original } => original.as_ref(),
            ref other => other,
        };
        let mut auth = match original {
            AuthMethod::Voms { .. } | AuthMethod::X509 { .. } => protocol::Auth::voms(),
            AuthMethod::Basic { username, password } | AuthMethod::Digest { username, password } => {
                protocol::Auth::password(username, password)
            }
            _ => {
                return Err(Error::new(
                    ErrorKind::AuthenticationFailed,
                    format!(
                        "{} authentication cannot be used with Keystone",
                        original.name()
                    ),
                ))
            }
        };
        auth.tenant_name = tenant.map(From::from);
        Ok(protocol::AuthRoot { auth })
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::path::Path;

    use super::{AuthMethod, Authentication};
    use crate::connection::Credentials;
    use crate::ErrorKind;

    #[test]
    fn test_fallback() {
        let none = Authentication::none();
        assert!(none.fallback().is_none());

        for auth in &[
            Authentication::basic("u", "p"),
            Authentication::digest("u", "p"),
            Authentication::x509("/tmp/u.pem", "p").unwrap(),
            Authentication::voms("/tmp/x509up_u1000"),
        ] {
            let fallback = auth.fallback().unwrap();
            assert_eq!(fallback.name(), "keystone");
            assert!(!fallback.is_transport_capable());
            assert!(fallback.fallback().is_none());
            assert!(auth.is_transport_capable());
        }
    }

    #[test]
    fn test_x509_requires_password() {
        let err = Authentication::x509("/tmp/u.p12", "").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_tls_settings() {
        let auth = Authentication::voms("/tmp/proxy").with_ca_path("/etc/grid-security/certificates");
        let settings = auth.tls_settings();
        assert_eq!(
            settings.identity.unwrap().path(),
            Path::new("/tmp/proxy")
        );
        assert!(settings.trust.is_custom());

        let keystone = auth.fallback().unwrap();
        assert_eq!(keystone.trust(), auth.trust());
        assert!(keystone.tls_settings().identity.is_some());
        assert!(Authentication::basic("u", "p").tls_settings().identity.is_none());
    }

    #[test]
    fn test_credentials() {
        assert_eq!(
            Authentication::digest("u", "p").credentials(),
            Some(Credentials::Digest {
                username: "u".into(),
                password: "p".into()
            })
        );
        assert!(Authentication::voms("/tmp/proxy").credentials().is_none());
    }

    #[test]
    fn test_keystone_payload() {
        let basic = Authentication::basic("user", "secret").fallback().unwrap();
        let body = serde_json::to_value(basic.keystone_payload(None).unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "auth": {"passwordCredentials": {"username": "user", "password": "secret"}}
            })
        );

        let voms = Authentication::voms("/tmp/proxy").fallback().unwrap();
        let body = serde_json::to_value(voms.keystone_payload(Some("tenant1")).unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"auth": {"voms": true, "tenantName": "tenant1"}})
        );

        let err = Authentication::none().keystone_payload(None).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let auth = Authentication::basic("user", "very-secret");
        assert!(!format!("{:?}", auth).contains("very-secret"));
        let auth = Authentication::x509("/tmp/u.p12", "very-secret")
            .unwrap()
            .fallback()
            .unwrap();
        let text = format!("{:?}", auth);
        assert!(text.contains("Keystone"));
        assert!(!text.contains("very-secret"));
        assert!(matches!(auth.method(), AuthMethod::Keystone { .. }));
    }
}
