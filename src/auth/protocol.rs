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

//! JSON structures for the Identity V2 API.

#![allow(missing_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::secret_hash;

#[derive(Clone, Serialize)]
pub struct PasswordCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "PasswordCredentials {{ username: {}, password: hash({}) }}",
            self.username,
            secret_hash(&self.password)
        )
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Auth {
    #[serde(rename = "passwordCredentials", skip_serializing_if = "Option::is_none")]
    pub password_credentials: Option<PasswordCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voms: Option<bool>,
    #[serde(rename = "tenantName", skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
}

impl Auth {
    pub fn voms() -> Auth {
        Auth {
            password_credentials: None,
            voms: Some(true),
            tenant_name: None,
        }
    }

    pub fn password(username: &str, password: &str) -> Auth {
        Auth {
            password_credentials: Some(PasswordCredentials {
                username: username.to_string(),
                password: password.to_string(),
            }),
            voms: None,
            tenant_name: None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct AuthRoot {
    pub auth: Auth,
}

#[derive(Deserialize)]
pub struct Token {
    pub id: String,
}

#[derive(Deserialize)]
pub struct Access {
    pub token: Token,
}

#[derive(Deserialize)]
pub struct TokenRoot {
    pub access: Access,
}

#[derive(Debug, Deserialize)]
pub struct Tenant {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TenantsRoot {
    #[serde(default)]
    pub tenants: Vec<Tenant>,
}
