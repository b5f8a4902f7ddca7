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

//! Error and result implementations.

use std::fmt;

use reqwest::StatusCode;

/// Kind of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Authentication failure.
    ///
    /// Covers rejected credentials, unusable trust or identity material, a missing
    /// authentication fallback and an exhausted Keystone tenant list.
    AuthenticationFailed,

    /// A short category name matches more than one category.
    AmbiguousIdentifier,

    /// A new entity cannot be built.
    EntityBuilding,

    /// A category, resource type or resource location is not known.
    UnknownCategory,

    /// Unexpected HTTP status or a failure of the underlying transport.
    ProtocolError,

    /// Response cannot be decoded.
    InvalidResponse,

    /// Request timed out.
    OperationTimedOut,

    /// Invalid value passed to one of the calls.
    InvalidInput,

    /// Invalid or missing configuration.
    InvalidConfig,
}

/// Error from an OCCI call.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: Option<StatusCode>,
}

impl ErrorKind {
    /// Short description of the error kind.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::AuthenticationFailed => "Failed to authenticate",
            ErrorKind::AmbiguousIdentifier => "Ambiguous category identifier",
            ErrorKind::EntityBuilding => "Cannot build an entity",
            ErrorKind::UnknownCategory => "Unknown category or resource",
            ErrorKind::ProtocolError => "Communication failure",
            ErrorKind::InvalidResponse => "Invalid response from the server",
            ErrorKind::OperationTimedOut => "Operation timed out",
            ErrorKind::InvalidInput => "Invalid input",
            ErrorKind::InvalidConfig => "Invalid configuration",
        }
    }

    /// Whether this kind belongs to the communication failure family.
    #[inline]
    pub fn is_communication(&self) -> bool {
        matches!(
            self,
            ErrorKind::AuthenticationFailed
                | ErrorKind::UnknownCategory
                | ErrorKind::ProtocolError
                | ErrorKind::InvalidResponse
                | ErrorKind::OperationTimedOut
        )
    }
}

impl Error {
    /// Create a new error of the provided kind.
    #[inline]
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Error {
        Error {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status code (if present).
    #[inline]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Whether the error is a communication failure (including authentication).
    #[inline]
    pub fn is_communication(&self) -> bool {
        self.kind.is_communication()
    }

    /// Add an HTTP status code to the error.
    #[inline]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Convert the error into one of a different kind, keeping the message.
    #[inline]
    pub(crate) fn into_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(status) = self.status {
            write!(f, "{}: {} (HTTP {})", self.kind, self.message, status)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl ::std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Error {
        let kind = if value.is_timeout() {
            ErrorKind::OperationTimedOut
        } else if value.is_decode() {
            ErrorKind::InvalidResponse
        } else if value.is_builder() {
            ErrorKind::InvalidInput
        } else {
            ErrorKind::ProtocolError
        };

        let error = Error::new(kind, value.to_string());
        if let Some(status) = value.status() {
            error.with_status(status)
        } else {
            error
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(value: url::ParseError) -> Error {
        Error::new(ErrorKind::InvalidInput, value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Error {
        Error::new(
            ErrorKind::InvalidResponse,
            format!("Cannot parse JSON: {}", value),
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Error {
        Error::new(ErrorKind::ProtocolError, value.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(value: http::header::InvalidHeaderValue) -> Error {
        Error::new(ErrorKind::InvalidInput, value.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(value: http::header::InvalidHeaderName) -> Error {
        Error::new(ErrorKind::InvalidInput, value.to_string())
    }
}
