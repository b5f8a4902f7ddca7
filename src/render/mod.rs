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

//! Encoding and decoding of OCCI documents.

use std::fmt;
use std::str::FromStr;

use reqwest::header::HeaderMap;

use super::entity::{ActionInstance, Collection, Entity};
use super::model::{CollectionType, Model};
use super::{Error, ErrorKind};

mod text;

pub use text::TextRenderer;

/// Supported media types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaType {
    /// Everything is rendered in a line-oriented body.
    #[default]
    TextPlain,
    /// Everything is rendered in headers, the body is empty.
    TextOcci,
    /// A list of locations, one per line. Only used in responses.
    TextUriList,
}

impl MediaType {
    /// MIME type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::TextPlain => "text/plain",
            MediaType::TextOcci => "text/occi",
            MediaType::TextUriList => "text/uri-list",
        }
    }

    /// Parse a `Content-Type` value, ignoring any parameters after `;`.
    pub fn from_content_type(value: &str) -> Result<MediaType, Error> {
        let essence = value.split(';').next().unwrap_or_default();
        essence.parse()
    }

    /// Whether entities can be rendered with this media type.
    #[inline]
    pub fn is_renderable(&self) -> bool {
        !matches!(self, MediaType::TextUriList)
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<MediaType, Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text/plain" => Ok(MediaType::TextPlain),
            "text/occi" => Ok(MediaType::TextOcci),
            "text/uri-list" => Ok(MediaType::TextUriList),
            other => Err(Error::new(
                ErrorKind::InvalidResponse,
                format!("unsupported media type '{}'", other),
            )),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of rendering an entity or an action.
#[derive(Debug, Clone)]
pub enum Rendering {
    /// Rendered as request headers with an empty body.
    Headers(HeaderMap),
    /// Rendered as a request body.
    Body(String),
}

/// Encoder and decoder of OCCI documents.
pub trait Renderer: fmt::Debug + Send + Sync {
    /// Decode the model discovery document.
    fn parse_model(
        &self,
        media_type: MediaType,
        body: &str,
        headers: &HeaderMap,
    ) -> Result<Model, Error>;

    /// Decode a list of locations.
    fn parse_locations(
        &self,
        media_type: MediaType,
        body: &str,
        headers: &HeaderMap,
    ) -> Result<Vec<String>, Error>;

    /// Decode entities of the given shape.
    ///
    /// Categories are looked up in the model; unknown ones are reconstructed from the document.
    fn parse_collection(
        &self,
        media_type: MediaType,
        body: &str,
        headers: &HeaderMap,
        model: &Model,
        collection_type: CollectionType,
    ) -> Result<Collection, Error>;

    /// Encode an entity.
    fn render_entity(&self, media_type: MediaType, entity: &Entity) -> Result<Rendering, Error>;

    /// Encode an action invocation.
    fn render_action(
        &self,
        media_type: MediaType,
        action: &ActionInstance,
    ) -> Result<Rendering, Error>;
}
