// Copyright 2021 Dmitry Tantsur <dtantsur@protonmail.com>
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

//! OCCI client.

use std::sync::Arc;

use log::{debug, trace};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::{Method, StatusCode, Url};
use static_assertions::assert_impl_all;

use super::auth::{self, Authentication};
use super::builder::EntityBuilder;
use super::category::Kind;
use super::connection::ConnectionContext;
use super::entity::{ActionInstance, Collection, Entity};
use super::model::{CollectionType, Model};
use super::render::{MediaType, Renderer, Rendering, TextRenderer};
use super::transport::{Connector, HttpConnector, Request, Response};
use super::url;
use super::{Error, ErrorKind};

/// An OCCI client bound to one endpoint.
///
/// The client connects lazily: the first operation authenticates against the server and
/// downloads its category model. Operations are sequential and take `&mut self`, use one client
/// per concurrent task.
///
/// ```rust,no_run
/// # async fn example() -> Result<(), occi_client::Error> {
/// use occi_client::{Authentication, Client, MediaType};
///
/// let mut client = Client::new(
///     "https://occi.example.com:11443",
///     Authentication::basic("user", "pa$$w0rd"),
///     MediaType::TextPlain,
/// )?;
/// let locations = client.list(Some("compute")).await?;
/// for entity in client.describe(Some("compute")).await? {
///     println!("{} {:?}", entity.id(), entity.title());
/// }
/// # Ok(()) }
/// # #[tokio::main]
/// # async fn main() { example().await.unwrap(); }
/// ```
#[derive(Debug)]
pub struct Client {
    endpoint: Url,
    auth: Authentication,
    media_type: MediaType,
    renderer: Box<dyn Renderer>,
    connector: Box<dyn Connector>,
    model: Model,
    connection: Option<ConnectionContext>,
}

assert_impl_all!(Client: Send, Sync);

fn unknown_type(target: &str) -> Error {
    Error::new(
        ErrorKind::UnknownCategory,
        format!("unknown resource type '{}'", target),
    )
}

fn unknown_identifier(target: &str) -> Error {
    Error::new(
        ErrorKind::UnknownCategory,
        format!("unknown resource identifier '{}'", target),
    )
}

/// Whether the target is a short category name rather than an identifier or a location.
fn is_term(target: &str) -> bool {
    !target.contains(|c| matches!(c, '#' | '/' | ':'))
}

fn media_headers(media_type: MediaType) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_static(media_type.as_str());
    let _ = headers.insert(ACCEPT, value.clone());
    let _ = headers.insert(CONTENT_TYPE, value);
    headers
}

fn check_renderable(media_type: MediaType) -> Result<(), Error> {
    if media_type.is_renderable() {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::InvalidInput,
            format!("{} cannot be used to talk to a server", media_type),
        ))
    }
}

fn expect_status(response: Response, expected: StatusCode) -> Result<Response, Error> {
    if response.status == expected {
        return Ok(response);
    }

    let body = response.body.trim();
    let message = if body.is_empty() {
        response.status.to_string()
    } else {
        format!("{}\n{}", response.status, body)
    };
    debug!("Expected {}, got {}", expected, message);
    Err(Error::new(ErrorKind::ProtocolError, message).with_status(response.status))
}

fn with_rendering(request: Request, rendering: Rendering) -> Request {
    match rendering {
        Rendering::Headers(headers) => request.with_headers(headers),
        Rendering::Body(body) => request.with_body(body),
    }
}

impl Client {
    /// Create a client without connecting.
    ///
    /// Fails if the endpoint is not a valid URL or the media type cannot be used for requests.
    pub fn new<U>(
        endpoint: U,
        auth: Authentication,
        media_type: MediaType,
    ) -> Result<Client, Error>
    where
        U: AsRef<str>,
    {
        let endpoint = Url::parse(endpoint.as_ref())
            .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("invalid endpoint: {}", e)))?;
        if !endpoint.has_host() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("endpoint {} has no host", endpoint),
            ));
        }
        check_renderable(media_type)?;
        Ok(Client {
            endpoint,
            auth,
            media_type,
            renderer: Box::new(TextRenderer::new()),
            connector: Box::new(HttpConnector::new()),
            model: Model::new(),
            connection: None,
        })
    }

    /// Create a client and connect it right away.
    pub async fn connect_new<U>(
        endpoint: U,
        auth: Authentication,
        media_type: MediaType,
    ) -> Result<Client, Error>
    where
        U: AsRef<str>,
    {
        let mut client = Client::new(endpoint, auth, media_type)?;
        client.connect().await?;
        Ok(client)
    }

    /// Use a different connector, e.g. one with custom timeouts.
    #[inline]
    pub fn with_connector<C: Connector + 'static>(mut self, connector: C) -> Client {
        self.connector = Box::new(connector);
        self
    }

    /// Use a different renderer.
    #[inline]
    pub fn with_renderer<R: Renderer + 'static>(mut self, renderer: R) -> Client {
        self.renderer = Box::new(renderer);
        self
    }

    /// Endpoint of the server.
    #[inline]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Authentication in use.
    #[inline]
    pub fn authentication(&self) -> &Authentication {
        &self.auth
    }

    /// Media type used for requests.
    #[inline]
    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Change the media type, also for an established connection.
    pub fn set_media_type(&mut self, media_type: MediaType) -> Result<(), Error> {
        check_renderable(media_type)?;
        self.media_type = media_type;
        if let Some(ref mut connection) = self.connection {
            for (name, value) in media_headers(media_type) {
                if let Some(name) = name {
                    connection.set_header(name, value);
                }
            }
        }
        Ok(())
    }

    /// Whether a connection is established.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Current connection, if any.
    #[inline]
    pub fn connection(&self) -> Option<&ConnectionContext> {
        self.connection.as_ref()
    }

    /// Current category model.
    ///
    /// Empty until the client connects.
    #[inline]
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Mutable access to the category model, e.g. to add local mixins.
    #[inline]
    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    /// Replace the category model.
    #[inline]
    pub fn set_model(&mut self, model: Model) {
        self.model = model;
    }

    /// Entity builder for the current model.
    #[inline]
    pub fn entity_builder(&self) -> EntityBuilder<'_> {
        EntityBuilder::new(&self.model)
    }

    /// Authenticate and download the category model.
    ///
    /// Headers installed by a previous authentication (e.g. a Keystone token) are kept. The
    /// previous connection stays in place if the negotiation fails.
    pub async fn connect(&mut self) -> Result<(), Error> {
        let mut headers = self
            .connection
            .as_ref()
            .map(|c| c.headers().clone())
            .unwrap_or_default();
        headers.extend(media_headers(self.media_type));

        let connection =
            auth::negotiate(&self.auth, self.connector.as_ref(), &self.endpoint, headers).await?;
        self.connection = Some(connection);
        self.fetch_model().await
    }

    /// Drop the connection.
    ///
    /// The next operation connects again.
    pub fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            debug!("Disconnected from {}", self.endpoint);
        }
    }

    /// Download the category model again without authenticating.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        if self.connection.is_none() {
            self.connect().await
        } else {
            self.fetch_model().await
        }
    }

    /// List instance locations.
    ///
    /// Without a target lists everything the server exposes at its root. The target is a kind term
    /// or a kind identifier.
    pub async fn list(&mut self, target: Option<&str>) -> Result<Vec<String>, Error> {
        self.ensure_connected().await?;
        let url = match target {
            Some(target) => {
                let kind = self
                    .find_kind(target)?
                    .ok_or_else(|| unknown_identifier(target))?;
                self.kind_url(&kind)?
            }
            None => url::server_path(&self.endpoint, "/")?,
        };
        self.fetch_locations(url).await
    }

    /// Fetch entities.
    ///
    /// The target can be a kind term, a kind identifier or an instance location. Without a target
    /// every location the server exposes is fetched. Links are returned before resources.
    pub async fn describe(&mut self, target: Option<&str>) -> Result<Vec<Entity>, Error> {
        self.ensure_connected().await?;
        let mut collection = Collection::default();
        match target {
            Some(target) => match self.find_kind(target)? {
                Some(kind) => {
                    let collection_type = self.model.collection_type_of(&kind)?;
                    let url = self.kind_url(&kind)?;
                    let locations = self.fetch_locations(url).await?;
                    for location in locations {
                        let url = url::server_path(&self.endpoint, &location)?;
                        collection.merge(self.fetch_collection(url, collection_type).await?);
                    }
                }
                None => {
                    let url = url::full_uri(&self.endpoint, target)?;
                    collection = self.describe_url(url).await?;
                }
            },
            None => {
                let root = url::server_path(&self.endpoint, "/")?;
                for location in self.fetch_locations(root).await? {
                    let url = url::server_path(&self.endpoint, &location)?;
                    collection.merge(self.describe_url(url).await?);
                }
            }
        }
        debug!(
            "Described {} resource(s) and {} link(s)",
            collection.resources.len(),
            collection.links.len()
        );
        Ok(collection.into_entities())
    }

    /// Create an entity and return its location.
    pub async fn create(&mut self, entity: &Entity) -> Result<String, Error> {
        self.ensure_connected().await?;
        let url = self.kind_url(entity.kind())?;
        let rendering = self.renderer.render_entity(self.media_type, entity)?;
        let request = with_rendering(Request::new(Method::POST, url), rendering);
        let response = expect_status(self.send(request).await?, StatusCode::CREATED)?;

        let declared = response.content_type().map(MediaType::from_content_type);
        let media_type = match declared {
            Some(Ok(media_type)) if media_type == self.media_type => media_type,
            _ if response.body.trim() == "OK" && response.headers.contains_key(LOCATION) => {
                debug!("Server returned a bare OK with a Location header, reading it as text/occi");
                MediaType::TextOcci
            }
            Some(declared) => declared?,
            None => self.media_type,
        };

        self.renderer
            .parse_locations(media_type, &response.body, &response.headers)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::new(ErrorKind::InvalidResponse, "no location returned"))
    }

    /// Delete every instance of a kind or a single instance.
    ///
    /// Returns whether the server answered with 200.
    pub async fn delete(&mut self, target: &str) -> Result<bool, Error> {
        self.ensure_connected().await?;
        let url = self.target_url(target)?;
        let response = self.send(Request::new(Method::DELETE, url)).await?;
        Ok(response.status == StatusCode::OK)
    }

    /// Trigger an action on every instance of a kind or on a single instance.
    ///
    /// Returns whether the server answered with 200.
    pub async fn trigger(&mut self, target: &str, action: &ActionInstance) -> Result<bool, Error> {
        self.ensure_connected().await?;
        let url = url::with_action(&self.target_url(target)?, &action.action.category.term)?;
        let rendering = self.renderer.render_action(self.media_type, action)?;
        let request = with_rendering(Request::new(Method::POST, url), rendering);
        let response = self.send(request).await?;
        Ok(response.status == StatusCode::OK)
    }

    async fn ensure_connected(&mut self) -> Result<(), Error> {
        if self.connection.is_none() {
            debug!("Not connected to {} yet, connecting", self.endpoint);
            self.connect().await?;
        }
        Ok(())
    }

    async fn send(&mut self, request: Request) -> Result<Response, Error> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| Error::new(ErrorKind::ProtocolError, "not connected"))?;
        trace!("Sending {} {}", request.method, request.url);
        let response = connection.send(request).await?;
        trace!("Received {}", response.status);
        Ok(response)
    }

    async fn get(&mut self, url: Url) -> Result<Response, Error> {
        expect_status(self.send(Request::new(Method::GET, url)).await?, StatusCode::OK)
    }

    fn response_media_type(&self, response: &Response) -> Result<MediaType, Error> {
        Ok(response
            .content_type()
            .map(MediaType::from_content_type)
            .transpose()?
            .unwrap_or(self.media_type))
    }

    async fn fetch_model(&mut self) -> Result<(), Error> {
        let url = url::server_path(&self.endpoint, auth::MODEL_PATH)?;
        let response = self.get(url).await?;
        let media_type = self.response_media_type(&response)?;
        self.model = self
            .renderer
            .parse_model(media_type, &response.body, &response.headers)?;
        debug!(
            "Received a model with {} categories from {}",
            self.model.len(),
            self.endpoint
        );
        Ok(())
    }

    async fn fetch_locations(&mut self, url: Url) -> Result<Vec<String>, Error> {
        let response = self.get(url).await?;
        let media_type = self.response_media_type(&response)?;
        let locations = self
            .renderer
            .parse_locations(media_type, &response.body, &response.headers)?;
        trace!("Received locations {:?}", locations);
        Ok(locations)
    }

    async fn fetch_collection(
        &mut self,
        url: Url,
        collection_type: CollectionType,
    ) -> Result<Collection, Error> {
        let response = self.get(url).await?;
        let media_type = self.response_media_type(&response)?;
        self.renderer.parse_collection(
            media_type,
            &response.body,
            &response.headers,
            &self.model,
            collection_type,
        )
    }

    /// Fetch a single location, deriving its kind from the path.
    async fn describe_url(&mut self, url: Url) -> Result<Collection, Error> {
        let kind = self
            .model
            .find_kind_by_location(url.as_str())
            .cloned()
            .ok_or_else(|| unknown_identifier(url.as_str()))?;
        let collection_type = self.model.collection_type_of(&kind)?;
        self.fetch_collection(url, collection_type).await
    }

    /// Kind named by a term or an identifier.
    ///
    /// An unknown term is an error, an unknown identifier is not.
    fn find_kind(&self, target: &str) -> Result<Option<Arc<Kind>>, Error> {
        if is_term(target) {
            self.model
                .resolve_kind(target)?
                .cloned()
                .map(Some)
                .ok_or_else(|| unknown_type(target))
        } else {
            Ok(self.model.find_kind(target).cloned())
        }
    }

    fn kind_url(&self, kind: &Kind) -> Result<Url, Error> {
        let location = kind.location.as_deref().ok_or_else(|| {
            Error::new(
                ErrorKind::UnknownCategory,
                format!("kind '{}' has no location", kind.category.identifier()),
            )
        })?;
        url::server_path(&self.endpoint, location)
    }

    /// Location of a kind or of a literal instance.
    fn target_url(&self, target: &str) -> Result<Url, Error> {
        match self.find_kind(target)? {
            Some(kind) => self.kind_url(&kind),
            None => url::full_uri(&self.endpoint, target),
        }
    }
}
