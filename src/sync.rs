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

//! Blocking client.
//!
//! A thin wrapper around [Client](../struct.Client.html) that runs every call to completion on a
//! private single-threaded runtime:
//!
//! ```rust,no_run
//! use occi_client::sync::SyncClient;
//! use occi_client::{Authentication, MediaType};
//!
//! let mut client = SyncClient::new(
//!     "https://occi.example.com:11443",
//!     Authentication::none(),
//!     MediaType::TextPlain,
//! )
//! .expect("Cannot create a client");
//! let compute = client.entity_builder().new_compute();
//! let location = client.create(&compute.into()).expect("Cannot create a VM");
//! println!("Created {}", location);
//! ```
//!
//! Do not use it from inside an asynchronous runtime.

use tokio::runtime::{Builder, Runtime};

use super::builder::EntityBuilder;
use super::entity::{ActionInstance, Entity};
use super::model::Model;
use super::render::MediaType;
use super::{Authentication, Client, Error, ErrorKind};

/// A blocking OCCI client.
#[derive(Debug)]
pub struct SyncClient {
    inner: Client,
    runtime: Runtime,
}

impl SyncClient {
    /// Create a blocking client without connecting.
    pub fn new<U>(
        endpoint: U,
        auth: Authentication,
        media_type: MediaType,
    ) -> Result<SyncClient, Error>
    where
        U: AsRef<str>,
    {
        SyncClient::from_client(Client::new(endpoint, auth, media_type)?)
    }

    /// Create a blocking client and connect it right away.
    pub fn connect_new<U>(
        endpoint: U,
        auth: Authentication,
        media_type: MediaType,
    ) -> Result<SyncClient, Error>
    where
        U: AsRef<str>,
    {
        let mut client = SyncClient::new(endpoint, auth, media_type)?;
        client.connect()?;
        Ok(client)
    }

    /// Wrap an asynchronous client.
    pub fn from_client(client: Client) -> Result<SyncClient, Error> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::new(
                    ErrorKind::InvalidConfig,
                    format!("cannot create a runtime: {}", e),
                )
            })?;
        Ok(SyncClient {
            inner: client,
            runtime,
        })
    }

    /// Underlying asynchronous client.
    #[inline]
    pub fn client(&self) -> &Client {
        &self.inner
    }

    /// Convert into the underlying asynchronous client.
    #[inline]
    pub fn into_client(self) -> Client {
        self.inner
    }

    /// Media type used for requests.
    #[inline]
    pub fn media_type(&self) -> MediaType {
        self.inner.media_type()
    }

    /// Change the media type.
    #[inline]
    pub fn set_media_type(&mut self, media_type: MediaType) -> Result<(), Error> {
        self.inner.set_media_type(media_type)
    }

    /// Whether a connection is established.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    /// Current category model.
    #[inline]
    pub fn model(&self) -> &Model {
        self.inner.model()
    }

    /// Mutable access to the category model.
    #[inline]
    pub fn model_mut(&mut self) -> &mut Model {
        self.inner.model_mut()
    }

    /// Replace the category model.
    #[inline]
    pub fn set_model(&mut self, model: Model) {
        self.inner.set_model(model)
    }

    /// Entity builder for the current model.
    #[inline]
    pub fn entity_builder(&self) -> EntityBuilder<'_> {
        self.inner.entity_builder()
    }

    /// Authenticate and download the category model.
    pub fn connect(&mut self) -> Result<(), Error> {
        self.runtime.block_on(self.inner.connect())
    }

    /// Drop the connection.
    #[inline]
    pub fn disconnect(&mut self) {
        self.inner.disconnect()
    }

    /// Download the category model again.
    pub fn refresh(&mut self) -> Result<(), Error> {
        self.runtime.block_on(self.inner.refresh())
    }

    /// List instance locations.
    pub fn list(&mut self, target: Option<&str>) -> Result<Vec<String>, Error> {
        self.runtime.block_on(self.inner.list(target))
    }

    /// Fetch entities.
    pub fn describe(&mut self, target: Option<&str>) -> Result<Vec<Entity>, Error> {
        self.runtime.block_on(self.inner.describe(target))
    }

    /// Create an entity and return its location.
    pub fn create(&mut self, entity: &Entity) -> Result<String, Error> {
        self.runtime.block_on(self.inner.create(entity))
    }

    /// Delete every instance of a kind or a single instance.
    pub fn delete(&mut self, target: &str) -> Result<bool, Error> {
        self.runtime.block_on(self.inner.delete(target))
    }

    /// Trigger an action.
    pub fn trigger(&mut self, target: &str, action: &ActionInstance) -> Result<bool, Error> {
        self.runtime.block_on(self.inner.trigger(target, action))
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::SyncClient;
    use crate::render::test::MODEL_BODY;
    use crate::transport::test::{response, MockServer};
    use crate::{Authentication, Client, MediaType};

    fn server() -> MockServer {
        MockServer::new(|req| match (req.method.as_str(), req.url.path()) {
            ("HEAD", "/-/") => response(200, &[], ""),
            ("GET", "/-/") => response(200, &[("Content-Type", "text/plain")], MODEL_BODY),
            ("GET", "/compute/") => response(
                200,
                &[("Content-Type", "text/uri-list")],
                "# compute\nhttps://occi.example.com/compute/1\n",
            ),
            ("DELETE", _) => response(200, &[], ""),
            _ => response(404, &[], ""),
        })
    }

    fn client(server: &MockServer) -> SyncClient {
        let client = Client::new(
            "https://occi.example.com",
            Authentication::none(),
            MediaType::TextPlain,
        )
        .unwrap()
        .with_connector(server.clone());
        SyncClient::from_client(client).unwrap()
    }

    #[test]
    fn test_blocking_list() {
        let server = server();
        let mut client = client(&server);
        assert!(!client.is_connected());
        let locations = client.list(Some("compute")).unwrap();
        assert_eq!(locations, vec!["https://occi.example.com/compute/1"]);
        assert!(client.is_connected());
        assert_eq!(client.model().len(), 8);
        assert_eq!(server.requests().len(), 3);
    }

    #[test]
    fn test_blocking_delete_and_refresh() {
        let server = server();
        let mut client = client(&server);
        assert!(client.delete("https://occi.example.com/compute/1").unwrap());
        client.refresh().unwrap();
        assert_eq!(server.connects(), 1);
        client.disconnect();
        assert!(!client.is_connected());
        assert!(client.into_client().model().len() > 0);
    }
}
