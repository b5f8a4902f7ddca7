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

//! Construction of new entities bound to a model.

use std::sync::Arc;

use log::debug;
use uuid::Uuid;

use super::category::{Action, Kind, Mixin};
use super::entity::{ActionInstance, Link, Resource};
use super::infrastructure;
use super::model::Model;
use super::{Error, ErrorKind};

/// Builder of entities and action instances.
///
/// Well-known infrastructure kinds and mixins are resolved from the model by their standard
/// identifiers first. If the model does not have them, built-in defaults are used.
#[derive(Debug, Clone, Copy)]
pub struct EntityBuilder<'m> {
    model: &'m Model,
}

fn unknown(what: &str, name: &str) -> Error {
    Error::new(
        ErrorKind::EntityBuilding,
        format!("unknown {} '{}'", what, name),
    )
}

fn what_of(term_or_identifier: &str) -> &'static str {
    if term_or_identifier.contains('#') {
        "identifier"
    } else {
        "type"
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl<'m> EntityBuilder<'m> {
    /// Create a builder for the model.
    #[inline]
    pub fn new(model: &'m Model) -> EntityBuilder<'m> {
        EntityBuilder { model }
    }

    /// Model the builder is bound to.
    #[inline]
    pub fn model(&self) -> &'m Model {
        self.model
    }

    fn kind(&self, term_or_identifier: &str) -> Result<Arc<Kind>, Error> {
        self.model
            .resolve_kind(term_or_identifier)?
            .cloned()
            .ok_or_else(|| unknown(what_of(term_or_identifier), term_or_identifier))
    }

    fn mixin(&self, identifier: &str) -> Result<Arc<Mixin>, Error> {
        self.model
            .resolve_mixin(identifier)?
            .cloned()
            .ok_or_else(|| unknown(what_of(identifier), identifier))
    }

    fn action(&self, term_or_identifier: &str) -> Result<Arc<Action>, Error> {
        self.model
            .resolve_action(term_or_identifier)?
            .cloned()
            .ok_or_else(|| unknown(what_of(term_or_identifier), term_or_identifier))
    }

    fn kind_or_default<F>(&self, identifier: &str, default: F) -> Arc<Kind>
    where
        F: FnOnce() -> Kind,
    {
        match self.model.find_kind(identifier) {
            Some(kind) => Arc::clone(kind),
            None => {
                debug!("Kind {} not in the model, using the built-in one", identifier);
                Arc::new(default())
            }
        }
    }

    fn mixin_or_default<F>(&self, identifier: &str, default: F) -> Arc<Mixin>
    where
        F: FnOnce() -> Mixin,
    {
        match self.model.find_mixin(identifier) {
            Some(mixin) => Arc::clone(mixin),
            None => {
                debug!(
                    "Mixin {} not in the model, using the built-in one",
                    identifier
                );
                Arc::new(default())
            }
        }
    }

    /// Create a resource of the given kind term or identifier.
    pub fn new_resource(&self, kind: &str) -> Result<Resource, Error> {
        Ok(Resource::new(new_id(), self.kind(kind)?))
    }

    /// Create a link of the given kind term or identifier.
    pub fn new_link(&self, kind: &str) -> Result<Link, Error> {
        Ok(Link::new(new_id(), self.kind(kind)?))
    }

    /// Create an action instance of the given action term or identifier.
    pub fn new_action_instance(&self, action: &str) -> Result<ActionInstance, Error> {
        Ok(ActionInstance::new(self.action(action)?))
    }

    /// Create a compute resource of the standard kind.
    pub fn new_compute(&self) -> Resource {
        Resource::new(
            new_id(),
            self.kind_or_default(
                infrastructure::COMPUTE_IDENTIFIER,
                infrastructure::compute_kind,
            ),
        )
    }

    /// Create a network resource of the standard kind.
    pub fn new_network(&self) -> Resource {
        Resource::new(
            new_id(),
            self.kind_or_default(
                infrastructure::NETWORK_IDENTIFIER,
                infrastructure::network_kind,
            ),
        )
    }

    /// Create a storage resource of the standard kind.
    pub fn new_storage(&self) -> Resource {
        Resource::new(
            new_id(),
            self.kind_or_default(
                infrastructure::STORAGE_IDENTIFIER,
                infrastructure::storage_kind,
            ),
        )
    }

    /// Create a storage link of the standard kind.
    pub fn new_storage_link(&self) -> Link {
        Link::new(
            new_id(),
            self.kind_or_default(
                infrastructure::STORAGE_LINK_IDENTIFIER,
                infrastructure::storage_link_kind,
            ),
        )
    }

    /// Create a network interface link of the standard kind.
    pub fn new_network_interface(&self) -> Link {
        Link::new(
            new_id(),
            self.kind_or_default(
                infrastructure::NETWORK_INTERFACE_IDENTIFIER,
                infrastructure::network_interface_kind,
            ),
        )
    }

    /// Create a network resource with the IP network mixin attached.
    pub fn new_ip_network(&self) -> Resource {
        let mut network = self.new_network();
        network.add_mixin(self.mixin_or_default(
            infrastructure::IP_NETWORK_IDENTIFIER,
            infrastructure::ip_network_mixin,
        ));
        network
    }

    /// Create a network interface with the IP network interface mixin attached.
    pub fn new_ip_network_interface(&self) -> Link {
        let mut interface = self.new_network_interface();
        interface.add_mixin(self.mixin_or_default(
            infrastructure::IP_NETWORK_INTERFACE_IDENTIFIER,
            infrastructure::ip_network_interface_mixin,
        ));
        interface
    }

    /// Create an IP network from explicit kind and mixin identifiers.
    ///
    /// Both must exist in the model, no defaults are used.
    pub fn new_ip_network_with(&self, kind: &str, mixin: &str) -> Result<Resource, Error> {
        let mut network = Resource::new(new_id(), self.kind(kind)?);
        network.add_mixin(self.mixin(mixin)?);
        Ok(network)
    }

    /// Create an IP network interface from explicit kind and mixin identifiers.
    ///
    /// Both must exist in the model, no defaults are used.
    pub fn new_ip_network_interface_with(&self, kind: &str, mixin: &str) -> Result<Link, Error> {
        let mut interface = Link::new(new_id(), self.kind(kind)?);
        interface.add_mixin(self.mixin(mixin)?);
        Ok(interface)
    }
}
