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

//! Built-in core and infrastructure categories.
//!
//! These definitions are used when a server does not advertise the standard categories but
//! still accepts standard requests.

use super::category::{Action, Attribute, Kind, Mixin};

/// Scheme of the core categories.
pub const CORE_SCHEME: &str = "http://schemas.ogf.org/occi/core#";
/// Scheme of the infrastructure categories.
pub const INFRASTRUCTURE_SCHEME: &str = "http://schemas.ogf.org/occi/infrastructure#";
/// Scheme of the IP network mixin.
pub const NETWORK_SCHEME: &str = "http://schemas.ogf.org/occi/infrastructure/network#";
/// Scheme of the IP network interface mixin.
pub const NETWORK_INTERFACE_SCHEME: &str =
    "http://schemas.ogf.org/occi/infrastructure/networkinterface#";

/// Identifier of the root entity kind.
pub const ENTITY_IDENTIFIER: &str = "http://schemas.ogf.org/occi/core#entity";
/// Identifier of the root resource kind.
pub const RESOURCE_IDENTIFIER: &str = "http://schemas.ogf.org/occi/core#resource";
/// Identifier of the root link kind.
pub const LINK_IDENTIFIER: &str = "http://schemas.ogf.org/occi/core#link";
/// Identifier of the standard compute kind.
pub const COMPUTE_IDENTIFIER: &str = "http://schemas.ogf.org/occi/infrastructure#compute";
/// Identifier of the standard network kind.
pub const NETWORK_IDENTIFIER: &str = "http://schemas.ogf.org/occi/infrastructure#network";
/// Identifier of the standard storage kind.
pub const STORAGE_IDENTIFIER: &str = "http://schemas.ogf.org/occi/infrastructure#storage";
/// Identifier of the standard storage link kind.
pub const STORAGE_LINK_IDENTIFIER: &str =
    "http://schemas.ogf.org/occi/infrastructure#storagelink";
/// Identifier of the standard network interface kind.
pub const NETWORK_INTERFACE_IDENTIFIER: &str =
    "http://schemas.ogf.org/occi/infrastructure#networkinterface";
/// Identifier of the standard IP network mixin.
pub const IP_NETWORK_IDENTIFIER: &str =
    "http://schemas.ogf.org/occi/infrastructure/network#ipnetwork";
/// Identifier of the standard IP network interface mixin.
pub const IP_NETWORK_INTERFACE_IDENTIFIER: &str =
    "http://schemas.ogf.org/occi/infrastructure/networkinterface#ipnetworkinterface";

fn required_immutable(name: &str) -> Attribute {
    Attribute::with_flags(name, true, false)
}

fn immutable(name: &str) -> Attribute {
    Attribute::with_flags(name, false, false)
}

/// The root kind of all entities.
pub fn entity_kind() -> Kind {
    Kind::new(CORE_SCHEME, "entity")
        .with_title("Entity")
        .with_location("/entity/")
        .with_attribute(required_immutable("occi.core.id"))
        .with_attribute(Attribute::new("occi.core.title"))
}

/// The root kind of all resources.
pub fn resource_kind() -> Kind {
    Kind::new(CORE_SCHEME, "resource")
        .with_title("Resource")
        .with_location("/resource/")
        .with_parent(ENTITY_IDENTIFIER)
        .with_attribute(Attribute::new("occi.core.summary"))
}

/// The root kind of all links.
pub fn link_kind() -> Kind {
    Kind::new(CORE_SCHEME, "link")
        .with_title("Link")
        .with_location("/link/")
        .with_parent(ENTITY_IDENTIFIER)
        .with_attribute(required_immutable("occi.core.source"))
        .with_attribute(required_immutable("occi.core.target"))
}

/// Default compute kind.
pub fn compute_kind() -> Kind {
    let kind = Kind::new(INFRASTRUCTURE_SCHEME, "compute")
        .with_title("Compute Resource")
        .with_location("/compute/")
        .with_parent(RESOURCE_IDENTIFIER)
        .with_attribute(Attribute::new("occi.compute.architecture"))
        .with_attribute(Attribute::new("occi.compute.cores"))
        .with_attribute(Attribute::new("occi.compute.hostname"))
        .with_attribute(Attribute::new("occi.compute.speed"))
        .with_attribute(Attribute::new("occi.compute.memory"))
        .with_attribute(immutable("occi.compute.state"));
    with_actions(kind, "compute", &["start", "stop", "restart", "suspend"])
}

/// Default network kind.
pub fn network_kind() -> Kind {
    let kind = Kind::new(INFRASTRUCTURE_SCHEME, "network")
        .with_title("Network Resource")
        .with_location("/network/")
        .with_parent(RESOURCE_IDENTIFIER)
        .with_attribute(Attribute::new("occi.network.vlan"))
        .with_attribute(Attribute::new("occi.network.label"))
        .with_attribute(immutable("occi.network.state"));
    with_actions(kind, "network", &["up", "down"])
}

/// Default storage kind.
pub fn storage_kind() -> Kind {
    let kind = Kind::new(INFRASTRUCTURE_SCHEME, "storage")
        .with_title("Storage Resource")
        .with_location("/storage/")
        .with_parent(RESOURCE_IDENTIFIER)
        .with_attribute(Attribute::with_flags("occi.storage.size", true, true))
        .with_attribute(immutable("occi.storage.state"));
    with_actions(
        kind,
        "storage",
        &["online", "offline", "backup", "snapshot", "resize"],
    )
}

/// Default storage link kind.
pub fn storage_link_kind() -> Kind {
    Kind::new(INFRASTRUCTURE_SCHEME, "storagelink")
        .with_title("Storage Link")
        .with_location("/storagelink/")
        .with_parent(LINK_IDENTIFIER)
        .with_attribute(Attribute::with_flags("occi.storagelink.deviceid", true, true))
        .with_attribute(Attribute::new("occi.storagelink.mountpoint"))
        .with_attribute(immutable("occi.storagelink.state"))
}

/// Default network interface kind.
pub fn network_interface_kind() -> Kind {
    Kind::new(INFRASTRUCTURE_SCHEME, "networkinterface")
        .with_title("Network Interface")
        .with_location("/networkinterface/")
        .with_parent(LINK_IDENTIFIER)
        .with_attribute(required_immutable("occi.networkinterface.interface"))
        .with_attribute(required_immutable("occi.networkinterface.mac"))
        .with_attribute(immutable("occi.networkinterface.state"))
}

/// Default IP network mixin.
pub fn ip_network_mixin() -> Mixin {
    Mixin::new(NETWORK_SCHEME, "ipnetwork")
        .with_title("IP Network Mixin")
        .with_location("/mixins/ipnetwork/")
        .with_attribute(Attribute::new("occi.network.address"))
        .with_attribute(Attribute::new("occi.network.gateway"))
        .with_attribute(Attribute::new("occi.network.allocation"))
}

/// Default IP network interface mixin.
pub fn ip_network_interface_mixin() -> Mixin {
    Mixin::new(NETWORK_INTERFACE_SCHEME, "ipnetworkinterface")
        .with_title("IP Network Interface Mixin")
        .with_location("/mixins/ipnetworkinterface/")
        .with_attribute(Attribute::new("occi.networkinterface.address"))
        .with_attribute(Attribute::new("occi.networkinterface.gateway"))
        .with_attribute(Attribute::new("occi.networkinterface.allocation"))
}

/// Actions of the default compute, network and storage kinds.
pub fn default_actions() -> Vec<Action> {
    let mut result = Vec::new();
    for (kind, terms) in [
        ("compute", &["start", "stop", "restart", "suspend"][..]),
        ("network", &["up", "down"][..]),
        (
            "storage",
            &["online", "offline", "backup", "snapshot", "resize"][..],
        ),
    ] {
        let scheme = action_scheme(kind);
        for term in terms {
            let action = Action::new(scheme.clone(), *term);
            result.push(match (kind, *term) {
                ("compute", "stop") | ("compute", "restart") | ("compute", "suspend") => {
                    action.with_attribute(Attribute::new("method"))
                }
                ("storage", "resize") => {
                    action.with_attribute(Attribute::with_flags("size", true, true))
                }
                _ => action,
            });
        }
    }
    result
}

// e.g. http://schemas.ogf.org/occi/infrastructure/compute/action#
fn action_scheme(kind_term: &str) -> String {
    format!(
        "{}/{}/action#",
        INFRASTRUCTURE_SCHEME.trim_end_matches('#'),
        kind_term
    )
}

fn with_actions(mut kind: Kind, kind_term: &str, terms: &[&str]) -> Kind {
    let scheme = action_scheme(kind_term);
    for term in terms {
        kind = kind.with_action(format!("{}{}", scheme, term));
    }
    kind
}
