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

//! Entities: resources, links and action instances.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::category::{Action, Categorized, Kind, Mixin};
use super::utils;

/// Value of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// A string value (rendered quoted).
    String(String),
    /// An integer value.
    Integer(i64),
    /// A floating point value.
    Float(f64),
    /// A boolean value.
    Boolean(bool),
}

impl AttributeValue {
    /// Parse a rendered value: quoted strings, booleans, integers and floats.
    pub fn parse(value: &str) -> AttributeValue {
        let value = value.trim();
        if let Some(unquoted) = utils::unquote(value) {
            return AttributeValue::String(unquoted);
        }
        match value {
            "true" => AttributeValue::Boolean(true),
            "false" => AttributeValue::Boolean(false),
            _ => {
                if let Ok(int) = value.parse::<i64>() {
                    AttributeValue::Integer(int)
                } else if let Ok(float) = value.parse::<f64>() {
                    AttributeValue::Float(float)
                } else {
                    AttributeValue::String(value.to_string())
                }
            }
        }
    }

    /// Render the value, quoting strings.
    pub fn render(&self) -> String {
        match self {
            AttributeValue::String(s) => utils::quote(s),
            other => other.to_string(),
        }
    }

    /// Value as a string, if it is one.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttributeValue::String(s) => f.write_str(s),
            AttributeValue::Integer(i) => write!(f, "{}", i),
            AttributeValue::Float(x) => write!(f, "{}", x),
            AttributeValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> AttributeValue {
        AttributeValue::String(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> AttributeValue {
        AttributeValue::String(value.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> AttributeValue {
        AttributeValue::Integer(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> AttributeValue {
        AttributeValue::Integer(value.into())
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> AttributeValue {
        AttributeValue::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> AttributeValue {
        AttributeValue::Boolean(value)
    }
}

/// Attribute name to value mapping.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A resource instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Opaque identifier.
    pub id: String,
    /// Owning kind.
    pub kind: Arc<Kind>,
    /// Applied mixins.
    pub mixins: Vec<Arc<Mixin>>,
    /// Attribute values (excluding core ones stored in fields).
    pub attributes: Attributes,
    /// Optional title.
    pub title: Option<String>,
    /// Optional summary.
    pub summary: Option<String>,
    /// Outgoing links.
    pub links: Vec<Link>,
}

/// A link instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Opaque identifier.
    pub id: String,
    /// Owning kind.
    pub kind: Arc<Kind>,
    /// Applied mixins.
    pub mixins: Vec<Arc<Mixin>>,
    /// Attribute values (excluding core ones stored in fields).
    pub attributes: Attributes,
    /// Optional title.
    pub title: Option<String>,
    /// Location of the source resource.
    pub source: Option<String>,
    /// Location of the target entity.
    pub target: Option<String>,
    /// Identifier of the category of the target.
    pub relation: Option<String>,
}

macro_rules! entity_common {
    ($ty:ident) => {
        impl $ty {
            /// Add a mixin unless it is already applied.
            pub fn add_mixin(&mut self, mixin: Arc<Mixin>) {
                let identifier = mixin.identifier();
                if !self.mixins.iter().any(|m| m.category.has_identifier(&identifier)) {
                    self.mixins.push(mixin);
                }
            }

            /// Set an attribute value.
            #[inline]
            pub fn set_attribute<S, V>(&mut self, name: S, value: V)
            where
                S: Into<String>,
                V: Into<AttributeValue>,
            {
                let _ = self.attributes.insert(name.into(), value.into());
            }

            /// Get an attribute value.
            #[inline]
            pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
                self.attributes.get(name)
            }

            /// Whether the entity has a mixin with the given term or identifier.
            pub fn has_mixin(&self, term_or_identifier: &str) -> bool {
                self.mixins.iter().any(|m| {
                    if term_or_identifier.contains('#') {
                        m.category.has_identifier(term_or_identifier)
                    } else {
                        m.term() == term_or_identifier
                    }
                })
            }
        }
    };
}

entity_common!(Resource);
entity_common!(Link);

impl Resource {
    /// Create an empty resource of the given kind.
    pub fn new<S: Into<String>>(id: S, kind: Arc<Kind>) -> Resource {
        Resource {
            id: id.into(),
            kind,
            mixins: Vec::new(),
            attributes: Attributes::new(),
            title: None,
            summary: None,
            links: Vec::new(),
        }
    }

    /// Add an outgoing link, setting its source to this resource if missing.
    pub fn add_link(&mut self, mut link: Link) {
        if link.source.is_none() {
            link.source = Some(self.location());
        }
        self.links.push(link);
    }

    /// Server-relative location derived from the kind location and the identifier.
    pub fn location(&self) -> String {
        entity_location(&self.kind, &self.id)
    }
}

impl Link {
    /// Create an empty link of the given kind.
    pub fn new<S: Into<String>>(id: S, kind: Arc<Kind>) -> Link {
        Link {
            id: id.into(),
            kind,
            mixins: Vec::new(),
            attributes: Attributes::new(),
            title: None,
            source: None,
            target: None,
            relation: None,
        }
    }

    /// Server-relative location derived from the kind location and the identifier.
    pub fn location(&self) -> String {
        entity_location(&self.kind, &self.id)
    }
}

fn entity_location(kind: &Kind, id: &str) -> String {
    if id.starts_with('/') || id.contains("://") {
        return id.to_string();
    }
    let base = kind.location.as_deref().unwrap_or("/");
    if base.ends_with('/') {
        format!("{}{}", base, id)
    } else {
        format!("{}/{}", base, id)
    }
}

/// Either a resource or a link.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// A resource.
    Resource(Resource),
    /// A link.
    Link(Link),
}

impl Entity {
    /// Entity identifier.
    pub fn id(&self) -> &str {
        match self {
            Entity::Resource(r) => &r.id,
            Entity::Link(l) => &l.id,
        }
    }

    /// Owning kind.
    pub fn kind(&self) -> &Arc<Kind> {
        match self {
            Entity::Resource(r) => &r.kind,
            Entity::Link(l) => &l.kind,
        }
    }

    /// Applied mixins.
    pub fn mixins(&self) -> &[Arc<Mixin>] {
        match self {
            Entity::Resource(r) => &r.mixins,
            Entity::Link(l) => &l.mixins,
        }
    }

    /// Attribute values.
    pub fn attributes(&self) -> &Attributes {
        match self {
            Entity::Resource(r) => &r.attributes,
            Entity::Link(l) => &l.attributes,
        }
    }

    /// Title.
    pub fn title(&self) -> Option<&str> {
        match self {
            Entity::Resource(r) => r.title.as_deref(),
            Entity::Link(l) => l.title.as_deref(),
        }
    }

    /// Server-relative location.
    pub fn location(&self) -> String {
        match self {
            Entity::Resource(r) => r.location(),
            Entity::Link(l) => l.location(),
        }
    }

    /// Resource, if this is one.
    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Entity::Resource(r) => Some(r),
            Entity::Link(..) => None,
        }
    }

    /// Link, if this is one.
    pub fn as_link(&self) -> Option<&Link> {
        match self {
            Entity::Resource(..) => None,
            Entity::Link(l) => Some(l),
        }
    }
}

impl From<Resource> for Entity {
    fn from(value: Resource) -> Entity {
        Entity::Resource(value)
    }
}

impl From<Link> for Entity {
    fn from(value: Link) -> Entity {
        Entity::Link(value)
    }
}

/// Invocation of an action with parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionInstance {
    /// The action to invoke.
    pub action: Arc<Action>,
    /// Invocation parameters.
    pub attributes: Attributes,
}

impl ActionInstance {
    /// Create an invocation without parameters.
    #[inline]
    pub fn new(action: Arc<Action>) -> ActionInstance {
        ActionInstance {
            action,
            attributes: Attributes::new(),
        }
    }

    /// Set a parameter.
    #[inline]
    pub fn set_attribute<S, V>(&mut self, name: S, value: V)
    where
        S: Into<String>,
        V: Into<AttributeValue>,
    {
        let _ = self.attributes.insert(name.into(), value.into());
    }
}

/// Decoded resources and links, kept separately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    /// Decoded resources.
    pub resources: Vec<Resource>,
    /// Decoded links.
    pub links: Vec<Link>,
}

impl Collection {
    /// Append another collection.
    pub fn merge(&mut self, other: Collection) {
        self.resources.extend(other.resources);
        self.links.extend(other.links);
    }

    /// Whether nothing was decoded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.links.is_empty()
    }

    /// All entities, links first, then resources.
    pub fn into_entities(self) -> Vec<Entity> {
        self.links
            .into_iter()
            .map(Entity::Link)
            .chain(self.resources.into_iter().map(Entity::Resource))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::Arc;

    use super::{AttributeValue, Collection, Entity, Link, Resource};
    use crate::infrastructure;

    #[test]
    fn test_attribute_value_parse() {
        assert_eq!(
            AttributeValue::parse("\"a \\\"b\\\"\""),
            AttributeValue::String("a \"b\"".into())
        );
        assert_eq!(AttributeValue::parse("42"), AttributeValue::Integer(42));
        assert_eq!(AttributeValue::parse("1.5"), AttributeValue::Float(1.5));
        assert_eq!(AttributeValue::parse("true"), AttributeValue::Boolean(true));
        assert_eq!(
            AttributeValue::parse("x86"),
            AttributeValue::String("x86".into())
        );
        assert_eq!(AttributeValue::from("a\"b").render(), "\"a\\\"b\"");
        assert_eq!(AttributeValue::from(2).render(), "2");
    }

    #[test]
    fn test_mixins_not_duplicated() {
        let mut res = Resource::new("1", Arc::new(infrastructure::network_kind()));
        let mixin = Arc::new(infrastructure::ip_network_mixin());
        res.add_mixin(Arc::clone(&mixin));
        res.add_mixin(mixin);
        assert_eq!(res.mixins.len(), 1);
        assert!(res.has_mixin("ipnetwork"));
        assert!(res.has_mixin(infrastructure::IP_NETWORK_IDENTIFIER));
    }

    #[test]
    fn test_location() {
        let res = Resource::new("abc", Arc::new(infrastructure::compute_kind()));
        assert_eq!(res.location(), "/compute/abc");
        let res = Resource::new("/vm/1", Arc::new(infrastructure::compute_kind()));
        assert_eq!(res.location(), "/vm/1");
    }

    #[test]
    fn test_collection_links_first() {
        let mut coll = Collection {
            resources: vec![Resource::new(
                "r",
                Arc::new(infrastructure::compute_kind()),
            )],
            links: Vec::new(),
        };
        coll.merge(Collection {
            resources: Vec::new(),
            links: vec![Link::new(
                "l",
                Arc::new(infrastructure::storage_link_kind()),
            )],
        });
        let entities = coll.into_entities();
        assert!(matches!(entities[0], Entity::Link(..)));
        assert!(matches!(entities[1], Entity::Resource(..)));
    }
}
