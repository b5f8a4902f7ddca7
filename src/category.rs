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

//! Category types: kinds, mixins and actions.
//!
//! A category is identified by a scheme (a namespace URI ending with `#`) and a term that is
//! unique within the scheme. The full identifier is the concatenation of both, e.g.
//! `http://schemas.ogf.org/occi/infrastructure#compute`.

use std::fmt;

/// Common part of all categories.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category {
    /// Namespace URI of the category.
    pub scheme: String,
    /// Short name, unique within the scheme.
    pub term: String,
    /// Optional human-readable title.
    pub title: Option<String>,
}

impl Category {
    /// Create a new category without a title.
    pub fn new<S1, S2>(scheme: S1, term: S2) -> Category
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Category {
            scheme: scheme.into(),
            term: term.into(),
            title: None,
        }
    }

    /// Create a category from its full identifier.
    ///
    /// Returns `None` if the identifier has no `#` separator or an empty term.
    pub fn from_identifier(identifier: &str) -> Option<Category> {
        split_identifier(identifier).map(|(scheme, term)| Category::new(scheme, term))
    }

    /// Full identifier (scheme followed by term).
    #[inline]
    pub fn identifier(&self) -> String {
        format!("{}{}", self.scheme, self.term)
    }

    /// Whether the category has the given full identifier.
    #[inline]
    pub fn has_identifier(&self, identifier: &str) -> bool {
        identifier.len() == self.scheme.len() + self.term.len()
            && identifier.starts_with(&self.scheme)
            && identifier.ends_with(&self.term)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.scheme, self.term)
    }
}

/// Split a full identifier into the scheme (including `#`) and the term.
pub fn split_identifier(identifier: &str) -> Option<(&str, &str)> {
    let idx = identifier.rfind('#')?;
    let (scheme, term) = identifier.split_at(idx + 1);
    if term.is_empty() {
        None
    } else {
        Some((scheme, term))
    }
}

/// Access to the common category part of kinds, mixins and actions.
pub trait Categorized {
    /// The common category part.
    fn category(&self) -> &Category;

    /// Full identifier.
    #[inline]
    fn identifier(&self) -> String {
        self.category().identifier()
    }

    /// Short name.
    #[inline]
    fn term(&self) -> &str {
        &self.category().term
    }

    /// Namespace URI.
    #[inline]
    fn scheme(&self) -> &str {
        &self.category().scheme
    }
}

/// Attribute definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    /// Dotted attribute name, e.g. `occi.compute.cores`.
    pub name: String,
    /// Whether the attribute must be provided.
    pub required: bool,
    /// Whether clients may set the attribute.
    pub mutable: bool,
}

impl Attribute {
    /// Create an optional mutable attribute.
    #[inline]
    pub fn new<S: Into<String>>(name: S) -> Attribute {
        Attribute::with_flags(name, false, true)
    }

    /// Create an attribute with explicit flags.
    #[inline]
    pub fn with_flags<S: Into<String>>(name: S, required: bool, mutable: bool) -> Attribute {
        Attribute {
            name: name.into(),
            required,
            mutable,
        }
    }
}

/// A resource or link type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kind {
    /// Scheme, term and title.
    pub category: Category,
    /// Server-relative location of instances.
    pub location: Option<String>,
    /// Attribute definitions.
    pub attributes: Vec<Attribute>,
    /// Identifiers of actions available on instances.
    pub actions: Vec<String>,
    /// Identifier of the parent kind.
    pub parent: Option<String>,
}

impl Kind {
    /// Create a new kind without location, attributes and parent.
    pub fn new<S1, S2>(scheme: S1, term: S2) -> Kind
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Kind {
            category: Category::new(scheme, term),
            location: None,
            attributes: Vec::new(),
            actions: Vec::new(),
            parent: None,
        }
    }

    /// Add a title.
    #[inline]
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Kind {
        self.category.title = Some(title.into());
        self
    }

    /// Add a location.
    #[inline]
    pub fn with_location<S: Into<String>>(mut self, location: S) -> Kind {
        self.location = Some(location.into());
        self
    }

    /// Add a parent kind identifier.
    #[inline]
    pub fn with_parent<S: Into<String>>(mut self, parent: S) -> Kind {
        self.parent = Some(parent.into());
        self
    }

    /// Add an attribute definition.
    #[inline]
    pub fn with_attribute(mut self, attribute: Attribute) -> Kind {
        self.attributes.push(attribute);
        self
    }

    /// Add an action identifier.
    #[inline]
    pub fn with_action<S: Into<String>>(mut self, action: S) -> Kind {
        self.actions.push(action.into());
        self
    }
}

impl Categorized for Kind {
    #[inline]
    fn category(&self) -> &Category {
        &self.category
    }
}

/// A composable category attachable to entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mixin {
    /// Scheme, term and title.
    pub category: Category,
    /// Server-relative location of tagged instances.
    pub location: Option<String>,
    /// Attribute definitions.
    pub attributes: Vec<Attribute>,
    /// Identifiers of actions added by the mixin.
    pub actions: Vec<String>,
    /// Identifiers of related categories (kinds or mixins).
    pub related: Vec<String>,
}

impl Mixin {
    /// Create a new mixin without location, attributes and relations.
    pub fn new<S1, S2>(scheme: S1, term: S2) -> Mixin
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Mixin {
            category: Category::new(scheme, term),
            location: None,
            attributes: Vec::new(),
            actions: Vec::new(),
            related: Vec::new(),
        }
    }

    /// Add a title.
    #[inline]
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Mixin {
        self.category.title = Some(title.into());
        self
    }

    /// Add a location.
    #[inline]
    pub fn with_location<S: Into<String>>(mut self, location: S) -> Mixin {
        self.location = Some(location.into());
        self
    }

    /// Add an attribute definition.
    #[inline]
    pub fn with_attribute(mut self, attribute: Attribute) -> Mixin {
        self.attributes.push(attribute);
        self
    }

    /// Add a related category identifier.
    #[inline]
    pub fn with_related<S: Into<String>>(mut self, related: S) -> Mixin {
        self.related.push(related.into());
        self
    }

    /// Whether the mixin is directly related to the category.
    ///
    /// The argument is compared with the full identifiers of related categories if it contains
    /// a `#`, otherwise with their terms.
    pub fn is_related_to(&self, term_or_identifier: &str) -> bool {
        if term_or_identifier.contains('#') {
            self.related.iter().any(|rel| rel == term_or_identifier)
        } else {
            self.related.iter().any(|rel| {
                split_identifier(rel)
                    .map(|(_, term)| term == term_or_identifier)
                    .unwrap_or(false)
            })
        }
    }
}

impl Categorized for Mixin {
    #[inline]
    fn category(&self) -> &Category {
        &self.category
    }
}

/// An invokable operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Scheme, term and title.
    pub category: Category,
    /// Invocation parameters.
    pub attributes: Vec<Attribute>,
}

impl Action {
    /// Create a new action without parameters.
    pub fn new<S1, S2>(scheme: S1, term: S2) -> Action
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Action {
            category: Category::new(scheme, term),
            attributes: Vec::new(),
        }
    }

    /// Add a title.
    #[inline]
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Action {
        self.category.title = Some(title.into());
        self
    }

    /// Add a parameter definition.
    #[inline]
    pub fn with_attribute(mut self, attribute: Attribute) -> Action {
        self.attributes.push(attribute);
        self
    }
}

impl Categorized for Action {
    #[inline]
    fn category(&self) -> &Category {
        &self.category
    }
}
