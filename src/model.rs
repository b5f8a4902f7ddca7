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

//! Category model of a server.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{trace, warn};
use reqwest::Url;

use super::category::{Action, Categorized, Kind, Mixin};
use super::infrastructure::{LINK_IDENTIFIER, RESOURCE_IDENTIFIER};
use super::{Error, ErrorKind};

/// How instances of a kind are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionType {
    /// Instances are resources.
    Resource,
    /// Instances are links.
    Link,
}

/// Result of a lookup by a short name.
#[derive(Debug)]
pub enum Lookup<'m, T> {
    /// Exactly one category matches.
    Found(&'m Arc<T>),
    /// No category matches.
    NotFound,
    /// More than one category matches, sorted by identifier.
    Ambiguous(Vec<&'m Arc<T>>),
}

impl<'m, T> Lookup<'m, T> {
    /// Whether more than one category matched.
    #[inline]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Lookup::Ambiguous(..))
    }

    /// Convert to a result, failing on ambiguity.
    pub fn into_result(self, term: &str) -> Result<Option<&'m Arc<T>>, Error> {
        match self {
            Lookup::Found(item) => Ok(Some(item)),
            Lookup::NotFound => Ok(None),
            Lookup::Ambiguous(items) => Err(Error::new(
                ErrorKind::AmbiguousIdentifier,
                format!("term '{}' matches {} categories", term, items.len()),
            )),
        }
    }
}

#[derive(Debug, Clone)]
struct Registry<T> {
    by_identifier: HashMap<String, Arc<T>>,
    by_term: HashMap<String, Vec<String>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Registry<T> {
        Registry {
            by_identifier: HashMap::new(),
            by_term: HashMap::new(),
        }
    }
}

impl<T: Categorized> Registry<T> {
    fn insert(&mut self, item: T) -> Option<Arc<T>> {
        let identifier = item.identifier();
        let ids = self.by_term.entry(item.term().to_string()).or_default();
        if !ids.contains(&identifier) {
            ids.push(identifier.clone());
        }
        self.by_identifier.insert(identifier, Arc::new(item))
    }

    fn remove(&mut self, identifier: &str) -> Option<Arc<T>> {
        let removed = self.by_identifier.remove(identifier)?;
        if let Some(ids) = self.by_term.get_mut(removed.term()) {
            ids.retain(|id| id != identifier);
            if ids.is_empty() {
                let _ = self.by_term.remove(removed.term());
            }
        }
        Some(removed)
    }

    #[inline]
    fn get(&self, identifier: &str) -> Option<&Arc<T>> {
        self.by_identifier.get(identifier)
    }

    fn find_by_term(&self, term: &str) -> Lookup<'_, T> {
        let mut found: Vec<&Arc<T>> = self
            .by_term
            .get(term)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default();
        match found.len() {
            0 => Lookup::NotFound,
            1 => Lookup::Found(found.remove(0)),
            _ => {
                found.sort_by_key(|item| item.identifier());
                Lookup::Ambiguous(found)
            }
        }
    }

    fn resolve(&self, term_or_identifier: &str) -> Result<Option<&Arc<T>>, Error> {
        if term_or_identifier.contains('#') {
            Ok(self.get(term_or_identifier))
        } else {
            self.find_by_term(term_or_identifier)
                .into_result(term_or_identifier)
        }
    }
}

/// Set of all kinds, mixins and actions known for a connection.
///
/// Categories are indexed both by their full identifier (always unambiguous) and by their term
/// (may be ambiguous). No two categories in a model share the same identifier: adding a category
/// replaces any existing category with the same identifier.
#[derive(Debug, Clone, Default)]
pub struct Model {
    kinds: Registry<Kind>,
    mixins: Registry<Mixin>,
    actions: Registry<Action>,
    // Identifier of a kind -> identifiers of the kind and all its ancestors.
    ancestry: HashMap<String, Vec<String>>,
}

impl Model {
    /// Create an empty model.
    #[inline]
    pub fn new() -> Model {
        Model::default()
    }

    /// Add or replace a kind.
    pub fn add_kind(&mut self, kind: Kind) -> Option<Arc<Kind>> {
        let identifier = kind.identifier();
        let _ = self.mixins.remove(&identifier);
        let _ = self.actions.remove(&identifier);
        let result = self.kinds.insert(kind);
        self.rebuild_ancestry();
        result
    }

    /// Add or replace a mixin.
    pub fn add_mixin(&mut self, mixin: Mixin) -> Option<Arc<Mixin>> {
        let identifier = mixin.identifier();
        if self.kinds.remove(&identifier).is_some() {
            self.rebuild_ancestry();
        }
        let _ = self.actions.remove(&identifier);
        self.mixins.insert(mixin)
    }

    /// Add or replace an action.
    pub fn add_action(&mut self, action: Action) -> Option<Arc<Action>> {
        let identifier = action.identifier();
        if self.kinds.remove(&identifier).is_some() {
            self.rebuild_ancestry();
        }
        let _ = self.mixins.remove(&identifier);
        self.actions.insert(action)
    }

    /// Remove a kind by its identifier.
    pub fn remove_kind(&mut self, identifier: &str) -> Option<Arc<Kind>> {
        let result = self.kinds.remove(identifier);
        if result.is_some() {
            self.rebuild_ancestry();
        }
        result
    }

    /// Remove a mixin by its identifier.
    #[inline]
    pub fn remove_mixin(&mut self, identifier: &str) -> Option<Arc<Mixin>> {
        self.mixins.remove(identifier)
    }

    /// Remove an action by its identifier.
    #[inline]
    pub fn remove_action(&mut self, identifier: &str) -> Option<Arc<Action>> {
        self.actions.remove(identifier)
    }

    /// Find a kind by its full identifier.
    #[inline]
    pub fn find_kind(&self, identifier: &str) -> Option<&Arc<Kind>> {
        self.kinds.get(identifier)
    }

    /// Find a mixin by its full identifier.
    #[inline]
    pub fn find_mixin(&self, identifier: &str) -> Option<&Arc<Mixin>> {
        self.mixins.get(identifier)
    }

    /// Find an action by its full identifier.
    #[inline]
    pub fn find_action(&self, identifier: &str) -> Option<&Arc<Action>> {
        self.actions.get(identifier)
    }

    /// Find a kind by its term.
    #[inline]
    pub fn find_kind_by_term(&self, term: &str) -> Lookup<'_, Kind> {
        self.kinds.find_by_term(term)
    }

    /// Find a mixin by its term.
    #[inline]
    pub fn find_mixin_by_term(&self, term: &str) -> Lookup<'_, Mixin> {
        self.mixins.find_by_term(term)
    }

    /// Find an action by its term.
    #[inline]
    pub fn find_action_by_term(&self, term: &str) -> Lookup<'_, Action> {
        self.actions.find_by_term(term)
    }

    /// Resolve a kind by a term or a full identifier.
    ///
    /// Strings containing `#` are treated as full identifiers. Fails with
    /// `AmbiguousIdentifier` if a term matches more than one kind.
    #[inline]
    pub fn resolve_kind(&self, term_or_identifier: &str) -> Result<Option<&Arc<Kind>>, Error> {
        self.kinds.resolve(term_or_identifier)
    }

    /// Resolve a mixin by a term or a full identifier.
    #[inline]
    pub fn resolve_mixin(&self, term_or_identifier: &str) -> Result<Option<&Arc<Mixin>>, Error> {
        self.mixins.resolve(term_or_identifier)
    }

    /// Resolve an action by a term or a full identifier.
    #[inline]
    pub fn resolve_action(&self, term_or_identifier: &str) -> Result<Option<&Arc<Action>>, Error> {
        self.actions.resolve(term_or_identifier)
    }

    /// Identifiers of the kind and all its ancestors, starting with the kind itself.
    ///
    /// Ancestors that are referenced but not present in the model are still included.
    pub fn relations_of(&self, kind: &Kind) -> Vec<String> {
        let identifier = kind.identifier();
        match self.ancestry.get(&identifier) {
            Some(chain) if self.kinds.get(&identifier).map(|k| k.as_ref()) == Some(kind) => {
                chain.clone()
            }
            _ => self.walk_ancestry(kind),
        }
    }

    /// Determine how instances of the kind are rendered.
    ///
    /// Kinds deriving from the core link kind are links, kinds deriving from the core resource
    /// kind are resources. Anything else cannot be interpreted.
    pub fn collection_type_of(&self, kind: &Kind) -> Result<CollectionType, Error> {
        let relations = self.relations_of(kind);
        if relations.iter().any(|id| id == LINK_IDENTIFIER) {
            Ok(CollectionType::Link)
        } else if relations.iter().any(|id| id == RESOURCE_IDENTIFIER) {
            Ok(CollectionType::Resource)
        } else {
            Err(Error::new(
                ErrorKind::UnknownCategory,
                format!(
                    "kind '{}' derives from neither resource nor link",
                    kind.identifier()
                ),
            ))
        }
    }

    /// Find the kind whose location is the longest prefix of the given location.
    ///
    /// Both absolute URLs and server-relative paths are accepted.
    pub fn find_kind_by_location(&self, location: &str) -> Option<&Arc<Kind>> {
        let path = path_of(location);
        self.kinds
            .by_identifier
            .values()
            .filter_map(|kind| {
                let prefix = path_of(kind.location.as_deref()?);
                if is_location_prefix(&prefix, &path) {
                    Some((prefix.len(), kind))
                } else {
                    None
                }
            })
            .max_by_key(|(len, kind)| (*len, kind.identifier()))
            .map(|(_, kind)| kind)
    }

    /// Mixins directly related to the given category term or identifier.
    ///
    /// Useful to list e.g. all OS templates installable on a server.
    pub fn find_related_mixins(&self, term_or_identifier: &str) -> Vec<&Arc<Mixin>> {
        let mut result: Vec<&Arc<Mixin>> = self
            .mixins
            .by_identifier
            .values()
            .filter(|mixin| mixin.is_related_to(term_or_identifier))
            .collect();
        result.sort_by_key(|mixin| mixin.identifier());
        result
    }

    /// All kinds in the model.
    #[inline]
    pub fn kinds(&self) -> impl Iterator<Item = &Arc<Kind>> {
        self.kinds.by_identifier.values()
    }

    /// All mixins in the model.
    #[inline]
    pub fn mixins(&self) -> impl Iterator<Item = &Arc<Mixin>> {
        self.mixins.by_identifier.values()
    }

    /// All actions in the model.
    #[inline]
    pub fn actions(&self) -> impl Iterator<Item = &Arc<Action>> {
        self.actions.by_identifier.values()
    }

    /// Total number of categories.
    #[inline]
    pub fn len(&self) -> usize {
        self.kinds.by_identifier.len()
            + self.mixins.by_identifier.len()
            + self.actions.by_identifier.len()
    }

    /// Whether the model has no categories.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn walk_ancestry(&self, kind: &Kind) -> Vec<String> {
        let mut chain = vec![kind.identifier()];
        let mut seen: HashSet<String> = chain.iter().cloned().collect();
        let mut parent = kind.parent.clone();
        while let Some(current) = parent {
            if !seen.insert(current.clone()) {
                warn!(
                    "Cycle in the parent chain of kind {}, stopping at {}",
                    kind.identifier(),
                    current
                );
                break;
            }
            parent = self.kinds.get(&current).and_then(|k| k.parent.clone());
            chain.push(current);
        }
        chain
    }

    fn rebuild_ancestry(&mut self) {
        let ancestry = self
            .kinds
            .by_identifier
            .iter()
            .map(|(id, kind)| (id.clone(), self.walk_ancestry(kind)))
            .collect();
        self.ancestry = ancestry;
        trace!("Rebuilt ancestry of {} kinds", self.ancestry.len());
    }
}

fn path_of(location: &str) -> String {
    match Url::parse(location) {
        Ok(url) if url.has_host() => url.path().to_string(),
        _ => location.to_string(),
    }
}

fn is_location_prefix(prefix: &str, path: &str) -> bool {
    if prefix.is_empty() || !path.starts_with(prefix) {
        return false;
    }
    prefix.ends_with('/') || path.len() == prefix.len() || path[prefix.len()..].starts_with('/')
}
