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

//! Text renderings: `text/plain`, `text/occi` and `text/uri-list`.

use std::sync::Arc;

use log::trace;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LOCATION};

use super::{MediaType, Renderer, Rendering};
use crate::category::{Action, Attribute, Categorized, Category, Kind, Mixin};
use crate::entity::{ActionInstance, AttributeValue, Attributes, Collection, Entity, Link, Resource};
use crate::infrastructure;
use crate::model::{CollectionType, Model};
use crate::utils;
use crate::{Error, ErrorKind};

const ID: &str = "occi.core.id";
const TITLE: &str = "occi.core.title";
const SUMMARY: &str = "occi.core.summary";
const SOURCE: &str = "occi.core.source";
const TARGET: &str = "occi.core.target";
const TARGET_KIND: &str = "occi.core.target.kind";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Category,
    Attribute,
    Link,
    Location,
}

impl Field {
    fn plain_name(self) -> &'static str {
        match self {
            Field::Category => "Category",
            Field::Attribute => "X-OCCI-Attribute",
            Field::Link => "Link",
            Field::Location => "X-OCCI-Location",
        }
    }

    fn header_name(self) -> HeaderName {
        HeaderName::from_static(match self {
            Field::Category => "category",
            Field::Attribute => "x-occi-attribute",
            Field::Link => "link",
            Field::Location => "x-occi-location",
        })
    }
}

/// Renderer for the OCCI text formats.
///
/// `text/plain` carries one `Name: value` line per item in the body, `text/occi` carries the
/// same items in headers with comma-separated values.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl TextRenderer {
    /// Create a new renderer.
    #[inline]
    pub fn new() -> TextRenderer {
        TextRenderer
    }
}

/// Split on a separator outside of double quotes.
pub(crate) fn split_quoted(value: &str, separator: char) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;
    for c in value.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' && in_quotes {
            current.push(c);
            escaped = true;
        } else if c == '"' {
            current.push(c);
            in_quotes = !in_quotes;
        } else if c == separator && !in_quotes {
            push_trimmed(&mut result, &current);
            current.clear();
        } else {
            current.push(c);
        }
    }
    push_trimmed(&mut result, &current);
    result
}

fn push_trimmed(result: &mut Vec<String>, item: &str) {
    let item = item.trim();
    if !item.is_empty() {
        result.push(item.to_string());
    }
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    utils::unquote(value).unwrap_or_else(|| value.to_string())
}

fn invalid<S: Into<String>>(message: S) -> Error {
    Error::new(ErrorKind::InvalidResponse, message)
}

fn values(
    media_type: MediaType,
    body: &str,
    headers: &HeaderMap,
    field: Field,
) -> Result<Vec<String>, Error> {
    match media_type {
        MediaType::TextPlain => Ok(body
            .lines()
            .filter_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.trim().eq_ignore_ascii_case(field.plain_name()) {
                    Some(value.trim().to_string())
                } else {
                    None
                }
            })
            .collect()),
        MediaType::TextOcci => {
            let mut result = Vec::new();
            for value in headers.get_all(field.header_name()) {
                let value = header_str(value)
                    .map_err(|e| invalid(format!("invalid {} header: {}", field.plain_name(), e)))?;
                result.extend(split_quoted(value, ','));
            }
            Ok(result)
        }
        MediaType::TextUriList => Err(invalid(format!(
            "{} cannot carry {} data",
            media_type,
            field.plain_name()
        ))),
    }
}

/// Header values are UTF-8, not only visible ASCII.
#[inline]
fn header_str(value: &HeaderValue) -> Result<&str, std::str::Utf8Error> {
    std::str::from_utf8(value.as_bytes())
}

#[derive(Debug, Default)]
struct CategoryLine {
    term: String,
    scheme: String,
    class: String,
    title: Option<String>,
    rel: Vec<String>,
    location: Option<String>,
    attributes: Vec<Attribute>,
    actions: Vec<String>,
}

impl CategoryLine {
    fn parse(value: &str) -> Result<CategoryLine, Error> {
        let mut parts = split_quoted(value, ';').into_iter();
        let term = parts
            .next()
            .ok_or_else(|| invalid("empty category"))?;
        let mut line = CategoryLine {
            term,
            ..CategoryLine::default()
        };
        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = unquote(value);
            match key.trim() {
                "scheme" => line.scheme = value,
                "class" => line.class = value,
                "title" => line.title = Some(value),
                "rel" => line.rel = value.split_whitespace().map(From::from).collect(),
                "location" => line.location = Some(value),
                "attributes" => line.attributes = parse_attribute_definitions(&value),
                "actions" => line.actions = value.split_whitespace().map(From::from).collect(),
                other => trace!("Ignoring unknown category parameter {}", other),
            }
        }
        if line.scheme.is_empty() {
            return Err(invalid(format!("category '{}' has no scheme", line.term)));
        }
        Ok(line)
    }

    fn category(&self) -> Category {
        Category {
            scheme: self.scheme.clone(),
            term: self.term.clone(),
            title: self.title.clone(),
        }
    }

    fn identifier(&self) -> String {
        format!("{}{}", self.scheme, self.term)
    }

    fn to_kind(&self) -> Kind {
        Kind {
            category: self.category(),
            location: self.location.clone(),
            attributes: self.attributes.clone(),
            actions: self.actions.clone(),
            parent: self.rel.first().cloned(),
        }
    }

    fn to_mixin(&self) -> Mixin {
        Mixin {
            category: self.category(),
            location: self.location.clone(),
            attributes: self.attributes.clone(),
            actions: self.actions.clone(),
            related: self.rel.clone(),
        }
    }

    fn to_action(&self) -> Action {
        Action {
            category: self.category(),
            attributes: self.attributes.clone(),
        }
    }
}

/// Parse `name{required immutable} other ...` attribute definitions.
fn parse_attribute_definitions(value: &str) -> Vec<Attribute> {
    let mut result = Vec::new();
    let mut rest = value.trim_start();
    while !rest.is_empty() {
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '{')
            .unwrap_or(rest.len());
        let name = &rest[..end];
        rest = &rest[end..];
        let mut attribute = Attribute::new(name);
        if let Some(flags) = rest.strip_prefix('{') {
            let close = flags.find('}').unwrap_or(flags.len());
            for flag in flags[..close].split_whitespace() {
                match flag {
                    "required" => attribute.required = true,
                    "immutable" => attribute.mutable = false,
                    _ => {}
                }
            }
            rest = flags.get(close + 1..).unwrap_or_default();
        }
        if !name.is_empty() {
            result.push(attribute);
        }
        rest = rest.trim_start();
    }
    result
}

fn category_value(category: &Category, class: &str) -> String {
    format!(
        "{}; scheme=\"{}\"; class=\"{}\"",
        category.term, category.scheme, class
    )
}

fn parse_attributes(lines: Vec<String>) -> Attributes {
    lines
        .into_iter()
        .filter_map(|line| {
            let (name, value) = line.split_once('=')?;
            Some((name.trim().to_string(), AttributeValue::parse(value)))
        })
        .collect()
}

fn take_string(attributes: &mut Attributes, name: &str) -> Option<String> {
    attributes.remove(name).map(|v| v.to_string())
}

fn kind_for(model: &Model, line: &CategoryLine) -> Arc<Kind> {
    model
        .find_kind(&line.identifier())
        .cloned()
        .unwrap_or_else(|| Arc::new(line.to_kind()))
}

fn link_kind_for(model: &Model, identifier: Option<&str>) -> Arc<Kind> {
    if let Some(identifier) = identifier {
        if let Some(kind) = model.find_kind(identifier) {
            return Arc::clone(kind);
        }
        if let Some(category) = Category::from_identifier(identifier) {
            return Arc::new(Kind {
                category,
                location: None,
                attributes: Vec::new(),
                actions: Vec::new(),
                parent: Some(infrastructure::LINK_IDENTIFIER.to_string()),
            });
        }
    }
    model
        .find_kind(infrastructure::LINK_IDENTIFIER)
        .cloned()
        .unwrap_or_else(|| Arc::new(infrastructure::link_kind()))
}

fn parse_link_line(value: &str, model: &Model) -> Result<Link, Error> {
    let mut parts = split_quoted(value, ';').into_iter();
    let target = parts
        .next()
        .map(|t| t.trim_start_matches('<').trim_end_matches('>').to_string())
        .ok_or_else(|| invalid("empty link"))?;
    let mut relation = None;
    let mut location = None;
    let mut categories = Vec::new();
    let mut attributes = Attributes::new();
    for part in parts {
        let Some((key, raw)) = part.split_once('=') else {
            continue;
        };
        match key.trim() {
            "rel" => relation = Some(unquote(raw)),
            "self" => location = Some(unquote(raw)),
            "category" => {
                categories = unquote(raw)
                    .split_whitespace()
                    .map(String::from)
                    .collect()
            }
            name => {
                let _ = attributes.insert(name.to_string(), AttributeValue::parse(raw));
            }
        }
    }

    let mut category_ids = categories.iter();
    let kind = link_kind_for(model, category_ids.next().map(String::as_str));
    let id = take_string(&mut attributes, ID)
        .or_else(|| location.clone())
        .unwrap_or_default();
    let mut link = Link::new(id, kind);
    for mixin_id in category_ids {
        if let Some(mixin) = model.find_mixin(mixin_id) {
            link.add_mixin(Arc::clone(mixin));
        }
    }
    link.title = take_string(&mut attributes, TITLE);
    link.source = take_string(&mut attributes, SOURCE);
    link.target = Some(target);
    link.relation = relation;
    link.attributes = attributes;
    Ok(link)
}

fn render_link_line(link: &Link) -> String {
    let mut result = format!("<{}>", link.target.as_deref().unwrap_or_default());
    if let Some(ref relation) = link.relation {
        result.push_str(&format!("; rel=\"{}\"", relation));
    }
    result.push_str(&format!("; self=\"{}\"", link.location()));
    let mut categories = vec![link.kind.identifier()];
    categories.extend(link.mixins.iter().map(|m| m.identifier()));
    result.push_str(&format!("; category=\"{}\"", categories.join(" ")));
    result.push_str(&format!("; {}=\"{}\"", ID, link.id));
    for (name, value) in &link.attributes {
        result.push_str(&format!("; {}={}", name, value.render()));
    }
    result
}

fn finish(media_type: MediaType, items: Vec<(Field, String)>) -> Result<Rendering, Error> {
    match media_type {
        MediaType::TextPlain => {
            let mut body = String::new();
            for (field, value) in items {
                body.push_str(field.plain_name());
                body.push_str(": ");
                body.push_str(&value);
                body.push('\n');
            }
            Ok(Rendering::Body(body))
        }
        MediaType::TextOcci => {
            let mut headers = HeaderMap::new();
            for field in [Field::Category, Field::Link, Field::Attribute, Field::Location] {
                let joined = items
                    .iter()
                    .filter(|(f, _)| *f == field)
                    .map(|(_, v)| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                if !joined.is_empty() {
                    let value = HeaderValue::from_bytes(joined.as_bytes())?;
                    let _ = headers.insert(field.header_name(), value);
                }
            }
            Ok(Rendering::Headers(headers))
        }
        MediaType::TextUriList => Err(Error::new(
            ErrorKind::InvalidInput,
            "entities cannot be rendered as text/uri-list",
        )),
    }
}

fn push_attributes(items: &mut Vec<(Field, String)>, attributes: &Attributes) {
    for (name, value) in attributes {
        items.push((Field::Attribute, format!("{}={}", name, value.render())));
    }
}

impl Renderer for TextRenderer {
    fn parse_model(
        &self,
        media_type: MediaType,
        body: &str,
        headers: &HeaderMap,
    ) -> Result<Model, Error> {
        let mut model = Model::new();
        for value in values(media_type, body, headers, Field::Category)? {
            let line = CategoryLine::parse(&value)?;
            match line.class.as_str() {
                "kind" => {
                    let _ = model.add_kind(line.to_kind());
                }
                "mixin" => {
                    let _ = model.add_mixin(line.to_mixin());
                }
                "action" => {
                    let _ = model.add_action(line.to_action());
                }
                other => {
                    return Err(invalid(format!(
                        "unknown class '{}' of category {}",
                        other,
                        line.identifier()
                    )))
                }
            }
        }
        trace!("Decoded model with {} categories", model.len());
        Ok(model)
    }

    fn parse_locations(
        &self,
        media_type: MediaType,
        body: &str,
        headers: &HeaderMap,
    ) -> Result<Vec<String>, Error> {
        match media_type {
            MediaType::TextUriList => Ok(body
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(String::from)
                .collect()),
            MediaType::TextOcci => {
                let locations = values(media_type, body, headers, Field::Location)?;
                if !locations.is_empty() {
                    return Ok(locations);
                }
                let mut result = Vec::new();
                for value in headers.get_all(LOCATION) {
                    let value = header_str(value)
                        .map_err(|e| invalid(format!("invalid Location header: {}", e)))?;
                    result.extend(split_quoted(value, ','));
                }
                Ok(result)
            }
            MediaType::TextPlain => values(media_type, body, headers, Field::Location),
        }
    }

    fn parse_collection(
        &self,
        media_type: MediaType,
        body: &str,
        headers: &HeaderMap,
        model: &Model,
        collection_type: CollectionType,
    ) -> Result<Collection, Error> {
        let categories = values(media_type, body, headers, Field::Category)?
            .iter()
            .map(|value| CategoryLine::parse(value))
            .collect::<Result<Vec<_>, _>>()?;
        let mut attributes = parse_attributes(values(media_type, body, headers, Field::Attribute)?);
        let links = values(media_type, body, headers, Field::Link)?;

        if categories.is_empty() && attributes.is_empty() && links.is_empty() {
            return Ok(Collection::default());
        }

        let kind_line = categories
            .iter()
            .find(|c| c.class == "kind")
            .ok_or_else(|| invalid("entity rendering has no kind"))?;
        let kind = kind_for(model, kind_line);
        let mixins = categories
            .iter()
            .filter(|c| c.class == "mixin")
            .map(|line| {
                model
                    .find_mixin(&line.identifier())
                    .cloned()
                    .unwrap_or_else(|| Arc::new(line.to_mixin()))
            })
            .collect::<Vec<_>>();

        let id = take_string(&mut attributes, ID)
            .ok_or_else(|| invalid(format!("entity of kind {} has no {}", kind.identifier(), ID)))?;
        let title = take_string(&mut attributes, TITLE);

        let mut collection = Collection::default();
        match collection_type {
            CollectionType::Resource => {
                let mut resource = Resource::new(id, kind);
                for mixin in mixins {
                    resource.add_mixin(mixin);
                }
                resource.title = title;
                resource.summary = take_string(&mut attributes, SUMMARY);
                resource.attributes = attributes;
                for value in links {
                    resource.add_link(parse_link_line(&value, model)?);
                }
                collection.resources.push(resource);
            }
            CollectionType::Link => {
                let mut link = Link::new(id, kind);
                for mixin in mixins {
                    link.add_mixin(mixin);
                }
                link.title = title;
                link.source = take_string(&mut attributes, SOURCE);
                link.target = take_string(&mut attributes, TARGET);
                link.relation = take_string(&mut attributes, TARGET_KIND);
                link.attributes = attributes;
                collection.links.push(link);
            }
        }
        Ok(collection)
    }

    fn render_entity(&self, media_type: MediaType, entity: &Entity) -> Result<Rendering, Error> {
        let mut items = vec![(Field::Category, category_value(&entity.kind().category, "kind"))];
        for mixin in entity.mixins() {
            items.push((Field::Category, category_value(&mixin.category, "mixin")));
        }

        let mut core = Attributes::new();
        let _ = core.insert(ID.to_string(), entity.id().into());
        if let Some(title) = entity.title() {
            let _ = core.insert(TITLE.to_string(), title.into());
        }
        match entity {
            Entity::Resource(resource) => {
                if let Some(ref summary) = resource.summary {
                    let _ = core.insert(SUMMARY.to_string(), summary.as_str().into());
                }
                for link in &resource.links {
                    items.push((Field::Link, render_link_line(link)));
                }
            }
            Entity::Link(link) => {
                if let Some(ref source) = link.source {
                    let _ = core.insert(SOURCE.to_string(), source.as_str().into());
                }
                if let Some(ref target) = link.target {
                    let _ = core.insert(TARGET.to_string(), target.as_str().into());
                }
                if let Some(ref relation) = link.relation {
                    let _ = core.insert(TARGET_KIND.to_string(), relation.as_str().into());
                }
            }
        }
        push_attributes(&mut items, &core);
        push_attributes(&mut items, entity.attributes());
        finish(media_type, items)
    }

    fn render_action(
        &self,
        media_type: MediaType,
        action: &ActionInstance,
    ) -> Result<Rendering, Error> {
        let mut items = vec![(
            Field::Category,
            category_value(&action.action.category, "action"),
        )];
        push_attributes(&mut items, &action.attributes);
        finish(media_type, items)
    }
}

#[cfg(test)]
pub mod test {
    use reqwest::header::{HeaderMap, HeaderValue};

    use super::{category_value, split_quoted, TextRenderer};
    use crate::builder::EntityBuilder;
    use crate::category::{Attribute, Categorized, Kind};
    use crate::entity::{AttributeValue, Entity, Link};
    use crate::infrastructure;
    use crate::model::{CollectionType, Model};
    use crate::render::{MediaType, Renderer, Rendering};
    use crate::{utils, ErrorKind};

    fn render_attribute_definitions(attributes: &[Attribute]) -> String {
        attributes
            .iter()
            .map(|attr| {
                let mut flags = Vec::new();
                if attr.required {
                    flags.push("required");
                }
                if !attr.mutable {
                    flags.push("immutable");
                }
                if flags.is_empty() {
                    attr.name.clone()
                } else {
                    format!("{}{{{}}}", attr.name, flags.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn render_kind(kind: &Kind) -> String {
        let mut result = category_value(&kind.category, "kind");
        if let Some(ref title) = kind.category.title {
            result.push_str(&format!("; title=\"{}\"", utils::quote(title)));
        }
        if let Some(ref parent) = kind.parent {
            result.push_str(&format!("; rel=\"{}\"", parent));
        }
        if let Some(ref location) = kind.location {
            result.push_str(&format!("; location=\"{}\"", location));
        }
        if !kind.attributes.is_empty() {
            result.push_str(&format!(
                "; attributes=\"{}\"",
                render_attribute_definitions(&kind.attributes)
            ));
        }
        if !kind.actions.is_empty() {
            result.push_str(&format!("; actions=\"{}\"", kind.actions.join(" ")));
        }
        result
    }

    pub(crate) const MODEL_BODY: &str = r#"Category: entity; scheme="http://schemas.ogf.org/occi/core#"; class="kind"; title="Entity"; location="/entity/"; attributes="occi.core.id{required immutable} occi.core.title"
Category: resource; scheme="http://schemas.ogf.org/occi/core#"; class="kind"; title="Resource"; rel="http://schemas.ogf.org/occi/core#entity"; location="/resource/"; attributes="occi.core.summary"
Category: link; scheme="http://schemas.ogf.org/occi/core#"; class="kind"; title="Link"; rel="http://schemas.ogf.org/occi/core#entity"; location="/link/"
Category: compute; scheme="http://schemas.ogf.org/occi/infrastructure#"; class="kind"; title="Compute Resource"; rel="http://schemas.ogf.org/occi/core#resource"; location="/compute/"; attributes="occi.compute.cores occi.compute.state{immutable}"; actions="http://schemas.ogf.org/occi/infrastructure/compute/action#start"
Category: storagelink; scheme="http://schemas.ogf.org/occi/infrastructure#"; class="kind"; title="Storage link"; rel="http://schemas.ogf.org/occi/core#link"; location="/storagelink/"
Category: os_tpl; scheme="http://schemas.ogf.org/occi/infrastructure#"; class="mixin"; title="OS template"; location="/mixins/os_tpl/"
Category: debian; scheme="http://example.com/occi/os_tpl#"; class="mixin"; title="Debian; stable"; rel="http://schemas.ogf.org/occi/infrastructure#os_tpl"; location="/mixins/debian/"
Category: start; scheme="http://schemas.ogf.org/occi/infrastructure/compute/action#"; class="action"; title="Start"
"#;

    pub(crate) fn model() -> Model {
        TextRenderer
            .parse_model(MediaType::TextPlain, MODEL_BODY, &HeaderMap::new())
            .unwrap()
    }

    #[test]
    fn test_split_quoted() {
        assert_eq!(
            split_quoted(r#"a; title="x; y"; b="c \"d;\"""#, ';'),
            vec![
                "a".to_string(),
                "title=\"x; y\"".to_string(),
                "b=\"c \\\"d;\\\"\"".to_string()
            ]
        );
        assert_eq!(split_quoted(" , a,, b ,", ','), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_model_plain() {
        let model = model();
        assert_eq!(model.len(), 8);
        let compute = model.resolve_kind("compute").unwrap().unwrap();
        assert_eq!(compute.location.as_deref(), Some("/compute/"));
        assert_eq!(
            compute.parent.as_deref(),
            Some(infrastructure::RESOURCE_IDENTIFIER)
        );
        assert_eq!(compute.attributes.len(), 2);
        assert!(!compute.attributes[1].mutable);
        assert_eq!(compute.actions.len(), 1);

        let entity = model.resolve_kind("entity").unwrap().unwrap();
        assert!(entity.attributes[0].required);
        assert!(!entity.attributes[0].mutable);

        let debian = model.resolve_mixin("debian").unwrap().unwrap();
        assert_eq!(debian.category.title.as_deref(), Some("Debian; stable"));
        assert_eq!(model.find_related_mixins("os_tpl").len(), 1);
        assert!(model.resolve_action("start").unwrap().is_some());
    }

    #[test]
    fn test_parse_model_occi() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(
            "category",
            HeaderValue::from_static(
                "compute; scheme=\"http://schemas.ogf.org/occi/infrastructure#\"; class=\"kind\"; title=\"A, B\", \
                 start; scheme=\"http://schemas.ogf.org/occi/infrastructure/compute/action#\"; class=\"action\"",
            ),
        );
        let model = TextRenderer
            .parse_model(MediaType::TextOcci, "", &headers)
            .unwrap();
        assert_eq!(model.len(), 2);
        let compute = model.resolve_kind("compute").unwrap().unwrap();
        assert_eq!(compute.category.title.as_deref(), Some("A, B"));
    }

    #[test]
    fn test_parse_model_bad_class() {
        let err = TextRenderer
            .parse_model(
                MediaType::TextPlain,
                "Category: x; scheme=\"http://a#\"; class=\"banana\"\n",
                &HeaderMap::new(),
            )
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }

    #[test]
    fn test_kind_rendering_roundtrip() {
        let kind = infrastructure::compute_kind();
        let body = format!("Category: {}\n", render_kind(&kind));
        let model = TextRenderer
            .parse_model(MediaType::TextPlain, &body, &HeaderMap::new())
            .unwrap();
        assert_eq!(**model.find_kind(&kind.identifier()).unwrap(), kind);
    }

    #[test]
    fn test_parse_locations() {
        let body = "X-OCCI-Location: http://localhost/compute/1\nX-OCCI-Location: http://localhost/compute/2\n";
        assert_eq!(
            TextRenderer
                .parse_locations(MediaType::TextPlain, body, &HeaderMap::new())
                .unwrap(),
            vec!["http://localhost/compute/1", "http://localhost/compute/2"]
        );

        let body = "# comment\nhttp://localhost/compute/1\n\n/compute/2\n";
        assert_eq!(
            TextRenderer
                .parse_locations(MediaType::TextUriList, body, &HeaderMap::new())
                .unwrap(),
            vec!["http://localhost/compute/1", "/compute/2"]
        );

        let mut headers = HeaderMap::new();
        let _ = headers.insert(
            "x-occi-location",
            HeaderValue::from_static("/compute/1, /compute/2"),
        );
        assert_eq!(
            TextRenderer
                .parse_locations(MediaType::TextOcci, "", &headers)
                .unwrap(),
            vec!["/compute/1", "/compute/2"]
        );

        let mut headers = HeaderMap::new();
        let _ = headers.insert("location", HeaderValue::from_static("/compute/3"));
        assert_eq!(
            TextRenderer
                .parse_locations(MediaType::TextOcci, "OK", &headers)
                .unwrap(),
            vec!["/compute/3"]
        );
    }

    #[test]
    fn test_parse_resource() {
        let model = model();
        let body = r#"Category: compute; scheme="http://schemas.ogf.org/occi/infrastructure#"; class="kind"
Category: debian; scheme="http://example.com/occi/os_tpl#"; class="mixin"
X-OCCI-Attribute: occi.core.id="87f3bfc3"
X-OCCI-Attribute: occi.core.title="My VM"
X-OCCI-Attribute: occi.compute.cores=2
X-OCCI-Attribute: occi.compute.state="active"
Link: </storage/1>; rel="http://schemas.ogf.org/occi/infrastructure#storage"; self="/storagelink/sl1"; category="http://schemas.ogf.org/occi/infrastructure#storagelink"; occi.storagelink.deviceid="/dev/vda"
"#;
        let coll = TextRenderer
            .parse_collection(
                MediaType::TextPlain,
                body,
                &HeaderMap::new(),
                &model,
                CollectionType::Resource,
            )
            .unwrap();
        assert!(coll.links.is_empty());
        let res = &coll.resources[0];
        assert_eq!(res.id, "87f3bfc3");
        assert_eq!(res.title.as_deref(), Some("My VM"));
        assert_eq!(res.kind.term(), "compute");
        assert!(res.has_mixin("debian"));
        assert_eq!(res.attribute("occi.compute.cores"), Some(&2i64.into()));
        assert!(res.attribute("occi.core.id").is_none());

        let link = &res.links[0];
        assert_eq!(link.id, "/storagelink/sl1");
        assert_eq!(link.target.as_deref(), Some("/storage/1"));
        assert_eq!(link.source.as_deref(), Some("/compute/87f3bfc3"));
        assert_eq!(link.kind.term(), "storagelink");
        assert_eq!(
            link.attribute("occi.storagelink.deviceid"),
            Some(&"/dev/vda".into())
        );
    }

    #[test]
    fn test_parse_link() {
        let model = model();
        let body = r#"Category: storagelink; scheme="http://schemas.ogf.org/occi/infrastructure#"; class="kind"
X-OCCI-Attribute: occi.core.id="sl1"
X-OCCI-Attribute: occi.core.source="/compute/1"
X-OCCI-Attribute: occi.core.target="/storage/1"
"#;
        let coll = TextRenderer
            .parse_collection(
                MediaType::TextPlain,
                body,
                &HeaderMap::new(),
                &model,
                CollectionType::Link,
            )
            .unwrap();
        assert!(coll.resources.is_empty());
        let link = &coll.links[0];
        assert_eq!(link.source.as_deref(), Some("/compute/1"));
        assert_eq!(link.target.as_deref(), Some("/storage/1"));
    }

    #[test]
    fn test_parse_collection_errors() {
        let model = model();
        let err = TextRenderer
            .parse_collection(
                MediaType::TextPlain,
                "X-OCCI-Attribute: occi.core.id=\"1\"\n",
                &HeaderMap::new(),
                &model,
                CollectionType::Resource,
            )
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);

        let coll = TextRenderer
            .parse_collection(
                MediaType::TextPlain,
                "",
                &HeaderMap::new(),
                &model,
                CollectionType::Resource,
            )
            .unwrap();
        assert!(coll.is_empty());
    }

    #[test]
    fn test_render_entity_plain() {
        let model = model();
        let mut res = EntityBuilder::new(&model).new_resource("compute").unwrap();
        res.id = "1".to_string();
        res.title = Some("vm".to_string());
        res.set_attribute("occi.compute.cores", 4);
        let mut link = Link::new("sl1", std::sync::Arc::new(infrastructure::storage_link_kind()));
        link.target = Some("/storage/9".to_string());
        res.add_link(link);

        let rendering = TextRenderer
            .render_entity(MediaType::TextPlain, &Entity::Resource(res))
            .unwrap();
        let Rendering::Body(body) = rendering else {
            panic!("expected a body");
        };
        assert_eq!(
            body,
            "Category: compute; scheme=\"http://schemas.ogf.org/occi/infrastructure#\"; class=\"kind\"\n\
             Link: </storage/9>; self=\"/storagelink/sl1\"; category=\"http://schemas.ogf.org/occi/infrastructure#storagelink\"; occi.core.id=\"sl1\"\n\
             X-OCCI-Attribute: occi.core.id=\"1\"\n\
             X-OCCI-Attribute: occi.core.title=\"vm\"\n\
             X-OCCI-Attribute: occi.compute.cores=4\n"
        );
    }

    #[test]
    fn test_render_entity_occi() {
        let model = model();
        let mut res = EntityBuilder::new(&model).new_resource("compute").unwrap();
        res.add_mixin(model.resolve_mixin("debian").unwrap().unwrap().clone());
        res.set_attribute("occi.compute.hostname", "a,b");

        let rendering = TextRenderer
            .render_entity(MediaType::TextOcci, &Entity::Resource(res.clone()))
            .unwrap();
        let Rendering::Headers(headers) = rendering else {
            panic!("expected headers");
        };
        assert_eq!(headers.get_all("category").iter().count(), 1);

        // Parsing the headers back yields the same resource.
        let coll = TextRenderer
            .parse_collection(
                MediaType::TextOcci,
                "",
                &headers,
                &model,
                CollectionType::Resource,
            )
            .unwrap();
        assert_eq!(coll.resources[0], res);
    }

    #[test]
    fn test_render_entity_occi_utf8() {
        let model = model();
        let mut res = EntityBuilder::new(&model).new_resource("compute").unwrap();
        res.set_attribute("occi.compute.hostname", "café");

        let Rendering::Headers(headers) = TextRenderer
            .render_entity(MediaType::TextOcci, &Entity::Resource(res.clone()))
            .unwrap()
        else {
            panic!("expected headers");
        };
        let coll = TextRenderer
            .parse_collection(
                MediaType::TextOcci,
                "",
                &headers,
                &model,
                CollectionType::Resource,
            )
            .unwrap();
        assert_eq!(
            coll.resources[0].attribute("occi.compute.hostname"),
            Some(&AttributeValue::String("café".to_string()))
        );
    }

    #[test]
    fn test_parse_model_escaped_title() {
        let model = TextRenderer
            .parse_model(
                MediaType::TextPlain,
                "Category: x; scheme=\"http://a#\"; class=\"kind\"; title=\"C:\\\\temp \\\"v\\\"\"\n",
                &HeaderMap::new(),
            )
            .unwrap();
        let kind = model.resolve_kind("x").unwrap().unwrap();
        let expected = AttributeValue::parse(r#""C:\\temp \"v\"""#);
        assert_eq!(kind.category.title.as_deref(), Some("C:\\temp \"v\""));
        assert_eq!(
            expected,
            AttributeValue::String("C:\\temp \"v\"".to_string())
        );
    }

    #[test]
    fn test_render_action() {
        let model = model();
        let mut action = EntityBuilder::new(&model)
            .new_action_instance("start")
            .unwrap();
        action.set_attribute("method", "graceful");
        let Rendering::Body(body) = TextRenderer
            .render_action(MediaType::TextPlain, &action)
            .unwrap()
        else {
            panic!("expected a body");
        };
        assert_eq!(
            body,
            "Category: start; scheme=\"http://schemas.ogf.org/occi/infrastructure/compute/action#\"; class=\"action\"\n\
             X-OCCI-Attribute: method=\"graceful\"\n"
        );
        assert_eq!(
            TextRenderer
                .render_action(MediaType::TextUriList, &action)
                .err()
                .unwrap()
                .kind(),
            ErrorKind::InvalidInput
        );
    }
}
