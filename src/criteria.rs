//! Search criteria and how they are matched against qualifiers and clips.
//!
//! A criterion names one qualifier by category and name, where an empty
//! string on either dimension matches anything. An optional attribute map
//! narrows the match further: every `(category, name)` pair in it must be
//! satisfied by at least one attribute of the qualifier. Pairs are checked
//! independently, so one attribute may satisfy several pairs.
//!
//! On the wire a criterion is a JSON object, either in the short form
//! `{"Chance Quality": "Big Chance", "attributes": {...}}` or in the explicit
//! form `{"category": "Chance Quality", "name": "Big Chance"}`.
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use std::fmt;

use crate::construct::{Attribute, Clip, Qualifier};

const ATTRIBUTES: &str = "attributes";

/// How the name half of an attribute pair is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeNames {
    /// The attribute name must equal the requested name.
    Exact,
    /// An empty requested name matches any attribute name.
    Wildcard,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "IndexMap<String, Value>")]
pub struct Criterion {
    category: String,
    name: String,
    attributes: IndexMap<String, String>,
}

impl Criterion {
    pub fn new(category: &str, name: &str) -> Self {
        Self {
            category: category.to_owned(),
            name: name.to_owned(),
            attributes: IndexMap::new(),
        }
    }
    /// Matches every qualifier.
    pub fn any() -> Self {
        Self::default()
    }
    pub fn with_attribute(mut self, category: &str, name: &str) -> Self {
        self.attributes.insert(category.to_owned(), name.to_owned());
        self
    }
    pub fn category(&self) -> &str {
        &self.category
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    fn matches_tag(&self, qualifier: &Qualifier) -> bool {
        (self.category.is_empty() || qualifier.category() == self.category)
            && (self.name.is_empty() || qualifier.name() == self.name)
    }

    fn matches_attributes(&self, attributes: &[Attribute], names: AttributeNames) -> bool {
        if self.attributes.is_empty() {
            return true;
        }
        if attributes.is_empty() {
            return false;
        }
        self.attributes.iter().all(|(category, name)| {
            attributes.iter().any(|attribute| {
                (category.is_empty() || attribute.category() == category)
                    && (attribute.name() == name
                        || (names == AttributeNames::Wildcard && name.is_empty()))
            })
        })
    }

    /// Category, name and every attribute pair must hold.
    pub fn matches(&self, qualifier: &Qualifier) -> bool {
        self.matches_tag(qualifier)
            && self.matches_attributes(qualifier.attributes(), AttributeNames::Exact)
    }

    /// The gate used when detecting attribute sequences: the qualifier must
    /// carry attributes at all, and empty attribute names act as wildcards.
    pub fn matches_attribute_gate(&self, qualifier: &Qualifier) -> bool {
        self.matches_tag(qualifier)
            && !qualifier.attributes().is_empty()
            && self.matches_attributes(qualifier.attributes(), AttributeNames::Wildcard)
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl TryFrom<IndexMap<String, Value>> for Criterion {
    type Error = String;

    fn try_from(mut map: IndexMap<String, Value>) -> Result<Self, Self::Error> {
        let attributes = match map.shift_remove(ATTRIBUTES) {
            None | Some(Value::Null) => IndexMap::new(),
            Some(Value::Object(pairs)) => pairs.iter().map(|(k, v)| (k.clone(), text(v))).collect(),
            Some(other) => return Err(format!("criterion attributes must be an object, found {other}")),
        };
        let explicit = !map.is_empty() && map.keys().all(|k| k == "category" || k == "name");
        let (category, name) = if explicit {
            (
                map.get("category").map(text).unwrap_or_default(),
                map.get("name").map(text).unwrap_or_default(),
            )
        } else {
            // a missing key degrades to a wildcard on both dimensions
            map.first()
                .map(|(category, name)| (category.clone(), text(name)))
                .unwrap_or_default()
        };
        Ok(Self { category, name, attributes })
    }
}

impl Serialize for Criterion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.attributes.is_empty() { 1 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry(&self.category, &self.name)?;
        if !self.attributes.is_empty() {
            map.serialize_entry(ATTRIBUTES, &self.attributes)?;
        }
        map.end()
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.name)?;
        if !self.attributes.is_empty() {
            let pairs: Vec<String> = self
                .attributes
                .iter()
                .map(|(category, name)| format!("{category}: {name}"))
                .collect();
            write!(f, " ({})", pairs.join(", "))?;
        }
        Ok(())
    }
}

/// An ordered list of criteria. Whether order matters depends on the
/// operation: clip counting treats it as a set, pattern detection as a
/// sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchCriteria(Vec<Criterion>);

impl SearchCriteria {
    pub fn new() -> Self {
        Self(Vec::new())
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Criterion> {
        self.0.iter()
    }
    pub fn as_slice(&self) -> &[Criterion] {
        &self.0
    }
}
impl From<Vec<Criterion>> for SearchCriteria {
    fn from(criteria: Vec<Criterion>) -> Self {
        Self(criteria)
    }
}
impl FromIterator<Criterion> for SearchCriteria {
    fn from_iter<I: IntoIterator<Item = Criterion>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
impl<'a> IntoIterator for &'a SearchCriteria {
    type Item = &'a Criterion;
    type IntoIter = std::slice::Iter<'a, Criterion>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(Criterion::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

pub fn matches(qualifier: &Qualifier, criterion: &Criterion) -> bool {
    criterion.matches(qualifier)
}

/// Unordered AND over the criteria: each one must be met by some qualifier
/// of the clip, and a single qualifier may meet several of them.
pub fn matches_clip(clip: &Clip, criteria: &SearchCriteria) -> bool {
    criteria
        .iter()
        .all(|criterion| clip.qualifiers().iter().any(|qualifier| criterion.matches(qualifier)))
}
