//! The variable resolver turns a variables document into named results.
//!
//! A document looks like
//!
//! ```json
//! {
//!   "variables": {
//!     "kickoff":    ["min_time_start", "Kick Off"],
//!     "home_shots": ["count_clips", "Home Shot", [], "kickoff", "kickoff + 2700"]
//!   },
//!   "content": { ... },
//!   "colours": { ... }
//! }
//! ```
//!
//! Each entry is `[operation, row(s), criteria or columns, start, end]`.
//! Entries are resolved strictly in document order, and every bound name
//! is visible to the time bounds of the entries after it. An entry that
//! fails, or names an operation nobody implements, is reported in
//! [`Resolution::skipped`] and does not stop the entries that follow.
//! `content` and `colours` belong to the presentation layer and are kept
//! only so the document survives a round trip.
use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

use std::str::FromStr;

use crate::aggregate::{
    ClipsTable, Filter, all_row_durations, count_attributes, count_clips, count_clips_table,
    count_qualifier_patterns, count_qualifiers, max_time_end, min_time_start, sum_clip_durations,
};
use crate::construct::Timeline;
use crate::criteria::SearchCriteria;
use crate::error::{AnglesError, Result};
use crate::expression::{Scope, TimeExpr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CountClips,
    CountQualifiers,
    CountQualifierPatterns,
    CountAttributes,
    SumClipDurations,
    CountClipsTable,
    MinTimeStart,
    MaxTimeEnd,
    AllRowDurations,
}

impl FromStr for Operation {
    type Err = AnglesError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "count_clips" => Self::CountClips,
            "count_qualifiers" => Self::CountQualifiers,
            "count_qualifier_patterns" => Self::CountQualifierPatterns,
            "count_attributes" => Self::CountAttributes,
            "sum_clip_durations" => Self::SumClipDurations,
            "count_clips_table" => Self::CountClipsTable,
            "min_time_start" => Self::MinTimeStart,
            "max_time_end" => Self::MaxTimeEnd,
            "all_row_durations" => Self::AllRowDurations,
            other => return Err(AnglesError::UnsupportedOperation(other.to_owned())),
        })
    }
}

/// A resolved variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resolved {
    Count(u64),
    Seconds(f64),
    Table(ClipsTable),
    Durations(IndexMap<String, f64>),
}

impl Resolved {
    /// The value as a number, when it is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Count(n) => Some(*n as f64),
            Self::Seconds(s) => Some(*s),
            Self::Table(_) | Self::Durations(_) => None,
        }
    }
}

/// Resolved variables in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Namespace(IndexMap<String, Resolved>);

impl Namespace {
    pub fn get(&self, name: &str) -> Option<&Resolved> {
        self.0.get(name)
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Resolved> {
        self.0.iter()
    }
    fn bind(&mut self, name: &str, value: Resolved) {
        self.0.insert(name.to_owned(), value);
    }
}

impl Scope for Namespace {
    fn number(&self, name: &str) -> Result<f64> {
        self.get(name)
            .ok_or_else(|| AnglesError::UnknownVariable(name.to_owned()))?
            .as_number()
            .ok_or_else(|| AnglesError::NotNumeric { name: name.to_owned() })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariablesDocument {
    #[serde(default)]
    variables: Option<IndexMap<String, Value>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    content: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    colours: IndexMap<String, Value>,
}

impl VariablesDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Self = serde_json::from_str(json)?;
        if document.variables.is_none() {
            return Err(AnglesError::Config("document has no `variables`".into()));
        }
        Ok(document)
    }
    pub fn variables(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.variables.iter().flatten()
    }
    pub fn content(&self) -> &IndexMap<String, Value> {
        &self.content
    }
    pub fn colours(&self) -> &IndexMap<String, Value> {
        &self.colours
    }
}

/// One document entry with its arguments checked but its time bounds not
/// yet evaluated.
#[derive(Debug, Clone)]
struct Entry {
    operation: Operation,
    rows: Value,
    criteria: Value,
    time_start: TimeExpr,
    time_end: TimeExpr,
}

fn invalid(name: &str, message: impl Into<String>) -> AnglesError {
    AnglesError::InvalidEntry { name: name.to_owned(), message: message.into() }
}

impl Entry {
    fn parse(name: &str, raw: &Value) -> Result<Self> {
        let slots = raw
            .as_array()
            .ok_or_else(|| invalid(name, "entry must be an array"))?;
        let operation = slots
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(name, "entry must start with an operation name"))?
            .parse::<Operation>()?;
        Ok(Self {
            operation,
            rows: slots.get(1).cloned().unwrap_or(Value::Null),
            criteria: slots.get(2).cloned().unwrap_or(Value::Null),
            time_start: TimeExpr::from_slot(slots.get(3), TimeExpr::Literal(0.0))?,
            time_end: TimeExpr::from_slot(slots.get(4), TimeExpr::Infinity)?,
        })
    }

    fn row(&self, name: &str) -> Result<String> {
        match &self.rows {
            Value::Null => Ok(String::new()),
            Value::String(row) => Ok(row.clone()),
            other => Err(invalid(name, format!("row must be a string, found {other}"))),
        }
    }

    fn list(name: &str, value: &Value) -> Result<Vec<String>> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::String(s) => Ok(vec![s.clone()]),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(String::from)
                        .ok_or_else(|| invalid(name, format!("expected a string, found {item}")))
                })
                .collect(),
            other => Err(invalid(name, format!("expected a list of names, found {other}"))),
        }
    }

    fn criteria(&self, name: &str) -> Result<SearchCriteria> {
        match &self.criteria {
            Value::Null => Ok(SearchCriteria::new()),
            other => serde_json::from_value(other.clone())
                .map_err(|e| invalid(name, format!("bad search criteria: {e}"))),
        }
    }
}

/// An entry that produced no value, and why.
#[derive(Debug)]
pub struct Skipped {
    pub name: String,
    pub error: AnglesError,
}

impl Serialize for Skipped {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Skipped", 2)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("reason", &self.error.to_string())?;
        s.end()
    }
}

#[derive(Debug, Default, Serialize)]
pub struct Resolution {
    pub values: Namespace,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Skipped>,
}

impl Resolution {
    pub fn get(&self, name: &str) -> Option<&Resolved> {
        self.values.get(name)
    }
}

pub struct Resolver<'t> {
    timeline: &'t Timeline,
}

impl<'t> Resolver<'t> {
    pub fn new(timeline: &'t Timeline) -> Self {
        Self { timeline }
    }

    pub fn resolve_json(&self, json: &str) -> Result<Resolution> {
        Ok(self.resolve(&VariablesDocument::from_json(json)?))
    }

    pub fn resolve(&self, document: &VariablesDocument) -> Resolution {
        let mut resolution = Resolution::default();
        for (name, raw) in document.variables() {
            match self.resolve_entry(name, raw, &resolution.values) {
                Ok(value) => {
                    debug!(variable = name.as_str(), ?value, "bound");
                    resolution.values.bind(name, value);
                }
                Err(error) => {
                    warn!(variable = name.as_str(), %error, "skipped");
                    resolution.skipped.push(Skipped { name: name.clone(), error });
                }
            }
        }
        resolution
    }

    fn resolve_entry(&self, name: &str, raw: &Value, namespace: &Namespace) -> Result<Resolved> {
        let entry = Entry::parse(name, raw)?;
        let time_start = entry.time_start.evaluate(namespace)?;
        let time_end = entry.time_end.evaluate(namespace)?;
        let timeline = self.timeline;
        let filter = || -> Result<Filter> {
            Ok(Filter::row(&entry.row(name)?).between(time_start, time_end))
        };
        Ok(match entry.operation {
            Operation::CountClips => {
                Resolved::Count(count_clips(timeline, &filter()?, &entry.criteria(name)?))
            }
            Operation::CountQualifiers => {
                Resolved::Count(count_qualifiers(timeline, &filter()?, &entry.criteria(name)?))
            }
            Operation::CountQualifierPatterns => Resolved::Count(count_qualifier_patterns(
                timeline,
                &filter()?,
                &entry.criteria(name)?,
            )),
            Operation::CountAttributes => {
                Resolved::Count(count_attributes(timeline, &filter()?, &entry.criteria(name)?))
            }
            Operation::SumClipDurations => {
                Resolved::Seconds(sum_clip_durations(timeline, &filter()?, &entry.criteria(name)?))
            }
            Operation::CountClipsTable => {
                let rows = Entry::list(name, &entry.rows)?;
                let columns = Entry::list(name, &entry.criteria)?;
                Resolved::Table(count_clips_table(timeline, &rows, &columns, time_start, time_end))
            }
            Operation::MinTimeStart => min_time_start(timeline, &entry.row(name)?)
                .map(Resolved::Seconds)
                .ok_or_else(|| invalid(name, "row has no clips"))?,
            Operation::MaxTimeEnd => max_time_end(timeline, &entry.row(name)?)
                .map(Resolved::Seconds)
                .ok_or_else(|| invalid(name, "row has no clips"))?,
            Operation::AllRowDurations => {
                Resolved::Durations(all_row_durations(timeline, &Entry::list(name, &entry.rows)?))
            }
        })
    }
}
