// The timeline is read-only input: rows own clips, clips own qualifiers and
// qualifiers own attributes. Optional collections deserialize to empty ones
// so that traversal never has to distinguish "absent" from "empty".
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// used to print out readable forms of a construct
use std::fmt;
use std::io::Read;

use core::hash::BuildHasherDefault;
use seahash::SeaHasher;

use crate::error::{AnglesError, Result};

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

// Producers emit `null` for missing members as often as they omit them.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ------------- Attribute -------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default, deserialize_with = "nullable")]
    name: String,
    #[serde(default, deserialize_with = "nullable")]
    category: String,
}
impl Attribute {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn category(&self) -> &str {
        &self.category
    }
}
impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.name)
    }
}

// ------------- Qualifier -------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qualifier {
    #[serde(default, deserialize_with = "nullable")]
    name: String,
    #[serde(default, deserialize_with = "nullable")]
    category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    qualifier_attributes: Vec<Attribute>,
}
impl Qualifier {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn category(&self) -> &str {
        &self.category
    }
    /// The instant the qualifier was tagged at, when the producer recorded one.
    pub fn time(&self) -> Option<f64> {
        self.time
    }
    /// Spatial position, only when both coordinates are present.
    pub fn position(&self) -> Option<(f64, f64)> {
        self.x.zip(self.y)
    }
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }
    pub fn attributes(&self) -> &[Attribute] {
        &self.qualifier_attributes
    }
}
impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.name)?;
        if let Some(time) = self.time {
            write!(f, " @ {time}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Qualifiers {
    #[serde(default, deserialize_with = "nullable")]
    qualifiers_array: Vec<Qualifier>,
}

// ------------- Clip -------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    #[serde(default, deserialize_with = "nullable")]
    uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    qualifiers: Qualifiers,
}
impl Clip {
    pub fn uuid(&self) -> &str {
        &self.uuid
    }
    pub fn time_start(&self) -> Option<f64> {
        self.time_start
    }
    pub fn time_end(&self) -> Option<f64> {
        self.time_end
    }
    /// Only defined when both ends are known.
    pub fn duration(&self) -> Option<f64> {
        Some(self.time_end? - self.time_start?)
    }
    /// Midpoint of the clip, used as "the" time of an event.
    pub fn midpoint(&self) -> Option<f64> {
        Some((self.time_start? + self.time_end?) / 2.0)
    }
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }
    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers.qualifiers_array
    }
}

// ------------- Row -------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default, deserialize_with = "nullable")]
    row_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    row_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    clips: Vec<Clip>,
}
impl Row {
    pub fn name(&self) -> &str {
        &self.row_name
    }
    pub fn category(&self) -> Option<&str> {
        self.row_category.as_deref()
    }
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }
    pub fn has_clips(&self) -> bool {
        !self.clips.is_empty()
    }
}

// ------------- Timeline -------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    rows: Vec<Row>,
}

impl Timeline {
    /// Builds a timeline from an already parsed JSON document. A document
    /// without a top-level `rows` array is rejected, everything below that
    /// level is optional.
    pub fn from_value(value: Value) -> Result<Self> {
        match value.get("rows") {
            Some(Value::Array(_)) => Ok(serde_json::from_value(value)?),
            Some(_) => Err(AnglesError::Config("timeline `rows` must be an array".into())),
            None => Err(AnglesError::Config("timeline has no `rows`".into())),
        }
    }
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_value(serde_json::from_reader(reader)?)
    }
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
    /// Every clip in the timeline together with the row it belongs to.
    pub fn clips(&self) -> impl Iterator<Item = (&Row, &Clip)> {
        self.rows
            .iter()
            .flat_map(|row| row.clips().iter().map(move |clip| (row, clip)))
    }
    pub fn qualifiers(&self) -> impl Iterator<Item = &Qualifier> {
        self.clips().flat_map(|(_, clip)| clip.qualifiers().iter())
    }
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.qualifiers().flat_map(|qualifier| qualifier.attributes().iter())
    }
}
