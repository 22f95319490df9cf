//! Angles – analytics over tagged sports-event timelines.
//!
//! A timeline is a list of *rows* (a team, a player, a phase of play), each
//! holding *clips*: time intervals of interest. Clips are tagged with
//! *qualifiers* (a category and a name, at an instant within the clip), and
//! qualifiers may be refined further by *attributes*.
//! * [`construct::Timeline`] – the read-only model, ingested from JSON.
//! * [`criteria::Criterion`] – one matchable condition: category, name and
//!   optional attribute requirements, with empty strings as wildcards.
//!
//! ## Modules
//! * [`construct`] – Timeline, rows, clips, qualifiers and attributes.
//! * [`index`] – De-duplicated name and category listings.
//! * [`criteria`] – Criteria and how they match qualifiers and clips.
//! * [`pattern`] – Ordered occurrence detection within a clip.
//! * [`aggregate`] – Clip, qualifier, pattern and attribute counts, duration
//!   sums and row × qualifier tables.
//! * [`xg`] – Expected-goals model, match clock and shot positions.
//! * [`expression`] – Typed time-bound expressions (grammar in `expression.pest`).
//! * [`resolve`] – The variable resolver for configuration documents.
//! * [`interface`] – Session and settings used by the `angles` binary.
//!
//! ## Quick Start
//! ```
//! use angles::interface::Session;
//! let session = Session::from_json(r#"{"rows": [{"row_name": "Home Shot", "clips": [
//!     {"uuid": "c1", "time_start": 10, "time_end": 15,
//!      "qualifiers": {"qualifiers_array": [{"category": "Chance Quality", "name": "Big Chance"}]}}
//! ]}]}"#).unwrap();
//! let resolution = session
//!     .resolve_document(r#"{"variables": {"big_chances": ["count_clips", "Home Shot", [{"Chance Quality": "Big Chance"}]]}}"#)
//!     .unwrap();
//! assert_eq!(resolution.get("big_chances").and_then(|v| v.as_number()), Some(1.0));
//! ```
//!
//! ## Diagnostics
//! Every aggregate call emits `tracing` events: one `debug` event per
//! matched clip or pattern occurrence and one `info` summary per call.
//! Install a subscriber (the binary uses `tracing-subscriber` with
//! `RUST_LOG`) to see them.

pub mod aggregate;
pub mod construct;
pub mod criteria;
pub mod error;
pub mod expression;
pub mod index;
pub mod interface;
pub mod pattern;
pub mod resolve;
pub mod xg;

pub use error::{AnglesError, Result};
