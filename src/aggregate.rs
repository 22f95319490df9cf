//! Counting and summing over a [`Timeline`].
//!
//! Every operation takes a [`Filter`] (row name, row category, time window)
//! and a [`SearchCriteria`]. They never mutate the timeline and return zero
//! values when nothing matches. The time window is applied to different
//! clip fields depending on the operation:
//!
//! | operation                  | clip kept when                                     |
//! |----------------------------|----------------------------------------------------|
//! | `count_clips`              | `time_start` within the window                     |
//! | `count_qualifiers`         | `time_start >= start`, `time_end <= end`, and the qualifier's own `time` within the window |
//! | patterns, attributes, sums | `time_start >= start` and `time_end <= end`        |
//!
//! A time the producer left out never rejects a clip or a qualifier.
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::construct::{Clip, Qualifier, Row, Timeline};
use crate::criteria::{Criterion, SearchCriteria, matches_clip};
use crate::index::Indexer;
use crate::pattern::{Gate, PatternMatcher};

pub const ALL_ROWS: &str = "all_rows";
pub const ALL_QUALIFIERS: &str = "all_qualifiers";

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    row: String,
    row_category: String,
    time_start: f64,
    time_end: f64,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            row: String::new(),
            row_category: String::new(),
            time_start: 0.0,
            time_end: f64::INFINITY,
        }
    }
}

impl Filter {
    /// Only rows with exactly this name. An empty name admits every row.
    pub fn row(name: &str) -> Self {
        Self { row: name.to_owned(), ..Self::default() }
    }
    pub fn in_category(mut self, category: &str) -> Self {
        self.row_category = category.to_owned();
        self
    }
    pub fn between(mut self, time_start: f64, time_end: f64) -> Self {
        self.time_start = time_start;
        self.time_end = time_end;
        self
    }
    pub fn row_name(&self) -> &str {
        &self.row
    }
    pub fn time_start(&self) -> f64 {
        self.time_start
    }
    pub fn time_end(&self) -> f64 {
        self.time_end
    }

    fn admits(&self, row: &Row) -> bool {
        (self.row.is_empty() || row.name() == self.row)
            && (self.row_category.is_empty() || row.category() == Some(self.row_category.as_str()))
    }
    fn rows<'t>(&self, timeline: &'t Timeline) -> impl Iterator<Item = &'t Row> {
        timeline.rows().iter().filter(|row| self.admits(row))
    }
    fn clips<'t>(&self, timeline: &'t Timeline) -> impl Iterator<Item = &'t Clip> {
        self.rows(timeline).flat_map(|row| row.clips())
    }

    // Only a known time can reject. A missing or NaN time never excludes.
    fn not_before(&self, time: Option<f64>) -> bool {
        time.is_none_or(|t| !(t < self.time_start))
    }
    fn not_after(&self, time: Option<f64>) -> bool {
        time.is_none_or(|t| !(t > self.time_end))
    }
    fn starts_within(&self, clip: &Clip) -> bool {
        self.not_before(clip.time_start()) && self.not_after(clip.time_start())
    }
    fn spans_within(&self, clip: &Clip) -> bool {
        self.not_before(clip.time_start()) && self.not_after(clip.time_end())
    }
    fn instant_within(&self, qualifier: &Qualifier) -> bool {
        self.not_before(qualifier.time()) && self.not_after(qualifier.time())
    }
}

/// Rounds half toward positive infinity at two decimals.
fn round_hundredths(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

pub fn count_clips(timeline: &Timeline, filter: &Filter, criteria: &SearchCriteria) -> u64 {
    let mut clip_count = 0;
    for clip in filter.clips(timeline) {
        if !filter.starts_within(clip) {
            continue;
        }
        if criteria.is_empty() {
            clip_count += 1;
        } else if matches_clip(clip, criteria) {
            clip_count += 1;
            debug!(uuid = clip.uuid(), total = clip_count, "clip matched");
        }
    }
    info!(row = filter.row_name(), total = clip_count, %criteria, "count_clips");
    clip_count
}

/// Counts qualifiers per criterion and sums the per-criterion counts, so a
/// qualifier meeting two criteria is counted twice.
pub fn count_qualifiers(timeline: &Timeline, filter: &Filter, criteria: &SearchCriteria) -> u64 {
    let mut total_qualifier_count = 0;
    for criterion in criteria {
        let qualifier_count = filter
            .clips(timeline)
            .filter(|clip| filter.spans_within(clip))
            .flat_map(|clip| clip.qualifiers())
            .filter(|qualifier| filter.instant_within(qualifier) && criterion.matches(qualifier))
            .count() as u64;
        debug!(%criterion, count = qualifier_count, "qualifiers matched");
        total_qualifier_count += qualifier_count;
    }
    info!(row = filter.row_name(), total = total_qualifier_count, %criteria, "count_qualifiers");
    total_qualifier_count
}

fn count_sequences(
    timeline: &Timeline,
    filter: &Filter,
    criteria: &SearchCriteria,
    gate: Gate,
) -> u64 {
    let matcher = PatternMatcher::new(criteria.as_slice()).with_gate(gate);
    let mut pattern_count = 0;
    for clip in filter.clips(timeline) {
        if !filter.spans_within(clip) {
            continue;
        }
        for _ in matcher.occurrences(clip.qualifiers()) {
            pattern_count += 1;
            debug!(uuid = clip.uuid(), total = pattern_count, "pattern occurrence");
        }
    }
    pattern_count
}

pub fn count_qualifier_patterns(
    timeline: &Timeline,
    filter: &Filter,
    criteria: &SearchCriteria,
) -> u64 {
    let total = count_sequences(timeline, filter, criteria, Gate::Qualifier);
    info!(row = filter.row_name(), total, %criteria, "count_qualifier_patterns");
    total
}

pub fn count_attributes(timeline: &Timeline, filter: &Filter, criteria: &SearchCriteria) -> u64 {
    let total = count_sequences(timeline, filter, criteria, Gate::AttributeSequence);
    info!(row = filter.row_name(), total, %criteria, "count_attributes");
    total
}

pub fn sum_clip_durations(timeline: &Timeline, filter: &Filter, criteria: &SearchCriteria) -> f64 {
    let mut total_duration = 0.0;
    for clip in filter.clips(timeline) {
        if !filter.spans_within(clip) {
            continue;
        }
        if !criteria.is_empty() && !matches_clip(clip, criteria) {
            continue;
        }
        // an untimed clip has no length to add
        let Some(clip_duration) = clip.duration().map(round_hundredths) else {
            continue;
        };
        total_duration += clip_duration;
        debug!(uuid = clip.uuid(), duration = clip_duration, total = total_duration, "clip duration");
    }
    info!(row = filter.row_name(), total = total_duration, %criteria, "sum_clip_durations");
    total_duration
}

/// Total clip duration per row, with no criteria and no time window.
pub fn all_row_durations(timeline: &Timeline, rows: &[String]) -> IndexMap<String, f64> {
    rows.iter()
        .map(|row| {
            let total = sum_clip_durations(timeline, &Filter::row(row), &SearchCriteria::new());
            (row.clone(), total)
        })
        .collect()
}

/// Clip counts per qualifier (columns) and row. Serializes as an object
/// whose `Clips` member lists the rows, followed by one member per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipsTable {
    rows: Vec<String>,
    columns: IndexMap<String, Vec<u64>>,
}

impl ClipsTable {
    pub fn rows(&self) -> &[String] {
        &self.rows
    }
    pub fn columns(&self) -> &IndexMap<String, Vec<u64>> {
        &self.columns
    }
    pub fn column(&self, qualifier: &str) -> Option<&[u64]> {
        self.columns.get(qualifier).map(Vec::as_slice)
    }
}

impl Serialize for ClipsTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len() + 1))?;
        map.serialize_entry("Clips", &self.rows)?;
        for (qualifier, counts) in &self.columns {
            map.serialize_entry(qualifier, counts)?;
        }
        map.end()
    }
}

fn expand(tokens: &[String], token: &str, everything: impl FnOnce() -> Vec<String>) -> Vec<String> {
    match tokens.first() {
        Some(first) if first == token => everything(),
        _ => tokens.to_vec(),
    }
}

/// `rows` may start with `all_rows` and `columns` with `all_qualifiers` to
/// stand for every row name and every qualifier name in the timeline.
pub fn count_clips_table(
    timeline: &Timeline,
    rows: &[String],
    columns: &[String],
    time_start: f64,
    time_end: f64,
) -> ClipsTable {
    let indexer = Indexer::new(timeline);
    let rows = expand(rows, ALL_ROWS, || indexer.row_names());
    let qualifiers = expand(columns, ALL_QUALIFIERS, || indexer.qualifier_names());
    let mut columns = IndexMap::new();
    for qualifier in qualifiers {
        let criteria = SearchCriteria::from(vec![Criterion::new("", &qualifier)]);
        let counts = rows
            .iter()
            .map(|row| count_clips(timeline, &Filter::row(row).between(time_start, time_end), &criteria))
            .collect();
        columns.insert(qualifier, counts);
    }
    ClipsTable { rows, columns }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipTime {
    Start,
    End,
}

/// Start or end times of the clips of a row, or of every row when the name
/// is empty, in timeline order. Clips missing that time are left out, but a
/// time of `0` is kept.
pub fn clip_times(timeline: &Timeline, row: &str, which: ClipTime) -> Vec<f64> {
    Filter::row(row)
        .clips(timeline)
        .filter_map(|clip| match which {
            ClipTime::Start => clip.time_start(),
            ClipTime::End => clip.time_end(),
        })
        .collect()
}

/// Earliest clip start. A clip starting at `0` counts, so it wins over any
/// later start.
pub fn min_time_start(timeline: &Timeline, row: &str) -> Option<f64> {
    let mut times = clip_times(timeline, row, ClipTime::Start);
    times.sort_by(f64::total_cmp);
    times.first().copied()
}

pub fn max_time_end(timeline: &Timeline, row: &str) -> Option<f64> {
    let mut times = clip_times(timeline, row, ClipTime::End);
    times.sort_by(f64::total_cmp);
    times.last().copied()
}

/// A clip together with the row it came from, flattened for consumers that
/// work per event rather than per row.
#[derive(Debug, Clone, Serialize)]
pub struct ClipRecord<'t> {
    pub row_name: &'t str,
    pub time_start: Option<f64>,
    pub time_end: Option<f64>,
    pub color: Option<&'t str>,
    pub qualifiers: &'t [Qualifier],
    #[serde(skip)]
    clip: &'t Clip,
}

impl<'t> ClipRecord<'t> {
    pub fn clip(&self) -> &'t Clip {
        self.clip
    }
    pub fn qualifier(&self, category: &str) -> Option<&'t Qualifier> {
        self.qualifiers.iter().find(|q| q.category() == category)
    }
}

/// Every clip of the named row. A non-empty `row_category` must also match
/// the row's category.
pub fn clip_records<'t>(timeline: &'t Timeline, row: &str, row_category: &str) -> Vec<ClipRecord<'t>> {
    let filter = Filter::row(row).in_category(row_category);
    filter
        .rows(timeline)
        .filter(|r| r.name() == row)
        .flat_map(|r| {
            r.clips().iter().map(move |clip| ClipRecord {
                row_name: r.name(),
                time_start: clip.time_start(),
                time_end: clip.time_end(),
                color: clip.color(),
                qualifiers: clip.qualifiers(),
                clip,
            })
        })
        .collect()
}

/// Whole-number percentage, floored. A ratio that is not a finite number
/// yields zero.
pub fn percentage(numerator: f64, denominator: f64) -> i64 {
    let percent = ((numerator / denominator) * 100.0).floor();
    if percent.is_finite() { percent as i64 } else { 0 }
}
