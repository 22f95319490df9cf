//! Expected goals (xG) from a chance/rating matrix, plus the match clock and
//! shot positions that go with it.
//!
//! A shot clip carries one qualifier in the chance category (how good the
//! chance was) and one in the xG category (where it was taken from). The
//! model maps each `(chance, rating)` pair to a goal probability.
//! Clips without both times have no match minute and are left out of every
//! time series.
use serde::{Deserialize, Serialize};

use crate::aggregate::{ClipRecord, Filter, clip_records, count_clips};
use crate::construct::Timeline;
use crate::criteria::{Criterion, SearchCriteria};

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn minutes_since(time: f64, kickoff: f64) -> i64 {
    round_half_up((time - kickoff) / 60.0) as i64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XgModel {
    pub chance_category: String,
    pub chance_names: Vec<String>,
    pub xg_category: String,
    pub xg_names: Vec<String>,
    /// One row per chance name, one column per xG name.
    pub matrix: Vec<Vec<f64>>,
}

impl XgModel {
    pub fn value(&self, chance: &str, xg: &str) -> Option<f64> {
        let i = self.chance_names.iter().position(|c| c == chance)?;
        let j = self.xg_names.iter().position(|x| x == xg)?;
        self.matrix.get(i)?.get(j).copied()
    }

    /// Sum over every matrix cell of its probability times the number of
    /// clips in `row` carrying both qualifiers.
    pub fn total(&self, timeline: &Timeline, row: &str) -> f64 {
        let filter = Filter::row(row);
        let mut xg_sum = 0.0;
        for (i, chance) in self.chance_names.iter().enumerate() {
            for (j, xg) in self.xg_names.iter().enumerate() {
                let Some(weight) = self.matrix.get(i).and_then(|r| r.get(j)) else {
                    continue;
                };
                let criteria = SearchCriteria::from(vec![
                    Criterion::new(&self.xg_category, xg),
                    Criterion::new(&self.chance_category, chance),
                ]);
                xg_sum += count_clips(timeline, &filter, &criteria) as f64 * weight;
            }
        }
        xg_sum
    }

    fn clip_value(&self, record: &ClipRecord) -> f64 {
        let chance = record.qualifier(&self.chance_category).map(|q| q.name());
        let xg = record.qualifier(&self.xg_category).map(|q| q.name());
        match (chance, xg) {
            (Some(chance), Some(xg)) => self.value(chance, xg).unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Cumulative xG after each clip, keyed by match minute of the clip's
    /// midpoint.
    pub fn tracker(&self, records: &[ClipRecord], kickoff: f64) -> Vec<(i64, f64)> {
        let mut cumulative_xg = 0.0;
        records
            .iter()
            .filter_map(|record| {
                let midpoint = record.clip().midpoint()?;
                cumulative_xg += self.clip_value(record);
                Some((minutes_since(midpoint, kickoff), cumulative_xg))
            })
            .collect()
    }

    /// Same as [`XgModel::tracker`] but shaped for a step plot: it starts at
    /// the origin and holds the previous total until each clip's minute.
    pub fn tracker_plot(&self, records: &[ClipRecord], kickoff: f64) -> Vec<(i64, f64)> {
        let mut points = vec![(0, 0.0)];
        let mut cumulative_xg = 0.0;
        for record in records {
            let Some(midpoint) = record.clip().midpoint() else {
                continue;
            };
            let minute = minutes_since(midpoint, kickoff);
            points.push((minute, cumulative_xg));
            cumulative_xg += self.clip_value(record);
            points.push((minute, cumulative_xg));
        }
        points
    }
}

/// Minutes elapsed between the first kickoff clip and the latest end of any
/// row's last clip, rounded up.
pub fn game_clock(timeline: &Timeline, kickoff_row: &str) -> Option<i64> {
    let kickoff = clip_records(timeline, kickoff_row, "")
        .first()
        .and_then(|record| record.clip().midpoint())
        .map(round_half_up)?;
    let latest = timeline
        .rows()
        .iter()
        .filter_map(|row| row.clips().last()?.time_end())
        .reduce(f64::max)?;
    Some(((latest - kickoff) / 60.0).ceil() as i64)
}

fn score_points(name: &str) -> Option<f64> {
    let name = name.trim();
    if name.is_empty() {
        return Some(0.0);
    }
    name.parse().ok()
}

// (minute, points) per scoring qualifier, seeded with the origin and
// ordered by minute. Equal minutes keep clip order.
fn scores(records: &[ClipRecord], kickoff: f64) -> Vec<(i64, f64)> {
    let mut scores = vec![(0, 0.0)];
    for record in records {
        let Some(midpoint) = record.clip().midpoint() else {
            continue;
        };
        let minute = minutes_since(midpoint, kickoff);
        scores.extend(
            record
                .qualifiers
                .iter()
                .filter(|q| matches!(q.category(), "Score" | "score"))
                .filter_map(|q| score_points(q.name()))
                .map(|points| (minute, points)),
        );
    }
    scores.sort_by_key(|&(minute, _)| minute);
    scores
}

/// Cumulative score by match minute. Every qualifier in a `Score` category
/// names the points it adds. Names that are not numbers add nothing.
pub fn got_race(records: &[ClipRecord], kickoff: f64) -> Vec<(i64, f64)> {
    let mut cumulative = 0.0;
    scores(records, kickoff)
        .into_iter()
        .map(|(minute, points)| {
            cumulative += points;
            (minute, cumulative)
        })
        .collect()
}

/// [`got_race`] shaped for a step plot.
pub fn got_race_plot(records: &[ClipRecord], kickoff: f64) -> Vec<(i64, f64)> {
    let mut points = Vec::new();
    let mut cumulative = 0.0;
    for (minute, scored) in scores(records, kickoff) {
        points.push((minute, cumulative));
        cumulative += scored;
        points.push((minute, cumulative));
    }
    points
}

/// `(x, y, clip start)` for every timed clip holding a positioned qualifier
/// with the given name.
pub fn shot_locations(records: &[ClipRecord], qualifier_name: &str) -> Vec<(f64, f64, f64)> {
    records
        .iter()
        .filter_map(|record| {
            let (x, y) = record
                .qualifiers
                .iter()
                .find(|q| q.name() == qualifier_name)?
                .position()?;
            Some((x, y, record.time_start?))
        })
        .collect()
}
