// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Aggregation of many runs into a sweep table.

Rows are sorted deterministically by a list of sweep keys (branch angle,
then width ratio, by default) with the run id as the final tie-breaker, so
the same set of runs always produces the same table.
*/

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::activation::ActivationTime;
use crate::conduction::{ConductionTime, SignConvention};
use crate::error::AnalysisResult;
use crate::records::RunRecord;

/// CSV header of [`SweepTable::write_csv`]
pub const SWEEP_CSV_HEADER: [&str; 6] = [
    "run_id",
    "theta",
    "width_ratio",
    "active_left",
    "active_right",
    "conduction_time",
];

/// One run reduced to the quantities a sweep plots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConductionRecord {
    pub run_id: String,
    /// Branch angle in degrees (`atan(slope)` for slope geometries)
    pub theta: f64,
    /// `w2 / w1`
    pub width_ratio: f64,
    pub active_left: ActivationTime,
    pub active_right: ActivationTime,
    pub conduction_time: ConductionTime,
}

impl ConductionRecord {
    pub fn from_run(run: &RunRecord, convention: SignConvention) -> Self {
        Self {
            run_id: run.run_id.clone(),
            theta: run.geometry.branch_angle_degrees(),
            width_ratio: run.geometry.width_ratio(),
            active_left: run.active_left,
            active_right: run.active_right,
            conduction_time: run.conduction_time(convention),
        }
    }

    fn key(&self, key: SweepKey) -> f64 {
        match key {
            SweepKey::Theta => self.theta,
            SweepKey::WidthRatio => self.width_ratio,
        }
    }
}

/// Sweep parameter usable as a sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKey {
    Theta,
    WidthRatio,
}

/// Branch angle first, then width ratio
pub const DEFAULT_SWEEP_KEYS: [SweepKey; 2] = [SweepKey::Theta, SweepKey::WidthRatio];

impl FromStr for SweepKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "theta" | "angle" => Ok(SweepKey::Theta),
            "width_ratio" | "ratio" => Ok(SweepKey::WidthRatio),
            other => Err(format!(
                "unknown sweep key '{}' (expected theta or width_ratio)",
                other
            )),
        }
    }
}

impl fmt::Display for SweepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepKey::Theta => write!(f, "theta"),
            SweepKey::WidthRatio => write!(f, "width_ratio"),
        }
    }
}

/// Conduction times along the angle axis for one width ratio
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSeries {
    pub width_ratio: f64,
    /// (theta, conduction time), ascending theta
    pub points: Vec<(f64, ConductionTime)>,
}

/// Sorted collection of [`ConductionRecord`]s
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepTable {
    records: Vec<ConductionRecord>,
}

impl SweepTable {
    /// Table sorted by [`DEFAULT_SWEEP_KEYS`]
    pub fn new(records: Vec<ConductionRecord>) -> Self {
        let mut table = Self { records };
        table.sort_by_keys(&DEFAULT_SWEEP_KEYS);
        table
    }

    /// Reduce persisted runs; with `stimulation_aware` each run's sign
    /// follows the side it was paced from
    pub fn from_runs(runs: &[RunRecord], stimulation_aware: bool) -> Self {
        let records = runs
            .iter()
            .map(|run| {
                let convention = if stimulation_aware {
                    run.stimulation_aware_convention()
                } else {
                    SignConvention::LeftToRight
                };
                ConductionRecord::from_run(run, convention)
            })
            .collect();
        Self::new(records)
    }

    /// Re-sort by `keys` in order; run id breaks remaining ties
    pub fn sort_by_keys(&mut self, keys: &[SweepKey]) {
        self.records.sort_by(|a, b| {
            keys.iter()
                .map(|&key| a.key(key).total_cmp(&b.key(key)))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.run_id.cmp(&b.run_id))
        });
    }

    pub fn records(&self) -> &[ConductionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One series per distinct width ratio, ascending; points by ascending theta
    pub fn series_by_width_ratio(&self) -> Vec<SweepSeries> {
        let mut sorted: Vec<&ConductionRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| {
            a.width_ratio
                .total_cmp(&b.width_ratio)
                .then_with(|| a.theta.total_cmp(&b.theta))
                .then_with(|| a.run_id.cmp(&b.run_id))
        });

        let mut series: Vec<SweepSeries> = Vec::new();
        for record in sorted {
            match series.last_mut() {
                Some(current) if current.width_ratio.total_cmp(&record.width_ratio).is_eq() => {
                    current.points.push((record.theta, record.conduction_time));
                }
                _ => series.push(SweepSeries {
                    width_ratio: record.width_ratio,
                    points: vec![(record.theta, record.conduction_time)],
                }),
            }
        }
        series
    }

    /// Write as CSV; undefined values become empty cells
    pub fn write_csv<W: Write>(&self, writer: W) -> AnalysisResult<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(SWEEP_CSV_HEADER)?;
        for record in &self.records {
            writer.write_record([
                record.run_id.clone(),
                record.theta.to_string(),
                record.width_ratio.to_string(),
                optional(record.active_left.time()),
                optional(record.active_right.time()),
                optional(record.conduction_time.value()),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
