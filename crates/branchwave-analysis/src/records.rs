// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Run records and their on-disk store.

Each run lives in its own directory under an output root:

```text
<output_dir>/
  20250314-101500-theta_150/
    run_record.json     geometry, model parameters, activation times
    df_voltage.csv      optional full time series
```

Run ids start with a `YYYYmmdd-HHMMSS` timestamp so lexical order is
chronological order.
*/

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use branchwave_geometry::{BranchGeometry, StimulationSide};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::activation::ActivationTime;
use crate::conduction::{conduction_time, ConductionTime, SignConvention};
use crate::error::AnalysisResult;
use crate::time_series::TimeSeries;

/// Record file inside a run directory
pub const RUN_RECORD_FILE: &str = "run_record.json";

/// Voltage table inside a run directory
pub const VOLTAGE_FILE: &str = "df_voltage.csv";

/// Which end of the main channel is paced, and how many columns wide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StimulationSettings {
    pub side: StimulationSide,
    pub width: usize,
}

impl Default for StimulationSettings {
    fn default() -> Self {
        Self {
            side: StimulationSide::Left,
            width: 4,
        }
    }
}

/// Columns of the two measurement strips and the activation threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementSettings {
    pub left_column: usize,
    pub right_column: usize,
    pub threshold: f64,
}

impl Default for MeasurementSettings {
    fn default() -> Self {
        Self {
            left_column: 20,
            right_column: 120,
            threshold: 0.0,
        }
    }
}

/// Everything needed to reproduce and analyse one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub geometry: BranchGeometry,
    pub conductance: f64,
    pub stimulation: StimulationSettings,
    pub measurement: MeasurementSettings,
    /// Solver model parameters, by name
    #[serde(default)]
    pub model: BTreeMap<String, f64>,
    pub active_left: ActivationTime,
    pub active_right: ActivationTime,
}

impl RunRecord {
    pub fn conduction_time(&self, convention: SignConvention) -> ConductionTime {
        conduction_time(self.active_left, self.active_right, convention)
    }

    /// Convention that follows this run's paced side
    pub fn stimulation_aware_convention(&self) -> SignConvention {
        SignConvention::StimulationAware(self.stimulation.side)
    }
}

/// `YYYYmmdd-HHMMSS-<run_name>`; characters unsafe in a directory name become `_`
pub fn make_run_id(run_name: &str, timestamp: NaiveDateTime) -> String {
    let name: String = run_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}-{}", timestamp.format("%Y%m%d-%H%M%S"), name)
}

/// Run id stamped with the current local time
pub fn new_run_id(run_name: &str) -> String {
    make_run_id(run_name, Local::now().naive_local())
}

/// Directory-per-run persistence of [`RunRecord`]s
#[derive(Debug, Clone)]
pub struct RunStore {
    root: PathBuf,
}

impl RunStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root.join(run_id)
    }

    /// Write `record` (and `series`, when given) into the run's directory
    pub fn save(&self, record: &RunRecord, series: Option<&TimeSeries>) -> AnalysisResult<PathBuf> {
        let dir = self.run_dir(&record.run_id);
        fs::create_dir_all(&dir)?;

        let mut writer = BufWriter::new(File::create(dir.join(RUN_RECORD_FILE))?);
        serde_json::to_writer_pretty(&mut writer, record)?;
        writer.flush()?;

        if let Some(series) = series {
            series.write_csv_path(dir.join(VOLTAGE_FILE))?;
        }

        info!(
            "[RUN-STORE] Saved run {} to {}",
            record.run_id,
            dir.display()
        );
        Ok(dir)
    }

    pub fn load(&self, run_id: &str) -> AnalysisResult<RunRecord> {
        load_record(&self.run_dir(run_id).join(RUN_RECORD_FILE))
    }

    pub fn load_series(&self, run_id: &str) -> AnalysisResult<TimeSeries> {
        TimeSeries::from_csv_path(self.run_dir(run_id).join(VOLTAGE_FILE))
    }

    /// Every readable record under the root, ordered by run id.
    ///
    /// Directories without a record are ignored; unreadable records are
    /// skipped with a warning. A missing root yields an empty list.
    pub fn load_all(&self) -> AnalysisResult<Vec<RunRecord>> {
        if !self.root.exists() {
            debug!("[RUN-STORE] {} does not exist, no runs", self.root.display());
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let record_path = path.join(RUN_RECORD_FILE);
            if !path.is_dir() || !record_path.is_file() {
                continue;
            }
            match load_record(&record_path) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    "[RUN-STORE] ⚠️ Skipping {}: {}",
                    record_path.display(),
                    e
                ),
            }
        }

        records.sort_by(|a, b| a.run_id.cmp(&b.run_id));
        info!(
            "[RUN-STORE] Loaded {} runs from {}",
            records.len(),
            self.root.display()
        );
        Ok(records)
    }
}

fn load_record(path: &Path) -> AnalysisResult<RunRecord> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
