// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Per-cell time series produced by the cable solver.

Samples are rows, channels are columns in cell-index order, so channel `i`
is always the signal of `CellId(i)`. Tabular input names channels
`cell {index}`; those names are resolved once at ingestion into a typed
column layout and never re-parsed afterwards.
*/

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use branchwave_geometry::CellId;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};

/// Header of the time column
pub const TIME_COLUMN: &str = "time";

/// Prefix of channel columns (`cell 0`, `cell 1`, ...)
pub const CELL_COLUMN_PREFIX: &str = "cell ";

/// Column name for a cell's channel
pub fn channel_name(id: CellId) -> String {
    format!("{}{}", CELL_COLUMN_PREFIX, id.index())
}

/// Inverse of [`channel_name`]
pub fn parse_channel_name(name: &str) -> Option<CellId> {
    let digits = name.strip_prefix(CELL_COLUMN_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(CellId)
}

/// Time-indexed table with one channel per cell
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    times: Array1<f64>,
    values: Array2<f64>,
}

impl TimeSeries {
    /// Build from sample times and a `(samples, channels)` value matrix.
    ///
    /// Times must be finite and non-decreasing.
    pub fn new(times: Array1<f64>, values: Array2<f64>) -> AnalysisResult<Self> {
        if values.nrows() != times.len() {
            return Err(AnalysisError::ShapeMismatch(format!(
                "{} time samples but {} value rows",
                times.len(),
                values.nrows()
            )));
        }

        let mut previous = f64::NEG_INFINITY;
        for (index, &time) in times.iter().enumerate() {
            if !time.is_finite() || time < previous {
                return Err(AnalysisError::NonMonotonicTime {
                    index,
                    time,
                    previous,
                });
            }
            previous = time;
        }

        Ok(Self { times, values })
    }

    pub fn times(&self) -> &Array1<f64> {
        &self.times
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn sample_count(&self) -> usize {
        self.times.len()
    }

    pub fn channel_count(&self) -> usize {
        self.values.ncols()
    }

    /// Signal of one cell over time
    pub fn channel(&self, id: CellId) -> AnalysisResult<ArrayView1<'_, f64>> {
        self.check_channel(id)?;
        Ok(self.values.column(id.index()))
    }

    /// Equal-weight mean over `cells` at every sample
    pub fn strip_mean(&self, cells: &[CellId]) -> AnalysisResult<Array1<f64>> {
        for &id in cells {
            self.check_channel(id)?;
        }
        let columns: Vec<usize> = cells.iter().map(|id| id.index()).collect();
        self.values
            .select(Axis(1), &columns)
            .mean_axis(Axis(1))
            .ok_or_else(|| AnalysisError::EmptyStrip("strip".to_string()))
    }

    fn check_channel(&self, id: CellId) -> AnalysisResult<()> {
        if id.index() >= self.channel_count() {
            return Err(AnalysisError::ShapeMismatch(format!(
                "{} requested but series has {} channels",
                id,
                self.channel_count()
            )));
        }
        Ok(())
    }

    /// Ingest a `time, cell 0, cell 1, ...` table; columns may come in any order
    pub fn from_csv_reader<R: Read>(reader: R) -> AnalysisResult<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();
        let layout = ColumnLayout::resolve(&headers)?;

        let channels = layout.channels.len();
        let mut times = Vec::new();
        let mut data = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            times.push(parse_field(&record, &headers, layout.time, row)?);
            for &column in &layout.channels {
                data.push(parse_field(&record, &headers, column, row)?);
            }
        }

        let values = Array2::from_shape_vec((times.len(), channels), data)
            .map_err(|e| AnalysisError::ShapeMismatch(e.to_string()))?;
        debug!(
            "[ANALYSIS] Ingested time series: {} samples x {} channels",
            times.len(),
            channels
        );
        Self::new(Array1::from(times), values)
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> AnalysisResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_csv_reader(BufReader::new(file))
    }

    /// Write as `time, cell 0, cell 1, ...`
    pub fn write_csv<W: Write>(&self, writer: W) -> AnalysisResult<()> {
        let mut writer = csv::Writer::from_writer(writer);

        let mut header = Vec::with_capacity(self.channel_count() + 1);
        header.push(TIME_COLUMN.to_string());
        header.extend((0..self.channel_count()).map(|i| channel_name(CellId(i))));
        writer.write_record(&header)?;

        for (time, row) in self.times.iter().zip(self.values.rows()) {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(time.to_string());
            record.extend(row.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_csv_path(&self, path: impl AsRef<Path>) -> AnalysisResult<()> {
        let file = File::create(path.as_ref())?;
        self.write_csv(BufWriter::new(file))
    }
}

/// Which CSV column holds the time and which holds each cell's channel
struct ColumnLayout {
    time: usize,
    /// `channels[i]` is the CSV column of `CellId(i)`
    channels: Vec<usize>,
}

impl ColumnLayout {
    fn resolve(headers: &csv::StringRecord) -> AnalysisResult<Self> {
        let mut time_columns = headers
            .iter()
            .enumerate()
            .filter(|(_, name)| name.trim() == TIME_COLUMN)
            .map(|(column, _)| column);
        let time = time_columns.next().ok_or(AnalysisError::MissingTimeColumn)?;
        if time_columns.next().is_some() {
            return Err(AnalysisError::InvalidColumn(format!("{} (duplicate)", TIME_COLUMN)));
        }

        // Every column but `time` is a channel, so indices must stay below this
        let expected = headers.len() - 1;
        let mut by_cell: Vec<Option<usize>> = vec![None; expected];

        for (column, name) in headers.iter().enumerate() {
            if column == time {
                continue;
            }
            let name = name.trim();
            let id = parse_channel_name(name)
                .ok_or_else(|| AnalysisError::InvalidColumn(name.to_string()))?;
            let slot = by_cell.get_mut(id.index()).ok_or_else(|| {
                AnalysisError::ShapeMismatch(format!(
                    "{} out of range for {} channel columns",
                    id, expected
                ))
            })?;
            if slot.replace(column).is_some() {
                return Err(AnalysisError::DuplicateChannel(id));
            }
        }

        let channels = by_cell
            .into_iter()
            .enumerate()
            .map(|(i, column)| column.ok_or(AnalysisError::MissingChannel(CellId(i), expected)))
            .collect::<AnalysisResult<Vec<_>>>()?;

        Ok(Self { time, channels })
    }
}

fn parse_field(
    record: &csv::StringRecord,
    headers: &csv::StringRecord,
    column: usize,
    row: usize,
) -> AnalysisResult<f64> {
    let raw = record.get(column).unwrap_or("").trim();
    raw.parse::<f64>().map_err(|_| AnalysisError::InvalidValue {
        row,
        column: headers.get(column).unwrap_or("").to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_channel_names() {
        assert_eq!(channel_name(CellId(12)), "cell 12");
        assert_eq!(parse_channel_name("cell 12"), Some(CellId(12)));
        assert_eq!(parse_channel_name("cell"), None);
        assert_eq!(parse_channel_name("cell -1"), None);
        assert_eq!(parse_channel_name("cell +1"), None);
        assert_eq!(parse_channel_name("voltage 3"), None);
    }

    #[test]
    fn test_columns_in_any_order() {
        let csv = "cell 1,time,cell 0\n10,0.0,1\n20,0.5,2\n";
        let series = TimeSeries::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(series.times(), &array![0.0, 0.5]);
        assert_eq!(series.values(), &array![[1.0, 10.0], [2.0, 20.0]]);
    }

    #[test]
    fn test_missing_time_column() {
        for csv in ["cell 0\n1\n", "cell 1,cell 0\n1,2\n"] {
            assert!(matches!(
                TimeSeries::from_csv_reader(csv.as_bytes()),
                Err(AnalysisError::MissingTimeColumn)
            ));
        }
    }

    #[test]
    fn test_duplicate_and_gapped_channels() {
        let duplicate = "time,cell 0,cell 0\n0,1,1\n";
        assert!(matches!(
            TimeSeries::from_csv_reader(duplicate.as_bytes()),
            Err(AnalysisError::DuplicateChannel(CellId(0)))
        ));

        let gap = "time,cell 0,cell 2\n0,1,1\n";
        assert!(matches!(
            TimeSeries::from_csv_reader(gap.as_bytes()),
            Err(AnalysisError::ShapeMismatch(_))
        ));

        let gap = "time,cell 1,cell 2,cell 3\n0,1,1,1\n";
        assert!(matches!(
            TimeSeries::from_csv_reader(gap.as_bytes()),
            Err(AnalysisError::ShapeMismatch(_)) | Err(AnalysisError::MissingChannel(..))
        ));
    }

    #[test]
    fn test_unknown_column_rejected() {
        let csv = "time,cell 0,pressure\n0,1,1\n";
        assert!(matches!(
            TimeSeries::from_csv_reader(csv.as_bytes()),
            Err(AnalysisError::InvalidColumn(name)) if name == "pressure"
        ));
    }

    #[test]
    fn test_bad_value_reports_location() {
        let csv = "time,cell 0\n0,1\n1,abc\n";
        match TimeSeries::from_csv_reader(csv.as_bytes()) {
            Err(AnalysisError::InvalidValue { row, column, value }) => {
                assert_eq!(row, 1);
                assert_eq!(column, "cell 0");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_time_must_not_decrease() {
        let result = TimeSeries::new(array![0.0, 2.0, 1.0], Array2::zeros((3, 1)));
        assert!(matches!(
            result,
            Err(AnalysisError::NonMonotonicTime { index: 2, .. })
        ));
        // repeated samples are allowed
        assert!(TimeSeries::new(array![0.0, 1.0, 1.0], Array2::zeros((3, 1))).is_ok());
        assert!(TimeSeries::new(array![0.0, f64::NAN], Array2::zeros((2, 1))).is_err());
    }

    #[test]
    fn test_shape_mismatch() {
        assert!(matches!(
            TimeSeries::new(array![0.0, 1.0], Array2::zeros((3, 2))),
            Err(AnalysisError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_strip_mean() {
        let series = TimeSeries::new(
            array![0.0, 1.0],
            array![[0.0, 2.0, 100.0], [4.0, 6.0, 100.0]],
        )
        .unwrap();
        let mean = series.strip_mean(&[CellId(0), CellId(1)]).unwrap();
        assert_eq!(mean, array![1.0, 5.0]);
        assert!(series.strip_mean(&[CellId(3)]).is_err());
        assert!(matches!(
            series.strip_mean(&[]),
            Err(AnalysisError::EmptyStrip(_))
        ));
    }

    #[test]
    fn test_csv_write_then_read() {
        let series = TimeSeries::new(
            array![0.0, 0.25, 0.5],
            array![[-85.0, -85.0], [-20.5, -84.0], [30.125, -10.0]],
        )
        .unwrap();
        let mut buffer = Vec::new();
        series.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("time,cell 0,cell 1\n"));

        let parsed = TimeSeries::from_csv_reader(buffer.as_slice()).unwrap();
        assert_eq!(parsed, series);
    }
}
