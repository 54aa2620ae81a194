//! CsvReportSink - writes the per-sample deviation table to disk

use contracts::{ContractError, ErrorRecord, ReportBundle, ReportSink, SourceTable, Trajectory};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use super::{bool_param, OutputTarget};

/// Columns appended after the echoed test columns
pub const ERROR_COLUMNS: [&str; 5] = [
    "elapsed_time",
    "xy_err",
    "z_err",
    "error_point.x",
    "error_point.y",
];

/// Optional bracket columns
pub const BRACKET_COLUMNS: [&str; 2] = ["ref_a", "ref_b"];

const FILE_SUFFIX: &str = "_log.csv";

/// Sink that writes one CSV file per report
///
/// Params:
/// - `path`: explicit output file (default `<test stem>_log.csv`)
/// - `directory`: output directory when `path` is absent
/// - `include_bracket`: append `ref_a`/`ref_b` columns (default false)
pub struct CsvReportSink {
    name: String,
    target: OutputTarget,
    include_bracket: bool,
    created_dirs: HashSet<PathBuf>,
    written: Vec<PathBuf>,
}

impl CsvReportSink {
    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        output_dir: &Path,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let target = OutputTarget::from_params(&name, output_dir, params)?;
        let include_bracket = bool_param(&name, params, "include_bracket", false)?;
        Ok(Self {
            name,
            target,
            include_bracket,
            created_dirs: HashSet::new(),
            written: Vec::new(),
        })
    }

    /// Files written so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write_report_to_disk(&mut self, bundle: &ReportBundle) -> std::io::Result<PathBuf> {
        let path = self.target.resolve(bundle, FILE_SUFFIX);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !self.created_dirs.contains(parent) {
                fs::create_dir_all(parent)?;
                self.created_dirs.insert(parent.to_path_buf());
            }
        }

        let mut out = BufWriter::new(File::create(&path)?);
        let records = &bundle.report.records;

        match bundle.test_table.as_ref() {
            Some(table) if table.len() == records.len() => {
                let stamps = bundle
                    .stamp_column
                    .as_deref()
                    .filter(|c| table.column_index(c).is_none())
                    .map(|c| (c, &bundle.test));
                self.write_with_table(&mut out, table, stamps, records)?;
            }
            Some(table) => {
                warn!(
                    sink = %self.name,
                    rows = table.len(),
                    records = records.len(),
                    "Source table not row-aligned with report, writing trajectory columns"
                );
                self.write_with_trajectory(&mut out, &bundle.test, records)?;
            }
            None => self.write_with_trajectory(&mut out, &bundle.test, records)?,
        }

        out.flush()?;
        Ok(path)
    }

    /// `stamps` adds a combined timestamp column taken from the trajectory
    fn write_with_table(
        &self,
        out: &mut impl Write,
        table: &SourceTable,
        stamps: Option<(&str, &Trajectory)>,
        records: &[ErrorRecord],
    ) -> std::io::Result<()> {
        // Computed columns replace same-named input columns (re-processing a log)
        let computed = self.computed_columns();
        let kept: Vec<usize> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !computed.contains(&h.as_str()))
            .map(|(i, _)| i)
            .collect();

        let header = kept
            .iter()
            .map(|&i| escape_field(&table.headers[i]))
            .chain(stamps.map(|(column, _)| escape_field(column)))
            .chain(computed.iter().map(|c| Cow::Borrowed(*c)));
        write_row(out, header)?;

        for (row, record) in table.rows.iter().zip(records) {
            let stamp = stamps.map(|(_, test)| {
                test.get(record.sample_index)
                    .map(|s| s.timestamp.to_string())
                    .unwrap_or_default()
            });
            let cells = kept
                .iter()
                .map(|&i| escape_field(row.get(i).map(String::as_str).unwrap_or("")))
                .chain(stamp.map(Cow::Owned))
                .chain(self.error_cells(record).into_iter().map(Cow::Owned));
            write_row(out, cells)?;
        }
        Ok(())
    }

    fn write_with_trajectory(
        &self,
        out: &mut impl Write,
        test: &Trajectory,
        records: &[ErrorRecord],
    ) -> std::io::Result<()> {
        let header = ["timestamp", "x", "y", "z"]
            .into_iter()
            .chain(self.computed_columns())
            .map(Cow::Borrowed);
        write_row(out, header)?;

        for (sample, record) in test.iter().zip(records) {
            let p = sample.position;
            let cells = [sample.timestamp, p.x, p.y, p.z]
                .into_iter()
                .map(|v| v.to_string())
                .chain(self.error_cells(record))
                .map(Cow::Owned);
            write_row(out, cells)?;
        }
        Ok(())
    }

    fn computed_columns(&self) -> Vec<&'static str> {
        let mut columns = ERROR_COLUMNS.to_vec();
        if self.include_bracket {
            columns.extend(BRACKET_COLUMNS);
        }
        columns
    }

    fn error_cells(&self, record: &ErrorRecord) -> Vec<String> {
        let mut cells = vec![
            record.elapsed_time.to_string(),
            record.lateral_error.to_string(),
            record.vertical_error.to_string(),
            record.error_point[0].to_string(),
            record.error_point[1].to_string(),
        ];
        if self.include_bracket {
            cells.push(record.bracket.0.to_string());
            cells.push(record.bracket.1.to_string());
        }
        cells
    }
}

fn write_row<'a>(
    out: &mut impl Write,
    cells: impl Iterator<Item = Cow<'a, str>>,
) -> std::io::Result<()> {
    let line: Vec<Cow<'a, str>> = cells.collect();
    writeln!(out, "{}", line.join(","))
}

/// Quote a field when it contains a delimiter, quote, or line break
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

impl ReportSink for CsvReportSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "csv_sink_write",
        skip(self, bundle),
        fields(sink = %self.name, run_id = %bundle.run_id, records = bundle.report.len())
    )]
    async fn write(&mut self, bundle: &ReportBundle) -> Result<(), ContractError> {
        let path = self
            .write_report_to_disk(bundle)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        info!(sink = %self.name, path = %path.display(), "Deviation table written");
        self.written.push(path);
        Ok(())
    }

    #[instrument(name = "csv_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Each report is flushed when written
        Ok(())
    }

    #[instrument(name = "csv_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, files = self.written.len(), "CsvReportSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ErrorReport;

    fn records() -> Vec<ErrorRecord> {
        vec![
            ErrorRecord {
                sample_index: 0,
                elapsed_time: 0.0,
                lateral_error: 1.0,
                vertical_error: -0.5,
                error_point: [1.0, 0.0],
                bracket: (1, 0),
            },
            ErrorRecord {
                sample_index: 1,
                elapsed_time: 0.5,
                lateral_error: 2.0,
                vertical_error: 0.25,
                error_point: [2.0, 0.0],
                bracket: (2, 1),
            },
        ]
    }

    fn bundle() -> ReportBundle {
        let test = Trajectory::from_tuples(
            "test",
            &[(10.0, 1.0, 1.0, 0.0), (10.5, 2.0, 2.0, 1.0)],
        );
        let report = ErrorReport::new(Default::default(), Default::default(), records());
        ReportBundle::new("run-1", report, test)
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[tokio::test]
    async fn test_echoes_source_columns() {
        let dir = tempfile::tempdir().unwrap();
        let table = SourceTable::new(
            vec!["sec".into(), "frame_id".into(), "x".into()],
            vec![
                vec!["10".into(), "map, odom".into(), "1.0".into()],
                vec!["10".into(), "map".into(), "2.0".into()],
            ],
        );
        let bundle = bundle()
            .with_table(table)
            .with_test_path(dir.path().join("drive.csv"));

        let mut sink = CsvReportSink::from_params("csv", dir.path(), &HashMap::new()).unwrap();
        sink.write(&bundle).await.unwrap();
        sink.close().await.unwrap();

        let path = dir.path().join("drive_log.csv");
        assert_eq!(sink.written(), &[path.clone()]);
        let lines = read_lines(&path);
        assert_eq!(
            lines[0],
            "sec,frame_id,x,elapsed_time,xy_err,z_err,error_point.x,error_point.y"
        );
        assert_eq!(lines[1], "10,\"map, odom\",1.0,0,1,-0.5,1,0");
        assert_eq!(lines[2], "10,map,2.0,0.5,2,0.25,2,0");
        assert_eq!(lines.len(), 3);
    }

    #[tokio::test]
    async fn test_adds_combined_stamp_for_split_time() {
        let dir = tempfile::tempdir().unwrap();
        let table = SourceTable::new(
            vec!["sec".into(), "nanosec".into(), "x".into()],
            vec![
                vec!["10".into(), "0".into(), "1.0".into()],
                vec!["10".into(), "500000000".into(), "2.0".into()],
            ],
        );
        let bundle = bundle()
            .with_table(table)
            .with_stamp_column("msg.header.stamp");

        let mut sink = CsvReportSink::from_params("csv", dir.path(), &HashMap::new()).unwrap();
        sink.write(&bundle).await.unwrap();

        let lines = read_lines(&dir.path().join("run-1_log.csv"));
        assert_eq!(
            lines[0],
            "sec,nanosec,x,msg.header.stamp,elapsed_time,xy_err,z_err,error_point.x,error_point.y"
        );
        assert_eq!(lines[1], "10,0,1.0,10,0,1,-0.5,1,0");
        assert_eq!(lines[2], "10,500000000,2.0,10.5,0.5,2,0.25,2,0");
    }

    #[tokio::test]
    async fn test_stamp_column_not_duplicated() {
        let dir = tempfile::tempdir().unwrap();
        let table = SourceTable::new(
            vec!["timestamp".into(), "x".into()],
            vec![vec!["10".into(), "1".into()], vec!["10.5".into(), "2".into()]],
        );
        let bundle = bundle().with_table(table).with_stamp_column("timestamp");

        let mut sink = CsvReportSink::from_params("csv", dir.path(), &HashMap::new()).unwrap();
        sink.write(&bundle).await.unwrap();

        let lines = read_lines(&dir.path().join("run-1_log.csv"));
        assert_eq!(lines[0], "timestamp,x,elapsed_time,xy_err,z_err,error_point.x,error_point.y");
    }

    #[tokio::test]
    async fn test_replaces_existing_error_columns() {
        let dir = tempfile::tempdir().unwrap();
        let table = SourceTable::new(
            vec!["x".into(), "xy_err".into()],
            vec![vec!["1".into(), "99".into()], vec!["2".into(), "99".into()]],
        );
        let bundle = bundle().with_table(table);

        let mut sink = CsvReportSink::from_params("csv", dir.path(), &HashMap::new()).unwrap();
        sink.write(&bundle).await.unwrap();

        let lines = read_lines(&dir.path().join("run-1_log.csv"));
        assert_eq!(lines[0], "x,elapsed_time,xy_err,z_err,error_point.x,error_point.y");
        assert!(!lines[1].contains("99"));
    }

    #[tokio::test]
    async fn test_trajectory_columns_without_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = HashMap::new();
        params.insert("path".to_string(), dir.path().join("nested/out.csv").display().to_string());
        params.insert("include_bracket".to_string(), "true".to_string());

        let mut sink = CsvReportSink::from_params("csv", dir.path(), &params).unwrap();
        sink.write(&bundle()).await.unwrap();

        let lines = read_lines(&dir.path().join("nested/out.csv"));
        assert_eq!(
            lines[0],
            "timestamp,x,y,z,elapsed_time,xy_err,z_err,error_point.x,error_point.y,ref_a,ref_b"
        );
        assert_eq!(lines[1], "10,1,1,0,0,1,-0.5,1,0,1,0");
        assert_eq!(lines[2], "10.5,2,2,1,0.5,2,0.25,2,0,2,1");
    }

    #[tokio::test]
    async fn test_misaligned_table_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let table = SourceTable::new(vec!["x".into()], vec![vec!["1".into()]]);
        let bundle = bundle().with_table(table);

        let mut sink = CsvReportSink::from_params("csv", dir.path(), &HashMap::new()).unwrap();
        sink.write(&bundle).await.unwrap();

        let lines = read_lines(&dir.path().join("run-1_log.csv"));
        assert!(lines[0].starts_with("timestamp,x,y,z,"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_invalid_bool_param() {
        let mut params = HashMap::new();
        params.insert("include_bracket".to_string(), "maybe".to_string());
        assert!(CsvReportSink::from_params("csv", Path::new("."), &params).is_err());
    }
}
