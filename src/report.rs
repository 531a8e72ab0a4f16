/// Report assembly: merge walked measurements with run-level metadata and
/// write the CSV report.
///
/// The header is written unconditionally, even when no directory yields a
/// record. Errors here are fatal for the whole run, unlike the per-file
/// errors the walker absorbs.
use crate::extras::{self, ExtrasError, RunExtras};
use crate::walk::{self, Measurement};
use serde::Serialize;
use std::io;
use std::path::PathBuf;

/// Fixed column order of the report.
const COLUMNS: [&str; 10] = [
    "device",
    "run",
    "site",
    "engine",
    "vehicle",
    "test_type",
    "proxy",
    "timestamp",
    "navigationStartTime",
    "pageLoadTime",
];

/// One output row. Field order must match `COLUMNS`.
#[derive(Debug, Serialize)]
pub struct Record {
    pub device: Option<String>,
    pub run: usize,
    pub site: String,
    pub engine: String,
    pub vehicle: String,
    pub test_type: Option<String>,
    pub proxy: Option<String>,
    pub timestamp: String,
    #[serde(rename = "navigationStartTime")]
    pub navigation_start_time: String,
    #[serde(rename = "pageLoadTime")]
    pub page_load_time: String,
}

impl Record {
    /// Merge one measurement with its directory's metadata and run index.
    fn merge(m: Measurement, extras: &RunExtras, run: usize) -> Self {
        Record {
            device: extras.device.clone(),
            run,
            site: m.site,
            engine: m.engine,
            vehicle: m.vehicle,
            test_type: extras.test_type.clone(),
            proxy: extras.proxy.clone(),
            timestamp: m.timestamp,
            navigation_start_time: m.navigation_start_time,
            page_load_time: m.page_load_time,
        }
    }
}

/// A failure that aborts the whole run.
#[derive(Debug)]
pub enum ReportError {
    Extras(ExtrasError),
    Csv(csv::Error),
    Io(io::Error),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Extras(e) => write!(f, "run metadata error: {e}"),
            ReportError::Csv(e) => write!(f, "CSV output error: {e}"),
            ReportError::Io(e) => write!(f, "output error: {e}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Extras(e) => Some(e),
            ReportError::Csv(e) => Some(e),
            ReportError::Io(e) => Some(e),
        }
    }
}

/// Walk every input directory in order and write the merged CSV report.
///
/// Records from the i-th directory argument carry `run = i + 1`. A bad
/// `run.json` in any directory aborts the run; per-file failures inside a
/// directory have already been absorbed by the walker.
pub fn write_report<W: io::Write>(dirs: &[PathBuf], out: W) -> Result<(), ReportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(COLUMNS).map_err(ReportError::Csv)?;

    for (i, dir) in dirs.iter().enumerate() {
        let extras = extras::load(dir).map_err(ReportError::Extras)?;
        tracing::debug!(dir = %dir.display(), run = i + 1, ?extras, "walking input directory");

        for m in walk::walk(dir) {
            let record = Record::merge(m, &extras, i + 1);
            writer.serialize(&record).map_err(ReportError::Csv)?;
        }
    }

    writer.flush().map_err(ReportError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    const HEADER: &str =
        "device,run,site,engine,vehicle,test_type,proxy,timestamp,navigationStartTime,pageLoadTime";

    fn write_file(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    /// Standard single-entry fixture: one browser script, numeric timings.
    fn write_result(root: &Path, rel: &str) {
        write_file(
            root,
            rel,
            r#"[
                {
                    "info": {"url": "http://Google.com"},
                    "browserScripts": [
                        {
                            "browser": {"userAgent": "UA1"},
                            "timings": {"applinkTiming": {"startTime": 100, "loadEventStart": 250}}
                        }
                    ],
                    "timestamps": [1000]
                }
            ]"#,
        );
    }

    fn report_for(dirs: &[PathBuf]) -> String {
        let mut out = Vec::new();
        write_report(dirs, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_end_to_end_single_row() {
        let dir = tempdir().unwrap();
        write_file(
            dir.path(),
            "run.json",
            r#"{"device":"Pixel3","test_type":"cold","proxy":"replay","ro":"x"}"#,
        );
        write_result(
            dir.path(),
            "firefox/org.mozilla.firefox/replay/google.com/browsertime.json",
        );

        let csv = report_for(&[dir.path().to_path_buf()]);
        let expected = format!(
            "{HEADER}\nPixel3,1,http://google.com,UA1,Fennec 64,cold,replay,1000,100,250\n"
        );
        assert_eq!(csv, expected);
    }

    #[test]
    fn test_header_written_even_without_records() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "run.json", "{}");

        let csv = report_for(&[dir.path().to_path_buf()]);
        assert_eq!(csv, format!("{HEADER}\n"));
    }

    #[test]
    fn test_absent_extras_render_as_empty_cells() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "run.json", r#"{"device":"Pixel3"}"#);
        write_result(
            dir.path(),
            "firefox/org.mozilla.fenix/replay/google.com/browsertime.json",
        );

        let csv = report_for(&[dir.path().to_path_buf()]);
        assert_eq!(
            csv,
            format!("{HEADER}\nPixel3,1,http://google.com,UA1,Fenix 68,,,1000,100,250\n")
        );
    }

    #[test]
    fn test_run_index_is_position_among_dir_arguments() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        write_file(first.path(), "run.json", "{}");
        write_file(second.path(), "run.json", "{}");
        // Only the second directory has any results.
        write_result(
            second.path(),
            "chrome/com.android.chrome/replay/google.com/browsertime.json",
        );

        let csv = report_for(&[first.path().to_path_buf(), second.path().to_path_buf()]);
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].starts_with(",2,http://google.com,UA1,Chrome 74,"));
    }

    #[test]
    fn test_ro_never_reaches_the_report() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "run.json", r#"{"ro":"volatile-serial"}"#);
        write_result(
            dir.path(),
            "firefox/org.mozilla.firefox/replay/google.com/browsertime.json",
        );

        let csv = report_for(&[dir.path().to_path_buf()]);
        assert!(!csv.contains("volatile-serial"));
    }

    #[test]
    fn test_missing_run_json_is_fatal() {
        let dir = tempdir().unwrap();
        write_result(
            dir.path(),
            "firefox/org.mozilla.firefox/replay/google.com/browsertime.json",
        );

        let mut out = Vec::new();
        let err = write_report(&[dir.path().to_path_buf()], &mut out).unwrap_err();
        assert!(matches!(err, ReportError::Extras(_)));
    }

    #[test]
    fn test_bad_result_file_does_not_abort_run() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "run.json", "{}");
        write_file(
            dir.path(),
            "firefox/org.mozilla.firefox/replay/bad/browsertime.json",
            "not json at all",
        );
        write_result(
            dir.path(),
            "firefox/org.mozilla.firefox/replay/good/browsertime.json",
        );

        let csv = report_for(&[dir.path().to_path_buf()]);
        // One data row from the good file; the bad one is skipped.
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn test_field_with_comma_is_quoted() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "run.json", r#"{"device":"Pixel 3, DE"}"#);
        write_result(
            dir.path(),
            "firefox/org.mozilla.firefox/replay/google.com/browsertime.json",
        );

        let csv = report_for(&[dir.path().to_path_buf()]);
        assert!(csv.contains("\"Pixel 3, DE\""));
    }
}
