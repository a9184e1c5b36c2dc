/// Report emitter: writes per-volume rankings to the output artifact.
///
/// The artifact is created (truncated) once when the writer is opened and
/// each completed volume appends one section. Three formats:
///
/// - **Text** (default): `Largest files on <label>:` (so `C::` for a drive)
///   followed by one `<path>: <MiB with two decimals> MB` line per entry and
///   a blank line.
/// - **Csv**: `volume,rank,path,size_bytes`, one row per entry.
/// - **Json**: a single document written by [`ReportWriter::finish`].
///
/// Text and CSV emit nothing for a volume without ranked entries.
use crate::error::ReportError;
use crate::model::size::format_mib;
use crate::scanner::VolumeReport;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default artifact name, relative to the working directory.
pub const DEFAULT_REPORT_FILE: &str = "largest_files.txt";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Local>,
    volumes: &'a [JsonVolume],
}

#[derive(Serialize)]
struct JsonVolume {
    label: String,
    root: String,
    state: &'static str,
    files_found: u64,
    total_bytes: u64,
    stopped: bool,
    duration_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    entries: Vec<JsonEntry>,
}

#[derive(Serialize)]
struct JsonEntry {
    rank: usize,
    path: String,
    size_bytes: u64,
    size_mib: f64,
}

impl JsonVolume {
    fn from_report(report: &VolumeReport) -> Self {
        Self {
            label: report.volume.label.clone(),
            root: report.volume.root.clone(),
            state: report.phase.as_str(),
            files_found: report.stats.files_found,
            total_bytes: report.stats.total_bytes,
            stopped: report.stats.stopped,
            duration_secs: report.duration.as_secs_f64(),
            error: report.failure.as_ref().map(ToString::to_string),
            entries: report
                .entries
                .iter()
                .map(|e| JsonEntry {
                    rank: e.rank,
                    path: e.path().to_string(),
                    size_bytes: e.size(),
                    size_mib: (e.record.size_mib() * 100.0).round() / 100.0,
                })
                .collect(),
        }
    }
}

enum Sink<W: Write> {
    Text(W),
    Csv(csv::Writer<W>),
    Json {
        out: W,
        generated_at: DateTime<Local>,
        volumes: Vec<JsonVolume>,
    },
}

/// Streams volume sections into one artifact.
pub struct ReportWriter<W: Write> {
    sink: Sink<W>,
    /// Shown in I/O errors.
    target: PathBuf,
}

impl ReportWriter<BufWriter<File>> {
    /// Create or truncate the file at `path`.
    pub fn create(path: impl AsRef<Path>, format: ReportFormat) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Writing {:?} report to {}", format, path.display());
        let mut writer = Self::new(BufWriter::new(file), format)?;
        writer.target = path.to_path_buf();
        Ok(writer)
    }
}

impl<W: Write> ReportWriter<W> {
    /// Wrap an arbitrary writer. The CSV header is written immediately.
    pub fn new(out: W, format: ReportFormat) -> Result<Self, ReportError> {
        let sink = match format {
            ReportFormat::Text => Sink::Text(out),
            ReportFormat::Csv => {
                let mut csv = csv::WriterBuilder::new().has_headers(false).from_writer(out);
                csv.write_record(["volume", "rank", "path", "size_bytes"])?;
                Sink::Csv(csv)
            }
            ReportFormat::Json => Sink::Json {
                out,
                generated_at: Local::now(),
                volumes: Vec::new(),
            },
        };
        Ok(Self {
            sink,
            target: PathBuf::from("<report>"),
        })
    }

    /// Append the section for one volume.
    pub fn write_volume(&mut self, report: &VolumeReport) -> Result<(), ReportError> {
        match &mut self.sink {
            Sink::Text(out) => {
                if report.entries.is_empty() {
                    return Ok(());
                }
                write_text_section(out, report).map_err(|source| ReportError::Io {
                    path: self.target.clone(),
                    source,
                })
            }
            Sink::Csv(csv) => {
                for entry in &report.entries {
                    csv.write_record([
                        report.volume.label.as_str(),
                        &entry.rank.to_string(),
                        entry.path(),
                        &entry.size().to_string(),
                    ])?;
                }
                Ok(())
            }
            Sink::Json { volumes, .. } => {
                volumes.push(JsonVolume::from_report(report));
                Ok(())
            }
        }
    }

    /// Flush everything and hand back the underlying writer.
    pub fn finish(self) -> Result<W, ReportError> {
        let target = self.target;
        let io_error = |source| ReportError::Io {
            path: target.clone(),
            source,
        };
        match self.sink {
            Sink::Text(mut out) => {
                out.flush().map_err(io_error)?;
                Ok(out)
            }
            Sink::Csv(csv) => csv.into_inner().map_err(|e| io_error(e.into_error())),
            Sink::Json {
                mut out,
                generated_at,
                volumes,
            } => {
                let doc = JsonReport {
                    generated_at,
                    volumes: &volumes,
                };
                serde_json::to_writer_pretty(&mut out, &doc)?;
                writeln!(out).and_then(|()| out.flush()).map_err(io_error)?;
                Ok(out)
            }
        }
    }
}

fn write_text_section<W: Write>(out: &mut W, report: &VolumeReport) -> io::Result<()> {
    // Drive labels already end in ':', so `C:` renders as `C::` as the
    // classic tool's report does.
    writeln!(out, "Largest files on {}:", report.volume.label)?;
    for entry in &report.entries {
        writeln!(out, "{}: {} MB", entry.path(), format_mib(entry.size()))?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{rank, TieBreak};
    use crate::error::ScanError;
    use crate::model::FileRecord;
    use crate::platform::Volume;
    use crate::scanner::progress::VolumePhase;
    use crate::scanner::walker::WalkStats;
    use std::time::Duration;

    fn report(label: &str, files: &[(&str, u64)]) -> VolumeReport {
        let records = files
            .iter()
            .map(|(p, s)| FileRecord::new(p.to_string(), *s))
            .collect::<Vec<_>>();
        let stats = WalkStats {
            files_found: records.len() as u64,
            ..WalkStats::default()
        };
        VolumeReport {
            volume: Volume::with_label("/", label),
            phase: VolumePhase::Reported,
            entries: rank(records, 100),
            stats,
            failure: None,
            tie_break: TieBreak::EncounterOrder,
            duration: Duration::from_millis(1500),
        }
    }

    fn failed(label: &str) -> VolumeReport {
        VolumeReport {
            phase: VolumePhase::Failed,
            failure: Some(ScanError::VolumeUnavailable {
                root: "/gone".into(),
                source: io::Error::from(io::ErrorKind::NotFound),
            }),
            ..report(label, &[])
        }
    }

    fn render(format: ReportFormat, reports: &[VolumeReport]) -> String {
        let mut writer = ReportWriter::new(Vec::new(), format).unwrap();
        for r in reports {
            writer.write_volume(r).unwrap();
        }
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn text_sections_match_the_classic_layout() {
        let out = render(
            ReportFormat::Text,
            &[
                report("C:", &[("C:\\small", 1_048_576), ("C:\\big", 3_670_016)]),
                report("D:", &[("D:\\x", 1)]),
            ],
        );
        assert_eq!(
            out,
            "Largest files on C::\n\
             C:\\big: 3.50 MB\n\
             C:\\small: 1.00 MB\n\
             \n\
             Largest files on D::\n\
             D:\\x: 0.00 MB\n\
             \n"
        );
    }

    #[test]
    fn empty_and_failed_volumes_have_no_text_section() {
        let out = render(
            ReportFormat::Text,
            &[report("E:", &[]), failed("F:"), report("G:", &[("G:\\a", 2_097_152)])],
        );
        assert_eq!(out, "Largest files on G::\nG:\\a: 2.00 MB\n\n");
    }

    #[test]
    fn csv_has_one_row_per_entry() {
        let out = render(
            ReportFormat::Csv,
            &[report("C:", &[("C:\\a,b", 10), ("C:\\c", 20)]), failed("D:")],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            [
                "volume,rank,path,size_bytes",
                "C:,0,C:\\c,20",
                "C:,1,\"C:\\a,b\",10",
            ]
        );
    }

    #[test]
    fn json_lists_every_volume_with_its_state() {
        let out = render(
            ReportFormat::Json,
            &[report("C:", &[("C:\\a", 1_572_864)]), failed("D:")],
        );
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(doc["generated_at"].is_string());

        let volumes = doc["volumes"].as_array().unwrap();
        assert_eq!(volumes.len(), 2);
        assert_eq!(volumes[0]["state"], "reported");
        assert_eq!(volumes[0]["entries"][0]["size_bytes"], 1_572_864);
        assert_eq!(volumes[0]["entries"][0]["size_mib"], 1.5);
        assert_eq!(volumes[1]["state"], "failed");
        assert!(volumes[1]["error"].as_str().unwrap().contains("/gone"));
        assert!(volumes[0].get("error").is_none());
    }

    #[test]
    fn create_truncates_an_existing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_REPORT_FILE);
        std::fs::write(&path, "stale contents from an earlier run\n").unwrap();

        let writer = ReportWriter::create(&path, ReportFormat::Text).unwrap();
        writer.finish().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn unwritable_target_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("out.txt");
        let err = ReportWriter::create(&path, ReportFormat::Text).err().unwrap();
        assert!(matches!(err, ReportError::Io { path: p, .. } if p == path));
    }
}
