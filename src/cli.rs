use clap::{ArgAction, Parser, ValueEnum};
use largestfiles_core::analysis::DEFAULT_TOP_N;
use largestfiles_core::platform::{default_volume_source, ExplicitPaths, VolumeSource};
use largestfiles_core::report::{ReportFormat, DEFAULT_REPORT_FILE};
use largestfiles_core::scanner::filter::FilterPolicy;
use largestfiles_core::scanner::ScanConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "LargestFiles",
    version,
    about = "Find the largest files on every local volume"
)]
pub struct Cli {
    /// Roots to scan instead of the machine's local volumes.
    pub paths: Vec<String>,

    #[arg(short, long, default_value = DEFAULT_REPORT_FILE, help = "Report file to write")]
    pub output: PathBuf,

    #[arg(short = 'n', long = "top", default_value_t = DEFAULT_TOP_N, help = "Files listed per volume")]
    pub top: usize,

    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    pub format: FormatArg,

    #[arg(long, help = "Scan hidden entries (dot files on Unix)")]
    pub include_hidden: bool,

    #[arg(long, help = "Scan entries with the system attribute")]
    pub include_system: bool,

    #[arg(long, help = "Scan entries with the temporary attribute")]
    pub include_temporary: bool,

    #[arg(long, help = "Descend into other filesystems mounted below a root")]
    pub cross_volumes: bool,

    #[arg(long, help = "Scan volumes concurrently")]
    pub parallel_volumes: bool,

    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u16).range(1..),
        help = "Walk threads per volume; above 1, equal sizes rank by path"
    )]
    pub workers: u16,

    #[arg(long, value_name = "SECS", help = "Stop each volume after this many seconds")]
    pub timeout: Option<u64>,

    #[arg(short, long, action = ArgAction::Count, help = "Log more (-v info, -vv debug)")]
    pub verbose: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Text,
    Json,
    Csv,
}

impl From<FormatArg> for ReportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Text => ReportFormat::Text,
            FormatArg::Json => ReportFormat::Json,
            FormatArg::Csv => ReportFormat::Csv,
        }
    }
}

impl Cli {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            top_n: self.top,
            filter: FilterPolicy {
                skip_hidden: !self.include_hidden,
                skip_system: !self.include_system,
                skip_temporary: !self.include_temporary,
            },
            stay_on_volume: !self.cross_volumes,
            walk_workers: usize::from(self.workers),
            parallel_volumes: self.parallel_volumes,
            volume_timeout: self.timeout.map(Duration::from_secs),
        }
    }

    /// The roots given on the command line, or the platform's volumes.
    pub fn volume_source(&self) -> Box<dyn VolumeSource> {
        if self.paths.is_empty() {
            default_volume_source()
        } else {
            Box::new(ExplicitPaths(self.paths.clone()))
        }
    }

    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        }
    }
}
