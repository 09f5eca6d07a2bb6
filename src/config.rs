use crate::report::ReportBranding;
use crate::store::{ColumnMap, Field};
use anyhow::{bail, Context};
use clap::Parser;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 8051;
pub const DEFAULT_STORE: &str = "student_records.csv";

#[derive(Debug, Parser)]
#[command(name = "assessd", version, about = "Rubric assessment sidecar")]
pub struct Cli {
    /// TOML settings file
    #[arg(long, short = 'c', env = "ASSESSD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Local port to listen on (0 picks a free one)
    #[arg(long, short = 'p', env = "ASSESSD_PORT")]
    pub port: Option<u16>,

    /// Student record store (CSV)
    #[arg(long, env = "ASSESSD_STORE")]
    pub store: Option<PathBuf>,

    /// Directory generated reports are written to
    #[arg(long, env = "ASSESSD_REPORTS_DIR")]
    pub reports_dir: Option<PathBuf>,

    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Log filter, e.g. `debug` or `assessd=trace`
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSection {
    pub institution: Option<String>,
    pub header_lines: Option<Vec<String>>,
    pub title: Option<String>,
    pub subtitle_prefix: Option<String>,
}

/// Shape of the optional TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub store: Option<PathBuf>,
    pub reports_dir: Option<PathBuf>,
    pub assessors: Vec<String>,
    /// `canonical field -> accepted headers`
    pub columns: BTreeMap<String, Vec<String>>,
    pub report: ReportSection,
}

impl FileConfig {
    pub fn from_toml(text: &str) -> anyhow::Result<FileConfig> {
        toml::from_str(text).context("invalid config file")
    }

    pub fn load(path: &Path) -> anyhow::Result<FileConfig> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }
}

/// Effective settings: CLI beats config file beats defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub store_path: PathBuf,
    pub reports_dir: PathBuf,
    pub assessors: Vec<String>,
    pub columns: ColumnMap,
    pub branding: ReportBranding,
}

impl Settings {
    pub fn resolve(cli: &Cli) -> anyhow::Result<Settings> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    pub fn merge(cli: &Cli, file: FileConfig) -> anyhow::Result<Settings> {
        let mut columns = ColumnMap::default();
        for (key, aliases) in file.columns {
            let Some(field) = Field::parse(&key) else {
                bail!("unknown column field in config: {key}");
            };
            columns.set_aliases(field, aliases);
        }

        let defaults = ReportBranding::default();
        let branding = ReportBranding {
            institution: file.report.institution.unwrap_or(defaults.institution),
            header_lines: file.report.header_lines.unwrap_or(defaults.header_lines),
            title: file.report.title.unwrap_or(defaults.title),
            subtitle_prefix: file
                .report
                .subtitle_prefix
                .unwrap_or(defaults.subtitle_prefix),
        };

        let assessors = file
            .assessors
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();

        Ok(Settings {
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            store_path: cli
                .store
                .clone()
                .or(file.store)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE)),
            reports_dir: cli
                .reports_dir
                .clone()
                .or(file.reports_dir)
                .unwrap_or_else(|| std::env::temp_dir().join("assessment_reports")),
            assessors,
            columns,
            branding,
        })
    }
}
