pub mod config;
pub mod dashboard;
#[cfg(feature = "xlsx")]
pub mod export;
pub mod list;
pub mod report;

use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::api::{AtencionApi, HttpApi};
use crate::error::{AtencionesError, Result};
use crate::filter::FilterSet;
use crate::models::Column;
use crate::range::DateRange;
use crate::settings::Settings;

#[derive(Parser)]
#[command(
    name = "atenciones",
    about = "MiDoc | Consulta de atenciones: query, filter and export clinic visits."
)]
pub struct Cli {
    /// Backend base URL for this run (overrides settings)
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive dashboard (default).
    Dashboard,
    /// Fetch visits for a range and print them as a table.
    List {
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Export visits for a range to an .xlsx file.
    #[cfg(feature = "xlsx")]
    Export {
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        filters: FilterArgs,
        /// Output directory (default: configured export dir)
        #[arg(long)]
        output: Option<String>,
    },
    /// Ask the backend to email the spreadsheet report for a range.
    SendReport {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Show or update settings. A global --api-url is saved.
    Config {
        /// Directory exports are written to
        #[arg(long = "export-dir")]
        export_dir: Option<String>,
        /// HTTP timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[derive(Args, Debug, Default)]
pub struct RangeArgs {
    /// Start date: YYYY-MM-DD
    #[arg(long = "from")]
    pub from: Option<NaiveDate>,
    /// End date: YYYY-MM-DD
    #[arg(long = "to")]
    pub to: Option<NaiveDate>,
    /// Today only
    #[arg(long, conflicts_with_all = ["from", "to", "yesterday"])]
    pub today: bool,
    /// Yesterday only
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub yesterday: bool,
}

impl RangeArgs {
    pub fn to_range(&self) -> DateRange {
        if self.today {
            DateRange::today()
        } else if self.yesterday {
            DateRange::yesterday()
        } else {
            DateRange::new(self.from, self.to)
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Column filter as key=pattern (repeatable), e.g. nom_pac=ana
    #[arg(long = "filter", value_name = "KEY=PATTERN")]
    pub filter: Vec<String>,
}

impl FilterArgs {
    pub fn to_filter_set(&self) -> Result<FilterSet> {
        parse_filters(&self.filter)
    }
}

pub(crate) fn parse_filters(specs: &[String]) -> Result<FilterSet> {
    let mut filters = FilterSet::new();
    for spec in specs {
        let (key, pattern) = spec
            .split_once('=')
            .ok_or_else(|| AtencionesError::Other(format!("Expected KEY=PATTERN, got '{spec}'")))?;
        let column: Column = key.parse()?;
        filters.set(column, pattern);
    }
    Ok(filters)
}

pub(crate) fn build_api(settings: &Settings) -> Arc<dyn AtencionApi> {
    Arc::new(HttpApi::new(&settings.api_url, settings.timeout()))
}
