//! Command-line surface.

use crate::data::schema::{ACQUISITION_DATE, KG_CODE};
use crate::data::{ColumnSelection, LoaderConfig, CACHE_FILE_NAME, DEFAULT_SOURCE_URL};
use clap::Parser;
use std::path::PathBuf;

const ABOUT: &str = "Explore data on purchasing prices of real estate transactions in Vienna";

const LONG_ABOUT: &str = "\
Explore data on purchasing prices of real estate transactions (source: land register),
including regulations of the land use and town plan, on-site inspection etc.
Link to the data: https://www.data.gv.at/katalog/dataset/kaufpreissammlung-liegenschaften-wien
CC BY 4.0 \"Datenquelle: Stadt Wien - data.wien.gv.at\"

Recommended usage:
  kaufpreis-explorer --no-read -l          list the KG codes without reading the data
  kaufpreis-explorer -K 1805               read the data of KG 1805
  kaufpreis-explorer -K 1805 -s Bauzins    ... sorted by ground rent";

#[derive(Parser, Debug)]
#[command(name = "kaufpreis-explorer", version, about = ABOUT, long_about = LONG_ABOUT)]
pub struct Args {
    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only warnings and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Read in the data file (default)
    #[arg(long, overrides_with = "no_read")]
    read: bool,

    /// Don't read in the data file
    #[arg(long = "no-read", overrides_with = "read")]
    no_read: bool,

    /// Path or URL of the source CSV file
    #[arg(short, long)]
    pub file: Option<String>,

    /// Cache file written after a download and read instead of downloading
    #[arg(long, default_value = CACHE_FILE_NAME)]
    pub cache_file: PathBuf,

    /// Write the result to this CSV file instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// KG code to filter by, without the leading 0 (see -l)
    #[arg(short = 'K', long = "kg", visible_alias = "KG")]
    pub kg: Option<i64>,

    /// Column the KG filter applies to
    #[arg(long, default_value = KG_CODE)]
    pub kg_column: String,

    /// Sort descending
    #[arg(short, long)]
    pub desc: bool,

    /// List all KG codes
    #[arg(short, long)]
    pub list: bool,

    /// Columns to show: "all", "predefined", or column names like "Erwerbsdatum,BJ,KG.Code"
    #[arg(long, num_args = 1..)]
    pub show_columns: Option<Vec<String>>,

    /// Scatter plot: a y column (x is Erwerbsdatum), or an x and a y column
    #[arg(short, long, num_args = 1..)]
    pub plot: Option<Vec<String>>,

    /// PNG file the scatter plot is written to
    #[arg(long, default_value = "scatter.png")]
    pub plot_output: PathBuf,

    /// How many rows to keep and show
    #[arg(short, long)]
    pub rows: Option<usize>,

    /// Correlation between two columns
    #[arg(long, num_args = 1..)]
    pub corr: Option<Vec<String>>,

    /// Column to sort by (ascending unless -d)
    #[arg(short, long, conflicts_with = "describe_column")]
    pub sort_column: Option<String>,

    /// Column to describe
    #[arg(short = 'D', long)]
    pub describe_column: Option<String>,
}

impl Args {
    /// Whether the dataset should be read; the last of `--read`/`--no-read` wins.
    pub fn read(&self) -> bool {
        self.read || !self.no_read
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            source: self
                .file
                .clone()
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            cache_path: self.cache_file.clone(),
            ..LoaderConfig::default()
        }
    }

    pub fn column_selection(&self) -> Option<ColumnSelection> {
        self.show_columns
            .as_deref()
            .map(ColumnSelection::from_words)
    }

    /// `(x, y)` columns of the requested scatter plot, `None` for a wrong
    /// number of values.
    pub fn plot_columns(&self) -> Option<Option<(&str, &str)>> {
        self.plot.as_deref().map(|words| match words {
            [y] => Some((ACQUISITION_DATE, y.as_str())),
            [x, y] => Some((x.as_str(), y.as_str())),
            _ => None,
        })
    }

    /// Column pair of the requested correlation, `None` for a wrong number
    /// of values.
    pub fn corr_columns(&self) -> Option<Option<(&str, &str)>> {
        self.corr.as_deref().map(|words| match words {
            [a, b] => Some((a.as_str(), b.as_str())),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("kaufpreis-explorer").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = parse(&[]);
        assert!(args.read());
        assert_eq!(args.kg_column, "KG.Code");
        assert_eq!(args.plot_output, PathBuf::from("scatter.png"));
        let config = args.loader_config();
        assert_eq!(config.source, DEFAULT_SOURCE_URL);
        assert_eq!(config.cache_path, PathBuf::from(CACHE_FILE_NAME));
        assert_eq!(args.column_selection(), None);
    }

    #[test]
    fn read_flags_last_one_wins() {
        assert!(!parse(&["--no-read"]).read());
        assert!(parse(&["--no-read", "--read"]).read());
        assert!(!parse(&["--read", "--no-read"]).read());
    }

    #[test]
    fn filter_sort_and_columns() {
        let args = parse(&["-K", "1805", "-s", "Bauzins", "-d", "--show-columns", "predefined"]);
        assert_eq!(args.kg, Some(1805));
        assert_eq!(args.sort_column.as_deref(), Some("Bauzins"));
        assert!(args.desc);
        assert_eq!(args.column_selection(), Some(ColumnSelection::Predefined));
        assert_eq!(parse(&["--KG", "1617"]).kg, Some(1617));
    }

    #[test]
    fn sort_and_describe_conflict() {
        let result = Args::try_parse_from(["kaufpreis-explorer", "-s", "BJ", "-D", "BJ"]);
        assert!(result.is_err());
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Args::try_parse_from(["kaufpreis-explorer", "-v", "-q"]).is_err());
    }

    #[test]
    fn plot_columns_default_x() {
        let args = parse(&["-p", "Bauzins"]);
        assert_eq!(args.plot_columns(), Some(Some(("Erwerbsdatum", "Bauzins"))));
        let args = parse(&["-p", "BJ", "Bauzins"]);
        assert_eq!(args.plot_columns(), Some(Some(("BJ", "Bauzins"))));
        let args = parse(&["-p", "a", "b", "c"]);
        assert_eq!(args.plot_columns(), Some(None));
        assert_eq!(parse(&[]).plot_columns(), None);
    }

    #[test]
    fn corr_needs_two_columns() {
        let args = parse(&["--corr", "BJ", "Bauzins"]);
        assert_eq!(args.corr_columns(), Some(Some(("BJ", "Bauzins"))));
        let args = parse(&["--corr", "BJ"]);
        assert_eq!(args.corr_columns(), Some(None));
    }
}
