//! Kaufpreis Explorer - Vienna real-estate transaction data on the command line
//!
//! Loads the Kaufpreissammlung dataset (downloaded once, then read from a
//! local cache file) and filters, projects, sorts, describes, correlates and
//! plots it.

mod charts;
mod cli;
mod data;
mod remote;
mod stats;

use anyhow::{Context, Result};
use charts::{PngScatterRenderer, ScatterData, ScatterRenderer};
use clap::Parser;
use cli::Args;
use data::{to_csv_string, DataLoader, DataProcessor};
use polars::prelude::*;
use remote::{DistrictDirectory, HttpFetcher};
use stats::StatsCalculator;
use std::fs;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);
    run(&args)
}

fn init_logging(args: &Args) {
    let default = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<()> {
    configure_display(args.rows);
    let fetcher = HttpFetcher::new();

    if args.list {
        let mut districts = DistrictDirectory::new(&fetcher)
            .fetch_reference_table()
            .context("reading the list of KG codes")?;
        print!("{}", district_listing(&mut districts)?);
    }

    if !args.read() {
        return Ok(());
    }

    let loader = DataLoader::new(&fetcher, args.loader_config());
    let df = loader.load().with_context(|| {
        format!(
            "loading dataset from {} (cache {})",
            loader.config().source,
            loader.config().cache_path.display()
        )
    })?;
    info!(rows = df.height(), cols = df.width(), "dataset ready");

    let mut table = transform(df, args)?;

    if let Some(columns) = args.plot_columns() {
        match columns {
            Some((x, y)) => {
                let renderer = PngScatterRenderer::new(&args.plot_output);
                match plot(&table, x, y, &renderer) {
                    Ok(()) => println!("Scatter plot written to {}", renderer.path().display()),
                    Err(e) => report(&format!("cannot plot {y} against {x}: {e}")),
                }
            }
            None => report("wrong number of arguments for --plot"),
        }
    }

    match &args.output {
        Some(path) => {
            let text = to_csv_string(&mut table, b',').context("rendering output CSV")?;
            fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), rows = table.height(), "output written");
        }
        None => println!("{table}"),
    }

    if let Some(columns) = args.corr_columns() {
        match columns {
            Some((a, b)) => match StatsCalculator::correlation(&table, a, b) {
                Ok(r) => println!("The standard correlation coefficient of {a} and {b} is {r}"),
                Err(e) => report(&format!(
                    "wrong column type for --corr (only numeric columns are supported): {e}"
                )),
            },
            None => report("wrong number of arguments for --corr"),
        }
    }

    Ok(())
}

/// Filter, project, sort or describe, and limit, in that order.
fn transform(mut table: DataFrame, args: &Args) -> Result<DataFrame> {
    if let Some(code) = args.kg {
        table = DataProcessor::filter_by_code(&table, code, &args.kg_column)
            .with_context(|| format!("filtering {} by {code}", args.kg_column))?;
        debug!(code, rows = table.height(), "filtered");
    }

    if let Some(selection) = args.column_selection() {
        table = DataProcessor::select_columns(&table, &selection)
            .with_context(|| format!("selecting columns {selection:?}"))?;
    }

    if let Some(column) = &args.sort_column {
        info!(%column, descending = args.desc, "sorting");
        table = DataProcessor::sort_by_column(&table, column, args.desc)
            .with_context(|| format!("sorting by {column}"))?;
    }

    if let Some(column) = &args.describe_column {
        let description = StatsCalculator::describe(&table, column)
            .with_context(|| format!("describing {column}"))?;
        debug!("{description}");
        table = description.to_frame()?;
    }

    if let Some(rows) = args.rows {
        table = DataProcessor::head(&table, rows);
    }

    Ok(table)
}

fn plot<R: ScatterRenderer>(table: &DataFrame, x: &str, y: &str, renderer: &R) -> Result<()> {
    let data = ScatterData::from_frame(table, x, y)?;
    renderer.render(&data)?;
    Ok(())
}

fn report(message: &str) {
    error!("{message}");
    eprintln!("Error: {message}");
}

/// Printed tables show up to `rows` rows, the polars default otherwise.
/// Runs once, before anything is printed.
fn configure_display(rows: Option<usize>) {
    if let Some(rows) = rows {
        std::env::set_var("POLARS_FMT_MAX_ROWS", rows.to_string());
    }
}

/// Every district, one tab-separated line each, independent of the table
/// row limit.
fn district_listing(districts: &mut DataFrame) -> Result<String> {
    to_csv_string(districts, b'\t').context("rendering the list of KG codes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartError;
    use std::cell::Cell;

    struct CountingRenderer {
        calls: Cell<usize>,
    }

    impl ScatterRenderer for CountingRenderer {
        fn render(&self, _data: &ScatterData) -> Result<(), ChartError> {
            self.calls.set(self.calls.get() + 1);
            Ok(())
        }
    }

    fn args(flags: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("kaufpreis-explorer").chain(flags.iter().copied()))
            .unwrap()
    }

    fn sample() -> DataFrame {
        df!(
            "KG.Code" => [1805i64, 1617, 1805, 1805],
            "Strasse" => ["A", "B", "C", "D"],
            "BJ" => [Some(1950i64), Some(1900), None, Some(1930)],
            "Bauzins" => [Some(3.0), Some(5.0), Some(1.0), None]
        )
        .unwrap()
    }

    #[test]
    fn transform_filters_sorts_and_limits() {
        let table = transform(sample(), &args(&["-K", "1805", "-s", "BJ", "-d", "-r", "2"])).unwrap();
        let streets: Vec<Option<&str>> = table.column("Strasse").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(streets, vec![Some("A"), Some("D")]);
    }

    #[test]
    fn transform_describe_replaces_the_table() {
        let table = transform(sample(), &args(&["-D", "Bauzins"])).unwrap();
        assert_eq!(table.shape(), (8, 2));
    }

    #[test]
    fn transform_with_unknown_code_is_empty() {
        let table = transform(sample(), &args(&["-K", "42"])).unwrap();
        assert_eq!(table.height(), 0);
    }

    #[test]
    fn transform_projection() {
        let table = transform(sample(), &args(&["--show-columns", "Strasse,BJ"])).unwrap();
        let names: Vec<String> = table.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["Strasse", "BJ"]);
    }

    #[test]
    fn district_listing_has_every_row() {
        let codes: Vec<i64> = (1001..=1100).collect();
        let names: Vec<String> = codes.iter().map(|c| format!("KG {c}")).collect();
        let mut districts = df!("KG-Nr." => codes, "Katastralgemeinde" => names).unwrap();

        let listing = district_listing(&mut districts).unwrap();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 101);
        assert_eq!(lines[0], "KG-Nr.\tKatastralgemeinde");
        assert_eq!(lines[100], "1100\tKG 1100");
    }

    #[test]
    fn plot_goes_through_the_renderer() {
        let renderer = CountingRenderer { calls: Cell::new(0) };
        plot(&sample(), "BJ", "Bauzins", &renderer).unwrap();
        assert_eq!(renderer.calls.get(), 1);
        assert!(plot(&sample(), "Strasse", "Bauzins", &renderer).is_err());
        assert_eq!(renderer.calls.get(), 1);
    }
}
