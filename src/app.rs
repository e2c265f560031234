//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and merges them with the config file
//! - sets up logging
//! - loads the dataset and builds the query filter
//! - hands results to a presenter (text, SVG charts, dashboard)
//! - writes optional exports

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::cli::{ChartsArgs, Command, DataArgs, FilterArgs, InitConfigArgs, PlotArgs, SampleArgs, SummaryArgs};
use crate::config::Settings;
use crate::domain::{Dataset, FilterSpec};
use crate::error::AppError;
use crate::io::ingest::LoadOptions;
use crate::report::{ALL_RANKINGS, TextPresenter, present};

pub mod pipeline;

use pipeline::{DatasetHandle, run_query};

/// Entry point for the `superstore` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` must be read before clap so `SUPERSTORE_DATA` can come from it.
    let _ = dotenvy::dotenv();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    // The dashboard owns the terminal; it only logs to a file.
    let to_stderr = !matches!(cli.command, Command::Tui(_));
    crate::logging::init_logging(&cli.log_level, cli.log_file.as_deref(), to_stderr)?;

    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Overview(args) => handle_overview(&settings, &args),
        Command::Summary(args) => handle_summary(&settings, &args),
        Command::Charts(args) => handle_charts(&settings, &args),
        Command::Plot(args) => handle_plot(&args),
        Command::Tui(args) => {
            let handle = DatasetHandle::new(load_options_from(&settings, &args.data)?);
            crate::tui::run(handle, &args.filter, &settings)
        }
        Command::Sample(args) => handle_sample(&args),
        Command::InitConfig(args) => handle_init_config(&args),
    }
}

/// `--config <path>` if given, else `./superstore.toml` if present, else defaults.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, AppError> {
    match path {
        Some(path) => Settings::load(path),
        None => Ok(Settings::load_default()?.unwrap_or_default()),
    }
}

/// Merge CLI/env data flags with the config file.
///
/// Path precedence: `--data` > `SUPERSTORE_DATA` > `data.path` > interactive picker.
pub fn load_options_from(settings: &Settings, args: &DataArgs) -> Result<LoadOptions, AppError> {
    let path = match resolve_data_path(settings, args) {
        Some(path) => path,
        None => crate::cli::picker::prompt_for_csv_path()?,
    };

    Ok(LoadOptions {
        path,
        columns: settings.data.columns.clone(),
        date_formats: settings.data.date_formats.clone(),
        row_policy: args.on_invalid_row.unwrap_or(settings.data.on_invalid_row),
    })
}

fn resolve_data_path(settings: &Settings, args: &DataArgs) -> Option<PathBuf> {
    args.data.clone().or_else(|| settings.data.path.clone())
}

/// Build the query filter from the CLI flags.
///
/// A missing date bound takes the dataset's earliest/latest order date, moved
/// to the given bound when the data ends before it; missing category or region
/// lists select every value seen in the dataset.
pub fn filter_spec_from_args(dataset: &Dataset, args: &FilterArgs) -> Result<FilterSpec, AppError> {
    let mut spec = FilterSpec::all(dataset);

    let range = match (args.from, args.to) {
        (None, None) => None,
        (Some(start), None) => Some((start, spec.date_end().max(start))),
        (None, Some(end)) => Some((spec.date_start().min(end), end)),
        (Some(start), Some(end)) => Some((start, end)),
    };
    if let Some((start, end)) = range {
        spec = spec.with_dates(start, end)?;
    }

    if !args.categories.is_empty() {
        warn_unknown("category", &args.categories, &dataset.categories());
        spec = spec.with_categories(args.categories.iter().cloned());
    }
    if !args.regions.is_empty() {
        warn_unknown("region", &args.regions, &dataset.regions());
        spec = spec.with_regions(args.regions.iter().cloned());
    }

    Ok(spec)
}

fn warn_unknown(what: &str, requested: &[String], known: &[String]) {
    for value in requested.iter().filter(|v| !known.contains(v)) {
        tracing::warn!("{what} '{value}' does not occur in the dataset");
    }
}

fn handle_overview(settings: &Settings, args: &DataArgs) -> Result<(), AppError> {
    let handle = DatasetHandle::new(load_options_from(settings, args)?);
    let dataset = handle.get()?;
    let profile = crate::report::profile_dataset(&dataset);
    print!("{}", crate::report::format_profile(&profile));
    Ok(())
}

fn handle_summary(settings: &Settings, args: &SummaryArgs) -> Result<(), AppError> {
    let handle = DatasetHandle::new(load_options_from(settings, &args.data)?);
    let loaded = handle.loaded()?;
    let spec = filter_spec_from_args(&loaded.dataset, &args.filter)?;
    let output = run_query(&loaded.dataset, &spec);

    let source = handle.options().path.display().to_string();
    print!(
        "{}",
        crate::report::format_run_header(loaded, &source, &spec, output.matched)
    );

    let plot = (!args.no_plot).then(|| {
        (
            args.width.unwrap_or(settings.output.plot_width),
            args.height.unwrap_or(settings.output.plot_height),
        )
    });
    let mut presenter = TextPresenter::new(plot);
    match present(&output.result, &ALL_RANKINGS, &mut presenter) {
        Ok(()) => {}
        Err(never) => match never {},
    }
    print!("{}", presenter.finish());

    if let Some(path) = &args.export_filtered {
        let filtered = crate::engine::filter(&loaded.dataset, &spec);
        crate::io::export::write_filtered_csv(path, &filtered)?;
        println!("\nFiltered rows written to {}", path.display());
    }
    if let Some(path) = &args.export_summary {
        let summary = crate::io::summary::SummaryFile::new(Some(&handle.options().path), &spec, &output.result);
        crate::io::summary::write_summary_json(path, &summary)?;
        println!("Summary written to {}", path.display());
    }

    Ok(())
}

fn handle_charts(settings: &Settings, args: &ChartsArgs) -> Result<(), AppError> {
    let handle = DatasetHandle::new(load_options_from(settings, &args.data)?);
    let dataset = handle.get()?;
    let spec = filter_spec_from_args(&dataset, &args.filter)?;
    let output = run_query(&dataset, &spec);

    let dir = args.out_dir.clone().unwrap_or_else(|| settings.output.chart_dir.clone());
    let size = (settings.output.chart_width, settings.output.chart_height);
    let written = crate::chart::write_charts(&output.result, &dir, size)?;

    println!("Matching orders: {}", output.matched);
    for path in written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn handle_plot(args: &PlotArgs) -> Result<(), AppError> {
    let summary = crate::io::summary::read_summary_json(&args.summary)?;

    println!(
        "Summary generated {} from {}",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S"),
        summary.source.as_deref().unwrap_or("(unknown)")
    );
    println!(
        "Filter: {} .. {}\n",
        summary.filter.date_start(),
        summary.filter.date_end()
    );

    let mut presenter = TextPresenter::new(Some((args.width, args.height)));
    match present(&summary.result, &ALL_RANKINGS, &mut presenter) {
        Ok(()) => {}
        Err(never) => match never {},
    }
    print!("{}", presenter.finish());
    Ok(())
}

fn handle_sample(args: &SampleArgs) -> Result<(), AppError> {
    let config = crate::data::SampleConfig {
        rows: args.rows,
        seed: args.seed,
        start: args.from,
        end: args.to,
    };
    let dataset = crate::data::generate_dataset(&config)?;
    let everything = FilterSpec::all(&dataset);
    let filtered = crate::engine::filter(&dataset, &everything);
    crate::io::export::write_filtered_csv(&args.output, &filtered)?;
    println!("Wrote {} rows to {}", dataset.len(), args.output.display());
    Ok(())
}

fn handle_init_config(args: &InitConfigArgs) -> Result<(), AppError> {
    if args.path.exists() && !args.force {
        return Err(AppError::new(
            2,
            format!("{} already exists (use --force to overwrite).", args.path.display()),
        ));
    }
    fs::write(&args.path, Settings::default_toml())
        .map_err(|e| AppError::new(2, format!("Failed to write config '{}': {e}", args.path.display())))?;
    println!("Wrote {}", args.path.display());
    Ok(())
}

/// Rewrite argv so `superstore` defaults to `superstore tui`.
///
/// Rules:
/// - `superstore`                      -> `superstore tui`
/// - `superstore --data x.csv ...`     -> `superstore tui --data x.csv ...`
/// - `superstore --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::Record;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dataset() -> Dataset {
        Dataset::new(
            Vec::new(),
            vec![
                Record::new(d(2023, 1, 5), "Furniture", "East", Decimal::from(100), Decimal::from(10)),
                Record::new(d(2023, 3, 9), "Technology", "West", Decimal::from(200), Decimal::from(-5)),
            ],
        )
    }

    #[test]
    fn rewrite_defaults_to_tui() {
        assert_eq!(rewrite_args(argv(&["superstore"])), argv(&["superstore", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["superstore", "--data", "x.csv"])),
            argv(&["superstore", "tui", "--data", "x.csv"])
        );
        assert_eq!(rewrite_args(argv(&["superstore", "--help"])), argv(&["superstore", "--help"]));
        assert_eq!(
            rewrite_args(argv(&["superstore", "summary"])),
            argv(&["superstore", "summary"])
        );
    }

    #[test]
    fn missing_filter_flags_select_everything() {
        let ds = dataset();
        let spec = filter_spec_from_args(&ds, &FilterArgs::default()).unwrap();
        assert_eq!(spec, FilterSpec::all(&ds));
        assert_eq!(spec.date_start(), d(2023, 1, 5));
        assert_eq!(spec.date_end(), d(2023, 3, 9));
    }

    #[test]
    fn single_date_bound_takes_the_other_from_the_data() {
        let ds = dataset();
        let args = FilterArgs {
            from: Some(d(2023, 2, 1)),
            ..FilterArgs::default()
        };
        let spec = filter_spec_from_args(&ds, &args).unwrap();
        assert_eq!(spec.date_start(), d(2023, 2, 1));
        assert_eq!(spec.date_end(), d(2023, 3, 9));
        assert_eq!(run_query(&ds, &spec).matched, 1);
    }

    #[test]
    fn open_ended_range_past_the_data_matches_nothing() {
        let ds = dataset();
        let after = FilterArgs {
            from: Some(d(2030, 1, 1)),
            ..FilterArgs::default()
        };
        let spec = filter_spec_from_args(&ds, &after).unwrap();
        assert_eq!((spec.date_start(), spec.date_end()), (d(2030, 1, 1), d(2030, 1, 1)));
        let output = run_query(&ds, &spec);
        assert_eq!(output.matched, 0);
        assert_eq!(output.result.total_sales, Decimal::ZERO);

        let before = FilterArgs {
            to: Some(d(2000, 1, 1)),
            ..FilterArgs::default()
        };
        let spec = filter_spec_from_args(&ds, &before).unwrap();
        assert_eq!((spec.date_start(), spec.date_end()), (d(2000, 1, 1), d(2000, 1, 1)));
        let output = run_query(&ds, &spec);
        assert_eq!(output.matched, 0);
        assert_eq!(output.result.order_count, 0);
    }

    #[test]
    fn inverted_flags_are_rejected() {
        let ds = dataset();
        let args = FilterArgs {
            from: Some(d(2023, 3, 1)),
            to: Some(d(2023, 1, 1)),
            ..FilterArgs::default()
        };
        let err = filter_spec_from_args(&ds, &args).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("inverted"));
    }

    #[test]
    fn category_flags_restrict_the_allow_list() {
        let ds = dataset();
        let args = FilterArgs {
            categories: vec!["Technology".to_string()],
            ..FilterArgs::default()
        };
        let spec = filter_spec_from_args(&ds, &args).unwrap();
        assert_eq!(spec.categories().len(), 1);
        assert_eq!(spec.regions().len(), 2);
        assert_eq!(run_query(&ds, &spec).result.total_sales, Decimal::from(200));
    }

    #[test]
    fn data_flag_wins_over_config_path() {
        let mut settings = Settings::default();
        settings.data.path = Some(PathBuf::from("from_config.csv"));

        let args = DataArgs {
            data: Some(PathBuf::from("from_flag.csv")),
            on_invalid_row: None,
        };
        let options = load_options_from(&settings, &args).unwrap();
        assert_eq!(options.path, PathBuf::from("from_flag.csv"));
        assert_eq!(options.row_policy, settings.data.on_invalid_row);

        let options = load_options_from(&settings, &DataArgs::default()).unwrap();
        assert_eq!(options.path, PathBuf::from("from_config.csv"));
    }

    #[test]
    fn init_config_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("superstore.toml");
        let args = InitConfigArgs { path: path.clone(), force: false };
        handle_init_config(&args).unwrap();
        assert!(Settings::load(&path).is_ok());
        assert_eq!(handle_init_config(&args).unwrap_err().exit_code(), 2);
        handle_init_config(&InitConfigArgs { path, force: true }).unwrap();
    }
}
