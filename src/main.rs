//! Tabula - spreadsheet formula engine, command mode

mod config;
mod error;
mod logger;

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use error::{CliError, Result};
use tabula_core::{CellRef, TabulaError, Workbook};
use tabula_engine::engine::evaluate;

fn print_usage() {
    eprintln!("Usage: tabula [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --set <CELL=TEXT>     Set a cell's raw text (can be repeated)");
    eprintln!("  -c, --command <FORMULA>   Evaluate a formula against the cells and print it");
    eprintln!("  --rows <N>                Initial number of rows");
    eprintln!("  --cols <N>                Initial number of columns");
    eprintln!("  --config <path>           Load settings from TOML file");
    eprintln!("  --no-config               Ignore the user config file");
    eprintln!("  -v, --verbose             Log recalculation details to stderr");
    eprintln!("  -h, --help                Print help");
}

#[derive(Debug, Default, PartialEq)]
struct Options {
    assignments: Vec<(String, String)>,
    command: Option<String>,
    rows: Option<usize>,
    columns: Option<usize>,
    config_file: Option<PathBuf>,
    no_config: bool,
    verbose: bool,
}

impl Options {
    /// Returns None when help was requested.
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Option<Options>> {
        let mut options = Options::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let mut value = |name: &str| {
                args.next()
                    .ok_or_else(|| CliError::MissingValue(name.to_string()))
            };
            match arg.as_str() {
                "-h" | "--help" => return Ok(None),
                "-s" | "--set" => {
                    let assignment = value("--set")?;
                    let (name, raw) = assignment
                        .split_once('=')
                        .ok_or_else(|| CliError::InvalidAssignment(assignment.clone()))?;
                    options.assignments.push((name.trim().to_string(), raw.to_string()));
                }
                "-c" | "--command" => options.command = Some(value("--command")?),
                "--rows" => options.rows = Some(parse_count("--rows", value("--rows")?)?),
                "--cols" => options.columns = Some(parse_count("--cols", value("--cols")?)?),
                "--config" => options.config_file = Some(PathBuf::from(value("--config")?)),
                "--no-config" => options.no_config = true,
                "-v" | "--verbose" => options.verbose = true,
                other if other.starts_with('-') => {
                    return Err(CliError::UnknownOption(other.to_string()));
                }
                other => return Err(CliError::UnexpectedArgument(other.to_string())),
            }
        }
        Ok(Some(options))
    }
}

fn parse_count(option: &str, value: String) -> Result<usize> {
    value.parse().map_err(|_| CliError::InvalidNumber {
        option: option.to_string(),
        value,
    })
}

fn main() {
    let options = match Options::parse(env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_usage();
            return;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(options) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(options: Options) -> anyhow::Result<()> {
    logger::init(options.verbose);

    let settings = if options.no_config {
        config::Settings::default()
    } else {
        let (settings, warnings) = config::load_settings(options.config_file.as_ref());
        for warning in warnings {
            log::warn!("{}", warning);
        }
        settings
    };

    let mut workbook = Workbook::new(
        options.rows.unwrap_or(settings.rows),
        options.columns.unwrap_or(settings.columns),
    )
    .context("creating workbook")?;
    for (name, raw) in &options.assignments {
        let cell = CellRef::parse(name).ok_or_else(|| TabulaError::InvalidCellName(name.clone()))?;
        workbook
            .grow_to_fit(&cell)
            .with_context(|| format!("setting {}", name))?;
        workbook
            .set_raw(&cell, raw.as_str())
            .with_context(|| format!("setting {}", name))?;
    }
    workbook.recalc_all();

    if let Some(formula) = &options.command {
        let formula = if formula.starts_with('=') {
            formula.clone()
        } else {
            format!("={}", formula)
        };
        println!("{}", evaluate(&formula, &workbook));
        return Ok(());
    }

    for cell_ref in workbook.cell_names() {
        let Some(cell) = workbook.cell(&cell_ref) else {
            continue;
        };
        if cell.raw.trim().is_empty() {
            continue;
        }
        match &cell.error {
            Some(message) => println!("{}\t{}\t{}", cell_ref, cell.display, message),
            None => println!("{}\t{}", cell_ref, cell.display),
        }
    }
    Ok(())
}
