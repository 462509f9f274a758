//! Stylecheck: parses stylesheets and reports every recovered error

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::process;
use stylecore::{
    config, default_converters, parse_file, StyleError, StyleManager, Stylesheet, DESCRIPTION,
    VERSION,
};
use walkdir::WalkDir;

/// Element type for a manager that only loads and validates sheets.
#[derive(Debug)]
struct NoElements;

impl stylecore::SelectorModel for NoElements {
    type Element = ();

    fn has_id(&self, _: &(), _: &str) -> bool {
        false
    }

    fn has_type(&self, _: &(), _: &str) -> bool {
        false
    }

    fn has_style_class(&self, _: &(), _: &str) -> bool {
        false
    }

    fn has_pseudo_class(&self, _: &(), _: &str) -> bool {
        false
    }

    fn attribute_value(&self, _: &(), _: &str) -> Option<String> {
        None
    }

    fn parent(&self, _: &()) -> Option<()> {
        None
    }

    fn previous_sibling(&self, _: &()) -> Option<()> {
        None
    }
}

fn main() {
    let matches = build_cli().get_matches();
    setup_logging(matches.get_count("verbose"));

    match run(&matches) {
        Ok(0) => {}
        Ok(error_count) => {
            eprintln!("{} error(s) found", error_count);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("stylecheck: {}", e);
            process::exit(2);
        }
    }
}

fn build_cli() -> Command {
    Command::new("stylecheck")
        .version(VERSION)
        .about(DESCRIPTION)
        .author("Stylecore Developers")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Engine configuration (.toml or .json); its stylesheets are checked too"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase verbosity (can be used multiple times)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print each parsed stylesheet as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("paths")
                .value_name("PATH")
                .help("Stylesheet files or directories to search for .css files")
                .num_args(1..)
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
}

fn setup_logging(verbose_count: u8) {
    let log_level = match verbose_count {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(log_level);
    }
    builder.format_timestamp_secs().init();
}

/// Returns the number of errors reported.
fn run(matches: &ArgMatches) -> Result<usize, StyleError> {
    let mut error_count = 0;

    if let Some(config_path) = matches.get_one::<String>("config") {
        let config = config::load(config_path)?;
        let manager: StyleManager<NoElements> =
            StyleManager::from_config(&config, default_converters())?;
        for (source, error) in manager.parse_errors() {
            report(&source.to_string(), error);
            error_count += 1;
        }
    }

    let json = matches.get_flag("json");
    for path in matches.get_many::<PathBuf>("paths").into_iter().flatten() {
        for file in stylesheet_files(path)? {
            let (stylesheet, errors) = parse_file(&file)?;
            log::info!(
                "{}: {} rule(s), {} declaration(s)",
                file.display(),
                stylesheet.rules.len(),
                stylesheet.declaration_count()
            );
            for error in &errors {
                report(&file.display().to_string(), error);
            }
            error_count += errors.len();

            if json {
                print_json(&file, &stylesheet)?;
            }
        }
    }

    Ok(error_count)
}

fn stylesheet_files(path: &Path) -> Result<Vec<PathBuf>, StyleError> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| StyleError::Io(e.into()))?;
        let is_css = entry
            .path()
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("css"));
        if entry.file_type().is_file() && is_css {
            files.push(entry.into_path());
        }
    }
    log::debug!("Found {} stylesheet(s) under {}", files.len(), path.display());
    Ok(files)
}

fn report(source: &str, error: &StyleError) {
    match error.position() {
        Some(position) => eprintln!("{}:{}: {}", source, position.line, error),
        None => eprintln!("{}: {}", source, error),
    }
}

fn print_json(file: &Path, stylesheet: &Stylesheet) -> Result<(), StyleError> {
    let document = serde_json::json!({
        "file": file.display().to_string(),
        "stylesheet": stylesheet,
    });
    let text = serde_json::to_string_pretty(&document).map_err(|e| StyleError::InvalidFormat {
        message: format!("Cannot serialize {}: {}", file.display(), e),
    })?;
    println!("{}", text);
    Ok(())
}
