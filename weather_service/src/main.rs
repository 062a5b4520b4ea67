use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use weather_service::config::{ServiceConfig, resolve_api_key};
use weather_service::ingest::openweather::OpenWeatherClient;
use weather_service::logging::{self, DataSource, LogLevel};
use weather_service::report::{LiveSection, Report};
use weather_service::session::{AnalysisSession, check_live};

/// Analyze historical temperature readings for one city.
#[derive(Debug, Parser)]
#[command(name = "weather_service", version)]
struct Args {
    /// CSV with `timestamp`, `city` and `temperature` columns
    csv: PathBuf,

    /// City to analyze (defaults to the first city in the file)
    #[arg(long)]
    city: Option<String>,

    /// Print the cities present in the file and exit
    #[arg(long)]
    list_cities: bool,

    /// TOML configuration file
    #[arg(long, default_value = "weather_service.toml")]
    config: PathBuf,

    /// OpenWeatherMap API key (falls back to OPENWEATHER_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Month (1-12) to judge the live temperature against; defaults to now
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,

    /// Emit the report as JSON
    #[arg(long)]
    json: bool,

    /// Append log entries to this file
    #[arg(long)]
    log_file: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match ServiceConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ {}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = if args.verbose { LogLevel::Debug } else { config.logging.level };
    let log_file = args.log_file.as_deref().or(config.logging.file.as_deref());
    logging::init_logger(level, log_file, config.logging.timestamps);

    let mut session = match AnalysisSession::from_csv_path(&args.csv) {
        Ok(session) => session,
        Err(e) => {
            logging::error(DataSource::Csv, None, &format!("Could not process file: {}", e));
            return ExitCode::FAILURE;
        }
    };

    if args.list_cities {
        for city in session.cities() {
            println!("{}", city);
        }
        return ExitCode::SUCCESS;
    }

    if let Some(city) = args.city.as_deref() {
        if let Err(e) = session.select_city(city) {
            logging::error(DataSource::Analysis, Some(city), &e.to_string());
            return ExitCode::FAILURE;
        }
    }

    let analysis = match session.analyze(&config.analysis) {
        Ok(analysis) => analysis,
        Err(e) => {
            logging::error(DataSource::Analysis, session.selected_city(), &e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let live = match resolve_api_key(args.api_key.as_deref()) {
        None => {
            logging::debug(DataSource::System, None, "No API key; skipping live weather check");
            LiveSection::Skipped
        }
        Some(key) => {
            let result = OpenWeatherClient::new(&key, config.openweather.clone()).and_then(|client| {
                check_live(&client, &analysis, args.month, config.analysis.seasonal_sigma)
            });
            LiveSection::from_result(result)
        }
    };

    let report = Report {
        analysis: &analysis,
        live,
    };

    if args.json {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                logging::error(DataSource::System, None, &format!("Could not encode report: {}", e));
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", report.to_text());
    }

    ExitCode::SUCCESS
}
