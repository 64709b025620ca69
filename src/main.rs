use std::io;
use std::process::ExitCode;

use chrono::Local;
use tracing::{Level, error, info};

use krasecology_report::cli::{self, Choice};
use krasecology_report::config::Config;
use krasecology_report::model::Interval;
use krasecology_report::{collect, directory, ingest::krasecology, logging, report};

fn main() -> ExitCode {
    logging::init_logging(Level::INFO);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    if let Err(e) = cli::print_title(&mut output) {
        error!(stage = %logging::Stage::System, "console unavailable: {}", e);
        return ExitCode::FAILURE;
    }

    let interval = match cli::prompt_interval(&mut input, &mut output) {
        Ok(Choice::Run(interval)) => interval,
        Ok(Choice::Quit) => return ExitCode::SUCCESS,
        Err(e) => {
            error!(stage = %logging::Stage::System, "console unavailable: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(interval) {
        Ok(()) => {
            info!("Завершение");
            let _ = cli::wait_for_exit(&mut input, &mut output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(stage = %logging::Stage::System, "{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(interval: Interval) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default()?;
    let client = krasecology::build_client(&config.source)?;
    let scanned_at = Local::now().naive_local();

    let sensors = directory::resolve_sensors(&client, &config.source, &config.stations);
    let collected = collect::collect_series(
        &client,
        &config.source,
        &config.stations,
        &sensors,
        interval,
        scanned_at,
    );

    let destination = config
        .report
        .resolve_output_dir()
        .join(report::report_file_name(&config.report.site_label, scanned_at));
    report::write_report(&collected, &config.report, &destination)?;

    Ok(())
}
