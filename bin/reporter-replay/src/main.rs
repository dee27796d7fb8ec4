use std::{
    fs::File,
    io::{self, BufReader},
};

use clap::Parser as _;
use metrics_util::debugging::DebuggingRecorder;
use receiver_app::{generic_error, prelude::*};
use receiver_config::ConfigurationLoader;
use receiver_metrics::Meter;
use statsd_reporter::{ReporterConfiguration, TracingLogger};
use tracing::{error, info};

mod config;
use self::config::Cli;

mod replay;
use self::replay::{render_series, replay};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = initialize_logging(Some(cli.log_level())) {
        fatal_and_exit(format!("failed to initialize logging: {}", e));
    }

    if let Err(e) = run(cli) {
        error!("{:?}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), GenericError> {
    let mut loader = ConfigurationLoader::default();
    if let Some(path) = &cli.config {
        loader = loader.from_yaml(path)?;
    }
    let configuration = loader.from_environment("STATSD_REPORTER")?.into_generic();
    let reporter_config = ReporterConfiguration::from_configuration(&configuration)?;

    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let meter = Meter::new(recorder);
    let reporter = reporter_config.build(TracingLogger::new(), &meter)?;

    info!(receiver = %reporter_config.receiver_id(), "Replaying parse outcomes...");

    let summary = match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .map_err(|e| generic_error!("Failed to open input file '{}': {}", path.display(), e))?;
            replay(BufReader::new(file), &reporter)?
        }
        None => replay(io::stdin().lock(), &reporter)?,
    };

    info!(
        records = summary.records,
        successes = summary.successes,
        failures = summary.failures,
        "Replay complete."
    );

    for line in render_series(snapshotter.snapshot().into_vec()) {
        println!("{}", line);
    }

    Ok(())
}
