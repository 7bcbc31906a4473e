mod config;
mod logging;

use bridge::config::StatsdConfig;
use clap::{Args, Parser};
use config::{Config, ConfigError};
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "galeb-metrics", about = "Forwards load balancer metrics to statsd")]
enum CliCommand {
    /// Start the bridge
    Run(ConfigArgs),
    /// Load and validate the configuration, then exit
    ValidateConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long)]
    config_file_path: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load(self.config_file_path.as_deref(), |name| std::env::var(name).ok())
    }
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not create self-metrics recorder: {0}")]
    Recorder(#[from] metrics_exporter_statsd::StatsdError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Bridge(#[from] bridge::errors::BridgeError),
}

fn main() {
    let cli = CliCommand::parse();

    if let Err(e) = cli_main(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn cli_main(cli: CliCommand) -> Result<(), CliError> {
    match cli {
        CliCommand::Run(args) => {
            let config = args.load()?;
            let _sentry = logging::init(&config.logging);

            init_self_metrics(&config.bridge.statsd)?;

            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            tracing::info!("Starting galeb-metrics");
            rt.block_on(bridge::run(config.bridge))?;
        }
        CliCommand::ValidateConfig(args) => {
            let config = args.load()?;
            let statsd = &config.bridge.statsd;
            println!(
                "Config OK: statsd at {}:{} with prefix {}",
                statsd.host, statsd.port, statsd.prefix
            );
        }
    }
    Ok(())
}

/// Reports the bridge's own counters next to the forwarded metrics, under `<prefix>.bridge`.
fn init_self_metrics(statsd: &StatsdConfig) -> Result<(), CliError> {
    let prefix = format!("{}.bridge", statsd.prefix);
    let recorder =
        StatsdBuilder::from(statsd.host.clone(), statsd.port).build(Some(prefix.as_str()))?;

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("a metrics recorder is already installed, self-metrics are disabled");
        return Ok(());
    }
    shared::metrics_defs::describe_all(bridge::metrics_defs::ALL_METRICS);
    Ok(())
}
