use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use pressure_logger_common::browse::browse_nodes;
use pressure_logger_common::config::{
    DEFAULT_ENDPOINT_URL, DEFAULT_INTERVAL, DEFAULT_LOG_FILE, DEFAULT_NODE_ID,
};
use pressure_logger_common::poller::Poller;
use pressure_logger_common::session::{
    connect, Connector, DummyConnector, OpcUaConnector, SessionGuard, SessionPointer,
};
use pressure_logger_common::{Config, ShutdownSignal};

#[derive(Parser)]
#[command(name = "pressure-logger", version)]
#[command(about = "Polls a pressure value from an OPC UA server and appends it to a text log")]
struct Cli {
    /// OPC UA server endpoint
    #[arg(short, long, default_value = DEFAULT_ENDPOINT_URL)]
    url: String,

    /// Node id of the pressure value
    #[arg(short, long, default_value = DEFAULT_NODE_ID)]
    node_id: String,

    /// File the readings are appended to
    #[arg(short, long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Seconds between two readings
    #[arg(short, long, default_value_t = DEFAULT_INTERVAL.as_secs())]
    interval: u64,

    /// List the address space below Objects before logging
    #[arg(long)]
    browse: bool,

    /// List the address space and exit
    #[arg(long)]
    browse_only: bool,

    /// Serve readings from a built-in dummy server instead of connecting
    #[arg(long)]
    simulate: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            endpoint_url: self.url.clone(),
            node_id: self.node_id.clone(),
            log_file: self.log_file.clone(),
            interval: Duration::from_secs(self.interval),
        }
    }
}

/// Holds the open session until the poller takes it over.
struct App {
    config: Config,
    session: SessionGuard<SessionPointer>,
    browse: bool,
    browse_only: bool,
}

impl App {
    /// Validates the configuration and connects. Any failure here is fatal.
    fn new(cli: &Cli) -> anyhow::Result<Self> {
        if cli.simulate {
            log::info!("Simulating the server, nothing goes over the network");
            Self::with_connector(cli, &DummyConnector::new()?)
        } else {
            Self::with_connector(cli, &OpcUaConnector::new())
        }
    }

    fn with_connector<C>(cli: &Cli, connector: &C) -> anyhow::Result<Self>
    where
        C: Connector,
        C::Session: 'static,
    {
        let config = cli.config();
        config.validate()?;

        let session: SessionPointer = Box::new(connect(connector, &config.endpoint_url)?);

        Ok(Self {
            config,
            session: SessionGuard::new(session),
            browse: cli.browse || cli.browse_only,
            browse_only: cli.browse_only,
        })
    }

    /// Optionally browses, then polls until Ctrl+C.
    fn run(self) -> anyhow::Result<()> {
        if self.browse {
            let mut out = std::io::stdout().lock();
            if let Err(e) = browse_nodes(&*self.session, &mut out) {
                log::error!("{e}");
            }
        }

        if self.browse_only {
            return Ok(());
        }

        let shutdown = ShutdownSignal::new();
        let handler_signal = shutdown.clone();
        ctrlc::set_handler(move || {
            log::info!("Interrupted, stopping");
            handler_signal.trigger();
        })?;
        log::info!("Press Ctrl+C to stop");

        let stats = Poller::new(self.session, &self.config).run(&shutdown);
        log::info!(
            "Logged {} readings in {} polls ({} read failures, {} write failures)",
            stats.logged,
            stats.ticks,
            stats.read_failures,
            stats.write_failures
        );

        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let app = App::new(&cli)?;

    app.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["pressure-logger"]);
        assert_eq!(cli.config(), Config::default());
        assert!(!cli.browse);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "pressure-logger",
            "--url",
            "opc.tcp://127.0.0.1:4840",
            "--interval",
            "1",
            "--log-file",
            "g1.txt",
            "--browse-only",
        ]);
        let config = cli.config();
        assert_eq!(config.endpoint_url, "opc.tcp://127.0.0.1:4840");
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.log_file, PathBuf::from("g1.txt"));
        assert!(cli.browse_only);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let cli = Cli::parse_from(["pressure-logger", "--simulate", "--interval", "0"]);
        assert!(App::new(&cli).is_err());
    }

    #[test]
    fn test_simulated_browse_only() {
        let cli = Cli::parse_from(["pressure-logger", "--simulate", "--browse-only"]);
        let app = App::new(&cli).unwrap();
        assert!(app.browse);
        app.run().unwrap();
    }

    #[test]
    fn test_unreachable_server_fails_before_polling() {
        let dir = std::env::temp_dir().join(format!("pressure-logger-{}", std::process::id()));
        let log_file = dir.join("pressure_log.txt");
        let cli = Cli::parse_from(["pressure-logger", "--log-file", log_file.to_str().unwrap()]);

        let result = App::with_connector(&cli, &DummyConnector::unreachable());

        let err = result.err().unwrap();
        assert!(err.to_string().starts_with("error connecting to OPC UA server"));
        assert!(!log_file.exists());
    }
}
