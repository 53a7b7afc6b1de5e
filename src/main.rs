//! zmqproxy - CSP ZeroMQ relay with capture tap
//!
//! # Usage
//!
//! ```bash
//! # Relay tcp://127.0.0.1:6000 -> tcp://127.0.0.1:7000, print headers
//! zmqproxy
//!
//! # CSP v1 headers, custom endpoints, keep a raw capture log
//! zmqproxy -v 1 -s tcp://0.0.0.0:6000 -p tcp://0.0.0.0:7000 -f capture.log
//!
//! # Load settings from a file (flags still win)
//! zmqproxy --config zmqproxy.toml -d
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use csp_zmqproxy::config::ProxyConfig;
use csp_zmqproxy::error::Result;
use csp_zmqproxy::service::proxy::run_until_ctrl_c;
use csp_zmqproxy::utils::logging::init_logging;
use tracing::error;

/// Relay CSP frames between ZeroMQ publishers and subscribers and print their headers
#[derive(Parser, Debug)]
#[command(name = "zmqproxy")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug output (frame hex dumps, debug log level)
    #[arg(short, long)]
    debug: bool,

    /// CSP header version (1 or 2)
    #[arg(short = 'v', long = "csp-version", value_name = "VERSION")]
    csp_version: Option<u8>,

    /// Subscriber (ingress) endpoint producers publish into [default: tcp://127.0.0.1:6000]
    #[arg(short = 's', long = "sub", value_name = "SUB_STR")]
    sub: Option<String>,

    /// Publisher (egress) endpoint consumers subscribe to [default: tcp://127.0.0.1:7000]
    #[arg(short = 'p', long = "pub", value_name = "PUB_STR")]
    publish: Option<String>,

    /// Append raw frames to this file
    #[arg(short = 'f', long = "logfile", value_name = "LOGFILE")]
    logfile: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error, or a tracing directive)
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    /// Defaults, then the config file, then the environment, then flags.
    fn build_config(&self) -> Result<ProxyConfig> {
        let mut config = match self.config {
            Some(ref path) => {
                let mut config = ProxyConfig::from_file(path)?;
                config.apply_env();
                config
            }
            None => ProxyConfig::from_env(),
        };
        self.apply_flags(&mut config);
        Ok(config)
    }

    fn apply_flags(&self, config: &mut ProxyConfig) {
        if self.debug {
            config.capture.debug = true;
        }
        if let Some(version) = self.csp_version {
            config.capture.version = version;
        }
        if let Some(ref sub) = self.sub {
            config.bus.ingress = sub.clone();
        }
        if let Some(ref publish) = self.publish {
            config.bus.egress = publish.clone();
        }
        if let Some(ref logfile) = self.logfile {
            config.capture.log_file = Some(logfile.clone());
        }
    }

    fn log_filter(&self, config: &ProxyConfig) -> Option<String> {
        self.log_level
            .clone()
            .or_else(|| config.capture.debug.then(|| "debug".to_string()))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", ProxyConfig::example_config());
        return ExitCode::SUCCESS;
    }

    let config = match cli.build_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("zmqproxy: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging, cli.log_filter(&config).as_deref()) {
        eprintln!("zmqproxy: {e}");
        return ExitCode::FAILURE;
    }

    match run_until_ctrl_c(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Proxy failed");
            eprintln!("zmqproxy: {e}");
            ExitCode::FAILURE
        }
    }
}
