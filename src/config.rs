use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "ledgera",
    about = "Deterministic monthly cash-flow and savings projection service"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "RUST_LOG",
        default_value = "ledgera=info",
        help = "tracing filter directive, e.g. ledgera=debug"
    )]
    pub log_filter: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP forecast API
    Serve(ServerConfig),
    /// Run one projection from a JSON assumptions file and print the result
    Forecast(ForecastArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,
    #[arg(long, env = "API_PORT", default_value_t = 8000)]
    pub port: u16,
    #[command(flatten)]
    pub forecast: ForecastDefaults,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8000,
            forecast: ForecastDefaults::default(),
        }
    }
}

/// Request defaults shared by the HTTP API and the one-shot command.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct ForecastDefaults {
    #[arg(
        long,
        env = "BASE_CURRENCY",
        default_value = "SGD",
        help = "Base currency assumed when a request omits one"
    )]
    pub base_currency: String,
    #[arg(long, env = "FORECAST_DEFAULT_MONTHS", default_value_t = 12)]
    pub default_months: u32,
    #[arg(
        long,
        env = "FORECAST_MAX_MONTHS",
        default_value_t = 1200,
        help = "Largest month count a single request may ask for"
    )]
    pub max_months: u32,
}

impl Default for ForecastDefaults {
    fn default() -> Self {
        Self {
            base_currency: "SGD".to_string(),
            default_months: 12,
            max_months: 1200,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ForecastArgs {
    #[arg(long, help = "Path to a JSON file with the forecast request body")]
    pub input: PathBuf,
    #[arg(long, help = "Number of months to project; defaults to --default-months")]
    pub months: Option<u32>,
    #[arg(long, help = "Print calendar-year summaries instead of months")]
    pub yearly: bool,
    #[command(flatten)]
    pub defaults: ForecastDefaults,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_uses_defaults() {
        let cli = Cli::try_parse_from(["ledgera", "serve"]).expect("valid args");
        let Command::Serve(config) = cli.command else {
            panic!("expected serve command");
        };
        assert_eq!(config.port, 8000);
        assert_eq!(config.forecast.default_months, 12);
        assert_eq!(config.forecast.max_months, 1200);
    }

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "ledgera",
            "serve",
            "--host",
            "127.0.0.1",
            "--port",
            "9001",
            "--base-currency",
            "EUR",
            "--max-months",
            "60",
        ])
        .expect("valid args");
        let Command::Serve(config) = cli.command else {
            panic!("expected serve command");
        };
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9001");
        assert_eq!(config.forecast.base_currency, "EUR");
        assert_eq!(config.forecast.max_months, 60);
    }

    #[test]
    fn forecast_requires_input() {
        assert!(Cli::try_parse_from(["ledgera", "forecast"]).is_err());

        let cli = Cli::try_parse_from([
            "ledgera",
            "forecast",
            "--input",
            "plan.json",
            "--months",
            "24",
            "--yearly",
        ])
        .expect("valid args");
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast command");
        };
        assert_eq!(args.months, Some(24));
        assert!(args.yearly);
        assert_eq!(args.input, PathBuf::from("plan.json"));
    }
}
