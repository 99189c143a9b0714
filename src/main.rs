use std::fs;

use clap::Parser;
use ledgera::config::{Cli, Command};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    ledgera::init_tracing(&cli.log_filter);

    match cli.command {
        Command::Serve(config) => {
            if let Err(e) = ledgera::api::run_http_server(config).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Forecast(args) => {
            let body = match fs::read_to_string(&args.input) {
                Ok(body) => body,
                Err(e) => {
                    eprintln!("Cannot read {}: {e}", args.input.display());
                    std::process::exit(1);
                }
            };
            match ledgera::api::forecast_json(&args.defaults, args.months, &body, args.yearly) {
                Ok(rendered) => println!("{rendered}"),
                Err(e) => {
                    eprintln!("Forecast error: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
