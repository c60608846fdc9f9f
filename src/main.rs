use std::env;

use clap::Parser;
use retirement_gap::api::{self, Cli};
use retirement_gap::core::PolicyConfig;

#[tokio::main]
async fn main() {
    env_logger::init();

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = raw_args
            .get(2)
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        let policy = match raw_args.get(3) {
            Some(path) => match PolicyConfig::from_path(path) {
                Ok(policy) => policy,
                Err(e) => {
                    eprintln!("Policy error: {e}");
                    std::process::exit(1);
                }
            },
            None => PolicyConfig::default(),
        };
        if let Err(e) = api::run_http_server(port, policy).await {
            eprintln!("Server error: {e}");
            std::process::exit(1);
        }
        return;
    }

    let cli = Cli::parse();
    match api::run_cli(cli) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
