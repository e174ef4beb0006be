//! Wiresight CLI

use std::path::Path;
use std::process;

use hyper::Uri;
use tracing_subscriber::EnvFilter;

use wiresight::config::Config;
use wiresight::{inspect, InspectParams, Module, RequestOptions, Result, WiresightError};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "get" => {
            if args.len() < 3 {
                eprintln!("Usage: wiresight get <url> [config.toml]");
                process::exit(1);
            }

            let config = match args.get(3) {
                Some(path) => match Config::from_file(Path::new(path)) {
                    Ok(config) => config,
                    Err(e) => {
                        eprintln!("{e}");
                        process::exit(1);
                    }
                },
                None => Config::default(),
            };

            if let Err(e) = run_get(&args[2], &config).await {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
        command => {
            eprintln!("Unknown command: {command}");
            eprintln!("Run 'wiresight' for usage information.");
            process::exit(1);
        }
    }
}

fn usage() {
    eprintln!("Wiresight v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();
    eprintln!("Usage: wiresight <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  get <url> [config.toml]    Issue a GET request and dump the inspected record");
}

/// Issue an instrumented GET against `url` and dump the captured record
async fn run_get(url: &str, config: &Config) -> Result<()> {
    let uri = url
        .parse::<Uri>()
        .map_err(|e| WiresightError::InvalidRequest(format!("Invalid URL '{url}': {e}")))?;

    let module = match uri.scheme_str() {
        Some("http") => Module::http(),
        Some("https") => Module::https(),
        other => {
            return Err(WiresightError::InvalidRequest(format!(
                "Unsupported URL scheme: {}",
                other.unwrap_or("<none>")
            )));
        }
    };

    let host = uri
        .host()
        .ok_or_else(|| WiresightError::InvalidRequest(format!("URL has no host: {url}")))?;

    let requests = inspect(InspectParams {
        module,
        max_requests: Some(config.max_requests),
    })?;

    let mut options = RequestOptions::new(host);
    options.port = uri.port_u16();
    options.path = uri
        .path_and_query()
        .map_or_else(|| "/".to_string(), ToString::to_string);
    for header in &config.headers {
        options
            .headers
            .push((header.name.clone(), header.value.clone()));
    }

    let request = module.request(options)?;
    let response = request.end().await?;
    response.bytes().await?;

    if let Some((_, record)) = requests.shift() {
        record.dump_stdout()?;
        println!();
    }

    Ok(())
}
