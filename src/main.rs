use std::sync::Arc;

use webmetric::config::{load_config, print_schema, DEFAULT_CONFIG_PATH};
use webmetric::error::StartupError;
use webmetric::startup;
use webmetric::utils::logger::init_logging;

async fn start(config_path: &str) -> Result<(), StartupError> {
    let config = load_config(config_path)?;
    init_logging(&config.logging)?;
    startup::run(Arc::new(config)).await
}

#[tokio::main]
async fn main() {
    let arg = std::env::args().nth(1);

    if arg.as_deref() == Some("--print-schema") {
        if let Err(e) = print_schema() {
            eprintln!("Error printing configuration schema: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let config_path = arg.unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    if let Err(e) = start(&config_path).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
