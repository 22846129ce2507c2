use std::sync::Arc;

use accountotron::config::{load_config, print_schema};
use accountotron::startup;
use accountotron::utils::logger::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::args().any(|arg| arg == "--print-schema") {
        print_schema()?;
        return Ok(());
    }

    let config = Arc::new(load_config());
    init_logging(&config.logging)?;

    startup::run(config).await
}
