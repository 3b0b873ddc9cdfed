//! Studio File Gateway - Entry Point
//!
//! Local HTTP gateway that lets a browser studio save, serve and delete media files
//! under a set of configured directories.

use log::{error, info};
use std::process;

use studio_file_gateway::Server;
use studio_file_gateway::config::ServerConfig;
use studio_file_gateway::utils::setup_logging;

#[tokio::main]
async fn main() {
    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            // Logging is not set up yet
            eprintln!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    setup_logging(config.server.quiet);
    info!("Launching studio file gateway...");

    let (startup, gateway_config) = config.split();

    let server = match Server::new(&startup, gateway_config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed on {}: {}", startup.listen_socket(), e);
            process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        error!("Server stopped with error: {}", e);
        process::exit(1);
    }
}
