use axum::Router;
use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::codec::CodecCapability;
use crate::config::{SharedGatewayConfig, StartupConfig};
use crate::gateway::{Gateway, GatewayContext};
use crate::server::routes;
use crate::storage::filesystem::create_directory;

pub struct Server {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
}

impl Server {
    /// Bind the listener and wire the gateway into the router
    pub async fn new(startup: &StartupConfig, config: SharedGatewayConfig) -> io::Result<Self> {
        let socket = startup.listen_socket();

        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e);
            }
        };
        let local_addr = listener.local_addr()?;

        {
            let gateway_config = config.read().await;
            if let Err(e) = create_directory(&gateway_config.primary_root) {
                warn!("Failed to create primary root directory: {}", e);
            } else {
                info!("Primary root directory: {}", gateway_config.primary_root.display());
            }
        }

        let codec = CodecCapability::detect();
        if !codec.is_available() {
            warn!("Image codec unavailable, PNG assets will be stored as-is");
        }

        // Retrieval references must carry the port actually bound
        let bound = StartupConfig {
            port: local_addr.port(),
            ..startup.clone()
        };
        let context = GatewayContext {
            file_url_prefix: bound.file_url_prefix(),
            port: local_addr.port(),
            codec,
        };

        Ok(Self {
            listener,
            router: routes::router(Gateway::new(config, context)),
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn start(self) -> io::Result<()> {
        info!("Starting studio file gateway on {}", self.local_addr);
        axum::serve(self.listener, self.router).await
    }
}
