//! TCP listener and WebSocket upgrade, one task per connection

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::session::run_session;
use crate::world::World;
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;

/// Accepts connections and hands each upgraded socket to its own session task
pub struct Server {
    listener: TcpListener,
    world: Arc<World>,
    ws_path: Arc<str>,
}

impl Server {
    pub async fn bind(config: &ServerConfig, world: Arc<World>) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.bind_address)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.bind_address.clone(),
                source,
            })?;

        if let Ok(addr) = listener.local_addr() {
            info!("Server listening on ws://{}{}", addr, config.ws_path);
        }

        Ok(Server {
            listener,
            world,
            ws_path: Arc::from(config.ws_path.as_str()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(ServerError::Accept)
    }

    /// Accept loop. Runs until the listener itself fails.
    pub async fn run(self) -> Result<(), ServerError> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) if is_transient(&e) => {
                    warn!("Transient accept failure: {}", e);
                    continue;
                }
                Err(e) => {
                    error!("Listener failed: {}", e);
                    return Err(ServerError::Accept(e));
                }
            };

            let world = Arc::clone(&self.world);
            let ws_path = Arc::clone(&self.ws_path);
            tokio::spawn(async move {
                handle_connection(stream, peer, world, ws_path).await;
            });
        }
    }
}

fn is_transient(e: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    matches!(
        e.kind(),
        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::Interrupted
    )
}

/// Rejects any upgrade request whose path differs from `expected`.
fn check_path(expected: &str, request: &Request) -> Result<(), ErrorResponse> {
    if request.uri().path() == expected {
        return Ok(());
    }
    let mut response = ErrorResponse::new(Some(format!(
        "no websocket endpoint at {}",
        request.uri().path()
    )));
    *response.status_mut() = StatusCode::NOT_FOUND;
    Err(response)
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    world: Arc<World>,
    ws_path: Arc<str>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Could not disable Nagle for {}: {}", peer, e);
    }

    let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        check_path(&ws_path, request)?;
        Ok(response)
    };

    let ws = match accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", peer, e);
            return;
        }
    };
    debug!("Upgraded connection from {}", peer);

    // Session errors are already logged and never affect other connections.
    let _ = run_session(world, ws, peer).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;

    fn request(path: &str) -> Request {
        Request::builder().uri(path).body(()).unwrap()
    }

    #[test]
    fn test_check_path_accepts_configured_path() {
        assert!(check_path("/ws", &request("/ws")).is_ok());
    }

    #[test]
    fn test_check_path_rejects_other_paths() {
        let rejected = check_path("/ws", &request("/other")).unwrap_err();
        assert_eq!(rejected.status(), StatusCode::NOT_FOUND);

        assert!(check_path("/ws", &request("/")).is_err());
        assert!(check_path("/ws", &request("/ws/extra")).is_err());
    }

    #[test]
    fn test_transient_errors() {
        use std::io::{Error, ErrorKind};
        assert!(is_transient(&Error::from(ErrorKind::ConnectionAborted)));
        assert!(is_transient(&Error::from(ErrorKind::ConnectionReset)));
        assert!(!is_transient(&Error::from(ErrorKind::PermissionDenied)));
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let config = ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            ..ServerConfig::default()
        };
        let world = Arc::new(World::new(GameState::new(800.0, 600.0)));

        let server = Server::bind(&config, world).await.unwrap();
        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_invalid_address_fails() {
        let config = ServerConfig {
            bind_address: "not-an-address".to_string(),
            ..ServerConfig::default()
        };
        let world = Arc::new(World::new(GameState::new(800.0, 600.0)));

        let result = Server::bind(&config, world).await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }
}
