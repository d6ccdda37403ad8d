//! Async Unix socket server for pipeline requests.

use crate::defaults;
use crate::error::{FrontendError, Result};
use crate::ipc::protocol::{Request, Response, Status};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex, Semaphore};

/// Handler trait for processing requests.
#[async_trait::async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handle a request and return a response.
    async fn handle(&self, request: Request) -> Response;
}

/// State for managing server shutdown.
#[derive(Debug, Clone)]
struct ServerState {
    shutdown: Arc<Mutex<bool>>,
}

impl ServerState {
    fn new() -> Self {
        Self {
            shutdown: Arc::new(Mutex::new(false)),
        }
    }

    async fn is_shutdown(&self) -> bool {
        *self.shutdown.lock().await
    }

    async fn set_shutdown(&self) {
        *self.shutdown.lock().await = true;
    }
}

/// Request server on a Unix socket.
///
/// At most `max_workers` connections are served at the same time. The accept
/// loop waits for a free worker before spawning, and a client that sends no
/// request line within the read timeout is dropped.
pub struct IpcServer {
    socket_path: PathBuf,
    workers: Arc<Semaphore>,
    max_workers: usize,
    read_timeout: Duration,
    state: ServerState,
}

impl IpcServer {
    /// Create a new server for the specified socket path.
    pub fn new(socket_path: PathBuf, max_workers: usize) -> Result<Self> {
        if max_workers == 0 {
            return Err(FrontendError::ConfigInvalidValue {
                key: "server.max_workers".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            socket_path,
            workers: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            read_timeout: Duration::from_millis(defaults::REQUEST_READ_TIMEOUT_MS),
            state: ServerState::new(),
        })
    }

    /// Set how long a client may take to send its request line.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Get the socket path this server is using.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Get the default socket path based on XDG_RUNTIME_DIR or fallback.
    pub fn default_socket_path() -> PathBuf {
        if let Ok(xdg_runtime) = std::env::var("XDG_RUNTIME_DIR") {
            PathBuf::from(xdg_runtime).join(defaults::SOCKET_NAME)
        } else {
            let uid = unsafe { libc::getuid() };
            PathBuf::from(format!("/tmp/{}-{}.sock", defaults::APP_DIR, uid))
        }
    }

    /// Start the server and handle incoming connections.
    pub async fn start<H>(&self, handler: H) -> Result<()>
    where
        H: RequestHandler + 'static,
    {
        // Clean up any existing socket file
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| FrontendError::IpcSocket {
                message: format!("Failed to remove existing socket: {}", e),
            })?;
        }

        let listener =
            UnixListener::bind(&self.socket_path).map_err(|e| FrontendError::IpcSocket {
                message: format!("Failed to bind to socket: {}", e),
            })?;
        tracing::info!(
            socket = %self.socket_path.display(),
            max_workers = self.max_workers,
            "listening"
        );

        let handler = Arc::new(handler);

        loop {
            if self.state.is_shutdown().await {
                break;
            }

            // Accept connection with timeout to check for shutdown
            let accept_result =
                tokio::time::timeout(tokio::time::Duration::from_millis(100), listener.accept())
                    .await;

            match accept_result {
                Ok(Ok((stream, _))) => {
                    // Backpressure: no task is spawned until a worker is free.
                    let Ok(permit) = Arc::clone(&self.workers).acquire_owned().await else {
                        tracing::debug!("worker pool closed, stopping accept loop");
                        break;
                    };
                    let handler = Arc::clone(&handler);
                    let read_timeout = self.read_timeout;
                    tokio::spawn(async move {
                        let _permit = permit;
                        if let Err(e) = handle_client(stream, handler, read_timeout).await {
                            tracing::warn!(error = %e, "error handling client");
                        }
                    });
                }
                Ok(Err(e)) => {
                    return Err(FrontendError::IpcConnection {
                        message: format!("Failed to accept connection: {}", e),
                    });
                }
                Err(_) => {
                    // Timeout - check shutdown flag again
                    continue;
                }
            }
        }

        Ok(())
    }

    /// Stop the server and clean up the socket file.
    pub async fn stop(&self) -> Result<()> {
        self.state.set_shutdown().await;
        self.workers.close();

        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| FrontendError::IpcSocket {
                message: format!("Failed to remove socket file: {}", e),
            })?;
        }

        Ok(())
    }
}

/// Handle a single client connection: one request line, one response line.
async fn handle_client<H>(
    stream: UnixStream,
    handler: Arc<H>,
    read_timeout: Duration,
) -> Result<()>
where
    H: RequestHandler,
{
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    tokio::time::timeout(read_timeout, reader.read_line(&mut line))
        .await
        .map_err(|_| FrontendError::IpcConnection {
            message: format!("No request received within {:?}", read_timeout),
        })?
        .map_err(|e| FrontendError::IpcConnection {
            message: format!("Failed to read from client: {}", e),
        })?;

    let response = match Request::from_json(line.trim()) {
        Ok(request) => handler.handle(request).await,
        Err(e) => {
            tracing::debug!(error = %e, "malformed request");
            Response::Error {
                status: Status::InvalidArgument,
                message: format!("Failed to parse request: {}", e),
            }
        }
    };

    let response_json = response.to_json().map_err(|e| FrontendError::IpcProtocol {
        message: format!("Failed to serialize response: {}", e),
    })?;

    writer
        .write_all(response_json.as_bytes())
        .await
        .map_err(|e| FrontendError::IpcConnection {
            message: format!("Failed to write to client: {}", e),
        })?;

    writer
        .write_all(b"\n")
        .await
        .map_err(|e| FrontendError::IpcConnection {
            message: format!("Failed to write newline to client: {}", e),
        })?;

    writer
        .flush()
        .await
        .map_err(|e| FrontendError::IpcConnection {
            message: format!("Failed to flush writer: {}", e),
        })?;

    Ok(())
}
