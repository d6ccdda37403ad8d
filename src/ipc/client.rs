//! IPC client for sending requests to the daemon.

use crate::error::{FrontendError, Result};
use crate::ipc::protocol::{Request, Response};
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// How long the client waits for the daemon to answer.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(120);

/// Send a request to the daemon via Unix socket.
///
/// # Errors
/// Returns `FrontendError::IpcConnection` if the daemon is unreachable or
/// does not answer in time, `FrontendError::IpcProtocol` if the exchange is
/// not a single well-formed JSON line
pub async fn send_request(socket_path: &Path, request: &Request) -> Result<Response> {
    send_request_with_timeout(socket_path, request, RESPONSE_TIMEOUT).await
}

/// Like [`send_request`] with an explicit limit on the whole exchange.
pub async fn send_request_with_timeout(
    socket_path: &Path,
    request: &Request,
    timeout: Duration,
) -> Result<Response> {
    let mut line = request.to_json().map_err(|e| FrontendError::IpcProtocol {
        message: format!("Failed to serialize request: {}", e),
    })?;
    line.push('\n');

    let exchange = async {
        let mut stream = UnixStream::connect(socket_path).await.map_err(|e| {
            FrontendError::IpcConnection {
                message: format!(
                    "Failed to connect to daemon at {}: {}",
                    socket_path.display(),
                    e
                ),
            }
        })?;
        stream
            .write_all(line.as_bytes())
            .await
            .map_err(|e| connection_error("write request", e))?;

        let mut reply = String::new();
        let read = BufReader::new(stream)
            .read_line(&mut reply)
            .await
            .map_err(|e| connection_error("read response", e))?;
        Ok::<_, FrontendError>((read, reply))
    };

    let (read, reply) = tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| FrontendError::IpcConnection {
            message: format!("Daemon did not answer within {:?}", timeout),
        })??;

    if read == 0 {
        return Err(FrontendError::IpcProtocol {
            message: "Daemon closed the connection without a response".to_string(),
        });
    }
    tracing::trace!(bytes = read, "response received");

    Response::from_json(reply.trim()).map_err(|e| FrontendError::IpcProtocol {
        message: format!("Failed to deserialize response: {}", e),
    })
}

fn connection_error(action: &str, error: std::io::Error) -> FrontendError {
    FrontendError::IpcConnection {
        message: format!("Failed to {}: {}", action, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::protocol::Status;
    use crate::ipc::server::{IpcServer, RequestHandler};
    use tempfile::TempDir;

    // Mock handler for testing
    struct MockHandler;

    #[async_trait::async_trait]
    impl RequestHandler for MockHandler {
        async fn handle(&self, request: Request) -> Response {
            match request {
                Request::GetVersion => Response::Version { version: 1 },
                Request::Normalize { content, .. } => Response::Normalize {
                    tokens: Vec::new(),
                    processed_content: vec![content],
                },
                _ => Response::not_implemented(),
            }
        }
    }

    async fn start_server(socket_path: &Path) {
        let server_socket_path = socket_path.to_path_buf();
        tokio::spawn(async move {
            let server = IpcServer::new(server_socket_path, 2).unwrap();
            server.start(MockHandler).await
        });
        // Give server time to start
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_send_request_version() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");
        start_server(&socket_path).await;

        let response = send_request(&socket_path, &Request::GetVersion).await.unwrap();
        assert_eq!(response, Response::Version { version: 1 });
    }

    #[tokio::test]
    async fn test_send_request_normalize() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");
        start_server(&socket_path).await;

        let request = Request::Normalize {
            content: "Það voru 55 km eftir.".to_string(),
            domain: None,
            parse_html: false,
            no_tag_tokens_in_content: false,
        };
        let response = send_request(&socket_path, &request).await.unwrap();
        match response {
            Response::Normalize {
                processed_content, ..
            } => assert_eq!(processed_content, vec!["Það voru 55 km eftir.".to_string()]),
            other => panic!("Expected Normalize response, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_request_not_implemented() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");
        start_server(&socket_path).await;

        let response = send_request(&socket_path, &Request::GetDefaultParameters)
            .await
            .unwrap();
        assert!(matches!(
            response,
            Response::Error {
                status: Status::NotImplemented,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_send_request_connection_failed() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("nonexistent.sock");

        let result = send_request(&socket_path, &Request::GetVersion).await;

        match result {
            Err(FrontendError::IpcConnection { message }) => {
                assert!(message.contains("Failed to connect to daemon"));
            }
            other => panic!("Expected IpcConnection error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_closed_without_response() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("closing.sock");
        let listener = tokio::net::UnixListener::bind(&socket_path).unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let result = send_request(&socket_path, &Request::GetVersion).await;
        match result {
            Err(FrontendError::IpcProtocol { message }) => {
                assert!(message.contains("without a response"), "got: {}", message);
            }
            other => panic!("Expected IpcProtocol error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_silent_daemon_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("silent.sock");
        let listener = tokio::net::UnixListener::bind(&socket_path).unwrap();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let result = send_request_with_timeout(
            &socket_path,
            &Request::GetVersion,
            Duration::from_millis(100),
        )
        .await;
        match result {
            Err(FrontendError::IpcConnection { message }) => {
                assert!(message.contains("did not answer"), "got: {}", message);
            }
            other => panic!("Expected IpcConnection error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_sequential_requests() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");
        start_server(&socket_path).await;

        for _ in 0..3 {
            let response = send_request(&socket_path, &Request::GetVersion).await.unwrap();
            assert_eq!(response, Response::Version { version: 1 });
        }
    }
}
