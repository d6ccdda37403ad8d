//! Newline-delimited JSON over a Unix socket.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{send_request, send_request_with_timeout};
pub use protocol::{Request, Response, Status};
pub use server::{IpcServer, RequestHandler};
