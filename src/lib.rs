pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod integration_registry;
pub mod node_registry;
pub mod queries;
pub mod storage;
pub mod stream_engine;
pub mod webhook;

pub use client::{ApiResponse, GraphQlTransport, PipefyClient, ReqwestTransport};
pub use error::{PipefyError, TransportError};
pub use stream_engine::StreamNode as Node;
