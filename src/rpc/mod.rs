//! JSON-RPC transport subsystem.
//!
//! # Data Flow
//! ```text
//! caller: call("condenser_api.get_accounts", params)
//!     → jsonrpc.rs (envelope, default params per API namespace)
//!     → transport.rs (retry machine + node pool)
//!     → connector.rs (HTTP POST with reqwest)
//!     → RpcReply: result | error object | transport failure
//! ```

pub mod connector;
pub mod jsonrpc;
pub mod transport;

pub use connector::{Connector, ConnectorError, HttpConnector};
pub use jsonrpc::{Api, Params, RpcErrorObject, RpcReply, RpcRequest};
pub use transport::{RpcClient, RpcTransport};
