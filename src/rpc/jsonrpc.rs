//! JSON-RPC 2.0 envelope and API namespaces.
//!
//! Condenser methods take positional parameters; the namespaced APIs take a
//! keyed object. [`Params`] carries either so callers never pick the wire form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::blockchain::types::BlockchainError;

/// Request parameters in either calling convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    Positional(Vec<Value>),
    Keyed(Map<String, Value>),
}

impl Params {
    pub fn empty() -> Self {
        Params::Positional(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Params::Positional(v) => v.is_empty(),
            Params::Keyed(m) => m.is_empty(),
        }
    }
}

impl From<Value> for Params {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Params::Positional(items),
            Value::Object(map) => Params::Keyed(map),
            Value::Null => Params::empty(),
            other => Params::Positional(vec![other]),
        }
    }
}

impl From<Vec<Value>> for Params {
    fn from(items: Vec<Value>) -> Self {
        Params::Positional(items)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::Keyed(map)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Params,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Params) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// Error object of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// How a node answered, once the body has been read.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcReply {
    Result(Value),
    Error(RpcErrorObject),
}

impl RpcReply {
    /// Interpret a response body. `None` means it is not a JSON-RPC reply.
    pub fn from_body(body: Value) -> Option<Self> {
        let Value::Object(mut map) = body else {
            return None;
        };
        if let Some(error) = map.remove("error").filter(|e| !e.is_null()) {
            return serde_json::from_value(error).ok().map(RpcReply::Error);
        }
        map.remove("result").map(RpcReply::Result)
    }
}

impl From<RpcErrorObject> for BlockchainError {
    fn from(error: RpcErrorObject) -> Self {
        BlockchainError::NodeRejection {
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }
}

/// API namespaces exposed by Hive nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Api {
    Condenser,
    Database,
    Block,
    NetworkBroadcast,
    AccountByKey,
    AccountHistory,
    Follow,
    MarketHistory,
    Rc,
    Reputation,
    TransactionStatus,
    Bridge,
}

impl Api {
    pub const ALL: [Api; 12] = [
        Api::Condenser,
        Api::Database,
        Api::Block,
        Api::NetworkBroadcast,
        Api::AccountByKey,
        Api::AccountHistory,
        Api::Follow,
        Api::MarketHistory,
        Api::Rc,
        Api::Reputation,
        Api::TransactionStatus,
        Api::Bridge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Api::Condenser => "condenser_api",
            Api::Database => "database_api",
            Api::Block => "block_api",
            Api::NetworkBroadcast => "network_broadcast_api",
            Api::AccountByKey => "account_by_key_api",
            Api::AccountHistory => "account_history_api",
            Api::Follow => "follow_api",
            Api::MarketHistory => "market_history_api",
            Api::Rc => "rc_api",
            Api::Reputation => "reputation_api",
            Api::TransactionStatus => "transaction_status_api",
            Api::Bridge => "bridge",
        }
    }

    /// Fully qualified method name, e.g. `condenser_api.get_accounts`.
    pub fn method(&self, name: &str) -> String {
        format!("{}.{}", self.as_str(), name)
    }

    /// Parameters sent when the caller gives none.
    pub fn default_params(&self) -> Params {
        match self {
            Api::Condenser => Params::empty(),
            _ => Params::Keyed(Map::new()),
        }
    }

    /// Split `namespace.method`, if the namespace is known.
    pub fn split_method(method: &str) -> Option<(Api, &str)> {
        let (namespace, name) = method.split_once('.')?;
        let api = namespace.parse().ok()?;
        Some((api, name))
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Api {
    type Err = BlockchainError;

    /// Accepts names with or without the `_api` suffix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Api::ALL
            .iter()
            .copied()
            .find(|api| {
                let full = api.as_str();
                full == wanted || full.strip_suffix("_api") == Some(wanted)
            })
            .ok_or_else(|| BlockchainError::InvalidOperation(format!("unknown API '{}'", s)))
    }
}

/// Resolve a method string and parameters, filling in the namespace's
/// default parameters when none were given.
pub fn resolve_params(method: &str, params: Params) -> Params {
    if !params.is_empty() {
        return params;
    }
    match Api::split_method(method) {
        Some((api, _)) => api.default_params(),
        None => params,
    }
}
