//! JSON-RPC request bindings

use serde::{Deserialize, Serialize};
use std::fmt;

/// The version of the JSON-RPC protocol, always "2.0"
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Version {
    V2,
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Version::V2 => serializer.serialize_str("2.0"),
        }
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == "2.0" {
            Ok(Version::V2)
        } else {
            Err(serde::de::Error::custom(format!("invalid jsonrpc version: {s}")))
        }
    }
}

/// The identifier of an rpc call, unique among all calls in flight
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    String(String),
    Number(u64),
    Null,
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => s.fmt(f),
            Id::Number(n) => n.fmt(f),
            Id::Null => f.write_str("null"),
        }
    }
}

impl From<u64> for Id {
    fn from(num: u64) -> Self {
        Id::Number(num)
    }
}

/// Parameters of an rpc call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestParams {
    /// no parameters provided
    None,
    /// An array of JSON values
    Array(Vec<serde_json::Value>),
    /// a map of JSON values
    Object(serde_json::Map<String, serde_json::Value>),
}

impl From<RequestParams> for serde_json::Value {
    fn from(params: RequestParams) -> Self {
        match params {
            RequestParams::None => serde_json::Value::Null,
            RequestParams::Array(arr) => arr.into(),
            RequestParams::Object(obj) => obj.into(),
        }
    }
}

impl From<serde_json::Value> for RequestParams {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RequestParams::None,
            serde_json::Value::Array(arr) => RequestParams::Array(arr),
            serde_json::Value::Object(obj) => RequestParams::Object(obj),
            // params must be a structured value
            other => RequestParams::Array(vec![other]),
        }
    }
}

/// A complete method call with correlation id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcMethodCall {
    /// jsonrpc version
    pub jsonrpc: Version,
    /// the name of the method to be invoked
    pub method: String,
    /// parameter values to be used during the invocation of the method
    #[serde(default = "no_params")]
    pub params: RequestParams,
    /// identifier established by the caller
    pub id: Id,
}

impl RpcMethodCall {
    pub fn new(id: impl Into<Id>, method: impl Into<String>, params: RequestParams) -> Self {
        Self { jsonrpc: Version::V2, method: method.into(), params, id: id.into() }
    }

    pub fn id(&self) -> Id {
        self.id.clone()
    }
}

/// An id-less message, used for wallet initiated events like `omni_ready` and
/// `omni_event` which are never answered
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcNotification {
    pub jsonrpc: Version,
    pub method: String,
    #[serde(default = "no_params")]
    pub params: RequestParams,
}

impl RpcNotification {
    pub fn new(method: impl Into<String>, params: RequestParams) -> Self {
        Self { jsonrpc: Version::V2, method: method.into(), params }
    }
}

fn no_params() -> RequestParams {
    RequestParams::None
}

/// Representation of a single incoming message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcCall {
    /// regular method call expecting a response
    MethodCall(RpcMethodCall),
    /// fire and forget notification
    Notification(RpcNotification),
    /// any other payload that at least carried an id, answered with an
    /// `InvalidRequest` error that echoes that id
    Invalid {
        #[serde(default = "null_id")]
        id: Id,
    },
}

fn null_id() -> Id {
    Id::Null
}
