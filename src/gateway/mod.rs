//! The model gateway: listing models and running them.

use crate::data::ModelMetadata;
use crate::error::GatewayError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

mod http;

pub use http::HttpGateway;

/// The remote service hosting the models.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// `GET /v1/models`
    async fn list_models(&self) -> Result<Vec<ModelMetadata>, GatewayError>;

    /// `POST /v1/model/run`
    async fn run_model(&self, request: &RunRequest) -> Result<RunResponse, GatewayError>;
}

/// The block a model runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockNumber {
    #[default]
    Latest,
    Number(u64),
}

impl Serialize for BlockNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BlockNumber::Latest => serializer.serialize_str("latest"),
            BlockNumber::Number(n) => serializer.serialize_u64(*n),
        }
    }
}

impl FromStr for BlockNumber {
    type Err = std::num::ParseIntError;

    /// Blank text and `latest` both mean the latest block.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "latest" => Ok(BlockNumber::Latest),
            n => n.parse().map(BlockNumber::Number),
        }
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockNumber::Latest => write!(f, "latest"),
            BlockNumber::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Body of a run request.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub slug: String,
    pub chain_id: u64,
    pub block_number: BlockNumber,
    /// Omitted to run the latest version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub input: Value,
}

/// Body of a run response. A present `error` takes precedence over `output`.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RunResponse {
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub error: Option<RunError>,
}

/// A structured model failure reported by the gateway.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub permanent: bool,
    #[serde(default)]
    pub stack: Vec<StackFrame>,
}

/// One model invocation in the call chain that failed.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    #[serde(default)]
    pub block_number: Value,
    #[serde(default)]
    pub chain_id: Value,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub trace: Option<String>,
}
