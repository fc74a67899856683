//! Common test fixtures: model metadata, run results and an in-memory gateway.
use async_trait::async_trait;
use model_runner::prelude::*;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Input schema of the price model.
///
/// `address` is required and must start with `0x`, `window` defaults to 7 and
/// `tokens` needs at least one entry of the referenced `Token` definition.
#[allow(dead_code)]
pub fn price_input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "address": { "type": "string", "title": "Address", "pattern": "^0x" },
            "window": { "type": "integer", "default": 7 },
            "tokens": {
                "type": "array",
                "title": "Tokens",
                "items": { "$ref": "#/definitions/Token" },
                "minItems": 1
            }
        },
        "required": ["address"],
        "definitions": {
            "Token": {
                "type": "object",
                "properties": {
                    "symbol": { "type": "string" },
                    "weight": { "type": "number", "default": 1 }
                },
                "required": ["symbol"]
            }
        }
    })
}

/// Output schema of the price model: a series whose elements carry a price, a
/// list of volumes and a nested pool object.
#[allow(dead_code)]
pub fn price_output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "series": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "blockNumber": { "type": "integer" },
                        "sampleTimestamp": { "type": "integer" },
                        "output": { "$ref": "#/definitions/PriceOutput" }
                    }
                }
            },
            "errors": { "type": "array", "items": { "type": "string" } }
        },
        "definitions": {
            "PriceOutput": {
                "type": "object",
                "properties": {
                    "price": { "type": "number", "title": "Price" },
                    "volumes": { "type": "array", "items": { "type": "number" } },
                    "pool": {
                        "type": "object",
                        "properties": {
                            "liquidity": { "type": "integer", "description": "Pool liquidity" }
                        }
                    },
                    "symbol": { "type": "string" }
                }
            }
        }
    })
}

/// A two-sample run result matching `price_output_schema`.
#[allow(dead_code)]
pub fn price_result() -> Value {
    json!({
        "series": [
            {
                "blockNumber": 100,
                "sampleTimestamp": 1650000000,
                "output": { "price": 2, "volumes": [10, 20], "pool": { "liquidity": 5 }, "symbol": "AAA" }
            },
            {
                "blockNumber": 101,
                "sampleTimestamp": 1650086400,
                "output": { "price": "3.5", "volumes": [30], "pool": { "liquidity": null }, "symbol": "AAA" }
            }
        ],
        "errors": []
    })
}

#[allow(dead_code)]
pub fn price_model() -> ModelMetadata {
    model_from_json(json!({
        "slug": "price.series",
        "displayName": "Price Series",
        "description": "Historical token prices",
        "developer": "research",
        "input": price_input_schema(),
        "output": price_output_schema()
    }))
}

/// A model without inputs whose output has no series.
#[allow(dead_code)]
pub fn echo_model() -> ModelMetadata {
    model_from_json(json!({
        "slug": "example.echo",
        "developer": "examples",
        "input": { "type": "object", "properties": {} },
        "output": {
            "type": "object",
            "properties": { "message": { "type": "string" } }
        }
    }))
}

#[allow(dead_code)]
pub fn model_from_json(value: Value) -> ModelMetadata {
    serde_json::from_value(value).expect("fixture metadata should deserialize")
}

#[allow(dead_code)]
pub fn object_schema(value: Value) -> ObjectSchema {
    ObjectSchema::from_json(value).expect("fixture schema should convert")
}

/// A failed run as the gateway reports it, with a two-frame call trace.
#[allow(dead_code)]
pub fn sample_run_error() -> RunError {
    RunError {
        code: Some("ModelRunError".to_string()),
        message: Some("Pool not found".to_string()),
        details: Some(json!({ "address": "0x00" })),
        permanent: true,
        stack: vec![
            StackFrame {
                block_number: json!(15000000),
                chain_id: json!(1),
                slug: "price.series".to_string(),
                version: "1.0".to_string(),
                trace: None,
            },
            StackFrame {
                block_number: json!(15000000),
                chain_id: json!(1),
                slug: "pool.lookup".to_string(),
                version: "0.3".to_string(),
                trace: Some("Traceback: lookup failed".to_string()),
            },
        ],
    }
}

/// What the mock gateway does with the next run request.
#[allow(dead_code)]
pub enum Scripted {
    Respond(RunResponse),
    /// Fails with the given HTTP status.
    Fail(u16),
    /// Waits until the notify fires, then responds.
    Hold(RunResponse, Arc<Notify>),
    /// Fires the notify, then responds.
    Release(RunResponse, Arc<Notify>),
}

/// An in-memory gateway answering run requests from a script.
#[allow(dead_code)]
pub struct MockGateway {
    models: Option<Vec<ModelMetadata>>,
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RunRequest>>,
}

#[allow(dead_code)]
impl MockGateway {
    pub fn new(models: Vec<ModelMetadata>) -> Self {
        Self {
            models: Some(models),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A gateway whose model listing fails.
    pub fn unavailable() -> Self {
        Self {
            models: None,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, step: Scripted) -> Self {
        self.script.lock().unwrap().push_back(step);
        self
    }

    pub fn requests(&self) -> Vec<RunRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelGateway for MockGateway {
    async fn list_models(&self) -> std::result::Result<Vec<ModelMetadata>, GatewayError> {
        self.models.clone().ok_or(GatewayError::Status {
            url: "mock://v1/models".to_string(),
            status: 503,
        })
    }

    async fn run_model(
        &self,
        request: &RunRequest,
    ) -> std::result::Result<RunResponse, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        let step = self.script.lock().unwrap().pop_front();
        match step {
            None => Ok(RunResponse::default()),
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(status)) => Err(GatewayError::Status {
                url: "mock://v1/model/run".to_string(),
                status,
            }),
            Some(Scripted::Hold(response, gate)) => {
                gate.notified().await;
                Ok(response)
            }
            Some(Scripted::Release(response, gate)) => {
                gate.notify_one();
                Ok(response)
            }
        }
    }
}

#[allow(dead_code)]
pub fn success(output: Value) -> RunResponse {
    RunResponse {
        output,
        error: None,
    }
}

#[allow(dead_code)]
pub fn failure(error: RunError) -> RunResponse {
    RunResponse {
        output: Value::Null,
        error: Some(error),
    }
}
