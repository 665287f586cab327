mod http;
mod protocol;
mod stdio;
mod tools;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, info};
use serde_json::{json, Value};

use crate::providers::gitlab::{CancelToken, GitLabApi, GitLabProvider};

pub use http::serve_http;
pub use stdio::serve_stdio;
pub use tools::{cutoff_from_years, TOOLS};

use protocol::{
    json_rpc_error, json_rpc_response, JsonRpcRequest, INVALID_PARAMS, INVALID_REQUEST,
    JSONRPC_VERSION, MCP_VERSION, METHOD_NOT_FOUND, PARSE_ERROR, SERVER_NOT_INITIALIZED,
};

pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// What the transport should do with one incoming message.
pub enum Dispatch {
    /// Send this message back immediately
    Reply(Value),
    /// Run a tool call in its own task and send its response when done
    Call(ToolCall),
    /// Nothing to send
    Ignore,
}

pub struct ToolCall {
    pub id: Option<Value>,
    pub name: String,
    pub arguments: Value,
    pub cancel: CancelToken,
}

/// MCP tool dispatcher in front of a [`GitLabProvider`].
pub struct McpServer<A> {
    provider: GitLabProvider<A>,
    name: String,
    initialized: AtomicBool,
    in_flight: Mutex<HashMap<String, CancelToken>>,
}

impl<A: GitLabApi + 'static> McpServer<A> {
    pub fn new(provider: GitLabProvider<A>, name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            provider,
            name: name.into(),
            initialized: AtomicBool::new(false),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parses one raw JSON-RPC message and decides how to answer it.
    pub fn dispatch(&self, raw: &str) -> Dispatch {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                return Dispatch::Reply(json_rpc_error(
                    None,
                    PARSE_ERROR,
                    &format!("Parse error: {e}"),
                ))
            }
        };

        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Dispatch::Reply(json_rpc_error(
                    None,
                    INVALID_REQUEST,
                    &format!("Invalid request: {e}"),
                ))
            }
        };

        if request.jsonrpc.as_deref() != Some(JSONRPC_VERSION) {
            return Dispatch::Reply(json_rpc_error(
                request.id,
                INVALID_REQUEST,
                "Invalid request: jsonrpc must be \"2.0\"",
            ));
        }

        self.handle(request)
    }

    fn handle(&self, request: JsonRpcRequest) -> Dispatch {
        debug!("<- {}", request.method);
        let method = request.method.as_str();

        match method {
            "initialize" => {
                return Dispatch::Reply(json_rpc_response(
                    request.id,
                    json!({
                        "protocolVersion": MCP_VERSION,
                        "serverInfo": { "name": self.name, "version": SERVER_VERSION },
                        "capabilities": { "tools": { "listChanged": false } }
                    }),
                ))
            }
            "notifications/initialized" | "initialized" => {
                self.initialized.store(true, Ordering::Relaxed);
                info!("Client initialized");
                return Dispatch::Ignore;
            }
            "notifications/cancelled" => {
                self.cancel_request(request.params.as_ref());
                return Dispatch::Ignore;
            }
            "ping" => return Dispatch::Reply(json_rpc_response(request.id, json!({}))),
            _ => {}
        }

        if request.is_notification() {
            return Dispatch::Ignore;
        }

        if !self.initialized.load(Ordering::Relaxed) {
            return Dispatch::Reply(json_rpc_error(
                request.id,
                SERVER_NOT_INITIALIZED,
                "Server not initialized",
            ));
        }

        match method {
            "tools/list" => Dispatch::Reply(json_rpc_response(
                request.id,
                json!({ "tools": tools::tool_definitions() }),
            )),
            "tools/call" => self.prepare_call(request),
            _ => Dispatch::Reply(json_rpc_error(
                request.id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {method}"),
            )),
        }
    }

    fn prepare_call(&self, request: JsonRpcRequest) -> Dispatch {
        let Some(params) = request.params.as_ref().and_then(Value::as_object) else {
            return Dispatch::Reply(json_rpc_error(
                request.id,
                INVALID_PARAMS,
                "params must be an object",
            ));
        };

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if !TOOLS.iter().any(|tool| tool.name == name) {
            return Dispatch::Reply(json_rpc_error(
                request.id,
                INVALID_PARAMS,
                &format!("Unknown tool: {name}"),
            ));
        }

        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
        let cancel = CancelToken::new();
        if let Some(id) = &request.id {
            self.track(id, cancel.clone());
        }

        Dispatch::Call(ToolCall {
            id: request.id,
            name,
            arguments,
            cancel,
        })
    }

    /// Runs a prepared tool call and builds its JSON-RPC response.
    pub async fn run_call(&self, call: ToolCall) -> Value {
        let result = self
            .call_tool(&call.name, &call.arguments, &call.cancel)
            .await;
        if let Some(id) = &call.id {
            self.untrack(id);
        }
        json_rpc_response(call.id, result)
    }

    fn track(&self, id: &Value, cancel: CancelToken) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.insert(id.to_string(), cancel);
        }
    }

    fn untrack(&self, id: &Value) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(&id.to_string());
        }
    }

    fn cancel_request(&self, params: Option<&Value>) {
        let Some(id) = params.and_then(|p| p.get("requestId")) else {
            return;
        };

        if let Ok(in_flight) = self.in_flight.lock() {
            if let Some(cancel) = in_flight.get(&id.to_string()) {
                info!("Cancelling request {id}");
                cancel.cancel();
            }
        }
    }
}
