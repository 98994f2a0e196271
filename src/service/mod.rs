//! NDJSON control-plane service for the Gantry bridge.
//!
//! This module exposes a small dispatcher that translates newline-delimited
//! JSON commands into parsed management requests for the [`Bridge`]. It
//! backs the `gantry-cli` daemon mode and is intentionally conservative:
//! commands are processed sequentially, and unsupported operations return
//! structured errors.

use crate::PROTOCOL_VERSION;
use crate::bridge::{Bridge, DispatchResult, MgmtRequest, ObjectCoordinates, OperationKind};
use crate::convert::{self, FaultPolicy, SerializeLimits, SerializeOptions};
use crate::error::{AccessError, BridgeError, ExtractError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::{self, BufRead, Write};
use uuid::Uuid;

/// Service entry point: wraps a [`Bridge`] and writes responses to a writer.
pub struct Service<W: Write> {
    bridge: Bridge,
    writer: W,
    session: Uuid,
    handshake_completed: bool,
}

impl<W: Write> Service<W> {
    /// Create a new service wrapper around the provided bridge.
    pub fn new(bridge: Bridge, writer: W) -> Self {
        Self {
            bridge,
            writer,
            session: Uuid::new_v4(),
            handshake_completed: false,
        }
    }

    /// Process a connection by consuming requests from the reader and
    /// writing one response line per request.
    pub fn run<R: BufRead>(&mut self, reader: R) -> io::Result<()> {
        let span = tracing::info_span!("session", id = %self.session);
        let _guard = span.enter();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let envelope: Result<RequestEnvelope, _> = serde_json::from_str(&line);
            match envelope {
                Ok(request) => {
                    let response = self.handle_request(request);
                    self.write_response(response)?;
                }
                Err(err) => {
                    let response = ResponseEnvelope::from_error(
                        Value::Null,
                        ServiceError::Parse(err.to_string()),
                    );
                    self.write_response(response)?;
                }
            }
        }

        Ok(())
    }

    fn write_response(&mut self, envelope: ResponseEnvelope) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, &envelope)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    fn handle_request(&mut self, request: RequestEnvelope) -> ResponseEnvelope {
        match self.dispatch(&request.command, &request.params) {
            Ok(value) => ResponseEnvelope::success(request.id, value),
            Err(err) => ResponseEnvelope::from_error(request.id, err),
        }
    }

    fn dispatch(&mut self, command: &str, params: &Value) -> Result<Value, ServiceError> {
        match command {
            "handshake" => self.cmd_handshake(params),
            "version" | "read" | "write" | "exec" | "list" => self.cmd_operation(command, params),
            other => Err(ServiceError::Unsupported(other.to_string())),
        }
    }

    fn cmd_handshake(&mut self, params: &Value) -> Result<Value, ServiceError> {
        let client = params
            .get("client")
            .and_then(Value::as_str)
            .ok_or_else(|| ServiceError::invalid_param("client"))?;

        let requested = params
            .get("protocol_version")
            .and_then(Value::as_str)
            .ok_or_else(|| ServiceError::invalid_param("protocol_version"))?;

        if requested != PROTOCOL_VERSION {
            return Err(ServiceError::Protocol(format!(
                "unsupported protocol version: expected {}, got {}",
                PROTOCOL_VERSION, requested
            )));
        }

        self.handshake_completed = true;

        Ok(json!({
            "protocol_version": PROTOCOL_VERSION,
            "bridge": {
                "version": crate::VERSION,
                "client": client,
                "features": ["version", "read", "write", "exec", "list"],
            }
        }))
    }

    fn ensure_handshake(&self) -> Result<(), ServiceError> {
        if self.handshake_completed {
            Ok(())
        } else {
            Err(ServiceError::Protocol(
                "handshake required before issuing commands".into(),
            ))
        }
    }

    fn cmd_operation(&mut self, command: &str, params: &Value) -> Result<Value, ServiceError> {
        self.ensure_handshake()?;
        let request = self.parse_request(command, params)?;
        match self.bridge.dispatch(&request).map_err(ServiceError::from)? {
            DispatchResult::Value(value) => Ok(json!({ "value": value })),
            DispatchResult::NotChanged => Ok(json!({ "not_changed": true })),
        }
    }

    /// Build a management request from envelope params.
    fn parse_request(&self, command: &str, params: &Value) -> Result<MgmtRequest, ServiceError> {
        let operation = OperationKind::parse(command)
            .ok_or_else(|| ServiceError::Unsupported(command.to_string()))?;

        let object = params.get("object").and_then(Value::as_str);
        let coordinates = match operation {
            OperationKind::Version | OperationKind::List => {
                ObjectCoordinates::object(object.unwrap_or(""))
            }
            _ => {
                let object = object.ok_or_else(|| ServiceError::invalid_param("object"))?;
                let member = params
                    .get("attribute")
                    .or_else(|| params.get("operation"))
                    .and_then(Value::as_str);
                match member {
                    Some(member) => ObjectCoordinates::member(object, member),
                    None => ObjectCoordinates::object(object),
                }
            }
        };

        let path = match params.get("path").and_then(Value::as_str) {
            Some(raw) => convert::split(raw).map_err(BridgeError::from)?,
            None => Vec::new(),
        };

        let mut request = MgmtRequest::new(operation, coordinates)
            .with_path(path)
            .with_options(self.parse_options(params));

        if let Some(value) = params.get("value") {
            request = request.with_value(value.clone());
        }
        if let Some(arguments) = params.get("arguments").and_then(Value::as_array) {
            request = request.with_arguments(arguments.clone());
        }

        Ok(request)
    }

    /// Per-request serialization options: the bridge defaults, with
    /// envelope params overriding individual limits.
    fn parse_options(&self, params: &Value) -> SerializeOptions {
        let defaults = self.bridge.config().limits();
        let limit = |name: &str, default: usize| {
            params
                .get(name)
                .and_then(Value::as_u64)
                .map(|value| value as usize)
                .unwrap_or(default)
        };

        SerializeOptions {
            limits: SerializeLimits {
                max_depth: limit("max_depth", defaults.max_depth),
                max_collection_size: limit("max_collection_size", defaults.max_collection_size),
                max_objects: limit("max_objects", defaults.max_objects),
            },
            fault: if params.get("ignore_errors").and_then(Value::as_bool) == Some(true) {
                FaultPolicy::Filter
            } else {
                FaultPolicy::Propagate
            },
        }
    }
}

/// Wire envelope of one request line.
#[derive(Debug, Deserialize)]
struct RequestEnvelope {
    #[serde(default)]
    id: Value,
    command: String,
    #[serde(default)]
    params: Value,
}

/// Wire envelope of one response line.
#[derive(Debug, Serialize)]
struct ResponseEnvelope {
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorEnvelope>,
}

impl ResponseEnvelope {
    fn success(id: Value, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    fn from_error(id: Value, error: ServiceError) -> Self {
        Self {
            id,
            result: None,
            error: Some(ErrorEnvelope::from(error)),
        }
    }
}

/// Structured error payload: stable code plus human-readable message.
#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    code: &'static str,
    message: String,
}

#[derive(Debug)]
enum ServiceError {
    Parse(String),
    InvalidParams(String),
    Unsupported(String),
    Protocol(String),
    Bridge(BridgeError),
}

impl ServiceError {
    fn invalid_param(name: &str) -> Self {
        ServiceError::InvalidParams(format!("missing or invalid parameter: {}", name))
    }
}

impl From<BridgeError> for ServiceError {
    fn from(err: BridgeError) -> Self {
        ServiceError::Bridge(err)
    }
}

impl From<ServiceError> for ErrorEnvelope {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Parse(message) => ErrorEnvelope {
                code: "parse_error",
                message,
            },
            ServiceError::InvalidParams(message) => ErrorEnvelope {
                code: "invalid_params",
                message,
            },
            ServiceError::Unsupported(command) => ErrorEnvelope {
                code: "unsupported_command",
                message: format!("unsupported command: {}", command),
            },
            ServiceError::Protocol(message) => ErrorEnvelope {
                code: "protocol_error",
                message,
            },
            ServiceError::Bridge(err) => {
                let code = bridge_error_code(&err);
                ErrorEnvelope {
                    code,
                    message: err.to_string(),
                }
            }
        }
    }
}

/// Stable wire code for a bridge error class.
fn bridge_error_code(err: &BridgeError) -> &'static str {
    match err {
        BridgeError::Path(_) => "malformed_path",
        BridgeError::Extract(extract) => match extract {
            ExtractError::AttributeNotFound { .. }
            | ExtractError::IndexOutOfBounds { .. }
            | ExtractError::NotAnIndex { .. } => "attribute_not_found",
            ExtractError::NotWritable(_) => "not_writable",
            ExtractError::Filtered => "internal_error",
            ExtractError::Access(access) => access_error_code(access),
        },
        BridgeError::Conversion(_) => "type_conversion",
        BridgeError::Access(access) => access_error_code(access),
        BridgeError::Routing(_) => "routing_error",
        BridgeError::Config(_) => "config_error",
    }
}

fn access_error_code(err: &AccessError) -> &'static str {
    match err {
        AccessError::NotFound(_) => "not_found",
        AccessError::Denied(_) => "access_denied",
        AccessError::Io(_) => "io_error",
    }
}
