//! Message envelope for running a binding evaluator out of process.
//!
//! Each request is `{method, args, index}` and is answered, in order, by
//! `{method, returnValue, index}`. Failures are reported inside
//! `returnValue` as `{error: {message, stack}}`; malformed input never
//! panics the worker.

use std::collections::BTreeMap;

use js_sys::JSON;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value as Json};
use tether_core::api::{BindEvaluator, Binding, EngineOptions, ErrorRecord, MacroDefinition};
use tether_core::scope::Scope;
use thiserror::Error;
use wasm_bindgen::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub args: Vec<Json>,
    #[serde(default)]
    pub index: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub method: String,
    pub return_value: Json,
    pub index: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Initialized {
    macro_errors: BTreeMap<usize, ErrorRecord>,
    parse_errors: BTreeMap<String, ErrorRecord>,
}

const SERIALIZE_FAILURE: &str =
    r#"{"method":"","returnValue":{"error":{"message":"Failed to serialize response"}},"index":null}"#;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Malformed request: {0}")]
    InvalidRequest(#[source] serde_json::Error),

    #[error("Unrecognized method: {0}")]
    UnknownMethod(String),

    #[error("{method}: missing argument {position}")]
    MissingArgument { method: String, position: usize },

    #[error("{method}: invalid argument {position}: {source}")]
    InvalidArgument {
        method: String,
        position: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize result: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl WorkerError {
    fn to_return_value(&self) -> Json {
        let mut error = Map::new();
        error.insert("message".into(), Json::String(self.to_string()));
        let mut envelope = Map::new();
        envelope.insert("error".into(), Json::Object(error));
        Json::Object(envelope)
    }
}

/// A binding evaluator driven by request messages.
pub struct Worker {
    options: EngineOptions,
    evaluator: BindEvaluator,
}

impl Worker {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            evaluator: BindEvaluator::new(options.clone()),
            options,
        }
    }

    pub fn evaluator(&self) -> &BindEvaluator {
        &self.evaluator
    }

    /// Handles one request. The request's method and index are echoed back.
    pub fn handle(&mut self, request: Request) -> Response {
        let return_value = match self.dispatch(&request.method, &request.args) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(method = %request.method, error = %e, "request failed");
                e.to_return_value()
            }
        };
        Response {
            method: request.method,
            return_value,
            index: request.index,
        }
    }

    /// Handles one JSON-encoded request and returns the JSON-encoded response.
    pub fn handle_json(&mut self, message: &str) -> String {
        let response = match serde_json::from_str::<Request>(message) {
            Ok(request) => self.handle(request),
            Err(e) => Response {
                method: String::new(),
                return_value: WorkerError::InvalidRequest(e).to_return_value(),
                index: None,
            },
        };
        serde_json::to_string(&response).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize response");
            SERIALIZE_FAILURE.to_string()
        })
    }

    fn dispatch(&mut self, method: &str, args: &[Json]) -> Result<Json, WorkerError> {
        match method {
            "initialize" => {
                let macros: Vec<MacroDefinition> = arg_or_default(method, args, 0)?;
                let bindings: Vec<Binding> = arg_or_default(method, args, 1)?;
                self.evaluator = BindEvaluator::new(self.options.clone());
                let macro_errors = self.evaluator.add_macros(&macros);
                let parse_errors = self.evaluator.add_bindings(bindings);
                to_json(&Initialized {
                    macro_errors,
                    parse_errors,
                })
            }
            "evaluate" | "evaluateBindings" => {
                let scope: Scope = arg_or_default(method, args, 0)?;
                to_json(&self.evaluator.evaluate_bindings(&scope))
            }
            "addMacros" => {
                let macros: Vec<MacroDefinition> = arg(method, args, 0)?;
                to_json(&self.evaluator.add_macros(&macros))
            }
            "addBindings" => {
                let bindings: Vec<Binding> = arg(method, args, 0)?;
                to_json(&self.evaluator.add_bindings(bindings))
            }
            "removeBindingsWithExpressionStrings" => {
                let expression_strings: Vec<String> = arg(method, args, 0)?;
                self.evaluator
                    .remove_bindings_with_expression_strings(&expression_strings);
                Ok(Json::Null)
            }
            "evaluateExpression" => {
                let expression_string: String = arg(method, args, 0)?;
                let scope: Scope = arg_or_default(method, args, 1)?;
                to_json(&self.evaluator.evaluate_expression(&expression_string, &scope))
            }
            other => Err(WorkerError::UnknownMethod(other.to_string())),
        }
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

fn arg<T: DeserializeOwned>(method: &str, args: &[Json], position: usize) -> Result<T, WorkerError> {
    let value = args.get(position).ok_or_else(|| WorkerError::MissingArgument {
        method: method.to_string(),
        position,
    })?;
    T::deserialize(value).map_err(|source| WorkerError::InvalidArgument {
        method: method.to_string(),
        position,
        source,
    })
}

/// Like [`arg`], with absent or null arguments taking their default.
fn arg_or_default<T: DeserializeOwned + Default>(
    method: &str,
    args: &[Json],
    position: usize,
) -> Result<T, WorkerError> {
    match args.get(position) {
        None | Some(Json::Null) => Ok(T::default()),
        Some(_) => arg(method, args, position),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Json, WorkerError> {
    serde_json::to_value(value).map_err(WorkerError::Serialize)
}

/// JavaScript entry point wrapping a [`Worker`].
#[wasm_bindgen]
pub struct BindWorker {
    worker: Worker,
}

#[wasm_bindgen]
impl BindWorker {
    #[wasm_bindgen(constructor)]
    pub fn new(allow_url_bindings: bool) -> BindWorker {
        BindWorker {
            worker: Worker::new(EngineOptions {
                allow_url_bindings,
                ..EngineOptions::default()
            }),
        }
    }

    /// Handles a `{method, args, index}` message object.
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&mut self, message: JsValue) -> Result<JsValue, JsValue> {
        let text: String = JSON::stringify(&message)?.into();
        JSON::parse(&self.worker.handle_json(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request(worker: &mut Worker, message: Json) -> Json {
        let response = worker.handle_json(&message.to_string());
        serde_json::from_str(&response).unwrap()
    }

    #[test]
    fn initialize_then_evaluate() {
        let mut worker = Worker::default();
        let init = request(
            &mut worker,
            json!({
                "method": "initialize",
                "args": [
                    [{"id": "add", "argumentNames": ["a", "b"], "expressionString": "a + b"}],
                    [
                        {"tagName": "P", "property": "text", "expressionString": "add(x, 2)"},
                        {"tagName": "A", "property": "href", "expressionString": "url"},
                        {"tagName": "P", "property": "text", "expressionString": "1 +"}
                    ]
                ],
                "index": 0
            }),
        );
        assert_eq!(init["method"], "initialize");
        assert_eq!(init["index"], 0);
        assert_eq!(init["returnValue"]["macroErrors"], json!({}));
        assert!(init["returnValue"]["parseErrors"]["1 +"]["message"].is_string());

        let pass = request(
            &mut worker,
            json!({
                "method": "evaluate",
                "args": [{"x": 2, "url": "javascript:alert(1)"}],
                "index": 1
            }),
        );
        assert_eq!(pass["index"], 1);
        assert_eq!(pass["returnValue"]["results"], json!({"add(x, 2)": 4}));
        assert_eq!(
            pass["returnValue"]["errors"]["url"]["message"],
            "\"A[href]\" is set to invalid value \"javascript:alert(1)\"."
        );
    }

    #[test]
    fn fine_grained_methods() {
        let mut worker = Worker::default();
        request(
            &mut worker,
            json!({"method": "addBindings", "args": [[
                {"targetKind": "P", "attribute": "text", "expressionString": "n * 2"}
            ]]}),
        );
        let pass = request(&mut worker, json!({"method": "evaluateBindings", "args": [{"n": 4}]}));
        assert_eq!(pass["returnValue"]["results"]["n * 2"], 8);

        request(
            &mut worker,
            json!({"method": "removeBindingsWithExpressionStrings", "args": [["n * 2"]]}),
        );
        assert_eq!(worker.evaluator().binding_count(), 0);

        let one = request(
            &mut worker,
            json!({"method": "evaluateExpression", "args": ["n + 1", {"n": 1}]}),
        );
        assert_eq!(one["returnValue"], json!({"result": 2, "error": null}));
    }

    #[test]
    fn add_macros_reports_by_index() {
        let mut worker = Worker::default();
        let response = request(
            &mut worker,
            json!({"method": "addMacros", "args": [[
                {"id": "ok", "argumentNames": [], "expressionString": "1"},
                {"id": "bad", "argumentNames": [], "expressionString": "("}
            ]]}),
        );
        let errors = response["returnValue"].as_object().unwrap();
        assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["1"]);
    }

    #[test]
    fn malformed_requests_are_answered() {
        let mut worker = Worker::default();

        let garbage: Json = serde_json::from_str(&worker.handle_json("not json")).unwrap();
        assert!(garbage["returnValue"]["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Malformed request"));

        let unknown = request(&mut worker, json!({"method": "explode", "index": 7}));
        assert_eq!(unknown["index"], 7);
        assert_eq!(
            unknown["returnValue"]["error"]["message"],
            "Unrecognized method: explode"
        );

        let missing = request(&mut worker, json!({"method": "addBindings"}));
        assert_eq!(
            missing["returnValue"]["error"]["message"],
            "addBindings: missing argument 0"
        );

        let invalid = request(&mut worker, json!({"method": "evaluate", "args": [[1, 2]]}));
        assert!(invalid["returnValue"]["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("evaluate: invalid argument 0"));
    }
}
