//! The binding evaluator.

use alloc::collections::BTreeMap;

use hashbrown::{HashMap, HashSet, hash_map::Entry};
use serde::{Deserialize, Serialize};

use super::{EngineOptions, Error, ErrorRecord, Expression, MacroDefinition, MacroTable};
use crate::{scope::Scope, validator::Validator, values::Value};

/// An attribute of a target bound to an expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    #[serde(alias = "tagName")]
    pub target_kind: String,
    #[serde(alias = "property")]
    pub attribute: String,
    pub expression_string: String,
}

impl Binding {
    pub fn new(
        target_kind: impl Into<String>,
        attribute: impl Into<String>,
        expression_string: impl Into<String>,
    ) -> Self {
        Self {
            target_kind: target_kind.into(),
            attribute: attribute.into(),
            expression_string: expression_string.into(),
        }
    }
}

/// Outcome of a full evaluation pass, keyed by expression string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResults {
    pub results: BTreeMap<String, Value>,
    pub errors: BTreeMap<String, ErrorRecord>,
}

/// Outcome of a one-off evaluation. Exactly one side is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionResult {
    pub result: Option<Value>,
    pub error: Option<ErrorRecord>,
}

impl ExpressionResult {
    fn ok(value: Value) -> Self {
        Self {
            result: Some(value),
            error: None,
        }
    }

    fn err(error: &Error) -> Self {
        Self {
            result: None,
            error: Some(error.to_record()),
        }
    }
}

/// Evaluates every registered binding against a scope, once per distinct
/// expression string, and checks each primitive result against the
/// validator.
///
/// # Example
///
/// ```ignore
/// use tether_core::api::{BindEvaluator, Binding, EngineOptions};
///
/// let mut evaluator = BindEvaluator::new(EngineOptions::default());
/// evaluator.add_bindings([Binding::new("P", "text", "oneplusone + 2")]);
///
/// let scope = serde_json::from_str(r#"{"oneplusone": 2}"#)?;
/// let pass = evaluator.evaluate_bindings(&scope);
/// assert_eq!(pass.results["oneplusone + 2"], 4.into());
/// ```
#[derive(Debug)]
pub struct BindEvaluator {
    bindings: Vec<Binding>,
    expressions: HashMap<String, Expression>,
    macros: MacroTable,
    validator: Validator,
    options: EngineOptions,
    last_pass_evaluations: usize,
}

impl Default for BindEvaluator {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl BindEvaluator {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            bindings: Vec::new(),
            expressions: HashMap::new(),
            macros: MacroTable::default(),
            validator: Validator::new(options.allow_url_bindings),
            options,
            last_pass_evaluations: 0,
        }
    }

    /// Registers bindings, compiling each new expression string. Bindings
    /// whose expression fails to compile are dropped and reported.
    pub fn add_bindings(
        &mut self,
        bindings: impl IntoIterator<Item = Binding>,
    ) -> BTreeMap<String, ErrorRecord> {
        let mut errors = BTreeMap::new();
        for binding in bindings {
            let source = &binding.expression_string;
            if !self.expressions.contains_key(source) {
                match Expression::new(source, &self.macros, &self.options.compile) {
                    Ok(expression) => {
                        self.expressions.insert(source.clone(), expression);
                    }
                    Err(e) => {
                        tracing::debug!(expression = %source, error = %e, "binding failed to compile");
                        errors.insert(source.clone(), e.to_record());
                        continue;
                    }
                }
            }
            self.bindings.push(binding);
        }
        tracing::debug!(
            bindings = self.bindings.len(),
            expressions = self.expressions.len(),
            failed = errors.len(),
            "added bindings"
        );
        errors
    }

    /// Removes every binding using one of `expression_strings` and evicts the
    /// compiled expressions.
    pub fn remove_bindings_with_expression_strings<S: AsRef<str>>(
        &mut self,
        expression_strings: impl IntoIterator<Item = S>,
    ) {
        let doomed: HashSet<String> = expression_strings
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        self.expressions.retain(|source, _| !doomed.contains(source));
        self.bindings
            .retain(|binding| !doomed.contains(&binding.expression_string));
        tracing::debug!(
            removed = doomed.len(),
            bindings = self.bindings.len(),
            "removed bindings"
        );
    }

    /// Registers macros in order. Each macro can call the macros registered
    /// before it. Failures are reported by index and do not stop later
    /// definitions.
    pub fn add_macros(&mut self, definitions: &[MacroDefinition]) -> BTreeMap<usize, ErrorRecord> {
        let mut errors = BTreeMap::new();
        for (index, definition) in definitions.iter().enumerate() {
            match self.macros.with_macro(definition, &self.options.compile) {
                Ok(macros) => {
                    tracing::trace!(id = %definition.id, "registered macro");
                    self.macros = macros;
                }
                Err(e) => {
                    tracing::debug!(id = %definition.id, error = %e, "macro failed to compile");
                    errors.insert(index, e.to_record());
                }
            }
        }
        errors
    }

    /// Evaluates all bindings against `scope`.
    ///
    /// Each distinct expression string is evaluated once. Primitive results
    /// are then checked against every binding that uses them; a result any
    /// of its bindings rejects is replaced by an error. Array and object
    /// results are not validated.
    pub fn evaluate_bindings(&mut self, scope: &Scope) -> EvaluationResults {
        let scope = scope.with_global();
        let mut pass = EvaluationResults::default();
        let mut evaluations = 0;

        for binding in &self.bindings {
            let source = &binding.expression_string;
            if pass.results.contains_key(source) || pass.errors.contains_key(source) {
                continue;
            }
            let Some(expression) = self.expressions.get(source) else {
                continue;
            };
            evaluations += 1;
            match expression.evaluate_with_macros(&scope, &self.macros) {
                Ok(value) => {
                    pass.results.insert(source.clone(), value);
                }
                Err(e) => {
                    pass.errors
                        .insert(source.clone(), Error::Evaluation(e).to_record());
                }
            }
        }

        for binding in &self.bindings {
            let source = &binding.expression_string;
            let Some(value) = pass.results.get(source) else {
                continue;
            };
            if !value.is_primitive()
                || self
                    .validator
                    .is_result_valid(&binding.target_kind, &binding.attribute, value)
            {
                continue;
            }
            let error = Error::Validation {
                target_kind: binding.target_kind.clone(),
                attribute: binding.attribute.clone(),
                value: value.to_js_string().to_string(),
            };
            tracing::warn!(expression = %source, "{}", error);
            pass.results.remove(source);
            pass.errors.insert(source.clone(), error.to_record());
        }

        self.last_pass_evaluations = evaluations;
        tracing::debug!(
            evaluated = evaluations,
            results = pass.results.len(),
            errors = pass.errors.len(),
            "evaluated bindings"
        );
        pass
    }

    /// Evaluates one expression string, compiling and caching it on demand.
    /// No binding is registered and the result is not validated.
    pub fn evaluate_expression(&mut self, expression_string: &str, scope: &Scope) -> ExpressionResult {
        let macros = &self.macros;
        let expression = match self.expressions.entry(expression_string.to_string()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                match Expression::new(expression_string, macros, &self.options.compile) {
                    Ok(expression) => slot.insert(expression),
                    Err(e) => return ExpressionResult::err(&e),
                }
            }
        };
        match expression.evaluate_with_macros(&scope.with_global(), macros) {
            Ok(value) => ExpressionResult::ok(value),
            Err(e) => ExpressionResult::err(&Error::Evaluation(e)),
        }
    }

    /// Distinct expressions evaluated by the latest [`evaluate_bindings`](Self::evaluate_bindings) pass.
    pub fn last_pass_evaluations(&self) -> usize {
        self.last_pass_evaluations
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Number of compiled expressions held in the cache.
    pub fn expression_count(&self) -> usize {
        self.expressions.len()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }
}
