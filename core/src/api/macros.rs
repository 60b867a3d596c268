//! Macros: named, parameterized expressions callable like free functions.

use alloc::rc::Rc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    api::{CompileOptions, Error, Expression},
    evaluator::EvalError,
    scope::ScopeStack,
    values::Value,
};

/// A macro as supplied by the host document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroDefinition {
    pub id: String,
    #[serde(default)]
    pub argument_names: Vec<String>,
    pub expression_string: String,
}

impl MacroDefinition {
    pub fn new<S: Into<String>>(
        id: impl Into<String>,
        argument_names: impl IntoIterator<Item = S>,
        expression_string: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            argument_names: argument_names.into_iter().map(Into::into).collect(),
            expression_string: expression_string.into(),
        }
    }
}

/// A compiled macro.
#[derive(Debug)]
pub struct Macro {
    id: String,
    argument_names: Vec<String>,
    expression: Expression,
}

impl Macro {
    /// Compiles `definition`. Its body can only call macros in `referable`.
    pub fn new(
        definition: &MacroDefinition,
        referable: &MacroTable,
        options: &CompileOptions,
    ) -> Result<Self, Error> {
        let expression = Expression::new(&definition.expression_string, referable, options)?;
        Ok(Self {
            id: definition.id.clone(),
            argument_names: definition.argument_names.clone(),
            expression,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn argument_names(&self) -> &[String] {
        &self.argument_names
    }

    /// Size of the body, charged to every expression that invokes the macro.
    pub fn expression_size(&self) -> usize {
        self.expression.size()
    }

    /// Binds `argument_names[i]` to `args[i]` on top of `scope` and evaluates
    /// the body. Missing arguments are null.
    pub fn evaluate(&self, scope: &ScopeStack, args: &[Value]) -> Result<Value, EvalError> {
        let names = self.argument_names.iter().map(String::as_str);
        self.expression.evaluate_in(&scope.with_bindings(names, args))
    }
}

/// An immutable snapshot of registered macros.
///
/// Adding a macro yields a new table and leaves existing snapshots, and the
/// expressions holding them, untouched.
#[derive(Debug, Clone, Default)]
pub struct MacroTable(Rc<HashMap<String, Rc<Macro>>>);

impl MacroTable {
    pub fn get(&self, id: &str) -> Option<&Rc<Macro>> {
        self.0.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Compiles `definition` against this table and returns a table that
    /// also contains it.
    pub fn with_macro(
        &self,
        definition: &MacroDefinition,
        options: &CompileOptions,
    ) -> Result<MacroTable, Error> {
        let compiled = Macro::new(definition, self, options)?;
        let mut map = HashMap::clone(&self.0);
        map.insert(definition.id.clone(), Rc::new(compiled));
        Ok(MacroTable(Rc::new(map)))
    }
}
