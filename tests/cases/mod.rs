#![allow(dead_code)]

use tether::{BindEvaluator, EngineOptions, MacroDefinition, Scope, Value};

/// One expression evaluated through a fresh [`BindEvaluator`].
pub struct Case {
    input: &'static str,
    scope: Scope,
    macros: Vec<MacroDefinition>,
}

impl Case {
    pub fn new(input: &'static str) -> Self {
        Self {
            input,
            scope: Scope::new(),
            macros: Vec::new(),
        }
    }

    pub fn scope(mut self, json: &str) -> Self {
        self.scope = serde_json::from_str(json)
            .unwrap_or_else(|e| panic!("invalid scope for {:?}: {}", self.input, e));
        self
    }

    pub fn macros(mut self, macros: &[(&str, &[&str], &str)]) -> Self {
        self.macros = macros
            .iter()
            .map(|(id, args, body)| MacroDefinition::new(*id, args.iter().copied(), *body))
            .collect();
        self
    }

    pub fn run(&self) -> Result<Value, String> {
        let mut evaluator = BindEvaluator::new(EngineOptions::default());
        let macro_errors = evaluator.add_macros(&self.macros);
        assert!(macro_errors.is_empty(), "macro errors: {:?}", macro_errors);

        let outcome = evaluator.evaluate_expression(self.input, &self.scope);
        match (outcome.result, outcome.error) {
            (Some(value), None) => Ok(value),
            (None, Some(error)) => Err(error.message),
            other => panic!("inconsistent result for {:?}: {:?}", self.input, other),
        }
    }

    /// `Ok` holds the expected result as JSON, `Err` the expected message.
    pub fn check(&self, expected: Result<&str, &str>) {
        let expected = expected.map(|json| {
            serde_json::from_str::<Value>(json)
                .unwrap_or_else(|e| panic!("invalid expected JSON {:?}: {}", json, e))
        });
        let actual = self.run();
        pretty_assertions::assert_eq!(
            actual.as_ref().map_err(String::as_str),
            expected.as_ref().map_err(|m| *m),
            "input: {}",
            self.input
        );
    }
}

#[macro_export]
macro_rules! test_case {
    (
        $name:ident,
        $(scope: $scope:expr,)?
        $(macros: $macros:expr,)?
        input: $input:expr,
        result: $result:expr $(,)?
    ) => {
        #[test]
        fn $name() {
            #[allow(unused_mut)]
            let mut case = $crate::cases::Case::new($input);
            $(case = case.scope($scope);)?
            $(case = case.macros($macros);)?
            case.check($result);
        }
    };
}
