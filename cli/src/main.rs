mod highlighter;
mod lexer;

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::Parser;
use miette::{Diagnostic, Result};
use reedline::{
    DefaultCompleter, DefaultPrompt, DefaultPromptSegment, DescriptionMode, EditCommand, Emacs,
    IdeMenu, KeyCode, KeyModifiers, Keybindings, MenuBuilder, Reedline, ReedlineEvent,
    ReedlineMenu, Signal, default_emacs_keybindings,
};
use serde::{Deserialize, Serialize};
use tether::{
    BindEvaluator, Binding, CompileOptions, EngineOptions, Error, ErrorRecord, EvaluationResults,
    Expression, MacroDefinition, Mode, Scope, render_error,
};
use tether_core::{parser, stdlib::FUNCTIONS};
use thiserror::Error as ThisError;

use crate::highlighter::{BracketValidator, Highlighter};

/// Tether - evaluate binding expressions against a JSON scope
#[derive(Parser, Debug)]
#[command(name = "tether")]
#[command(about = "Evaluate binding expressions", long_about = None)]
struct Args {
    /// Scope as a JSON object
    #[arg(long, conflicts_with = "scope_file")]
    scope: Option<String>,

    /// Read the scope from a JSON file
    #[arg(long)]
    scope_file: Option<PathBuf>,

    /// Register macros from a JSON array of `{id, argumentNames, expressionString}`
    #[arg(long)]
    macros: Option<PathBuf>,

    /// Evaluate a `{macros, bindings}` document and print `{results, errors}`
    #[arg(long, conflicts_with = "expression")]
    document: Option<PathBuf>,

    /// Print the parsed AST (for debugging)
    #[arg(long)]
    debug_parse: bool,

    /// Maximum expression size after macro expansion
    #[arg(long)]
    max_ast_size: Option<usize>,

    /// Development mode: oversized expressions only log a warning
    #[arg(long)]
    dev: bool,

    /// Reject every URL-bearing attribute
    #[arg(long)]
    no_url_bindings: bool,

    /// Expression to evaluate (if not provided, reads from stdin)
    expression: Option<String>,
}

impl Args {
    fn engine_options(&self) -> EngineOptions {
        let defaults = CompileOptions::default();
        EngineOptions {
            compile: CompileOptions {
                max_ast_size: self.max_ast_size.unwrap_or(defaults.max_ast_size),
                mode: if self.dev {
                    Mode::Development
                } else {
                    Mode::Production
                },
                ..defaults
            },
            allow_url_bindings: !self.no_url_bindings,
        }
    }
}

#[derive(Debug, ThisError, Diagnostic)]
enum CliError {
    #[error("cannot read {path}")]
    #[diagnostic(code(tether::io))]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {what}")]
    #[diagnostic(code(tether::json), help("expected {expected}"))]
    Json {
        what: String,
        expected: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn parse_json<T: for<'de> Deserialize<'de>>(
    text: &str,
    what: impl Into<String>,
    expected: &'static str,
) -> Result<T, CliError> {
    serde_json::from_str(text).map_err(|source| CliError::Json {
        what: what.into(),
        expected,
        source,
    })
}

fn load_scope(args: &Args) -> Result<Scope, CliError> {
    match (&args.scope, &args.scope_file) {
        (Some(json), _) => parse_json(json, "--scope", "a JSON object"),
        (None, Some(path)) => parse_json(
            &read_file(path)?,
            path.display().to_string(),
            "a JSON object",
        ),
        (None, None) => Ok(Scope::new()),
    }
}

fn report_macro_errors(definitions: &[MacroDefinition], evaluator: &mut BindEvaluator) {
    for (index, error) in evaluator.add_macros(definitions) {
        eprintln!("macro #{} ({}): {}", index, definitions[index].id, error);
    }
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    macros: Vec<MacroDefinition>,
    #[serde(default)]
    bindings: Vec<Binding>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentReport {
    macro_errors: std::collections::BTreeMap<usize, ErrorRecord>,
    parse_errors: std::collections::BTreeMap<String, ErrorRecord>,
    #[serde(flatten)]
    pass: EvaluationResults,
}

fn run_document(path: &Path, evaluator: &mut BindEvaluator, scope: &Scope) -> Result<()> {
    let document: Document = parse_json(
        &read_file(path)?,
        path.display().to_string(),
        "an object with `macros` and `bindings` arrays",
    )?;

    let macro_errors = evaluator.add_macros(&document.macros);
    let parse_errors = evaluator.add_bindings(document.bindings);
    let pass = evaluator.evaluate_bindings(scope);
    tracing::debug!(
        evaluated = evaluator.last_pass_evaluations(),
        bindings = evaluator.binding_count(),
        "document evaluated"
    );

    let report = DocumentReport {
        macro_errors,
        parse_errors,
        pass,
    };
    let json = serde_json::to_string_pretty(&report).map_err(|e| miette::miette!(e))?;
    println!("{}", json);
    Ok(())
}

fn add_menu_keybindings(keybindings: &mut Keybindings) {
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );
    keybindings.add_binding(
        KeyModifiers::ALT,
        KeyCode::Enter,
        ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
    );
}

fn setup_reedline(evaluator: &BindEvaluator, scope: &Scope) -> (Reedline, DefaultPrompt) {
    let mut words: Vec<String> = FUNCTIONS.free_names().map(str::to_string).collect();
    words.extend(evaluator.macros().ids().map(str::to_string));
    words.extend(scope.iter().map(|(name, _)| name.to_string()));
    words.extend(["true", "false", "null"].map(str::to_string));

    let completer = Box::new({
        let mut completions = DefaultCompleter::with_inclusions(&['_', '$']);
        completions.insert(words);
        completions
    });

    // Use the interactive menu to select options from the completer
    let ide_menu = IdeMenu::default()
        .with_name("completion_menu")
        .with_min_completion_width(0)
        .with_max_completion_width(50)
        .with_max_completion_height(u16::MAX)
        .with_padding(0)
        .with_cursor_offset(0)
        .with_description_mode(DescriptionMode::PreferRight)
        .with_min_description_width(0)
        .with_max_description_width(50)
        .with_description_offset(1)
        .with_correct_cursor_pos(false);

    let mut keybindings = default_emacs_keybindings();
    add_menu_keybindings(&mut keybindings);

    let line_editor = Reedline::create()
        .with_highlighter(Box::new(Highlighter))
        .with_validator(Box::new(BracketValidator))
        .with_completer(completer)
        .with_menu(ReedlineMenu::EngineCompleter(Box::new(ide_menu)))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    let prompt = DefaultPrompt::new(DefaultPromptSegment::Empty, DefaultPromptSegment::Empty);

    (line_editor, prompt)
}

fn interpret_input(evaluator: &BindEvaluator, scope: &Scope, input: &str, debug_parse: bool) {
    let options = &evaluator.options().compile;

    if debug_parse {
        match parser::parse_with_max_depth(input, options.max_depth) {
            Ok(ast) => {
                println!("=== Parsed AST ===");
                println!("{:#?}", ast);
                println!();
            }
            Err(e) => {
                render_error(&Error::Parse(e));
                return;
            }
        }
    }

    let expression = match Expression::new(input, evaluator.macros(), options) {
        Ok(expression) => expression,
        Err(e) => {
            render_error(&e);
            return;
        }
    };

    match expression.evaluate(&scope.with_global()) {
        Ok(value) => println!("{}", value),
        Err(e) => render_error(&Error::Evaluation(e)),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use RUST_LOG to control log level, default to WARN if not set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let scope = load_scope(&args)?;
    let mut evaluator = BindEvaluator::new(args.engine_options());

    if let Some(path) = &args.macros {
        let definitions: Vec<MacroDefinition> = parse_json(
            &read_file(path)?,
            path.display().to_string(),
            "an array of macro definitions",
        )?;
        report_macro_errors(&definitions, &mut evaluator);
    }

    if let Some(path) = &args.document {
        return run_document(path, &mut evaluator, &scope);
    }

    // Check if we have a direct expression argument
    if let Some(expr) = &args.expression {
        interpret_input(&evaluator, &scope, expr, args.debug_parse);
        return Ok(());
    }

    // Otherwise, check if we're in interactive or pipe mode
    if atty::is(atty::Stream::Stdin) {
        let (mut line_editor, prompt) = setup_reedline(&evaluator, &scope);

        println!("Tether REPL - Type expressions to evaluate (Ctrl+D or Ctrl+C to exit)");

        loop {
            let sig = match line_editor.read_line(&prompt) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Reedline error: {e}");
                    return Ok(());
                }
            };

            match sig {
                Signal::Success(buffer) => {
                    interpret_input(&evaluator, &scope, &buffer, args.debug_parse);
                }
                Signal::CtrlD | Signal::CtrlC => {
                    println!("\nGoodbye!");
                    return Ok(());
                }
            }
        }
    } else {
        // Pipe/stdin mode
        let stdin = std::io::stdin();
        let reader = BufReader::new(stdin.lock());

        for line in reader.lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Error reading line from stdin: {}", e);
                    return Ok(());
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            interpret_input(&evaluator, &scope, &line, args.debug_parse);
        }
    }

    Ok(())
}
