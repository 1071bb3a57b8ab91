//! REPL (Read-Eval-Print Loop) implementation
//!
//! A line is either a dot command or a function call: the function name
//! followed by its arguments, with quotes around vectors and strings.

use std::fs;

use builtins::Console;
use core_types::Vec3;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::cli::ReturnKind;
use crate::error::{CliError, CliResult};
use crate::runtime::Runtime;

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Call a function
    Call {
        /// Function name
        function: String,
        /// Unparsed arguments
        args: Vec<String>,
    },
    /// Show a global
    Global(String),
    /// Assign a float or vector global
    Set(String, String),
    /// Disassemble a function, or the whole program
    Disasm(Option<String>),
    /// Print the busiest functions
    Profile(usize),
    /// Toggle statement tracing
    Trace(bool),
    /// Describe an entity
    Edict(i32),
    /// Print persistent globals, or write them to a file
    Save(Option<String>),
    /// Restore persistent globals from a file
    Restore(String),
    /// Reinitialize globals, strings and entities
    Reset,
    /// List commands
    Help,
    /// Leave the REPL
    Exit,
}

/// Split a line into words; single or double quotes group words
pub fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_word = false;
    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Parse one input line; `None` for a blank line
pub fn parse_command(line: &str) -> Result<Option<ReplCommand>, String> {
    let words = tokenize(line)?;
    let Some((head, rest)) = words.split_first() else {
        return Ok(None);
    };
    let arg = |i: usize| rest.get(i).cloned();
    let need = |i: usize, what: &str| arg(i).ok_or_else(|| format!("{} needs {}", head, what));

    let command = match head.as_str() {
        "exit" | "quit" | ".exit" => ReplCommand::Exit,
        ".help" => ReplCommand::Help,
        ".global" => ReplCommand::Global(need(0, "a name")?),
        ".set" => ReplCommand::Set(need(0, "a name")?, need(1, "a value")?),
        ".disasm" => ReplCommand::Disasm(arg(0)),
        ".profile" => ReplCommand::Profile(match arg(0) {
            Some(n) => n.parse().map_err(|_| format!("bad count `{}`", n))?,
            None => 10,
        }),
        ".trace" => match need(0, "on or off")?.as_str() {
            "on" => ReplCommand::Trace(true),
            "off" => ReplCommand::Trace(false),
            other => return Err(format!("expected on or off, got `{}`", other)),
        },
        ".edict" => {
            let n = need(0, "an entity number")?;
            ReplCommand::Edict(n.parse().map_err(|_| format!("bad entity `{}`", n))?)
        }
        ".save" => ReplCommand::Save(arg(0)),
        ".restore" => ReplCommand::Restore(need(0, "a file")?),
        ".reset" => ReplCommand::Reset,
        other if other.starts_with('.') => return Err(format!("unknown command `{}`", other)),
        function => ReplCommand::Call {
            function: function.to_string(),
            args: rest.to_vec(),
        },
    };
    Ok(Some(command))
}

const HELP: &str = "\
REPL Commands:
  <function> [args]     - Call a function and print its float result
  .global <name>        - Show a global
  .set <name> <value>   - Assign a float or 'x y z' vector global
  .disasm [function]    - Disassemble
  .profile [n]          - Show the n busiest functions
  .trace on|off         - Toggle statement tracing
  .edict <n>            - Show an entity's fields
  .save [file]          - Print or write persistent globals
  .restore <file>       - Restore persistent globals
  .reset                - Reinitialize program state
  .help                 - Show this help message
  .exit                 - Exit the REPL";

/// Execute one command, returning the text to print
pub fn execute<C: Console>(runtime: &mut Runtime<C>, command: ReplCommand) -> CliResult<String> {
    Ok(match command {
        ReplCommand::Call { function, args } => {
            let ret = runtime.call(&function, &args)?;
            runtime
                .format_return(ret, ReturnKind::Float)
                .unwrap_or_default()
        }
        ReplCommand::Global(name) => runtime.global(&name)?,
        ReplCommand::Set(name, value) => {
            let parts: Vec<f32> = value
                .split_whitespace()
                .map(|p| p.parse::<f32>())
                .collect::<Result<_, _>>()
                .map_err(|_| CliError::Argument(format!("bad value `{}`", value)))?;
            let vm = runtime.vm_mut();
            match parts.as_slice() {
                [f] => vm.set_global_f32(&name, *f)?,
                [x, y, z] => vm.set_global_vector(&name, Vec3::new(*x, *y, *z))?,
                _ => return Err(CliError::Argument(format!("bad value `{}`", value))),
            }
            runtime.global(&name)?
        }
        ReplCommand::Disasm(function) => runtime.disassemble(function.as_deref())?,
        ReplCommand::Profile(limit) => runtime.profile_table(limit),
        ReplCommand::Trace(on) => {
            runtime.vm_mut().set_trace(on);
            format!("trace {}", if on { "on" } else { "off" })
        }
        ReplCommand::Edict(ent) => builtins::entity::describe_entity(runtime.vm(), ent)?,
        ReplCommand::Save(None) => runtime.save_globals()?,
        ReplCommand::Save(Some(path)) => {
            fs::write(&path, runtime.save_globals()?)?;
            format!("saved to {}", path)
        }
        ReplCommand::Restore(path) => {
            let text = fs::read_to_string(&path)?;
            runtime.load_globals(&text)?;
            format!("restored from {}", path)
        }
        ReplCommand::Reset => {
            runtime.vm_mut().reset();
            "reset".to_string()
        }
        ReplCommand::Help => HELP.to_string(),
        ReplCommand::Exit => String::new(),
    })
}

/// Run the interactive REPL
///
/// Returns `Ok(())` when the user exits; errors from individual commands are
/// printed and the session continues.
pub fn run_repl<C: Console>(runtime: &mut Runtime<C>) -> CliResult<()> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| CliError::Repl(format!("failed to initialize editor: {}", e)))?;

    println!("progs {}", env!("CARGO_PKG_VERSION"));
    println!("Type a function name to call it, .help for commands.");

    loop {
        match editor.readline("progs> ") {
            Ok(line) => {
                let command = match parse_command(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        continue;
                    }
                };
                let _ = editor.add_history_entry(line.as_str());
                if command == ReplCommand::Exit {
                    break;
                }
                match execute(runtime, command) {
                    Ok(text) if text.is_empty() => {}
                    Ok(text) => println!("{}", text.trim_end()),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Press Ctrl-D or type 'exit' to quit");
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
