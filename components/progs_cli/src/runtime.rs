//! Runtime orchestration for the CLI
//!
//! A [`Runtime`] owns one loaded program and its VM, with the standard
//! builtins installed, and implements everything the subcommands and the
//! REPL do with it.

use std::fmt;
use std::fs;
use std::path::Path;

use builtins::{Console, StdoutConsole};
use bytecode_system::{disassemble_function, format_statement, FunctionKind, LoadOptions, Program};
use core_types::{EType, ReturnValue, Value, Vec3};
use interpreter::{GlobalSnapshot, Vm, VmConfig};
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::{ReturnKind, RunArgs};
use crate::error::{CliError, CliResult};

/// Read a JSON config file, defaults when `path` is `None`
pub fn load_config(path: Option<&Path>) -> CliResult<VmConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            let config = serde_json::from_str(&text)?;
            debug!(path = %path.display(), "config loaded");
            Ok(config)
        }
        None => Ok(VmConfig::default()),
    }
}

/// Apply `run` flag overrides on top of a config
pub fn apply_overrides(mut config: VmConfig, args: &RunArgs) -> VmConfig {
    if let Some(depth) = args.max_depth {
        config = config.with_max_depth(depth);
    }
    if let Some(limit) = args.runaway_limit {
        config = config.with_runaway_limit(limit);
    }
    if args.protect_world {
        config = config.with_protect_world(true);
    }
    config
}

/// Summary of a loaded image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramInfo {
    /// Format version
    pub version: i32,
    /// Header checksum
    pub crc: i32,
    /// Statement count
    pub statements: usize,
    /// Global slots
    pub globals: usize,
    /// Global definitions
    pub global_defs: usize,
    /// Field definitions
    pub field_defs: usize,
    /// Slots per entity
    pub entity_fields: usize,
    /// Bytecode functions, the null function excluded
    pub functions: usize,
    /// Builtins the program declares that the host implements
    pub builtins: Vec<String>,
    /// Builtins the program declares that nothing implements
    pub unresolved: Vec<String>,
}

impl fmt::Display for ProgramInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "version        {}", self.version)?;
        writeln!(f, "crc            {}", self.crc)?;
        writeln!(f, "statements     {}", self.statements)?;
        writeln!(f, "globals        {}", self.globals)?;
        writeln!(f, "global defs    {}", self.global_defs)?;
        writeln!(f, "field defs     {}", self.field_defs)?;
        writeln!(f, "entity fields  {}", self.entity_fields)?;
        writeln!(f, "functions      {}", self.functions)?;
        writeln!(f, "builtins       {}", self.builtins.join(" "))?;
        if !self.unresolved.is_empty() {
            writeln!(f, "unresolved     {}", self.unresolved.join(" "))?;
        }
        Ok(())
    }
}

/// A loaded program ready to run
pub struct Runtime<C: Console = StdoutConsole> {
    vm: Vm<C>,
}

impl Runtime<StdoutConsole> {
    /// Load an image file, printing to stdout
    pub fn load_file(path: &Path, options: &LoadOptions, config: VmConfig) -> CliResult<Self> {
        let bytes = fs::read(path)?;
        info!(path = %path.display(), bytes = bytes.len(), "reading image");
        Self::from_bytes(&bytes, options, config, StdoutConsole)
    }
}

impl<C: Console> Runtime<C> {
    /// Load an image from memory with the given console
    pub fn from_bytes(
        bytes: &[u8],
        options: &LoadOptions,
        config: VmConfig,
        console: C,
    ) -> CliResult<Self> {
        let program = Program::load(bytes, options)?;
        let mut vm = Vm::new(program, config, console);
        let installed = builtins::install(&mut vm);
        debug!(count = installed.len(), "builtins installed");
        Ok(Self { vm })
    }

    /// The VM
    pub fn vm(&self) -> &Vm<C> {
        &self.vm
    }

    /// The VM, mutably
    pub fn vm_mut(&mut self) -> &mut Vm<C> {
        &mut self.vm
    }

    /// Summary of the loaded image
    pub fn info(&self) -> ProgramInfo {
        let program = self.vm.program();
        let mut builtins = Vec::new();
        let mut unresolved = Vec::new();
        let mut functions = 0;
        for (index, func) in program.functions.iter().enumerate().skip(1) {
            match func.kind() {
                FunctionKind::Bytecode(_) => functions += 1,
                FunctionKind::Builtin(number) => {
                    let name = format!("{}#{}", program.function_name(index), number);
                    if self.vm.builtins().get(number).is_some() {
                        builtins.push(name);
                    } else {
                        unresolved.push(name);
                    }
                }
            }
        }
        ProgramInfo {
            version: program.header.version,
            crc: program.header.crc,
            statements: program.statements.len(),
            globals: program.globals.len(),
            global_defs: program.globaldefs.len(),
            field_defs: program.fielddefs.len(),
            entity_fields: program.entity_fields,
            functions,
            builtins,
            unresolved,
        }
    }

    /// Listing of one function, or of every statement when `function` is `None`
    pub fn disassemble(&self, function: Option<&str>) -> CliResult<String> {
        let program = self.vm.program();
        match function {
            Some(name) => {
                let index = program
                    .find_function(name)
                    .ok_or_else(|| CliError::Argument(format!("no function `{}`", name)))?;
                disassemble_function(program, index)
                    .ok_or_else(|| CliError::Argument(format!("no function `{}`", name)))
            }
            None => {
                let mut out = String::new();
                for (index, st) in program.statements.iter().enumerate() {
                    out.push_str(&format_statement(program, index, st));
                    out.push('\n');
                }
                Ok(out)
            }
        }
    }

    /// Turn a command line argument into a call argument
    ///
    /// A number is a float, three numbers separated by spaces are a vector,
    /// and anything else is a string made persistent for the call.
    pub fn parse_arg(&mut self, text: &str) -> Value {
        if let Ok(f) = text.trim().parse::<f32>() {
            return Value::Float(f);
        }
        let parts: Vec<f32> = text
            .split_whitespace()
            .filter_map(|p| p.parse().ok())
            .collect();
        if parts.len() == 3 && text.split_whitespace().count() == 3 {
            return Value::Vector(Vec3::new(parts[0], parts[1], parts[2]));
        }
        Value::String(self.vm.strings_mut().intern(text))
    }

    /// Call a function by name
    pub fn call(&mut self, function: &str, args: &[String]) -> CliResult<ReturnValue> {
        let values: Vec<Value> = args.iter().map(|a| self.parse_arg(a)).collect();
        Ok(self.vm.call_by_name(function, &values)?)
    }

    /// Render a function result
    pub fn format_return(&self, ret: ReturnValue, kind: ReturnKind) -> Option<String> {
        match kind {
            ReturnKind::Float => Some(ret.as_f32().to_string()),
            ReturnKind::Vector => Some(ret.as_vector().to_string()),
            ReturnKind::String => Some(
                self.vm
                    .strings()
                    .get_lossy(ret.as_i32())
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|e| format!("<{}>", e)),
            ),
            ReturnKind::Entity => Some(format!("entity {}", ret.as_i32())),
            ReturnKind::Int => Some(ret.as_i32().to_string()),
            ReturnKind::Void => None,
        }
    }

    /// Current value of a named global, rendered by its declared type
    pub fn global(&self, name: &str) -> CliResult<String> {
        let def = *self
            .vm
            .find_global(name)
            .ok_or_else(|| CliError::Argument(format!("no global `{}`", name)))?;
        let ofs = def.ofs as usize;
        let globals = self.vm.globals();
        Ok(match def.etype() {
            Some(EType::Float) => globals.get_f32(ofs)?.to_string(),
            Some(EType::Vector) => globals.get_vector(ofs)?.to_string(),
            Some(EType::String) => {
                let handle = globals.get_i32(ofs)?;
                format!("{:?}", self.vm.strings().get_lossy(handle)?)
            }
            Some(EType::Entity) => format!("entity {}", globals.get_i32(ofs)?),
            Some(EType::Function) => {
                let index = globals.get_i32(ofs)?;
                format!("{}()", self.vm.program().function_name(index.max(0) as usize))
            }
            _ => globals.get_i32(ofs)?.to_string(),
        })
    }

    /// Persistent globals as pretty JSON
    pub fn save_globals(&self) -> CliResult<String> {
        let snapshot = self.vm.export_globals()?;
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Restore persistent globals from JSON
    pub fn load_globals(&mut self, json: &str) -> CliResult<()> {
        let snapshot: GlobalSnapshot = serde_json::from_str(json)?;
        self.vm.import_globals(&snapshot)?;
        Ok(())
    }

    /// Profile table of the `limit` busiest functions
    pub fn profile_table(&self, limit: usize) -> String {
        let mut out = format!("{:>10} {:>8}  function\n", "statements", "calls");
        for entry in self.vm.profile_report(limit) {
            out.push_str(&format!(
                "{:>10} {:>8}  {}\n",
                entry.profile.statements, entry.profile.calls, entry.name
            ));
        }
        out
    }

    /// `progs run`: restore, call, print, save
    pub fn run(&mut self, args: &RunArgs) -> CliResult<Option<String>> {
        if let Some(path) = &args.load_globals {
            let text = fs::read_to_string(path)?;
            self.load_globals(&text)?;
        }
        self.vm.set_trace(args.trace);
        let ret = self.call(&args.function, &args.args)?;
        if let Some(path) = &args.save_globals {
            fs::write(path, self.save_globals()?)?;
        }
        Ok(self.format_return(ret, args.returns))
    }
}

impl<C: Console> fmt::Debug for Runtime<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime").field("vm", &self.vm).finish()
    }
}
