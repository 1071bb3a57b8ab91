//! Virtual Machine for progs execution
//!
//! A [`Vm`] is one execution context: it owns a loaded [`Program`], its global
//! segment, string heap, entity store, call stack and builtin table. Several
//! contexts can run side by side; they share nothing.

use std::fmt;

use bytecode_system::{Def, Function, FunctionKind, Program};
use core_types::layout::{ofs_parm, MAX_PARMS, OFS_RETURN};
use core_types::{
    ProgsError, ProgsResult, ReturnValue, RuntimeError, StackFrame, Value, Vec3,
};
use memory_manager::{EntityStore, GlobalSegment, StringHeap};
use tracing::{error, trace};

use crate::builtin::{BuiltinFn, BuiltinTable};
use crate::call_frame::CallFrame;
use crate::config::VmConfig;
use crate::context::ExecutionContext;
use crate::profile::{ProfileEntry, Profiler};

/// Globals and fields STATE writes, resolved by name once
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StateBindings {
    pub(crate) self_global: Option<usize>,
    pub(crate) time_global: Option<usize>,
    pub(crate) nextthink: Option<i32>,
    pub(crate) frame: Option<i32>,
    pub(crate) think: Option<i32>,
}

impl StateBindings {
    fn resolve(program: &Program) -> Self {
        let global = |name: &str| program.find_global(name).map(|d| d.ofs as usize);
        let field = |name: &str| program.find_field(name).map(|d| d.ofs as i32);
        Self {
            self_global: global("self"),
            time_global: global("time"),
            nextthink: field("nextthink"),
            frame: field("frame"),
            think: field("think"),
        }
    }
}

/// A progs execution context
///
/// `H` is host state reachable from builtins through [`Vm::host`] and
/// [`Vm::host_mut`].
///
/// # Example
///
/// ```
/// use bytecode_system::{ImageBuilder, LoadOptions, Opcode, Program};
/// use interpreter::{Vm, VmConfig};
///
/// let mut b = ImageBuilder::new();
/// let answer = b.float_const(42.0);
/// b.begin_function("main", &[]);
/// b.emit(Opcode::Return, answer, 0, 0);
/// b.end_function();
///
/// let program = Program::load(&b.to_bytes(), &LoadOptions::default()).unwrap();
/// let mut vm = Vm::new(program, VmConfig::default(), ());
/// let result = vm.call_by_name("main", &[]).unwrap();
/// assert_eq!(result.as_f32(), 42.0);
/// ```
pub struct Vm<H = ()> {
    pub(crate) program: Program,
    pub(crate) globals: GlobalSegment,
    pub(crate) strings: StringHeap,
    pub(crate) entities: EntityStore,
    pub(crate) context: ExecutionContext,
    pub(crate) builtins: BuiltinTable<H>,
    pub(crate) profile: Profiler,
    pub(crate) config: VmConfig,
    pub(crate) state: StateBindings,
    pub(crate) trace: bool,
    /// Statement being executed, `None` while idle
    pub(crate) statement: Option<usize>,
    /// Argument count of the builtin being called
    pub(crate) argc: usize,
    /// Statements run since the outermost host call started
    pub(crate) executed: u64,
    host: H,
}

impl Vm<()> {
    /// Create a context with the default configuration and no host state
    pub fn with_program(program: Program) -> Self {
        Self::new(program, VmConfig::default(), ())
    }
}

impl<H> Vm<H> {
    /// Create a new execution context
    ///
    /// # Arguments
    ///
    /// * `program` - A loaded program
    /// * `config` - Limits and switches
    /// * `host` - Host state handed to builtins
    pub fn new(program: Program, config: VmConfig, host: H) -> Self {
        let globals = GlobalSegment::new(program.globals.clone());
        let strings = StringHeap::new(program.strings.clone(), config.temp_strings);
        let entities = EntityStore::new(
            program.entity_fields,
            config.max_entities,
            config.reserved_entities,
        );
        let context = ExecutionContext::new(config.max_depth, config.local_stack_size);
        let profile = Profiler::new(program.functions.len());
        let state = StateBindings::resolve(&program);
        Self {
            program,
            globals,
            strings,
            entities,
            context,
            builtins: BuiltinTable::new(),
            profile,
            config,
            state,
            trace: false,
            statement: None,
            argc: 0,
            executed: 0,
            host,
        }
    }

    /// Put globals and entities back to their state right after load
    ///
    /// Builtins and host state are kept.
    pub fn reset(&mut self) {
        self.globals = GlobalSegment::new(self.program.globals.clone());
        self.strings = StringHeap::new(self.program.strings.clone(), self.config.temp_strings);
        self.entities.clear();
        self.context.clear();
        self.statement = None;
        self.executed = 0;
    }

    // ------------------------------------------------------------------
    // Host entry points
    // ------------------------------------------------------------------

    /// Call a function with arguments staged in the parameter blocks
    ///
    /// # Returns
    ///
    /// * `Ok(ReturnValue)` - the return area after the call
    /// * `Err(RuntimeError)` - the fatal error with its call stack; the
    ///   context is unwound and can be used again
    pub fn call(&mut self, function: usize, args: &[Value]) -> Result<ReturnValue, RuntimeError> {
        if args.len() > MAX_PARMS {
            return Err(RuntimeError::detached(ProgsError::TooManyArguments(
                args.len(),
            )));
        }
        for (i, arg) in args.iter().enumerate() {
            let bits = arg.to_slots();
            self.globals
                .slice_mut(ofs_parm(i), arg.width())
                .map(|slots| slots.copy_from_slice(&bits[..arg.width()]))?;
        }

        if self.context.depth() == 0 {
            self.executed = 0;
        }
        let exit_depth = self.context.depth();
        let saved_statement = self.statement;
        let result = self.execute(function, args.len());
        let outcome = match result {
            Ok(()) => Ok(self.return_value()),
            Err(err) => {
                let report = self.runtime_error(err);
                error!(error = %report.error, function = ?report.function, statement = ?report.statement, "program execution aborted");
                self.unwind_to(exit_depth);
                Err(report)
            }
        };
        self.statement = saved_statement;
        outcome
    }

    /// Call a function by name
    pub fn call_by_name(&mut self, name: &str, args: &[Value]) -> Result<ReturnValue, RuntimeError> {
        let function = self
            .program
            .find_function(name)
            .ok_or_else(|| RuntimeError::detached(ProgsError::NotFound(name.to_string())))?;
        self.call(function, args)
    }

    /// Run a function from inside a builtin, using whatever is staged in the
    /// parameter blocks
    ///
    /// The nested run shares the depth bound and the temporary ring with the
    /// outer one. On error its own frames are unwound before returning.
    pub fn invoke(&mut self, function: usize) -> ProgsResult<()> {
        let exit_depth = self.context.depth();
        let saved_statement = self.statement;
        let saved_argc = self.argc;
        let argc = self
            .program
            .functions
            .get(function)
            .map(Function::num_parms)
            .unwrap_or(0);
        let result = self.execute(function, argc);
        if result.is_err() {
            self.unwind_to(exit_depth);
        }
        self.statement = saved_statement;
        self.argc = saved_argc;
        result
    }

    fn execute(&mut self, function: usize, argc: usize) -> ProgsResult<()> {
        match self.resolve_function(function)? {
            FunctionKind::Builtin(number) => self.call_builtin(function, number, argc),
            FunctionKind::Bytecode(_) => {
                let exit_depth = self.context.depth();
                let first = self.enter_function(function)?;
                self.run(first, exit_depth)
            }
        }
    }

    /// Return area contents
    pub fn return_value(&self) -> ReturnValue {
        ReturnValue(self.globals.read_padded(OFS_RETURN).unwrap_or([0; 3]))
    }

    // ------------------------------------------------------------------
    // Call-stack management
    // ------------------------------------------------------------------

    pub(crate) fn resolve_function(&self, function: usize) -> ProgsResult<FunctionKind> {
        if function == 0 {
            return Err(ProgsError::NullFunction);
        }
        self.program
            .functions
            .get(function)
            .map(Function::kind)
            .ok_or(ProgsError::BadFunction(function as i32))
    }

    /// Push a frame for a bytecode function and return its first statement
    ///
    /// The callee's local window is saved, then each staged argument is
    /// copied in, packed by declared width.
    pub(crate) fn enter_function(&mut self, function: usize) -> ProgsResult<usize> {
        self.context.check_depth()?;
        let func = self
            .program
            .functions
            .get(function)
            .ok_or(ProgsError::BadFunction(function as i32))?;
        let first = match func.kind() {
            FunctionKind::Bytecode(first) => first,
            FunctionKind::Builtin(_) => return Err(ProgsError::BadFunction(function as i32)),
        };
        let start = func.parm_start as usize;
        let len = func.locals as usize;

        let saved_at = self.context.save_locals(self.globals.slice(start, len)?)?;
        let mut dst = start;
        for (i, width) in func.parm_size.iter().enumerate() {
            let width = *width as usize;
            self.globals.copy(ofs_parm(i), dst, width)?;
            dst += width;
        }
        self.context.push(CallFrame::new(
            function,
            self.statement,
            start,
            len,
            saved_at,
        ))?;
        self.profile.record_call(function);
        trace!(
            function = %self.program.function_name(function),
            depth = self.context.depth(),
            "enter"
        );
        Ok(first)
    }

    /// Pop the innermost frame, restoring the locals it saved
    ///
    /// Returns the statement the caller was executing.
    pub(crate) fn leave_function(&mut self) -> ProgsResult<Option<usize>> {
        let Some((frame, saved)) = self.context.pop() else {
            return Ok(None);
        };
        self.globals
            .slice_mut(frame.locals_start, saved.len())?
            .copy_from_slice(&saved);
        Ok(frame.return_address)
    }

    /// Pop frames until `depth` remain
    ///
    /// Returns how many saved windows could not be written back.
    pub(crate) fn unwind_to(&mut self, depth: usize) -> usize {
        let mut dropped = 0;
        while self.context.depth() > depth {
            // leave_function pops before restoring, so this terminates.
            if let Err(e) = self.leave_function() {
                error!(depth = self.context.depth(), error = %e, "local window dropped while unwinding");
                dropped += 1;
            }
        }
        if self.context.depth() == 0 {
            self.context.clear();
        }
        dropped
    }

    pub(crate) fn call_builtin(&mut self, function: usize, number: usize, argc: usize) -> ProgsResult<()> {
        let func = match self.builtins.get(number) {
            Some(builtin) => builtin.func,
            None => {
                return Err(ProgsError::UnresolvedBuiltin {
                    number,
                    name: self.program.function_name(function).into_owned(),
                })
            }
        };
        self.profile.record_call(function);
        self.argc = argc;
        func(self)
    }

    /// Current call stack, innermost frame first
    pub fn stack_trace(&self) -> Vec<StackFrame> {
        let mut trace = Vec::with_capacity(self.context.depth());
        let mut statement = self.statement;
        for frame in self.context.frames().iter().rev() {
            trace.push(StackFrame::new(
                self.program.function_name(frame.function_id),
                self.program.function_file(frame.function_id),
                statement.unwrap_or(0),
            ));
            statement = frame.return_address;
        }
        trace
    }

    fn runtime_error(&self, error: ProgsError) -> RuntimeError {
        RuntimeError {
            error,
            statement: self.statement,
            function: self.current_function().map(|f| self.program.function_name(f).into_owned()),
            stack: self.stack_trace(),
        }
    }

    /// Function of the innermost frame
    pub fn current_function(&self) -> Option<usize> {
        self.context.current().map(|f| f.function_id)
    }

    /// Number of active frames
    pub fn depth(&self) -> usize {
        self.context.depth()
    }

    // ------------------------------------------------------------------
    // Builtins
    // ------------------------------------------------------------------

    /// Register a native function as builtin `number`
    pub fn register_builtin(&mut self, number: usize, name: impl Into<String>, func: BuiltinFn<H>) {
        self.builtins.register(number, name, func);
    }

    /// Register a native function under the name the program declares for
    /// it, and return the builtin number used
    ///
    /// # Errors
    ///
    /// `ProgsError::NotFound` when the program has no builtin of that name.
    pub fn register_builtin_by_name(&mut self, name: &str, func: BuiltinFn<H>) -> ProgsResult<usize> {
        let number = self
            .program
            .find_function(name)
            .map(|f| self.program.functions[f].kind())
            .and_then(|kind| match kind {
                FunctionKind::Builtin(number) => Some(number),
                FunctionKind::Bytecode(_) => None,
            })
            .ok_or_else(|| ProgsError::NotFound(format!("builtin {}", name)))?;
        self.builtins.register(number, name, func);
        Ok(number)
    }

    /// Registered builtins
    pub fn builtins(&self) -> &BuiltinTable<H> {
        &self.builtins
    }

    /// Arguments passed to the builtin being called
    pub fn argc(&self) -> usize {
        self.argc
    }

    /// Float argument `n`
    pub fn parm_f32(&self, n: usize) -> ProgsResult<f32> {
        self.globals.get_f32(ofs_parm(n))
    }

    /// Vector argument `n`
    pub fn parm_vector(&self, n: usize) -> ProgsResult<Vec3> {
        self.globals.get_vector(ofs_parm(n))
    }

    /// Integer argument `n` (entity, function or string reference)
    pub fn parm_i32(&self, n: usize) -> ProgsResult<i32> {
        self.globals.get_i32(ofs_parm(n))
    }

    /// String argument `n`, decoded
    pub fn parm_string(&self, n: usize) -> ProgsResult<String> {
        let handle = self.parm_i32(n)?;
        Ok(self.strings.get_lossy(handle)?.into_owned())
    }

    /// Return a float
    pub fn return_f32(&mut self, value: f32) -> ProgsResult<()> {
        self.globals.set_f32(OFS_RETURN, value)
    }

    /// Return a vector
    pub fn return_vector(&mut self, value: Vec3) -> ProgsResult<()> {
        self.globals.set_vector(OFS_RETURN, value)
    }

    /// Return an integer (entity, function or string reference)
    pub fn return_i32(&mut self, value: i32) -> ProgsResult<()> {
        self.globals.set_i32(OFS_RETURN, value)
    }

    /// Return a new temporary string
    pub fn return_temp_string(&mut self, text: &str) -> ProgsResult<i32> {
        let handle = self.strings.alloc_temp(text);
        self.return_i32(handle)?;
        Ok(handle)
    }

    // ------------------------------------------------------------------
    // Memory access
    // ------------------------------------------------------------------

    /// The loaded program
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The configuration in force
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Global segment
    pub fn globals(&self) -> &GlobalSegment {
        &self.globals
    }

    /// Mutable global segment
    pub fn globals_mut(&mut self) -> &mut GlobalSegment {
        &mut self.globals
    }

    /// String heap
    pub fn strings(&self) -> &StringHeap {
        &self.strings
    }

    /// Mutable string heap
    pub fn strings_mut(&mut self) -> &mut StringHeap {
        &mut self.strings
    }

    /// Entity store
    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// Mutable entity store
    pub fn entities_mut(&mut self) -> &mut EntityStore {
        &mut self.entities
    }

    /// Host state
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host state
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Raw slot value
    pub fn read_global(&self, ofs: usize) -> ProgsResult<u32> {
        self.globals.get_u32(ofs)
    }

    /// Write a raw slot value
    pub fn write_global(&mut self, ofs: usize, value: u32) -> ProgsResult<()> {
        self.globals.set_u32(ofs, value)
    }

    /// Global definition by name
    pub fn find_global(&self, name: &str) -> Option<&Def> {
        self.program.find_global(name)
    }

    fn named_global(&self, name: &str) -> ProgsResult<usize> {
        self.program
            .find_global(name)
            .map(|d| d.ofs as usize)
            .ok_or_else(|| ProgsError::NotFound(name.to_string()))
    }

    /// Float global by name
    pub fn global_f32(&self, name: &str) -> ProgsResult<f32> {
        self.globals.get_f32(self.named_global(name)?)
    }

    /// Write a float global by name
    pub fn set_global_f32(&mut self, name: &str, value: f32) -> ProgsResult<()> {
        let ofs = self.named_global(name)?;
        self.globals.set_f32(ofs, value)
    }

    /// Vector global by name
    pub fn global_vector(&self, name: &str) -> ProgsResult<Vec3> {
        self.globals.get_vector(self.named_global(name)?)
    }

    /// Write a vector global by name
    pub fn set_global_vector(&mut self, name: &str, value: Vec3) -> ProgsResult<()> {
        let ofs = self.named_global(name)?;
        self.globals.set_vector(ofs, value)
    }

    /// Integer global by name (entity, function or string reference)
    pub fn global_i32(&self, name: &str) -> ProgsResult<i32> {
        self.globals.get_i32(self.named_global(name)?)
    }

    /// Write an integer global by name
    pub fn set_global_i32(&mut self, name: &str, value: i32) -> ProgsResult<()> {
        let ofs = self.named_global(name)?;
        self.globals.set_i32(ofs, value)
    }

    /// Offset of a field by name
    pub fn field_offset(&self, name: &str) -> ProgsResult<i32> {
        self.program
            .find_field(name)
            .map(|d| d.ofs as i32)
            .ok_or_else(|| ProgsError::NotFound(name.to_string()))
    }

    /// Address of an entity field, as `ADDRESS` computes it
    pub fn entity_field_address(&self, ent: i32, field: i32) -> ProgsResult<i32> {
        self.entities.address(ent, field, 1)
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Toggle per-statement tracing
    pub fn set_trace(&mut self, on: bool) {
        self.trace = on;
    }

    /// Whether statements are traced
    pub fn is_tracing(&self) -> bool {
        self.trace
    }

    /// Profiling counters
    pub fn profile(&self) -> &Profiler {
        &self.profile
    }

    /// The `limit` busiest functions
    pub fn profile_report(&self, limit: usize) -> Vec<ProfileEntry> {
        self.profile.report(&self.program, limit)
    }

    /// Zero the profiling counters
    pub fn reset_profile(&mut self) {
        self.profile.reset();
    }
}

impl<H> fmt::Debug for Vm<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vm")
            .field("functions", &self.program.functions.len())
            .field("globals", &self.globals.len())
            .field("entities", &self.entities.num_entities())
            .field("depth", &self.context.depth())
            .field("builtins", &self.builtins)
            .field("trace", &self.trace)
            .finish()
    }
}
