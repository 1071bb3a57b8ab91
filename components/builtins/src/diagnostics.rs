//! Printing, error reporting and trace control

use core_types::{ProgsError, ProgsResult};
use interpreter::Vm;
use tracing::warn;

use crate::console::Console;
use crate::entity::describe_entity;
use crate::strings::var_string;

fn current_name<H>(vm: &Vm<H>) -> String {
    vm.current_function()
        .map(|f| vm.program().function_name(f).into_owned())
        .unwrap_or_default()
}

fn self_entity<H>(vm: &Vm<H>) -> Option<i32> {
    vm.global_i32("self").ok()
}

fn report<H: Console>(vm: &mut Vm<H>, kind: &str) -> ProgsResult<(String, String)> {
    let message = var_string(vm, 0)?;
    let function = current_name(vm);
    let mut text = format!("======{} in {}:\n{}\n", kind, function, message);
    if let Some(ent) = self_entity(vm) {
        if let Ok(fields) = describe_entity(vm, ent) {
            text.push_str(&fields);
        }
    }
    vm.host_mut().print(&text);
    Ok((function, message))
}

/// `void error(string s, ...)`: print `self` and abort the call
pub fn error<H: Console>(vm: &mut Vm<H>) -> ProgsResult<()> {
    let (function, message) = report(vm, "SERVER ERROR")?;
    Err(ProgsError::builtin(format!("error in {}: {}", function, message)))
}

/// `void objerror(string s, ...)`: like `error`, removing `self` first
pub fn objerror<H: Console>(vm: &mut Vm<H>) -> ProgsResult<()> {
    let (function, message) = report(vm, "OBJECT ERROR")?;
    if let Some(ent) = self_entity(vm).filter(|e| *e > 0) {
        if let Err(err) = vm.entities_mut().remove(ent) {
            warn!(entity = ent, %err, "objerror could not remove self");
        }
    }
    Err(ProgsError::builtin(format!("object error in {}: {}", function, message)))
}

/// `void dprint(string s, ...)`
pub fn dprint<H: Console>(vm: &mut Vm<H>) -> ProgsResult<()> {
    let text = var_string(vm, 0)?;
    vm.host_mut().print(&text);
    Ok(())
}

/// `void traceon()`
pub fn traceon<H>(vm: &mut Vm<H>) -> ProgsResult<()> {
    vm.set_trace(true);
    Ok(())
}

/// `void traceoff()`
pub fn traceoff<H>(vm: &mut Vm<H>) -> ProgsResult<()> {
    vm.set_trace(false);
    Ok(())
}
