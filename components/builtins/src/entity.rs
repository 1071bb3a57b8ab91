//! Entity builtins

use core_types::ProgsResult;
use interpreter::{SavedValue, Vm};

use crate::console::Console;
use crate::format::{entity_to_string, float_to_string, vector_to_string};

/// `entity spawn()`
pub fn spawn<H>(vm: &mut Vm<H>) -> ProgsResult<()> {
    let ent = vm.entities_mut().spawn()?;
    vm.return_i32(ent)
}

/// `void remove(entity e)`
pub fn remove<H>(vm: &mut Vm<H>) -> ProgsResult<()> {
    let ent = vm.parm_i32(0)?;
    vm.entities_mut().remove(ent)
}

/// `entity nextent(entity e)`: the next live entity, or world at the end
pub fn nextent<H>(vm: &mut Vm<H>) -> ProgsResult<()> {
    let ent = vm.parm_i32(0)?;
    let next = vm.entities().next_live(ent).unwrap_or(0);
    vm.return_i32(next)
}

/// `void eprint(entity e)`
pub fn eprint<H: Console>(vm: &mut Vm<H>) -> ProgsResult<()> {
    let ent = vm.parm_i32(0)?;
    let text = describe_entity(vm, ent)?;
    vm.host_mut().print(&text);
    Ok(())
}

fn value_string(value: &SavedValue) -> String {
    match value {
        SavedValue::Float(f) => float_to_string(*f),
        SavedValue::Vector(v) => vector_to_string(core_types::Vec3(*v)),
        SavedValue::String(s) => s.clone(),
        SavedValue::Entity(e) => entity_to_string(*e),
        SavedValue::Function(name) => format!("{}()", name),
    }
}

/// Non-zero fields of an entity, one per line
pub fn describe_entity<H>(vm: &Vm<H>, ent: i32) -> ProgsResult<String> {
    let snapshot = vm.export_entity(ent)?;
    let mut text = format!("\nEDICT {}:\n", ent);
    for (name, value) in &snapshot.fields {
        text.push_str(&format!("{:>15} {}\n", name, value_string(value)));
    }
    Ok(text)
}
