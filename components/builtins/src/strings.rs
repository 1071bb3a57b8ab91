//! String builtins
//!
//! Every string these produce is a temporary: it lives in the VM's ring and
//! is overwritten after enough later allocations.

use core_types::ProgsResult;
use interpreter::Vm;

use crate::format::{entity_to_string, float_to_string, string_to_float, vector_to_string};

/// Concatenate the string arguments from `first` on
pub fn var_string<H>(vm: &Vm<H>, first: usize) -> ProgsResult<String> {
    let mut text = String::new();
    for n in first..vm.argc() {
        text.push_str(&vm.parm_string(n)?);
    }
    Ok(text)
}

/// `string ftos(float f)`
pub fn ftos<H>(vm: &mut Vm<H>) -> ProgsResult<()> {
    let text = float_to_string(vm.parm_f32(0)?);
    vm.return_temp_string(&text).map(drop)
}

/// `string vtos(vector v)`
pub fn vtos<H>(vm: &mut Vm<H>) -> ProgsResult<()> {
    let text = vector_to_string(vm.parm_vector(0)?);
    vm.return_temp_string(&text).map(drop)
}

/// `string etos(entity e)`
pub fn etos<H>(vm: &mut Vm<H>) -> ProgsResult<()> {
    let text = entity_to_string(vm.parm_i32(0)?);
    vm.return_temp_string(&text).map(drop)
}

/// `float stof(string s)`
pub fn stof<H>(vm: &mut Vm<H>) -> ProgsResult<()> {
    let value = string_to_float(&vm.parm_string(0)?);
    vm.return_f32(value)
}

/// `string strcat(string s, ...)`
pub fn strcat<H>(vm: &mut Vm<H>) -> ProgsResult<()> {
    let text = var_string(vm, 0)?;
    vm.return_temp_string(&text).map(drop)
}
