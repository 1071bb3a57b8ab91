//! Dispatch loop for bytecode execution
//!
//! Handles individual opcode execution. Operands are global offsets except
//! for the branch deltas of `IF`, `IFNOT` and `GOTO`, which are relative to
//! the statement being executed.

use bytecode_system::{format_statement, FunctionKind, Opcode, Statement};
use core_types::layout::OFS_RETURN;
use core_types::{ProgsError, ProgsResult, Vec3};
use tracing::debug;

use crate::vm::Vm;

/// What the loop does after a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next,
    Jump(usize),
    Return,
}

#[inline]
fn truth(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn branch_target(pc: usize, delta: i16) -> ProgsResult<usize> {
    let target = pc as i64 + delta as i64;
    if target < 0 {
        return Err(ProgsError::StatementOutOfRange(target));
    }
    Ok(target as usize)
}

impl<H> Vm<H> {
    /// Execute statements from `first` until the frame at `exit_depth + 1`
    /// returns
    pub(crate) fn run(&mut self, first: usize, exit_depth: usize) -> ProgsResult<()> {
        let mut pc = first;
        loop {
            let st = *self
                .program
                .statements
                .get(pc)
                .ok_or(ProgsError::StatementOutOfRange(pc as i64))?;
            self.statement = Some(pc);

            self.executed += 1;
            if let Some(limit) = self.config.runaway_limit {
                if self.executed > limit {
                    return Err(ProgsError::RunawayLoop(limit));
                }
            }
            if let Some(function) = self.current_function() {
                self.profile.record_statement(function);
            }
            if self.trace {
                debug!(target: "progs::trace", "{}", format_statement(&self.program, pc, &st));
            }

            match self.step(pc, &st)? {
                Flow::Next => pc += 1,
                Flow::Jump(target) => pc = target,
                Flow::Return => {
                    let resume = self.leave_function()?;
                    if self.context.depth() <= exit_depth {
                        return Ok(());
                    }
                    match resume {
                        Some(at) => pc = at + 1,
                        None => return Ok(()),
                    }
                }
            }
        }
    }

    fn f(&self, ofs: usize) -> ProgsResult<f32> {
        self.globals.get_f32(ofs)
    }

    fn v(&self, ofs: usize) -> ProgsResult<Vec3> {
        self.globals.get_vector(ofs)
    }

    fn i(&self, ofs: usize) -> ProgsResult<i32> {
        self.globals.get_i32(ofs)
    }

    fn step(&mut self, pc: usize, st: &Statement) -> ProgsResult<Flow> {
        let (a, b, c) = (st.a_ofs(), st.b_ofs(), st.c_ofs());
        let op = st.opcode()?;
        match op {
            Opcode::Done => {
                self.globals.slice_mut(OFS_RETURN, 3)?.fill(0);
                return Ok(Flow::Return);
            }
            Opcode::Return => {
                if a != 0 {
                    let value = self.globals.read_padded(a)?;
                    self.globals
                        .slice_mut(OFS_RETURN, 3)?
                        .copy_from_slice(&value);
                }
                return Ok(Flow::Return);
            }

            // Arithmetic
            Opcode::MulF => {
                let r = self.f(a)? * self.f(b)?;
                self.globals.set_f32(c, r)?;
            }
            Opcode::MulV => {
                let r = self.v(a)?.dot(self.v(b)?);
                self.globals.set_f32(c, r)?;
            }
            Opcode::MulFV => {
                let (s, v) = (self.f(a)?, self.v(b)?);
                self.globals.set_vector(c, v * s)?;
            }
            Opcode::MulVF => {
                let (v, s) = (self.v(a)?, self.f(b)?);
                self.globals.set_vector(c, v * s)?;
            }
            Opcode::DivF => {
                let r = self.f(a)? / self.f(b)?;
                self.globals.set_f32(c, r)?;
            }
            Opcode::AddF => {
                let r = self.f(a)? + self.f(b)?;
                self.globals.set_f32(c, r)?;
            }
            Opcode::AddV => {
                let r = self.v(a)? + self.v(b)?;
                self.globals.set_vector(c, r)?;
            }
            Opcode::SubF => {
                let r = self.f(a)? - self.f(b)?;
                self.globals.set_f32(c, r)?;
            }
            Opcode::SubV => {
                let r = self.v(a)? - self.v(b)?;
                self.globals.set_vector(c, r)?;
            }

            // Comparison
            Opcode::EqF => {
                let r = self.f(a)? == self.f(b)?;
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::EqV => {
                let r = self.v(a)? == self.v(b)?;
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::EqS => {
                let r = self.strings.equal(self.i(a)?, self.i(b)?)?;
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::EqE | Opcode::EqFnc => {
                let r = self.i(a)? == self.i(b)?;
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::NeF => {
                let r = self.f(a)? != self.f(b)?;
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::NeV => {
                let r = self.v(a)? != self.v(b)?;
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::NeS => {
                let r = !self.strings.equal(self.i(a)?, self.i(b)?)?;
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::NeE | Opcode::NeFnc => {
                let r = self.i(a)? != self.i(b)?;
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::Le => {
                let r = self.f(a)? <= self.f(b)?;
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::Ge => {
                let r = self.f(a)? >= self.f(b)?;
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::Lt => {
                let r = self.f(a)? < self.f(b)?;
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::Gt => {
                let r = self.f(a)? > self.f(b)?;
                self.globals.set_f32(c, truth(r))?;
            }

            // Entity field access
            Opcode::LoadF
            | Opcode::LoadS
            | Opcode::LoadEnt
            | Opcode::LoadFld
            | Opcode::LoadFnc
            | Opcode::LoadV => {
                let width = if op == Opcode::LoadV { 3 } else { 1 };
                let ptr = self.entities.address(self.i(a)?, self.i(b)?, width)?;
                let value = self.entities.read(ptr, width)?;
                self.globals.slice_mut(c, width)?.copy_from_slice(value);
            }
            Opcode::Address => {
                let ent = self.i(a)?;
                if ent == 0 && self.config.protect_world {
                    return Err(ProgsError::WorldAssignment);
                }
                let ptr = self.entities.address(ent, self.i(b)?, 1)?;
                self.globals.set_i32(c, ptr)?;
            }

            // Global to global
            Opcode::StoreF
            | Opcode::StoreS
            | Opcode::StoreEnt
            | Opcode::StoreFld
            | Opcode::StoreFnc => self.globals.copy(a, b, 1)?,
            Opcode::StoreV => self.globals.copy(a, b, 3)?,

            // Through a pointer
            Opcode::StorePF
            | Opcode::StorePS
            | Opcode::StorePEnt
            | Opcode::StorePFld
            | Opcode::StorePFnc
            | Opcode::StorePV => {
                let width = if op == Opcode::StorePV { 3 } else { 1 };
                let ptr = self.i(b)?;
                let value = self.globals.slice(a, width)?;
                self.entities.write(ptr, value)?;
            }

            // Logic
            Opcode::NotF => {
                let r = self.f(a)? == 0.0;
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::NotV => {
                let r = self.v(a)?.is_zero();
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::NotS => {
                let r = self.strings.is_null(self.i(a)?)?;
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::NotEnt | Opcode::NotFnc => {
                let r = self.i(a)? == 0;
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::And => {
                let r = self.f(a)? != 0.0 && self.f(b)? != 0.0;
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::Or => {
                let r = self.f(a)? != 0.0 || self.f(b)? != 0.0;
                self.globals.set_f32(c, truth(r))?;
            }
            Opcode::BitAnd => {
                let r = (self.f(a)? as i32) & (self.f(b)? as i32);
                self.globals.set_f32(c, r as f32)?;
            }
            Opcode::BitOr => {
                let r = (self.f(a)? as i32) | (self.f(b)? as i32);
                self.globals.set_f32(c, r as f32)?;
            }

            // Control flow; conditions test the raw bits
            Opcode::If => {
                if self.globals.get_u32(a)? != 0 {
                    return Ok(Flow::Jump(branch_target(pc, st.b)?));
                }
            }
            Opcode::IfNot => {
                if self.globals.get_u32(a)? == 0 {
                    return Ok(Flow::Jump(branch_target(pc, st.b)?));
                }
            }
            Opcode::Goto => return Ok(Flow::Jump(branch_target(pc, st.a)?)),

            Opcode::Call0
            | Opcode::Call1
            | Opcode::Call2
            | Opcode::Call3
            | Opcode::Call4
            | Opcode::Call5
            | Opcode::Call6
            | Opcode::Call7
            | Opcode::Call8 => {
                let argc = op.call_argc().unwrap_or(0);
                let fref = self.i(a)?;
                if fref < 0 {
                    return Err(ProgsError::BadFunction(fref));
                }
                let function = fref as usize;
                return match self.resolve_function(function)? {
                    FunctionKind::Builtin(number) => {
                        self.call_builtin(function, number, argc)?;
                        Ok(Flow::Next)
                    }
                    FunctionKind::Bytecode(_) => {
                        let first = self.enter_function(function)?;
                        Ok(Flow::Jump(first))
                    }
                };
            }

            Opcode::State => self.state(a, b)?,
        }
        Ok(Flow::Next)
    }

    /// `STATE frame think`: schedule the next think of `self`
    fn state(&mut self, a: usize, b: usize) -> ProgsResult<()> {
        let bindings = self.state;
        let self_global = bindings.self_global.ok_or(ProgsError::UnboundState("self"))?;
        let time_global = bindings.time_global.ok_or(ProgsError::UnboundState("time"))?;
        let nextthink = bindings.nextthink.ok_or(ProgsError::UnboundState("nextthink"))?;
        let frame = bindings.frame.ok_or(ProgsError::UnboundState("frame"))?;
        let think = bindings.think.ok_or(ProgsError::UnboundState("think"))?;

        let ent = self.i(self_global)?;
        // All three addresses are checked before anything is written.
        let nextthink_ptr = self.entities.address(ent, nextthink, 1)?;
        let frame_ptr = self.entities.address(ent, frame, 1)?;
        let think_ptr = self.entities.address(ent, think, 1)?;

        let when = self.f(time_global)? + self.config.state_interval;
        let frame_value = self.globals.get_u32(a)?;
        let think_value = self.globals.get_u32(b)?;
        self.entities.write(nextthink_ptr, &[when.to_bits()])?;
        self.entities.write(frame_ptr, &[frame_value])?;
        self.entities.write(think_ptr, &[think_value])?;
        Ok(())
    }
}
