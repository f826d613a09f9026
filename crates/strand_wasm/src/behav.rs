//! Behavioral code generation: slot-based IR to inlined WASM arithmetic.
//!
//! Every behavioral definition gets one *frame* — a contiguous range of
//! `i32` locals, one per variable slot — inside `evaluate_comb`. An
//! instance executes by packing its input bits into the frame's parameter
//! locals, zeroing the rest of the frame, running the translated body, and
//! unpacking the output locals back into per-bit memory writes.
//!
//! Cross-module calls reuse the callee's frame: arguments are evaluated
//! onto the operand stack first, then stored (masked to the parameter
//! widths) in reverse, so nested calls of the same callee cannot clobber
//! half-stored arguments. The call graph is a DAG, so frame reuse is safe
//! and inlining terminates.

use crate::emit::memarg;
use crate::layout::MemoryLayout;
use crate::{EmitError, OptLevel};
use std::collections::{BTreeMap, HashMap};
use wasm_encoder::{BlockType, Function, Instruction, ValType};
use strand_ir::{
    behav::{width_mask, BinaryOp, UnaryOp},
    BehavExpr, BehavLhs, BehavModule, BehavPattern, BehavStmt, BehavioralInstance,
    LevelizedNetlist, SignalId, CONST_0, CONST_1,
};

/// Shared state for emitting one `evaluate_comb` body.
pub(crate) struct CombCtx<'a> {
    netlist: &'a LevelizedNetlist,
    layout: &'a MemoryLayout,
    /// Base local index of each definition's frame, by def index.
    frames: Vec<u32>,
    /// Scratch local holding a dynamic bit index.
    scratch_i: u32,
    /// Scratch local holding a masked assignment value.
    scratch_v: u32,
    cache_base: u32,
    cache_size: u32,
}

impl<'a> CombCtx<'a> {
    pub(crate) fn new(
        netlist: &'a LevelizedNetlist,
        layout: &'a MemoryLayout,
        opt: OptLevel,
    ) -> Self {
        let mut frames = Vec::with_capacity(netlist.behavioral_defs.len());
        let mut next = 0u32;
        for def in &netlist.behavioral_defs {
            frames.push(next);
            next += def.slot_count();
        }
        let scratch_i = next;
        let scratch_v = next + 1;
        let cache_base = next + 2;

        let cache_size = if opt == OptLevel::Four {
            netlist
                .levels
                .iter()
                .map(|level| {
                    let mut words: Vec<u32> = level
                        .iter()
                        .filter(|g| g.in1 != CONST_0 && g.in2 != CONST_0)
                        .flat_map(|g| [g.in1.as_raw() >> 5, g.in2.as_raw() >> 5])
                        .collect();
                    words.sort_unstable();
                    words.dedup();
                    words.len() as u32
                })
                .max()
                .unwrap_or(0)
        } else {
            0
        };

        Self {
            netlist,
            layout,
            frames,
            scratch_i,
            scratch_v,
            cache_base,
            cache_size,
        }
    }

    pub(crate) fn local_count(&self) -> u32 {
        self.cache_base + self.cache_size
    }

    pub(crate) fn cache_base(&self) -> u32 {
        self.cache_base
    }

    /// Groups instance indices by the combinational slot at which they
    /// execute: `1 + max(level of input drivers)`, or 0 when every input
    /// is a source.
    pub(crate) fn behavioral_schedule(&self) -> BTreeMap<u32, Vec<usize>> {
        let mut gate_level: HashMap<SignalId, u32> = HashMap::new();
        for (k, level) in self.netlist.levels.iter().enumerate() {
            for gate in level {
                gate_level.insert(gate.out, k as u32);
            }
        }
        let mut schedule: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (idx, inst) in self.netlist.behavioral.iter().enumerate() {
            let slot = inst
                .inputs
                .iter()
                .flatten()
                .filter_map(|bit| gate_level.get(bit))
                .map(|&l| l + 1)
                .max()
                .unwrap_or(0);
            schedule.entry(slot).or_default().push(idx);
        }
        schedule
    }

    fn def(&self, inst: &BehavioralInstance) -> &'a BehavModule {
        &self.netlist.behavioral_defs[inst.def.as_raw() as usize]
    }

    /// Emits one instance execution: pack, zero, body, unpack.
    pub(crate) fn emit_instance(
        &self,
        f: &mut Function,
        inst: &BehavioralInstance,
    ) -> Result<(), EmitError> {
        let def = self.def(inst);
        let base = self.frames[inst.def.as_raw() as usize];
        if inst.inputs.len() != def.inputs.len() || inst.outputs.len() != def.outputs.len() {
            return Err(EmitError::InvalidEncoding(format!(
                "instance `{}` does not match its definition's ports",
                inst.name
            )));
        }

        for (k, bits) in inst.inputs.iter().enumerate() {
            self.pack_bits(f, bits);
            f.instruction(&Instruction::LocalSet(base + k as u32));
        }
        self.zero_frame_tail(f, def, base);
        self.emit_stmts(f, def, base, &def.body)?;

        for (k, bits) in inst.outputs.iter().enumerate() {
            let out_local = base + def.output_slot(k as u32);
            for (i, &bit) in bits.iter().enumerate() {
                if bit == CONST_0 || bit == CONST_1 {
                    return Err(EmitError::InvalidEncoding(format!(
                        "instance `{}` output drives a constant signal",
                        inst.name
                    )));
                }
                let offset = self.layout.byte_offset(bit);
                f.instruction(&Instruction::I32Const(0));
                f.instruction(&Instruction::LocalGet(out_local));
                if i != 0 {
                    f.instruction(&Instruction::I32Const(i as i32));
                    f.instruction(&Instruction::I32ShrU);
                }
                f.instruction(&Instruction::I32Const(1));
                f.instruction(&Instruction::I32And);
                let shift = self.layout.bit_shift(bit);
                if shift != 0 {
                    f.instruction(&Instruction::I32Const(shift as i32));
                    f.instruction(&Instruction::I32Shl);
                }
                f.instruction(&Instruction::I32Const(0));
                f.instruction(&Instruction::I32Load(memarg(offset)));
                f.instruction(&Instruction::I32Const(!self.layout.mask(bit) as i32));
                f.instruction(&Instruction::I32And);
                f.instruction(&Instruction::I32Or);
                f.instruction(&Instruction::I32Store(memarg(offset)));
            }
        }
        Ok(())
    }

    /// Packs a little-endian bit list into an i32 on the stack.
    ///
    /// Constant bits fold into a single immediate OR; `const_0` bits
    /// contribute nothing at all.
    fn pack_bits(&self, f: &mut Function, bits: &[SignalId]) {
        let mut have = false;
        let mut const_acc = 0u32;
        for (i, &bit) in bits.iter().enumerate() {
            if bit == CONST_0 {
                continue;
            }
            if bit == CONST_1 {
                const_acc |= 1 << i;
                continue;
            }
            f.instruction(&Instruction::I32Const(0));
            f.instruction(&Instruction::I32Load(memarg(self.layout.byte_offset(bit))));
            let s = self.layout.bit_shift(bit);
            if s != 0 {
                f.instruction(&Instruction::I32Const(s as i32));
                f.instruction(&Instruction::I32ShrU);
            }
            f.instruction(&Instruction::I32Const(1));
            f.instruction(&Instruction::I32And);
            if i != 0 {
                f.instruction(&Instruction::I32Const(i as i32));
                f.instruction(&Instruction::I32Shl);
            }
            if have {
                f.instruction(&Instruction::I32Or);
            }
            have = true;
        }
        if const_acc != 0 {
            f.instruction(&Instruction::I32Const(const_acc as i32));
            if have {
                f.instruction(&Instruction::I32Or);
            }
            have = true;
        }
        if !have {
            f.instruction(&Instruction::I32Const(0));
        }
    }

    /// Zeroes a frame's output and local slots.
    ///
    /// Required because frames are reused across instances and calls
    /// within one `evaluate_comb` invocation; WASM only zeroes locals at
    /// function entry.
    fn zero_frame_tail(&self, f: &mut Function, def: &BehavModule, base: u32) {
        for slot in def.inputs.len() as u32..def.slot_count() {
            f.instruction(&Instruction::I32Const(0));
            f.instruction(&Instruction::LocalSet(base + slot));
        }
    }

    fn emit_stmts(
        &self,
        f: &mut Function,
        def: &BehavModule,
        base: u32,
        stmts: &[BehavStmt],
    ) -> Result<(), EmitError> {
        for stmt in stmts {
            self.emit_stmt(f, def, base, stmt)?;
        }
        Ok(())
    }

    fn emit_stmt(
        &self,
        f: &mut Function,
        def: &BehavModule,
        base: u32,
        stmt: &BehavStmt,
    ) -> Result<(), EmitError> {
        match stmt {
            BehavStmt::Let { slot, value } => {
                self.emit_expr(f, def, base, value)?;
                self.store_masked(f, def, base, *slot);
            }
            BehavStmt::Assign { lhs, value } => match lhs {
                BehavLhs::Var(slot) => {
                    self.emit_expr(f, def, base, value)?;
                    self.store_masked(f, def, base, *slot);
                }
                BehavLhs::BitIndex(slot, index) => {
                    // value and index finish evaluating before the
                    // scratch locals are written, so inlined calls inside
                    // either cannot clobber them.
                    self.emit_expr(f, def, base, value)?;
                    f.instruction(&Instruction::I32Const(1));
                    f.instruction(&Instruction::I32And);
                    self.emit_expr(f, def, base, index)?;
                    f.instruction(&Instruction::LocalSet(self.scratch_i));
                    f.instruction(&Instruction::LocalSet(self.scratch_v));

                    f.instruction(&Instruction::LocalGet(base + slot));
                    f.instruction(&Instruction::I32Const(1));
                    f.instruction(&Instruction::LocalGet(self.scratch_i));
                    f.instruction(&Instruction::I32Shl);
                    f.instruction(&Instruction::I32Const(-1));
                    f.instruction(&Instruction::I32Xor);
                    f.instruction(&Instruction::I32And);
                    f.instruction(&Instruction::LocalGet(self.scratch_v));
                    f.instruction(&Instruction::LocalGet(self.scratch_i));
                    f.instruction(&Instruction::I32Shl);
                    f.instruction(&Instruction::I32Or);
                    self.store_masked(f, def, base, *slot);
                }
                BehavLhs::Slice(slot, hi, lo) => {
                    let m = width_mask(hi - lo + 1);
                    self.emit_expr(f, def, base, value)?;
                    f.instruction(&Instruction::I32Const(m as i32));
                    f.instruction(&Instruction::I32And);
                    if *lo != 0 {
                        f.instruction(&Instruction::I32Const(*lo as i32));
                        f.instruction(&Instruction::I32Shl);
                    }
                    f.instruction(&Instruction::LocalGet(base + slot));
                    f.instruction(&Instruction::I32Const(!(m << lo) as i32));
                    f.instruction(&Instruction::I32And);
                    f.instruction(&Instruction::I32Or);
                    f.instruction(&Instruction::LocalSet(base + slot));
                }
            },
            BehavStmt::If {
                cond,
                then_body,
                else_body,
            } => {
                self.emit_expr(f, def, base, cond)?;
                f.instruction(&Instruction::If(BlockType::Empty));
                self.emit_stmts(f, def, base, then_body)?;
                if !else_body.is_empty() {
                    f.instruction(&Instruction::Else);
                    self.emit_stmts(f, def, base, else_body)?;
                }
                f.instruction(&Instruction::End);
            }
            BehavStmt::Match { subject, arms } => {
                let mut opened = 0u32;
                for (pattern, body) in arms {
                    match pattern {
                        BehavPattern::Wildcard => {
                            // Terminates the chain; later arms are dead.
                            self.emit_stmts(f, def, base, body)?;
                            break;
                        }
                        BehavPattern::Number(n) => {
                            self.emit_expr(f, def, base, subject)?;
                            f.instruction(&Instruction::I32Const(*n as i32));
                            f.instruction(&Instruction::I32Eq);
                        }
                        BehavPattern::Range(lo, hi) => {
                            self.emit_expr(f, def, base, subject)?;
                            f.instruction(&Instruction::I32Const(*lo as i32));
                            f.instruction(&Instruction::I32GeU);
                            self.emit_expr(f, def, base, subject)?;
                            f.instruction(&Instruction::I32Const(*hi as i32));
                            f.instruction(&Instruction::I32LeU);
                            f.instruction(&Instruction::I32And);
                        }
                    }
                    f.instruction(&Instruction::If(BlockType::Empty));
                    self.emit_stmts(f, def, base, body)?;
                    f.instruction(&Instruction::Else);
                    opened += 1;
                }
                for _ in 0..opened {
                    f.instruction(&Instruction::End);
                }
            }
        }
        Ok(())
    }

    /// Masks the value on the stack to the slot's width and stores it.
    fn store_masked(&self, f: &mut Function, def: &BehavModule, base: u32, slot: u32) {
        let width = def.var(slot).width;
        if width < 32 {
            f.instruction(&Instruction::I32Const(width_mask(width) as i32));
            f.instruction(&Instruction::I32And);
        }
        f.instruction(&Instruction::LocalSet(base + slot));
    }

    fn emit_expr(
        &self,
        f: &mut Function,
        def: &BehavModule,
        base: u32,
        expr: &BehavExpr,
    ) -> Result<(), EmitError> {
        match expr {
            BehavExpr::Const(n) => {
                f.instruction(&Instruction::I32Const(*n as i32));
            }
            BehavExpr::Var(slot) => {
                f.instruction(&Instruction::LocalGet(base + slot));
            }
            BehavExpr::Binary { op, lhs, rhs } => match op {
                BinaryOp::Div | BinaryOp::Mod => {
                    // A zero divisor yields zero instead of trapping; the
                    // divisor re-evaluates in the else arm (expressions
                    // are pure).
                    self.emit_expr(f, def, base, rhs)?;
                    f.instruction(&Instruction::I32Eqz);
                    f.instruction(&Instruction::If(BlockType::Result(ValType::I32)));
                    f.instruction(&Instruction::I32Const(0));
                    f.instruction(&Instruction::Else);
                    self.emit_expr(f, def, base, lhs)?;
                    self.emit_expr(f, def, base, rhs)?;
                    f.instruction(if *op == BinaryOp::Div {
                        &Instruction::I32DivU
                    } else {
                        &Instruction::I32RemU
                    });
                    f.instruction(&Instruction::End);
                }
                _ => {
                    self.emit_expr(f, def, base, lhs)?;
                    self.emit_expr(f, def, base, rhs)?;
                    f.instruction(&binary_instr(*op));
                }
            },
            BehavExpr::Unary { op, operand } => {
                self.emit_expr(f, def, base, operand)?;
                match op {
                    UnaryOp::Not => {
                        f.instruction(&Instruction::I32Const(-1));
                        f.instruction(&Instruction::I32Xor);
                    }
                    UnaryOp::LogicNot => {
                        f.instruction(&Instruction::I32Eqz);
                    }
                }
            }
            BehavExpr::Ternary {
                cond,
                then_val,
                else_val,
            } => {
                self.emit_expr(f, def, base, cond)?;
                f.instruction(&Instruction::If(BlockType::Result(ValType::I32)));
                self.emit_expr(f, def, base, then_val)?;
                f.instruction(&Instruction::Else);
                self.emit_expr(f, def, base, else_val)?;
                f.instruction(&Instruction::End);
            }
            BehavExpr::Index { expr, index } => {
                self.emit_expr(f, def, base, expr)?;
                self.emit_expr(f, def, base, index)?;
                f.instruction(&Instruction::I32ShrU);
                f.instruction(&Instruction::I32Const(1));
                f.instruction(&Instruction::I32And);
            }
            BehavExpr::Slice { expr, hi, lo } => {
                self.emit_expr(f, def, base, expr)?;
                if *lo != 0 {
                    f.instruction(&Instruction::I32Const(*lo as i32));
                    f.instruction(&Instruction::I32ShrU);
                }
                f.instruction(&Instruction::I32Const(width_mask(hi - lo + 1) as i32));
                f.instruction(&Instruction::I32And);
            }
            BehavExpr::Concat(parts) => {
                if parts.is_empty() {
                    f.instruction(&Instruction::I32Const(0));
                    return Ok(());
                }
                let mut pos = 0u32;
                for (idx, (part, width)) in parts.iter().enumerate() {
                    self.emit_expr(f, def, base, part)?;
                    f.instruction(&Instruction::I32Const(width_mask(*width) as i32));
                    f.instruction(&Instruction::I32And);
                    if pos != 0 {
                        f.instruction(&Instruction::I32Const(pos as i32));
                        f.instruction(&Instruction::I32Shl);
                    }
                    if idx != 0 {
                        f.instruction(&Instruction::I32Or);
                    }
                    pos += width;
                }
            }
            BehavExpr::Call { def: callee_id, args, output } => {
                let callee = &self.netlist.behavioral_defs[callee_id.as_raw() as usize];
                let cbase = self.frames[callee_id.as_raw() as usize];
                if args.len() != callee.inputs.len() {
                    return Err(EmitError::InvalidEncoding(format!(
                        "call to `{}` has {} argument(s), expected {}",
                        callee.name,
                        args.len(),
                        callee.inputs.len()
                    )));
                }
                // All arguments evaluate onto the stack before any
                // parameter local is written.
                for arg in args {
                    self.emit_expr(f, def, base, arg)?;
                }
                for i in (0..args.len()).rev() {
                    let width = callee.inputs[i].width;
                    if width < 32 {
                        f.instruction(&Instruction::I32Const(width_mask(width) as i32));
                        f.instruction(&Instruction::I32And);
                    }
                    f.instruction(&Instruction::LocalSet(cbase + i as u32));
                }
                self.zero_frame_tail(f, callee, cbase);
                self.emit_stmts(f, callee, cbase, &callee.body)?;
                f.instruction(&Instruction::LocalGet(cbase + callee.output_slot(*output)));
            }
        }
        Ok(())
    }
}

fn binary_instr(op: BinaryOp) -> Instruction<'static> {
    match op {
        BinaryOp::Add => Instruction::I32Add,
        BinaryOp::Sub => Instruction::I32Sub,
        BinaryOp::Mul => Instruction::I32Mul,
        BinaryOp::And => Instruction::I32And,
        BinaryOp::Or => Instruction::I32Or,
        BinaryOp::Xor => Instruction::I32Xor,
        BinaryOp::Shl => Instruction::I32Shl,
        BinaryOp::Shr => Instruction::I32ShrU,
        BinaryOp::Eq => Instruction::I32Eq,
        BinaryOp::Ne => Instruction::I32Ne,
        BinaryOp::Lt => Instruction::I32LtU,
        BinaryOp::Gt => Instruction::I32GtU,
        BinaryOp::Le => Instruction::I32LeU,
        BinaryOp::Ge => Instruction::I32GeU,
        BinaryOp::Div | BinaryOp::Mod => unreachable!("guarded at the call site"),
    }
}
