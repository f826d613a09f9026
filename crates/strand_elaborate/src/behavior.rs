//! Behavioral lowering: `@behavior` bodies to the slot-based IR.
//!
//! Each behavioral definition is lowered exactly once and shared by all of
//! its instances. Lowering resolves names to variable slots (inputs, then
//! outputs, then `let` locals), checks widths, resolves cross-module calls
//! to definition ids, and sanitises names for emission.
//!
//! The cross-module call graph must be a DAG; [`check_call_graph`] runs an
//! SCC pass over the whole design before elaboration starts.

use crate::error::ElabError;
use crate::Elaborator;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use strand_common::sanitize_ident;
use strand_hdl::{
    BehaviorBlock, BehaviorExpr, BehaviorStmt, Design, Direction, Lhs, ModuleBody, ModuleDef,
    Pattern,
};
use strand_ir::{
    Arena, BehavDefId, BehavExpr, BehavLhs, BehavModule, BehavPattern, BehavStmt, BehavVar,
    VarSlot,
};

/// Verifies that the behavioral call graph of `design` is a DAG.
///
/// Runs over every behavioral module in the design, not just those
/// reachable from the top, so a latent cycle fails fast.
pub(crate) fn check_call_graph(design: &Design) -> Result<(), ElabError> {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();

    for module in &design.modules {
        if module.is_behavioral() {
            index.insert(&module.name, graph.add_node(&module.name));
        }
    }
    for module in &design.modules {
        let ModuleBody::Behavioral(block) = &module.body else {
            continue;
        };
        let mut callees = Vec::new();
        collect_calls_stmts(&block.stmts, &mut callees);
        for callee in callees {
            // Unknown targets fail later during lowering with a better
            // message; only known behavioral modules form graph edges.
            if let Some(&to) = index.get(callee.as_str()) {
                graph.add_edge(index[module.name.as_str()], to, ());
            }
        }
    }

    for scc in tarjan_scc(&graph) {
        if scc.len() > 1 {
            let mut path: Vec<String> = scc.iter().map(|&n| graph[n].to_string()).collect();
            path.push(path[0].clone());
            return Err(ElabError::CyclicBehavioralCall { path });
        }
        let node = scc[0];
        if graph.find_edge(node, node).is_some() {
            let name = graph[node].to_string();
            return Err(ElabError::CyclicBehavioralCall {
                path: vec![name.clone(), name],
            });
        }
    }
    Ok(())
}

fn collect_calls_stmts(stmts: &[BehaviorStmt], out: &mut Vec<String>) {
    for stmt in stmts {
        match stmt {
            BehaviorStmt::Let { value, .. } => collect_calls_expr(value, out),
            BehaviorStmt::Assign { lhs, value } => {
                if let Lhs::BitIndex(_, index) = lhs {
                    collect_calls_expr(index, out);
                }
                collect_calls_expr(value, out);
            }
            BehaviorStmt::If {
                cond,
                then_body,
                else_body,
            } => {
                collect_calls_expr(cond, out);
                collect_calls_stmts(then_body, out);
                if let Some(else_body) = else_body {
                    collect_calls_stmts(else_body, out);
                }
            }
            BehaviorStmt::Match { subject, arms } => {
                collect_calls_expr(subject, out);
                for arm in arms {
                    collect_calls_stmts(&arm.body, out);
                }
            }
        }
    }
}

fn collect_calls_expr(expr: &BehaviorExpr, out: &mut Vec<String>) {
    match expr {
        BehaviorExpr::Number(_) | BehaviorExpr::Ident(_) => {}
        BehaviorExpr::Binary { lhs, rhs, .. } => {
            collect_calls_expr(lhs, out);
            collect_calls_expr(rhs, out);
        }
        BehaviorExpr::Unary { operand, .. } => collect_calls_expr(operand, out),
        BehaviorExpr::Ternary {
            cond,
            then_val,
            else_val,
        } => {
            collect_calls_expr(cond, out);
            collect_calls_expr(then_val, out);
            collect_calls_expr(else_val, out);
        }
        BehaviorExpr::Index { expr, index } => {
            collect_calls_expr(expr, out);
            collect_calls_expr(index, out);
        }
        BehaviorExpr::Slice { expr, .. } => collect_calls_expr(expr, out),
        BehaviorExpr::Concat(parts) => {
            for part in parts {
                collect_calls_expr(part, out);
            }
        }
        BehaviorExpr::Call { module, args, .. } => {
            out.push(module.clone());
            for arg in args {
                collect_calls_expr(arg, out);
            }
        }
    }
}

impl Elaborator<'_> {
    /// Returns the lowered definition id for behavioral module `name`,
    /// lowering it (and its callees) on first use.
    pub(crate) fn lowered_def(&mut self, name: &str) -> Result<BehavDefId, ElabError> {
        if let Some(&id) = self.behav_ids.get(name) {
            return Ok(id);
        }
        let design = self.design;
        let def = design
            .module(name)
            .ok_or_else(|| ElabError::UndefinedModule(name.to_string()))?;
        let ModuleBody::Behavioral(block) = &def.body else {
            return Err(ElabError::Behavior {
                module: name.to_string(),
                reason: "call target is not a behavioral module".to_string(),
            });
        };

        // Callees lower first; the DAG check guarantees termination.
        let mut callees = Vec::new();
        collect_calls_stmts(&block.stmts, &mut callees);
        for callee in &callees {
            if callee != name {
                self.lowered_def(callee)?;
            }
        }

        let module =
            lower_module(def, block, &self.behav_defs, &self.behav_ids).map_err(|reason| {
                ElabError::Behavior {
                    module: name.to_string(),
                    reason,
                }
            })?;
        let id = self.behav_defs.alloc(module);
        self.behav_ids.insert(name.to_string(), id);
        Ok(id)
    }
}

struct LowerCtx<'d> {
    defs: &'d Arena<BehavDefId, BehavModule>,
    def_ids: &'d HashMap<String, BehavDefId>,
    vars: Vec<BehavVar>,
    scopes: Vec<HashMap<String, VarSlot>>,
    n_inputs: usize,
    n_outputs: usize,
}

fn lower_module(
    def: &ModuleDef,
    block: &BehaviorBlock,
    defs: &Arena<BehavDefId, BehavModule>,
    def_ids: &HashMap<String, BehavDefId>,
) -> Result<BehavModule, String> {
    let mut ctx = LowerCtx {
        defs,
        def_ids,
        vars: Vec::new(),
        scopes: vec![HashMap::new()],
        n_inputs: 0,
        n_outputs: 0,
    };

    for port in def.ports.iter().filter(|p| p.dir == Direction::Input) {
        ctx.declare(&port.name, port.width)?;
        ctx.n_inputs += 1;
    }
    for port in def.ports.iter().filter(|p| p.dir == Direction::Output) {
        ctx.declare(&port.name, port.width)?;
        ctx.n_outputs += 1;
    }

    let body = ctx.lower_stmts(&block.stmts)?;

    // Sanitise slot names; clashes take the slot index as suffix.
    let mut seen: HashMap<String, VarSlot> = HashMap::new();
    for (slot, var) in ctx.vars.iter_mut().enumerate() {
        let mut clean = sanitize_ident(&var.name);
        if seen.contains_key(&clean) {
            clean = format!("{clean}_{slot}");
        }
        seen.insert(clean.clone(), slot as VarSlot);
        var.name = clean;
    }

    let mut vars = ctx.vars.into_iter();
    let inputs: Vec<BehavVar> = vars.by_ref().take(ctx.n_inputs).collect();
    let outputs: Vec<BehavVar> = vars.by_ref().take(ctx.n_outputs).collect();
    let locals: Vec<BehavVar> = vars.collect();

    Ok(BehavModule {
        name: sanitize_ident(&def.name),
        inputs,
        outputs,
        locals,
        body,
    })
}

impl LowerCtx<'_> {
    fn declare(&mut self, name: &str, width: u32) -> Result<VarSlot, String> {
        if width == 0 || width > 32 {
            return Err(format!("width {width} of `{name}` is out of range (1..=32)"));
        }
        let scope = self.scopes.last_mut().expect("scope stack never empty");
        if scope.contains_key(name) {
            return Err(format!("`{name}` is declared twice in the same scope"));
        }
        let slot = self.vars.len() as VarSlot;
        self.vars.push(BehavVar {
            name: name.to_string(),
            width,
        });
        scope.insert(name.to_string(), slot);
        Ok(slot)
    }

    fn lookup(&self, name: &str) -> Option<VarSlot> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    fn width_of(&self, slot: VarSlot) -> u32 {
        self.vars[slot as usize].width
    }

    fn lower_scoped(&mut self, stmts: &[BehaviorStmt]) -> Result<Vec<BehavStmt>, String> {
        self.scopes.push(HashMap::new());
        let result = self.lower_stmts(stmts);
        self.scopes.pop();
        result
    }

    fn lower_stmts(&mut self, stmts: &[BehaviorStmt]) -> Result<Vec<BehavStmt>, String> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            out.push(self.lower_stmt(stmt)?);
        }
        Ok(out)
    }

    fn lower_stmt(&mut self, stmt: &BehaviorStmt) -> Result<BehavStmt, String> {
        match stmt {
            BehaviorStmt::Let { name, width, value } => {
                // The initialiser sees the outer scope, not the new name.
                let value = self.lower_expr(value)?;
                let slot = self.declare(name, *width)?;
                Ok(BehavStmt::Let { slot, value })
            }
            BehaviorStmt::Assign { lhs, value } => {
                let value = self.lower_expr(value)?;
                let lhs = self.lower_lhs(lhs)?;
                Ok(BehavStmt::Assign { lhs, value })
            }
            BehaviorStmt::If {
                cond,
                then_body,
                else_body,
            } => Ok(BehavStmt::If {
                cond: self.lower_expr(cond)?,
                then_body: self.lower_scoped(then_body)?,
                else_body: match else_body {
                    Some(stmts) => self.lower_scoped(stmts)?,
                    None => Vec::new(),
                },
            }),
            BehaviorStmt::Match { subject, arms } => {
                let subject = self.lower_expr(subject)?;
                let mut lowered = Vec::with_capacity(arms.len());
                for arm in arms {
                    let pattern = match arm.pattern {
                        Pattern::Number(n) => BehavPattern::Number(n as u32),
                        Pattern::Range(lo, hi) => {
                            if lo > hi {
                                return Err(format!("empty match range {lo}..={hi}"));
                            }
                            BehavPattern::Range(lo as u32, hi as u32)
                        }
                        Pattern::Wildcard => BehavPattern::Wildcard,
                    };
                    lowered.push((pattern, self.lower_scoped(&arm.body)?));
                }
                Ok(BehavStmt::Match {
                    subject,
                    arms: lowered,
                })
            }
        }
    }

    fn lower_lhs(&mut self, lhs: &Lhs) -> Result<BehavLhs, String> {
        let slot = self
            .lookup(lhs.name())
            .ok_or_else(|| format!("unknown variable `{}`", lhs.name()))?;
        if (slot as usize) < self.n_inputs {
            return Err(format!("cannot assign to input `{}`", lhs.name()));
        }
        match lhs {
            Lhs::Name(_) => Ok(BehavLhs::Var(slot)),
            Lhs::BitIndex(_, index) => Ok(BehavLhs::BitIndex(slot, self.lower_expr(index)?)),
            Lhs::Slice(name, hi, lo) => {
                let width = self.width_of(slot);
                if hi < lo || *hi >= width {
                    return Err(format!(
                        "slice [{hi}:{lo}] out of range for `{name}` ({width} bit(s))"
                    ));
                }
                Ok(BehavLhs::Slice(slot, *hi, *lo))
            }
        }
    }

    fn lower_expr(&mut self, expr: &BehaviorExpr) -> Result<BehavExpr, String> {
        match expr {
            BehaviorExpr::Number(n) => Ok(BehavExpr::Const(*n as u32)),
            BehaviorExpr::Ident(name) => {
                let slot = self
                    .lookup(name)
                    .ok_or_else(|| format!("unknown variable `{name}`"))?;
                Ok(BehavExpr::Var(slot))
            }
            BehaviorExpr::Binary { op, lhs, rhs } => Ok(BehavExpr::Binary {
                op: *op,
                lhs: Box::new(self.lower_expr(lhs)?),
                rhs: Box::new(self.lower_expr(rhs)?),
            }),
            BehaviorExpr::Unary { op, operand } => Ok(BehavExpr::Unary {
                op: *op,
                operand: Box::new(self.lower_expr(operand)?),
            }),
            BehaviorExpr::Ternary {
                cond,
                then_val,
                else_val,
            } => Ok(BehavExpr::Ternary {
                cond: Box::new(self.lower_expr(cond)?),
                then_val: Box::new(self.lower_expr(then_val)?),
                else_val: Box::new(self.lower_expr(else_val)?),
            }),
            BehaviorExpr::Index { expr, index } => Ok(BehavExpr::Index {
                expr: Box::new(self.lower_expr(expr)?),
                index: Box::new(self.lower_expr(index)?),
            }),
            BehaviorExpr::Slice { expr, hi, lo } => {
                if hi < lo || *hi >= 32 {
                    return Err(format!("slice [{hi}:{lo}] bounds are invalid"));
                }
                Ok(BehavExpr::Slice {
                    expr: Box::new(self.lower_expr(expr)?),
                    hi: *hi,
                    lo: *lo,
                })
            }
            BehaviorExpr::Concat(parts) => {
                let mut lowered = Vec::with_capacity(parts.len());
                for part in parts {
                    let width = self.infer_width(part).ok_or_else(|| {
                        "cannot infer the width of a concat element; use a slice or identifier"
                            .to_string()
                    })?;
                    lowered.push((self.lower_expr(part)?, width));
                }
                let total: u32 = lowered.iter().map(|(_, w)| w).sum();
                if total > 32 {
                    return Err(format!("concat is {total} bits wide; the limit is 32"));
                }
                Ok(BehavExpr::Concat(lowered))
            }
            BehaviorExpr::Call {
                module,
                args,
                output,
            } => {
                let def_id = self.def_ids.get(module).copied().ok_or_else(|| {
                    format!("call target `{module}` is not a behavioral module")
                })?;
                let callee = &self.defs[def_id];
                if args.len() != callee.inputs.len() {
                    return Err(format!(
                        "`{module}` takes {} argument(s), got {}",
                        callee.inputs.len(),
                        args.len()
                    ));
                }
                let output_idx = match output {
                    None => {
                        if callee.outputs.len() != 1 {
                            return Err(format!(
                                "`{module}` has {} outputs; select one by name",
                                callee.outputs.len()
                            ));
                        }
                        0
                    }
                    Some(name) => callee
                        .output_index(name)
                        .ok_or_else(|| format!("`{module}` has no output named `{name}`"))?,
                };
                let args = args
                    .iter()
                    .map(|arg| self.lower_expr(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(BehavExpr::Call {
                    def: def_id,
                    args,
                    output: output_idx,
                })
            }
        }
    }

    /// Infers the natural width of an expression, where one exists.
    ///
    /// Used for concat elements, whose contribution must be fixed at
    /// lowering time. Bare numbers have no natural width.
    fn infer_width(&self, expr: &BehaviorExpr) -> Option<u32> {
        match expr {
            BehaviorExpr::Number(_) => None,
            BehaviorExpr::Ident(name) => self.lookup(name).map(|slot| self.width_of(slot)),
            BehaviorExpr::Index { .. } => Some(1),
            BehaviorExpr::Slice { hi, lo, .. } => Some(hi - lo + 1),
            BehaviorExpr::Concat(parts) => {
                parts.iter().map(|p| self.infer_width(p)).sum::<Option<u32>>()
            }
            BehaviorExpr::Unary { operand, .. } => self.infer_width(operand),
            BehaviorExpr::Binary { op, lhs, rhs } => {
                use strand_hdl::BinaryOp::*;
                match op {
                    Eq | Ne | Lt | Gt | Le | Ge => Some(1),
                    _ => {
                        let l = self.infer_width(lhs)?;
                        let r = self.infer_width(rhs)?;
                        Some(l.max(r))
                    }
                }
            }
            BehaviorExpr::Ternary {
                then_val, else_val, ..
            } => {
                let t = self.infer_width(then_val)?;
                let e = self.infer_width(else_val)?;
                Some(t.max(e))
            }
            BehaviorExpr::Call { module, output, .. } => {
                let def_id = self.def_ids.get(module)?;
                let callee = &self.defs[*def_id];
                let idx = match output {
                    None if callee.outputs.len() == 1 => 0,
                    None => return None,
                    Some(name) => callee.output_index(name)?,
                };
                Some(callee.outputs[idx as usize].width)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elaborate;
    use strand_diagnostics::DiagnosticSink;
    use strand_hdl::{BinaryOp, MatchArm, PortDecl};
    use strand_source::Span;

    fn port(name: &str, dir: Direction, width: u32) -> PortDecl {
        PortDecl {
            name: name.into(),
            dir,
            width,
            span: Span::DUMMY,
        }
    }

    fn behavioral(name: &str, ports: Vec<PortDecl>, stmts: Vec<BehaviorStmt>) -> ModuleDef {
        ModuleDef {
            name: name.into(),
            ports,
            body: ModuleBody::Behavioral(BehaviorBlock {
                stmts,
                span: Span::DUMMY,
            }),
            span: Span::DUMMY,
        }
    }

    fn ident(name: &str) -> BehaviorExpr {
        BehaviorExpr::Ident(name.into())
    }

    fn assign(name: &str, value: BehaviorExpr) -> BehaviorStmt {
        BehaviorStmt::Assign {
            lhs: Lhs::Name(name.into()),
            value,
        }
    }

    fn adder_ports() -> Vec<PortDecl> {
        vec![
            port("a", Direction::Input, 8),
            port("b", Direction::Input, 8),
            port("sum", Direction::Output, 8),
        ]
    }

    #[test]
    fn slots_are_inputs_outputs_locals() {
        let design = Design {
            modules: vec![behavioral(
                "m",
                adder_ports(),
                vec![
                    BehaviorStmt::Let {
                        name: "t".into(),
                        width: 8,
                        value: ident("a"),
                    },
                    assign(
                        "sum",
                        BehaviorExpr::Binary {
                            op: BinaryOp::Add,
                            lhs: Box::new(ident("t")),
                            rhs: Box::new(ident("b")),
                        },
                    ),
                ],
            )],
        };
        let sink = DiagnosticSink::new();
        let netlist = elaborate(&design, "m", &sink).unwrap();
        let def = netlist.behavioral_defs.values().next().unwrap();
        assert_eq!(def.inputs.len(), 2);
        assert_eq!(def.outputs.len(), 1);
        assert_eq!(def.locals.len(), 1);
        assert_eq!(def.output_slot(0), 2);
        // The let reads slot 0 (input a)
        assert!(matches!(
            &def.body[0],
            BehavStmt::Let { slot: 3, value: BehavExpr::Var(0) }
        ));
    }

    #[test]
    fn assigning_an_input_fails() {
        let design = Design {
            modules: vec![behavioral(
                "m",
                adder_ports(),
                vec![assign("a", BehaviorExpr::Number(0))],
            )],
        };
        let sink = DiagnosticSink::new();
        let err = elaborate(&design, "m", &sink).unwrap_err();
        assert!(matches!(err, ElabError::Behavior { reason, .. }
            if reason.contains("cannot assign to input")));
    }

    #[test]
    fn unknown_variable_fails() {
        let design = Design {
            modules: vec![behavioral(
                "m",
                adder_ports(),
                vec![assign("sum", ident("c"))],
            )],
        };
        let sink = DiagnosticSink::new();
        let err = elaborate(&design, "m", &sink).unwrap_err();
        assert!(matches!(err, ElabError::Behavior { reason, .. }
            if reason.contains("unknown variable `c`")));
    }

    #[test]
    fn call_is_resolved_and_inlined_by_id() {
        let design = Design {
            modules: vec![
                behavioral(
                    "inc",
                    vec![
                        port("x", Direction::Input, 8),
                        port("y", Direction::Output, 8),
                    ],
                    vec![assign(
                        "y",
                        BehaviorExpr::Binary {
                            op: BinaryOp::Add,
                            lhs: Box::new(ident("x")),
                            rhs: Box::new(BehaviorExpr::Number(1)),
                        },
                    )],
                ),
                behavioral(
                    "twice",
                    vec![
                        port("x", Direction::Input, 8),
                        port("y", Direction::Output, 8),
                    ],
                    vec![assign(
                        "y",
                        BehaviorExpr::Call {
                            module: "inc".into(),
                            args: vec![BehaviorExpr::Call {
                                module: "inc".into(),
                                args: vec![ident("x")],
                                output: None,
                            }],
                            output: None,
                        },
                    )],
                ),
            ],
        };
        let sink = DiagnosticSink::new();
        let netlist = elaborate(&design, "twice", &sink).unwrap();
        // Both defs lowered; callee first.
        assert_eq!(netlist.behavioral_defs.len(), 2);
        let callee = &netlist.behavioral_defs[BehavDefId::from_raw(0)];
        assert_eq!(callee.name, "inc");
    }

    #[test]
    fn call_cycle_is_rejected() {
        let call = |target: &str| BehaviorExpr::Call {
            module: target.into(),
            args: vec![ident("x")],
            output: None,
        };
        let io = |_: &str| {
            vec![
                port("x", Direction::Input, 8),
                port("y", Direction::Output, 8),
            ]
        };
        let design = Design {
            modules: vec![
                behavioral("ping", io("ping"), vec![assign("y", call("pong"))]),
                behavioral("pong", io("pong"), vec![assign("y", call("ping"))]),
            ],
        };
        let sink = DiagnosticSink::new();
        let err = elaborate(&design, "ping", &sink).unwrap_err();
        match err {
            ElabError::CyclicBehavioralCall { path } => {
                assert!(path.contains(&"ping".to_string()));
                assert!(path.contains(&"pong".to_string()));
            }
            other => panic!("expected CyclicBehavioralCall, got {other}"),
        }
    }

    #[test]
    fn self_call_is_rejected() {
        let design = Design {
            modules: vec![behavioral(
                "rec",
                vec![
                    port("x", Direction::Input, 8),
                    port("y", Direction::Output, 8),
                ],
                vec![assign(
                    "y",
                    BehaviorExpr::Call {
                        module: "rec".into(),
                        args: vec![ident("x")],
                        output: None,
                    },
                )],
            )],
        };
        let sink = DiagnosticSink::new();
        assert!(matches!(
            elaborate(&design, "rec", &sink),
            Err(ElabError::CyclicBehavioralCall { .. })
        ));
    }

    #[test]
    fn match_arms_lower_in_order() {
        let design = Design {
            modules: vec![behavioral(
                "sel",
                vec![
                    port("op", Direction::Input, 2),
                    port("out", Direction::Output, 8),
                ],
                vec![BehaviorStmt::Match {
                    subject: ident("op"),
                    arms: vec![
                        MatchArm {
                            pattern: Pattern::Number(0),
                            body: vec![assign("out", BehaviorExpr::Number(10))],
                        },
                        MatchArm {
                            pattern: Pattern::Range(1, 2),
                            body: vec![assign("out", BehaviorExpr::Number(20))],
                        },
                        MatchArm {
                            pattern: Pattern::Wildcard,
                            body: vec![assign("out", BehaviorExpr::Number(30))],
                        },
                    ],
                }],
            )],
        };
        let sink = DiagnosticSink::new();
        let netlist = elaborate(&design, "sel", &sink).unwrap();
        let def = netlist.behavioral_defs.values().next().unwrap();
        let BehavStmt::Match { arms, .. } = &def.body[0] else {
            panic!("expected Match");
        };
        assert_eq!(arms.len(), 3);
        assert_eq!(arms[0].0, BehavPattern::Number(0));
        assert_eq!(arms[1].0, BehavPattern::Range(1, 2));
        assert_eq!(arms[2].0, BehavPattern::Wildcard);
    }

    #[test]
    fn concat_needs_inferable_widths() {
        let design = Design {
            modules: vec![behavioral(
                "c",
                vec![
                    port("a", Direction::Input, 4),
                    port("out", Direction::Output, 8),
                ],
                vec![assign(
                    "out",
                    BehaviorExpr::Concat(vec![ident("a"), BehaviorExpr::Number(3)]),
                )],
            )],
        };
        let sink = DiagnosticSink::new();
        let err = elaborate(&design, "c", &sink).unwrap_err();
        assert!(matches!(err, ElabError::Behavior { reason, .. }
            if reason.contains("cannot infer")));
    }

    #[test]
    fn sanitised_names_stay_unique() {
        let design = Design {
            modules: vec![behavioral(
                "m",
                vec![
                    port("a.b", Direction::Input, 4),
                    port("a[b", Direction::Input, 4),
                    port("out", Direction::Output, 4),
                ],
                vec![assign("out", ident("a.b"))],
            )],
        };
        let sink = DiagnosticSink::new();
        let netlist = elaborate(&design, "m", &sink).unwrap();
        let def = netlist.behavioral_defs.values().next().unwrap();
        assert_ne!(def.inputs[0].name, def.inputs[1].name);
    }
}
