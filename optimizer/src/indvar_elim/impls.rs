use std::collections::HashMap;

use cfgir::{
	cfg_loop::LoopPtr, dominator::DomTree, func::LlvmFunc,
	program::LlvmProgram, LlvmNode,
};
use llvm::{
	ArithOp, LlvmInstr, LlvmInstrTrait, LlvmInstrVariant, LlvmTemp,
	LlvmTempManager, Value,
};
use utils::{Result, UseTemp};

use super::{scev::ScevSolver, DerivedIvElim};
use crate::{loop_walk::LoopForestWalker, IrOptimizer};

struct Candidate {
	temp: LlvmTemp,
	base: Value,
	step: i32,
	staged: Vec<LlvmInstr>,
}

fn build_defs(func: &LlvmFunc) -> HashMap<LlvmTemp, (LlvmInstr, i32)> {
	let mut defs = HashMap::new();
	for bb in func.cfg.blocks.iter() {
		let bb = bb.borrow();
		for phi in bb.phi_instrs.iter() {
			let instr: LlvmInstr = Box::new(phi.clone());
			defs.insert(phi.target.clone(), (instr, bb.id));
		}
		for instr in bb.instrs.iter() {
			if let Some(temp) = instr.get_write() {
				defs.insert(temp, (instr.clone(), bb.id));
			}
		}
	}
	defs
}

// The canonical counter is the first integer header phi that is a
// recurrence of this very loop with a nonzero constant step. Phi order is
// part of the block, so the choice is deterministic.
fn find_canonical_counter(
	loop_: &LoopPtr,
	solver: &mut ScevSolver,
) -> Option<(LlvmTemp, Value, i32)> {
	let header = loop_.borrow().header.clone();
	let phis = header.borrow().phi_instrs.clone();
	for phi in phis.iter() {
		if !phi.target.var_type.is_int() {
			continue;
		}
		let Some(evo) = solver.classify_temp(&phi.target) else {
			continue;
		};
		if let Some((base, step)) = evo.rec_of(loop_) {
			if step != 0 {
				return Some((phi.target.clone(), base.clone(), step));
			}
		}
	}
	None
}

fn collect_candidates(
	loop_: &LoopPtr,
	solver: &mut ScevSolver,
	counter: &LlvmTemp,
) -> Vec<Candidate> {
	let mut candidates = Vec::new();
	let blocks = loop_.borrow().blocks.clone();
	for node in blocks.iter() {
		let bb = node.borrow();
		let targets: Vec<LlvmTemp> = bb
			.phi_instrs
			.iter()
			.map(|v| v.target.clone())
			.chain(bb.instrs.iter().filter_map(|v| v.get_write()))
			.collect();
		drop(bb);
		for target in targets {
			if !target.var_type.is_int() || target == *counter {
				continue;
			}
			solver.staged.clear();
			solver.reuse.clear();
			let Some(evo) = solver.classify_temp(&target) else {
				continue;
			};
			if let Some((base, step)) = evo.rec_of(loop_) {
				candidates.push(Candidate {
					temp: target,
					base: base.clone(),
					step,
					staged: solver.take_staged(),
				});
			}
		}
	}
	candidates
}

// new = base(I) + (counter - base(counter)) * scale
fn synthesize(
	solver: &mut ScevSolver,
	candidate: &Candidate,
	counter: &LlvmTemp,
	counter_base: &Value,
	scale: i32,
) -> Option<Value> {
	if scale == 0 {
		return Some(candidate.base.clone());
	}
	let diff = solver.fold(
		Value::Temp(counter.clone()),
		ArithOp::Sub,
		counter_base.clone(),
	)?;
	let scaled = solver.fold(diff, ArithOp::Mul, Value::Int(scale))?;
	solver.fold(candidate.base.clone(), ArithOp::Add, scaled)
}

// The replacement is defined at the front of the header, so every use must
// sit in a block the header dominates. Phi uses count at the incoming block.
fn uses_dominated(
	func: &LlvmFunc,
	dom: &DomTree,
	header_id: i32,
	temp: &LlvmTemp,
) -> bool {
	for node in func.cfg.blocks.iter() {
		let bb = node.borrow();
		for phi in bb.phi_instrs.iter() {
			for (value, label) in phi.source.iter() {
				if value.unwrap_temp().is_some_and(|v| v == *temp)
					&& !dom.dominates_block(header_id, label.block_id())
				{
					return false;
				}
			}
		}
		let reads_here = bb
			.instrs
			.iter()
			.chain(bb.jump_instr.iter())
			.any(|v| v.get_read().contains(temp));
		if reads_here && !dom.dominates_block(header_id, bb.id) {
			return false;
		}
	}
	true
}

fn replace_uses(func: &LlvmFunc, temp: &LlvmTemp, value: &Value) {
	let map = HashMap::from([(temp.clone(), value.clone())]);
	for node in func.cfg.blocks.iter() {
		let mut bb = node.borrow_mut();
		for phi in bb.phi_instrs.iter_mut() {
			phi.map_temp(&map);
		}
		for instr in bb.instrs.iter_mut() {
			instr.map_temp(&map);
		}
		if let Some(jump) = bb.jump_instr.as_mut() {
			jump.map_temp(&map);
		}
	}
}

fn erase_if_unused(
	func: &LlvmFunc,
	temp: &LlvmTemp,
	pending: &[LlvmInstr],
) -> bool {
	if pending.iter().any(|v| v.get_read().contains(temp)) {
		return false;
	}
	if func.cfg.blocks.iter().any(|v| v.borrow().reads_temp(temp)) {
		return false;
	}
	for node in func.cfg.blocks.iter() {
		let mut bb = node.borrow_mut();
		bb.phi_instrs.retain(|v| v.target != *temp);
		bb.instrs.retain(|v| v.get_write().map_or(true, |t| t != *temp));
	}
	true
}

// A use inside the header's own instruction stream constrains where a
// reused definition may sit; reuse from the header is only offered when the
// candidate has no such use.
fn header_reads(header: &LlvmNode, temp: &LlvmTemp) -> bool {
	let bb = header.borrow();
	bb.instrs
		.iter()
		.chain(bb.jump_instr.iter())
		.any(|v| v.get_read().contains(temp))
}

fn header_reuse_entries(
	header: &LlvmNode,
) -> Vec<(ArithOp, Value, Value, LlvmTemp)> {
	header
		.borrow()
		.instrs
		.iter()
		.filter_map(|v| match v.get_variant() {
			LlvmInstrVariant::ArithInstr(arith) => Some((
				arith.op,
				arith.lhs.clone(),
				arith.rhs.clone(),
				arith.target.clone(),
			)),
			_ => None,
		})
		.collect()
}

// True when the candidate's existing definition is already the instruction
// synthesis would insert, so rewriting would only churn names.
fn already_in_shape(
	defs: &HashMap<LlvmTemp, (LlvmInstr, i32)>,
	candidate: &LlvmTemp,
	solver: &ScevSolver,
	new_value: &Value,
) -> bool {
	let Value::Temp(new_temp) = new_value else {
		return false;
	};
	let Some((def, _)) = defs.get(candidate) else {
		return false;
	};
	let LlvmInstrVariant::ArithInstr(old) = def.get_variant() else {
		return false;
	};
	solver.staged.iter().any(|v| match v.get_variant() {
		LlvmInstrVariant::ArithInstr(new) => {
			new.target == *new_temp
				&& new.op == old.op
				&& new.lhs == old.lhs
				&& new.rhs == old.rhs
		}
		_ => false,
	})
}

fn optimize_loop(
	func: &LlvmFunc,
	loop_: &LoopPtr,
	loop_map: &HashMap<i32, LoopPtr>,
	dom: &DomTree,
	temp_mgr: &mut LlvmTempManager,
) -> bool {
	let defs = build_defs(func);
	let mut solver = ScevSolver::new(loop_, loop_map, &defs, temp_mgr);
	let Some((counter, counter_base, counter_step)) =
		find_canonical_counter(loop_, &mut solver)
	else {
		return false;
	};
	let candidates = collect_candidates(loop_, &mut solver, &counter);
	if candidates.is_empty() {
		return false;
	}
	let header = loop_.borrow().header.clone();
	// a header without a terminator leaves nowhere to insert before
	if header.borrow().jump_instr.is_none() {
		return false;
	}
	let header_id = header.borrow().id;
	let mut pending: Vec<LlvmInstr> = Vec::new();
	let mut pending_reuse: Vec<(ArithOp, Value, Value, LlvmTemp)> = Vec::new();
	let mut rewritten = 0;
	let mut erased = 0;
	let mut in_shape: Vec<LlvmTemp> = Vec::new();
	for candidate in candidates {
		// an earlier rewrite in this run may have taken the last use
		if erase_if_unused(func, &candidate.temp, &pending) {
			erased += 1;
			continue;
		}
		let scale = if candidate.step == 0 {
			0
		} else {
			match (
				candidate.step.checked_rem(counter_step),
				candidate.step.checked_div(counter_step),
			) {
				(Some(0), Some(scale)) => scale,
				_ => continue,
			}
		};
		solver.staged.clear();
		solver.reuse = pending_reuse.clone();
		if !header_reads(&header, &candidate.temp) {
			solver.reuse.extend(header_reuse_entries(&header));
		}
		let Some(new_value) =
			synthesize(&mut solver, &candidate, &counter, &counter_base, scale)
		else {
			continue;
		};
		if new_value == Value::Temp(candidate.temp.clone()) {
			continue;
		}
		if already_in_shape(&defs, &candidate.temp, &solver, &new_value) {
			in_shape.push(candidate.temp.clone());
			continue;
		}
		if !uses_dominated(func, dom, header_id, &candidate.temp) {
			continue;
		}
		for instr in candidate.staged.iter().chain(solver.staged.iter()) {
			if let LlvmInstrVariant::ArithInstr(arith) = instr.get_variant() {
				pending_reuse.push((
					arith.op,
					arith.lhs.clone(),
					arith.rhs.clone(),
					arith.target.clone(),
				));
			}
		}
		pending.extend(candidate.staged);
		pending.extend(solver.take_staged());
		replace_uses(func, &candidate.temp, &new_value);
		erase_if_unused(func, &candidate.temp, &pending);
		rewritten += 1;
	}
	// a candidate kept in its existing shape may lose its last use to a
	// later rewrite; sweep such defs now instead of leaving them for the
	// next run
	loop {
		let before = in_shape.len();
		in_shape.retain(|temp| !erase_if_unused(func, temp, &pending));
		erased += before - in_shape.len();
		if in_shape.len() == before {
			break;
		}
	}
	if rewritten > 0 {
		log::debug!(
			"loop {}: rewrote {} derived induction variables",
			header_id,
			rewritten
		);
		header.borrow_mut().instrs.splice(0..0, pending);
	}
	rewritten + erased > 0
}

impl IrOptimizer for DerivedIvElim {
	fn new() -> Self {
		Self {}
	}
	fn name(&self) -> &'static str {
		"derived-iv-elim"
	}
	fn apply(self, program: &mut LlvmProgram) -> Result<bool> {
		let mut changed = false;
		for func in program.funcs.iter() {
			let dom = DomTree::new(&func.cfg);
			let analysis = func.cfg.loop_analysis(&dom);
			for loop_ in LoopForestWalker::innermost(&analysis.top_loops) {
				changed |= optimize_loop(
					func,
					&loop_,
					&analysis.loop_map,
					&dom,
					&mut program.temp_mgr,
				);
			}
		}
		Ok(changed)
	}
}
