use std::collections::{HashMap, HashSet};

use cfgir::{cfg_loop::LoopPtr, dominator::DomTree, program::LlvmProgram};
use llvm::{LlvmInstr, LlvmInstrVariant, LlvmTemp};
use utils::{Result, UseTemp};

use super::SimpleLicm;
use crate::{loop_walk::LoopForestWalker, IrOptimizer};

// Register-to-register and repeatable: no phi (kept apart anyway), no
// terminator, no memory traffic, no calls.
fn is_safe_reg_to_reg(instr: &LlvmInstr) -> bool {
	!instr.has_sideeffect()
		&& matches!(
			instr.get_variant(),
			LlvmInstrVariant::ArithInstr(_)
				| LlvmInstrVariant::CompInstr(_)
				| LlvmInstrVariant::ConvertInstr(_)
				| LlvmInstrVariant::GEPInstr(_)
				| LlvmInstrVariant::SelectInstr(_)
		)
}

fn operands_invariant(
	instr: &LlvmInstr,
	inside: &HashSet<LlvmTemp>,
	confirmed: &HashSet<LlvmTemp>,
) -> bool {
	instr
		.get_read()
		.iter()
		.all(|temp| !inside.contains(temp) || confirmed.contains(temp))
}

fn hoist_loop(loop_: &LoopPtr) -> bool {
	let Some(preheader) = loop_.borrow().get_loop_preheader() else {
		log::debug!(
			"loop {}: no preheader, nothing hoisted",
			loop_.borrow().header.borrow().id
		);
		return false;
	};
	let blocks = loop_.borrow().blocks.clone();
	// every temp written anywhere in the loop, phis included
	let mut inside: HashSet<LlvmTemp> = HashSet::new();
	let mut loop_defs: HashMap<LlvmTemp, LlvmInstr> = HashMap::new();
	for node in blocks.iter() {
		let bb = node.borrow();
		inside.extend(bb.phi_instrs.iter().map(|v| v.target.clone()));
		for instr in bb.instrs.iter() {
			if let Some(temp) = instr.get_write() {
				inside.insert(temp.clone());
				loop_defs.insert(temp, instr.clone());
			}
		}
	}
	let mut confirmed: HashSet<LlvmTemp> = HashSet::new();
	let mut queue: Vec<LlvmTemp> = Vec::new();
	for node in blocks.iter() {
		for instr in node.borrow().instrs.iter() {
			if is_safe_reg_to_reg(instr)
				&& operands_invariant(instr, &inside, &confirmed)
			{
				if let Some(temp) = instr.get_write() {
					queue.push(temp);
				}
			}
		}
	}
	// grow to a fixed point: confirming one temp may satisfy the operand
	// condition of others, so rescan after every confirmation
	while let Some(temp) = queue.pop() {
		if confirmed.contains(&temp) {
			continue;
		}
		let Some(instr) = loop_defs.get(&temp) else {
			continue;
		};
		if !is_safe_reg_to_reg(instr)
			|| !operands_invariant(instr, &inside, &confirmed)
		{
			continue;
		}
		confirmed.insert(temp);
		for node in blocks.iter() {
			for instr in node.borrow().instrs.iter() {
				let Some(target) = instr.get_write() else {
					continue;
				};
				if !confirmed.contains(&target)
					&& is_safe_reg_to_reg(instr)
					&& operands_invariant(instr, &inside, &confirmed)
				{
					queue.push(target);
				}
			}
		}
	}
	if confirmed.is_empty() {
		return false;
	}
	// detach in block order and append before the preheader terminator,
	// which lives apart in jump_instr
	let mut hoisted: Vec<LlvmInstr> = Vec::new();
	for node in blocks.iter() {
		let instrs = std::mem::take(&mut node.borrow_mut().instrs);
		let (moved, kept): (Vec<_>, Vec<_>) = instrs.into_iter().partition(
			|v| v.get_write().map_or(false, |t| confirmed.contains(&t)),
		);
		hoisted.extend(moved);
		node.borrow_mut().instrs = kept;
	}
	log::debug!(
		"loop {}: hoisted {} instructions into block {}",
		loop_.borrow().header.borrow().id,
		hoisted.len(),
		preheader.borrow().id
	);
	let changed = !hoisted.is_empty();
	preheader.borrow_mut().instrs.extend(hoisted);
	changed
}

impl IrOptimizer for SimpleLicm {
	fn new() -> Self {
		Self {}
	}
	fn name(&self) -> &'static str {
		"simple-licm"
	}
	fn apply(self, program: &mut LlvmProgram) -> Result<bool> {
		let mut changed = false;
		for func in program.funcs.iter() {
			let dom = DomTree::new(&func.cfg);
			let analysis = func.cfg.loop_analysis(&dom);
			for loop_ in LoopForestWalker::two_level(&analysis.top_loops) {
				changed |= hoist_loop(&loop_);
			}
		}
		Ok(changed)
	}
}
