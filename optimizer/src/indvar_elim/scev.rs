use std::{collections::HashMap, rc::Rc};

use cfgir::cfg_loop::LoopPtr;
use llvm::{
	ArithInstr, ArithOp, LlvmInstr, LlvmInstrVariant, LlvmTemp,
	LlvmTempManager, PhiInstr, Value, VarType,
};

// Affine evolution of an integer value with respect to the loops of a
// function. `Invariant` means the value never changes while the loop being
// classified against runs; `AddRec` means it changes by a constant step per
// iteration of `loop_`, starting from the loop-invariant `base`. Anything
// else is not affine and has no descriptor.
#[derive(Clone)]
pub enum AffineEvo {
	Invariant(Value),
	AddRec {
		loop_: LoopPtr,
		base: Value,
		step: i32,
	},
}

impl AffineEvo {
	pub fn rec_of(&self, loop_: &LoopPtr) -> Option<(&Value, i32)> {
		match self {
			Self::AddRec {
				loop_: rec_loop,
				base,
				step,
			} if Rc::ptr_eq(rec_loop, loop_) => Some((base, *step)),
			_ => None,
		}
	}
}

pub struct ScevSolver<'a> {
	cur_loop: &'a LoopPtr,
	loop_map: &'a HashMap<i32, LoopPtr>,
	// temp -> (defining instruction, id of its block), whole function
	defs: &'a HashMap<LlvmTemp, (LlvmInstr, i32)>,
	temp_mgr: &'a mut LlvmTempManager,
	// invariant instructions staged while folding; drained by the caller
	// and committed only when the value they feed is actually used
	pub staged: Vec<LlvmInstr>,
	// known (op, lhs, rhs) -> temp entries fold may reuse instead of
	// staging a duplicate; the caller decides what is safe to put here
	pub reuse: Vec<(ArithOp, Value, Value, LlvmTemp)>,
}

fn step_of(update: &ArithInstr, phi_target: &LlvmTemp) -> Option<i32> {
	let target = Value::Temp(phi_target.clone());
	match (update.op, &update.lhs, &update.rhs) {
		(ArithOp::Add, lhs, Value::Int(step)) if *lhs == target => Some(*step),
		(ArithOp::Add, Value::Int(step), rhs) if *rhs == target => Some(*step),
		(ArithOp::Sub, lhs, Value::Int(step)) if *lhs == target => {
			step.checked_neg()
		}
		_ => None,
	}
}

impl<'a> ScevSolver<'a> {
	pub fn new(
		cur_loop: &'a LoopPtr,
		loop_map: &'a HashMap<i32, LoopPtr>,
		defs: &'a HashMap<LlvmTemp, (LlvmInstr, i32)>,
		temp_mgr: &'a mut LlvmTempManager,
	) -> Self {
		Self {
			cur_loop,
			loop_map,
			defs,
			temp_mgr,
			staged: Vec::new(),
			reuse: Vec::new(),
		}
	}

	pub fn classify(&mut self, value: &Value) -> Option<AffineEvo> {
		match value {
			Value::Int(_) => Some(AffineEvo::Invariant(value.clone())),
			Value::Float(_) => None,
			Value::Temp(temp) => self.classify_temp(temp),
		}
	}

	pub fn classify_temp(&mut self, temp: &LlvmTemp) -> Option<AffineEvo> {
		let Some((instr, def_block)) = self.defs.get(temp).cloned() else {
			// parameters and globals are never written inside the function
			return Some(AffineEvo::Invariant(temp.clone().into()));
		};
		// recurrences are recognized for any loop, so that mixing counters
		// of different loops is rejected rather than folded away
		if let LlvmInstrVariant::PhiInstr(phi) = instr.get_variant() {
			return self.classify_phi(phi, def_block);
		}
		if !self.cur_loop.borrow().contains_block(def_block) {
			return Some(AffineEvo::Invariant(temp.clone().into()));
		}
		match instr.get_variant() {
			LlvmInstrVariant::ArithInstr(arith) => match arith.op {
				ArithOp::Add => self.classify_sum(&arith.lhs, &arith.rhs, false),
				ArithOp::Sub => self.classify_sum(&arith.lhs, &arith.rhs, true),
				ArithOp::Mul => self.classify_mul(&arith.lhs, &arith.rhs),
				_ => None,
			},
			_ => None,
		}
	}

	// A recurrence phi sits in a loop header, merges exactly one value from
	// outside the loop with one from inside, and the inside value is
	// phi +- constant.
	fn classify_phi(
		&mut self,
		phi: &PhiInstr,
		def_block: i32,
	) -> Option<AffineEvo> {
		if !phi.target.var_type.is_int() || phi.source.len() != 2 {
			return None;
		}
		let loop_ = self.loop_map.get(&def_block)?.clone();
		if loop_.borrow().header.borrow().id != def_block {
			return None;
		}
		let mut start = None;
		let mut latch = None;
		for (value, label) in phi.source.iter() {
			if loop_.borrow().contains_block(label.block_id()) {
				latch = Some(value);
			} else {
				start = Some(value);
			}
		}
		let update = latch?.unwrap_temp()?;
		let (update_instr, update_block) = self.defs.get(&update).cloned()?;
		if !loop_.borrow().contains_block(update_block) {
			return None;
		}
		let step = match update_instr.get_variant() {
			LlvmInstrVariant::ArithInstr(arith) => step_of(arith, &phi.target)?,
			_ => return None,
		};
		Some(AffineEvo::AddRec {
			loop_,
			base: start?.clone(),
			step,
		})
	}

	fn classify_sum(
		&mut self,
		lhs: &Value,
		rhs: &Value,
		negated: bool,
	) -> Option<AffineEvo> {
		let op = if negated { ArithOp::Sub } else { ArithOp::Add };
		let lhs = self.classify(lhs)?;
		let rhs = self.classify(rhs)?;
		match (lhs, rhs) {
			(AffineEvo::Invariant(a), AffineEvo::Invariant(b)) => {
				Some(AffineEvo::Invariant(self.fold(a, op, b)?))
			}
			(
				AffineEvo::AddRec { loop_, base, step },
				AffineEvo::Invariant(b),
			) => Some(AffineEvo::AddRec {
				loop_,
				base: self.fold(base, op, b)?,
				step,
			}),
			(
				AffineEvo::Invariant(a),
				AffineEvo::AddRec { loop_, base, step },
			) => Some(AffineEvo::AddRec {
				loop_,
				base: self.fold(a, op, base)?,
				step: if negated { step.checked_neg()? } else { step },
			}),
			(
				AffineEvo::AddRec {
					loop_: lhs_loop,
					base: lhs_base,
					step: lhs_step,
				},
				AffineEvo::AddRec {
					loop_: rhs_loop,
					base: rhs_base,
					step: rhs_step,
				},
			) => {
				// recurrences over different loops do not combine
				if !Rc::ptr_eq(&lhs_loop, &rhs_loop) {
					return None;
				}
				let step = if negated {
					lhs_step.checked_sub(rhs_step)?
				} else {
					lhs_step.checked_add(rhs_step)?
				};
				Some(AffineEvo::AddRec {
					loop_: lhs_loop,
					base: self.fold(lhs_base, op, rhs_base)?,
					step,
				})
			}
		}
	}

	// Multiplication stays affine only when one factor is a compile-time
	// constant; scaling by an invariant temp would make the step symbolic.
	fn classify_mul(&mut self, lhs: &Value, rhs: &Value) -> Option<AffineEvo> {
		let lhs = self.classify(lhs)?;
		let rhs = self.classify(rhs)?;
		match (lhs, rhs) {
			(AffineEvo::Invariant(Value::Int(scale)), other)
			| (other, AffineEvo::Invariant(Value::Int(scale))) => {
				self.scale(scale, other)
			}
			_ => None,
		}
	}

	fn scale(&mut self, scale: i32, evo: AffineEvo) -> Option<AffineEvo> {
		if scale == 0 {
			return Some(AffineEvo::Invariant(Value::Int(0)));
		}
		match evo {
			AffineEvo::Invariant(v) => Some(AffineEvo::Invariant(self.fold(
				v,
				ArithOp::Mul,
				Value::Int(scale),
			)?)),
			AffineEvo::AddRec { loop_, base, step } => {
				Some(AffineEvo::AddRec {
					loop_,
					base: self.fold(base, ArithOp::Mul, Value::Int(scale))?,
					step: step.checked_mul(scale)?,
				})
			}
		}
	}

	// Folds two invariant values into one: constants are evaluated (with
	// overflow treated as not-affine), identities short-circuit, anything
	// symbolic becomes a staged loop-invariant instruction.
	pub fn fold(
		&mut self,
		lhs: Value,
		op: ArithOp,
		rhs: Value,
	) -> Option<Value> {
		if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
			return match op {
				ArithOp::Add => a.checked_add(*b).map(Value::Int),
				ArithOp::Sub => a.checked_sub(*b).map(Value::Int),
				ArithOp::Mul => a.checked_mul(*b).map(Value::Int),
				_ => None,
			};
		}
		match (op, &lhs, &rhs) {
			(ArithOp::Add | ArithOp::Sub, _, Value::Int(0)) => return Some(lhs),
			(ArithOp::Add, Value::Int(0), _) => return Some(rhs),
			(ArithOp::Mul, _, Value::Int(1)) => return Some(lhs),
			(ArithOp::Mul, Value::Int(1), _) => return Some(rhs),
			(ArithOp::Mul, _, Value::Int(0))
			| (ArithOp::Mul, Value::Int(0), _) => return Some(Value::Int(0)),
			_ => {}
		}
		if let Some((_, _, _, temp)) = self
			.reuse
			.iter()
			.find(|(r_op, r_lhs, r_rhs, _)| *r_op == op && *r_lhs == lhs && *r_rhs == rhs)
		{
			return Some(Value::Temp(temp.clone()));
		}
		let target = self.temp_mgr.new_temp(VarType::I32);
		self.reuse.push((op, lhs.clone(), rhs.clone(), target.clone()));
		let instr = ArithInstr {
			target: target.clone(),
			op,
			var_type: VarType::I32,
			lhs,
			rhs,
		};
		self.staged.push(Box::new(instr));
		Some(Value::Temp(target))
	}

	pub fn take_staged(&mut self) -> Vec<LlvmInstr> {
		std::mem::take(&mut self.staged)
	}
}
