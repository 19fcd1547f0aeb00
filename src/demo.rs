use cfgir::{funcemitter::LlvmFuncEmitter, program::LlvmProgram};
use llvm::{ArithOp, CompOp, PhiInstr, Value, VarType};

// A small summation kernel with a derived induction variable (j = i*4,
// j2 = j+8) and a loop-invariant subexpression, enough for both passes to
// fire when the driver runs the default pipeline.
pub fn build_demo() -> LlvmProgram {
	let mut emitter = LlvmFuncEmitter::new("main", VarType::I32);
	let header = emitter.new_block();
	let body = emitter.new_block();
	let exit = emitter.new_block();
	let i = emitter.fresh_temp(VarType::I32);
	let sum = emitter.fresh_temp(VarType::I32);

	emitter.visit_jump_instr(&header);

	emitter.enter_block(header.clone());
	let cond =
		emitter.visit_comp_instr(i.clone().into(), CompOp::SLT, Value::Int(10));
	emitter.visit_jump_cond_instr(cond.into(), &body, &exit);

	emitter.enter_block(body.clone());
	let j =
		emitter.visit_arith_instr(i.clone().into(), ArithOp::Mul, Value::Int(4));
	let j2 = emitter.visit_arith_instr(j.into(), ArithOp::Add, Value::Int(8));
	let t = emitter.visit_arith_instr(Value::Int(3), ArithOp::Add, Value::Int(4));
	let partial =
		emitter.visit_arith_instr(sum.clone().into(), ArithOp::Add, j2.into());
	let sum_next =
		emitter.visit_arith_instr(partial.into(), ArithOp::Add, t.into());
	let i_next =
		emitter.visit_arith_instr(i.clone().into(), ArithOp::Add, Value::Int(1));
	emitter.visit_jump_instr(&header);

	emitter.enter_block(exit.clone());
	emitter.visit_call_instr(VarType::Void, "putint", vec![sum.clone().into()]);
	emitter.visit_ret(Some(Value::Int(0)));

	let entry_label = utils::Label::block(0);
	let body_label = body.borrow().label();
	header.borrow_mut().push_phi(PhiInstr {
		target: i,
		var_type: VarType::I32,
		source: vec![
			(Value::Int(0), entry_label.clone()),
			(i_next.into(), body_label.clone()),
		],
	});
	header.borrow_mut().push_phi(PhiInstr {
		target: sum,
		var_type: VarType::I32,
		source: vec![
			(Value::Int(0), entry_label),
			(sum_next.into(), body_label),
		],
	});

	let (func, temp_mgr) = emitter.visit_end();
	let mut program = LlvmProgram::new();
	program.funcs.push(func);
	program.temp_mgr = temp_mgr;
	program
}
