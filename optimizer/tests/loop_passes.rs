use cfgir::{funcemitter::LlvmFuncEmitter, program::LlvmProgram, LlvmNode};
use llvm::{
	ArithOp, CompOp, LlvmInstrVariant, LlvmTemp, PhiInstr, Value, VarType,
};
use optimizer::{
	run_pipeline, DerivedIvElim, IrOptimizer, Optimizer, SimpleLicm,
};
use simulator::MiddleSimulator;
use utils::{Label, LoopOptError, UseTemp};

// `for counter in 0..limit` skeleton. The caller fills the body after the
// call and hands the handle back to close_loop, which wires the back edge
// and the counter phi, then continues emission in the exit block.
struct CountedLoop {
	header: LlvmNode,
	body: LlvmNode,
	exit: LlvmNode,
	counter: LlvmTemp,
	preheader_label: Label,
}

fn open_loop(emitter: &mut LlvmFuncEmitter, limit: i32) -> CountedLoop {
	let header = emitter.new_block();
	let body = emitter.new_block();
	let exit = emitter.new_block();
	let counter = emitter.fresh_temp(VarType::I32);
	let preheader_label = emitter.cur_block().borrow().label();
	emitter.visit_jump_instr(&header);
	emitter.enter_block(header.clone());
	let cond = emitter.visit_comp_instr(
		counter.clone().into(),
		CompOp::SLT,
		Value::Int(limit),
	);
	emitter.visit_jump_cond_instr(cond.into(), &body, &exit);
	emitter.enter_block(body.clone());
	CountedLoop {
		header,
		body,
		exit,
		counter,
		preheader_label,
	}
}

fn close_loop(emitter: &mut LlvmFuncEmitter, loop_: &CountedLoop) {
	let latch_label = emitter.cur_block().borrow().label();
	let next = emitter.visit_arith_instr(
		loop_.counter.clone().into(),
		ArithOp::Add,
		Value::Int(1),
	);
	emitter.visit_jump_instr(&loop_.header);
	loop_.header.borrow_mut().push_phi(PhiInstr {
		target: loop_.counter.clone(),
		var_type: VarType::I32,
		source: vec![
			(Value::Int(0), loop_.preheader_label.clone()),
			(next.into(), latch_label),
		],
	});
	emitter.enter_block(loop_.exit.clone());
}

fn into_program(emitter: LlvmFuncEmitter) -> LlvmProgram {
	let (func, temp_mgr) = emitter.visit_end();
	let mut program = LlvmProgram::new();
	program.funcs.push(func);
	program.temp_mgr = temp_mgr;
	program
}

fn execute(program: &LlvmProgram) -> (Vec<String>, Option<i32>) {
	let mut simu = MiddleSimulator::new(String::new());
	simu.run_program(program);
	(simu.output.clone(), simu.return_value())
}

fn defines(program: &LlvmProgram, temp: &LlvmTemp) -> bool {
	program.funcs.iter().any(|func| {
		func.cfg.blocks.iter().any(|node| {
			let bb = node.borrow();
			bb.phi_instrs.iter().any(|v| v.target == *temp)
				|| bb
					.instrs
					.iter()
					.any(|v| v.get_write().map_or(false, |t| t == *temp))
		})
	})
}

fn defines_in(node: &LlvmNode, temp: &LlvmTemp) -> bool {
	node.borrow()
		.instrs
		.iter()
		.any(|v| v.get_write().map_or(false, |t| t == *temp))
}

fn has_arith_of(
	node: &LlvmNode,
	op: ArithOp,
	lhs: &LlvmTemp,
	rhs: &LlvmTemp,
) -> bool {
	node.borrow().instrs.iter().any(|v| match v.get_variant() {
		LlvmInstrVariant::ArithInstr(arith) => {
			arith.op == op
				&& arith.lhs == Value::Temp(lhs.clone())
				&& arith.rhs == Value::Temp(rhs.clone())
		}
		_ => false,
	})
}

fn load_count(node: &LlvmNode) -> usize {
	node.borrow()
		.instrs
		.iter()
		.filter(|v| matches!(v.get_variant(), LlvmInstrVariant::LoadInstr(_)))
		.count()
}

// sum += i*4 + 8 over i in 0..10; both multiplier and offset hang off the
// counter, so the whole chain should collapse into header arithmetic.
fn derived_iv_program() -> (LlvmProgram, CountedLoop, LlvmTemp, LlvmTemp) {
	let mut emitter = LlvmFuncEmitter::new("main", VarType::I32);
	let sum = emitter.fresh_temp(VarType::I32);
	let lo = open_loop(&mut emitter, 10);
	let j = emitter.visit_arith_instr(
		lo.counter.clone().into(),
		ArithOp::Mul,
		Value::Int(4),
	);
	let j2 =
		emitter.visit_arith_instr(j.clone().into(), ArithOp::Add, Value::Int(8));
	let body_label = emitter.cur_block().borrow().label();
	let sum_next = emitter.visit_arith_instr(
		sum.clone().into(),
		ArithOp::Add,
		j2.clone().into(),
	);
	close_loop(&mut emitter, &lo);
	lo.header.borrow_mut().push_phi(PhiInstr {
		target: sum.clone(),
		var_type: VarType::I32,
		source: vec![
			(Value::Int(0), lo.preheader_label.clone()),
			(sum_next.into(), body_label),
		],
	});
	emitter.visit_call_instr(
		VarType::Void,
		"putint",
		vec![sum.clone().into()],
	);
	emitter.visit_ret(Some(sum.into()));
	(into_program(emitter), lo, j, j2)
}

#[test]
fn derived_ivs_rewritten_and_erased() {
	let (reference, ..) = derived_iv_program();
	let expected = execute(&reference);
	assert_eq!(expected, (vec!["260".to_string()], Some(260)));

	let (mut program, lo, j, j2) = derived_iv_program();
	let changed = DerivedIvElim::new().apply(&mut program).unwrap();
	assert!(changed);
	assert!(!defines(&program, &j));
	assert!(!defines(&program, &j2));
	// only the accumulator update survives in the body
	assert_eq!(lo.body.borrow().instrs.len(), 1);
	assert_eq!(execute(&program), expected);
}

#[test]
fn derived_iv_elim_is_idempotent() {
	let (mut program, ..) = derived_iv_program();
	assert!(DerivedIvElim::new().apply(&mut program).unwrap());
	// the first run must not leave litter the second run would collect
	let settled = format!("{}", program);
	let again = DerivedIvElim::new().apply(&mut program).unwrap();
	assert!(!again);
	assert_eq!(format!("{}", program), settled);
}

// Two header phis qualify as counters (i by 1, k by 2); the first one in
// phi order must be kept and the other rewritten in terms of it.
fn twin_iv_program() -> (LlvmProgram, CountedLoop, LlvmTemp, LlvmTemp) {
	let mut emitter = LlvmFuncEmitter::new("main", VarType::I32);
	let k = emitter.fresh_temp(VarType::I32);
	let sum = emitter.fresh_temp(VarType::I32);
	let lo = open_loop(&mut emitter, 10);
	let body_label = emitter.cur_block().borrow().label();
	let k_next =
		emitter.visit_arith_instr(k.clone().into(), ArithOp::Add, Value::Int(2));
	let sum_next = emitter.visit_arith_instr(
		sum.clone().into(),
		ArithOp::Add,
		k.clone().into(),
	);
	close_loop(&mut emitter, &lo);
	lo.header.borrow_mut().push_phi(PhiInstr {
		target: k.clone(),
		var_type: VarType::I32,
		source: vec![
			(Value::Int(5), lo.preheader_label.clone()),
			(k_next.into(), body_label.clone()),
		],
	});
	lo.header.borrow_mut().push_phi(PhiInstr {
		target: sum.clone(),
		var_type: VarType::I32,
		source: vec![
			(Value::Int(0), lo.preheader_label.clone()),
			(sum_next.into(), body_label),
		],
	});
	emitter.visit_call_instr(
		VarType::Void,
		"putint",
		vec![sum.clone().into()],
	);
	emitter.visit_ret(Some(sum.clone().into()));
	(into_program(emitter), lo, k, sum)
}

#[test]
fn first_header_phi_is_the_counter() {
	let (reference, ..) = twin_iv_program();
	let expected = execute(&reference);
	assert_eq!(expected.1, Some(140));

	let (mut program, lo, k, sum) = twin_iv_program();
	assert!(DerivedIvElim::new().apply(&mut program).unwrap());
	let phis = lo.header.borrow().phi_instrs.clone();
	// k collapsed onto the counter, i and the accumulator remain
	assert_eq!(phis.len(), 2);
	assert_eq!(phis[0].target, lo.counter);
	assert_eq!(phis[1].target, sum);
	assert!(!defines(&program, &k));
	assert_eq!(execute(&program), expected);
	assert!(!DerivedIvElim::new().apply(&mut program).unwrap());
}

// acc += io + ii under two nested loops, accumulated through memory so the
// only register recurrences are the two counters.
fn nested_mixed_program(
) -> (LlvmProgram, CountedLoop, CountedLoop, LlvmTemp, LlvmTemp) {
	let mut emitter = LlvmFuncEmitter::new("main", VarType::I32);
	let acc = emitter.visit_alloc_instr(VarType::I32Ptr, Value::Int(4));
	emitter.visit_store_instr(Value::Int(0), acc.clone().into());
	let lo = open_loop(&mut emitter, 3);
	let li = open_loop(&mut emitter, 4);
	let t = emitter.visit_arith_instr(
		lo.counter.clone().into(),
		ArithOp::Add,
		li.counter.clone().into(),
	);
	let old = emitter.visit_load_instr(acc.clone().into());
	let new = emitter.visit_arith_instr(old.into(), ArithOp::Add, t.into());
	emitter.visit_store_instr(new.into(), acc.clone().into());
	close_loop(&mut emitter, &li);
	close_loop(&mut emitter, &lo);
	let result = emitter.visit_load_instr(acc.into());
	emitter.visit_call_instr(
		VarType::Void,
		"putint",
		vec![result.clone().into()],
	);
	emitter.visit_ret(Some(result.into()));
	let io = lo.counter.clone();
	let ii = li.counter.clone();
	(into_program(emitter), lo, li, io, ii)
}

#[test]
fn mixed_loop_recurrences_are_kept() {
	let (reference, ..) = nested_mixed_program();
	let expected = execute(&reference);
	assert_eq!(expected, (vec!["30".to_string()], Some(30)));

	let (mut program, _lo, li, io, ii) = nested_mixed_program();
	DerivedIvElim::new().apply(&mut program).unwrap();
	// io + ii mixes counters of two different loops and must survive
	assert!(has_arith_of(&li.body, ArithOp::Add, &io, &ii));
	assert_eq!(execute(&program), expected);
}

// x = i * y where y itself accumulates inside the loop: the multiplier is
// loop-variant, so x is not affine and must stay untouched.
fn variant_multiplier_program() -> (LlvmProgram, CountedLoop, LlvmTemp, LlvmTemp)
{
	let mut emitter = LlvmFuncEmitter::new("main", VarType::I32);
	let y = emitter.fresh_temp(VarType::I32);
	let lo = open_loop(&mut emitter, 5);
	let body_label = emitter.cur_block().borrow().label();
	let x = emitter.visit_arith_instr(
		lo.counter.clone().into(),
		ArithOp::Mul,
		y.clone().into(),
	);
	let y_next =
		emitter.visit_arith_instr(y.clone().into(), ArithOp::Add, x.clone().into());
	close_loop(&mut emitter, &lo);
	lo.header.borrow_mut().push_phi(PhiInstr {
		target: y.clone(),
		var_type: VarType::I32,
		source: vec![
			(Value::Int(1), lo.preheader_label.clone()),
			(y_next.into(), body_label),
		],
	});
	emitter.visit_call_instr(VarType::Void, "putint", vec![y.clone().into()]);
	emitter.visit_ret(Some(y.clone().into()));
	(into_program(emitter), lo, x, y)
}

#[test]
fn variant_multiplier_blocks_rewrite() {
	let (reference, ..) = variant_multiplier_program();
	let expected = execute(&reference);
	// y multiplies up to 5! = 120
	assert_eq!(expected, (vec!["120".to_string()], Some(120)));

	let (mut program, lo, x, y) = variant_multiplier_program();
	DerivedIvElim::new().apply(&mut program).unwrap();
	assert!(has_arith_of(&lo.body, ArithOp::Mul, &lo.counter, &y));
	assert!(defines_in(&lo.body, &x));
	assert_eq!(execute(&program), expected);
}

#[test]
fn loads_are_never_hoisted() {
	let (mut program, _lo, li, ..) = nested_mixed_program();
	let before = li.body.borrow().instrs.len();
	// the load address is invariant in the inner loop, the load still stays
	let changed = SimpleLicm::new().apply(&mut program).unwrap();
	assert!(!changed);
	assert_eq!(load_count(&li.body), 1);
	assert_eq!(li.body.borrow().instrs.len(), before);
}

// kernel(a, b): sum += (a + b) * 2 + i over i in 0..10. The a+b and *2 links
// of the chain are invariant, the +i link is not.
fn invariant_chain_program(
) -> (LlvmProgram, CountedLoop, LlvmNode, LlvmTemp, LlvmTemp, LlvmTemp) {
	let mut emitter = LlvmFuncEmitter::new("kernel", VarType::I32);
	let a = emitter.visit_formal_param(VarType::I32);
	let b = emitter.visit_formal_param(VarType::I32);
	let sum = emitter.fresh_temp(VarType::I32);
	let entry = emitter.cur_block();
	let lo = open_loop(&mut emitter, 10);
	let body_label = emitter.cur_block().borrow().label();
	let t = emitter.visit_arith_instr(a.into(), ArithOp::Add, b.into());
	let u =
		emitter.visit_arith_instr(t.clone().into(), ArithOp::Mul, Value::Int(2));
	let v = emitter.visit_arith_instr(
		u.clone().into(),
		ArithOp::Add,
		lo.counter.clone().into(),
	);
	let sum_next = emitter.visit_arith_instr(
		sum.clone().into(),
		ArithOp::Add,
		v.clone().into(),
	);
	close_loop(&mut emitter, &lo);
	lo.header.borrow_mut().push_phi(PhiInstr {
		target: sum.clone(),
		var_type: VarType::I32,
		source: vec![
			(Value::Int(0), lo.preheader_label.clone()),
			(sum_next.into(), body_label),
		],
	});
	emitter.visit_ret(Some(sum.into()));
	let (kernel, kernel_mgr) = emitter.visit_end();

	let mut emitter = LlvmFuncEmitter::new("main", VarType::I32);
	let r = emitter.visit_call_instr(
		VarType::I32,
		"kernel",
		vec![Value::Int(3), Value::Int(4)],
	);
	emitter.visit_call_instr(VarType::Void, "putint", vec![r.clone().into()]);
	emitter.visit_ret(Some(r.into()));
	let (main_func, mut temp_mgr) = emitter.visit_end();
	temp_mgr.total = temp_mgr.total.max(kernel_mgr.total);

	let mut program = LlvmProgram::new();
	program.funcs.push(kernel);
	program.funcs.push(main_func);
	program.temp_mgr = temp_mgr;
	(program, lo, entry, t, u, v)
}

#[test]
fn invariant_chain_hoisted_in_order() {
	let (reference, ..) = invariant_chain_program();
	let expected = execute(&reference);
	assert_eq!(expected, (vec!["185".to_string()], Some(185)));

	let (mut program, lo, entry, t, u, v) = invariant_chain_program();
	let changed = SimpleLicm::new().apply(&mut program).unwrap();
	assert!(changed);
	// t seeds the set, u joins at the fixed point; order is preserved
	let hoisted: Vec<LlvmTemp> = entry
		.borrow()
		.instrs
		.iter()
		.filter_map(|i| i.get_write())
		.collect();
	assert_eq!(hoisted, vec![t, u]);
	// v reads the counter and must stay behind
	assert!(defines_in(&lo.body, &v));
	assert_eq!(lo.body.borrow().instrs.len(), 3);
	assert_eq!(execute(&program), expected);
	assert!(!SimpleLicm::new().apply(&mut program).unwrap());
}

// The loop header is reachable from two blocks outside the loop, so there
// is no preheader and nothing may move or be rewritten.
fn multi_entry_loop_program() -> (LlvmProgram, LlvmNode, LlvmTemp) {
	let mut emitter = LlvmFuncEmitter::new("main", VarType::I32);
	let mid = emitter.new_block();
	let header = emitter.new_block();
	let exit = emitter.new_block();
	let i = emitter.fresh_temp(VarType::I32);
	let entry_label = emitter.cur_block().borrow().label();
	emitter.visit_jump_cond_instr(Value::Int(1), &header, &mid);
	emitter.enter_block(mid.clone());
	emitter.visit_jump_instr(&header);
	emitter.enter_block(header.clone());
	let t =
		emitter.visit_arith_instr(Value::Int(3), ArithOp::Add, Value::Int(4));
	let shifted = emitter.visit_arith_instr(
		i.clone().into(),
		ArithOp::Add,
		t.clone().into(),
	);
	let i_next =
		emitter.visit_arith_instr(i.clone().into(), ArithOp::Add, Value::Int(1));
	let cond = emitter.visit_comp_instr(
		i_next.clone().into(),
		CompOp::SLT,
		Value::Int(10),
	);
	emitter.visit_jump_cond_instr(cond.into(), &header, &exit);
	emitter.enter_block(exit.clone());
	emitter.visit_call_instr(
		VarType::Void,
		"putint",
		vec![shifted.clone().into()],
	);
	emitter.visit_ret(Some(i_next.clone().into()));
	let mid_label = mid.borrow().label();
	let header_label = header.borrow().label();
	header.borrow_mut().push_phi(PhiInstr {
		target: i,
		var_type: VarType::I32,
		source: vec![
			(Value::Int(0), entry_label),
			(Value::Int(0), mid_label),
			(i_next.into(), header_label),
		],
	});
	(into_program(emitter), header, t)
}

#[test]
fn multi_entry_header_is_left_alone() {
	let (reference, ..) = multi_entry_loop_program();
	let expected = execute(&reference);
	assert_eq!(expected, (vec!["16".to_string()], Some(10)));

	let (mut program, header, t) = multi_entry_loop_program();
	assert!(!SimpleLicm::new().apply(&mut program).unwrap());
	assert!(defines_in(&header, &t));
	// the three-way phi disqualifies the counter as well
	assert!(!DerivedIvElim::new().apply(&mut program).unwrap());
	assert_eq!(execute(&program), expected);
}

// 4x4 integer matrix product with a[x] = x and b[x] = x + 1, printing the
// result cell by cell. Exercises derived offsets, an invariant row base and
// memory traffic all at once.
fn matmul_program() -> (LlvmProgram, CountedLoop, CountedLoop, LlvmTemp) {
	let mut emitter = LlvmFuncEmitter::new("main", VarType::I32);
	let a = emitter.visit_alloc_instr(VarType::I32Ptr, Value::Int(64));
	let b = emitter.visit_alloc_instr(VarType::I32Ptr, Value::Int(64));
	let c = emitter.visit_alloc_instr(VarType::I32Ptr, Value::Int(64));

	let fill = open_loop(&mut emitter, 16);
	let off = emitter.visit_arith_instr(
		fill.counter.clone().into(),
		ArithOp::Mul,
		Value::Int(4),
	);
	let pa = emitter.visit_gep_instr(a.clone().into(), off.clone().into());
	emitter.visit_store_instr(fill.counter.clone().into(), pa.into());
	let bval = emitter.visit_arith_instr(
		fill.counter.clone().into(),
		ArithOp::Add,
		Value::Int(1),
	);
	let pb = emitter.visit_gep_instr(b.clone().into(), off.clone().into());
	emitter.visit_store_instr(bval.into(), pb.into());
	let pc = emitter.visit_gep_instr(c.clone().into(), off.into());
	emitter.visit_store_instr(Value::Int(0), pc.into());
	close_loop(&mut emitter, &fill);

	let li = open_loop(&mut emitter, 4);
	let lj = open_loop(&mut emitter, 4);
	let lk = open_loop(&mut emitter, 4);
	let row = emitter.visit_arith_instr(
		li.counter.clone().into(),
		ArithOp::Mul,
		Value::Int(4),
	);
	let aidx = emitter.visit_arith_instr(
		row.clone().into(),
		ArithOp::Add,
		lk.counter.clone().into(),
	);
	let aoff =
		emitter.visit_arith_instr(aidx.into(), ArithOp::Mul, Value::Int(4));
	let pa = emitter.visit_gep_instr(a.into(), aoff.into());
	let av = emitter.visit_load_instr(pa.into());
	let krow = emitter.visit_arith_instr(
		lk.counter.clone().into(),
		ArithOp::Mul,
		Value::Int(4),
	);
	let bidx = emitter.visit_arith_instr(
		krow.into(),
		ArithOp::Add,
		lj.counter.clone().into(),
	);
	let boff =
		emitter.visit_arith_instr(bidx.into(), ArithOp::Mul, Value::Int(4));
	let pb = emitter.visit_gep_instr(b.into(), boff.into());
	let bv = emitter.visit_load_instr(pb.into());
	let prod = emitter.visit_arith_instr(av.into(), ArithOp::Mul, bv.into());
	let cidx = emitter.visit_arith_instr(
		row.clone().into(),
		ArithOp::Add,
		lj.counter.clone().into(),
	);
	let coff =
		emitter.visit_arith_instr(cidx.into(), ArithOp::Mul, Value::Int(4));
	let pc = emitter.visit_gep_instr(c.clone().into(), coff.into());
	let cv = emitter.visit_load_instr(pc.clone().into());
	let acc = emitter.visit_arith_instr(cv.into(), ArithOp::Add, prod.into());
	emitter.visit_store_instr(acc.into(), pc.into());
	close_loop(&mut emitter, &lk);
	close_loop(&mut emitter, &lj);
	close_loop(&mut emitter, &li);

	let pr = open_loop(&mut emitter, 16);
	let off = emitter.visit_arith_instr(
		pr.counter.clone().into(),
		ArithOp::Mul,
		Value::Int(4),
	);
	let p = emitter.visit_gep_instr(c.into(), off.into());
	let value = emitter.visit_load_instr(p.into());
	emitter.visit_call_instr(VarType::Void, "putint", vec![value.into()]);
	close_loop(&mut emitter, &pr);
	emitter.visit_ret(Some(Value::Int(0)));
	(into_program(emitter), li, lk, row)
}

fn matmul_expected() -> Vec<String> {
	let a: Vec<i32> = (0..16).collect();
	let b: Vec<i32> = (1..17).collect();
	let mut c = vec![0; 16];
	for i in 0..4 {
		for j in 0..4 {
			for k in 0..4 {
				c[i * 4 + j] += a[i * 4 + k] * b[k * 4 + j];
			}
		}
	}
	c.iter().map(|v| v.to_string()).collect()
}

#[test]
fn matmul_survives_both_passes() {
	let (reference, ..) = matmul_program();
	let expected = execute(&reference);
	assert_eq!(expected, (matmul_expected(), Some(0)));

	let (mut program, ..) = matmul_program();
	assert!(DerivedIvElim::new().apply(&mut program).unwrap());
	assert_eq!(execute(&program), expected);

	let (mut program, li, lk, row) = matmul_program();
	assert!(SimpleLicm::new().apply(&mut program).unwrap());
	// the row base depends only on the outermost counter; it lands in the
	// preheader of the middle loop, which is as far as the walk reaches
	assert!(defines_in(&li.body, &row));
	assert!(!defines_in(&lk.body, &row));
	assert_eq!(execute(&program), expected);

	let (mut program, ..) = matmul_program();
	assert!(run_pipeline(&mut program, "derived-iv-elim,simple-licm")
		.unwrap());
	assert_eq!(execute(&program), expected);
}

#[test]
fn combined_optimizer_matches_pipeline() {
	let (mut by_name, ..) = derived_iv_program();
	assert!(run_pipeline(&mut by_name, "derived-iv-elim,simple-licm").unwrap());
	let (mut combined, ..) = derived_iv_program();
	assert!(Optimizer::new().apply(&mut combined).unwrap());
	assert_eq!(execute(&combined), execute(&by_name));
}

#[test]
fn pipeline_rejects_unknown_pass() {
	let (mut program, ..) = derived_iv_program();
	let result = run_pipeline(&mut program, "derived-iv-elim, loop-fusion");
	assert!(matches!(result, Err(LoopOptError::PipelineError(_))));
}
