use llvm::{
	AllocInstr, ArithInstr, ArithOp, CallInstr, CompInstr, CompKind, CompOp,
	ConvertInstr, ConvertOp, GEPInstr, JumpCondInstr, JumpInstr, LlvmOp, LlvmTemp,
	LlvmTempManager, LoadInstr, PhiInstr, RetInstr, SelectInstr, StoreInstr,
	Value, VarType,
};
use utils::Label;

use crate::{
	basicblock::{BasicBlock, Node},
	cfg::{link_node, CFG},
	func::LlvmFunc,
};

// Builds a function block by block. Every visit_* appends to the block last
// entered; terminators also wire up the prev/succ edges.
pub struct LlvmFuncEmitter {
	name: String,
	ret_type: VarType,
	params: Vec<Value>,
	total: i32,
	temp_mgr: LlvmTempManager,
	blocks: Vec<Node>,
	cur: Node,
}

impl LlvmFuncEmitter {
	pub fn new(name: impl ToString, ret_type: VarType) -> Self {
		let entry = BasicBlock::new_node(0);
		Self {
			name: name.to_string(),
			ret_type,
			params: Vec::new(),
			total: 0,
			temp_mgr: LlvmTempManager::new(),
			blocks: vec![entry.clone()],
			cur: entry,
		}
	}

	pub fn new_block(&mut self) -> Node {
		self.total += 1;
		let node = BasicBlock::new_node(self.total);
		self.blocks.push(node.clone());
		node
	}

	pub fn enter_block(&mut self, node: Node) {
		self.cur = node;
	}

	pub fn cur_block(&self) -> Node {
		self.cur.clone()
	}

	pub fn fresh_temp(&mut self, var_type: VarType) -> LlvmTemp {
		self.temp_mgr.new_temp(var_type)
	}

	pub fn visit_formal_param(&mut self, var_type: VarType) -> LlvmTemp {
		let temp = self.temp_mgr.new_temp(var_type);
		self.params.push(temp.clone().into());
		temp
	}

	pub fn visit_arith_instr(
		&mut self,
		lhs: Value,
		op: ArithOp,
		rhs: Value,
	) -> LlvmTemp {
		let target = self.temp_mgr.new_temp(op.oprand_type());
		let instr = ArithInstr {
			target: target.clone(),
			op,
			var_type: op.oprand_type(),
			lhs,
			rhs,
		};
		self.cur.borrow_mut().push(Box::new(instr));
		target
	}

	pub fn visit_comp_instr(
		&mut self,
		lhs: Value,
		op: CompOp,
		rhs: Value,
	) -> LlvmTemp {
		let kind = match op.oprand_type() {
			VarType::F32 => CompKind::Fcmp,
			_ => CompKind::Icmp,
		};
		let target = self.temp_mgr.new_temp(VarType::I32);
		let instr = CompInstr {
			kind,
			target: target.clone(),
			op,
			var_type: op.oprand_type(),
			lhs,
			rhs,
		};
		self.cur.borrow_mut().push(Box::new(instr));
		target
	}

	pub fn visit_convert_instr(
		&mut self,
		op: ConvertOp,
		lhs: Value,
	) -> LlvmTemp {
		let target = self.temp_mgr.new_temp(op.type_to());
		let instr = ConvertInstr {
			target: target.clone(),
			op,
			lhs,
			to_type: op.type_to(),
		};
		self.cur.borrow_mut().push(Box::new(instr));
		target
	}

	pub fn visit_select_instr(
		&mut self,
		cond: Value,
		lhs: Value,
		rhs: Value,
	) -> LlvmTemp {
		let var_type = lhs.get_type();
		let target = self.temp_mgr.new_temp(var_type);
		let instr = SelectInstr {
			target: target.clone(),
			var_type,
			cond,
			lhs,
			rhs,
		};
		self.cur.borrow_mut().push(Box::new(instr));
		target
	}

	pub fn visit_gep_instr(&mut self, addr: Value, offset: Value) -> LlvmTemp {
		let var_type = addr.get_type();
		let target = self.temp_mgr.new_temp(var_type);
		let instr = GEPInstr {
			target: target.clone(),
			var_type,
			addr,
			offset,
		};
		self.cur.borrow_mut().push(Box::new(instr));
		target
	}

	pub fn visit_alloc_instr(
		&mut self,
		var_type: VarType,
		length: Value,
	) -> LlvmTemp {
		let target = self.temp_mgr.new_temp(var_type);
		let instr = AllocInstr {
			target: target.clone(),
			var_type,
			length,
		};
		self.cur.borrow_mut().push(Box::new(instr));
		target
	}

	pub fn visit_load_instr(&mut self, addr: Value) -> LlvmTemp {
		let var_type = addr.get_type().deref_type();
		let target = self.temp_mgr.new_temp(var_type);
		let instr = LoadInstr {
			target: target.clone(),
			var_type,
			addr,
		};
		self.cur.borrow_mut().push(Box::new(instr));
		target
	}

	pub fn visit_store_instr(&mut self, value: Value, addr: Value) {
		let instr = StoreInstr { value, addr };
		self.cur.borrow_mut().push(Box::new(instr));
	}

	pub fn visit_call_instr(
		&mut self,
		var_type: VarType,
		func_name: impl ToString,
		params: Vec<Value>,
	) -> LlvmTemp {
		let target = self.temp_mgr.new_temp(var_type);
		let instr = CallInstr {
			target: target.clone(),
			var_type,
			func: Label::new(func_name.to_string()),
			params: params.into_iter().map(|v| (v.get_type(), v)).collect(),
		};
		self.cur.borrow_mut().push(Box::new(instr));
		target
	}

	pub fn visit_phi_instr(
		&mut self,
		var_type: VarType,
		source: Vec<(Value, Label)>,
	) -> LlvmTemp {
		let target = self.temp_mgr.new_temp(var_type);
		let instr = PhiInstr {
			target: target.clone(),
			var_type,
			source,
		};
		self.cur.borrow_mut().push_phi(instr);
		target
	}

	pub fn visit_jump_instr(&mut self, target: &Node) {
		let instr = JumpInstr {
			target: target.borrow().label(),
		};
		self.cur.borrow_mut().set_jump(Some(Box::new(instr)));
		link_node(&self.cur, target);
	}

	pub fn visit_jump_cond_instr(
		&mut self,
		cond: Value,
		target_true: &Node,
		target_false: &Node,
	) {
		let instr = JumpCondInstr {
			var_type: VarType::I32,
			cond,
			target_true: target_true.borrow().label(),
			target_false: target_false.borrow().label(),
		};
		self.cur.borrow_mut().set_jump(Some(Box::new(instr)));
		link_node(&self.cur, target_true);
		link_node(&self.cur, target_false);
	}

	pub fn visit_ret(&mut self, value: Option<Value>) {
		let instr = RetInstr { value };
		self.cur.borrow_mut().set_jump(Some(Box::new(instr)));
	}

	pub fn visit_end(self) -> (LlvmFunc, LlvmTempManager) {
		let func = LlvmFunc {
			total: self.total,
			cfg: CFG {
				blocks: self.blocks,
			},
			name: self.name,
			ret_type: self.ret_type,
			params: self.params,
		};
		(func, self.temp_mgr)
	}
}
