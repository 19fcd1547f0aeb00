use llvm::{Value, VarType};

use crate::{
	basicblock::{BasicBlock, Node},
	cfg::CFG,
};

pub struct LlvmFunc {
	// Number of basic blocks ever created; the next block gets id total+1.
	// Not necessarily cfg.blocks.len(): ids may have gaps after removals.
	pub total: i32,
	pub cfg: CFG,
	pub name: String,
	pub ret_type: VarType,
	pub params: Vec<Value>,
}

impl LlvmFunc {
	pub fn len(&self) -> usize {
		self.cfg.blocks.iter().map(|v| v.borrow().instrs.len()).sum()
	}
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
	pub fn new_basicblock(&mut self) -> Node {
		self.total += 1;
		BasicBlock::new_node(self.total)
	}
}
