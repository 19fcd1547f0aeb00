use std::{cell::RefCell, rc::Rc};

use llvm::{LlvmInstr, PhiInstr};
use utils::{Label, UseTemp};

pub type Node = Rc<RefCell<BasicBlock>>;

pub struct BasicBlock {
	pub id: i32,
	pub prev: Vec<Node>,
	pub succ: Vec<Node>,
	pub phi_instrs: Vec<PhiInstr>,
	pub instrs: Vec<LlvmInstr>,
	pub jump_instr: Option<LlvmInstr>,
}

impl BasicBlock {
	pub fn new(id: i32) -> BasicBlock {
		BasicBlock {
			id,
			prev: Vec::new(),
			succ: Vec::new(),
			phi_instrs: Vec::new(),
			instrs: Vec::new(),
			jump_instr: None,
		}
	}
	pub fn new_node(id: i32) -> Node {
		Rc::new(RefCell::new(Self::new(id)))
	}
	pub fn label(&self) -> Label {
		Label::block(self.id)
	}
	pub fn push(&mut self, instr: LlvmInstr) {
		self.instrs.push(instr);
	}
	pub fn push_phi(&mut self, instr: PhiInstr) {
		self.phi_instrs.push(instr);
	}
	pub fn set_jump(&mut self, instr: Option<LlvmInstr>) {
		self.jump_instr = instr;
	}
	// True iff some instruction of this block reads the temp.
	pub fn reads_temp(&self, temp: &llvm::Temp) -> bool {
		self.phi_instrs.iter().any(|v| v.get_read().contains(temp))
			|| self.instrs.iter().any(|v| v.get_read().contains(temp))
			|| self
				.jump_instr
				.iter()
				.any(|v| v.get_read().contains(temp))
	}
}

impl PartialEq for BasicBlock {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for BasicBlock {}
