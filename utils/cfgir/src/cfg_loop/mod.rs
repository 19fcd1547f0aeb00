use std::{
	cell::RefCell,
	fmt::Display,
	rc::{Rc, Weak},
};

use crate::LlvmNode;

pub type LoopPtr = Rc<RefCell<Loop>>;

pub mod loop_analysis;

pub use loop_analysis::LoopAnalysis;

// A natural loop detected in the flow graph, identified by its header block.
// Loops form a forest: `outer` is a weak upref so that parent and children
// never own each other in a cycle.
pub struct Loop {
	pub id: u32,
	pub outer: Option<Weak<RefCell<Loop>>>,
	pub header: LlvmNode,
	pub level: i32,
	pub subloops: Vec<LoopPtr>,
	pub blocks: Vec<LlvmNode>,
}

impl Loop {
	pub fn new(id: u32, header: LlvmNode) -> Self {
		Self {
			id,
			outer: None,
			header,
			level: -1,
			subloops: Vec::new(),
			blocks: Vec::new(),
		}
	}
	pub fn new_ptr(id: u32, header: LlvmNode) -> LoopPtr {
		Rc::new(RefCell::new(Self::new(id, header)))
	}
	pub fn outer_loop(&self) -> Option<LoopPtr> {
		self.outer.as_ref().and_then(Weak::upgrade)
	}
	pub fn is_innermost(&self) -> bool {
		self.subloops.is_empty()
	}
	pub fn contains_block(&self, id: i32) -> bool {
		self.blocks.iter().any(|v| v.borrow().id == id)
	}
	// The unique predecessor of the header outside the loop, provided it
	// branches to the header alone. Hoisting lands right before its
	// terminator; a loop without one is left untouched.
	pub fn get_loop_preheader(&self) -> Option<LlvmNode> {
		let header = self.header.borrow();
		let mut outside =
			header.prev.iter().filter(|v| !self.contains_block(v.borrow().id));
		let preheader = outside.next()?.clone();
		if outside.next().is_some() {
			return None;
		}
		if preheader.borrow().succ.len() != 1 {
			return None;
		}
		Some(preheader)
	}
}

impl PartialEq for Loop {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for Loop {}

impl Display for Loop {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let outer = match self.outer_loop() {
			Some(outer) => format!("{}", outer.borrow().header.borrow().id),
			None => "None".to_string(),
		};
		write!(
			f,
			"outer: {}, header: {}, level: {}, blocks: {:?}",
			outer,
			self.header.borrow().id,
			self.level,
			self.blocks.iter().map(|v| v.borrow().id).collect::<Vec<_>>()
		)
	}
}
