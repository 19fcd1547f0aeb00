use utils::Label;

pub use crate::basicblock::{BasicBlock, Node};

pub struct CFG {
	pub blocks: Vec<Node>,
}

impl CFG {
	pub fn new(id: i32) -> Self {
		Self {
			blocks: vec![BasicBlock::new_node(id)],
		}
	}
	pub fn get_entry(&self) -> Node {
		self.blocks.first().unwrap().clone()
	}
	pub fn entry_label(&self) -> Label {
		self.get_entry().borrow().label()
	}
	pub fn size(&self) -> usize {
		self.blocks.len()
	}
	pub fn get_block(&self, id: i32) -> Option<Node> {
		self.blocks.iter().find(|v| v.borrow().id == id).cloned()
	}
}

pub fn link_node(from: &Node, to: &Node) {
	from.borrow_mut().succ.push(to.clone());
	to.borrow_mut().prev.push(from.clone());
}
