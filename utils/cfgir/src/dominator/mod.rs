mod naive;

use std::collections::HashMap;

use crate::cfg::{Node, CFG};

pub struct DomTree {
	// block id -> every block it dominates (reflexive)
	pub dominates: HashMap<i32, Vec<Node>>,
	// block id -> immediate dominator
	pub dominator: HashMap<i32, Node>,
	// block id -> children in the dominator tree
	pub dom_direct: HashMap<i32, Vec<Node>>,
}

impl DomTree {
	pub fn new(cfg: &CFG) -> Self {
		let mut dominates = HashMap::new();
		let mut dom_direct = HashMap::new();
		let mut dominator = HashMap::new();
		naive::compute_dominator(
			cfg,
			&mut dominates,
			&mut dom_direct,
			&mut dominator,
		);
		Self {
			dominates,
			dominator,
			dom_direct,
		}
	}
	pub fn get_children(&self, id: i32) -> Vec<Node> {
		self.dom_direct.get(&id).cloned().unwrap_or_default()
	}
	// Does block `a` dominate block `b`?
	pub fn dominates_block(&self, a: i32, b: i32) -> bool {
		a == b
			|| self
				.dominates
				.get(&a)
				.is_some_and(|v| v.iter().any(|node| node.borrow().id == b))
	}
}
