use std::{collections::HashMap, rc::Rc};

use crate::{
	cfg::{Node, CFG},
	cfg_loop::{Loop, LoopPtr},
	dominator::DomTree,
};

pub struct LoopAnalysis {
	pub top_loops: Vec<LoopPtr>,
	// block id -> innermost loop containing the block
	pub loop_map: HashMap<i32, LoopPtr>,
}

struct LoopDfs<'a> {
	dom: &'a DomTree,
	total: u32,
	loop_map: HashMap<i32, LoopPtr>,
	loops: Vec<LoopPtr>,
}

fn outermost_of(loop_: LoopPtr) -> LoopPtr {
	let mut cur = loop_;
	loop {
		let next = cur.borrow().outer_loop();
		match next {
			Some(outer) => cur = outer,
			None => return cur,
		}
	}
}

impl LoopDfs<'_> {
	// Post-order walk of the dominator tree, so inner loops are discovered
	// before the loops enclosing them.
	fn dfs(&mut self, cur: Node) {
		let cur_id = cur.borrow().id;
		for child in self.dom.get_children(cur_id) {
			self.dfs(child);
		}
		// a back edge is a predecessor dominated by the header candidate
		let mut worklist: Vec<Node> = cur
			.borrow()
			.prev
			.iter()
			.filter(|v| self.dom.dominates_block(cur_id, v.borrow().id))
			.cloned()
			.collect();
		if worklist.is_empty() {
			return;
		}
		let new_loop = Loop::new_ptr(self.total, cur.clone());
		self.total += 1;
		self.loops.push(new_loop.clone());
		// walk backwards from the latches until the header is reached,
		// claiming unvisited blocks and re-parenting loops found on the way
		while let Some(bb) = worklist.pop() {
			let bb_id = bb.borrow().id;
			match self.loop_map.get(&bb_id).cloned() {
				None => {
					self.loop_map.insert(bb_id, new_loop.clone());
					if bb_id != cur_id {
						worklist.extend(bb.borrow().prev.iter().cloned());
					}
				}
				Some(inner) => {
					let inner = outermost_of(inner);
					if Rc::ptr_eq(&inner, &new_loop) {
						continue;
					}
					inner.borrow_mut().outer = Some(Rc::downgrade(&new_loop));
					let header = inner.borrow().header.clone();
					worklist.extend(header.borrow().prev.iter().cloned());
				}
			}
		}
	}
}

impl CFG {
	pub fn loop_analysis(&self, dom: &DomTree) -> LoopAnalysis {
		let mut state = LoopDfs {
			dom,
			total: 0,
			loop_map: HashMap::new(),
			loops: Vec::new(),
		};
		state.dfs(self.get_entry());
		// inner loops come first in discovery order, so every parent sees
		// its direct children exactly once
		for loop_ in state.loops.iter() {
			let outer = loop_.borrow().outer_loop();
			if let Some(outer) = outer {
				outer.borrow_mut().subloops.push(loop_.clone());
			}
		}
		// member blocks follow the layout order of the function
		for bb in self.blocks.iter() {
			let mut cur = state.loop_map.get(&bb.borrow().id).cloned();
			while let Some(loop_) = cur {
				loop_.borrow_mut().blocks.push(bb.clone());
				cur = loop_.borrow().outer_loop();
			}
		}
		let position: HashMap<i32, usize> = self
			.blocks
			.iter()
			.enumerate()
			.map(|(i, v)| (v.borrow().id, i))
			.collect();
		let header_position = |loop_: &LoopPtr| {
			let id = loop_.borrow().header.borrow().id;
			position.get(&id).copied().unwrap_or(usize::MAX)
		};
		for loop_ in state.loops.iter() {
			let mut level = 1;
			let mut cur = loop_.borrow().outer_loop();
			while let Some(outer) = cur {
				level += 1;
				cur = outer.borrow().outer_loop();
			}
			loop_.borrow_mut().level = level;
			loop_.borrow_mut().subloops.sort_by_key(&header_position);
		}
		let mut top_loops: Vec<LoopPtr> = state
			.loops
			.iter()
			.filter(|v| v.borrow().outer_loop().is_none())
			.cloned()
			.collect();
		top_loops.sort_by_key(&header_position);
		log::trace!(
			"loop analysis: {} loops, {} top-level",
			state.loops.len(),
			top_loops.len()
		);
		LoopAnalysis {
			top_loops,
			loop_map: state.loop_map,
		}
	}
}
