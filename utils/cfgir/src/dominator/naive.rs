// naive dominator computation with complexity O(n*m): a block w is dominated
// by v iff removing v from the graph makes w unreachable from the entry.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::cfg::{Node, CFG};

pub fn compute_dominator(
	cfg: &CFG,
	dominates: &mut HashMap<i32, Vec<Node>>,
	dominates_directly: &mut HashMap<i32, Vec<Node>>,
	dominator: &mut HashMap<i32, Node>,
) {
	for bb in cfg.blocks.iter() {
		let to_be_removed = bb.borrow().id;

		let mut reachable = HashSet::new();
		let mut worklist = VecDeque::new();
		if to_be_removed != cfg.get_entry().borrow().id {
			worklist.push_back(cfg.get_entry().clone());
		}
		while let Some(cur) = worklist.pop_front() {
			if reachable.contains(&cur.borrow().id) {
				continue;
			}
			reachable.insert(cur.borrow().id);
			for succ in cur.borrow().succ.iter() {
				if succ.borrow().id != to_be_removed {
					worklist.push_back(succ.clone());
				}
			}
		}
		cfg.blocks.iter().for_each(|bb_inner| {
			if !reachable.contains(&bb_inner.borrow().id) {
				dominates.entry(to_be_removed).or_default().push(bb_inner.clone());
			}
		});
	}
	// derive the immediate-dominator relation from the dominates sets
	for bb in cfg.blocks.iter() {
		let bb_id = bb.borrow().id;
		dominates[&bb_id].iter().for_each(|bb_inner| {
			let bb_inner_id = bb_inner.borrow().id;
			if bb_inner_id == bb_id {
				return;
			}
			match dominator.get(&bb_inner_id).map(|v| v.borrow().id) {
				None => {
					dominates_directly
						.entry(bb_id)
						.or_default()
						.push(bb_inner.clone());
					dominator.insert(bb_inner_id, bb.clone());
				}
				// the previously recorded dominator also dominates bb, so bb
				// is the closer one
				Some(old) if dominates[&old].contains(bb) => {
					dominates_directly
						.entry(bb_id)
						.or_default()
						.push(bb_inner.clone());
					dominates_directly
						.entry(old)
						.or_default()
						.retain(|x| x.borrow().id != bb_inner_id);
					dominator.insert(bb_inner_id, bb.clone());
				}
				Some(_) => {}
			}
		});
	}
}
