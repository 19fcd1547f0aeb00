use cfgir::cfg_loop::LoopPtr;

enum WalkMode {
	Innermost,
	TwoLevel,
}

// Lazy traversal over a loop forest. `innermost` yields only loops without
// subloops, depth first and left to right. `two_level` yields each top-level
// loop followed by its direct children, and never descends further.
pub struct LoopForestWalker {
	stack: Vec<(LoopPtr, u32)>,
	mode: WalkMode,
}

fn seed(top_loops: &[LoopPtr]) -> Vec<(LoopPtr, u32)> {
	top_loops.iter().rev().map(|v| (v.clone(), 0)).collect()
}

impl LoopForestWalker {
	pub fn innermost(top_loops: &[LoopPtr]) -> Self {
		Self {
			stack: seed(top_loops),
			mode: WalkMode::Innermost,
		}
	}
	pub fn two_level(top_loops: &[LoopPtr]) -> Self {
		Self {
			stack: seed(top_loops),
			mode: WalkMode::TwoLevel,
		}
	}
	fn push_subloops(&mut self, loop_: &LoopPtr, depth: u32) {
		self
			.stack
			.extend(loop_.borrow().subloops.iter().rev().map(|v| (v.clone(), depth)));
	}
}

impl Iterator for LoopForestWalker {
	type Item = LoopPtr;
	fn next(&mut self) -> Option<LoopPtr> {
		while let Some((loop_, depth)) = self.stack.pop() {
			match self.mode {
				WalkMode::Innermost => {
					if loop_.borrow().is_innermost() {
						return Some(loop_);
					}
					self.push_subloops(&loop_, depth + 1);
				}
				WalkMode::TwoLevel => {
					if depth == 0 {
						self.push_subloops(&loop_, 1);
					}
					return Some(loop_);
				}
			}
		}
		None
	}
}
