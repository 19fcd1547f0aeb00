use llvm::LlvmTempManager;

use crate::func::LlvmFunc;

pub struct LlvmProgram {
	pub funcs: Vec<LlvmFunc>,
	pub temp_mgr: LlvmTempManager,
}

impl LlvmProgram {
	pub fn new() -> Self {
		Self {
			funcs: Vec::new(),
			temp_mgr: LlvmTempManager::new(),
		}
	}
}

impl Default for LlvmProgram {
	fn default() -> Self {
		Self::new()
	}
}
