use cfgir::program::LlvmProgram;
use utils::{errors::LoopOptError, Result};

use crate::{DerivedIvElim, IrOptimizer, Optimizer, SimpleLicm};

fn run_pass(name: &str, program: &mut LlvmProgram) -> Result<bool> {
	match name {
		"derived-iv-elim" => DerivedIvElim::new().apply(program),
		"simple-licm" => SimpleLicm::new().apply(program),
		_ => Err(LoopOptError::PipelineError(format!(
			"unknown pass `{}`",
			name
		))),
	}
}

// Runs a comma-separated pass list in order. Returns whether any pass
// changed the program.
pub fn run_pipeline(program: &mut LlvmProgram, passes: &str) -> Result<bool> {
	let mut changed = false;
	for name in passes.split(',').map(str::trim).filter(|v| !v.is_empty()) {
		let flag = run_pass(name, program)?;
		log::info!("pass {}: changed {}", name, flag);
		changed |= flag;
	}
	Ok(changed)
}

impl IrOptimizer for Optimizer {
	fn new() -> Self {
		Self {}
	}
	fn name(&self) -> &'static str {
		"optimizer"
	}
	fn apply(self, program: &mut LlvmProgram) -> Result<bool> {
		let mut changed = DerivedIvElim::new().apply(program)?;
		changed |= SimpleLicm::new().apply(program)?;
		Ok(changed)
	}
}
