pub mod indvar_elim;
pub mod licm;

mod impls;
mod loop_walk;

use cfgir::program::LlvmProgram;
use utils::Result;

pub use impls::run_pipeline;
pub use indvar_elim::DerivedIvElim;
pub use licm::SimpleLicm;

pub trait IrOptimizer {
	fn new() -> Self
	where
		Self: Sized;
	fn name(&self) -> &'static str;
	// Returns whether the program changed.
	fn apply(self, program: &mut LlvmProgram) -> Result<bool>;
}

// Both loop passes in their intended order.
#[derive(Default)]
pub struct Optimizer {}
