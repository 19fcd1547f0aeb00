pub mod llvminstr;
pub mod llvmop;
pub mod llvmvar;
pub mod temp;

mod impls;

pub use llvminstr::*;
pub use llvmop::*;
pub use llvmvar::*;
pub use temp::*;

pub type LlvmTemp = Temp;
pub type LlvmTempManager = TempManager;
pub type LlvmInstr = Box<dyn LlvmInstrTrait>;

// Closed view over the instruction kinds, for exhaustive dispatch in the
// analyses and passes.
pub enum LlvmInstrVariant<'a> {
	ArithInstr(&'a ArithInstr),
	CompInstr(&'a CompInstr),
	ConvertInstr(&'a ConvertInstr),
	SelectInstr(&'a SelectInstr),
	GEPInstr(&'a GEPInstr),
	AllocInstr(&'a AllocInstr),
	LoadInstr(&'a LoadInstr),
	StoreInstr(&'a StoreInstr),
	CallInstr(&'a CallInstr),
	PhiInstr(&'a PhiInstr),
	JumpInstr(&'a JumpInstr),
	JumpCondInstr(&'a JumpCondInstr),
	RetInstr(&'a RetInstr),
}

impl Clone for LlvmInstr {
	fn clone(&self) -> Self {
		self.clone_box()
	}
}
