pub mod basicblock;
pub mod cfg;
pub mod cfg_loop;
pub mod dominator;
pub mod func;
pub mod funcemitter;
pub mod program;

mod impls;

pub use basicblock::{BasicBlock, Node};

pub type LlvmNode = Node;
pub type LlvmCFG = cfg::CFG;
