mod inout;
mod simulator;

pub use simulator::{MiddleSimulator, StackValue};
