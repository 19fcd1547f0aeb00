pub use clap::Parser;

#[derive(Parser, Debug)]
pub struct Args {
	// comma-separated pass pipeline, defaults to both loop passes
	#[arg(long)]
	pub passes: Option<String>,

	// print the optimized IR
	#[arg(long)]
	pub llvm: bool,

	// execute the optimized program on the interpreter
	#[arg(long)]
	pub run: bool,

	#[arg(short)]
	pub output: Option<String>,
}
