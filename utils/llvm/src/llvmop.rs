use std::fmt::Display;

use ir_derive::Mnemonic;

use crate::{llvmvar::VarType, temp::Temp};

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	Int(i32),
	Float(f32),
	Temp(Temp),
}

pub trait LlvmOp: Display {
	fn oprand_type(&self) -> VarType;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Mnemonic)]
pub enum ArithOp {
	Add,
	Sub,
	Mul,
	Div,
	// modulo
	Rem,
	Fadd,
	Fsub,
	Fmul,
	Fdiv,
	// shift left
	Shl,
	// logical shift right
	Lshr,
	// arithmetic shift right
	Ashr,
	And,
	Or,
	Xor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Mnemonic)]
pub enum CompOp {
	EQ,
	NE,
	// signed greater than
	SGT,
	// signed greater or equal
	SGE,
	// signed less than
	SLT,
	// signed less or equal
	SLE,
	// ordered float comparisons
	OEQ,
	ONE,
	OGT,
	OGE,
	OLT,
	OLE,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Mnemonic)]
pub enum CompKind {
	Icmp,
	Fcmp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Mnemonic)]
pub enum ConvertOp {
	#[style("sitofp")]
	Int2Float,
	#[style("fptosi")]
	Float2Int,
}

impl Value {
	pub fn get_type(&self) -> VarType {
		match self {
			Self::Int(_) => VarType::I32,
			Self::Float(_) => VarType::F32,
			Self::Temp(v) => v.var_type,
		}
	}
	pub fn unwrap_temp(&self) -> Option<Temp> {
		match self {
			Self::Temp(v) => Some(v.clone()),
			_ => None,
		}
	}
	pub fn is_const(&self) -> bool {
		!matches!(self, Self::Temp(_))
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Int(v) => write!(f, "{}", v),
			Self::Float(v) => write!(f, "{}", v),
			Self::Temp(v) => write!(f, "{}", v),
		}
	}
}

impl LlvmOp for ArithOp {
	fn oprand_type(&self) -> VarType {
		match self {
			Self::Fadd | Self::Fsub | Self::Fmul | Self::Fdiv => VarType::F32,
			_ => VarType::I32,
		}
	}
}

impl LlvmOp for CompOp {
	fn oprand_type(&self) -> VarType {
		match self {
			Self::OEQ | Self::ONE | Self::OGT | Self::OGE | Self::OLT | Self::OLE => {
				VarType::F32
			}
			_ => VarType::I32,
		}
	}
}

impl LlvmOp for CompKind {
	fn oprand_type(&self) -> VarType {
		match self {
			Self::Icmp => VarType::I32,
			Self::Fcmp => VarType::F32,
		}
	}
}

impl ConvertOp {
	pub fn type_from(&self) -> VarType {
		match self {
			Self::Float2Int => VarType::F32,
			Self::Int2Float => VarType::I32,
		}
	}
	pub fn type_to(&self) -> VarType {
		match self {
			Self::Float2Int => VarType::I32,
			Self::Int2Float => VarType::F32,
		}
	}
}
