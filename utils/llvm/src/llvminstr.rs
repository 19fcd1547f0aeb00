use std::{collections::HashMap, fmt::Display};

use utils::{Label, UseTemp};

use crate::{
	llvmop::*, llvmvar::VarType, temp::Temp, LlvmInstr, LlvmInstrVariant,
};

pub trait LlvmInstrTrait: Display + UseTemp<Temp> {
	fn get_variant(&self) -> LlvmInstrVariant;
	fn clone_box(&self) -> LlvmInstr;
	// Rewrites every read of a temp according to the map. The written temp is
	// left alone; SSA identity never changes under a use-replacement.
	fn map_temp(&mut self, map: &HashMap<Temp, Value>);
	fn is_phi(&self) -> bool {
		false
	}
	fn is_ret(&self) -> bool {
		false
	}
	// Memory reads/writes and calls. Such instructions are never touched by
	// the register-to-register passes.
	fn has_sideeffect(&self) -> bool {
		false
	}
}

pub fn map_value(value: &mut Value, map: &HashMap<Temp, Value>) {
	if let Value::Temp(temp) = value {
		if let Some(new_value) = map.get(temp) {
			*value = new_value.clone();
		}
	}
}

#[derive(Clone)]
pub struct ArithInstr {
	pub target: Temp,
	pub op: ArithOp,
	pub var_type: VarType,
	pub lhs: Value,
	pub rhs: Value,
}

#[derive(Clone)]
pub struct CompInstr {
	pub kind: CompKind,
	pub target: Temp,
	pub op: CompOp,
	pub var_type: VarType,
	pub lhs: Value,
	pub rhs: Value,
}

#[derive(Clone)]
pub struct ConvertInstr {
	pub target: Temp,
	pub op: ConvertOp,
	pub lhs: Value,
	pub to_type: VarType,
}

#[derive(Clone)]
pub struct SelectInstr {
	pub target: Temp,
	pub var_type: VarType,
	pub cond: Value,
	pub lhs: Value,
	pub rhs: Value,
}

// Pure pointer arithmetic: addr + offset, no dereference.
#[derive(Clone)]
pub struct GEPInstr {
	pub target: Temp,
	pub var_type: VarType,
	pub addr: Value,
	pub offset: Value,
}

#[derive(Clone)]
pub struct AllocInstr {
	pub target: Temp,
	pub var_type: VarType,
	pub length: Value,
}

#[derive(Clone)]
pub struct LoadInstr {
	pub target: Temp,
	pub var_type: VarType,
	pub addr: Value,
}

#[derive(Clone)]
pub struct StoreInstr {
	pub value: Value,
	pub addr: Value,
}

#[derive(Clone)]
pub struct CallInstr {
	pub target: Temp,
	pub var_type: VarType,
	pub func: Label,
	pub params: Vec<(VarType, Value)>,
}

#[derive(Clone)]
pub struct PhiInstr {
	pub target: Temp,
	pub var_type: VarType,
	pub source: Vec<(Value, Label)>,
}

#[derive(Clone)]
pub struct JumpInstr {
	pub target: Label,
}

#[derive(Clone)]
pub struct JumpCondInstr {
	pub var_type: VarType,
	pub cond: Value,
	pub target_true: Label,
	pub target_false: Label,
}

#[derive(Clone)]
pub struct RetInstr {
	pub value: Option<Value>,
}
