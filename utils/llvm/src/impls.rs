use std::collections::HashMap;

use utils::UseTemp;

use crate::{
	llvminstr::*, llvmop::Value, temp::Temp, LlvmInstr, LlvmInstrVariant,
};

fn read_of(values: &[&Value]) -> Vec<Temp> {
	values.iter().flat_map(|v| v.unwrap_temp()).collect()
}

impl std::fmt::Display for ArithInstr {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"{} = {} {} {}, {}",
			self.target, self.op, self.var_type, self.lhs, self.rhs
		)
	}
}

impl UseTemp<Temp> for ArithInstr {
	fn get_read(&self) -> Vec<Temp> {
		read_of(&[&self.lhs, &self.rhs])
	}
	fn get_write(&self) -> Option<Temp> {
		Some(self.target.clone())
	}
}

impl LlvmInstrTrait for ArithInstr {
	fn get_variant(&self) -> LlvmInstrVariant {
		LlvmInstrVariant::ArithInstr(self)
	}
	fn clone_box(&self) -> LlvmInstr {
		Box::new(self.clone())
	}
	fn map_temp(&mut self, map: &HashMap<Temp, Value>) {
		map_value(&mut self.lhs, map);
		map_value(&mut self.rhs, map);
	}
}

impl std::fmt::Display for CompInstr {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"{} = {} {} {} {}, {}",
			self.target, self.kind, self.op, self.var_type, self.lhs, self.rhs
		)
	}
}

impl UseTemp<Temp> for CompInstr {
	fn get_read(&self) -> Vec<Temp> {
		read_of(&[&self.lhs, &self.rhs])
	}
	fn get_write(&self) -> Option<Temp> {
		Some(self.target.clone())
	}
}

impl LlvmInstrTrait for CompInstr {
	fn get_variant(&self) -> LlvmInstrVariant {
		LlvmInstrVariant::CompInstr(self)
	}
	fn clone_box(&self) -> LlvmInstr {
		Box::new(self.clone())
	}
	fn map_temp(&mut self, map: &HashMap<Temp, Value>) {
		map_value(&mut self.lhs, map);
		map_value(&mut self.rhs, map);
	}
}

impl std::fmt::Display for ConvertInstr {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"{} = {} {} {} to {}",
			self.target,
			self.op,
			self.op.type_from(),
			self.lhs,
			self.to_type
		)
	}
}

impl UseTemp<Temp> for ConvertInstr {
	fn get_read(&self) -> Vec<Temp> {
		read_of(&[&self.lhs])
	}
	fn get_write(&self) -> Option<Temp> {
		Some(self.target.clone())
	}
}

impl LlvmInstrTrait for ConvertInstr {
	fn get_variant(&self) -> LlvmInstrVariant {
		LlvmInstrVariant::ConvertInstr(self)
	}
	fn clone_box(&self) -> LlvmInstr {
		Box::new(self.clone())
	}
	fn map_temp(&mut self, map: &HashMap<Temp, Value>) {
		map_value(&mut self.lhs, map);
	}
}

impl std::fmt::Display for SelectInstr {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"{} = select i1 {}, {} {}, {} {}",
			self.target, self.cond, self.var_type, self.lhs, self.var_type, self.rhs
		)
	}
}

impl UseTemp<Temp> for SelectInstr {
	fn get_read(&self) -> Vec<Temp> {
		read_of(&[&self.cond, &self.lhs, &self.rhs])
	}
	fn get_write(&self) -> Option<Temp> {
		Some(self.target.clone())
	}
}

impl LlvmInstrTrait for SelectInstr {
	fn get_variant(&self) -> LlvmInstrVariant {
		LlvmInstrVariant::SelectInstr(self)
	}
	fn clone_box(&self) -> LlvmInstr {
		Box::new(self.clone())
	}
	fn map_temp(&mut self, map: &HashMap<Temp, Value>) {
		map_value(&mut self.cond, map);
		map_value(&mut self.lhs, map);
		map_value(&mut self.rhs, map);
	}
}

impl std::fmt::Display for GEPInstr {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"{} = getelementptr {} {}, {}",
			self.target, self.var_type, self.addr, self.offset
		)
	}
}

impl UseTemp<Temp> for GEPInstr {
	fn get_read(&self) -> Vec<Temp> {
		read_of(&[&self.addr, &self.offset])
	}
	fn get_write(&self) -> Option<Temp> {
		Some(self.target.clone())
	}
}

impl LlvmInstrTrait for GEPInstr {
	fn get_variant(&self) -> LlvmInstrVariant {
		LlvmInstrVariant::GEPInstr(self)
	}
	fn clone_box(&self) -> LlvmInstr {
		Box::new(self.clone())
	}
	fn map_temp(&mut self, map: &HashMap<Temp, Value>) {
		map_value(&mut self.addr, map);
		map_value(&mut self.offset, map);
	}
}

impl std::fmt::Display for AllocInstr {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"{} = alloc {} {}",
			self.target, self.var_type, self.length
		)
	}
}

impl UseTemp<Temp> for AllocInstr {
	fn get_read(&self) -> Vec<Temp> {
		read_of(&[&self.length])
	}
	fn get_write(&self) -> Option<Temp> {
		Some(self.target.clone())
	}
}

impl LlvmInstrTrait for AllocInstr {
	fn get_variant(&self) -> LlvmInstrVariant {
		LlvmInstrVariant::AllocInstr(self)
	}
	fn clone_box(&self) -> LlvmInstr {
		Box::new(self.clone())
	}
	fn map_temp(&mut self, map: &HashMap<Temp, Value>) {
		map_value(&mut self.length, map);
	}
	fn has_sideeffect(&self) -> bool {
		true
	}
}

impl std::fmt::Display for LoadInstr {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "{} = load {} {}", self.target, self.var_type, self.addr)
	}
}

impl UseTemp<Temp> for LoadInstr {
	fn get_read(&self) -> Vec<Temp> {
		read_of(&[&self.addr])
	}
	fn get_write(&self) -> Option<Temp> {
		Some(self.target.clone())
	}
}

impl LlvmInstrTrait for LoadInstr {
	fn get_variant(&self) -> LlvmInstrVariant {
		LlvmInstrVariant::LoadInstr(self)
	}
	fn clone_box(&self) -> LlvmInstr {
		Box::new(self.clone())
	}
	fn map_temp(&mut self, map: &HashMap<Temp, Value>) {
		map_value(&mut self.addr, map);
	}
	fn has_sideeffect(&self) -> bool {
		true
	}
}

impl std::fmt::Display for StoreInstr {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"store {} {}, {}",
			self.value.get_type(),
			self.value,
			self.addr
		)
	}
}

impl UseTemp<Temp> for StoreInstr {
	fn get_read(&self) -> Vec<Temp> {
		read_of(&[&self.value, &self.addr])
	}
}

impl LlvmInstrTrait for StoreInstr {
	fn get_variant(&self) -> LlvmInstrVariant {
		LlvmInstrVariant::StoreInstr(self)
	}
	fn clone_box(&self) -> LlvmInstr {
		Box::new(self.clone())
	}
	fn map_temp(&mut self, map: &HashMap<Temp, Value>) {
		map_value(&mut self.value, map);
		map_value(&mut self.addr, map);
	}
	fn has_sideeffect(&self) -> bool {
		true
	}
}

impl std::fmt::Display for CallInstr {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let params = self
			.params
			.iter()
			.map(|(t, v)| format!("{} {}", t, v))
			.collect::<Vec<_>>()
			.join(", ");
		write!(
			f,
			"{} = call {} @{}({})",
			self.target, self.var_type, self.func, params
		)
	}
}

impl UseTemp<Temp> for CallInstr {
	fn get_read(&self) -> Vec<Temp> {
		self.params.iter().flat_map(|(_, v)| v.unwrap_temp()).collect()
	}
	fn get_write(&self) -> Option<Temp> {
		Some(self.target.clone())
	}
}

impl LlvmInstrTrait for CallInstr {
	fn get_variant(&self) -> LlvmInstrVariant {
		LlvmInstrVariant::CallInstr(self)
	}
	fn clone_box(&self) -> LlvmInstr {
		Box::new(self.clone())
	}
	fn map_temp(&mut self, map: &HashMap<Temp, Value>) {
		for (_, value) in self.params.iter_mut() {
			map_value(value, map);
		}
	}
	fn has_sideeffect(&self) -> bool {
		true
	}
}

impl std::fmt::Display for PhiInstr {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let sources = self
			.source
			.iter()
			.map(|(v, l)| format!("[{}, label %{}]", v, l))
			.collect::<Vec<_>>()
			.join(", ");
		write!(f, "{} = phi {} {}", self.target, self.var_type, sources)
	}
}

impl UseTemp<Temp> for PhiInstr {
	fn get_read(&self) -> Vec<Temp> {
		self.source.iter().flat_map(|(v, _)| v.unwrap_temp()).collect()
	}
	fn get_write(&self) -> Option<Temp> {
		Some(self.target.clone())
	}
}

impl LlvmInstrTrait for PhiInstr {
	fn get_variant(&self) -> LlvmInstrVariant {
		LlvmInstrVariant::PhiInstr(self)
	}
	fn clone_box(&self) -> LlvmInstr {
		Box::new(self.clone())
	}
	fn map_temp(&mut self, map: &HashMap<Temp, Value>) {
		for (value, _) in self.source.iter_mut() {
			map_value(value, map);
		}
	}
	fn is_phi(&self) -> bool {
		true
	}
}

impl std::fmt::Display for JumpInstr {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "br label %{}", self.target)
	}
}

impl UseTemp<Temp> for JumpInstr {}

impl LlvmInstrTrait for JumpInstr {
	fn get_variant(&self) -> LlvmInstrVariant {
		LlvmInstrVariant::JumpInstr(self)
	}
	fn clone_box(&self) -> LlvmInstr {
		Box::new(self.clone())
	}
	fn map_temp(&mut self, _map: &HashMap<Temp, Value>) {}
}

impl std::fmt::Display for JumpCondInstr {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"br {} {}, label %{}, label %{}",
			self.var_type, self.cond, self.target_true, self.target_false
		)
	}
}

impl UseTemp<Temp> for JumpCondInstr {
	fn get_read(&self) -> Vec<Temp> {
		read_of(&[&self.cond])
	}
}

impl LlvmInstrTrait for JumpCondInstr {
	fn get_variant(&self) -> LlvmInstrVariant {
		LlvmInstrVariant::JumpCondInstr(self)
	}
	fn clone_box(&self) -> LlvmInstr {
		Box::new(self.clone())
	}
	fn map_temp(&mut self, map: &HashMap<Temp, Value>) {
		map_value(&mut self.cond, map);
	}
}

impl std::fmt::Display for RetInstr {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match &self.value {
			Some(v) => write!(f, "ret {} {}", v.get_type(), v),
			None => write!(f, "ret void"),
		}
	}
}

impl UseTemp<Temp> for RetInstr {
	fn get_read(&self) -> Vec<Temp> {
		self.value.iter().flat_map(|v| v.unwrap_temp()).collect()
	}
}

impl LlvmInstrTrait for RetInstr {
	fn get_variant(&self) -> LlvmInstrVariant {
		LlvmInstrVariant::RetInstr(self)
	}
	fn clone_box(&self) -> LlvmInstr {
		Box::new(self.clone())
	}
	fn map_temp(&mut self, map: &HashMap<Temp, Value>) {
		if let Some(value) = self.value.as_mut() {
			map_value(value, map);
		}
	}
	fn is_ret(&self) -> bool {
		true
	}
}

impl UseTemp<Temp> for LlvmInstr {
	fn get_read(&self) -> Vec<Temp> {
		self.as_ref().get_read()
	}
	fn get_write(&self) -> Option<Temp> {
		self.as_ref().get_write()
	}
}
