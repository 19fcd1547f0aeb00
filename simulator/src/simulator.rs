use std::collections::HashMap;

use cfgir::program::LlvmProgram;
use llvm::{
	ArithInstr, ArithOp, CompInstr, CompOp, ConvertOp, LlvmInstr,
	LlvmInstrVariant, Value, VarType,
};

use crate::inout::inout;

#[derive(Debug, Clone, Copy)]
pub enum StackValue {
	Int(i32),
	Float(f32),
	Ptr(usize),
}

impl Default for StackValue {
	fn default() -> Self {
		StackValue::Int(0)
	}
}

impl From<i32> for StackValue {
	fn from(value: i32) -> Self {
		StackValue::Int(value)
	}
}

impl From<f32> for StackValue {
	fn from(value: f32) -> Self {
		StackValue::Float(value)
	}
}

impl StackValue {
	pub fn as_i32(&self) -> i32 {
		match self {
			StackValue::Int(v) => *v,
			_ => unreachable!(),
		}
	}
	pub fn as_f32(&self) -> f32 {
		match self {
			StackValue::Float(v) => *v,
			_ => unreachable!(),
		}
	}
	pub fn as_ptr(&self) -> usize {
		match self {
			StackValue::Ptr(v) => *v,
			_ => unreachable!(),
		}
	}
}

struct FuncStackFrame {
	pub ra: Option<usize>,
	pub name: String,
	pub fp: usize,
	pub last_label: String,
	pub current_label: String,
	pub temp: HashMap<String, StackValue>,
	// the caller temp receiving the return value; None for void calls
	pub return_to: Option<String>,
}

// Interprets a whole program, one flattened instruction at a time. Memory is
// a byte-addressed stack of 4-byte cells, so every pointer and alloc length
// the IR computes stays in byte units.
pub struct MiddleSimulator {
	pub input: String,
	pub input_position: usize,
	pub output: Vec<String>,
	pub step_count: usize,
	pub instr_list: Vec<LlvmInstr>,
	// function name -> block label -> pc
	pub label_map: HashMap<String, HashMap<String, usize>>,
	pub return_scratch: Option<StackValue>,
	pub pc: usize,
	memory_stack: Vec<StackValue>,
	calling_stack: Vec<FuncStackFrame>,
	calling_params: HashMap<String, Vec<Value>>,
}

impl MiddleSimulator {
	pub fn new(input: String) -> Self {
		MiddleSimulator {
			input,
			input_position: 0,
			output: Vec::new(),
			step_count: 0,
			instr_list: Vec::new(),
			label_map: HashMap::new(),
			return_scratch: None,
			pc: 0,
			memory_stack: Vec::new(),
			calling_stack: Vec::new(),
			calling_params: HashMap::new(),
		}
	}

	fn init(&mut self, program: &LlvmProgram) {
		self.instr_list = Vec::new();
		for func in &program.funcs {
			self.calling_params.insert(func.name.clone(), func.params.clone());
			let mut labels = HashMap::new();
			for block in &func.cfg.blocks {
				let label = block.borrow().label();
				labels.insert(label.name.clone(), self.instr_list.len());
				for instr in &block.borrow().phi_instrs {
					self.instr_list.push(Box::new(instr.clone()));
				}
				for instr in &block.borrow().instrs {
					self.instr_list.push(instr.clone());
				}
				if let Some(instr) = &block.borrow().jump_instr {
					self.instr_list.push(instr.clone());
				}
			}
			self.label_map.insert(func.name.clone(), labels);
		}
	}

	pub fn run_program(&mut self, program: &LlvmProgram) {
		self.init(program);
		self.pc = *self.label_map.get("main").unwrap().get("entry").unwrap();
		self.calling_stack.push(FuncStackFrame {
			ra: None,
			name: "main".into(),
			fp: self.memory_stack.len(),
			last_label: String::new(),
			current_label: "entry".into(),
			temp: HashMap::new(),
			return_to: None,
		});

		loop {
			let instr = self.instr_list.get(self.pc).unwrap();
			log::trace!("pc {}: {}", self.pc, instr);
			self.step_count += 1;
			let mut next = self.pc + 1;
			let frame = self.calling_stack.last_mut().unwrap();
			let labels = self.label_map.get(&frame.name).unwrap();
			let mut return_info: Option<(Option<String>, Option<StackValue>)> =
				None;

			match instr.get_variant() {
				LlvmInstrVariant::ArithInstr(instr) => {
					do_arith_instr(instr, frame)
				}
				LlvmInstrVariant::CompInstr(instr) => do_comp_instr(instr, frame),
				LlvmInstrVariant::ConvertInstr(instr) => {
					let value = get_stack(&instr.lhs, frame);
					let value = match instr.op {
						ConvertOp::Int2Float => {
							StackValue::Float(value.as_i32() as f32)
						}
						ConvertOp::Float2Int => {
							StackValue::Int(value.as_f32() as i32)
						}
					};
					frame.temp.insert(instr.target.name.clone(), value);
				}
				LlvmInstrVariant::SelectInstr(instr) => {
					let cond = get_stack(&instr.cond, frame).as_i32();
					let value = if cond != 0 {
						get_stack(&instr.lhs, frame)
					} else {
						get_stack(&instr.rhs, frame)
					};
					frame.temp.insert(instr.target.name.clone(), value);
				}
				LlvmInstrVariant::GEPInstr(instr) => {
					let addr = get_stack(&instr.addr, frame).as_ptr();
					let offset = get_stack(&instr.offset, frame).as_i32();
					let value =
						StackValue::Ptr((addr as i64 + offset as i64) as usize);
					frame.temp.insert(instr.target.name.clone(), value);
				}
				LlvmInstrVariant::AllocInstr(instr) => {
					let length = get_stack(&instr.length, frame).as_i32() as usize;
					let addr = self.memory_stack.len() * 4;
					self.memory_stack.resize(
						self.memory_stack.len() + length.div_ceil(4),
						StackValue::default(),
					);
					frame
						.temp
						.insert(instr.target.name.clone(), StackValue::Ptr(addr));
				}
				LlvmInstrVariant::LoadInstr(instr) => {
					let addr = get_stack(&instr.addr, frame).as_ptr();
					let value = self.memory_stack[addr / 4];
					frame.temp.insert(instr.target.name.clone(), value);
				}
				LlvmInstrVariant::StoreInstr(instr) => {
					let value = get_stack(&instr.value, frame);
					let addr = get_stack(&instr.addr, frame).as_ptr();
					self.memory_stack[addr / 4] = value;
				}
				LlvmInstrVariant::PhiInstr(instr) => {
					for (value, label) in &instr.source {
						if label.name == frame.last_label {
							let value = get_stack(value, frame);
							frame.temp.insert(instr.target.name.clone(), value);
							break;
						}
					}
				}
				LlvmInstrVariant::JumpInstr(instr) => {
					frame.last_label = frame.current_label.clone();
					frame.current_label = instr.target.name.clone();
					next = *labels.get(&instr.target.name).unwrap();
				}
				LlvmInstrVariant::JumpCondInstr(instr) => {
					let value = get_stack(&instr.cond, frame);
					let jump = match instr.var_type {
						VarType::F32 => value.as_f32() != 0f32,
						_ => value.as_i32() != 0,
					};
					let target = if jump {
						&instr.target_true
					} else {
						&instr.target_false
					};
					frame.last_label = frame.current_label.clone();
					frame.current_label = target.name.clone();
					next = *labels.get(&target.name).unwrap();
				}
				LlvmInstrVariant::RetInstr(instr) => {
					let value = instr.value.as_ref().map(|v| get_stack(v, frame));
					self.memory_stack.truncate(frame.fp);
					self.return_scratch = value;
					match frame.ra {
						Some(ra) => {
							next = ra;
							return_info = Some((frame.return_to.clone(), value));
						}
						None => break,
					}
				}
				LlvmInstrVariant::CallInstr(instr) => {
					let params: Vec<StackValue> = instr
						.params
						.iter()
						.map(|(_, value)| get_stack(value, frame))
						.collect();
					let (handled, result) = inout(
						&instr.func.name,
						&params,
						&mut self.output,
						&self.input,
						&mut self.input_position,
					);
					if handled {
						if let Some(value) = result {
							frame.temp.insert(instr.target.name.clone(), value);
						}
					} else {
						let names: Vec<String> = self
							.calling_params
							.get(&instr.func.name)
							.unwrap()
							.iter()
							.filter_map(|v| v.unwrap_temp())
							.map(|t| t.name)
							.collect();
						assert_eq!(names.len(), params.len());
						let temp: HashMap<String, StackValue> =
							names.into_iter().zip(params).collect();
						let return_to = match instr.var_type {
							VarType::Void => None,
							_ => Some(instr.target.name.clone()),
						};
						self.calling_stack.push(FuncStackFrame {
							ra: Some(self.pc + 1),
							name: instr.func.name.clone(),
							fp: self.memory_stack.len(),
							last_label: String::new(),
							current_label: "entry".into(),
							temp,
							return_to,
						});
						next = *self
							.label_map
							.get(&instr.func.name)
							.unwrap()
							.get("entry")
							.unwrap();
					}
				}
			}
			self.pc = next;
			if let Some((return_to, value)) = return_info {
				self.calling_stack.pop();
				if let (Some(name), Some(value)) = (return_to, value) {
					self
						.calling_stack
						.last_mut()
						.unwrap()
						.temp
						.insert(name, value);
				}
			}
		}
	}

	pub fn return_value(&self) -> Option<i32> {
		self.return_scratch.map(|v| v.as_i32())
	}
}

fn get_stack(value: &Value, frame: &FuncStackFrame) -> StackValue {
	match value {
		Value::Int(v) => StackValue::Int(*v),
		Value::Float(v) => StackValue::Float(*v),
		Value::Temp(t) => *frame.temp.get(&t.name).unwrap(),
	}
}

fn do_arith_instr(instr: &ArithInstr, frame: &mut FuncStackFrame) {
	let lhs = get_stack(&instr.lhs, frame);
	let rhs = get_stack(&instr.rhs, frame);
	let value: StackValue = match instr.op {
		ArithOp::Add => lhs.as_i32().wrapping_add(rhs.as_i32()).into(),
		ArithOp::Sub => lhs.as_i32().wrapping_sub(rhs.as_i32()).into(),
		ArithOp::Mul => lhs.as_i32().wrapping_mul(rhs.as_i32()).into(),
		ArithOp::Div => lhs.as_i32().wrapping_div(rhs.as_i32()).into(),
		ArithOp::Rem => lhs.as_i32().wrapping_rem(rhs.as_i32()).into(),
		ArithOp::Fadd => (lhs.as_f32() + rhs.as_f32()).into(),
		ArithOp::Fsub => (lhs.as_f32() - rhs.as_f32()).into(),
		ArithOp::Fmul => (lhs.as_f32() * rhs.as_f32()).into(),
		ArithOp::Fdiv => (lhs.as_f32() / rhs.as_f32()).into(),
		ArithOp::Shl => (lhs.as_i32().wrapping_shl(rhs.as_i32() as u32)).into(),
		ArithOp::Lshr => {
			(((lhs.as_i32() as u32) >> (rhs.as_i32() as u32 & 31)) as i32).into()
		}
		ArithOp::Ashr => (lhs.as_i32() >> (rhs.as_i32() & 31)).into(),
		ArithOp::And => (lhs.as_i32() & rhs.as_i32()).into(),
		ArithOp::Or => (lhs.as_i32() | rhs.as_i32()).into(),
		ArithOp::Xor => (lhs.as_i32() ^ rhs.as_i32()).into(),
	};
	frame.temp.insert(instr.target.name.clone(), value);
}

fn do_comp_instr(instr: &CompInstr, frame: &mut FuncStackFrame) {
	let lhs = get_stack(&instr.lhs, frame);
	let rhs = get_stack(&instr.rhs, frame);
	let value: bool = match instr.op {
		CompOp::EQ => lhs.as_i32() == rhs.as_i32(),
		CompOp::NE => lhs.as_i32() != rhs.as_i32(),
		CompOp::SGT => lhs.as_i32() > rhs.as_i32(),
		CompOp::SGE => lhs.as_i32() >= rhs.as_i32(),
		CompOp::SLT => lhs.as_i32() < rhs.as_i32(),
		CompOp::SLE => lhs.as_i32() <= rhs.as_i32(),
		CompOp::OEQ => lhs.as_f32() == rhs.as_f32(),
		CompOp::ONE => lhs.as_f32() != rhs.as_f32(),
		CompOp::OGT => lhs.as_f32() > rhs.as_f32(),
		CompOp::OGE => lhs.as_f32() >= rhs.as_f32(),
		CompOp::OLT => lhs.as_f32() < rhs.as_f32(),
		CompOp::OLE => lhs.as_f32() <= rhs.as_f32(),
	};
	frame.temp.insert(instr.target.name.clone(), (value as i32).into());
}
