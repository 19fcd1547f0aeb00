use crate::simulator::StackValue;

fn getint(chars: &[char], position: &mut usize) -> Option<i32> {
	// skip whitespace and other non-printable bytes
	while chars.get(*position).is_some_and(|c| !c.is_ascii_graphic()) {
		*position += 1;
	}
	let negative = chars.get(*position) == Some(&'-');
	if negative {
		*position += 1;
	}
	let mut seen_digit = false;
	let mut result: i32 = 0;
	while let Some(d) = chars.get(*position).and_then(|c| c.to_digit(10)) {
		result = result.wrapping_mul(10).wrapping_add(d as i32);
		seen_digit = true;
		*position += 1;
	}
	if !seen_digit {
		return None;
	}
	Some(if negative { -result } else { result })
}

// Runtime IO builtins. Returns (handled, return value); an unhandled name
// falls through to a user-defined function.
pub fn inout(
	name: &str,
	params: &[StackValue],
	output: &mut Vec<String>,
	input: &str,
	input_position: &mut usize,
) -> (bool, Option<StackValue>) {
	let chars: Vec<char> = input.chars().collect();
	match name {
		"putint" => {
			output.push(params[0].as_i32().to_string());
			(true, None)
		}
		"putch" => {
			output.push(char::from(params[0].as_i32() as u8).to_string());
			(true, None)
		}
		"getch" => {
			let value = chars.get(*input_position).map(|c| *c as i32);
			if value.is_some() {
				*input_position += 1;
			}
			(true, value.map(StackValue::from))
		}
		"getint" => {
			(true, getint(&chars, input_position).map(StackValue::from))
		}
		_ => (false, None),
	}
}
