use std::fmt::Display;

// Symbolic name of a basic block or function in the IR text form. Block 0
// is always the function entry and keeps the name "entry"; every other
// block is "B<id>".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
	pub name: String,
}

impl Display for Label {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		self.name.fmt(f)
	}
}

impl Label {
	pub fn new(name: impl Display) -> Self {
		Self {
			name: name.to_string(),
		}
	}
	pub fn block(id: i32) -> Self {
		if id == 0 {
			Self::new("entry")
		} else {
			Self::new(format!("B{}", id))
		}
	}
	// Inverse of `block`; unknown spellings map to -1.
	pub fn block_id(&self) -> i32 {
		match self.name.as_str() {
			"entry" => 0,
			name => {
				name.strip_prefix('B').and_then(|v| v.parse().ok()).unwrap_or(-1)
			}
		}
	}
}
