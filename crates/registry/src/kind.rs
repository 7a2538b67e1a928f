use std::fmt;

/// The element categories a specification can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
	Source,
	Transform,
	Tool,
	Opt,
	View,
	Controller,
	Main,
}

impl ElementKind {
	pub const ALL: [Self; 7] = [
		Self::Source,
		Self::Transform,
		Self::Tool,
		Self::Opt,
		Self::View,
		Self::Controller,
		Self::Main,
	];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Source => "source",
			Self::Transform => "transform",
			Self::Tool => "tool",
			Self::Opt => "opt",
			Self::View => "view",
			Self::Controller => "controller",
			Self::Main => "main",
		}
	}

	/// Top-level specification section holding elements of this kind.
	pub const fn section(self) -> &'static str {
		match self {
			Self::Source => "sources",
			Self::Transform => "transforms",
			Self::Tool => "tools",
			Self::Opt => "opts",
			Self::View => "views",
			Self::Controller => "controllers",
			Self::Main => "main_controller",
		}
	}
}

impl fmt::Display for ElementKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
