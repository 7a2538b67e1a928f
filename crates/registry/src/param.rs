//! Declared parameter signatures.
//!
//! Each element implementation lists its parameters as `&'static [ParamSpec]`. The
//! [`ParamKind`] decides how the raw specification value is resolved before it reaches the
//! constructor; [`Bounds`] and precedence only matter to widget generation.

/// How a raw keyword value is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
	/// Name of a source or transform; `null` means none.
	Source,
	/// Mapping of role to source-or-transform name.
	Sources,
	/// Opt names and inline anonymous opt definitions.
	Opts,
	Views,
	Tools,
	/// Mapping of section to element names whose updates the element watches.
	Dependencies,
	Logger,
	/// Sequence of `[label, field]` pairs.
	Tooltips,
	/// Passed through unchanged.
	Scalar,
}

/// Value domain of a parameter, used to pick a widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
	Any,
	Number { min: Option<f64>, max: Option<f64> },
	Integer { min: Option<i64>, max: Option<i64> },
	Choice(&'static [&'static str]),
	Text,
	Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
	pub name: &'static str,
	pub kind: ParamKind,
	pub doc: &'static str,
	pub bounds: Bounds,
	/// Negative precedence hides the parameter from generated widgets.
	pub precedence: i16,
}

impl ParamSpec {
	pub const fn new(name: &'static str, kind: ParamKind) -> Self {
		Self {
			name,
			kind,
			doc: "",
			bounds: Bounds::Any,
			precedence: 0,
		}
	}

	/// Shorthand for a [`ParamKind::Scalar`] parameter.
	pub const fn scalar(name: &'static str) -> Self {
		Self::new(name, ParamKind::Scalar)
	}

	pub const fn doc(mut self, doc: &'static str) -> Self {
		self.doc = doc;
		self
	}

	pub const fn bounds(mut self, bounds: Bounds) -> Self {
		self.bounds = bounds;
		self
	}

	pub const fn precedence(mut self, precedence: i16) -> Self {
		self.precedence = precedence;
		self
	}

	pub const fn hidden(self) -> Self {
		self.precedence(-1)
	}

	/// True if widget generation should consider this parameter.
	pub fn is_visible(&self) -> bool {
		self.precedence >= 0 && !self.name.starts_with('_') && self.name != "name"
	}

	pub fn find<'a>(params: &'a [ParamSpec], name: &str) -> Option<&'a ParamSpec> {
		params.iter().find(|p| p.name == name)
	}

	/// Kind of `name` in `params`; undeclared keywords resolve as scalars.
	pub fn kind_of(params: &[ParamSpec], name: &str) -> ParamKind {
		Self::find(params, name).map_or(ParamKind::Scalar, |p| p.kind)
	}
}
