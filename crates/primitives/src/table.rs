use std::cmp::Ordering;

use crate::Value;


/// Errors raised when building or reshaping a [`Table`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
	#[error("column {column:?} has {found} rows, expected {expected}")]
	LengthMismatch { column: String, expected: usize, found: usize },
	#[error("index has {found} labels, expected {expected}")]
	IndexLength { expected: usize, found: usize },
	#[error("duplicate column {0:?}")]
	DuplicateColumn(String),
	#[error("unknown column {0:?}")]
	UnknownColumn(String),
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
	pub name: String,
	pub values: Vec<Value>,
}

/// Column-oriented table with a labelled row index.
///
/// Every column holds exactly one cell per index label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
	index_name: Option<String>,
	index: Vec<Value>,
	columns: Vec<Column>,
}

impl Table {
	/// Creates an empty table with no rows and no columns.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a table from `(name, cells)` pairs with a `0..n` range index.
	pub fn from_columns<I, S>(columns: I) -> Result<Self, TableError>
	where
		I: IntoIterator<Item = (S, Vec<Value>)>,
		S: Into<String>,
	{
		let mut out: Vec<Column> = Vec::new();
		for (name, values) in columns {
			let name = name.into();
			if out.iter().any(|c| c.name == name) {
				return Err(TableError::DuplicateColumn(name));
			}
			if let Some(first) = out.first()
				&& first.values.len() != values.len()
			{
				return Err(TableError::LengthMismatch {
					column: name,
					expected: first.values.len(),
					found: values.len(),
				});
			}
			out.push(Column { name, values });
		}

		let rows = out.first().map_or(0, |c| c.values.len());
		Ok(Self {
			index_name: None,
			index: (0..rows as i64).map(Value::Int).collect(),
			columns: out,
		})
	}

	/// Replaces the row index.
	pub fn with_index(mut self, name: Option<&str>, labels: Vec<Value>) -> Result<Self, TableError> {
		if labels.len() != self.num_rows() {
			return Err(TableError::IndexLength {
				expected: self.num_rows(),
				found: labels.len(),
			});
		}
		self.index_name = name.map(str::to_string);
		self.index = labels;
		Ok(self)
	}

	pub fn num_rows(&self) -> usize {
		self.index.len()
	}

	pub fn num_columns(&self) -> usize {
		self.columns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.index.is_empty() && self.columns.is_empty()
	}

	pub fn index(&self) -> &[Value] {
		&self.index
	}

	pub fn index_name(&self) -> Option<&str> {
		self.index_name.as_deref()
	}

	pub fn columns(&self) -> &[Column] {
		&self.columns
	}

	pub fn column_names(&self) -> impl Iterator<Item = &str> {
		self.columns.iter().map(|c| c.name.as_str())
	}

	pub fn column(&self, name: &str) -> Option<&Column> {
		self.columns.iter().find(|c| c.name == name)
	}

	/// Returns a table holding only `names`, in the given order. The index is kept.
	pub fn select(&self, names: &[&str]) -> Result<Self, TableError> {
		let mut columns = Vec::with_capacity(names.len());
		for &name in names {
			let column = self
				.column(name)
				.ok_or_else(|| TableError::UnknownColumn(name.to_string()))?;
			if columns.iter().any(|c: &Column| c.name == name) {
				return Err(TableError::DuplicateColumn(name.to_string()));
			}
			columns.push(column.clone());
		}
		Ok(Self {
			index_name: self.index_name.clone(),
			index: self.index.clone(),
			columns,
		})
	}

	/// Returns a copy with rows stably reordered by the cells of `column`.
	pub fn sort_by(&self, column: &str, descending: bool) -> Result<Self, TableError> {
		let key = self
			.column(column)
			.ok_or_else(|| TableError::UnknownColumn(column.to_string()))?;

		let mut order: Vec<usize> = (0..self.num_rows()).collect();
		order.sort_by(|&a, &b| {
			let ord = compare_cells(&key.values[a], &key.values[b]);
			if descending { ord.reverse() } else { ord }
		});

		let permute = |cells: &[Value]| order.iter().map(|&i| cells[i].clone()).collect::<Vec<_>>();
		Ok(Self {
			index_name: self.index_name.clone(),
			index: permute(&self.index),
			columns: self
				.columns
				.iter()
				.map(|c| Column {
					name: c.name.clone(),
					values: permute(&c.values),
				})
				.collect(),
		})
	}
}

/// Numeric order with `-0.0 == 0.0`; NaNs sort by sign past either end.
fn compare_floats(x: f64, y: f64) -> Ordering {
	x.partial_cmp(&y).unwrap_or_else(|| x.total_cmp(&y))
}

/// Exact comparison of an integer with a float, without rounding the integer.
fn compare_int_float(int: i64, float: f64) -> Ordering {
	const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

	if float.is_nan() {
		return if float.is_sign_negative() { Ordering::Greater } else { Ordering::Less };
	}
	if float >= TWO_POW_63 {
		return Ordering::Less;
	}
	if float < -TWO_POW_63 {
		return Ordering::Greater;
	}
	let whole = float.trunc();
	match int.cmp(&(whole as i64)) {
		Ordering::Equal if float > whole => Ordering::Less,
		Ordering::Equal if float < whole => Ordering::Greater,
		ord => ord,
	}
}

/// Total order over cells: nulls first, then numbers, bools, strings, and containers.
fn compare_cells(a: &Value, b: &Value) -> Ordering {
	fn rank(v: &Value) -> u8 {
		match v {
			Value::Null => 0,
			Value::Int(_) | Value::Float(_) => 1,
			Value::Bool(_) => 2,
			Value::String(_) => 3,
			Value::List(_) => 4,
			Value::Map(_) => 5,
		}
	}

	match (a, b) {
		(Value::Int(x), Value::Int(y)) => x.cmp(y),
		(Value::Float(x), Value::Float(y)) => compare_floats(*x, *y),
		(Value::Int(x), Value::Float(y)) => compare_int_float(*x, *y),
		(Value::Float(x), Value::Int(y)) => compare_int_float(*y, *x).reverse(),
		(Value::Bool(x), Value::Bool(y)) => x.cmp(y),
		(Value::String(x), Value::String(y)) => x.cmp(y),
		_ => rank(a).cmp(&rank(b)),
	}
}
