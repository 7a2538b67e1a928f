use std::fmt;

use sha2::{Digest, Sha256};

use crate::{Payload, Table, Value};


/// 256-bit content fingerprint.
///
/// Two structurally equal payloads always produce the same fingerprint, independent of
/// object identity, process, or map insertion order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
	pub const fn as_bytes(&self) -> &[u8; 32] {
		&self.0
	}

	pub fn of_value(value: &Value) -> Self {
		let mut hasher = ContentHasher::new();
		hasher.value(value);
		hasher.finish()
	}

	pub fn of_table(table: &Table) -> Self {
		let mut hasher = ContentHasher::new();
		hasher.table(table);
		hasher.finish()
	}

	pub fn of_payload(payload: &Payload) -> Self {
		let mut hasher = ContentHasher::new();
		hasher.payload(payload);
		hasher.finish()
	}
}

impl fmt::Display for Fingerprint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for b in &self.0 {
			write!(f, "{b:02x}")?;
		}
		Ok(())
	}
}

impl fmt::Debug for Fingerprint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Fingerprint(")?;
		for b in &self.0[..6] {
			write!(f, "{b:02x}")?;
		}
		write!(f, "..)")
	}
}

/// Streaming structural hasher over values, tables, and payloads.
///
/// Every node is prefixed with a variant tag and every sequence with its length, so no two
/// distinct trees feed the same byte stream.
pub struct ContentHasher {
	inner: Sha256,
}

impl Default for ContentHasher {
	fn default() -> Self {
		Self::new()
	}
}

impl ContentHasher {
	pub fn new() -> Self {
		Self { inner: Sha256::new() }
	}

	fn tag(&mut self, tag: u8) {
		self.inner.update([tag]);
	}

	fn len(&mut self, len: usize) {
		self.inner.update((len as u64).to_le_bytes());
	}

	fn str(&mut self, s: &str) {
		self.len(s.len());
		self.inner.update(s.as_bytes());
	}

	fn float(&mut self, f: f64) {
		let canonical = if f == 0.0 {
			0.0f64
		} else if f.is_nan() {
			f64::NAN
		} else {
			f
		};
		self.inner.update(canonical.to_bits().to_le_bytes());
	}

	/// Feeds a structural value. Mapping entries are visited in key order.
	pub fn value(&mut self, value: &Value) {
		match value {
			Value::Null => self.tag(0),
			Value::Bool(b) => {
				self.tag(1);
				self.inner.update([u8::from(*b)]);
			}
			Value::Int(i) => {
				self.tag(2);
				self.inner.update(i.to_le_bytes());
			}
			Value::Float(f) => {
				self.tag(3);
				self.float(*f);
			}
			Value::String(s) => {
				self.tag(4);
				self.str(s);
			}
			Value::List(items) => {
				self.tag(5);
				self.len(items.len());
				for item in items {
					self.value(item);
				}
			}
			Value::Map(map) => {
				self.tag(6);
				self.len(map.len());
				let mut entries: Vec<_> = map.iter().collect();
				entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
				for (k, v) in entries {
					self.str(k);
					self.value(v);
				}
			}
		}
	}

	/// Feeds every cell plus column labels, index labels, and the index name.
	pub fn table(&mut self, table: &Table) {
		self.tag(16);
		match table.index_name() {
			Some(name) => {
				self.tag(1);
				self.str(name);
			}
			None => self.tag(0),
		}
		self.len(table.index().len());
		for label in table.index() {
			self.value(label);
		}
		self.len(table.num_columns());
		for column in table.columns() {
			self.str(&column.name);
			for cell in &column.values {
				self.value(cell);
			}
		}
	}

	pub fn payload(&mut self, payload: &Payload) {
		match payload {
			Payload::Table(t) => self.table(t),
			Payload::Value(v) => {
				self.tag(17);
				self.value(v);
			}
		}
	}

	/// Feeds raw bytes, for callers mixing their own identity into a key.
	pub fn bytes(&mut self, bytes: &[u8]) {
		self.len(bytes.len());
		self.inner.update(bytes);
	}

	pub fn finish(self) -> Fingerprint {
		let digest = self.inner.finalize();
		let mut out = [0u8; 32];
		out.copy_from_slice(&digest);
		Fingerprint(out)
	}
}
