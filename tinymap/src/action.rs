pub mod complete;
pub mod merge;
pub(crate) mod reorder;
pub(crate) mod switch;

use anyhow::{Context, Result};
use crate::tree::mappings::Mappings;
use crate::tree::names::Namespace;

impl Mappings {
	/// Renames namespaces, using a table of `(old name, new name)` pairs.
	///
	/// Namespaces not named in the table keep their name. This fails if the renaming gives two namespaces the same
	/// name.
	///
	/// ```
	/// let input = "tiny\t2\t0\tofficial\tnamed\n";
	/// let mappings = tinymap::tiny_v2::read(input.as_bytes()).unwrap()
	/// 	.rename_namespaces(&[("official", "obf")]).unwrap();
	/// mappings.info.namespaces.check_that(&["obf", "named"]).unwrap();
	/// ```
	pub fn rename_namespaces(mut self, table: &[(&str, &str)]) -> Result<Mappings> {
		self.info.namespaces = self.info.namespaces.rename(table)
			.context("failed to rename namespaces")?;
		Ok(self)
	}

	pub fn get_namespace(&self, name: &str) -> Result<Namespace> {
		self.info.namespaces.get_namespace(name)
	}
}
