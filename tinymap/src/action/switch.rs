use anyhow::{anyhow, Context, Result};
use crate::tree::mappings::Mappings;
use crate::tree::names::Namespace;

impl Mappings {
	#[allow(clippy::tabs_in_doc_comments)]
	/// Makes the given namespace the source namespace, by swapping it with the current source namespace.
	///
	/// All other namespaces keep their position, so switching back gives the mappings from before. Descriptors get
	/// remapped to the class names of the new source namespace.
	///
	/// Entries that don't have a name in the new source namespace keep their old key, and their names stay as they are.
	///
	/// ```
	/// # use pretty_assertions::assert_eq;
	/// let input = "\
	/// tiny	2	0	official	intermediary	named
	/// c	a	class_1	Main
	/// 	f	La;	b	field_1	instance
	/// ";
	/// let output = "\
	/// tiny	2	0	intermediary	official	named
	/// c	class_1	a	Main
	/// 	f	Lclass_1;	field_1	b	instance
	/// ";
	/// let mappings = tinymap::tiny_v2::read(input.as_bytes()).unwrap()
	/// 	.switch_source("intermediary").unwrap();
	/// assert_eq!(tinymap::tiny_v2::write_string(&mappings).unwrap(), output);
	/// ```
	pub fn switch_source(&self, namespace: &str) -> Result<Mappings> {
		let target = self.get_namespace(namespace)?;
		if target.is_src() {
			return Ok(self.clone());
		}

		let mut table: Vec<Namespace> = (0..self.info.namespaces.len()).map(Namespace).collect();
		table.swap(Namespace::SRC.id(), target.id());

		self.reorder_table(&table)
			.with_context(|| anyhow!("failed to switch source namespace of {:?} to {namespace:?}", self.info.namespaces))
	}
}
