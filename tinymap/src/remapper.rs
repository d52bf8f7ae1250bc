//! Remapping of class names and descriptors between two namespaces.
//!
//! An implementor of [`ARemapper`] can be created by [`Mappings::remapper_a`] for remapping between given
//! namespaces. If you implement a remapper yourself, you only need to define [`ARemapper::map_class_fail`].
//!
//! # What is a "remapper"?
//! A remapper answers the question for you "what is the name of X in namespace Y?"

use anyhow::{bail, Result};
use indexmap::IndexMap;
use crate::ident::{ClassName, FieldDescriptor, MethodDescriptor};
use crate::tree::mappings::Mappings;
use crate::tree::names::Namespace;

/// A remapper supporting remapping of class names and descriptors.
pub trait ARemapper {
	/// Maps a class name to a new one, if the mapping exists.
	///
	/// If the mapping doesn't exist, returns `Ok(None)`.
	fn map_class_fail(&self, class: &str) -> Result<Option<ClassName>>;

	/// Maps a class name to a new one, if the mapping doesn't exist, return the old one.
	///
	/// Do not implement this yourself.
	fn map_class(&self, class: &str) -> Result<ClassName> {
		Ok(self.map_class_fail(class)?.unwrap_or_else(|| class.into()))
	}

	/// Maps a field descriptor to a new one.
	///
	/// Note that this relies on the fact that for non-existing class mappings class names are just copied over.
	///
	/// Do not implement this yourself.
	fn map_field_desc(&self, desc: &FieldDescriptor) -> Result<FieldDescriptor> {
		map_desc(self, desc.as_str()).map(FieldDescriptor::from)
	}

	/// Maps a method descriptor to a new one.
	///
	/// Do not implement this yourself.
	fn map_method_desc(&self, desc: &MethodDescriptor) -> Result<MethodDescriptor> {
		map_desc(self, desc.as_str()).map(MethodDescriptor::from)
	}
}

/// Maps all the class names (the parts between `L` and `;`) of a descriptor.
fn map_desc(remapper: &(impl ARemapper + ?Sized), desc: &str) -> Result<String> {
	let mut s = String::with_capacity(desc.len());

	let mut rest = desc;
	while let Some(start) = rest.find('L') {
		let (before, after) = rest.split_at(start + 1);
		s.push_str(before);

		let Some(end) = after.find(';') else {
			bail!("descriptor {desc:?} has a missing semicolon somewhere");
		};
		let class_name = &after[..end];

		s.push_str(remapper.map_class(class_name)?.as_str());
		s.push(';');

		rest = &after[end + 1..];
	}
	s.push_str(rest);

	Ok(s)
}

#[derive(Debug)]
pub struct ARemapperImpl<'a> {
	classes: IndexMap<&'a str, &'a str>,
}

impl ARemapper for ARemapperImpl<'_> {
	fn map_class_fail(&self, class: &str) -> Result<Option<ClassName>> {
		Ok(self.classes.get(class).map(|&class| class.into()))
	}
}

impl Mappings {
	/// Creates a remapper from the class names of the namespace `from` to the ones of `to`.
	///
	/// Classes that don't have a name in either of the namespaces are left out, and so keep their name when remapping.
	/// For the source namespace, the class keys are used, so that classes without a source name are found too.
	pub fn remapper_a(&self, from: Namespace, to: Namespace) -> Result<ARemapperImpl<'_>> {
		let mut classes = IndexMap::new();
		for (key, class) in &self.classes {
			let from = if from.is_src() { Some(key) } else { class.info.names.get(from) };
			if let (Some(from), Some(to)) = (from, class.info.names.get(to)) {
				classes.insert(from.as_str(), to.as_str());
			}
		}
		Ok(ARemapperImpl { classes })
	}
}

#[cfg(test)]
mod testing {
	use anyhow::Result;
	use pretty_assertions::assert_eq;
	use crate::remapper::{map_desc, ARemapper};
	use crate::ident::ClassName;

	struct Swap;

	impl ARemapper for Swap {
		fn map_class_fail(&self, class: &str) -> Result<Option<ClassName>> {
			Ok(match class {
				"a" => Some("pkg/Main".into()),
				"b" => Some("pkg/Other".into()),
				_ => None,
			})
		}
	}

	#[test]
	fn descriptors() -> Result<()> {
		assert_eq!(map_desc(&Swap, "I")?, "I");
		assert_eq!(map_desc(&Swap, "La;")?, "Lpkg/Main;");
		assert_eq!(map_desc(&Swap, "[[La;")?, "[[Lpkg/Main;");
		assert_eq!(map_desc(&Swap, "(ILa;J[Lb;)Lc;")?, "(ILpkg/Main;J[Lpkg/Other;)Lc;");
		assert_eq!(map_desc(&Swap, "(Ljava/lang/String;)V")?, "(Ljava/lang/String;)V");
		Ok(())
	}

	#[test]
	fn missing_semicolon() {
		assert!(map_desc(&Swap, "(La)V").is_err());
	}
}
