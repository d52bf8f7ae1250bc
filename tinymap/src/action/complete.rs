use anyhow::{bail, Result};
use log::debug;
use crate::tree::names::{Names, Namespace};
use crate::tree::mappings::Mappings;

impl Mappings {
	#[allow(clippy::tabs_in_doc_comments)]
	/// Gives every entry without a name in the namespace `target` its name from the namespace `fallback`.
	///
	/// Returns how many names were filled in.
	///
	/// ```
	/// # use pretty_assertions::assert_eq;
	/// let input = "\
	/// tiny	2	0	intermediary	named
	/// c	class_1	Main
	/// c	class_2	
	/// 	m	()V	method_1	
	/// ";
	/// let mut mappings = tinymap::tiny_v2::read(input.as_bytes()).unwrap();
	/// assert_eq!(mappings.complete_namespace("named", "intermediary").unwrap(), 2);
	///
	/// let output = "\
	/// tiny	2	0	intermediary	named
	/// c	class_1	Main
	/// c	class_2	class_2
	/// 	m	()V	method_1	method_1
	/// ";
	/// assert_eq!(tinymap::tiny_v2::write_string(&mappings).unwrap(), output);
	/// ```
	pub fn complete_namespace(&mut self, target: &str, fallback: &str) -> Result<usize> {
		let target_namespace = self.get_namespace(target)?;
		let fallback_namespace = self.get_namespace(fallback)?;
		if target_namespace == fallback_namespace {
			bail!("cannot complete namespace {target:?} from itself");
		}

		let mut filled = 0;

		for class in self.classes.values_mut() {
			fill_names(&mut class.info.names, target_namespace, fallback_namespace, &mut filled);
			for field in class.fields.values_mut() {
				fill_names(&mut field.info.names, target_namespace, fallback_namespace, &mut filled);
			}
			for method in class.methods.values_mut() {
				fill_names(&mut method.info.names, target_namespace, fallback_namespace, &mut filled);
				for parameter in method.parameters.values_mut() {
					fill_names(&mut parameter.info.names, target_namespace, fallback_namespace, &mut filled);
				}
			}
		}

		debug!("completed {filled} names of {target:?} from {fallback:?}");
		Ok(filled)
	}
}

fn fill_names<T: Clone>(names: &mut Names<T>, target: Namespace, fallback: Namespace, filled: &mut usize) {
	if names[target].is_none() {
		if let Some(name) = names[fallback].clone() {
			names[target] = Some(name);
			*filled += 1;
		}
	}
}
