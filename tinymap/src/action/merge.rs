//! Merging two mappings that share one namespace.

use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;
use anyhow::{bail, Context, Result};
use indexmap::{IndexMap, IndexSet};
use log::warn;
use crate::error::IncompatibleMergeError;
use crate::tree::names::{Names, Namespace, Namespaces};
use crate::tree::mappings::{ClassMapping, ClassNowodeMapping, FieldMapping, FieldNowodeMapping, JavadocMapping, MappingInfo, Mappings, MethodMapping, MethodNowodeMapping, ParameterMapping, ParameterNowodeMapping};
use crate::tree::NodeInfo;

/// Both mappings gave a different value for the same thing. The value of the first (left) mappings is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
	/// Where the conflict is, like `class "Main" method "run" "()V"`.
	pub location: String,
	/// What the conflict is about, either a namespace name or `"comment"`.
	pub what: String,
	pub kept: String,
	pub discarded: String,
}

impl Display for MergeConflict {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "conflicting {} for {}: kept {:?}, discarded {:?}", self.what, self.location, self.kept, self.discarded)
	}
}

/// Collects conflicts, with the namespace names of the merged layout.
struct Conflicts<'a> {
	namespaces: &'a Namespaces,
	conflicts: Vec<MergeConflict>,
}

impl Conflicts<'_> {
	fn record(&mut self, location: impl FnOnce() -> String, what: String, kept: &str, discarded: &str) {
		let conflict = MergeConflict {
			location: location(),
			what,
			kept: kept.to_owned(),
			discarded: discarded.to_owned(),
		};
		warn!("{conflict}");
		self.conflicts.push(conflict);
	}

	/// Puts the names of `a` and `b` (both with the join namespace first) into the merged layout:
	/// the join namespace, then the other namespaces of `a`, then the other namespaces of `b`.
	fn names<T>(&mut self, location: impl Fn() -> String, a: Option<&Names<T>>, b: Option<&Names<T>>, a_len: usize, b_len: usize) -> Result<Names<T>>
	where
		T: Clone + AsRef<str> + Debug,
	{
		let join = match (a.and_then(|a| a[Namespace::SRC].as_ref()), b.and_then(|b| b[Namespace::SRC].as_ref())) {
			(Some(a), Some(b)) => {
				if a.as_ref() != b.as_ref() {
					self.record(&location, self.namespaces[Namespace::SRC].clone(), a.as_ref(), b.as_ref());
				}
				Some(a.clone())
			},
			(a, b) => a.or(b).cloned(),
		};

		let mut names = Vec::with_capacity(a_len + b_len - 1);
		names.push(join);
		match a {
			Some(a) => names.extend(a.names()[1..].iter().cloned()),
			None => names.extend(std::iter::repeat_with(|| None).take(a_len - 1)),
		}
		match b {
			Some(b) => names.extend(b.names()[1..].iter().cloned()),
			None => names.extend(std::iter::repeat_with(|| None).take(b_len - 1)),
		}

		names.try_into()
	}

	fn javadoc(&mut self, location: impl FnOnce() -> String, a: Option<&Option<JavadocMapping>>, b: Option<&Option<JavadocMapping>>) -> Option<JavadocMapping> {
		match (a.and_then(Option::as_ref), b.and_then(Option::as_ref)) {
			(Some(a), Some(b)) => {
				if a != b {
					self.record(location, "comment".to_owned(), &a.0, &b.0);
				}
				Some(a.clone())
			},
			(a, b) => a.or(b).cloned(),
		}
	}
}

/// Entries without a name in the shared namespace are only keyed by some other name, so they can't be matched with
/// an entry of the other mappings.
fn check_joinable<T>(location: impl FnOnce() -> String, a: Option<&Names<T>>, b: Option<&Names<T>>) -> Result<()> {
	if let (Some(a), Some(b)) = (a, b) {
		if a[Namespace::SRC].is_none() || b[Namespace::SRC].is_none() {
			bail!("cannot merge {}: it has no name in the shared namespace, but its key is used on both sides", location());
		}
	}
	Ok(())
}

/// Iterates over the union of the keys of both maps, sorted.
fn sorted_keys<'a, K, V>(a: Option<&'a IndexMap<K, V>>, b: Option<&'a IndexMap<K, V>>) -> Vec<&'a K>
where
	K: Hash + Eq + Ord,
{
	let keys_a = a.into_iter().flat_map(|x| x.keys());
	let keys_b = b.into_iter().flat_map(|x| x.keys());

	let keys: IndexSet<&K> = keys_a.chain(keys_b).collect();
	let mut keys: Vec<&K> = keys.into_iter().collect();
	keys.sort();
	keys
}

impl Mappings {
	/// Merges two mappings that share exactly one namespace.
	///
	/// The resulting namespaces are the ones of `a`, followed by the ones of `b` that aren't the shared one. The
	/// source namespace is the one of `a`.
	///
	/// Entries are matched by their name in the shared namespace. Entries that only one of the mappings has keep absent
	/// names for the namespaces of the other one, and entries without a name in the shared namespace are never matched.
	/// If both mappings give different names (or
	/// comments) for the same thing, the one from `a` is kept, and a warning is logged. Use
	/// [`Mappings::merge_with_conflicts`] to also get these conflicts.
	///
	/// If the mappings don't share exactly one namespace, this fails with an
	/// [`IncompatibleMergeError`][crate::error::IncompatibleMergeError].
	///
	/// ```
	/// # use pretty_assertions::assert_eq;
	/// let a = "\
	/// tiny	2	0	intermediary	official
	/// c	class_1	a
	/// ";
	/// let b = "\
	/// tiny	2	0	intermediary	named
	/// c	class_1	Main
	/// ";
	/// let a = tinymap::tiny_v2::read(a.as_bytes()).unwrap();
	/// let b = tinymap::tiny_v2::read(b.as_bytes()).unwrap();
	///
	/// let merged = tinymap::tree::mappings::Mappings::merge(&a, &b).unwrap();
	///
	/// let output = "\
	/// tiny	2	0	intermediary	official	named
	/// c	class_1	a	Main
	/// ";
	/// assert_eq!(tinymap::tiny_v2::write_string(&merged).unwrap(), output);
	/// ```
	pub fn merge(a: &Mappings, b: &Mappings) -> Result<Mappings> {
		Mappings::merge_with_conflicts(a, b).map(|(mappings, _)| mappings)
	}

	/// Like [`Mappings::merge`], but also returns all the conflicts found.
	pub fn merge_with_conflicts(a: &Mappings, b: &Mappings) -> Result<(Mappings, Vec<MergeConflict>)> {
		let shared: Vec<&String> = a.info.namespaces.names().iter()
			.filter(|name| b.info.namespaces.contains(name))
			.collect();

		let [join] = shared.as_slice() else {
			return Err(IncompatibleMergeError {
				left: a.info.namespaces.names().to_vec(),
				right: b.info.namespaces.names().to_vec(),
				shared: shared.iter().map(|name| (*name).clone()).collect(),
			}.into());
		};
		let join = join.as_str();

		let a_join = a.switch_source(join).context("failed to switch the left mappings to the shared namespace")?;
		let b_join = b.switch_source(join).context("failed to switch the right mappings to the shared namespace")?;

		let a_len = a_join.info.namespaces.len();
		let b_len = b_join.info.namespaces.len();

		let namespaces: Namespaces = a_join.info.namespaces.names().iter()
			.chain(&b_join.info.namespaces.names()[1..])
			.cloned()
			.collect::<Vec<_>>()
			.try_into()?;

		let mut properties = a_join.info.properties.clone();
		for (key, value) in &b_join.info.properties {
			properties.entry(key.clone()).or_insert_with(|| value.clone());
		}

		let mut merged = Mappings::new(MappingInfo { namespaces: namespaces.clone(), properties });
		let mut conflicts = Conflicts { namespaces: &namespaces, conflicts: Vec::new() };

		for class_key in sorted_keys(Some(&a_join.classes), Some(&b_join.classes)) {
			let a = a_join.classes.get(class_key);
			let b = b_join.classes.get(class_key);
			let class_location = || format!("class {:?}", class_key.as_str());
			check_joinable(class_location, a.map(|x| &x.info.names), b.map(|x| &x.info.names))?;

			let mut class = ClassNowodeMapping::new(ClassMapping {
				names: conflicts.names(class_location, a.map(|x| &x.info.names), b.map(|x| &x.info.names), a_len, b_len)?,
			});
			class.javadoc = conflicts.javadoc(class_location, a.map(|x| &x.javadoc), b.map(|x| &x.javadoc));

			for field_key in sorted_keys(a.map(|x| &x.fields), b.map(|x| &x.fields)) {
				let a = a.and_then(|x| x.fields.get(field_key));
				let b = b.and_then(|x| x.fields.get(field_key));
				let location = || format!("class {:?} field {:?} {:?}", class_key.as_str(), field_key.name.as_str(), field_key.desc.as_str());
				check_joinable(location, a.map(|x| &x.info.names), b.map(|x| &x.info.names))?;

				let mut field = FieldNowodeMapping::new(FieldMapping {
					desc: field_key.desc.clone(),
					names: conflicts.names(location, a.map(|x| &x.info.names), b.map(|x| &x.info.names), a_len, b_len)?,
				});
				field.javadoc = conflicts.javadoc(location, a.map(|x| &x.javadoc), b.map(|x| &x.javadoc));

				class.insert_field(field_key.clone(), field)?;
			}

			for method_key in sorted_keys(a.map(|x| &x.methods), b.map(|x| &x.methods)) {
				let a = a.and_then(|x| x.methods.get(method_key));
				let b = b.and_then(|x| x.methods.get(method_key));
				let location = || format!("class {:?} method {:?} {:?}", class_key.as_str(), method_key.name.as_str(), method_key.desc.as_str());
				check_joinable(location, a.map(|x| &x.info.names), b.map(|x| &x.info.names))?;

				let mut method = MethodNowodeMapping::new(MethodMapping {
					desc: method_key.desc.clone(),
					names: conflicts.names(location, a.map(|x| &x.info.names), b.map(|x| &x.info.names), a_len, b_len)?,
				});
				method.javadoc = conflicts.javadoc(location, a.map(|x| &x.javadoc), b.map(|x| &x.javadoc));

				for parameter_key in sorted_keys(a.map(|x| &x.parameters), b.map(|x| &x.parameters)) {
					let a = a.and_then(|x| x.parameters.get(parameter_key));
					let b = b.and_then(|x| x.parameters.get(parameter_key));
					let location = || format!("{} parameter {}", location(), parameter_key.index);

					let mut parameter = ParameterNowodeMapping::new(ParameterMapping {
						index: parameter_key.index,
						names: conflicts.names(location, a.map(|x| &x.info.names), b.map(|x| &x.info.names), a_len, b_len)?,
					});
					parameter.javadoc = conflicts.javadoc(location, a.map(|x| &x.javadoc), b.map(|x| &x.javadoc));

					method.add_parameter(parameter)?;
				}

				class.insert_method(method_key.clone(), method)?;
			}

			merged.insert_class(class_key.clone(), class)?;
		}

		let conflicts = conflicts.conflicts;

		// back to the order of `a`, followed by the new namespaces from `b`
		let order: Vec<&str> = a.info.namespaces.names().iter()
			.chain(b.info.namespaces.names().iter().filter(|name| name.as_str() != join))
			.map(String::as_str)
			.collect();

		let merged = merged.reorder(&order)
			.context("failed to reorder the merged mappings")?;

		Ok((merged, conflicts))
	}
}
