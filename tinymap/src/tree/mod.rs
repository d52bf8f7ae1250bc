use anyhow::Result;

pub mod mappings;

pub trait NodeInfo<I> {
	fn get_node_info(&self) -> &I;
	fn get_node_info_mut(&mut self) -> &mut I;
	fn new(info: I) -> Self;
}

pub trait ToKey<K> {
	fn get_key(&self) -> Result<K>;
}

pub mod names {
	use std::fmt::{Debug, Formatter};
	use std::ops::{Index, IndexMut};
	use anyhow::{anyhow, bail, Context, Error, Result};
	use crate::error::NamespaceNotFoundError;

	/// Describes a given namespace of a mapping tree.
	///
	/// Obtain one with [`Namespaces::get_namespace`]. It's only meaningful for the mappings it was obtained from,
	/// indexing [`Names`] of other mappings with it may panic.
	#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
	pub struct Namespace(pub(crate) usize);

	impl Namespace {
		/// The source namespace, the one in which keys and descriptors are given.
		pub const SRC: Namespace = Namespace(0);

		pub fn id(self) -> usize {
			self.0
		}

		pub fn is_src(self) -> bool {
			self.0 == 0
		}
	}

	/// A struct storing the names of the namespaces, in order. The first one is the source namespace.
	///
	/// Invariants: there is at least one namespace, no name is empty, and no name appears twice.
	///
	/// Implements the [Index] trait for [Namespace].
	#[derive(Clone, PartialEq, Eq)]
	pub struct Namespaces {
		names: Vec<String>,
	}

	impl Index<Namespace> for Namespaces {
		type Output = String;

		fn index(&self, index: Namespace) -> &Self::Output {
			&self.names[index.0]
		}
	}

	impl Namespaces {
		pub fn names(&self) -> &[String] {
			&self.names
		}

		pub fn len(&self) -> usize {
			self.names.len()
		}

		pub fn is_empty(&self) -> bool {
			self.names.is_empty()
		}

		/// The name of the source namespace.
		pub fn src(&self) -> &str {
			&self.names[0]
		}

		pub fn contains(&self, name: &str) -> bool {
			self.names.iter().any(|x| x == name)
		}

		pub fn iter(&self) -> impl Iterator<Item=(Namespace, &str)> {
			self.names.iter().enumerate().map(|(id, name)| (Namespace(id), name.as_str()))
		}

		pub fn get_namespace(&self, name: &str) -> Result<Namespace> {
			for (id, namespace) in self.names.iter().enumerate() {
				if namespace == name {
					return Ok(Namespace(id))
				}
			}
			Err(NamespaceNotFoundError {
				namespace: name.to_owned(),
				available: self.names.clone(),
			}.into())
		}

		/// Returns an error if the names of `self` aren't the names given in the argument.
		/// This can be used to check that after reading mappings, you have the correct namespaces in them.
		pub fn check_that(&self, names: &[&str]) -> Result<()> {
			if self.names != names {
				bail!("expected namespaces {names:?}, got {self:?}");
			}
			Ok(())
		}

		pub(crate) fn reorder(&self, table: &[Namespace]) -> Result<Namespaces> {
			table.iter()
				.map(|&namespace| self.names.get(namespace.0).cloned()
					.with_context(|| anyhow!("namespace {namespace:?} out of range for {self:?}")))
				.collect::<Result<Vec<_>>>()?
				.try_into()
		}

		/// Renames namespaces by the given table. Namespaces not in the table keep their name.
		pub(crate) fn rename(&self, table: &[(&str, &str)]) -> Result<Namespaces> {
			self.names.iter()
				.map(|name| {
					table.iter()
						.find(|(from, _)| *from == name.as_str())
						.map_or_else(|| name.clone(), |(_, to)| (*to).to_owned())
				})
				.collect::<Vec<_>>()
				.try_into()
				.with_context(|| anyhow!("cannot rename namespaces {self:?} with {table:?}"))
		}
	}

	impl Debug for Namespaces {
		fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
			f.debug_list()
				.entries(&self.names)
				.finish()
		}
	}

	impl TryFrom<Vec<String>> for Namespaces {
		type Error = Error;

		fn try_from(value: Vec<String>) -> Result<Self> {
			if value.is_empty() {
				bail!("there must be at least one namespace");
			}
			if value.iter().any(|i| i.is_empty()) {
				bail!("found empty namespace name in {value:?}, every namespace name must be non-empty");
			}
			for (i, name) in value.iter().enumerate() {
				if value[..i].contains(name) {
					bail!("namespace {name:?} appears more than once in {value:?}");
				}
			}

			Ok(Namespaces { names: value })
		}
	}

	impl TryFrom<&[&str]> for Namespaces {
		type Error = Error;

		fn try_from(value: &[&str]) -> Result<Self> {
			value.iter().map(|x| (*x).to_owned()).collect::<Vec<_>>().try_into()
		}
	}

	impl From<Namespaces> for Vec<String> {
		fn from(value: Namespaces) -> Self {
			value.names
		}
	}

	/// A struct storing names for namespaces, one (possibly absent) name per namespace.
	///
	/// Implements the [Index] and [IndexMut] traits for [Namespace].
	#[derive(Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
	pub struct Names<T> {
		names: Vec<Option<T>>,
	}

	impl<T> Index<Namespace> for Names<T> {
		type Output = Option<T>;

		fn index(&self, index: Namespace) -> &Self::Output {
			&self.names[index.0]
		}
	}

	impl<T> IndexMut<Namespace> for Names<T> {
		fn index_mut(&mut self, index: Namespace) -> &mut Self::Output {
			&mut self.names[index.0]
		}
	}

	impl<T> Names<T> {
		pub(crate) fn none(len: usize) -> Names<T> {
			let names = std::iter::repeat_with(|| None).take(len).collect();
			Names { names }
		}

		pub(crate) fn from_first_name(src: T, len: usize) -> Names<T> {
			let mut names = Names::none(len);
			if let Some(zero) = names.names.first_mut() {
				*zero = Some(src);
			}
			names
		}

		pub fn len(&self) -> usize {
			self.names.len()
		}

		pub fn is_empty(&self) -> bool {
			self.names.is_empty()
		}

		pub fn first_name(&self) -> Result<&T> where T: Debug {
			self.names.first().context("no namespaces, therefore no name in the first namespace")?
				.as_ref().with_context(|| anyhow!("no name for the first namespace: {self:?}"))
		}

		pub fn names(&self) -> &[Option<T>] {
			&self.names
		}

		/// Gets the name for the namespace, if the namespace exists and has a name.
		pub fn get(&self, namespace: Namespace) -> Option<&T> {
			self.names.get(namespace.0).and_then(Option::as_ref)
		}

		pub(crate) fn reorder(&self, table: &[Namespace]) -> Names<T> where T: Clone {
			let names = table.iter()
				.map(|&namespace| self.names.get(namespace.0).cloned().flatten())
				.collect();

			Names { names }
		}

		/// Takes over every name `other` has, keeping the names `other` doesn't have.
		pub(crate) fn merge(&mut self, other: Names<T>) {
			for (name, other) in self.names.iter_mut().zip(other.names) {
				if other.is_some() {
					*name = other;
				}
			}
		}

		/// Returns `true` if only the first namespace has a name.
		pub(crate) fn only_first(&self) -> bool {
			self.names.iter().skip(1).all(Option::is_none)
		}
	}

	impl<T: Debug> Debug for Names<T> {
		fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
			f.debug_list()
				.entries(&self.names)
				.finish()
		}
	}

	/// Note that empty inputs are converted into `None`.
	impl<T> From<Vec<T>> for Names<T> where T: AsRef<str> {
		fn from(value: Vec<T>) -> Self {
			let names = value.into_iter()
				.map(|x| if x.as_ref().is_empty() { None } else { Some(x) })
				.collect();

			Names { names }
		}
	}

	impl<T> TryFrom<Vec<Option<T>>> for Names<T> where T: AsRef<str> + Debug {
		type Error = Error;

		fn try_from(value: Vec<Option<T>>) -> Result<Self> {
			if value.iter().any(|i| i.as_ref().is_some_and(|i| i.as_ref().is_empty())) {
				bail!("cannot create names where an existing name is an empty string: {value:?}");
			}

			Ok(Names { names: value })
		}
	}

	impl<T> From<Names<T>> for Vec<Option<T>> {
		fn from(value: Names<T>) -> Self {
			value.names
		}
	}
}
