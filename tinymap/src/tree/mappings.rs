use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexMap;
use indexmap::map::Entry;
use crate::ident::{ClassName, FieldDescriptor, FieldName, MethodDescriptor, MethodName, ParameterName};
use crate::tree::names::{Names, Namespace, Namespaces};
use crate::tree::{NodeInfo, ToKey};

/// A mapping table: the namespaces, and all the classes with their members.
///
/// The first namespace is the source namespace. Classes, fields and methods are keyed by their name in it, and the
/// descriptors are given with class names of it.
///
/// An entry without a name in the source namespace (which can happen after switching or reordering) stays keyed by
/// the name it had before, its names are left as they are.
#[derive(Debug, Clone, PartialEq)]
pub struct Mappings {
	pub info: MappingInfo,
	pub classes: IndexMap<ClassName, ClassNowodeMapping>,
}

impl NodeInfo<MappingInfo> for Mappings {
	fn get_node_info(&self) -> &MappingInfo {
		&self.info
	}

	fn get_node_info_mut(&mut self) -> &mut MappingInfo {
		&mut self.info
	}

	fn new(info: MappingInfo) -> Self {
		Mappings {
			info,
			classes: IndexMap::new(),
		}
	}
}

impl Mappings {
	pub fn add_class(&mut self, child: ClassNowodeMapping) -> Result<&mut ClassNowodeMapping> {
		let key = child.info.get_key()?;
		self.insert_class(key, child)
	}

	pub(crate) fn insert_class(&mut self, key: ClassName, child: ClassNowodeMapping) -> Result<&mut ClassNowodeMapping> {
		self.check_len(child.info.names.len())?;
		match self.classes.entry(key) {
			Entry::Occupied(e) => {
				bail!("cannot add child {child:?} for key {:?}, as there's already one: {:?}", e.key(), e.get());
			},
			Entry::Vacant(e) => {
				Ok(e.insert(child))
			},
		}
	}

	/// Adds the class, or if there's already one with the same key, takes over the names the given one has.
	///
	/// Only the names are merged, fields, methods and comments of `child` are ignored if there's already a class.
	pub fn add_or_merge_class(&mut self, child: ClassNowodeMapping) -> Result<&mut ClassNowodeMapping> {
		self.check_len(child.info.names.len())?;
		Ok(match self.classes.entry(child.info.get_key()?) {
			Entry::Occupied(e) => {
				let class = e.into_mut();
				class.info.names.merge(child.info.names);
				class
			},
			Entry::Vacant(e) => e.insert(child),
		})
	}

	fn check_len(&self, len: usize) -> Result<()> {
		if len != self.info.namespaces.len() {
			bail!("got {len} names, but the mappings have {} namespaces: {:?}", self.info.namespaces.len(), self.info.namespaces);
		}
		Ok(())
	}

	pub fn get_class_name(&self, class: &str, namespace: Namespace) -> Result<&ClassName> {
		self.classes.get(class)
			.with_context(|| anyhow!("no entry for class {class:?}"))?
			.info
			.names
			.get(namespace)
			.with_context(|| anyhow!("no name for namespace {namespace:?} for class {class:?}"))
	}

	/// Counts the classes, fields, methods and parameters in these mappings.
	pub fn count(&self) -> MappingsCount {
		let mut count = MappingsCount::default();
		for class in self.classes.values() {
			count.classes += 1;
			count.fields += class.fields.len();
			count.methods += class.methods.len();
			count.parameters += class.methods.values().map(|x| x.parameters.len()).sum::<usize>();
		}
		count
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingsCount {
	pub classes: usize,
	pub fields: usize,
	pub methods: usize,
	pub parameters: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassNowodeMapping {
	pub info: ClassMapping,
	pub fields: IndexMap<FieldKey, FieldNowodeMapping>,
	pub methods: IndexMap<MethodKey, MethodNowodeMapping>,
	pub javadoc: Option<JavadocMapping>,
}

impl NodeInfo<ClassMapping> for ClassNowodeMapping {
	fn get_node_info(&self) -> &ClassMapping {
		&self.info
	}

	fn get_node_info_mut(&mut self) -> &mut ClassMapping {
		&mut self.info
	}

	fn new(info: ClassMapping) -> Self {
		ClassNowodeMapping {
			info,
			fields: IndexMap::new(),
			methods: IndexMap::new(),
			javadoc: None,
		}
	}
}

impl ClassNowodeMapping {
	pub fn add_field(&mut self, child: FieldNowodeMapping) -> Result<&mut FieldNowodeMapping> {
		let key = child.info.get_key()?;
		self.insert_field(key, child)
	}

	pub(crate) fn insert_field(&mut self, key: FieldKey, child: FieldNowodeMapping) -> Result<&mut FieldNowodeMapping> {
		match self.fields.entry(key) {
			Entry::Occupied(e) => {
				bail!("cannot add child {child:?} for key {:?}, as there's already one: {:?}", e.key(), e.get());
			},
			Entry::Vacant(e) => {
				Ok(e.insert(child))
			},
		}
	}

	pub fn add_or_merge_field(&mut self, child: FieldNowodeMapping) -> Result<&mut FieldNowodeMapping> {
		Ok(match self.fields.entry(child.info.get_key()?) {
			Entry::Occupied(e) => {
				let field = e.into_mut();
				field.info.names.merge(child.info.names);
				field
			},
			Entry::Vacant(e) => e.insert(child),
		})
	}

	pub fn add_method(&mut self, child: MethodNowodeMapping) -> Result<&mut MethodNowodeMapping> {
		let key = child.info.get_key()?;
		self.insert_method(key, child)
	}

	pub(crate) fn insert_method(&mut self, key: MethodKey, child: MethodNowodeMapping) -> Result<&mut MethodNowodeMapping> {
		match self.methods.entry(key) {
			Entry::Occupied(e) => {
				bail!("cannot add child {child:?} for key {:?}, as there's already one: {:?}", e.key(), e.get());
			},
			Entry::Vacant(e) => {
				Ok(e.insert(child))
			},
		}
	}

	pub fn add_or_merge_method(&mut self, child: MethodNowodeMapping) -> Result<&mut MethodNowodeMapping> {
		Ok(match self.methods.entry(child.info.get_key()?) {
			Entry::Occupied(e) => {
				let method = e.into_mut();
				method.info.names.merge(child.info.names);
				method
			},
			Entry::Vacant(e) => e.insert(child),
		})
	}

	pub fn get_field(&self, name: &str, desc: &str) -> Option<&FieldNowodeMapping> {
		self.fields.get(&FieldKey { name: name.into(), desc: desc.into() })
	}

	pub fn get_method(&self, name: &str, desc: &str) -> Option<&MethodNowodeMapping> {
		self.methods.get(&MethodKey { name: name.into(), desc: desc.into() })
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldNowodeMapping {
	pub info: FieldMapping,
	pub javadoc: Option<JavadocMapping>,
}

impl NodeInfo<FieldMapping> for FieldNowodeMapping {
	fn get_node_info(&self) -> &FieldMapping {
		&self.info
	}

	fn get_node_info_mut(&mut self) -> &mut FieldMapping {
		&mut self.info
	}

	fn new(info: FieldMapping) -> FieldNowodeMapping {
		FieldNowodeMapping {
			info,
			javadoc: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodNowodeMapping {
	pub info: MethodMapping,
	pub parameters: IndexMap<ParameterKey, ParameterNowodeMapping>,
	pub javadoc: Option<JavadocMapping>,
}

impl NodeInfo<MethodMapping> for MethodNowodeMapping {
	fn get_node_info(&self) -> &MethodMapping {
		&self.info
	}

	fn get_node_info_mut(&mut self) -> &mut MethodMapping {
		&mut self.info
	}

	fn new(info: MethodMapping) -> Self {
		MethodNowodeMapping {
			info,
			parameters: IndexMap::new(),
			javadoc: None,
		}
	}
}

impl MethodNowodeMapping {
	pub fn add_parameter(&mut self, child: ParameterNowodeMapping) -> Result<&mut ParameterNowodeMapping> {
		match self.parameters.entry(child.info.get_key()?) {
			Entry::Occupied(e) => {
				bail!("cannot add child {child:?} for key {:?}, as there's already one: {:?}", e.key(), e.get());
			},
			Entry::Vacant(e) => {
				Ok(e.insert(child))
			},
		}
	}

	pub fn add_or_merge_parameter(&mut self, child: ParameterNowodeMapping) -> Result<&mut ParameterNowodeMapping> {
		Ok(match self.parameters.entry(child.info.get_key()?) {
			Entry::Occupied(e) => {
				let parameter = e.into_mut();
				parameter.info.names.merge(child.info.names);
				parameter
			},
			Entry::Vacant(e) => e.insert(child),
		})
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterNowodeMapping {
	pub info: ParameterMapping,
	pub javadoc: Option<JavadocMapping>,
}

impl NodeInfo<ParameterMapping> for ParameterNowodeMapping {
	fn get_node_info(&self) -> &ParameterMapping {
		&self.info
	}

	fn get_node_info_mut(&mut self) -> &mut ParameterMapping {
		&mut self.info
	}

	fn new(info: ParameterMapping) -> ParameterNowodeMapping {
		ParameterNowodeMapping {
			info,
			javadoc: None,
		}
	}
}

/// Information about the whole mapping table.
///
/// The `properties` are the key-value pairs from the header of a tiny v2 file, like `escaped-names`.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingInfo {
	pub namespaces: Namespaces,
	pub properties: IndexMap<String, Option<String>>,
}

impl MappingInfo {
	pub fn new(namespaces: Namespaces) -> MappingInfo {
		MappingInfo { namespaces, properties: IndexMap::new() }
	}
}

#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord)]
pub struct ClassMapping {
	pub names: Names<ClassName>,
}

impl ToKey<ClassName> for ClassMapping {
	fn get_key(&self) -> Result<ClassName> {
		Ok(self.names.first_name()?.clone())
	}
}

/// The key of a field within its class: the name and the descriptor in the source namespace.
///
/// Sorting is by name first, then by descriptor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldKey {
	pub name: FieldName,
	pub desc: FieldDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
	pub desc: FieldDescriptor,
	pub names: Names<FieldName>,
}

impl ToKey<FieldKey> for FieldMapping {
	fn get_key(&self) -> Result<FieldKey> {
		Ok(FieldKey {
			name: self.names.first_name()?.clone(),
			desc: self.desc.clone(),
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodKey {
	pub name: MethodName,
	pub desc: MethodDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMapping {
	pub desc: MethodDescriptor,
	pub names: Names<MethodName>,
}

impl ToKey<MethodKey> for MethodMapping {
	fn get_key(&self) -> Result<MethodKey> {
		Ok(MethodKey {
			name: self.names.first_name()?.clone(),
			desc: self.desc.clone(),
		})
	}
}

/// Parameters are identified by their local variable index only, their name in the source namespace may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParameterKey {
	pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMapping {
	pub index: usize,
	pub names: Names<ParameterName>,
}

impl ToKey<ParameterKey> for ParameterMapping {
	fn get_key(&self) -> Result<ParameterKey> {
		Ok(ParameterKey { index: self.index })
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JavadocMapping(pub String);

impl JavadocMapping {
	/// Appends another comment as a new line.
	pub fn append(&mut self, other: JavadocMapping) {
		self.0.push('\n');
		self.0.push_str(&other.0);
	}
}

impl From<String> for JavadocMapping {
	fn from(value: String) -> Self {
		JavadocMapping(value)
	}
}
