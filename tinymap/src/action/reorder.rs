use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexMap;
use log::debug;
use crate::remapper::ARemapper;
use crate::tree::names::{Names, Namespace};
use crate::tree::mappings::{ClassMapping, ClassNowodeMapping, FieldKey, FieldMapping, FieldNowodeMapping, MappingInfo, Mappings, MethodKey, MethodMapping, MethodNowodeMapping, ParameterMapping, ParameterNowodeMapping};
use crate::tree::NodeInfo;

impl Mappings {
	#[allow(clippy::tabs_in_doc_comments)]
	/// Reorders the namespaces to the given order, dropping the namespaces not given.
	///
	/// The first given namespace becomes the source namespace.
	///
	/// # Example
	/// If you call this on a mapping like
	/// ```txt,ignore
	/// tiny	2	0	namespaceA	namespaceB	namespaceC
	/// c	A	B	C
	/// 	m	(LA;)V	a	b	c
	/// 	f	LA;	a	b	c
	/// ```
	/// with the given namespaces being `["namespaceC", "namespaceB", "namespaceA"]`, you get:
	/// ```txt,ignore
	/// tiny	2	0	namespaceC	namespaceB	namespaceA
	/// c	C	B	A
	/// 	m	(LC;)V	c	b	a
	/// 	f	LC;	c	b	a
	/// ```
	///
	/// You could do it like this for example:
	/// ```
	/// # use pretty_assertions::assert_eq;
	/// let input = "\
	/// tiny	2	0	namespaceC	namespaceB	namespaceA
	/// c	C	B	A
	/// 	f	LC;	c	b	a
	/// 	m	(LC;)V	c	b	a
	/// ";
	/// let output = "\
	/// tiny	2	0	namespaceA	namespaceC
	/// c	A	C
	/// 	f	LA;	a	c
	/// 	m	(LA;)V	a	c
	/// ";
	/// let b = tinymap::tiny_v2::read(input.as_bytes()).unwrap()
	/// 	.reorder(&["namespaceA", "namespaceC"]).unwrap();
	/// let c = tinymap::tiny_v2::write_string(&b).unwrap();
	/// assert_eq!(output, c);
	/// ```
	pub fn reorder(&self, namespaces: &[&str]) -> Result<Mappings> {
		if namespaces.is_empty() {
			bail!("cannot reorder {:?} to no namespaces at all", self.info.namespaces);
		}
		for (i, name) in namespaces.iter().enumerate() {
			if namespaces[..i].contains(name) {
				bail!("cannot reorder to {namespaces:?}: namespace {name:?} is requested more than once");
			}
		}

		// at each position we have the namespace (and therefore the old index) to look to find the name
		let table = namespaces.iter()
			.map(|name| self.get_namespace(name))
			.collect::<Result<Vec<_>>>()?;

		let dropped: Vec<&str> = self.info.namespaces.iter()
			.filter(|(namespace, _)| !table.contains(namespace))
			.map(|(_, name)| name)
			.collect();
		if !dropped.is_empty() {
			debug!("reordering to {namespaces:?} drops the namespaces {dropped:?}");
		}

		self.reorder_table(&table)
	}

	/// Builds new mappings where namespace `i` is the namespace `table[i]` of these mappings.
	///
	/// If the new source namespace is a different one, descriptors are remapped into it. Classes, fields and methods
	/// that have no name in the new source namespace are keyed by the key they had before, their names stay absent.
	pub(crate) fn reorder_table(&self, table: &[Namespace]) -> Result<Mappings> {
		let new_src = *table.first()
			.with_context(|| anyhow!("cannot reorder {:?} to no namespaces", self.info.namespaces))?;

		let remapper = self.remapper_a(Namespace::SRC, new_src)?;

		let mut m = Mappings::new(MappingInfo {
			namespaces: self.info.namespaces.reorder(table)?,
			properties: self.info.properties.clone(),
		});

		let mut fallbacks = 0usize;

		for (class_key, class) in &self.classes {
			let names = class.info.names.reorder(table);
			let key = new_key(&names, class_key.clone(), &mut fallbacks);

			let mut c = ClassNowodeMapping {
				info: ClassMapping { names },
				javadoc: class.javadoc.clone(),
				fields: IndexMap::new(),
				methods: IndexMap::new(),
			};

			for (field_key, field) in &class.fields {
				let desc = remapper.map_field_desc(&field.info.desc)?;
				let names = field.info.names.reorder(table);
				let key = FieldKey {
					name: new_key(&names, field_key.name.clone(), &mut fallbacks),
					desc: desc.clone(),
				};

				let f = FieldNowodeMapping {
					info: FieldMapping { desc, names },
					javadoc: field.javadoc.clone(),
				};

				c.insert_field(key, f)
					.with_context(|| anyhow!("failed to reorder field {:?} in class {:?}", field.info.names, class.info.names))?;
			}

			for (method_key, method) in &class.methods {
				let desc = remapper.map_method_desc(&method.info.desc)?;
				let names = method.info.names.reorder(table);
				let key = MethodKey {
					name: new_key(&names, method_key.name.clone(), &mut fallbacks),
					desc: desc.clone(),
				};

				let mut m = MethodNowodeMapping {
					info: MethodMapping { desc, names },
					javadoc: method.javadoc.clone(),
					parameters: IndexMap::new(),
				};

				for parameter in method.parameters.values() {
					let mapping = ParameterMapping {
						index: parameter.info.index,
						names: parameter.info.names.reorder(table),
					};

					let p = ParameterNowodeMapping {
						info: mapping,
						javadoc: parameter.javadoc.clone(),
					};

					m.add_parameter(p)?;
				}

				c.insert_method(key, m)
					.with_context(|| anyhow!("failed to reorder method {:?} in class {:?}", method.info.names, class.info.names))?;
			}

			m.insert_class(key, c)
				.with_context(|| anyhow!("failed to reorder class {:?}", class.info.names))?;
		}

		if fallbacks > 0 {
			debug!("{fallbacks} entries have no name in {:?}, they stay keyed by their old key",
				self.info.namespaces[new_src]);
		}

		Ok(m)
	}
}

/// The key in the new source namespace, or the old key if there's no name in it.
fn new_key<T: Clone>(names: &Names<T>, old_key: T, fallbacks: &mut usize) -> T {
	match &names[Namespace::SRC] {
		Some(name) => name.clone(),
		None => {
			*fallbacks += 1;
			old_key
		},
	}
}

#[cfg(test)]
mod testing {
	use anyhow::Result;
	use pretty_assertions::assert_eq;
	use crate::error::NamespaceNotFoundError;
	use crate::ident::ClassName;
	use crate::tiny_v2;

	const INPUT: &str = "\
tiny	2	0	official	intermediary	named
c	a	class_1	Main
	f	La;	b	field_1	instance
	m	(La;)V	c	method_1	run
";

	#[test]
	fn same_order_is_equal() -> Result<()> {
		let mappings = tiny_v2::read(INPUT.as_bytes())?;
		assert_eq!(mappings.reorder(&["official", "intermediary", "named"])?, mappings);
		Ok(())
	}

	#[test]
	fn invalid_requests() -> Result<()> {
		let mappings = tiny_v2::read(INPUT.as_bytes())?;

		assert!(mappings.reorder(&[]).is_err());
		assert!(mappings.reorder(&["named", "named"]).is_err());

		let error = mappings.reorder(&["named", "mojmap"]).unwrap_err();
		let error = error.downcast_ref::<NamespaceNotFoundError>().unwrap();
		assert_eq!(error.namespace, "mojmap");
		assert_eq!(error.available, ["official", "intermediary", "named"]);
		Ok(())
	}

	#[test]
	fn missing_names_stay_absent() -> Result<()> {
		let input = "\
tiny	2	0	official	named
c	a	Main
c	b	
	m	()La;	c	
";
		let output = "\
tiny	2	0	named	official
c	Main	a
c		b
	m	()LMain;		c
";
		let mappings = tiny_v2::read(input.as_bytes())?
			.reorder(&["named", "official"])?;
		assert_eq!(tiny_v2::write_string(&mappings)?, output);

		// still reachable by the old name
		let class = &mappings.classes["b"];
		assert_eq!(class.info.names.names(), [None, Some(ClassName::from("b"))]);
		assert!(class.get_method("c", "()LMain;").is_some());
		Ok(())
	}
}
