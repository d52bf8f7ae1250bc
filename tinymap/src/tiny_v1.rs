//! Functions to read and write mappings in the "Tiny v1" format.
//!
//! This is the plain column format: a header `v1` followed by the namespaces, and then one line per entry:
//! ```txt,ignore
//! v1	official	intermediary	named
//! CLASS	a	net/minecraft/class_1	net/minecraft/Main
//! FIELD	a	I	b	field_1	count
//! METHOD	a	()V	c	method_1	run
//! ```
//! The owner and descriptor of fields and methods are given in the first namespace. Lines starting with `#` are
//! comments. Members may appear without a `CLASS` line for their owner, then the class only gets its name in the
//! first namespace.
//!
//! This format has no parameters and no comments, writing mappings that have them drops them.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use crate::error::UnsupportedFormatError;
use crate::ident::{ClassName, FieldName, MethodName};
use crate::lines::tiny_line::TinyLine;
use crate::lines::Line;
use crate::tree::mappings::{ClassMapping, ClassNowodeMapping, FieldMapping, FieldNowodeMapping, MappingInfo, Mappings, MethodMapping, MethodNowodeMapping};
use crate::tree::names::Names;
use crate::tree::{NodeInfo, ToKey};

/// Reads a `.tiny` file (tiny v1), by opening the file given by the path.
pub fn read_file(path: impl AsRef<Path>) -> Result<Mappings> {
	let file = File::open(&path)
		.with_context(|| anyhow!("failed to open mappings file {:?}", path.as_ref()))?;
	read(file)
		.with_context(|| anyhow!("failed to read mappings file {:?} as tiny v1 file", path.as_ref()))
}

#[allow(clippy::tabs_in_doc_comments)]
/// Reads the tiny v1 format, from the given reader.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// let string = "\
/// v1	official	named
/// CLASS	a	Main
/// FIELD	a	La;	b	instance
/// ";
///
/// let mappings = tinymap::tiny_v1::read(string.as_bytes()).unwrap();
///
/// mappings.info.namespaces.check_that(&["official", "named"]).unwrap();
/// assert_eq!(mappings.classes["a"].fields.len(), 1);
/// ```
pub fn read(reader: impl Read) -> Result<Mappings> {
	let mut lines = BufReader::new(reader)
		.lines()
		.enumerate()
		.map(|(line_number, line)| -> Result<TinyLine> {
			TinyLine::new(line_number + 1, &line?)
		});

	let header = lines.next().context("no header line")??;
	if header.first_field != "v1" {
		return Err(UnsupportedFormatError { header: header.first_field.clone() })
			.context("header version isn't tiny v1");
	}
	let namespaces = header.list_remaining().try_into()
		.context("on line 1")?;

	let mut mappings = Mappings::new(MappingInfo::new(namespaces));
	let len = mappings.info.namespaces.len();

	for line in lines {
		let mut line = line?;
		let line_number = line.get_line_number();

		let result = match line.first_field.as_str() {
			"CLASS" => {
				let names = line.into_names::<ClassName>(len, false)?;
				add_class(&mut mappings, ClassMapping { names })
			},
			"FIELD" => {
				let owner = ClassName::from(line.next()?);
				let desc = line.next()?.into();
				let names = line.into_names::<FieldName>(len, false)?;
				owner_class(&mut mappings, owner, len)
					.and_then(|class| add_field(class, FieldMapping { desc, names }))
			},
			"METHOD" => {
				let owner = ClassName::from(line.next()?);
				let desc = line.next()?.into();
				let names = line.into_names::<MethodName>(len, false)?;
				owner_class(&mut mappings, owner, len)
					.and_then(|class| add_method(class, MethodMapping { desc, names }))
			},
			first if first.is_empty() || first.starts_with('#') => Ok(()),
			first => Err(anyhow!("unknown entry kind {first:?}")),
		};

		result.with_context(|| anyhow!("in line {line_number}"))?;
	}

	Ok(mappings)
}

/// Adds a class, filling in a class that was created before for one of its members.
fn add_class(mappings: &mut Mappings, mapping: ClassMapping) -> Result<()> {
	let key = mapping.get_key()?;
	match mappings.classes.get_mut(&key) {
		Some(existing) if existing.info.names.only_first() => {
			existing.info = mapping;
			Ok(())
		},
		Some(existing) if existing.info == mapping => Ok(()),
		Some(existing) => bail!("conflicting entries for class {key:?}: {:?} and {mapping:?}", existing.info),
		None => mappings.add_class(ClassNowodeMapping::new(mapping)).map(|_| ()),
	}
}

fn owner_class(mappings: &mut Mappings, owner: ClassName, len: usize) -> Result<&mut ClassNowodeMapping> {
	if !mappings.classes.contains_key(&owner) {
		let mapping = ClassMapping { names: Names::from_first_name(owner.clone(), len) };
		mappings.add_class(ClassNowodeMapping::new(mapping))?;
	}
	mappings.classes.get_mut(&owner)
		.with_context(|| anyhow!("class {owner:?} vanished"))
}

fn add_field(class: &mut ClassNowodeMapping, mapping: FieldMapping) -> Result<()> {
	let key = mapping.get_key()?;
	match class.fields.get(&key) {
		Some(existing) if existing.info == mapping => Ok(()),
		Some(existing) => bail!("conflicting entries for field {key:?}: {:?} and {mapping:?}", existing.info),
		None => class.add_field(FieldNowodeMapping::new(mapping)).map(|_| ()),
	}
}

fn add_method(class: &mut ClassNowodeMapping, mapping: MethodMapping) -> Result<()> {
	let key = mapping.get_key()?;
	match class.methods.get(&key) {
		Some(existing) if existing.info == mapping => Ok(()),
		Some(existing) => bail!("conflicting entries for method {key:?}: {:?} and {mapping:?}", existing.info),
		None => class.add_method(MethodNowodeMapping::new(mapping)).map(|_| ()),
	}
}

/// Writes the given mappings into a `String`, in the tiny v1 format.
pub fn write_string(mappings: &Mappings) -> Result<String> {
	let mut vec = Vec::new();
	write(mappings, &mut vec)?;
	String::from_utf8(vec).context("failed to convert written mappings to utf8")
}

/// Writes the given mappings to the file at the path, in the tiny v1 format, replacing the file if it exists.
pub fn write_file(mappings: &Mappings, path: impl AsRef<Path>) -> Result<()> {
	let mut file = File::create(&path)
		.with_context(|| anyhow!("failed to create mappings file {:?}", path.as_ref()))?;
	write(mappings, &mut file)
		.with_context(|| anyhow!("failed to write mappings file {:?}", path.as_ref()))
}

fn write_names(w: &mut impl Write, names: &Names<impl AsRef<str>>) -> Result<()> {
	for name in names.names() {
		write!(w, "\t{}", name.as_ref().map_or("", |x| x.as_ref()))?;
	}
	writeln!(w)?;
	Ok(())
}

#[allow(clippy::tabs_in_doc_comments)]
/// Writes the given mappings to the given writer, in the tiny v1 format.
///
/// All `CLASS` lines come first, then all `FIELD` lines, then all `METHOD` lines, each sorted.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// let input = "\
/// tiny	2	0	official	named
/// c	b	Second
/// 	m	()V	a	run
/// c	a	First
/// 	f	I	a	count
/// ";
///
/// let mappings = tinymap::tiny_v2::read(input.as_bytes()).unwrap();
/// let written = tinymap::tiny_v1::write_string(&mappings).unwrap();
///
/// let output = "\
/// v1	official	named
/// CLASS	a	First
/// CLASS	b	Second
/// FIELD	a	I	a	count
/// METHOD	b	()V	a	run
/// ";
///
/// assert_eq!(written, output);
/// ```
pub fn write(mappings: &Mappings, w: &mut impl Write) -> Result<()> {
	let mut w = BufWriter::new(w);
	let w = &mut w;

	write!(w, "v1")?;
	for namespace in mappings.info.namespaces.names() {
		write!(w, "\t{namespace}")?;
	}
	writeln!(w)?;

	let mut classes: Vec<_> = mappings.classes.iter().collect();
	classes.sort_by_key(|(key, _)| *key);

	for (_, class) in &classes {
		write!(w, "CLASS")?;
		write_names(w, &class.info.names)?;
	}

	for (owner, class) in &classes {
		let mut fields: Vec<_> = class.fields.iter().collect();
		fields.sort_by_key(|(key, _)| *key);
		for (_, field) in fields {
			write!(w, "FIELD\t{owner}\t{}", field.info.desc)?;
			write_names(w, &field.info.names)?;
		}
	}

	let mut dropped = 0;
	for (owner, class) in &classes {
		let mut methods: Vec<_> = class.methods.iter().collect();
		methods.sort_by_key(|(key, _)| *key);
		for (_, method) in methods {
			write!(w, "METHOD\t{owner}\t{}", method.info.desc)?;
			write_names(w, &method.info.names)?;
			dropped += method.parameters.len();
		}
	}

	if dropped > 0 {
		debug!("tiny v1 can't hold parameters, dropped {dropped} of them");
	}

	w.flush()?;

	Ok(())
}
