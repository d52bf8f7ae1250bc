//! Functions to read and write mappings in the "Tiny v2" format.
//!
//! # Reading
//! You can read a `.tiny` file using the [`read_file`] method, by passing a path.
//! If you already have a [`Read`]er, you can use the [`read`] method.
//!
//! It's recommended to check that the namespaces are indeed the ones expected.
//! See [`Namespaces::check_that`][crate::tree::names::Namespaces::check_that] for more info.
//!
//! Sections this crate doesn't model (like local variables, `v`) are skipped together with everything nested in them.
//!
//! An entry may appear more than once, the names of later lines fill in (or replace) the ones of earlier lines, and
//! the members of both are kept. Multiple comments for one entry are joined with line breaks.
//!
//! # Writing
//! For writing `.tiny` files, there are the [`write`][fn@write] as well as the [`write_vec`] and [`write_string`] methods.
//!
//! Note that all writing sorts the tiny files.

use std::fs::File;
use anyhow::{anyhow, bail, Context, Result};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use crate::error::UnsupportedFormatError;
use crate::ident::{ClassName, FieldName, MethodName, ParameterName};
use crate::lines::tiny_line::TinyLine;
use crate::lines::{escape, unescape, Line, WithMoreIdentIter};
use crate::tree::mappings::{ClassMapping, FieldMapping, JavadocMapping, MappingInfo, MethodMapping, ParameterMapping, ClassNowodeMapping, FieldNowodeMapping, Mappings, MethodNowodeMapping, ParameterNowodeMapping};
use crate::tree::names::Names;
use crate::tree::NodeInfo;

/// The header property that marks names as escaped.
pub const ESCAPED_NAMES: &str = "escaped-names";

/// Reads a `.tiny` file (tiny v2), by opening the file given by the path.
pub fn read_file(path: impl AsRef<Path>) -> Result<Mappings> {
	let file = File::open(&path)
		.with_context(|| anyhow!("failed to open mappings file {:?}", path.as_ref()))?;
	read(file)
		.with_context(|| anyhow!("failed to read mappings file {:?} as tiny v2 file", path.as_ref()))
}

#[allow(clippy::tabs_in_doc_comments)]
/// Reads the tiny v2 format, from the given reader.
///
/// It's recommended to check that the namespaces are indeed the ones expected.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// let string = "\
/// tiny	2	0	namespaceA	namespaceB	namespaceC
/// c	A	B	C
/// 	f	LA;	a	b	c
/// 	m	(LA;)V	a	b	c
/// 		p	1		x	y
/// ";
///
/// let mappings = tinymap::tiny_v2::read(string.as_bytes()).unwrap();
///
/// mappings.info.namespaces.check_that(&["namespaceA", "namespaceB", "namespaceC"]).unwrap();
/// assert_eq!(mappings.classes.len(), 1);
/// ```
pub fn read(reader: impl Read) -> Result<Mappings> {
	let mut lines = BufReader::new(reader)
		.lines()
		.enumerate()
		.map(|(line_number, line)| -> Result<TinyLine> {
			TinyLine::new(line_number + 1, &line?)
		})
		.peekable();

	let mut header = lines.next().context("no header line")??;
	let header_line_number = header.get_line_number();

	if header.first_field != "tiny" || header.next().ok().as_deref() != Some("2") || header.next().ok().as_deref() != Some("0") {
		return Err(UnsupportedFormatError { header: header.first_field.clone() })
			.context("header version isn't tiny v2.0");
	}

	let namespaces = header.list_remaining().try_into()
		.with_context(|| anyhow!("on line {header_line_number}"))?;

	let mut mappings = Mappings::new(MappingInfo::new(namespaces));
	let len = mappings.info.namespaces.len();

	let mut iter = WithMoreIdentIter::new(&mut lines);

	iter.next_level().on_every_line(|_, mut line| {
		let key = line.first_field.clone();
		let value = line.next().ok();
		mappings.info.properties.insert(key, value);
		Ok(())
	}).context("reading header properties")?;

	let escaped = mappings.info.properties.contains_key(ESCAPED_NAMES);

	iter.on_every_line(|iter, line| {
		if line.first_field == "c" {
			let names = line.into_names::<ClassName>(len, escaped)?;
			let mapping = ClassMapping { names };
			let class = mappings.add_or_merge_class(ClassNowodeMapping::new(mapping))?;

			iter.next_level().on_every_line(|iter, mut line| {
				if line.first_field == "f" {
					let desc = line.next()?.into();
					let names = line.into_names::<FieldName>(len, escaped)?;
					let mapping = FieldMapping { desc, names };
					let field = class.add_or_merge_field(FieldNowodeMapping::new(mapping))?;

					iter.next_level().on_every_line(|iter, line| {
						if line.first_field == "c" {
							add_comment(&mut field.javadoc, line)
						} else {
							iter.skip_deeper()
						}
					}).context("reading field sub-sections")
				} else if line.first_field == "m" {
					let desc = line.next()?.into();
					let names = line.into_names::<MethodName>(len, escaped)?;
					let mapping = MethodMapping { desc, names };
					let method = class.add_or_merge_method(MethodNowodeMapping::new(mapping))?;

					iter.next_level().on_every_line(|iter, mut line| {
						if line.first_field == "p" {
							let index = line.next()?.parse()
								.context("parameter index must be a number")?;
							let names = line.into_names::<ParameterName>(len, escaped)?;
							let mapping = ParameterMapping { index, names };
							let parameter = method.add_or_merge_parameter(ParameterNowodeMapping::new(mapping))?;

							iter.next_level().on_every_line(|iter, line| {
								if line.first_field == "c" {
									add_comment(&mut parameter.javadoc, line)
								} else {
									iter.skip_deeper()
								}
							}).context("reading parameter sub-sections")
						} else if line.first_field == "c" {
							add_comment(&mut method.javadoc, line)
						} else {
							iter.skip_deeper()
						}
					}).context("reading method sub-sections")
				} else if line.first_field == "c" {
					add_comment(&mut class.javadoc, line)
				} else {
					iter.skip_deeper()
				}
			}).context("reading class sub-sections")
		} else {
			iter.skip_deeper()
		}
	}).context("reading lines")?;

	if let Some(line) = lines.next() {
		bail!("expected end of input, got: {line:?}");
	}

	Ok(mappings)
}

/// Repeated comments are joined by a line break.
fn add_comment(javadoc: &mut Option<JavadocMapping>, line: TinyLine) -> Result<()> {
	let comment = JavadocMapping(unescape(&line.end()?)?);
	match javadoc {
		Some(javadoc) => javadoc.append(comment),
		None => *javadoc = Some(comment),
	}
	Ok(())
}

/// Writes the given mappings into a `String`, in the tiny v2 format.
///
/// This is equivalent to first calling [`write_vec`] and then [`String::from_utf8`].
///
/// This method is of most use in test cases, where you also use the `pretty_assertions` crate for viewing string diffs.
pub fn write_string(mappings: &Mappings) -> Result<String> {
	let vec = write_vec(mappings)?;
	String::from_utf8(vec).context("failed to convert written mappings to utf8")
}

/// Writes the given mappings into a `Vec<u8>`, in the tiny v2 format.
///
/// This is equivalent to letting [`write`][fn@write] write into a `Vec<u8>`.
pub fn write_vec(mappings: &Mappings) -> Result<Vec<u8>> {
	let mut vec = Vec::new();
	write(mappings, &mut vec)?;
	Ok(vec)
}

/// Writes the given mappings to the file at the path, in the tiny v2 format, replacing the file if it exists.
pub fn write_file(mappings: &Mappings, path: impl AsRef<Path>) -> Result<()> {
	let mut file = File::create(&path)
		.with_context(|| anyhow!("failed to create mappings file {:?}", path.as_ref()))?;
	write(mappings, &mut file)
		.with_context(|| anyhow!("failed to write mappings file {:?}", path.as_ref()))
}

fn write_names(w: &mut impl Write, names: &Names<impl AsRef<str>>, escaped: bool) -> Result<()> {
	for name in names.names() {
		match name.as_ref().map(|x| x.as_ref()) {
			Some(name) if escaped => write!(w, "\t{}", escape(name))?,
			Some(name) => write!(w, "\t{name}")?,
			None => write!(w, "\t")?,
		}
	}
	writeln!(w)?;
	Ok(())
}

fn write_comment(w: &mut impl Write, idents: &str, comment: &Option<JavadocMapping>) -> Result<()> {
	if let Some(comment) = comment {
		writeln!(w, "{idents}c\t{}", escape(&comment.0))?;
	}
	Ok(())
}

#[allow(clippy::tabs_in_doc_comments)]
/// Writes the given mappings to the given writer, in the tiny v2 format.
///
/// Note that this sorts the classes, fields, methods and parameters by their keys, so that the same mappings always
/// give the same bytes.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// let input = "\
/// tiny	2	0	namespaceA	namespaceB
/// c	D	E
/// c	A	B
/// 	f	I	bIsAfterA	e
/// 	m	()V	methodB	methodBSecondName
/// 	f	I	aIsBeforeB	c
/// 	m	()V	methodA	methodASecondName
/// 	m	(I)V	methodA	x
/// ";
///
/// let mappings = tinymap::tiny_v2::read(input.as_bytes()).unwrap();
/// let written = tinymap::tiny_v2::write_string(&mappings).unwrap();
///
/// let output = "\
/// tiny	2	0	namespaceA	namespaceB
/// c	A	B
/// 	f	I	aIsBeforeB	c
/// 	f	I	bIsAfterA	e
/// 	m	()V	methodA	methodASecondName
/// 	m	(I)V	methodA	x
/// 	m	()V	methodB	methodBSecondName
/// c	D	E
/// ";
///
/// assert_eq!(written, output);
/// ```
pub fn write(mappings: &Mappings, w: &mut impl Write) -> Result<()> {
	// the buffering makes it much faster
	let mut w = BufWriter::new(w);
	let w = &mut w;

	let escaped = mappings.info.properties.contains_key(ESCAPED_NAMES);

	write!(w, "tiny\t2\t0")?;
	for namespace in mappings.info.namespaces.names() {
		write!(w, "\t{namespace}")?;
	}
	writeln!(w)?;

	for (key, value) in &mappings.info.properties {
		match value {
			Some(value) => writeln!(w, "\t{key}\t{value}")?,
			None => writeln!(w, "\t{key}")?,
		}
	}

	let mut classes: Vec<_> = mappings.classes.iter().collect();
	classes.sort_by_key(|(key, _)| *key);
	for (_, class) in classes {
		write!(w, "c")?;
		write_names(w, &class.info.names, escaped)?;
		write_comment(w, "\t", &class.javadoc)?;

		let mut fields: Vec<_> = class.fields.iter().collect();
		fields.sort_by_key(|(key, _)| *key);
		for (_, field) in fields {
			write!(w, "\tf\t{}", field.info.desc)?;
			write_names(w, &field.info.names, escaped)?;
			write_comment(w, "\t\t", &field.javadoc)?;
		}

		let mut methods: Vec<_> = class.methods.iter().collect();
		methods.sort_by_key(|(key, _)| *key);
		for (_, method) in methods {
			write!(w, "\tm\t{}", method.info.desc)?;
			write_names(w, &method.info.names, escaped)?;
			write_comment(w, "\t\t", &method.javadoc)?;

			let mut parameters: Vec<_> = method.parameters.iter().collect();
			parameters.sort_by_key(|(key, _)| *key);
			for (_, parameter) in parameters {
				write!(w, "\t\tp\t{}", parameter.info.index)?;
				write_names(w, &parameter.info.names, escaped)?;
				write_comment(w, "\t\t\t", &parameter.javadoc)?;
			}
		}
	}

	w.flush()?;

	Ok(())
}
