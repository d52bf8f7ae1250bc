//! Detecting the dialect of a mapping file, and reading mappings without knowing it beforehand.
//!
//! The dialect is decided by the first line alone, see [`MappingFormat::detect`].

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use anyhow::{anyhow, Context, Result};
use zip::ZipArchive;
use crate::error::UnsupportedFormatError;
use crate::tree::mappings::Mappings;
use crate::tree::names::Namespaces;
use crate::{tiny_v1, tiny_v2};

/// The known dialects of mapping files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingFormat {
	/// The plain column format, with a header like `v1\tofficial\tnamed`.
	TinyV1,
	/// The nested format, with a header like `tiny\t2\t0\tofficial\tnamed`.
	TinyV2,
}

impl MappingFormat {
	/// Detects the dialect from the first line of a file.
	///
	/// Returns an [`UnsupportedFormatError`] if the line doesn't look like any known header.
	///
	/// ```
	/// use tinymap::format::MappingFormat;
	///
	/// assert_eq!(MappingFormat::detect("v1\tofficial\tnamed").unwrap(), MappingFormat::TinyV1);
	/// assert_eq!(MappingFormat::detect("tiny\t2\t0\tofficial\tnamed").unwrap(), MappingFormat::TinyV2);
	/// assert!(MappingFormat::detect("tsrg2 left right").is_err());
	/// ```
	pub fn detect(first_line: &str) -> Result<MappingFormat, UnsupportedFormatError> {
		let first_line = first_line.trim_end_matches(['\r', '\n']);
		let mut fields = first_line.split('\t');

		match (fields.next(), fields.next(), fields.next()) {
			(Some("v1"), _, _) => Ok(MappingFormat::TinyV1),
			(Some("tiny"), Some("2"), Some("0")) => Ok(MappingFormat::TinyV2),
			_ => Err(UnsupportedFormatError { header: first_line.to_owned() }),
		}
	}

	pub fn read(self, reader: impl Read) -> Result<Mappings> {
		match self {
			MappingFormat::TinyV1 => tiny_v1::read(reader),
			MappingFormat::TinyV2 => tiny_v2::read(reader),
		}
	}
}

fn read_header(reader: &mut impl BufRead) -> Result<String> {
	let mut header = String::new();
	reader.read_line(&mut header)
		.context("failed to read the header line")?;
	Ok(header)
}

/// Reads mappings in any of the known dialects, detecting which one it is.
pub fn read(reader: impl Read) -> Result<Mappings> {
	let mut reader = BufReader::new(reader);
	let header = read_header(&mut reader)?;

	let format = MappingFormat::detect(&header)?;

	format.read(header.as_bytes().chain(reader))
}

/// Reads a mappings file in any of the known dialects.
pub fn read_file(path: impl AsRef<Path>) -> Result<Mappings> {
	let file = File::open(&path)
		.with_context(|| anyhow!("failed to open mappings file {:?}", path.as_ref()))?;
	read(file)
		.with_context(|| anyhow!("failed to read mappings file {:?}", path.as_ref()))
}

/// Detects the dialect of a mappings file.
pub fn detect_file(path: impl AsRef<Path>) -> Result<MappingFormat> {
	let file = File::open(&path)
		.with_context(|| anyhow!("failed to open mappings file {:?}", path.as_ref()))?;
	let header = read_header(&mut BufReader::new(file))
		.with_context(|| anyhow!("failed to read mappings file {:?}", path.as_ref()))?;

	MappingFormat::detect(&header)
		.with_context(|| anyhow!("failed to detect the format of mappings file {:?}", path.as_ref()))
}

/// Reads mappings from the entry of the zip file (or jar file) at the path.
///
/// The archive is closed again before this returns.
pub fn read_zip_entry(path: impl AsRef<Path>, entry: &str) -> Result<Mappings> {
	let file = File::open(&path)
		.with_context(|| anyhow!("failed to open archive {:?}", path.as_ref()))?;
	let mut archive = ZipArchive::new(file)
		.with_context(|| anyhow!("failed to read archive {:?}", path.as_ref()))?;

	let entry_file = archive.by_name(entry)
		.with_context(|| anyhow!("no entry {entry:?} in archive {:?}", path.as_ref()))?;

	read(entry_file)
		.with_context(|| anyhow!("failed to read mappings from entry {entry:?} of archive {:?}", path.as_ref()))
}

/// Reads only the namespaces from the header, not the whole mappings.
pub fn namespaces(reader: impl Read) -> Result<Namespaces> {
	let header = read_header(&mut BufReader::new(reader))?;
	let header = header.trim_end_matches(['\r', '\n']);

	let skip = match MappingFormat::detect(header)? {
		MappingFormat::TinyV1 => 1,
		MappingFormat::TinyV2 => 3,
	};

	header.split('\t')
		.skip(skip)
		.map(|x| x.to_owned())
		.collect::<Vec<_>>()
		.try_into()
		.with_context(|| anyhow!("invalid namespaces in header {header:?}"))
}

#[cfg(test)]
mod testing {
	use anyhow::Result;
	use pretty_assertions::assert_eq;
	use crate::error::UnsupportedFormatError;
	use crate::format::{namespaces, read, MappingFormat};

	#[test]
	fn detect() {
		let cases = [
			("v1\tofficial\tintermediary", Some(MappingFormat::TinyV1)),
			("v1\tofficial\tintermediary\r\n", Some(MappingFormat::TinyV1)),
			("tiny\t2\t0\tintermediary\tnamed", Some(MappingFormat::TinyV2)),
			("tiny\t2\t1\tintermediary\tnamed", None),
			("tiny\t1\t0\tintermediary\tnamed", None),
			("v2\tofficial", None),
			("", None),
			("CLASS\ta\tb", None),
		];

		for (line, expected) in cases {
			assert_eq!(MappingFormat::detect(line).ok(), expected, "for {line:?}");
		}
	}

	#[test]
	fn unsupported_header() {
		let error = read("tsrg2 left right\na b\n".as_bytes()).unwrap_err();
		let error = error.downcast_ref::<UnsupportedFormatError>().unwrap();
		assert_eq!(error.header, "tsrg2 left right");
	}

	#[test]
	fn header_namespaces() -> Result<()> {
		let v1 = namespaces("v1\tofficial\tintermediary\nCLASS\ta\tclass_1\n".as_bytes())?;
		v1.check_that(&["official", "intermediary"])?;

		let v2 = namespaces("tiny\t2\t0\tintermediary\tnamed\n".as_bytes())?;
		v2.check_that(&["intermediary", "named"])?;
		Ok(())
	}

	#[test]
	fn read_any() -> Result<()> {
		let v1 = read("v1\tofficial\tnamed\nCLASS\ta\tMain\n".as_bytes())?;
		let v2 = read("tiny\t2\t0\tofficial\tnamed\nc\ta\tMain\n".as_bytes())?;
		assert_eq!(v1, v2);
		Ok(())
	}
}
