//! Reading entries from jar files, and writing the `mappings.jar`.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use anyhow::{anyhow, Context, Result};
use log::trace;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

/// The entry in a mappings jar holding the mappings.
pub const MAPPINGS_ENTRY: &str = "mappings/mappings.tiny";

/// An opened jar (or zip) file. The file is closed when this is dropped.
pub struct Jar {
	path: PathBuf,
	archive: ZipArchive<File>,
}

impl Jar {
	pub fn open(path: impl AsRef<Path>) -> Result<Jar> {
		let path = path.as_ref();
		let file = File::open(path)
			.with_context(|| anyhow!("failed to open jar {path:?}"))?;
		let archive = ZipArchive::new(file)
			.with_context(|| anyhow!("failed to read jar {path:?}"))?;

		Ok(Jar { path: path.to_owned(), archive })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Reads the entry, if it exists.
	pub fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
		let mut entry = match self.archive.by_name(name) {
			Ok(entry) => entry,
			Err(ZipError::FileNotFound) => return Ok(None),
			Err(e) => return Err(e).with_context(|| anyhow!("failed to open entry {name:?} of jar {:?}", self.path)),
		};

		let mut bytes = Vec::new();
		entry.read_to_end(&mut bytes)
			.with_context(|| anyhow!("failed to read entry {name:?} of jar {:?}", self.path))?;
		Ok(Some(bytes))
	}

	/// Copies the entry to the file at `to`, replacing it. Returns `false` if there's no such entry.
	pub fn extract(&mut self, name: &str, to: impl AsRef<Path>) -> Result<bool> {
		let to = to.as_ref();
		let Some(bytes) = self.read_entry(name)? else {
			return Ok(false);
		};

		trace!("extracting {name:?} of {:?} to {to:?}", self.path);
		std::fs::write(to, bytes)
			.with_context(|| anyhow!("failed to write {to:?}"))?;
		Ok(true)
	}
}

/// Writes a jar with the single entry `name`, replacing the file at the path.
pub fn write_single_entry_jar(path: impl AsRef<Path>, name: &str, contents: &[u8]) -> Result<()> {
	let path = path.as_ref();
	let file = File::create(path)
		.with_context(|| anyhow!("failed to create jar {path:?}"))?;

	let mut zip = ZipWriter::new(file);
	zip.start_file(name, FileOptions::<()>::default())?;
	zip.write_all(contents)?;
	zip.finish()
		.with_context(|| anyhow!("failed to finish writing jar {path:?}"))?;

	Ok(())
}
