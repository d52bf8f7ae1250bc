//! Identity of mapping sources, and the keys derived from them.
//!
//! A [`MappingSource`] is identified by the SHA-256 hash of its bytes, not by its path: the same file at another
//! place (another machine, another checkout) is the same source.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::path::{Path, PathBuf};
use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};
use zip::ZipArchive;
use tinymap::tree::mappings::Mappings;

/// Where a mapping table comes from: a file, or an entry in a zip file, together with the hash of its contents.
///
/// Equality and hashing only look at the content hash.
#[derive(Debug, Clone)]
pub struct MappingSource {
	pub path: PathBuf,
	pub entry: Option<String>,
	hash: [u8; 32],
}

impl MappingSource {
	/// Hashes the file at the path.
	pub fn from_file(path: impl AsRef<Path>) -> Result<MappingSource> {
		let path = path.as_ref();
		let bytes = std::fs::read(path)
			.with_context(|| anyhow!("failed to read mapping source {path:?}"))?;
		Ok(MappingSource::from_bytes(path, None, &bytes))
	}

	/// Hashes the entry of the zip file at the path.
	pub fn from_zip_entry(path: impl AsRef<Path>, entry: &str) -> Result<MappingSource> {
		let path = path.as_ref();
		let bytes = read_zip_entry_bytes(path, entry)?;
		Ok(MappingSource::from_bytes(path, Some(entry), &bytes))
	}

	pub fn from_bytes(path: impl Into<PathBuf>, entry: Option<&str>, bytes: &[u8]) -> MappingSource {
		let mut hasher = Sha256::new();
		hasher.update(bytes);

		MappingSource {
			path: path.into(),
			entry: entry.map(|x| x.to_owned()),
			hash: hasher.finalize().into(),
		}
	}

	pub fn hash(&self) -> &[u8; 32] {
		&self.hash
	}

	/// The content hash as lowercase hex.
	pub fn hash_hex(&self) -> String {
		self.hash.iter().map(|b| format!("{b:02x}")).collect()
	}

	/// Reads the mappings, in whatever dialect they are.
	pub fn read(&self) -> Result<Mappings> {
		match &self.entry {
			Some(entry) => tinymap::format::read_zip_entry(&self.path, entry),
			None => tinymap::format::read_file(&self.path),
		}
	}
}

impl PartialEq for MappingSource {
	fn eq(&self, other: &Self) -> bool {
		self.hash == other.hash
	}
}

impl Eq for MappingSource {}

impl Hash for MappingSource {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.hash.hash(state);
	}
}

pub(crate) fn read_zip_entry_bytes(path: &Path, entry: &str) -> Result<Vec<u8>> {
	let file = File::open(path)
		.with_context(|| anyhow!("failed to open archive {path:?}"))?;
	let mut archive = ZipArchive::new(file)
		.with_context(|| anyhow!("failed to read archive {path:?}"))?;

	let mut entry_file = archive.by_name(entry)
		.with_context(|| anyhow!("no entry {entry:?} in archive {path:?}"))?;

	let mut bytes = Vec::new();
	entry_file.read_to_end(&mut bytes)
		.with_context(|| anyhow!("failed to read entry {entry:?} of archive {path:?}"))?;
	Ok(bytes)
}

/// The key of a mapping table in the [`MappingsService`][crate::service::MappingsService]: the source it was read
/// from, the steps applied to it, and the game version it's for.
///
/// ```
/// use loom_mappings::identity::{MappingSource, MappingsKey};
///
/// let source = MappingSource::from_bytes("mappings.tiny", None, b"tiny\t2\t0\tofficial\tnamed\n");
/// let key = MappingsKey::new(&source)
/// 	.step("switch to named")
/// 	.game_version("1.20.1")
/// 	.to_string();
///
/// assert!(key.ends_with("|switch to named|1.20.1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappingsKey {
	source: String,
	steps: Vec<String>,
	game_version: Option<String>,
}

impl MappingsKey {
	pub fn new(source: &MappingSource) -> MappingsKey {
		MappingsKey {
			source: source.hash_hex(),
			steps: Vec::new(),
			game_version: None,
		}
	}

	/// Adds a step of the derivation, like `"merge with <hash>"` or `"reorder to [named, official]"`.
	pub fn step(mut self, step: impl Into<String>) -> MappingsKey {
		self.steps.push(step.into());
		self
	}

	pub fn game_version(mut self, version: impl Into<String>) -> MappingsKey {
		self.game_version = Some(version.into());
		self
	}
}

impl Display for MappingsKey {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}|{}|{}", self.source, self.steps.join(";"), self.game_version.as_deref().unwrap_or(""))
	}
}

/// The classifier part of a mappings identifier: `-<classifier>` if there's one, followed by `-v2` for tiny v2 jars.
pub fn mappings_classifier(classifier: Option<&str>, v2: bool) -> String {
	let mut s = String::new();
	if let Some(classifier) = classifier {
		s.push('-');
		s.push_str(classifier);
	}
	if v2 {
		s.push_str("-v2");
	}
	s
}

/// Creates the identifier of a mappings artifact, used as the name of its working directory.
///
/// The name loses a `-unmerged` suffix, and in the game version spaces, dots and dashes are replaced by underscores.
///
/// ```
/// use loom_mappings::identity::mappings_identifier;
///
/// assert_eq!(
/// 	mappings_identifier("net.fabricmc.yarn", "1.16.5", "1.16.5+build.5", "-v2"),
/// 	"net.fabricmc.yarn.1_16_5.1.16.5+build.5-v2",
/// );
/// assert_eq!(
/// 	mappings_identifier("net.fabricmc.yarn-unmerged", "23w13a_or_b", "23w13a_or_b+build.1", ""),
/// 	"net.fabricmc.yarn.23w13a_or_b.23w13a_or_b+build.1",
/// );
/// ```
pub fn mappings_identifier(name: &str, game_version: &str, version: &str, classifier: &str) -> String {
	let name = name.strip_suffix("-unmerged").unwrap_or(name);
	let game_version = game_version.replace([' ', '.', '-'], "_");
	format!("{name}.{game_version}.{version}{classifier}")
}

#[cfg(test)]
mod testing {
	use std::collections::HashSet;
	use pretty_assertions::assert_eq;
	use crate::identity::{mappings_classifier, mappings_identifier, MappingSource, MappingsKey};

	#[test]
	fn equality_is_by_content() {
		let a = MappingSource::from_bytes("/home/a/mappings.tiny", None, b"v1\tofficial\tnamed\n");
		let b = MappingSource::from_bytes("/ci/checkout/mappings.jar", Some("mappings/mappings.tiny"), b"v1\tofficial\tnamed\n");
		let c = MappingSource::from_bytes("/home/a/mappings.tiny", None, b"v1\tofficial\tintermediary\n");

		assert_eq!(a, b);
		assert_ne!(a, c);

		let set: HashSet<_> = [a, b, c].into_iter().collect();
		assert_eq!(set.len(), 2);
	}

	#[test]
	fn hash_hex() {
		let source = MappingSource::from_bytes("empty", None, b"");
		assert_eq!(source.hash_hex(), "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
	}

	#[test]
	fn keys() {
		let source = MappingSource::from_bytes("a", None, b"");
		let plain = MappingsKey::new(&source).to_string();
		let derived = MappingsKey::new(&source).step("switch to named").to_string();
		let versioned = MappingsKey::new(&source).step("switch to named").game_version("1.20.1").to_string();

		assert_ne!(plain, derived);
		assert_ne!(derived, versioned);
		assert_eq!(derived, MappingsKey::new(&source).step("switch to named").to_string());
	}

	#[test]
	fn identifiers() {
		assert_eq!(mappings_classifier(None, false), "");
		assert_eq!(mappings_classifier(None, true), "-v2");
		assert_eq!(mappings_classifier(Some("mergedv2"), false), "-mergedv2");
		assert_eq!(mappings_classifier(Some("client"), true), "-client-v2");

		assert_eq!(mappings_identifier("net.ornithemc.feather", "1.12.2 Pre-release 1", "1.12.2-pre1+build.3", "-v2"),
			"net.ornithemc.feather.1_12_2_Pre_release_1.1.12.2-pre1+build.3-v2");
	}
}
