//! The working directory of one mappings artifact, and the pipeline filling it.
//!
//! For a mappings jar, the working directory `<cache root>/<identifier>/` holds:
//! - `mappings-base.tiny`: the mappings as found in the jar,
//! - `mappings.tiny`: the mappings actually used, with the namespaces `intermediary`, `official` and `named`,
//! - `mappings.jar`: a jar with just `mappings/mappings.tiny`,
//! - `mappings.unpick` and `unpick.json`: the unpick definitions and their metadata, if the jar has them.
//!
//! If `mappings.tiny` exists, it's trusted, unless a refresh is requested.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexMap;
use log::{debug, error, info, warn};
use serde::Deserialize;
use tinymap::format::MappingFormat;
use tinymap::tree::mappings::Mappings;
use crate::archive::{write_single_entry_jar, Jar, MAPPINGS_ENTRY};
use crate::error::UnsupportedOperationError;
use crate::field_names::FieldNameSuggester;
use crate::identity::{mappings_classifier, mappings_identifier, MappingSource, MappingsKey};
use crate::service::MappingsService;

const UNPICK_DEFINITIONS_ENTRY: &str = "extras/definitions.unpick";
const UNPICK_METADATA_ENTRY: &str = "extras/unpick.json";
const RECORD_SIGNATURES_ENTRY: &str = "extras/record_signatures.json";

/// The tiny v2 header property naming the game version the mappings are for.
const GAME_VERSION_PROPERTY: &str = "minecraft_version";

/// How the game is distributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameDistribution {
	/// Client and server merged into one jar.
	Merged { jar: PathBuf },
	/// Client and server as separate jars.
	Split,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
	/// The mappings jar, with the mappings at `mappings/mappings.tiny`.
	pub mappings_jar: PathBuf,
	/// The name of the mappings artifact, like `net.fabricmc.yarn`.
	pub name: String,
	pub version: String,
	pub classifier: Option<String>,
	pub game_version: String,
	pub game: GameDistribution,
	/// The intermediary mappings, with the namespaces `official` and `intermediary`.
	pub intermediary: PathBuf,
	/// The directory in which the working directories are created.
	pub cache_root: PathBuf,
	/// Rebuild everything, even if the files already exist.
	pub refresh: bool,
}

/// Which unpick to use for the unpick definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpickMetadata {
	pub unpick_group: String,
	pub unpick_version: String,
}

#[derive(Debug, Deserialize)]
struct UnpickMetadataFile {
	version: Option<u32>,
	#[serde(rename = "unpickGroup")]
	unpick_group: Option<String>,
	#[serde(rename = "unpickVersion")]
	unpick_version: Option<String>,
}

fn parse_unpick_metadata(bytes: &[u8]) -> Result<UnpickMetadata> {
	let file: UnpickMetadataFile = serde_json::from_slice(bytes)
		.context("failed to parse unpick metadata")?;

	if file.version != Some(1) {
		return Err(UnsupportedOperationError::new(format!("unsupported unpick version {:?}", file.version)).into());
	}

	Ok(UnpickMetadata {
		unpick_group: file.unpick_group.context("unpick metadata is missing the unpick group")?,
		unpick_version: file.unpick_version.context("unpick metadata is missing the unpick version")?,
	})
}

#[derive(Debug)]
pub struct MappingsProvider {
	identifier: String,
	game_version: String,
	working_dir: PathBuf,
	base_tiny: PathBuf,
	tiny: PathBuf,
	tiny_jar: PathBuf,
	unpick_definitions: PathBuf,
	unpick_metadata_file: PathBuf,
	unpick_metadata: Option<UnpickMetadata>,
	signature_fixes: Option<IndexMap<String, String>>,
}

impl MappingsProvider {
	/// Sets up the working directory for the mappings jar of the config.
	///
	/// If anything fails, the working directory is cleaned, so that the next try starts over.
	pub fn setup(config: &ProviderConfig, service: &MappingsService, suggester: &dyn FieldNameSuggester) -> Result<MappingsProvider> {
		let (format, jar_game_version) = {
			let mut jar = Jar::open(&config.mappings_jar)?;
			let bytes = jar.read_entry(MAPPINGS_ENTRY)?
				.with_context(|| anyhow!("no mappings at {MAPPINGS_ENTRY:?} in {:?}", config.mappings_jar))?;
			inspect_mappings(&bytes)
				.with_context(|| anyhow!("failed to inspect mappings in {:?}", config.mappings_jar))?
		};

		if let Some(jar_game_version) = jar_game_version {
			if jar_game_version != config.game_version {
				warn!("the mappings {}:{} were not built for game version {}, but for {jar_game_version}, proceed with caution",
					config.name, config.version, config.game_version);
			}
		}

		let classifier = mappings_classifier(config.classifier.as_deref(), format == MappingFormat::TinyV2);
		let identifier = mappings_identifier(&config.name, &config.game_version, &config.version, &classifier);
		let working_dir = config.cache_root.join(&identifier);

		let mut provider = MappingsProvider {
			game_version: config.game_version.clone(),
			base_tiny: working_dir.join("mappings-base.tiny"),
			tiny: working_dir.join("mappings.tiny"),
			tiny_jar: working_dir.join("mappings.jar"),
			unpick_definitions: working_dir.join("mappings.unpick"),
			unpick_metadata_file: working_dir.join("unpick.json"),
			unpick_metadata: None,
			signature_fixes: None,
			identifier,
			working_dir,
		};

		debug!("setting up mappings {:?} in {:?}", provider.identifier, provider.working_dir);

		if let Err(e) = provider.run_setup(config, service, suggester) {
			clean_working_dir(&provider.working_dir);
			return Err(e).with_context(|| anyhow!("failed to setup mappings {}:{}", config.name, config.version));
		}

		Ok(provider)
	}

	fn run_setup(&mut self, config: &ProviderConfig, service: &MappingsService, suggester: &dyn FieldNameSuggester) -> Result<()> {
		if config.refresh {
			clean_working_dir(&self.working_dir);
		}
		fs::create_dir_all(&self.working_dir)
			.with_context(|| anyhow!("failed to create working directory {:?}", self.working_dir))?;

		if !self.tiny.exists() || config.refresh {
			self.store_mappings(config, service, suggester)?;
		} else {
			debug!("trusting existing {:?}", self.tiny);
			let mut jar = Jar::open(&config.mappings_jar)?;
			self.extract_extras(&mut jar)?;
		}

		if !self.tiny_jar.exists() || config.refresh {
			if self.tiny_jar.exists() {
				fs::remove_file(&self.tiny_jar)
					.with_context(|| anyhow!("failed to remove {:?}", self.tiny_jar))?;
			}
			let contents = fs::read(&self.tiny)
				.with_context(|| anyhow!("failed to read {:?}", self.tiny))?;
			write_single_entry_jar(&self.tiny_jar, MAPPINGS_ENTRY, &contents)?;
		}

		Ok(())
	}

	fn store_mappings(&mut self, config: &ProviderConfig, service: &MappingsService, suggester: &dyn FieldNameSuggester) -> Result<()> {
		info!(":extracting {:?}", config.mappings_jar.file_name().unwrap_or(config.mappings_jar.as_os_str()));

		{
			let mut jar = Jar::open(&config.mappings_jar)?;
			if !jar.extract(MAPPINGS_ENTRY, &self.base_tiny)? {
				bail!("no mappings at {MAPPINGS_ENTRY:?} in {:?}", config.mappings_jar);
			}
			self.extract_extras(&mut jar)?;
		}

		match tinymap::format::detect_file(&self.base_tiny)? {
			MappingFormat::TinyV2 => {
				// these are unmerged mappings, with the namespaces intermediary and named
				let merged = merge_with_intermediary(&self.base_tiny, &config.intermediary, service)?;
				tinymap::tiny_v2::write_file(&merged, &self.tiny)?;
			},
			MappingFormat::TinyV1 => {
				let GameDistribution::Merged { jar } = &config.game else {
					return Err(UnsupportedOperationError::new("tiny v1 mappings only support a merged game jar").into());
				};

				if self.tiny.exists() {
					fs::remove_file(&self.tiny)
						.with_context(|| anyhow!("failed to remove {:?}", self.tiny))?;
				}
				suggester.suggest(jar, &self.base_tiny, &self.tiny)?;
			},
		}

		Ok(())
	}

	fn extract_extras(&mut self, jar: &mut Jar) -> Result<()> {
		let definitions = jar.read_entry(UNPICK_DEFINITIONS_ENTRY)?;
		let metadata = jar.read_entry(UNPICK_METADATA_ENTRY)?;
		if let (Some(definitions), Some(metadata)) = (definitions, metadata) {
			fs::write(&self.unpick_definitions, definitions)
				.with_context(|| anyhow!("failed to write {:?}", self.unpick_definitions))?;
			fs::write(&self.unpick_metadata_file, &metadata)
				.with_context(|| anyhow!("failed to write {:?}", self.unpick_metadata_file))?;

			self.unpick_metadata = Some(parse_unpick_metadata(&metadata)
				.with_context(|| anyhow!("in {UNPICK_METADATA_ENTRY:?} of {:?}", jar.path()))?);
		}

		if let Some(signatures) = jar.read_entry(RECORD_SIGNATURES_ENTRY)? {
			let fixes: IndexMap<String, String> = serde_json::from_slice(&signatures)
				.with_context(|| anyhow!("failed to parse {RECORD_SIGNATURES_ENTRY:?} of {:?}", jar.path()))?;
			self.signature_fixes = Some(fixes);
		}

		Ok(())
	}

	pub fn identifier(&self) -> &str {
		&self.identifier
	}

	pub fn working_dir(&self) -> &Path {
		&self.working_dir
	}

	pub fn base_tiny_mappings(&self) -> &Path {
		&self.base_tiny
	}

	pub fn tiny_mappings(&self) -> &Path {
		&self.tiny
	}

	pub fn tiny_mappings_jar(&self) -> &Path {
		&self.tiny_jar
	}

	/// The unpick definitions, if the mappings jar has them.
	pub fn unpick_definitions(&self) -> Option<&Path> {
		self.unpick_metadata.as_ref().map(|_| self.unpick_definitions.as_path())
	}

	pub fn unpick_metadata(&self) -> Option<&UnpickMetadata> {
		self.unpick_metadata.as_ref()
	}

	/// Fixed signatures of record classes, by class name.
	pub fn signature_fixes(&self) -> Option<&IndexMap<String, String>> {
		self.signature_fixes.as_ref()
	}

	/// The mappings of `mappings.tiny`, shared by all users of the service.
	pub fn mappings(&self, service: &MappingsService) -> Result<Arc<Mappings>> {
		let source = MappingSource::from_file(&self.tiny)?;
		let key = MappingsKey::new(&source)
			.game_version(&self.game_version)
			.to_string();

		service.get_or_create(&key, || source.read())
	}

	/// The name of a service remapping with these mappings, like `remap:<identifier>:named>INTERMEDIARY`.
	pub fn build_service_name(&self, name: &str, from: &str, to: &str) -> String {
		format!("{name}:{}:{from}>{}", self.identifier, to.to_uppercase())
	}
}

/// Finds the format and the game version the mappings were made for.
fn inspect_mappings(bytes: &[u8]) -> Result<(MappingFormat, Option<String>)> {
	let text = std::str::from_utf8(bytes).context("mappings are not UTF-8")?;
	let mut lines = text.lines();

	let header = lines.next().unwrap_or("");
	let format = MappingFormat::detect(header)?;

	// the properties are the lines indented once right after the header
	let game_version = lines
		.take_while(|line| line.starts_with('\t'))
		.filter_map(|line| line.strip_prefix('\t'))
		.filter_map(|line| line.split_once('\t'))
		.find(|(key, _)| *key == GAME_VERSION_PROPERTY)
		.map(|(_, value)| value.to_owned());

	Ok((format, game_version))
}

/// Merges the `intermediary`/`named` mappings with the `official`/`intermediary` ones into mappings with the
/// namespaces `intermediary`, `official` and `named`.
///
/// Missing `named` names are taken from `intermediary`.
fn merge_with_intermediary(base: &Path, intermediary: &Path, service: &MappingsService) -> Result<Mappings> {
	let base_mappings = tinymap::format::read_file(base)?;

	let source = MappingSource::from_file(intermediary)?;
	let intermediary_mappings = service.get_or_read(&source, "intermediary")
		.with_context(|| anyhow!("failed to read intermediary mappings {intermediary:?}"))?;

	let mut merged = Mappings::merge(&intermediary_mappings, &base_mappings)
		.with_context(|| anyhow!("failed to merge {base:?} with intermediary mappings {intermediary:?}"))?;

	merged.info.namespaces.check_that(&["intermediary", "official", "named"])
		.context("unexpected namespaces after merging with intermediary")?;

	merged.complete_namespace("named", "intermediary")?;

	Ok(merged)
}

/// Removes everything in the working directory. Failures are only logged.
fn clean_working_dir(working_dir: &Path) {
	debug!("cleaning working directory {working_dir:?}");
	if working_dir.exists() {
		if let Err(e) = fs::remove_dir_all(working_dir) {
			error!("failed to clean working directory {working_dir:?}: {e}");
		}
	}
	if let Err(e) = fs::create_dir_all(working_dir) {
		error!("failed to create working directory {working_dir:?}: {e}");
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use tinymap::format::MappingFormat;
	use crate::error::UnsupportedOperationError;
	use crate::provider::{inspect_mappings, parse_unpick_metadata, UnpickMetadata};

	#[test]
	fn unpick_metadata() {
		let metadata = parse_unpick_metadata(br#"{"version": 1, "unpickGroup": "net.fabricmc.unpick", "unpickVersion": "2.3.0"}"#).unwrap();
		assert_eq!(metadata, UnpickMetadata {
			unpick_group: "net.fabricmc.unpick".to_owned(),
			unpick_version: "2.3.0".to_owned(),
		});

		let error = parse_unpick_metadata(br#"{"version": 2, "unpickGroup": "a", "unpickVersion": "b"}"#).unwrap_err();
		assert!(error.downcast_ref::<UnsupportedOperationError>().is_some());

		let error = parse_unpick_metadata(br#"{"unpickGroup": "a", "unpickVersion": "b"}"#).unwrap_err();
		assert!(error.downcast_ref::<UnsupportedOperationError>().is_some());
	}

	#[test]
	fn inspect() {
		let (format, version) = inspect_mappings(b"tiny\t2\t0\tintermediary\tnamed\n\tminecraft_version\t1.20.1\nc\tclass_1\tMain\n").unwrap();
		assert_eq!(format, MappingFormat::TinyV2);
		assert_eq!(version.as_deref(), Some("1.20.1"));

		let (format, version) = inspect_mappings(b"v1\tofficial\tintermediary\tnamed\n").unwrap();
		assert_eq!(format, MappingFormat::TinyV1);
		assert_eq!(version, None);

		assert!(inspect_mappings(b"tsrg2 obf srg\n").is_err());
	}
}
