use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use anyhow::{bail, Result};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;
use loom_mappings::archive::{Jar, MAPPINGS_ENTRY};
use loom_mappings::error::UnsupportedOperationError;
use loom_mappings::field_names::FieldNameSuggester;
use loom_mappings::provider::{GameDistribution, MappingsProvider, ProviderConfig, UnpickMetadata};
use loom_mappings::service::MappingsService;
use tinymap::error::UnsupportedFormatError;

const INTERMEDIARY: &str = "\
tiny	2	0	official	intermediary
c	a	net/minecraft/class_1
	m	(La;)V	b	method_1
c	b	net/minecraft/class_2
";

const YARN_V2: &str = "\
tiny	2	0	intermediary	named
	minecraft_version	1.20.1
c	net/minecraft/class_1	net/minecraft/Main
	m	(Lnet/minecraft/class_1;)V	method_1	run
";

const MERGED: &str = "\
tiny	2	0	intermediary	official	named
	minecraft_version	1.20.1
c	net/minecraft/class_1	a	net/minecraft/Main
	m	(Lnet/minecraft/class_1;)V	method_1	b	run
c	net/minecraft/class_2	b	net/minecraft/class_2
";

const YARN_V1: &str = "\
v1	official	intermediary	named
CLASS	a	net/minecraft/class_1	net/minecraft/Main
";

const PROPOSED: &str = "\
v1	official	intermediary	named
CLASS	a	net/minecraft/class_1	net/minecraft/Main
FIELD	a	I	a	field_1	count
";

fn write_jar(path: &Path, entries: &[(&str, &str)]) -> Result<()> {
	let mut zip = ZipWriter::new(File::create(path)?);
	for (name, contents) in entries {
		zip.start_file(*name, FileOptions::<()>::default())?;
		zip.write_all(contents.as_bytes())?;
	}
	zip.finish()?;
	Ok(())
}

struct Setup {
	dir: TempDir,
	config: ProviderConfig,
}

impl Setup {
	fn new(entries: &[(&str, &str)], game: GameDistribution) -> Result<Setup> {
		let dir = tempfile::tempdir()?;

		let mappings_jar = dir.path().join("yarn.jar");
		write_jar(&mappings_jar, entries)?;
		let intermediary = dir.path().join("intermediary.tiny");
		std::fs::write(&intermediary, INTERMEDIARY)?;

		let config = ProviderConfig {
			mappings_jar,
			name: "net.fabricmc.yarn".to_owned(),
			version: "1.20.1+build.1".to_owned(),
			classifier: None,
			game_version: "1.20.1".to_owned(),
			game,
			intermediary,
			cache_root: dir.path().join("cache"),
			refresh: false,
		};

		Ok(Setup { dir, config })
	}
}

/// Fails if it's asked for field names.
struct NoSuggestions;

impl FieldNameSuggester for NoSuggestions {
	fn suggest(&self, _: &Path, base: &Path, _: &Path) -> Result<()> {
		bail!("didn't expect to propose field names for {base:?}")
	}
}

/// Writes [`PROPOSED`], and remembers what it was asked.
#[derive(Default)]
struct FixedSuggestions {
	calls: Mutex<Vec<(PathBuf, PathBuf, PathBuf)>>,
}

impl FieldNameSuggester for FixedSuggestions {
	fn suggest(&self, merged_jar: &Path, base: &Path, out: &Path) -> Result<()> {
		self.calls.lock().push((merged_jar.to_owned(), base.to_owned(), out.to_owned()));
		std::fs::write(out, PROPOSED)?;
		Ok(())
	}
}

#[test]
fn v2_merges_with_intermediary() -> Result<()> {
	let setup = Setup::new(&[(MAPPINGS_ENTRY, YARN_V2)], GameDistribution::Split)?;
	let service = MappingsService::new();

	let provider = MappingsProvider::setup(&setup.config, &service, &NoSuggestions)?;

	assert_eq!(provider.identifier(), "net.fabricmc.yarn.1_20_1.1.20.1+build.1-v2");
	assert_eq!(provider.working_dir(), setup.dir.path().join("cache/net.fabricmc.yarn.1_20_1.1.20.1+build.1-v2"));
	assert_eq!(std::fs::read_to_string(provider.base_tiny_mappings())?, YARN_V2);
	assert_eq!(std::fs::read_to_string(provider.tiny_mappings())?, MERGED);

	let mut jar = Jar::open(provider.tiny_mappings_jar())?;
	assert_eq!(jar.read_entry(MAPPINGS_ENTRY)?.as_deref(), Some(MERGED.as_bytes()));

	assert_eq!(provider.unpick_definitions(), None);
	assert_eq!(provider.signature_fixes(), None);

	let mappings = provider.mappings(&service)?;
	let named = mappings.get_namespace("named")?;
	assert_eq!(mappings.get_class_name("net/minecraft/class_1", named)?.as_str(), "net/minecraft/Main");
	assert!(std::sync::Arc::ptr_eq(&mappings, &provider.mappings(&service)?));

	assert_eq!(
		provider.build_service_name("remap", "named", "intermediary"),
		"remap:net.fabricmc.yarn.1_20_1.1.20.1+build.1-v2:named>INTERMEDIARY",
	);
	Ok(())
}

#[test]
fn existing_mappings_are_trusted() -> Result<()> {
	let mut setup = Setup::new(&[(MAPPINGS_ENTRY, YARN_V2)], GameDistribution::Split)?;

	let provider = MappingsProvider::setup(&setup.config, &MappingsService::new(), &NoSuggestions)?;

	// pretend someone else wrote it, it must not be rebuilt
	let trusted = "tiny\t2\t0\tintermediary\tofficial\tnamed\n";
	std::fs::write(provider.tiny_mappings(), trusted)?;
	std::fs::remove_file(provider.tiny_mappings_jar())?;

	let provider = MappingsProvider::setup(&setup.config, &MappingsService::new(), &NoSuggestions)?;
	assert_eq!(std::fs::read_to_string(provider.tiny_mappings())?, trusted);
	let mut jar = Jar::open(provider.tiny_mappings_jar())?;
	assert_eq!(jar.read_entry(MAPPINGS_ENTRY)?.as_deref(), Some(trusted.as_bytes()));

	setup.config.refresh = true;
	let provider = MappingsProvider::setup(&setup.config, &MappingsService::new(), &NoSuggestions)?;
	assert_eq!(std::fs::read_to_string(provider.tiny_mappings())?, MERGED);
	let mut jar = Jar::open(provider.tiny_mappings_jar())?;
	assert_eq!(jar.read_entry(MAPPINGS_ENTRY)?.as_deref(), Some(MERGED.as_bytes()));
	Ok(())
}

#[test]
fn v1_needs_a_merged_game() -> Result<()> {
	let setup = Setup::new(&[(MAPPINGS_ENTRY, YARN_V1)], GameDistribution::Split)?;

	let error = MappingsProvider::setup(&setup.config, &MappingsService::new(), &NoSuggestions).unwrap_err();
	assert!(error.downcast_ref::<UnsupportedOperationError>().is_some(), "{error:?}");

	let working_dir = setup.config.cache_root.join("net.fabricmc.yarn.1_20_1.1.20.1+build.1");
	assert!(!working_dir.join("mappings-base.tiny").exists());
	assert!(!working_dir.join("mappings.tiny").exists());
	assert!(!working_dir.join("mappings.jar").exists());
	Ok(())
}

#[test]
fn v1_proposes_field_names() -> Result<()> {
	let game_jar = PathBuf::from("/game/merged.jar");
	let setup = Setup::new(&[(MAPPINGS_ENTRY, YARN_V1)], GameDistribution::Merged { jar: game_jar.clone() })?;
	let suggester = FixedSuggestions::default();

	let provider = MappingsProvider::setup(&setup.config, &MappingsService::new(), &suggester)?;

	assert_eq!(provider.identifier(), "net.fabricmc.yarn.1_20_1.1.20.1+build.1");
	assert_eq!(*suggester.calls.lock(), [
		(game_jar, provider.base_tiny_mappings().to_owned(), provider.tiny_mappings().to_owned()),
	]);
	assert_eq!(std::fs::read_to_string(provider.tiny_mappings())?, PROPOSED);
	Ok(())
}

#[test]
fn extras() -> Result<()> {
	let setup = Setup::new(&[
		(MAPPINGS_ENTRY, YARN_V2),
		("extras/definitions.unpick", "v2\nconstant net/minecraft/Main MAX\n"),
		("extras/unpick.json", r#"{"version": 1, "unpickGroup": "net.fabricmc.unpick", "unpickVersion": "2.3.0"}"#),
		("extras/record_signatures.json", r#"{"net/minecraft/class_1": "Ljava/lang/Record;"}"#),
	], GameDistribution::Split)?;

	let provider = MappingsProvider::setup(&setup.config, &MappingsService::new(), &NoSuggestions)?;

	let definitions = provider.unpick_definitions().unwrap();
	assert_eq!(std::fs::read_to_string(definitions)?, "v2\nconstant net/minecraft/Main MAX\n");
	assert_eq!(provider.unpick_metadata(), Some(&UnpickMetadata {
		unpick_group: "net.fabricmc.unpick".to_owned(),
		unpick_version: "2.3.0".to_owned(),
	}));

	let fixes = provider.signature_fixes().unwrap();
	assert_eq!(fixes.get("net/minecraft/class_1").map(String::as_str), Some("Ljava/lang/Record;"));

	// extras are also found when the mappings are trusted
	let provider = MappingsProvider::setup(&setup.config, &MappingsService::new(), &NoSuggestions)?;
	assert!(provider.unpick_metadata().is_some());
	assert!(provider.signature_fixes().is_some());
	Ok(())
}

#[test]
fn bad_unpick_metadata_cleans_up() -> Result<()> {
	let setup = Setup::new(&[
		(MAPPINGS_ENTRY, YARN_V2),
		("extras/definitions.unpick", "v2\n"),
		("extras/unpick.json", r#"{"version": 2}"#),
	], GameDistribution::Split)?;

	let error = MappingsProvider::setup(&setup.config, &MappingsService::new(), &NoSuggestions).unwrap_err();
	assert!(error.downcast_ref::<UnsupportedOperationError>().is_some(), "{error:?}");

	let working_dir = setup.config.cache_root.join("net.fabricmc.yarn.1_20_1.1.20.1+build.1-v2");
	assert_eq!(std::fs::read_dir(&working_dir)?.count(), 0);
	Ok(())
}

#[test]
fn unknown_format_leaves_no_working_dir() -> Result<()> {
	let setup = Setup::new(&[(MAPPINGS_ENTRY, "tsrg2 left right\na b\n")], GameDistribution::Split)?;

	let error = MappingsProvider::setup(&setup.config, &MappingsService::new(), &NoSuggestions).unwrap_err();
	assert!(error.downcast_ref::<UnsupportedFormatError>().is_some(), "{error:?}");

	let cache_root = &setup.config.cache_root;
	assert!(!cache_root.exists() || std::fs::read_dir(cache_root)?.count() == 0);
	Ok(())
}
