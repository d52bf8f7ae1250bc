//! Proposing field names for legacy (tiny v1) mappings.
//!
//! Legacy mappings come as one merged table, without names for many fields. A tool looking at the game jar proposes
//! names for them, writing a new mappings file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use anyhow::{anyhow, bail, Context, Result};
use log::info;
use crate::java::{JavaEntry, JavaLauncher, JavaRunConfig};

/// Proposes field names for the mappings at `base`, looking at the merged game jar, writing the result to `out`.
pub trait FieldNameSuggester {
	fn suggest(&self, merged_jar: &Path, base: &Path, out: &Path) -> Result<()>;
}

/// Runs the `proposeFieldNames` command of stitch.
#[derive(Debug, Clone)]
pub struct StitchFieldNameSuggester {
	launcher: JavaLauncher,
	classpath: Vec<PathBuf>,
}

impl StitchFieldNameSuggester {
	pub const MAIN_CLASS: &'static str = "net.fabricmc.stitch.Main";
	pub const COMMAND: &'static str = "proposeFieldNames";
	pub const MIN_JAVA_VERSION: u16 = 8;

	pub fn new(launcher: JavaLauncher, classpath: Vec<PathBuf>) -> StitchFieldNameSuggester {
		StitchFieldNameSuggester { launcher, classpath }
	}

	fn config(&self, merged_jar: &Path, base: &Path, out: &Path) -> Result<JavaRunConfig> {
		let absolute = |path: &Path| -> Result<OsString> {
			std::path::absolute(path)
				.map(OsString::from)
				.with_context(|| anyhow!("failed to make {path:?} absolute"))
		};

		Ok(JavaRunConfig {
			entry: JavaEntry::MainClass {
				main_class: Self::MAIN_CLASS.into(),
				classpath: self.classpath.iter().map(OsString::from).collect(),
			},
			jvm_args: Vec::new(),
			args: vec![Self::COMMAND.into(), absolute(merged_jar)?, absolute(base)?, absolute(out)?],
			min_java_version: Some(Self::MIN_JAVA_VERSION),
		})
	}
}

impl FieldNameSuggester for StitchFieldNameSuggester {
	fn suggest(&self, merged_jar: &Path, base: &Path, out: &Path) -> Result<()> {
		info!(":populating field names");

		let config = self.config(merged_jar, base, out)?;
		self.launcher.launch(&config)
			.with_context(|| anyhow!("failed to propose field names for {base:?}"))?;

		if !out.exists() {
			bail!("proposing field names for {base:?} didn't write {out:?}");
		}
		Ok(())
	}
}

#[cfg(test)]
mod testing {
	use std::ffi::OsString;
	use std::path::{Path, PathBuf};
	use anyhow::Result;
	use pretty_assertions::assert_eq;
	use crate::field_names::StitchFieldNameSuggester;
	use crate::java::{JavaEntry, JavaLauncher};

	#[test]
	fn arguments() -> Result<()> {
		let suggester = StitchFieldNameSuggester::new(JavaLauncher::default(), vec![PathBuf::from("/libs/stitch.jar")]);
		let config = suggester.config(Path::new("/game/merged.jar"), Path::new("/work/base.tiny"), Path::new("/work/out.tiny"))?;

		let JavaEntry::MainClass { main_class, classpath } = &config.entry else {
			panic!("expected a main class entry, got {:?}", config.entry);
		};
		assert_eq!(main_class, "net.fabricmc.stitch.Main");
		assert_eq!(*classpath, [OsString::from("/libs/stitch.jar")]);
		assert_eq!(config.args, ["proposeFieldNames", "/game/merged.jar", "/work/base.tiny", "/work/out.tiny"]);
		assert_eq!(config.min_java_version, Some(8));
		Ok(())
	}
}
