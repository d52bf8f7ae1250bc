//! Running Java programs, like the remapper or the field name proposer.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::Command;
use anyhow::{anyhow, bail, Context, Result};
use log::{debug, error, trace};

/// The "Java File Separator". On Windows `;`, on unix-based ':'.
#[cfg(not(windows))]
const FILE_SEPARATOR: &str = ":";
#[cfg(windows)]
const FILE_SEPARATOR: &str = ";";

/// What to run: either a main class on a classpath, or an executable jar.
#[derive(Debug, Clone)]
pub enum JavaEntry {
	MainClass {
		main_class: OsString,
		classpath: Vec<OsString>,
	},
	Jar(PathBuf),
}

#[derive(Debug, Clone)]
pub struct JavaRunConfig {
	pub entry: JavaEntry,
	pub jvm_args: Vec<OsString>,
	pub args: Vec<OsString>,
	/// If set, the java must be at least of this major version to launch.
	pub min_java_version: Option<u16>,
}

#[derive(Debug, Clone)]
pub struct JavaLauncher {
	java_command: OsString,
}

impl Default for JavaLauncher {
	fn default() -> Self {
		JavaLauncher { java_command: "java".into() }
	}
}

impl JavaLauncher {
	pub fn new(java_command: &(impl AsRef<OsStr> + ?Sized)) -> JavaLauncher {
		JavaLauncher { java_command: OsString::from(java_command) }
	}

	pub fn from_env_var() -> Option<JavaLauncher> {
		const JAVA_HOME: &str = "JAVA_HOME";

		std::env::var_os(JAVA_HOME)
			.map(|java_home| {
				// needs to be a PathBuf because that takes care of slashes at the end
				let mut path = PathBuf::from(java_home);
				path.push("bin/java");
				let java_command = OsString::from(path);

				trace!("located java via env var as {java_command:?}");

				JavaLauncher { java_command }
			})
	}

	/// Takes the java from `JAVA_HOME`, or the one on the `PATH` if that's not set.
	pub fn locate() -> JavaLauncher {
		JavaLauncher::from_env_var().unwrap_or_default()
	}

	/// Returns `Err(_)` if the java doesn't satisfy the given version.
	///
	/// This is done by running `java -version` as a process, and parsing it's output.
	pub fn check_java_version(&self, min_java_major_version: u16) -> Result<()> {
		let mut command = Command::new(&self.java_command);
		command.arg("-version");

		trace!("running {command:?} to get java version");
		let output = command.output()
			.with_context(|| anyhow!("failed to run {command:?}"))?;

		let stderr = std::str::from_utf8(&output.stderr)
			.with_context(|| anyhow!("stderr of is not UTF-8: {:?}", &output.stderr))?;

		let version = java_dash_version_output_to_version(stderr)
			.with_context(|| anyhow!("failed to get java version from {output:?}"))?;

		trace!("that's java {version}");

		if version < min_java_major_version {
			bail!("java found as {:?} is of major version {version}, expected at least major version {min_java_major_version}", &self.java_command);
		}

		Ok(())
	}

	fn command(&self, config: &JavaRunConfig) -> Command {
		let mut command = Command::new(&self.java_command);

		command.args(&config.jvm_args);
		match &config.entry {
			JavaEntry::MainClass { main_class, classpath } => {
				command
					.args([OsStr::new("-classpath"), &classpath.join(OsStr::new(FILE_SEPARATOR))])
					.arg(main_class);
			},
			JavaEntry::Jar(jar) => {
				command.arg("-jar").arg(jar);
			},
		}
		command.args(&config.args);

		command
	}

	/// Runs the program, and fails if it doesn't exit successfully.
	///
	/// If the config asks for a minimum java version, that's checked first.
	pub fn launch(&self, config: &JavaRunConfig) -> Result<()> {
		if let Some(min_java_version) = config.min_java_version {
			self.check_java_version(min_java_version)?;
		}

		let mut command = self.command(config);

		debug!("run: {} {}", command.get_program().to_string_lossy(), command.get_args().map(|x| x.to_string_lossy()).collect::<Vec<_>>().join(" "));

		let status = command.spawn()
			.with_context(|| anyhow!("failed to start {:?}", command.get_program()))?
			.wait()
			.with_context(|| anyhow!("failed to wait for {:?}", command.get_program()))?;

		if !status.success() {
			error!("java exited with error state {status:?}");
			bail!("java program {:?} failed with {status}", config.entry);
		}

		trace!("java exited with {status:?}");
		Ok(())
	}
}

/// Parse the output of `java -version` into the major java version
///
/// `java -version` writes to stderr a predictable format, where in the first line, the third field is the version,
/// enclosed in a pair of `"`. Java 8 and below use the old format like `1.8.0_412`, newer ones look like `17.0.11`
/// or just `22`.
fn java_dash_version_output_to_version(stderr: &str) -> Result<u16> {
	let line = stderr.lines().next().with_context(|| anyhow!("expected a line on stderr, got {stderr:?}"))?;

	// Something like `"1.8.0_412"` or `"17.0.11"` (notice the quotes)
	let quoted_version = line.split(' ').nth(2).with_context(|| anyhow!("expected third item (space separated) of {line:?} to exist"))?;

	let version_string = quoted_version.strip_prefix('\"')
		.and_then(|x| x.strip_suffix('\"'))
		.with_context(|| anyhow!("expected version string to start with \" and end with \", got {quoted_version:?}"))?;

	let number = if let Some(rest) = version_string.strip_prefix("1.") {
		rest.split_once('.').map_or(rest, |(major, _)| major)
	} else if let Some((major, _)) = version_string.split_once('.') {
		major
	} else {
		version_string
	};

	number.parse()
		.with_context(|| anyhow!("failed to parse {number:?} of java version {version_string:?}"))
}
