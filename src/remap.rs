//! Handing mappings to a bytecode remapper, and driving it through one remapping session.
//!
//! A [`RemapProvider`] is the view of a mapping table the remapper consumes: the renames from one namespace to
//! another. A [`RemapSession`] owns a [`RemapEngine`] and makes sure it's used in order: first inputs and classpath are
//! read, then outputs are written, then it's closed.

use std::ffi::OsString;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{anyhow, bail, Context, Result};
use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};
use parking_lot::Mutex;
use tinymap::ident::{ClassName, FieldDescriptor, FieldName, MethodDescriptor, MethodName, ParameterName};
use tinymap::remapper::ARemapper;
use tinymap::tree::mappings::Mappings;
use tinymap::tree::names::Namespace;
use crate::error::IllegalStateError;
use crate::java::{JavaEntry, JavaLauncher, JavaRunConfig};

/// Receives the renames of a [`RemapProvider`].
///
/// Owners and descriptors are given with the class names of the namespace remapped from.
pub trait MappingAcceptor {
	fn accept_class(&mut self, from: &str, to: &str);
	fn accept_field(&mut self, owner: &str, name: &str, desc: &str, to: &str);
	fn accept_method(&mut self, owner: &str, name: &str, desc: &str, to: &str);
	fn accept_parameter(&mut self, owner: &str, method: &str, desc: &str, index: usize, to: &str);
}

/// One rename, as given to a [`MappingAcceptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingEntry {
	Class { from: ClassName, to: ClassName },
	Field { owner: ClassName, name: FieldName, desc: FieldDescriptor, to: FieldName },
	Method { owner: ClassName, name: MethodName, desc: MethodDescriptor, to: MethodName },
	Parameter { owner: ClassName, method: MethodName, desc: MethodDescriptor, index: usize, to: ParameterName },
}

impl MappingAcceptor for Vec<MappingEntry> {
	fn accept_class(&mut self, from: &str, to: &str) {
		self.push(MappingEntry::Class { from: from.into(), to: to.into() });
	}

	fn accept_field(&mut self, owner: &str, name: &str, desc: &str, to: &str) {
		self.push(MappingEntry::Field { owner: owner.into(), name: name.into(), desc: desc.into(), to: to.into() });
	}

	fn accept_method(&mut self, owner: &str, name: &str, desc: &str, to: &str) {
		self.push(MappingEntry::Method { owner: owner.into(), name: name.into(), desc: desc.into(), to: to.into() });
	}

	fn accept_parameter(&mut self, owner: &str, method: &str, desc: &str, index: usize, to: &str) {
		self.push(MappingEntry::Parameter { owner: owner.into(), method: method.into(), desc: desc.into(), index, to: to.into() });
	}
}

/// The renames of a mapping table from the namespace `from` to the namespace `to`.
#[derive(Debug, Clone)]
pub struct RemapProvider {
	mappings: Arc<Mappings>,
	from: Namespace,
	to: Namespace,
	remap_locals: bool,
}

impl RemapProvider {
	pub fn new(mappings: Arc<Mappings>, from: &str, to: &str) -> Result<RemapProvider> {
		let from = mappings.get_namespace(from)?;
		let to = mappings.get_namespace(to)?;
		Ok(RemapProvider { mappings, from, to, remap_locals: false })
	}

	/// Whether to also give parameter names.
	pub fn remap_locals(mut self, remap_locals: bool) -> RemapProvider {
		self.remap_locals = remap_locals;
		self
	}

	pub fn mappings(&self) -> &Arc<Mappings> {
		&self.mappings
	}

	pub fn from(&self) -> &str {
		&self.mappings.info.namespaces[self.from]
	}

	pub fn to(&self) -> &str {
		&self.mappings.info.namespaces[self.to]
	}

	/// Gives all the renames to the acceptor.
	///
	/// Entries without a name in the namespace remapped to are left out. Owners without a name in the namespace
	/// remapped from are given with their key.
	pub fn load(&self, acceptor: &mut impl MappingAcceptor) -> Result<()> {
		let remapper = self.mappings.remapper_a(Namespace::SRC, self.from)?;

		for (key, class) in &self.mappings.classes {
			let names = &class.info.names;
			let owner = names.get(self.from).unwrap_or(key);

			if let Some(to) = names.get(self.to) {
				acceptor.accept_class(owner.as_str(), to.as_str());
			}

			for field in class.fields.values() {
				if let (Some(name), Some(to)) = (field.info.names.get(self.from), field.info.names.get(self.to)) {
					let desc = remapper.map_field_desc(&field.info.desc)?;
					acceptor.accept_field(owner.as_str(), name.as_str(), desc.as_str(), to.as_str());
				}
			}

			for method in class.methods.values() {
				let Some(name) = method.info.names.get(self.from) else {
					continue;
				};
				let desc = remapper.map_method_desc(&method.info.desc)?;

				if let Some(to) = method.info.names.get(self.to) {
					acceptor.accept_method(owner.as_str(), name.as_str(), desc.as_str(), to.as_str());
				}

				if self.remap_locals {
					for parameter in method.parameters.values() {
						if let Some(to) = parameter.info.names.get(self.to) {
							acceptor.accept_parameter(owner.as_str(), name.as_str(), desc.as_str(), parameter.info.index, to.as_str());
						}
					}
				}
			}
		}

		Ok(())
	}

	/// Collects the renames of [`RemapProvider::load`]. Each call gives a new iterator.
	pub fn entries(&self) -> Result<std::vec::IntoIter<MappingEntry>> {
		let mut entries = Vec::new();
		self.load(&mut entries)?;
		Ok(entries.into_iter())
	}
}

/// Identifies a group of inputs that are remapped to one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputTag(usize);

/// Something that remaps class files, like tiny-remapper.
pub trait RemapEngine {
	/// Called once, before anything else.
	fn load_mappings(&mut self, providers: &[RemapProvider]) -> Result<()>;
	fn read_inputs(&mut self, tag: InputTag, paths: &[PathBuf]) -> Result<()>;
	fn read_classpath(&mut self, paths: &[PathBuf]) -> Result<()>;
	/// Remaps the inputs of the tag, and writes them to `output`.
	fn apply(&mut self, tag: InputTag, output: &Path) -> Result<()>;
	/// Called once, at the end.
	fn finish(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	Created,
	ReadingInputs,
	Remapping,
	Closed,
}

struct Session<E> {
	state: SessionState,
	engine: Option<E>,
	providers: Vec<RemapProvider>,
	input_tags: IndexMap<PathBuf, InputTag>,
	classpath: IndexSet<PathBuf>,
}

impl<E> Session<E> {
	fn engine(&mut self, action: &str) -> Result<&mut E> {
		match (self.state, self.engine.as_mut()) {
			(SessionState::Closed, _) | (_, None) => Err(IllegalStateError::new(format!("cannot {action}, the remap session is closed")).into()),
			(_, Some(engine)) => Ok(engine),
		}
	}
}

/// One remapping session.
///
/// Inputs can only be read before the first output is written, and nothing can be done after closing it. The session
/// can be shared between threads, all state is behind a lock.
pub struct RemapSession<E> {
	session: Mutex<Session<E>>,
}

impl<E> Debug for RemapSession<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RemapSession")
			.field("state", &self.session.lock().state)
			.finish_non_exhaustive()
	}
}

impl<E: RemapEngine> RemapSession<E> {
	pub fn new(mut engine: E, providers: Vec<RemapProvider>) -> Result<RemapSession<E>> {
		engine.load_mappings(&providers)
			.context("failed to give the mappings to the remapper")?;

		Ok(RemapSession {
			session: Mutex::new(Session {
				state: SessionState::Created,
				engine: Some(engine),
				providers,
				input_tags: IndexMap::new(),
				classpath: IndexSet::new(),
			}),
		})
	}

	pub fn state(&self) -> SessionState {
		self.session.lock().state
	}

	/// Returns the tag for the file, the same tag each time for the same (absolute) path.
	pub fn input_tag(&self, path: &Path) -> Result<InputTag> {
		let path = std::path::absolute(path)
			.with_context(|| anyhow!("failed to make {path:?} absolute"))?;

		let mut session = self.session.lock();
		session.engine("create input tags")?;

		let next = InputTag(session.input_tags.len());
		Ok(*session.input_tags.entry(path).or_insert(next))
	}

	pub fn read_inputs(&self, tag: InputTag, paths: &[PathBuf]) -> Result<()> {
		let mut session = self.session.lock();
		if session.state == SessionState::Remapping {
			return Err(IllegalStateError::new("cannot read inputs as remapping has already started").into());
		}

		session.engine("read inputs")?.read_inputs(tag, paths)?;
		session.state = SessionState::ReadingInputs;
		Ok(())
	}

	/// Reads the classpath, skipping the paths already read.
	pub fn read_classpath(&self, paths: &[PathBuf]) -> Result<()> {
		let mut session = self.session.lock();
		session.engine("read the classpath")?;

		let to_read: Vec<PathBuf> = paths.iter()
			.filter(|path| session.classpath.insert((*path).clone()))
			.cloned()
			.collect();

		if to_read.is_empty() {
			trace!("classpath already read");
			return Ok(());
		}

		session.engine("read the classpath")?.read_classpath(&to_read)
	}

	/// Remaps the inputs of the tag, writing them to `output`. After this, no more inputs can be read.
	pub fn remap(&self, tag: InputTag, output: &Path) -> Result<()> {
		let mut session = self.session.lock();
		session.engine("remap")?;
		session.state = SessionState::Remapping;

		session.engine("remap")?.apply(tag, output)
			.with_context(|| anyhow!("failed to remap to {output:?}"))
	}

	/// Finishes the remapper, and releases the mappings.
	pub fn close(&self) -> Result<()> {
		let mut session = self.session.lock();
		session.engine("close")?.finish()?;

		debug!("closing remap session with {} providers", session.providers.len());
		session.state = SessionState::Closed;
		session.engine = None;
		session.providers.clear();
		Ok(())
	}
}

/// Runs tiny-remapper as a separate process, once for each output.
///
/// Only a single [`RemapProvider`] is supported, its mappings are written to `mappings.tiny` in the working directory.
#[derive(Debug)]
pub struct TinyRemapperProcess {
	launcher: JavaLauncher,
	remapper_jar: PathBuf,
	work_dir: PathBuf,
	mappings_file: Option<PathBuf>,
	from: String,
	to: String,
	remap_locals: bool,
	inputs: IndexMap<InputTag, Vec<PathBuf>>,
	classpath: Vec<PathBuf>,
}

impl TinyRemapperProcess {
	pub const MIN_JAVA_VERSION: u16 = 8;

	pub fn new(launcher: JavaLauncher, remapper_jar: PathBuf, work_dir: PathBuf) -> TinyRemapperProcess {
		TinyRemapperProcess {
			launcher,
			remapper_jar,
			work_dir,
			mappings_file: None,
			from: String::new(),
			to: String::new(),
			remap_locals: false,
			inputs: IndexMap::new(),
			classpath: Vec::new(),
		}
	}

	fn config(&self, input: &Path, output: &Path) -> Result<JavaRunConfig> {
		let mappings_file = self.mappings_file.as_ref()
			.context("no mappings were loaded")?;

		let mut args: Vec<OsString> = vec![
			input.into(),
			output.into(),
			mappings_file.into(),
			(&self.from).into(),
			(&self.to).into(),
		];
		args.extend(self.classpath.iter().map(OsString::from));
		if !self.remap_locals {
			args.push("--skiplocalvariablemapping".into());
		}

		Ok(JavaRunConfig {
			entry: JavaEntry::Jar(self.remapper_jar.clone()),
			jvm_args: Vec::new(),
			args,
			min_java_version: Some(Self::MIN_JAVA_VERSION),
		})
	}
}

impl RemapEngine for TinyRemapperProcess {
	fn load_mappings(&mut self, providers: &[RemapProvider]) -> Result<()> {
		let [provider] = providers else {
			bail!("a tiny-remapper process takes exactly one mappings provider, got {}", providers.len());
		};

		std::fs::create_dir_all(&self.work_dir)
			.with_context(|| anyhow!("failed to create {:?}", self.work_dir))?;

		let mappings_file = self.work_dir.join("mappings.tiny");
		tinymap::tiny_v2::write_file(provider.mappings(), &mappings_file)?;

		self.mappings_file = Some(mappings_file);
		self.from = provider.from().to_owned();
		self.to = provider.to().to_owned();
		self.remap_locals = provider.remap_locals;
		Ok(())
	}

	fn read_inputs(&mut self, tag: InputTag, paths: &[PathBuf]) -> Result<()> {
		self.inputs.entry(tag).or_default().extend_from_slice(paths);
		Ok(())
	}

	fn read_classpath(&mut self, paths: &[PathBuf]) -> Result<()> {
		self.classpath.extend_from_slice(paths);
		Ok(())
	}

	fn apply(&mut self, tag: InputTag, output: &Path) -> Result<()> {
		let inputs = self.inputs.get(&tag).map(Vec::as_slice).unwrap_or_default();
		let [input] = inputs else {
			bail!("a tiny-remapper process remaps exactly one input per output, got {inputs:?} for {tag:?}");
		};

		let config = self.config(input, output)?;
		self.launcher.launch(&config)
	}

	fn finish(&mut self) -> Result<()> {
		if let Some(mappings_file) = self.mappings_file.take() {
			std::fs::remove_file(&mappings_file)
				.with_context(|| anyhow!("failed to remove {mappings_file:?}"))?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod testing {
	use std::ffi::OsString;
	use std::path::{Path, PathBuf};
	use std::sync::Arc;
	use anyhow::Result;
	use pretty_assertions::assert_eq;
	use crate::java::JavaLauncher;
	use crate::remap::{RemapEngine, RemapProvider, TinyRemapperProcess};

	#[test]
	fn process_arguments() -> Result<()> {
		let dir = tempfile::tempdir()?;
		let mappings = tinymap::tiny_v2::read("tiny\t2\t0\tintermediary\tnamed\nc\tclass_1\tMain\n".as_bytes())?;
		let provider = RemapProvider::new(Arc::new(mappings), "named", "intermediary")?;

		let mut process = TinyRemapperProcess::new(JavaLauncher::default(), PathBuf::from("tiny-remapper.jar"), dir.path().to_owned());
		process.load_mappings(&[provider])?;
		process.read_classpath(&[PathBuf::from("lib.jar")])?;

		let config = process.config(Path::new("in.jar"), Path::new("out.jar"))?;
		let mappings_file = OsString::from(dir.path().join("mappings.tiny"));
		assert_eq!(config.args, [
			OsString::from("in.jar"),
			OsString::from("out.jar"),
			mappings_file,
			OsString::from("named"),
			OsString::from("intermediary"),
			OsString::from("lib.jar"),
			OsString::from("--skiplocalvariablemapping"),
		]);
		assert_eq!(config.min_java_version, Some(8));
		assert!(dir.path().join("mappings.tiny").exists());

		process.finish()?;
		assert!(!dir.path().join("mappings.tiny").exists());
		Ok(())
	}

	#[test]
	fn process_takes_one_provider() {
		let mut process = TinyRemapperProcess::new(JavaLauncher::default(), PathBuf::from("tiny-remapper.jar"), PathBuf::from("unused"));
		assert!(process.load_mappings(&[]).is_err());
	}
}
