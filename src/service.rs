//! The in-memory mapping tables of one build.

use std::sync::Arc;
use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use log::{debug, trace};
use parking_lot::Mutex;
use tinymap::tree::mappings::Mappings;
use crate::identity::{MappingSource, MappingsKey};

type Slot = Arc<Mutex<Option<Arc<Mappings>>>>;

/// Holds every mapping table built during one build, by key.
///
/// Create one at the start of a build, pass it around by reference, and [`clear`][MappingsService::clear] it at the
/// end. Every table is built at most once: concurrent callers asking for the same key wait for the one building it,
/// while callers for other keys don't.
#[derive(Debug, Default)]
pub struct MappingsService {
	slots: Mutex<IndexMap<String, Slot>>,
}

impl MappingsService {
	pub fn new() -> MappingsService {
		MappingsService::default()
	}

	/// Returns the table for the key, building it with `factory` if there's none yet.
	///
	/// If the factory fails, nothing is stored, and the next call for the key tries again.
	pub fn get_or_create(&self, key: &str, factory: impl FnOnce() -> Result<Mappings>) -> Result<Arc<Mappings>> {
		// only the slot of this key stays locked while building
		let slot = self.slots.lock()
			.entry(key.to_owned())
			.or_default()
			.clone();

		let mut built = slot.lock();
		if let Some(mappings) = built.as_ref() {
			trace!("mappings for {key:?} are already built");
			return Ok(Arc::clone(mappings));
		}

		debug!("building mappings for {key:?}");
		let mappings = Arc::new(factory().with_context(|| anyhow!("failed to build mappings for {key:?}"))?);
		*built = Some(Arc::clone(&mappings));

		Ok(mappings)
	}

	/// Returns the table for the key, if it's built already.
	pub fn get(&self, key: &str) -> Option<Arc<Mappings>> {
		let slot = self.slots.lock().get(key).cloned()?;
		let built = slot.lock();
		built.clone()
	}

	/// The number of built tables.
	pub fn len(&self) -> usize {
		let slots: Vec<Slot> = self.slots.lock().values().cloned().collect();
		slots.iter().filter(|slot| slot.lock().is_some()).count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Drops all tables, at the end of a build.
	pub fn clear(&self) {
		let mut slots = self.slots.lock();
		debug!("dropping {} mapping tables", slots.len());
		slots.clear();
	}

	/// Reads the mappings of the source, switched to the given source namespace.
	///
	/// The table is keyed by the content of the source, so the same file at another path shares the table.
	pub fn get_or_read(&self, source: &MappingSource, source_namespace: &str) -> Result<Arc<Mappings>> {
		let key = MappingsKey::new(source)
			.step(format!("switch to {source_namespace}"))
			.to_string();

		self.get_or_create(&key, || {
			source.read()?
				.switch_source(source_namespace)
		})
	}
}
