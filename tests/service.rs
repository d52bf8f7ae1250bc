use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use anyhow::Result;
use pretty_assertions::assert_eq;
use loom_mappings::identity::MappingSource;
use loom_mappings::service::MappingsService;
use tinymap::tree::mappings::Mappings;

const MAPPINGS: &str = "tiny\t2\t0\tofficial\tintermediary\nc\ta\tnet/minecraft/class_1\n";

fn mappings() -> Result<Mappings> {
	tinymap::tiny_v2::read(MAPPINGS.as_bytes())
}

#[test]
fn concurrent_callers_share_one_build() -> Result<()> {
	let service = MappingsService::new();
	let calls = AtomicUsize::new(0);

	let results = thread::scope(|s| {
		let handles: Vec<_> = (0..8)
			.map(|_| s.spawn(|| {
				service.get_or_create("official|switch to intermediary|1.20.1", || {
					calls.fetch_add(1, Ordering::SeqCst);
					thread::sleep(Duration::from_millis(50));
					mappings()
				})
			}))
			.collect();

		handles.into_iter()
			.map(|handle| handle.join().unwrap())
			.collect::<Result<Vec<_>>>()
	})?;

	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert_eq!(results.len(), 8);
	for result in &results {
		assert!(Arc::ptr_eq(result, &results[0]));
	}
	assert_eq!(service.len(), 1);
	Ok(())
}

#[test]
fn other_keys_are_not_blocked() -> Result<()> {
	let service = MappingsService::new();
	// each factory waits for the other one, so they must run at the same time
	let barrier = Barrier::new(2);

	thread::scope(|s| {
		let a = s.spawn(|| service.get_or_create("a", || {
			barrier.wait();
			mappings()
		}));
		let b = s.spawn(|| service.get_or_create("b", || {
			barrier.wait();
			mappings()
		}));

		a.join().unwrap()?;
		b.join().unwrap()?;
		Ok::<(), anyhow::Error>(())
	})?;

	assert_eq!(service.len(), 2);
	Ok(())
}

#[test]
fn same_content_shares_the_table() -> Result<()> {
	let dir = tempfile::tempdir()?;
	let first = dir.path().join("first.tiny");
	let second = dir.path().join("second.tiny");
	std::fs::write(&first, MAPPINGS)?;
	std::fs::write(&second, MAPPINGS)?;

	let service = MappingsService::new();
	let a = service.get_or_read(&MappingSource::from_file(&first)?, "intermediary")?;
	let b = service.get_or_read(&MappingSource::from_file(&second)?, "intermediary")?;

	assert!(Arc::ptr_eq(&a, &b));
	a.info.namespaces.check_that(&["intermediary", "official"])?;

	let official = service.get_or_read(&MappingSource::from_file(&first)?, "official")?;
	assert!(!Arc::ptr_eq(&a, &official));
	assert_eq!(service.len(), 2);
	Ok(())
}
