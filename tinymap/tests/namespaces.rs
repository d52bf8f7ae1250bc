use anyhow::Result;
use pretty_assertions::assert_eq;
use tinymap::error::NamespaceNotFoundError;

#[test]
fn switch_and_back() -> Result<()> {
	let input = include_str!("merged.tiny");
	let mappings = tinymap::tiny_v2::read(input.as_bytes())?;

	for namespace in ["official", "named"] {
		let there_and_back = mappings.switch_source(namespace)?
			.switch_source("intermediary")?;

		assert_eq!(there_and_back, mappings, "switching to {namespace:?}");
		assert_eq!(tinymap::tiny_v2::write_string(&there_and_back)?, input, "switching to {namespace:?}");
	}
	Ok(())
}

#[test]
fn switch_and_back_with_missing_names() -> Result<()> {
	let input = "\
tiny	2	0	official	named
c	a	Main
	f	La;	b	
c	b	
	m	(La;)Lb;	c	run
";
	let mappings = tinymap::tiny_v2::read(input.as_bytes())?;

	let switched = mappings.switch_source("named")?;
	assert_eq!(tinymap::tiny_v2::write_string(&switched)?, "\
tiny	2	0	named	official
c	Main	a
	f	LMain;		b
c		b
	m	(LMain;)Lb;	run	c
");

	let back = switched.switch_source("official")?;
	assert_eq!(back, mappings);
	assert_eq!(tinymap::tiny_v2::write_string(&back)?, input);
	Ok(())
}

#[test]
fn switch_remaps_descriptors() -> Result<()> {
	let mappings = tinymap::tiny_v2::read(include_str!("merged.tiny").as_bytes())?
		.switch_source("named")?;

	mappings.info.namespaces.check_that(&["named", "official", "intermediary"])?;

	let main = &mappings.classes["net/minecraft/Main"];
	assert!(main.get_field("helper", "Lnet/minecraft/Helper;").is_some());
	assert!(main.get_method("run", "(Lnet/minecraft/Main;)V").is_some());
	Ok(())
}

#[test]
fn reorder_twice() -> Result<()> {
	let mappings = tinymap::tiny_v2::read(include_str!("merged.tiny").as_bytes())?;

	let order = ["named", "intermediary"];
	let once = mappings.reorder(&order)?;
	let twice = once.reorder(&order)?;
	assert_eq!(once, twice);

	assert_eq!(mappings.reorder(&["intermediary", "official", "named"])?, mappings);
	Ok(())
}

#[test]
fn reorder_unknown() -> Result<()> {
	let mappings = tinymap::tiny_v2::read(include_str!("merged.tiny").as_bytes())?;

	let error = mappings.reorder(&["named", "srg"]).unwrap_err();
	let error = error.downcast_ref::<NamespaceNotFoundError>().unwrap();
	assert_eq!(error.namespace, "srg");
	assert_eq!(error.available, ["intermediary", "official", "named"]);
	Ok(())
}

#[test]
fn rename() -> Result<()> {
	let mappings = tinymap::tiny_v2::read(include_str!("merged.tiny").as_bytes())?;

	let same = mappings.clone().rename_namespaces(&[])?;
	assert_eq!(same, mappings);

	let identity = [("intermediary", "intermediary"), ("official", "official"), ("named", "named")];
	assert_eq!(mappings.clone().rename_namespaces(&identity)?, mappings);

	let renamed = mappings.clone().rename_namespaces(&[("named", "yarn")])?;
	renamed.info.namespaces.check_that(&["intermediary", "official", "yarn"])?;
	assert_eq!(renamed.classes, mappings.classes);

	assert!(mappings.clone().rename_namespaces(&[("named", "official")]).is_err());
	Ok(())
}

#[test]
fn complete_from_fallback() -> Result<()> {
	let input = "\
tiny	2	0	intermediary	official	named
c	class_1	a	Main
c	class_2	b	
	f	I	field_1	a	
	m	()V	method_1	b	run
";
	let expected = "\
tiny	2	0	intermediary	official	named
c	class_1	a	Main
c	class_2	b	class_2
	f	I	field_1	a	field_1
	m	()V	method_1	b	run
";

	let mut mappings = tinymap::tiny_v2::read(input.as_bytes())?;
	let filled = mappings.complete_namespace("named", "intermediary")?;

	assert_eq!(filled, 2);
	assert_eq!(tinymap::tiny_v2::write_string(&mappings)?, expected);
	Ok(())
}
