use std::fs::File;
use std::io::Write;
use anyhow::Result;
use pretty_assertions::assert_eq;
use tinymap::error::UnsupportedFormatError;
use tinymap::format::MappingFormat;
use tinymap::ident::ClassName;
use zip::write::FileOptions;
use zip::ZipWriter;

#[test]
fn v1_from_merged() -> Result<()> {
	let mappings = tinymap::tiny_v2::read(include_str!("merged.tiny").as_bytes())?;

	let expected = "\
v1	intermediary	official	named
CLASS	net/minecraft/class_1	a	net/minecraft/Main
CLASS	net/minecraft/class_2	b	net/minecraft/Helper
FIELD	net/minecraft/class_1	Lnet/minecraft/class_2;	field_1	a	helper
METHOD	net/minecraft/class_1	(Lnet/minecraft/class_1;)V	method_1	a	run
";
	let written = tinymap::tiny_v1::write_string(&mappings)?;
	assert_eq!(written, expected);

	// everything but the comment and the parameter survives
	let read = tinymap::tiny_v1::read(written.as_bytes())?;
	assert_eq!(read.count().classes, 2);
	assert_eq!(read.count().parameters, 0);
	assert_eq!(tinymap::tiny_v1::write_string(&read)?, expected);
	Ok(())
}

#[test]
fn v1_and_v2_agree() -> Result<()> {
	let v1 = tinymap::format::read(include_str!("merge_input_a.tiny").as_bytes())?;
	let v2 = tinymap::tiny_v2::read(tinymap::tiny_v2::write_string(&v1)?.as_bytes())?;
	assert_eq!(v1, v2);

	let v1_again = tinymap::tiny_v1::read(tinymap::tiny_v1::write_string(&v2)?.as_bytes())?;
	assert_eq!(v1_again, v1);
	Ok(())
}

#[test]
fn v1_members_before_classes() -> Result<()> {
	let input = "\
v1	official	named
# a comment
FIELD	a	I	b	count

METHOD	a	()V	c	run
CLASS	a	Main
FIELD	a	I	b	count
";
	let mappings = tinymap::tiny_v1::read(input.as_bytes())?;

	let class = &mappings.classes["a"];
	assert_eq!(class.info.names.names(), [Some(ClassName::from("a")), Some(ClassName::from("Main"))]);
	assert_eq!(class.fields.len(), 1);
	assert_eq!(class.methods.len(), 1);

	let conflicting = "v1\tofficial\tnamed\nCLASS\ta\tMain\nCLASS\ta\tOther\n";
	assert!(tinymap::tiny_v1::read(conflicting.as_bytes()).is_err());
	Ok(())
}

#[test]
fn v2_repeated_entries() -> Result<()> {
	let input = "\
tiny	2	0	official	intermediary	named
c	a	class_1	
	f	I	b	field_1	count
c	a		Main
	m	()V	c	method_1	
	m	()V	c		run
		p	1			self
";
	let mappings = tinymap::tiny_v2::read(input.as_bytes())?;

	assert_eq!(tinymap::tiny_v2::write_string(&mappings)?, "\
tiny	2	0	official	intermediary	named
c	a	class_1	Main
	f	I	b	field_1	count
	m	()V	c	method_1	run
		p	1			self
");
	Ok(())
}

#[test]
fn v2_repeated_comments() -> Result<()> {
	let input = "\
tiny	2	0	official	named
c	a	Main
	c	first line
	c	second line
	m	()V	b	run
		c	runs it
		c	twice
";
	let mappings = tinymap::tiny_v2::read(input.as_bytes())?;

	let class = &mappings.classes["a"];
	assert_eq!(class.javadoc.as_ref().map(|x| x.0.as_str()), Some("first line\nsecond line"));
	let method = class.get_method("b", "()V").unwrap();
	assert_eq!(method.javadoc.as_ref().map(|x| x.0.as_str()), Some("runs it\ntwice"));

	// written back as one escaped comment, which reads the same
	let written = tinymap::tiny_v2::write_string(&mappings)?;
	assert!(written.contains("\tc\tfirst line\\nsecond line\n"), "{written}");
	assert_eq!(tinymap::tiny_v2::read(written.as_bytes())?, mappings);
	Ok(())
}

#[test]
fn detect_files() -> Result<()> {
	let dir = tempfile::tempdir()?;

	let v1 = dir.path().join("v1.tiny");
	std::fs::write(&v1, include_str!("merge_input_a.tiny"))?;
	let v2 = dir.path().join("v2.tiny");
	std::fs::write(&v2, include_str!("merged.tiny"))?;

	assert_eq!(tinymap::format::detect_file(&v1)?, MappingFormat::TinyV1);
	assert_eq!(tinymap::format::detect_file(&v2)?, MappingFormat::TinyV2);

	let namespaces = tinymap::format::namespaces(File::open(&v2)?)?;
	namespaces.check_that(&["intermediary", "official", "named"])?;
	Ok(())
}

#[test]
fn zip_entry() -> Result<()> {
	let dir = tempfile::tempdir()?;
	let path = dir.path().join("mappings.jar");

	let mut zip = ZipWriter::new(File::create(&path)?);
	zip.start_file("mappings/mappings.tiny", FileOptions::<()>::default())?;
	zip.write_all(include_str!("merged.tiny").as_bytes())?;
	zip.finish()?;

	let from_zip = tinymap::format::read_zip_entry(&path, "mappings/mappings.tiny")?;
	let from_str = tinymap::tiny_v2::read(include_str!("merged.tiny").as_bytes())?;
	assert_eq!(from_zip, from_str);

	assert!(tinymap::format::read_zip_entry(&path, "mappings/missing.tiny").is_err());
	Ok(())
}

#[test]
fn unsupported_header_writes_nothing() -> Result<()> {
	let dir = tempfile::tempdir()?;
	let input = dir.path().join("input.tsrg");
	let output = dir.path().join("output.tiny");
	std::fs::write(&input, "tsrg2 left right\na b\n")?;

	let result = tinymap::format::read_file(&input)
		.and_then(|mappings| tinymap::tiny_v2::write_file(&mappings, &output));

	let error = result.unwrap_err();
	assert!(error.downcast_ref::<UnsupportedFormatError>().is_some(), "{error:?}");
	assert!(!output.exists());
	Ok(())
}
