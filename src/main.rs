use std::path::{Path, PathBuf};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};
use loom_mappings::field_names::StitchFieldNameSuggester;
use loom_mappings::java::JavaLauncher;
use loom_mappings::provider::{GameDistribution, MappingsProvider, ProviderConfig};
use loom_mappings::service::MappingsService;
use tinymap::tree::mappings::Mappings;

fn main() -> Result<()> {
	let Cli { verbose, command } = Cli::parse();

	setup_logging(if verbose { LevelFilter::Trace } else { LevelFilter::Info })?;

	match command {
		Command::Setup {
			mappings_jar,
			name,
			mappings_version,
			classifier,
			game_version,
			merged_jar,
			intermediary,
			cache_root,
			stitch,
			refresh,
		} => {
			let config = ProviderConfig {
				mappings_jar,
				name,
				version: mappings_version,
				classifier,
				game_version,
				game: match merged_jar {
					Some(jar) => GameDistribution::Merged { jar },
					None => GameDistribution::Split,
				},
				intermediary,
				cache_root,
				refresh,
			};

			let service = MappingsService::new();
			let suggester = StitchFieldNameSuggester::new(JavaLauncher::locate(), stitch);
			let provider = MappingsProvider::setup(&config, &service, &suggester)?;

			println!("{}", provider.tiny_mappings().display());
			println!("{}", provider.tiny_mappings_jar().display());
			if let Some(unpick) = provider.unpick_definitions() {
				println!("{}", unpick.display());
			}
		},
		Command::Merge { a, b, output, format } => {
			let a = read(&a)?;
			let b = read(&b)?;

			let (merged, conflicts) = Mappings::merge_with_conflicts(&a, &b)?;
			info!("merged with {} conflicts", conflicts.len());

			write(&merged, &output, format)?;
		},
		Command::Reorder { input, namespaces, output, format } => {
			let namespaces: Vec<&str> = namespaces.iter().map(String::as_str).collect();
			let mappings = read(&input)?.reorder(&namespaces)?;

			write(&mappings, &output, format)?;
		},
		Command::Switch { input, namespace, output, format } => {
			let mappings = read(&input)?.switch_source(&namespace)?;

			write(&mappings, &output, format)?;
		},
		Command::Detect { input } => {
			let format = tinymap::format::detect_file(&input)?;
			let mappings = read(&input)?;
			let count = mappings.count();

			println!("{format:?} {:?}", mappings.info.namespaces.names());
			println!("{} classes, {} fields, {} methods, {} parameters", count.classes, count.fields, count.methods, count.parameters);
		},
	}

	Ok(())
}

fn setup_logging(level: LevelFilter) -> Result<()> {
	fern::Dispatch::new()
		.format(|out, message, record| {
			out.finish(format_args!("[{} {}] {message}", record.level(), record.target()))
		})
		.level(level)
		.chain(std::io::stderr())
		.apply()
		.context("failed to set up logging")
}

fn read(path: &Path) -> Result<Mappings> {
	tinymap::format::read_file(path)
		.with_context(|| anyhow!("failed to read mappings from {path:?}"))
}

fn write(mappings: &Mappings, path: &Path, format: OutputFormat) -> Result<()> {
	let result = match format {
		OutputFormat::V1 => tinymap::tiny_v1::write_file(mappings, path),
		OutputFormat::V2 => tinymap::tiny_v2::write_file(mappings, path),
	};
	result.with_context(|| anyhow!("failed to write mappings to {path:?}"))
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
	V1,
	#[default]
	V2,
}

#[derive(Debug, Parser)]
#[command(version, about = "Prepares mappings for remapping the game")]
struct Cli {
	/// Be verbose.
	#[arg(short = 'v', long = "verbose")]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Sets up the working directory of a mappings jar, printing the paths of the files created
	Setup {
		/// The mappings jar, with the mappings at `mappings/mappings.tiny`
		#[arg(long)]
		mappings_jar: PathBuf,
		/// The name of the mappings artifact, like `net.fabricmc.yarn`
		#[arg(long)]
		name: String,
		#[arg(long)]
		mappings_version: String,
		#[arg(long)]
		classifier: Option<String>,
		#[arg(long)]
		game_version: String,
		/// The merged game jar. Leave out for games with separate client and server jars
		#[arg(long)]
		merged_jar: Option<PathBuf>,
		/// The intermediary mappings
		#[arg(long)]
		intermediary: PathBuf,
		#[arg(long, default_value = ".cache/mappings")]
		cache_root: PathBuf,
		/// The classpath for proposing field names, needed for legacy mappings
		#[arg(long, value_delimiter = ',')]
		stitch: Vec<PathBuf>,
		/// Rebuild everything, even if it exists already
		#[arg(long)]
		refresh: bool,
	},
	/// Merges two mapping files sharing exactly one namespace, the first one wins on conflicts
	Merge {
		a: PathBuf,
		b: PathBuf,
		#[arg(short, long)]
		output: PathBuf,
		#[arg(long, value_enum, default_value_t)]
		format: OutputFormat,
	},
	/// Changes the order of the namespaces, dropping the ones not given
	Reorder {
		input: PathBuf,
		#[arg(long, value_delimiter = ',', required = true)]
		namespaces: Vec<String>,
		#[arg(short, long)]
		output: PathBuf,
		#[arg(long, value_enum, default_value_t)]
		format: OutputFormat,
	},
	/// Makes another namespace the source namespace
	Switch {
		input: PathBuf,
		namespace: String,
		#[arg(short, long)]
		output: PathBuf,
		#[arg(long, value_enum, default_value_t)]
		format: OutputFormat,
	},
	/// Prints the format and the namespaces of a mapping file
	Detect {
		input: PathBuf,
	},
}
