use autocrop::catalog::{self, CatalogOptions};
use autocrop::config::{self, CropConfig};
use autocrop::formatting::FormattingTable;
use autocrop::imaging::Border;
use autocrop::{output, process};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "autocrop")]
#[command(about = "Trim sprite images to their visible content and export coordinates")]
#[command(long_about = "\
Trim sprite images to their visible content and export coordinates

Every image under the input directory is cropped to the box around its
non-transparent pixels and written to the same relative path under the
output directory. Each output directory gets a coordinates file with one
line per image, formatted by the first matching rule of the formatting
table.

  sprites/                         output/
  ├── bg_menu.png          →       ├── coords.txt
  └── menu/                        ├── bg_menu.png
      ├── start_hover.png  →       └── menu/
      └── start_idle.png               ├── coords.txt
                                       ├── start_hover.png
                                       └── start_idle.png

With --group, images whose names share the first capture group of
--regex-group-by (start_hover.png, start_idle.png → \"start_\") are cropped
with one shared box so they keep the same size and alignment.

Formatting table (formatting.json, or .toml), first match wins:
  {\".*_hover\": \"    imagebutton:\\n        hover \\\"{path}\\\"\\n\", ...}
Placeholders: {name} {path} {x} {y} {bx} {by}

Set RUST_LOG=debug for detailed logs.")]
#[command(version = version_string())]
struct Cli {
    /// Input directory (a file means its directory)
    #[arg(short, long, default_value = ".")]
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = config::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Image extensions to include, with or without the leading dot
    #[arg(short, long, num_args = 1.., default_values = ["jpg", "png"])]
    extensions: Vec<String>,

    /// Crop grouped images with one shared bounding box
    #[arg(short, long)]
    group: bool,

    /// List images whose grouped crop is larger than their single crop, write nothing
    #[arg(short, long)]
    difference: bool,

    /// Match formatting rules against the full output path instead of the file name
    #[arg(short, long)]
    match_path: bool,

    /// Formatting table (JSON or TOML); built-in rules if missing
    #[arg(short, long, default_value = config::DEFAULT_FORMATTING_FILE)]
    formatting: PathBuf,

    /// Delete the output directory before running
    #[arg(long)]
    remove_output: bool,

    /// Name of the coordinates file written to each output directory
    #[arg(long, default_value = config::DEFAULT_MANIFEST_NAME)]
    output_file_name: String,

    /// Transparent padding added left and right, in pixels
    #[arg(long, default_value_t = 0)]
    border_width: u32,

    /// Transparent padding added top and bottom, in pixels
    #[arg(long, default_value_t = 0)]
    border_height: u32,

    /// Grouping regex; capture group 1 is the group key
    #[arg(long, default_value = config::DEFAULT_GROUP_PATTERN)]
    regex_group_by: String,

    /// Maximum parallel workers (default: all cores)
    #[arg(short, long)]
    jobs: Option<usize>,
}

impl Cli {
    fn into_config(self) -> CropConfig {
        CropConfig {
            input: config::resolve_input_dir(&self.input),
            output: self.output,
            extensions: config::normalize_extensions(&self.extensions),
            group: self.group,
            match_path: self.match_path,
            formatting: Some(self.formatting),
            manifest_name: self.output_file_name,
            border: Border::new(self.border_width, self.border_height),
            group_pattern: self.regex_group_by,
            max_processes: self.jobs,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("autocrop=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let difference = cli.difference;
    let remove_output = cli.remove_output;
    let config = cli.into_config();

    // Every config error surfaces before anything on disk changes
    config.validate()?;
    let table = FormattingTable::load(config.formatting.as_deref())?;
    let options = CatalogOptions::from_config(&config)?;

    if remove_output {
        remove_dir(&config.output)?;
    }
    init_thread_pool(config.max_processes);

    println!(
        "==> Cropping {} into {}",
        config.input.display(),
        config.output.display()
    );
    let catalog = catalog::scan(&config.input, &options)?;
    output::print_catalog(&catalog);

    if difference {
        println!("==> Comparing single and group crops");
        let report = process::difference(&catalog, &config);
        output::print_difference(&report);
        return Ok(());
    }

    println!("==> Cropping images");
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = process::process(&catalog, &table, &config, Some(tx));
    if printer.join().is_err() {
        warn!("Progress printer panicked");
    }
    let summary = result?;

    output::print_summary(&summary);
    info!(
        "Done: {} cropped, {} skipped",
        summary.processed.len(),
        summary.skipped.len()
    );
    Ok(())
}

/// Delete the output tree; a missing directory is not an error.
fn remove_dir(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {
            info!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Initialize the rayon thread pool.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(max_processes: Option<usize>) {
    let threads = config::effective_threads(max_processes);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
