//! gridfill CLI
//!
//! Usage:
//!   gridfill compile <TEMPLATE>
//!   gridfill generate <TEMPLATE> <REPORT> [--history FILE] [--config FILE] [--output FILE]
//!   gridfill codes

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gridfill::{compile, Engine, EngineConfig, FieldRegistry, History, MemoryStore, Report, Template};

#[derive(Parser)]
#[command(name = "gridfill")]
#[command(about = "Fill grid templates with report data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a template and print its field map
    Compile {
        /// Template file (TOML)
        template: PathBuf,

        /// Print the entry-form fields instead of the full field map
        #[arg(long)]
        form: bool,
    },

    /// Fill a template with a report
    Generate {
        /// Template file (TOML)
        template: PathBuf,

        /// Report file (TOML)
        report: PathBuf,

        /// Approved reports used by reference fields (TOML)
        #[arg(long)]
        history: Option<PathBuf>,

        /// Engine configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the filled grid here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the field-code reference
    Codes,
}

fn main() {
    // Diagnostics reach the user as warn-level events on stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Compile { template, form } => run_compile(&template, form),
        Command::Generate {
            template,
            report,
            history,
            config,
            output,
        } => run_generate(&template, &report, history.as_deref(), config.as_deref(), output.as_deref()),
        Command::Codes => print!("{}", FieldRegistry::standard().documentation()),
    }
}

fn run_compile(path: &Path, form: bool) {
    let template = load_template(path);
    let compilation = compile(&template, FieldRegistry::standard());

    if form {
        for field in compilation.field_map.form_fields() {
            println!(
                "{}\t{}\t{:?}\trequired={}\tdefault={}\thint={}",
                field.location,
                field.name,
                field.field_type,
                field.required,
                field.default_value.as_deref().unwrap_or(""),
                field.placeholder.as_deref().unwrap_or("")
            );
        }
        return;
    }

    match compilation.field_map.to_toml() {
        Ok(text) => print!("{}", text),
        Err(e) => fail(format!("Error serializing field map: {}", e)),
    }
}

fn run_generate(
    template_path: &Path,
    report_path: &Path,
    history_path: Option<&Path>,
    config_path: Option<&Path>,
    output: Option<&Path>,
) {
    let config = match config_path {
        Some(path) => EngineConfig::from_file(path)
            .unwrap_or_else(|e| fail(format!("Error loading config '{}': {}", path.display(), e))),
        None => EngineConfig::default(),
    };

    let template = load_template(template_path);
    let report = Report::from_file(report_path)
        .unwrap_or_else(|e| fail(format!("Error loading report '{}': {}", report_path.display(), e)));
    let history = match history_path {
        Some(path) => History::from_file(path)
            .unwrap_or_else(|e| fail(format!("Error loading history '{}': {}", path.display(), e))),
        None => History::default(),
    };

    let template_id = template.id.clone();
    let report_id = report.id.clone();
    let store = MemoryStore::new()
        .with_reports(history.reports)
        .with_report(report)
        .with_template(template);

    let mut engine = Engine::with_config(store, config);
    let generated = engine
        .generate(&template_id, &report_id)
        .unwrap_or_else(|e| fail(format!("Error: {}", e)));

    let grid = generated
        .grid
        .to_toml()
        .unwrap_or_else(|e| fail(format!("Error serializing filled grid: {}", e)));

    match output {
        Some(path) => {
            write_file(path, grid.as_bytes());
            if let Some(artifact) = generated.artifact.filter(|a| a.extension != "toml") {
                write_file(&path.with_extension(&artifact.extension), &artifact.bytes);
            }
        }
        None => print!("{}", grid),
    }
}

fn load_template(path: &Path) -> Template {
    Template::from_file(path)
        .unwrap_or_else(|e| fail(format!("Error loading template '{}': {}", path.display(), e)))
}

fn write_file(path: &Path, bytes: &[u8]) {
    if let Err(e) = fs::write(path, bytes) {
        fail(format!("Error writing '{}': {}", path.display(), e));
    }
}

fn fail(message: String) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}
