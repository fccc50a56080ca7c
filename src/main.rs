//! SIMPL-2021 compiler CLI.
//!
//! `simplc <source-file>`: compiles a SIMPL program to Jasmin assembly and
//! invokes the external assembler named by `JASMIN_JAR` (spec §6). Exits 0
//! on success, nonzero otherwise, with the failing diagnostic on stderr.

use clap::Parser as ClapParser;
use simplc::assembler::JasminAssembler;
use simplc::{compile_file, Config};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "simplc")]
#[command(about = "SIMPL-2021 compiler - emits Jasmin assembly for the JVM", long_about = None)]
struct Cli {
    /// Input SIMPL source file
    input: PathBuf,

    /// Directory to write the generated .j/.class files into (defaults to
    /// the source file's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Enable verbose tracing of compiler phases
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("simplc=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("simplc=warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let source_name = cli.input.display().to_string();
    let out_dir = cli
        .output_dir
        .clone()
        .or_else(|| cli.input.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    let config = Config::from_env();

    let assembler = match JasminAssembler::from_config(&config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}", e.render(&source_name));
            process::exit(1);
        }
    };

    match compile_file(&cli.input, &out_dir, &config, &assembler) {
        Ok(path) => {
            println!("{} -> {}", cli.input.display(), path.display());
        }
        Err(e) => {
            eprintln!("{}", e.render(&source_name));
            process::exit(1);
        }
    }
}
