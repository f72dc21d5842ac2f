//! Command line schema compiler: parses one or more schema files and writes a
//! generated Rust source file for each, mirroring the original compiler's
//! one-file-in-one-file-out model but narrowed to a single target language.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser as ClapParser;
use megrez::error::CliError;
use megrez::idl::Parser as SchemaParser;

/// Compiles `.mgz` schema files into generated Rust source.
#[derive(ClapParser, Debug)]
#[command(name = "megrezc", version, about)]
struct Cli {
    /// Emit Rust source. The only emitter today; kept as an explicit flag,
    /// plural-shaped, for when a second target language arrives.
    #[arg(short = 'r', long = "rust")]
    rust: bool,

    /// Directory generated `<inputbase>.mgz.rs` files are written to.
    #[arg(short = 'o', long = "out-dir", default_value = ".")]
    out_dir: PathBuf,

    /// Schema files to compile. Later files may reference earlier ones.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn strip_extension(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("schema")
}

fn compile_one(path: &Path, out_dir: &Path) -> Result<PathBuf, CliError> {
    let source = std::fs::read_to_string(path).map_err(|source| CliError::ReadSchema {
        path: path.display().to_string(),
        source,
    })?;
    let schema = SchemaParser::parse(&source)?;
    log::info!(
        "parsed {} structs / {} enums from {}",
        schema.structs.len(),
        schema.enums.len(),
        path.display()
    );
    let out_path = out_dir.join(format!("{}.mgz.rs", strip_extension(path)));
    megrez::codegen::write_rust_file(&schema, &out_path)?;
    Ok(out_path)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if !cli.rust {
        eprintln!("megrezc: no options: no output files generated. Specify -r/--rust.");
        return ExitCode::FAILURE;
    }

    for file in &cli.files {
        log::info!("compiling {}", file.display());
        match compile_one(file, &cli.out_dir) {
            Ok(out_path) => log::info!("wrote {}", out_path.display()),
            Err(err) => {
                log::error!("{}", err);
                eprintln!("megrezc: {}", err);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
