//! CLI entry point for twilight_packc.
//! Usage: `cargo run -p twilight_packc -- compile packs-src/act-one --out packs/act-one.pack`

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use twilight_data::{ContentValidationError, pack_file};
use twilight_packc::{CompileError, PackCompiler};

#[derive(Parser)]
#[command(author, version, about = "Compile and inspect Twilight Marches content packs.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a pack source directory into a `.pack` file.
    Compile(CompileArgs),
    /// Check a pack source directory without writing anything.
    Validate(ValidateArgs),
    /// Show the header and contents summary of a compiled `.pack` file.
    Info(InfoArgs),
}

#[derive(Args)]
struct CompileArgs {
    /// Directory holding `manifest.json` and the content files.
    #[arg(value_name = "DIR")]
    source: PathBuf,
    /// Output file (defaults to `<DIR>.pack` beside the source directory).
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct ValidateArgs {
    /// Directory holding `manifest.json` and the content files.
    #[arg(value_name = "DIR")]
    source: PathBuf,
    /// Treat warnings (dangling references, possible cycles) as failures.
    #[arg(long)]
    strict: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Compiled pack file.
    #[arg(value_name = "FILE")]
    pack: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile(args) => compile(&args),
        Commands::Validate(args) => validate(&args),
        Commands::Info(args) => info(&args.pack),
    }
}

fn compile(args: &CompileArgs) -> Result<()> {
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| args.source.with_extension(pack_file::PACK_EXTENSION));

    let result = match PackCompiler::new().compile(&args.source, &out) {
        Ok(result) => result,
        Err(CompileError::ValidationFailed(errors)) => {
            report("error", &errors);
            eprintln!("compile: {} error(s), nothing written", errors.len());
            process::exit(1);
        },
        Err(err) => return Err(err).with_context(|| format!("compiling '{}'", args.source.display())),
    };

    report("warning", &result.warnings);
    println!(
        "Compiled {} v{} -> {}",
        result.pack_id,
        result.version,
        result.output_path.display()
    );
    println!("  {}", result.counts);
    println!(
        "  {} bytes in, {} bytes out (ratio {:.2}) in {:.1?}",
        result.input_bytes,
        result.output_bytes,
        result.compression_ratio(),
        result.elapsed
    );
    Ok(())
}

fn validate(args: &ValidateArgs) -> Result<()> {
    let result = PackCompiler::new()
        .validate(&args.source)
        .with_context(|| format!("validating '{}'", args.source.display()))?;

    report("error", &result.errors);
    report("warning", &result.warnings);
    println!("{}: {}", result.pack_id, result.counts);

    if !result.is_valid() {
        bail!("{} error(s), {} warning(s)", result.errors.len(), result.warnings.len());
    }
    if args.strict && !result.warnings.is_empty() {
        bail!("{} warning(s) with --strict", result.warnings.len());
    }
    println!("validate: OK");
    Ok(())
}

fn info(path: &Path) -> Result<()> {
    let info = pack_file::get_file_info(path).with_context(|| format!("reading '{}'", path.display()))?;
    let content = pack_file::load(path).with_context(|| format!("decoding '{}'", path.display()))?;
    let manifest = &content.manifest;

    println!("{} v{} ({:?})", manifest.id, manifest.version, manifest.pack_type);
    println!("  core: {}", manifest.core_requirement());
    for dependency in &manifest.dependencies {
        let optional = if dependency.is_optional { " (optional)" } else { "" };
        println!("  depends on {} {}{optional}", dependency.pack_id, dependency.requirement());
    }
    println!(
        "  format v{}, header {} bytes, {} bytes on disk",
        info.version, info.header_len, info.file_size
    );
    println!(
        "  payload {} -> {} bytes (ratio {:.2})",
        info.original_size,
        info.compressed_size,
        info.compression_ratio()
    );
    if let Some(checksum) = &info.checksum {
        println!("  sha256 {checksum}");
    }
    println!("  {}", content.counts());
    Ok(())
}

fn report(label: &str, entries: &[ContentValidationError]) {
    for entry in entries {
        eprintln!("{label}: {entry}");
    }
}
