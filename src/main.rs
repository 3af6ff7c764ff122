use anyhow::{Context, Result};
use bwres::archive::read_top_level;
use bwres::io::{read_archive_bytes, read_archive_file, write_archive_file};
use bwres::folder::default_pack_output;
use bwres::{pack_folder, unpack_to_folder, Archive, ResourceInfo};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bwres-tool", about = "Unpack and repack Battalion Wars resource archives")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract a .res or .res.gz archive into a folder of loose files.
    Unpack {
        input: PathBuf,
        /// Defaults to `<input>_Folder`.
        output: Option<PathBuf>,
    },
    /// Build an archive from a folder produced by `unpack`.
    Pack {
        folder: PathBuf,
        /// Defaults to the folder name without `_Folder`, or with the game's extension appended.
        output: Option<PathBuf>,
        /// Gzip the output regardless of its name.
        #[arg(long, conflicts_with = "no_gzip")]
        gzip: bool,
        /// Never gzip the output.
        #[arg(long)]
        no_gzip: bool,
    },
    /// Print the archive's sections and contents.
    Inspect { input: PathBuf },
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let cli = Cli::parse();

    match cli.command {
        Command::Unpack { input, output } => {
            let output = output.unwrap_or_else(|| suffixed(&input, "_Folder"));
            run_unpack(&input, &output)
        }
        Command::Pack { folder, output, gzip, no_gzip } => {
            let compress = match (gzip, no_gzip) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            run_pack(&folder, output, compress)
        }
        Command::Inspect { input } => run_inspect(&input),
    }
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

fn run_unpack(input: &Path, output: &Path) -> Result<()> {
    info!("Reading {:?}", input);
    let archive = read_archive_file(input)?;
    info!("Archive detected as {}", archive.variant);
    unpack_to_folder(&archive, output)
        .with_context(|| format!("Failed to unpack into {:?}", output))?;
    info!("Done!");
    Ok(())
}

fn run_pack(folder: &Path, output: Option<PathBuf>, compress: Option<bool>) -> Result<()> {
    let (output, compress) = match output {
        Some(o) => (o, compress),
        None => {
            let info = ResourceInfo::load(folder)?;
            let (o, default_compress) = default_pack_output(folder, &info);
            (o, Some(compress.unwrap_or(default_compress)))
        }
    };

    let archive = pack_folder(folder)?;
    info!("Writing to {:?}", output);
    write_archive_file(&output, &archive, compress)?;
    info!("Done!");
    Ok(())
}

fn run_inspect(input: &Path) -> Result<()> {
    let data = read_archive_bytes(input)?;

    println!("Archive: {}", input.display());
    println!("Size: {} bytes", data.len());
    println!("\nTop-level resources:");
    for (i, resource) in read_top_level(&data)?.iter().enumerate() {
        println!("  [{:>4}] {} ({} bytes)", i, resource.tag, resource.payload.len());
    }

    let archive = Archive::from_bytes(&data).context("Failed to decode archive")?;
    println!("\nGame: {}", archive.variant);
    println!("Level name: {}", archive.level_name);
    println!("Textures: {}", archive.textures.len());
    println!("Models: {}", archive.models.len());
    println!("Sounds: {}", archive.sounds.len() / 2);
    println!("Animations: {}", archive.animations.len());
    println!("Effects: {}", archive.effects.len());
    println!("Scripts: {}", archive.scripts.len());
    if !archive.unknown.is_empty() {
        println!("Unknown: {}", archive.unknown.len());
    }

    println!("\nTextures:");
    for texture in &archive.textures {
        match texture.dimensions() {
            Some((w, h)) => println!("  {:<32} {}x{} ({} bytes)", texture.name(), w, h, texture.data.len()),
            None => println!("  {:<32} ({} bytes)", texture.name(), texture.data.len()),
        }
    }

    println!("\nModels:");
    for model in &archive.models {
        let textures: Vec<String> = archive.textures_for_model(model).iter().map(|t| t.name()).collect();
        println!("  {:<32} {} bytes, textures: {}", model.name, model.data.len(), textures.join(", "));
    }

    Ok(())
}
