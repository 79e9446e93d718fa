use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use crts::export::header::ObjectKind;
use crts::{CrtsFile, ExportOptions, ExportStatus, Scene};
use itertools::Itertools;
use memmap2::MmapOptions;
use rootcause::prelude::*;
use tracing::Level;

/// Convert scene descriptions to CRTS files and inspect the result
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[clap(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a JSON scene description to a CRTS file
    Export {
        /// Scene description (.json)
        scene: PathBuf,

        /// Output file. Defaults to the scene path with a `.crts` extension
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Indent the JSON header
        #[clap(long)]
        pretty: bool,
    },
    /// Print a summary of a CRTS file
    Inspect {
        /// .crts file
        file: PathBuf,
    },
}

fn export(scene_path: PathBuf, output: Option<PathBuf>, pretty: bool) -> Result<ExitCode, Report> {
    let scene = Scene::from_json_file(&scene_path)?;
    let output = output.unwrap_or_else(|| scene_path.with_extension("crts"));
    let options = ExportOptions::builder().pretty_header(pretty).build();

    let status = crts::export_to_path(&scene, &output, &options).context("Failed to export scene")?;
    println!("{status}");

    Ok(match status {
        ExportStatus::Finished => ExitCode::SUCCESS,
        ExportStatus::Cancelled => ExitCode::from(2),
    })
}

fn inspect(path: PathBuf) -> Result<ExitCode, Report> {
    let input_file = File::open(&path).context("Failed to open CRTS file")?;
    let mmap = unsafe { MmapOptions::new().map(&input_file)? };
    let file = CrtsFile::parse(&mmap).context("Failed to parse CRTS file")?;
    let header = &file.header;

    println!("{}: {} payload bytes", path.display(), file.payload.len());
    if !file.views_tile_payload() {
        println!("warning: buffer views do not tile the payload");
    }

    println!("buffer views ({}):", header.buffer_views.len());
    for (i, view) in header.buffer_views.iter().enumerate() {
        println!(
            "  [{i}] {:?} offset={} length={}",
            view.view_type, view.byte_offset, view.byte_length
        );
    }

    println!("meshes ({}):", header.meshes.len());
    for (i, record) in header.meshes.iter().enumerate() {
        let mesh = file.mesh(i).context("Failed to decode mesh")?;
        println!(
            "  [{i}] {} vertices={} triangles={} uvs={}",
            record.name,
            mesh.positions.len(),
            mesh.indices.len() / 3,
            mesh.uvs.is_some()
        );
    }

    println!(
        "materials ({}): {}",
        header.materials.len(),
        header.materials.iter().map(|m| &m.name).join(", ")
    );

    println!("images ({}):", header.images.len());
    for image in &header.images {
        println!(
            "  {} {} {:?} view={}",
            image.name, image.format, image.color_space, image.view
        );
    }

    println!("objects ({}):", header.objects.len());
    for object in &header.objects {
        let detail = match &object.kind {
            ObjectKind::Mesh { material, mesh } => format!("MESH mesh={mesh} material={material}"),
            ObjectKind::Light { color, energy, size } => {
                format!("LIGHT color={color:?} energy={energy} size={size:?}")
            }
            ObjectKind::Camera { fov_y } => format!("CAMERA fov_y={fov_y}"),
        };
        println!("  {} {detail}", object.name);
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let result = match args.command {
        Command::Export {
            scene,
            output,
            pretty,
        } => export(scene, output, pretty),
        Command::Inspect { file } => inspect(file),
    };

    match result {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report}");
            ExitCode::FAILURE
        }
    }
}
