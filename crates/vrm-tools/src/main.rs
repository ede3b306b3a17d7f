//! vrm-inspect - print what the VRM loader decodes from an avatar file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use vrm_core::{LoadError, MatrixLayout, MeshPackager, Skeleton};
use vrm_io::{AvatarReader, LoadOptions, ReadError};

#[derive(Parser)]
#[command(name = "vrm-inspect")]
#[command(about = "Inspect VRM / GLB avatar files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Input {
    /// Input .vrm or .glb file
    input: PathBuf,

    /// Do not read images referenced by relative URI
    #[arg(long)]
    no_external_images: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Container, asset and mesh summary
    Info {
        #[command(flatten)]
        input: Input,
    },

    /// Joint hierarchy of a skin
    Skeleton {
        #[command(flatten)]
        input: Input,

        /// Skin index (default: the only skin)
        #[arg(short, long)]
        skin: Option<usize>,
    },

    /// Morph targets and the expressions that drive them
    Morphs {
        #[command(flatten)]
        input: Input,

        /// Only this mesh (e.g. "Face")
        #[arg(short, long)]
        mesh: Option<String>,
    },

    /// Bind-pose skinning matrices
    Matrices {
        #[command(flatten)]
        input: Input,

        /// Skin index (default: the only skin)
        #[arg(short, long)]
        skin: Option<usize>,

        /// Print rows instead of the column-major upload order
        #[arg(long)]
        row_major: bool,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("{0} has no skin")]
    NoSkin(PathBuf),
}

type Result<T> = std::result::Result<T, CliError>;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Info { input } => info(&input),
        Commands::Skeleton { input, skin } => skeleton(&input, skin),
        Commands::Morphs { input, mesh } => morphs(&input, mesh.as_deref()),
        Commands::Matrices {
            input,
            skin,
            row_major,
        } => matrices(&input, skin, row_major),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn reader(input: &Input, options: LoadOptions) -> Result<AvatarReader> {
    let options = options.with_external_images(!input.no_external_images);
    Ok(AvatarReader::open(&input.input)?.with_options(options))
}

fn info(input: &Input) -> Result<()> {
    let reader = reader(input, LoadOptions::new())?;
    let container = reader.container()?;
    let meta = reader.read_meta()?;
    let doc = container.document();

    println!("File:       {}", input.input.display());
    println!("Format:     {} (GLB v{}, {} bytes)", meta.version.name(), container.version(), container.total_length());
    println!("Generator:  {}", meta.asset.generator.as_deref().unwrap_or("-"));
    if let Some(title) = &meta.title {
        println!("Title:      {}", title);
    }
    if !meta.authors.is_empty() {
        println!("Authors:    {}", meta.authors.join(", "));
    }
    if !meta.asset.extensions_used.is_empty() {
        println!("Extensions: {}", meta.asset.extensions_used.join(", "));
    }
    println!(
        "Chunks:     JSON {} bytes, BIN {}",
        container.json_chunk().len(),
        container
            .bin_chunk()
            .map_or_else(|| "absent".to_string(), |b| format!("{} bytes", b.len()))
    );
    println!("Skins:      {}", doc.skins.len());
    println!("Expressions: {}", meta.expressions.len());
    println!();

    let packager = MeshPackager::new(doc, container.bin_chunk()).load_external_images(false);
    for (mesh_index, mesh) in doc.meshes.iter().enumerate() {
        println!("Mesh {} {:?}", mesh_index, mesh.name.as_deref().unwrap_or(""));
        for package in packager.package_mesh(mesh_index)? {
            println!(
                "  primitive {}: {} vertices, {} triangles, {} morphs{}",
                package.primitive_index,
                package.vertex_count(),
                package.index_count() / 3,
                package.morph_targets.len(),
                if package.is_skinned() { ", skinned" } else { "" }
            );
        }
    }
    Ok(())
}

fn load_skeleton(input: &Input, skin: Option<usize>) -> Result<(Skeleton, vrm_io::Avatar)> {
    let mut options = LoadOptions::new();
    options.skin = skin;
    let mut avatar = reader(input, options)?.read_avatar()?;
    let skeleton = avatar
        .skeleton
        .take()
        .ok_or_else(|| CliError::NoSkin(input.input.clone()))?;
    Ok((skeleton, avatar))
}

fn skeleton(input: &Input, skin: Option<usize>) -> Result<()> {
    let (skeleton, _) = load_skeleton(input, skin)?;
    println!("Skin {}: {} joints", skeleton.skin_index(), skeleton.len());
    for root in skeleton.roots() {
        print_joint(&skeleton, root, 0);
    }
    Ok(())
}

fn print_joint(skeleton: &Skeleton, index: usize, depth: usize) {
    let Some(joint) = skeleton.joint(index) else {
        return;
    };
    let [x, y, z] = joint.global_transform.translation();
    println!(
        "{:indent$}[{}] {} (node {}) at ({:.3}, {:.3}, {:.3})",
        "",
        index,
        joint.name,
        joint.node_index,
        x,
        y,
        z,
        indent = depth * 2
    );
    for child in skeleton.children(index) {
        print_joint(skeleton, child, depth + 1);
    }
}

fn morphs(input: &Input, mesh: Option<&str>) -> Result<()> {
    let reader = reader(input, LoadOptions::new())?;
    let container = reader.container()?;
    let package = MeshPackager::new(container.document(), container.bin_chunk())
        .load_external_images(false)
        .find_morph_primitive(mesh)?;

    println!(
        "Mesh {} {:?} primitive {}: {} morph targets",
        package.mesh_index,
        package.mesh_name.as_deref().unwrap_or(""),
        package.primitive_index,
        package.morph_targets.len()
    );
    let mut names: Vec<&String> = package.morph_targets.keys().collect();
    names.sort();
    for name in names {
        println!("  {}", name);
    }

    let meta = reader.read_meta()?;
    if !meta.expressions.is_empty() {
        println!();
        println!("Expressions ({}):", meta.version.name());
        for expression in &meta.expressions {
            println!(
                "  {}{}: {} binds",
                expression.name,
                expression
                    .preset
                    .as_deref()
                    .map(|p| format!(" [{}]", p))
                    .unwrap_or_default(),
                expression.binds.len()
            );
        }
    }
    Ok(())
}

fn matrices(input: &Input, skin: Option<usize>, row_major: bool) -> Result<()> {
    let (skeleton, avatar) = load_skeleton(input, skin)?;
    let layout = if row_major {
        MatrixLayout::RowMajor
    } else {
        MatrixLayout::ColumnMajor
    };
    let Some(skinning) = &avatar.skinning else {
        return Err(CliError::NoSkin(input.input.clone()));
    };

    println!("{} matrices, {:?}", skinning.len(), layout);
    for (joint, matrix) in skeleton.joints().iter().zip(skinning) {
        let flat = layout.flatten(matrix);
        println!("{}:", joint.name);
        for line in flat.chunks_exact(4) {
            println!("  {:>9.4} {:>9.4} {:>9.4} {:>9.4}", line[0], line[1], line[2], line[3]);
        }
    }
    Ok(())
}
