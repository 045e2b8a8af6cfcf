use clap::{
    Args, Parser, Subcommand,
    builder::{Styles, styling::AnsiColor},
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None, styles = get_styles())]
pub struct Cli {
    /// Turn debugging information on
    #[arg(short, long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub subcommand: CliSubcommand,
}

#[derive(Subcommand)]
pub enum CliSubcommand {
    /// Download a Figma document and freeze it into a snapshot file
    Fetch(CommandFetchArgs),

    /// Generate the QML source tree from a snapshot or straight from Figma
    Generate(CommandGenerateArgs),

    /// Show canvases and elements of a snapshot
    Show(CommandShowArgs),
}

#[derive(Args, Debug)]
pub struct CommandFetchArgs {
    /// Figma project (file) key
    #[arg(long)]
    pub project: String,

    /// Personal access token; falls back to FIGMA_TOKEN in the environment
    #[arg(long)]
    pub token: Option<String>,

    /// Snapshot file to write
    #[arg(short, long, default_value = "design.fqs")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct CommandGenerateArgs {
    /// Snapshot file to read instead of contacting Figma
    #[arg(short, long)]
    pub snapshot: Option<PathBuf>,

    /// Figma project (file) key, for online generation
    #[arg(long)]
    pub project: Option<String>,

    /// Personal access token; falls back to FIGMA_TOKEN in the environment
    #[arg(long)]
    pub token: Option<String>,

    /// Output directory for the generated QML tree
    #[arg(short, long, default_value = "qml")]
    pub out: PathBuf,

    /// QML imports, ';' separated list of `<module-name> <version>` pairs
    #[arg(long)]
    pub imports: Option<String>,

    /// Longest image dimension kept when downscaling
    #[arg(long, default_value_t = 1024)]
    pub image_dimension_max: u32,

    /// Replace all shapes with server-side renderings
    #[arg(long)]
    pub prerender_shapes: bool,

    /// Replace all groups with server-side renderings
    #[arg(long)]
    pub prerender_groups: bool,

    /// Replace all components with server-side renderings
    #[arg(long)]
    pub prerender_components: bool,

    /// Replace all frames with server-side renderings
    #[arg(long)]
    pub prerender_frames: bool,

    /// Replace all instances with server-side renderings
    #[arg(long)]
    pub prerender_instances: bool,

    /// Decompose boolean operations into mask compositions
    #[arg(long)]
    pub break_booleans: bool,

    /// Add the antialiasing hint to every emitted Shape
    #[arg(long)]
    pub antialize_shapes: bool,

    /// Inline image bytes into the sources instead of writing files
    #[arg(long)]
    pub embed_images: bool,

    /// Constrained-target output (no effects, no object names)
    #[arg(long)]
    pub qul: bool,
}

#[derive(Args, Debug)]
pub struct CommandShowArgs {
    /// Snapshot file to inspect
    pub snapshot: PathBuf,
}

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default())
}
