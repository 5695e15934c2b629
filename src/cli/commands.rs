use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Offline-first project type detection and Android package builds
#[derive(Parser, Debug)]
#[command(
    name = "apkforge",
    about = "Detects a project's technology and builds a signed Android package with offline toolchains",
    version
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Verbose output")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Detect the project type of a directory")]
    Detect(DetectArgs),

    #[command(about = "Build a signed package from a project directory")]
    Build(BuildArgs),

    #[command(about = "Verify the offline toolchain environment")]
    Doctor(DoctorArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct DetectArgs {
    #[arg(
        value_name = "PATH",
        help = "Project directory (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(long, help = "Emit the classification as JSON")]
    pub json: bool,

    #[arg(long, help = "Show every matching detector, not just the winner")]
    pub all: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(
        value_name = "PATH",
        help = "Project directory (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(long, value_name = "DIR", env = "APKFORGE_TOOLCHAINS", help = "Toolchain base directory")]
    pub toolchains: PathBuf,

    #[arg(long, help = "Application display name (defaults to the directory name)")]
    pub app_name: Option<String>,

    #[arg(long, help = "Reverse-domain package identifier")]
    pub package_name: Option<String>,

    #[arg(long, default_value = "1.0.0", help = "Version name")]
    pub version_name: String,

    #[arg(long, default_value_t = 1, help = "Version code")]
    pub version_code: u32,

    #[arg(long, help = "Build and sign a release package")]
    pub release: bool,

    #[arg(long, value_name = "FILE", help = "Release keystore path")]
    pub keystore: Option<PathBuf>,

    #[arg(long, value_name = "PASS", help = "Release keystore password")]
    pub store_pass: Option<String>,

    #[arg(long, value_name = "PASS", help = "Release key password")]
    pub key_pass: Option<String>,

    #[arg(long, value_name = "ALIAS", help = "Release key alias")]
    pub key_alias: Option<String>,

    #[arg(long, value_name = "FILE", help = "Launcher icon source image")]
    pub icon: Option<PathBuf>,

    #[arg(long = "permission", value_name = "NAME", help = "Extra permission (repeatable)")]
    pub permissions: Vec<String>,

    #[arg(long, help = "Enable code shrinking for release builds")]
    pub shrink: bool,

    #[arg(long, value_name = "DIR", help = "Output directory (defaults to <project>/dist)")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct DoctorArgs {
    #[arg(long, value_name = "DIR", env = "APKFORGE_TOOLCHAINS", help = "Toolchain base directory")]
    pub toolchains: PathBuf,

    #[arg(long, help = "Emit the report as JSON")]
    pub json: bool,
}
