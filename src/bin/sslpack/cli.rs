//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// sslpack - configure, build and package OpenSSL for many platforms
#[derive(Parser)]
#[command(name = "sslpack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (streams every tool's output)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the resolved build plan as JSON
    Plan(PlanArgs),

    /// Configure, build and package the library
    Build(BuildArgs),

    /// Package an already built source tree
    Package(PackageArgs),

    /// Show link libraries, known options or supported targets
    Info(InfoArgs),

    /// Download, verify and extract the source archive
    Fetch(FetchArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Settings, options and dependencies describing one build.
#[derive(Args, Clone, Default)]
pub struct PlatformArgs {
    /// Build profile (TOML); flags below override its values
    #[arg(long, env = "SSLPACK_PROFILE")]
    pub profile: Option<PathBuf>,

    /// Target operating system (Linux, Windows, Macos, iOS, ...)
    #[arg(long)]
    pub os: Option<String>,

    /// Target architecture (x86, x86_64, armv7, armv8, ...)
    #[arg(long)]
    pub arch: Option<String>,

    /// Compiler (gcc, clang, apple-clang, msvc, sun-cc)
    #[arg(long)]
    pub compiler: Option<String>,

    #[arg(long)]
    pub compiler_version: Option<String>,

    /// MSVC runtime (MD, MT, MDd, MTd)
    #[arg(long)]
    pub runtime: Option<String>,

    /// Debug or Release
    #[arg(long)]
    pub build_type: Option<String>,

    /// MSVC platform toolset (e.g. v140_xp)
    #[arg(long)]
    pub toolset: Option<String>,

    /// OS of the build machine (defaults to the current host)
    #[arg(long)]
    pub host: Option<String>,

    /// Cross-compilation SDK sysroot (iOS, Android)
    #[arg(long, requires = "sdk_cc")]
    pub sdk_sysroot: Option<PathBuf>,

    /// C compiler driver of the cross-compilation SDK
    #[arg(long, requires = "sdk_sysroot")]
    pub sdk_cc: Option<PathBuf>,

    /// Build option, e.g. `-o shared=True` (repeatable)
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<String>,

    /// zlib include directory
    #[arg(long)]
    pub zlib_include: Option<PathBuf>,

    /// zlib library directory
    #[arg(long)]
    pub zlib_lib: Option<PathBuf>,

    /// zlib library name
    #[arg(long, default_value = "z")]
    pub zlib_name: String,
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Library source tree the plan runs in
    #[arg(long, default_value = "openssl-1.0.2p")]
    pub source: PathBuf,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Existing source tree; fetched and extracted when omitted
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Source archive (URL or file) used when `--source` is omitted
    #[arg(long)]
    pub archive: Option<String>,

    /// Directory the archive is extracted into
    #[arg(long, default_value = ".")]
    pub build_dir: PathBuf,

    /// Package destination
    #[arg(long, default_value = "package")]
    pub dest: PathBuf,

    /// Stream the output of every build tool
    #[arg(long)]
    pub show_output: bool,

    /// Do not check for perl, make, nmake, ... before building
    #[arg(long)]
    pub skip_tool_check: bool,
}

#[derive(Args)]
pub struct PackageArgs {
    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Built source tree
    #[arg(long, default_value = "openssl-1.0.2p")]
    pub source: PathBuf,

    /// Package destination
    #[arg(long, default_value = "package")]
    pub dest: PathBuf,
}

#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub platform: PlatformArgs,

    /// List the known build options
    #[arg(long = "options")]
    pub list_options: bool,

    /// List supported os/arch/compiler combinations and their targets
    #[arg(long, conflicts_with = "list_options")]
    pub targets: bool,
}

#[derive(Args)]
pub struct FetchArgs {
    /// Archive URL or local file (defaults to the OpenSSL release)
    #[arg(long)]
    pub archive: Option<String>,

    /// Directory to extract into
    #[arg(long, default_value = ".")]
    pub dest: PathBuf,

    /// Archive cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
