//! fsbuild - populate a filesystem tree from a line-oriented spec.
//!
//! Reads a spec describing directories, files, symlinks, and device
//! specials (the gen_init_cpio dialect) and constructs the entries against
//! a target: either an existing directory (a rootfs staging area) or a
//! disk image mounted through a loop device.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use fsbuild::commands;
use fsbuild::config::Config;
use fsbuild::engine::{BuildOptions, Strictness};
use fsbuild::mount::FsType;
use fsbuild::spec::ParseOptions;

#[derive(Parser)]
#[command(name = "fsbuild")]
#[command(about = "Populate a filesystem tree from a line-oriented spec")]
#[command(
    after_help = "QUICK START:\n  fsbuild check < spec          Validate a spec\n  fsbuild build --target DIR    Apply a spec to a staging directory\n  fsbuild image -i fs.img -t ext4   Apply a spec to a disk image\n  fsbuild preflight             Check host tools for image builds"
)]
struct Cli {
    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a spec to an existing directory root
    Build {
        /// Directory to populate (a rootfs staging area or a mounted image)
        #[arg(long)]
        target: PathBuf,

        /// Spec file (default: standard input)
        spec: Option<PathBuf>,

        /// Stop at the first failing line instead of continuing
        #[arg(long)]
        strict: bool,

        /// Accept the historical 5-field slink form (its mode is ignored)
        #[arg(long)]
        legacy_slink_mode: bool,
    },

    /// Mount a disk image and apply a spec to it
    Image {
        /// Image file to populate
        #[arg(short, long)]
        image: PathBuf,

        /// Filesystem type: ext2, ext3, ext4, btrfs, vfat, xfs
        #[arg(short = 't', long)]
        fstype: Option<String>,

        /// Partition to operate on (0 = entire image)
        #[arg(short = 'P', long, default_value_t = 0)]
        part: u32,

        /// Spec file (default: standard input)
        spec: Option<PathBuf>,

        /// Stop at the first failing line instead of continuing
        #[arg(long)]
        strict: bool,

        /// Accept the historical 5-field slink form (its mode is ignored)
        #[arg(long)]
        legacy_slink_mode: bool,
    },

    /// Parse and validate a spec without touching a target
    Check {
        /// Spec file (default: standard input)
        spec: Option<PathBuf>,

        /// Emit the decoded entries as JSON
        #[arg(long)]
        json: bool,

        /// Accept the historical 5-field slink form (its mode is ignored)
        #[arg(long)]
        legacy_slink_mode: bool,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },

    /// Check host tools needed for image builds
    Preflight {
        /// Fail if any checks fail (exit code 1)
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Supported entry types and their grammars
    Types,
    /// Summary of a constructed target tree
    Tree { path: PathBuf },
    /// Current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present; real environment variables win.
    dotenvy::dotenv().ok();
    let config = Config::load();

    match cli.command {
        Commands::Build {
            target,
            spec,
            strict,
            legacy_slink_mode,
        } => {
            let opts = build_options(&config, strict, legacy_slink_mode, cli.verbose);
            let report = commands::cmd_build(&target, spec.as_deref(), opts)?;
            if !report.success() {
                std::process::exit(1);
            }
        }

        Commands::Image {
            image,
            fstype,
            part,
            spec,
            strict,
            legacy_slink_mode,
        } => {
            let fstype = match fstype.or_else(|| config.default_fstype.clone()) {
                Some(name) => FsType::from_str(&name)?,
                None => bail!("please specify --fstype (or set FSBUILD_FSTYPE)"),
            };
            let opts = build_options(&config, strict, legacy_slink_mode, cli.verbose);
            let report =
                commands::cmd_image(&image, fstype, part, spec.as_deref(), opts, &config)?;
            if !report.success() {
                std::process::exit(1);
            }
        }

        Commands::Check {
            spec,
            json,
            legacy_slink_mode,
        } => {
            let parse = ParseOptions {
                legacy_slink_mode: legacy_slink_mode || config.legacy_slink_mode,
            };
            let report = commands::cmd_check(spec.as_deref(), parse, json, cli.verbose)?;
            if !report.success() {
                std::process::exit(1);
            }
        }

        Commands::Show { what } => {
            let what = match &what {
                ShowTarget::Types => commands::show::ShowTarget::Types,
                ShowTarget::Tree { path } => commands::show::ShowTarget::Tree(path),
                ShowTarget::Config => commands::show::ShowTarget::Config,
            };
            commands::cmd_show(what, &config, cli.verbose)?;
        }

        Commands::Preflight { strict } => {
            commands::cmd_preflight(strict)?;
        }
    }

    Ok(())
}

/// Merge config defaults with command-line flags; flags only turn things on.
fn build_options(config: &Config, strict: bool, legacy_slink_mode: bool, verbose: u8) -> BuildOptions {
    BuildOptions {
        strictness: if strict || config.strict {
            Strictness::Strict
        } else {
            Strictness::Lenient
        },
        parse: ParseOptions {
            legacy_slink_mode: legacy_slink_mode || config.legacy_slink_mode,
        },
        verbosity: verbose,
    }
}
