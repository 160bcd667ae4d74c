//! `sslpack package` command

use anyhow::{bail, Result};

use super::resolve_platform;
use crate::cli::PackageArgs;
use sslpack::ops::package_build;
use sslpack::util::Shell;

pub fn execute(args: PackageArgs, shell: &Shell) -> Result<()> {
    if !args.source.is_dir() {
        bail!(
            "source tree not found: {}\n\
             hint: run `sslpack build` first or pass `--source`",
            args.source.display()
        );
    }

    let resolved = resolve_platform(&args.platform)?;
    let report = package_build(
        &resolved.platform,
        &resolved.options,
        &args.source,
        &args.dest,
        shell,
    )?;
    for (from, to) in &report.renamed {
        tracing::info!("renamed {} -> {}", from.display(), to.display());
    }
    Ok(())
}
