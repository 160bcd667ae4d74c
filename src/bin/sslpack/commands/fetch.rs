//! `sslpack fetch` command

use anyhow::{Context, Result};

use crate::cli::FetchArgs;
use sslpack::sources::archive::{default_cache_dir, fetch_source, ArchiveSource};
use sslpack::util::shell::Status;
use sslpack::util::Shell;

pub fn execute(args: FetchArgs, shell: &Shell) -> Result<()> {
    let mut source = ArchiveSource::openssl();
    if let Some(location) = args.archive {
        source = source.with_location(location);
    }

    let cache_dir = match args.cache_dir {
        Some(dir) => dir,
        None => default_cache_dir().context("could not determine a cache directory")?,
    };

    shell.status(Status::Fetching, source.archive_name());
    let source_dir = fetch_source(&source, &cache_dir, &args.dest)?;
    println!("{}", source_dir.display());
    Ok(())
}
