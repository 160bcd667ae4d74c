//! `sslpack build` command

use anyhow::{Context, Result};

use super::resolve_platform;
use crate::cli::BuildArgs;
use sslpack::builder::{AmbientEnv, SystemRunner};
use sslpack::ops::{build, discover_sdk, BuildRequest};
use sslpack::sources::archive::{default_cache_dir, fetch_source, ArchiveSource};
use sslpack::util::shell::Status;
use sslpack::util::Shell;

pub fn execute(args: BuildArgs, shell: &Shell) -> Result<()> {
    let resolved = resolve_platform(&args.platform)?;
    let platform = discover_sdk(resolved.platform)?;

    let source_dir = match args.source {
        Some(source) => source,
        None => {
            let mut archive = ArchiveSource::openssl();
            if let Some(location) = &args.archive {
                archive = archive.with_location(location.as_str());
            }
            let cache = default_cache_dir().context("could not determine a cache directory")?;
            shell.status(Status::Fetching, archive.archive_name());
            fetch_source(&archive, &cache, &args.build_dir)?
        }
    };

    let mut request = BuildRequest::new(platform, resolved.options, source_dir, &args.dest);
    request.dependencies = resolved.dependencies;
    request.ambient = AmbientEnv::capture();
    request.check_tools = !args.skip_tool_check;
    if args.skip_tool_check {
        shell.note("skipping host tool check");
    }

    let runner = SystemRunner::new().verbose(args.show_output || shell.is_verbose());
    let outcome = build(&request, &runner, shell)?;

    if let Some(report) = &outcome.report {
        for file in &report.files {
            tracing::debug!("packaged {}", file.display());
        }
    }
    Ok(())
}
