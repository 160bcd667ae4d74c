//! `sslpack plan` command

use anyhow::Result;

use super::resolve_platform;
use crate::cli::PlanArgs;
use sslpack::builder::AmbientEnv;
use sslpack::ops::{discover_sdk, plan_build, BuildRequest};

pub fn execute(args: PlanArgs) -> Result<()> {
    let resolved = resolve_platform(&args.platform)?;
    let platform = discover_sdk(resolved.platform)?;

    let mut request = BuildRequest::new(platform, resolved.options, &args.source, "package");
    request.dependencies = resolved.dependencies;
    request.ambient = AmbientEnv::capture();
    request.plan_only = true;

    let plan = plan_build(&request)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
