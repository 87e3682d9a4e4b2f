//! `orange check`: Validate specification files.

use super::LoadedConfig;
use anyhow::bail;
use orange_engine::Runtime;
use std::path::PathBuf;

pub fn execute(files: &[PathBuf], config: &LoadedConfig) -> anyhow::Result<()> {
    let failures = check_files(files, config);
    if failures > 0 {
        bail!("{} of {} file(s) failed", failures, files.len());
    }
    println!("{} file(s) ok", files.len());
    Ok(())
}

fn check_files(files: &[PathBuf], config: &LoadedConfig) -> usize {
    let rt = Runtime::with_options(config.options.clone());
    let mut failures = 0;

    for file in files {
        match super::load_blueprint(&rt, file) {
            Ok(class) => {
                log::debug!("{}: {} members", file.display(), class.definitions().len());
                println!("ok     {}", file.display());
            }
            Err(e) => {
                failures += 1;
                println!("error  {}: {:#}", file.display(), e);
            }
        }
    }
    failures
}
