use anyhow::Result;
use clap::ArgMatches;
use std::any::Any;
use std::path::Path;

/// Value of `id` if the subcommand defines it and it was given.
pub fn arg_value<'a, T: Any + Clone + Send + Sync + 'static>(
    matches: &'a ArgMatches,
    id: &str,
) -> Option<&'a T> {
    matches.try_get_one::<T>(id).ok().flatten()
}

/// A `SetTrue` flag; false when the subcommand does not define it.
pub fn arg_flag(matches: &ArgMatches, id: &str) -> bool {
    arg_value::<bool>(matches, id).copied().unwrap_or(false)
}

pub fn validate_html_output(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("html") | Some("htm") => {}
        _ => anyhow::bail!("Report file must have a .html extension: {}", path.display()),
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            anyhow::bail!("Report directory does not exist: {}", parent.display());
        }
    }

    Ok(())
}
