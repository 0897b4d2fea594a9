use snipty::PackageManager;
use snipty::error::Result;

pub async fn install(
    pm: &mut PackageManager,
    name: Option<&str>,
    url: Option<&str>,
    force: bool,
) -> Result<i32> {
    match (name, url) {
        (Some(name), Some(url)) => {
            let result = pm.install(name, url, force).await?;
            tracing::debug!(
                "Installed {} at {} (directory: {})",
                result.name,
                result.path.display(),
                result.is_dir
            );
        }
        _ => {
            let installed = pm.install_missing(force).await?;
            tracing::debug!("Installed {} missing snippet(s)", installed.len());
        }
    }
    Ok(0)
}
