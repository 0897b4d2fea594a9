use snipty::PackageManager;
use snipty::error::Result;

/// Exit status is the number of drifted snippets (0 or 1 for a single name)
pub async fn check(pm: &mut PackageManager, name: Option<&str>, diff: bool) -> Result<i32> {
    let drifted = match name {
        Some(name) => pm.check(name, diff).await?.discrepancies(),
        None => pm.check_all(diff).await?.drifted(),
    };

    Ok(drifted.min(255) as i32)
}
