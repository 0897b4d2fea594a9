use snipty::PackageManager;
use snipty::error::Result;

pub fn uninstall(pm: &mut PackageManager, name: &str) -> Result<i32> {
    pm.uninstall(name)?;
    Ok(0)
}

pub fn untrack(pm: &mut PackageManager, name: &str) -> Result<i32> {
    pm.untrack(name)?;
    Ok(0)
}

pub fn prune(pm: &mut PackageManager) -> Result<i32> {
    pm.prune()?;
    Ok(0)
}
