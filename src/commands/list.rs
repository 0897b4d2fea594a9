use colored::Colorize;
use snipty::error::{Result, SniptyError};
use snipty::PackageManager;

pub fn list(pm: &mut PackageManager) -> Result<i32> {
    let listing = match pm.list() {
        Ok(listing) => listing,
        // Nothing has been installed in this root yet
        Err(SniptyError::ConfigNotExists(root)) => {
            pm.reporter()
                .warning(format!("No snippets are tracked in {}", root.display()));
            return Ok(0);
        }
        Err(e) => return Err(e),
    };

    for snippet in &listing.installed {
        println!("{}\t{}\t{}", snippet.name, snippet.checksum, snippet.url);
    }

    if !listing.not_installed.is_empty() {
        println!(
            "\n{} Following snippets are NOT installed in the codebase (you can install them by running {})",
            "!".yellow().bold(),
            "snipty install".cyan()
        );
        for snippet in &listing.not_installed {
            println!("{}\t{}", snippet.name, snippet.url);
        }
    }

    Ok(0)
}
