// System status display — shows the persisted state file and its contents.

use anyhow::Result;
use chrono::{DateTime, Local};

use crate::signature::SignatureStore;

/// Display the persisted dedup state to the terminal.
pub fn show(store: &SignatureStore) -> Result<()> {
    let path = store.path();

    if !path.exists() {
        println!("State file: {} (not yet created)", path.display());
        println!("\nNo review recorded yet — the next `kuchikomi check` will");
        println!("treat whatever it extracts as new.");
        return Ok(());
    }

    let metadata = std::fs::metadata(path)?;
    println!("State file: {} ({} bytes)", path.display(), metadata.len());

    if let Ok(modified) = metadata.modified() {
        let local: DateTime<Local> = modified.into();
        println!("Last new review: {}", local.format("%Y-%m-%d %H:%M:%S"));
    }

    let signature = store.load()?;
    if signature.is_empty() {
        println!("Stored signature: (empty)");
    } else {
        let chars = signature.chars().count();
        let head: String = signature.chars().take(40).collect();
        if chars > 40 {
            println!("Stored signature: \"{head}...\" ({chars} chars)");
        } else {
            println!("Stored signature: \"{head}\" ({chars} chars)");
        }
    }

    Ok(())
}
