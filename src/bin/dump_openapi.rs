use std::fs;

use anyhow::Context;

/// Write the OpenAPI document to the path given as the first argument, or
/// print it to stdout.
fn main() -> anyhow::Result<()> {
    let doc = rbac_admin::docs::build_openapi(8000);
    let s = serde_json::to_string_pretty(&doc)?;

    match std::env::args().nth(1) {
        Some(path) => {
            fs::write(&path, s).with_context(|| format!("failed to write {}", path))?;
            println!("wrote {}", path);
        }
        None => println!("{}", s),
    }
    Ok(())
}
