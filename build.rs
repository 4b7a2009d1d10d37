use std::env;
use std::path::PathBuf;

use anyhow::Context;
use fs_extra::{copy_items, dir::CopyOptions};

fn main() -> anyhow::Result<()> {
    // Rerun when models or textures under /assets/ change.
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets = manifest_dir.join("assets");
    if !assets.exists() {
        return Ok(());
    }

    let out_dir = env::var("OUT_DIR")?;
    let options = CopyOptions::new().overwrite(true);
    copy_items(&[assets], &out_dir, &options)
        .with_context(|| format!("copying assets to {out_dir}"))?;

    Ok(())
}
