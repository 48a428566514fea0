use super::GlobalArgs;
use fixity_lib::util::create_progress_bar;
use fixity_lib::{hash_file, hash_file_with_progress, Overrides, Result};
use std::path::Path;

/// Files at least this large get a progress bar.
const PROGRESS_THRESHOLD: u64 = 64 * 1024 * 1024;

pub fn handle_hash_command(
    globals: &GlobalArgs,
    file: &Path,
    algorithm: Option<String>,
) -> Result<()> {
    let config = globals.load_config(Overrides {
        algorithm,
        ..Default::default()
    })?;

    let size = std::fs::metadata(file).map(|m| m.len()).unwrap_or(0);

    let digest = if !globals.quiet && size >= PROGRESS_THRESHOLD {
        let pb = create_progress_bar(size, &format!("Hashing {}", file.display()));
        let bar = pb.clone();
        let digest = hash_file_with_progress(
            file,
            config.algorithm,
            Box::new(move |done, _total| bar.set_position(done)),
        );
        pb.finish_and_clear();
        digest?
    } else {
        hash_file(file, config.algorithm)?
    };

    println!("{}  {}", digest, file.display());
    Ok(())
}
