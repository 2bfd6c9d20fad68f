use super::{load_collection, CollectionArgs};
use crate::errors::CliError;
use crate::utils::plural;
use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;
use ltk_meta_cache::{MetaFile, MetaIndex};
use std::fs;

pub struct SynthesizeCollectionArgs {
    pub collection: CollectionArgs,
    /// Directory the game files are written to, laid out by game path.
    pub output_dir: Utf8PathBuf,
}

pub fn synthesize_collection(args: SynthesizeCollectionArgs) -> miette::Result<()> {
    let (mut collection, _config, summary) = load_collection(&args.collection)?;

    let cache = collection.cache_mut();
    let files = cache
        .synthesized_files()
        .map_err(|source| CliError::SynthesisFailed { source })?;
    let fingerprint = cache
        .files_fingerprint()
        .map_err(|source| CliError::SynthesisFailed { source })?;

    let written = write_files(&args.output_dir, &files)?;

    println!(
        "{} {} to {} {}",
        "✅ Wrote".bright_green().bold(),
        plural(written, "file").bright_white().bold(),
        args.output_dir.as_str().bright_cyan(),
        format!(
            "({}, fingerprint {fingerprint:016x})",
            plural(summary.conflicts.len(), "conflict")
        )
        .dimmed()
    );

    Ok(())
}

/// Write every file under `output_dir/<game path>`, creating parent directories.
pub fn write_files(
    output_dir: &Utf8Path,
    files: &[(MetaIndex, MetaFile)],
) -> miette::Result<usize> {
    for (index, file) in files {
        let path = output_dir.join(index.game_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CliError::write_failed(parent.to_owned(), e))?;
        }
        fs::write(&path, file.as_bytes()).map_err(|e| CliError::write_failed(path.clone(), e))?;
        tracing::debug!("Wrote {} ({} bytes)", path, file.len());
    }

    Ok(files.len())
}
