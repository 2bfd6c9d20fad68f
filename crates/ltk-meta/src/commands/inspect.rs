use super::{load_collection, CollectionArgs};
use crate::errors::CliError;
use crate::println_pad;
use crate::utils::plural;
use colored::Colorize;
use miette::IntoDiagnostic;
use std::collections::BTreeMap;

pub struct InspectCollectionArgs {
    pub collection: CollectionArgs,
    /// Print identifier ownership as JSON instead of the human-readable listing.
    pub json: bool,
}

pub fn inspect_collection(args: InspectCollectionArgs) -> miette::Result<()> {
    let (mut collection, _config, summary) = load_collection(&args.collection)?;

    if args.json {
        let sources: Vec<_> = collection
            .cache()
            .identifier_sources()
            .map(|(identifier, source)| {
                serde_json::json!({ "identifier": identifier, "source": source })
            })
            .collect();
        let output = serde_json::to_string_pretty(&sources).into_diagnostic()?;
        println!("{output}");
        return Ok(());
    }

    let mut per_category: BTreeMap<&'static str, usize> = BTreeMap::new();
    for (identifier, _) in collection.cache().identifier_sources() {
        *per_category.entry(identifier.category()).or_default() += 1;
    }

    println_pad!(
        "{} {}",
        "🗂️ Collection:".bright_blue().bold(),
        collection.name().bright_cyan().bold()
    );
    println_pad!(
        "{} {} enabled of {}",
        "🧩 Mods:".bright_green(),
        collection
            .mods()
            .iter()
            .filter(|entry| entry.enabled)
            .count()
            .to_string()
            .bright_white()
            .bold(),
        collection.mods().len()
    );
    println_pad!(
        "{} {} {}",
        "📊 Overrides:".bright_yellow(),
        collection.cache().count().to_string().bright_white().bold(),
        format!(
            "(applied {}, rejected {})",
            summary.applied, summary.rejected
        )
        .dimmed()
    );

    println_pad!("\n{}", "📚 Categories:".bright_magenta().bold());
    if per_category.is_empty() {
        println_pad!("   {}", "No overrides".dimmed());
    }
    for (category, count) in &per_category {
        println_pad!(
            "   {} {} {}",
            "•".bright_cyan(),
            format!("{category:<10}").bright_cyan().bold(),
            count
        );
    }

    println_pad!("\n{}", "🔗 Sources:".bright_magenta().bold());
    for (identifier, source) in collection.cache().identifier_sources() {
        println_pad!(
            "   {} {} {} {}",
            "•".bright_cyan(),
            identifier.to_string().bright_white(),
            "<-".dimmed(),
            source.as_str().bright_green()
        );
    }

    if !summary.conflicts.is_empty() {
        println_pad!(
            "\n{} {}",
            "⚔️  Conflicts:".bright_red().bold(),
            plural(summary.conflicts.len(), "conflict").dimmed()
        );
        for conflict in &summary.conflicts {
            println_pad!(
                "   {} {} {} {} {} {}",
                "•".bright_red(),
                conflict.identifier.to_string().bright_white(),
                conflict.winner.as_str().bright_green().bold(),
                "overrides".dimmed(),
                conflict.superseded.as_str().yellow(),
                "(higher priority wins)".dimmed()
            );
        }
    }

    let cache = collection.cache_mut();
    let groups = cache
        .synthesized_files()
        .map_err(|source| CliError::SynthesisFailed { source })?;
    let fingerprint = cache
        .files_fingerprint()
        .map_err(|source| CliError::SynthesisFailed { source })?;

    println_pad!("\n{}", "📁 Synthesized files:".bright_magenta().bold());
    for (index, file) in &groups {
        println_pad!(
            "   {} {} {}",
            "•".bright_cyan(),
            index.game_path().bright_white(),
            format!("({} bytes)", file.len()).dimmed()
        );
    }
    println_pad!(
        "\n{} {}",
        "🔑 Fingerprint:".bright_blue().bold(),
        format!("{fingerprint:016x}").bright_white().bold()
    );

    Ok(())
}
