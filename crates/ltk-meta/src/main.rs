use camino::Utf8PathBuf;
use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    inspect_collection, synthesize_collection, CollectionArgs, InspectCollectionArgs,
    SynthesizeCollectionArgs,
};
use miette::Result;

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show which mod owns every metadata override in a collection
    Inspect {
        /// The path to the collection manifest
        #[arg(short, long)]
        collection: Utf8PathBuf,

        /// Directory of extracted default game files
        #[arg(short, long)]
        game_data: Option<Utf8PathBuf>,

        /// The path to the meta cache config file
        #[arg(long)]
        config: Option<Utf8PathBuf>,

        /// Print identifier ownership as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the synthesized game files of a collection to a directory
    Synthesize {
        /// The path to the collection manifest
        #[arg(short, long)]
        collection: Utf8PathBuf,

        /// The directory to write the synthesized files to
        #[arg(short, long, default_value = "meta")]
        output: Utf8PathBuf,

        /// Directory of extracted default game files
        #[arg(short, long)]
        game_data: Option<Utf8PathBuf>,

        /// The path to the meta cache config file
        #[arg(long)]
        config: Option<Utf8PathBuf>,
    },
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    match Args::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => e.exit(),
    }
}

fn main() -> Result<()> {
    let args = parse_args();
    utils::init_logging(args.verbose);

    match args.command {
        Commands::Inspect {
            collection,
            game_data,
            config,
            json,
        } => inspect_collection(InspectCollectionArgs {
            collection: CollectionArgs {
                collection,
                game_data,
                config,
            },
            json,
        }),
        Commands::Synthesize {
            collection,
            output,
            game_data,
            config,
        } => synthesize_collection(SynthesizeCollectionArgs {
            collection: CollectionArgs {
                collection,
                game_data,
                config,
            },
            output_dir: output,
        }),
    }
}
