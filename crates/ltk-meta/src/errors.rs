use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Collection manifest not found: {path}")]
    #[diagnostic(
        code(collection::not_found),
        help("Pass the path to a collection JSON file with --collection")
    )]
    CollectionNotFound { path: Utf8PathBuf },

    #[error("No game data directory configured")]
    #[diagnostic(
        code(config::game_data_missing),
        help("Pass --game-data <dir> or set \"gameDataDir\" in meta-cache.json")
    )]
    GameDataNotConfigured,

    #[error("Game data directory not found: {path}")]
    #[diagnostic(
        code(config::game_data_not_found),
        help("The directory must hold extracted game files laid out by game path (chara/xls/...)")
    )]
    GameDataNotFound { path: Utf8PathBuf },

    #[error("Failed to load collection")]
    #[diagnostic(
        code(collection::load_failed),
        help("Check the manifest and every mod definition it references for syntax errors")
    )]
    CollectionLoadFailed {
        #[source]
        source: ltk_meta_cache::Error,
    },

    #[error("Invalid meta cache config: {path}")]
    #[diagnostic(
        code(config::parse_error),
        help("Check meta-cache.json for syntax errors and a supported \"version\"")
    )]
    ConfigParseError {
        path: Utf8PathBuf,
        #[source]
        source: ltk_meta_cache::Error,
    },

    #[error("Failed to synthesize meta files")]
    #[diagnostic(
        code(meta::synthesis_failed),
        help("The game data directory needs the default file of every overridden group")
    )]
    SynthesisFailed {
        #[source]
        source: ltk_meta_cache::Error,
    },

    #[error("Failed to write {path}")]
    #[diagnostic(
        code(fs::write_failed),
        help("Check file permissions and available disk space")
    )]
    WriteFailed {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn collection_not_found(path: Utf8PathBuf) -> Self {
        Self::CollectionNotFound { path }
    }

    pub fn game_data_not_found(path: Utf8PathBuf) -> Self {
        Self::GameDataNotFound { path }
    }

    pub fn config_parse_error(path: Utf8PathBuf, source: ltk_meta_cache::Error) -> Self {
        Self::ConfigParseError { path, source }
    }

    pub fn write_failed(path: Utf8PathBuf, source: std::io::Error) -> Self {
        Self::WriteFailed { path, source }
    }
}
