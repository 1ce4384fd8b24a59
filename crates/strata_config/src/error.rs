//! Errors raised while reading `strata.toml`.

use std::path::PathBuf;

/// A configuration file that could not be read or understood.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file at `path` could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// The file that was requested.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The content is not valid TOML or names a key the scheduler does not know.
    #[error("invalid configuration in {origin}: {source}")]
    Parse {
        /// Where the content came from: a file path or `<string>`.
        origin: String,
        /// The deserializer's diagnosis.
        #[source]
        source: toml::de::Error,
    },
}
