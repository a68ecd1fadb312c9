//! §6.6: one positional configuration-file argument.

use camino::Utf8PathBuf;

#[derive(clap::Parser)]
pub struct Cli {
    /// Path to the configuration file
    pub config: Utf8PathBuf,
}
