use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The colour file could not be opened.
    #[error("cannot open colour file {path}: {source}")]
    PaletteOpen {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The colour file held something other than whitespace-separated integers.
    #[error("bad token {token:?} in colour file {path}")]
    PaletteSyntax { path: PathBuf, token: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
