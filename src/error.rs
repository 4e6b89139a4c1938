use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("Screen {0}x{1} is too small. At least 1x3 is necessary in width x height")]
    TooSmallWindow(usize, usize),

    #[error("Could not detect terminal window size")]
    UnknownWindowSize,
}

pub type Result<T> = std::result::Result<T, Error>;
