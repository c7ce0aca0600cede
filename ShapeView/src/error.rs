use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Darkstar error: {0}")]
    Darkstar(#[from] darkstar::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("No search roots configured")]
    NoSearchRoots,

    #[error("Invalid shape handle: {0}")]
    InvalidHandle(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
