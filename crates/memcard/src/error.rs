pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    IOError(std::io::Error),
    ConfigError(String),
    UnsupportedSize(u64),
    NameTooLong(usize),
    InvalidName(String),
    NameExists(String),
    NotFound(String),
    EmptyChain(u16),
    DestinationFull,
    NoFreeSlot,
    OutOfSpace { written: usize, total: usize },
    ClusterOutOfBounds(u16),
    Cancelled,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IOError(err) => write!(f, "{err}"),
            Error::ConfigError(err) => write!(f, "{err}"),
            Error::UnsupportedSize(size) => write!(
                f,
                "unsupported card size: {size} bytes (expected 8, 16 or 32 MiB)"
            ),
            Error::NameTooLong(len) => write!(f, "name too long ({len} > 16 characters)"),
            Error::InvalidName(name) => write!(f, "invalid save name `{name}`"),
            Error::NameExists(name) => write!(f, "a save named `{name}` already exists"),
            Error::NotFound(name) => write!(f, "not found: `{name}`"),
            Error::EmptyChain(cluster) => write!(
                f,
                "could not read save data (empty or invalid cluster chain at {cluster})"
            ),
            Error::DestinationFull => write!(f, "no free space on destination card"),
            Error::NoFreeSlot => write!(f, "no free directory slot"),
            Error::OutOfSpace { written, total } => write!(
                f,
                "ran out of space while copying ({written}/{total} clusters written)"
            ),
            Error::ClusterOutOfBounds(cluster) => {
                write!(f, "cluster {cluster} lies outside the card image")
            }
            Error::Cancelled => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IOError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IOError(err)
    }
}
