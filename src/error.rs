use thiserror::Error;

/// An error that can occur when loading feeds or generating reports.
#[derive(Error, Debug)]
pub enum Error {
    #[error("could not find file {0}")]
    MissingFile(String),
    #[error("could not read feed: {0} is neither a file nor a directory")]
    NotFileNorDirectory(String),
    #[error("'{0}' is not a valid service identifier")]
    InvalidServiceId(String),
    #[error("'{0}' is not a valid date, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("rolling dates config: {0}")]
    RollingConfig(String),
    #[error("no stops loaded from the feed")]
    NoStops,
    #[error("no valid dates to process")]
    NoDates,
    #[error("impossible to read file")]
    IO(#[from] std::io::Error),
    #[error("impossible to read '{file_name}'")]
    NamedFileIO {
        file_name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("impossible to read json")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "read-url")]
    #[error("impossible to remotely access feed")]
    Fetch(#[from] reqwest::Error),
    #[cfg(feature = "read-url")]
    #[error("feed download failed with HTTP status {0}")]
    DownloadStatus(u16),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}
