pub mod config;
pub mod error;
pub mod logging;

pub mod downloader;
pub mod engine;
pub mod probe;
pub mod progress;
pub mod segmenter;
pub mod storage;
pub mod terminal;
pub mod url_model;

pub use config::SplitdlConfig;
pub use engine::{run_download, Console, DownloadOutcome, DownloadRequest, OutputMode};
pub use error::{DownloadError, DownloadFailure};
