pub mod assemble;
pub mod downloader;
pub mod error;
