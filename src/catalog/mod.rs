pub mod error;
pub mod file_name;
pub mod osf;
pub mod source;
