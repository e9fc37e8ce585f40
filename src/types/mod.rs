pub mod advisory;
pub mod catalog_entry;
pub mod crime_frame;
pub mod detail_level;
pub mod output_format;
pub mod request;
