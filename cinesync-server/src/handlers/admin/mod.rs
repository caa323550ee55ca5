pub mod import;
pub mod trailers;
