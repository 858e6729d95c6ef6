pub mod http;
pub mod random;
pub mod temp;

// re-export
pub use temp::{temp_dir, temp_file};
