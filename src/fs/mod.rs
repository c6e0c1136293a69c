pub mod loader;

pub use loader::{load_directory, load_json, parse_json, LoadOptions};
