pub mod answer_key_loader;
pub mod toml_loader;

pub use answer_key_loader::{load_answer_key, parse_answer_key};
pub use toml_loader::{load_template, load_template_or_default};
