pub mod image_folder;
pub mod toml_loader;

pub use image_folder::list_sheet_images;
pub use toml_loader::{load_answer_key, load_layout, load_roster, parse_answer_key, parse_roster};
