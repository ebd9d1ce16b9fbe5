pub mod constants;
pub mod line_files;
pub mod output_name;
pub mod url_utils;

pub use constants::*;
pub use line_files::{append_lines, read_url_lines, remove_if_exists, write_lines};
pub use output_name::{OutputNameError, validate_output_name};
pub use url_utils::{add_scheme_if_missing, origin_of, unique_urls};
