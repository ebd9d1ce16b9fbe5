//! Validation of the result name used to build output file names

use thiserror::Error;

/// Substrings that would make the output files look like assets or date
/// templates to later shaping passes
pub const FORBIDDEN_OUTPUT_SUBSTRINGS: &[&str] = &[
    "css", "jpg", "jpeg", "png", "ico", "gif", "webp", "mp3", "mp4", "ttf", "tif", "tiff", "woff",
    "woff2", "vue", "YYYY", "MM", "DD", "HH",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputNameError {
    #[error("Output name must not be empty")]
    Empty,

    #[error("Output name '{name}' contains forbidden substring '{substring}'")]
    ForbiddenSubstring { name: String, substring: String },
}

/// Reject result names containing a forbidden substring
pub fn validate_output_name(name: &str) -> Result<(), OutputNameError> {
    if name.trim().is_empty() {
        return Err(OutputNameError::Empty);
    }
    match FORBIDDEN_OUTPUT_SUBSTRINGS
        .iter()
        .find(|substring| name.contains(**substring))
    {
        Some(substring) => Err(OutputNameError::ForbiddenSubstring {
            name: name.to_string(),
            substring: (*substring).to_string(),
        }),
        None => Ok(()),
    }
}
