//! Project-wide constants used across multiple modules.

/// Directory name under the user's config dir
pub const APP_DIR: &str = "tapedeck";

/// Audio file extensions the decoder understands
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac"];

/// Returns true if the path has one of the supported audio extensions
pub fn is_supported_audio(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
}
