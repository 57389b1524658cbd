//! # Mnemos Codec
//!
//! Text formats for Mnemos configuration files.
//!
//! A [`DocumentCodec`] converts between file text and a [`Document`]. Two
//! codecs ship with the crate:
//!
//! - [`JsonCodec`] - JSON with whole-line `//` comments (the default)
//! - [`TomlCodec`] - TOML with `#` comments
//!
//! [`codec_for_extension`] picks one from a file extension.

#![doc(html_root_url = "https://docs.rs/mnemos-codec/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod json_codec;
mod toml_codec;

use std::sync::Arc;

use mnemos_core::{ConfigResult, Document};

pub use json_codec::JsonCodec;
pub use toml_codec::TomlCodec;

/// Converts configuration documents to and from text.
pub trait DocumentCodec: Send + Sync + 'static {
    /// Short format name, for logs.
    fn name(&self) -> &'static str;

    /// Render a document, including its comments.
    fn encode(&self, doc: &Document) -> ConfigResult<String>;

    /// Parse text into a document. Comments are discarded.
    fn decode(&self, text: &str) -> ConfigResult<Document>;
}

/// Select a codec for a file extension.
///
/// `toml` (case-insensitive) selects [`TomlCodec`]; anything else uses
/// [`JsonCodec`].
pub fn codec_for_extension(extension: &str) -> Arc<dyn DocumentCodec> {
    let codec: Arc<dyn DocumentCodec> = if extension.eq_ignore_ascii_case("toml") {
        Arc::new(TomlCodec)
    } else {
        Arc::new(JsonCodec)
    };
    tracing::debug!(extension, codec = codec.name(), "selected document codec");
    codec
}

fn comment_line(marker: &str, text: &str) -> String {
    if text.starts_with(char::is_whitespace) {
        format!("{marker}{text}")
    } else {
        format!("{marker} {text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_for_extension() {
        assert_eq!(codec_for_extension("toml").name(), "toml");
        assert_eq!(codec_for_extension("TOML").name(), "toml");
        assert_eq!(codec_for_extension("json").name(), "json");
        assert_eq!(codec_for_extension("cfg").name(), "json");
    }

    #[test]
    fn test_comment_line() {
        assert_eq!(comment_line("//", "hello"), "// hello");
        assert_eq!(comment_line("#", " spaced"), "# spaced");
    }
}
