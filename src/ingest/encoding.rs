//! Encoding policy - UTF-8 first, legacy encodings as fallback

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// How many leading bytes are inspected for NUL when sniffing binaries
const BINARY_SNIFF_LEN: usize = 8 * 1024;

/// Ordered list of encodings tried when turning file bytes into text.
///
/// A byte-order mark always wins. Otherwise each encoding is tried in order
/// and the first one that decodes without replacement characters is used.
/// If none is clean, the last encoding decodes lossily.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingPolicy {
    encodings: Vec<&'static Encoding>,
}

impl Default for EncodingPolicy {
    fn default() -> Self {
        Self {
            encodings: vec![UTF_8, WINDOWS_1252],
        }
    }
}

impl EncodingPolicy {
    /// Build a policy from WHATWG labels (`"utf-8"`, `"latin1"`, ...).
    ///
    /// Unknown labels are skipped with a warning. UTF-8 is always placed first.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut encodings = vec![UTF_8];
        for label in labels {
            match Encoding::for_label(label.as_ref().trim().as_bytes()) {
                Some(enc) if !encodings.contains(&enc) => encodings.push(enc),
                Some(_) => {}
                None => log::warn!("Ignoring unknown encoding label '{}'", label.as_ref()),
            }
        }
        Self { encodings }
    }

    pub fn labels(&self) -> Vec<String> {
        self.encodings
            .iter()
            .map(|e| e.name().to_lowercase())
            .collect()
    }

    /// Decode `bytes`, returning the text and the name of the encoding used
    pub fn decode(&self, bytes: &[u8]) -> (String, &'static str) {
        if let Some((enc, bom_len)) = Encoding::for_bom(bytes) {
            let (text, _) = enc.decode_without_bom_handling(&bytes[bom_len..]);
            return (text.into_owned(), enc.name());
        }

        for enc in &self.encodings {
            let (text, had_errors) = enc.decode_without_bom_handling(bytes);
            if !had_errors {
                return (text.into_owned(), enc.name());
            }
        }

        let last = self.encodings.last().copied().unwrap_or(UTF_8);
        let (text, _) = last.decode_without_bom_handling(bytes);
        (text.into_owned(), last.name())
    }
}

/// A file is treated as binary when its head contains a NUL byte
pub fn looks_binary(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
    head.contains(&0)
}
