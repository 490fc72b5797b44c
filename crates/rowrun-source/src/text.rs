//! Plain text documents with `{{placeholder}}` highlighting.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SourceReadError};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStyle {
    Plain,
    Highlight,
}

/// A run of text rendered in one style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub style: SegmentStyle,
}

impl Segment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            style: SegmentStyle::Plain,
        }
    }

    fn highlight(text: &str) -> Self {
        Self {
            text: text.to_string(),
            style: SegmentStyle::Highlight,
        }
    }

    pub fn is_highlight(&self) -> bool {
        self.style == SegmentStyle::Highlight
    }
}

/// Read a whole text file.
pub fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| SourceReadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Split `content` into plain and highlighted runs.
///
/// Each `{{...}}` span, braces included, is one highlighted segment. An
/// opening marker without a closing one leaves the rest of the text plain.
/// Empty segments are never produced.
pub fn segments(content: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut rest = content;

    while let Some(start) = rest.find(OPEN) {
        let Some(close) = rest[start + OPEN.len()..].find(CLOSE) else {
            break;
        };
        let end = start + OPEN.len() + close + CLOSE.len();
        if start > 0 {
            out.push(Segment::plain(&rest[..start]));
        }
        out.push(Segment::highlight(&rest[start..end]));
        rest = &rest[end..];
    }

    if !rest.is_empty() {
        out.push(Segment::plain(rest));
    }
    out
}
