//! Pure metadata attached to dice/groups.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Whether a [`Description`] came from a single-line or multi-line comment form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptionType {
    /// `// ...` or `# ...`, running to end-of-line.
    Inline,
    /// `/* ... */` or `[ ... ]`.
    Multiline,
}

/// Free-form text attached to the nearest preceding dice/group node.
///
/// Multiple descriptions may appear after a node in notation; only the first is retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    text: String,
    #[serde(rename = "type")]
    kind: DescriptionType,
}

impl Description {
    /// Build a description. Fails with [`Error::MissingArgument`] on empty text.
    pub fn new(text: impl Into<String>, kind: DescriptionType) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(Error::MissingArgument("description text".into()));
        }
        Ok(Description { text, kind })
    }

    /// The description's text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether this is an inline or multiline description.
    pub fn kind(&self) -> DescriptionType {
        self.kind
    }
}
