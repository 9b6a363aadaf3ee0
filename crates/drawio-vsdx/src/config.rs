// crates/drawio-vsdx/src/config.rs
//
// Import options. Every field has a default, so an empty JSON object is a valid
// configuration.

use crate::assemble::DEFAULT_MAX_DEPTH;
use crate::error::ImportResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportOptions {
    /// Drop childless vertices with no label, fill, stroke or image.
    pub sanitize: bool,

    /// Limit on nested relationship expansion while assembling a part.
    pub max_relationship_depth: usize,

    /// Merge a page's background page into its base layer.
    pub include_background: bool,

    /// Write `<diagram>` bodies as compressed payloads instead of inline XML.
    pub compress_output: bool,

    /// Allow-list of page names or numeric page ids; all foreground pages when unset.
    pub page_ids: Option<Vec<String>>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            sanitize: true,
            max_relationship_depth: DEFAULT_MAX_DEPTH,
            include_background: true,
            compress_output: true,
            page_ids: None,
        }
    }
}

impl ImportOptions {
    pub fn from_json(json: &str) -> ImportResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn includes_page(&self, id: u32, name: &str) -> bool {
        match &self.page_ids {
            None => true,
            Some(allowed) => allowed
                .iter()
                .any(|p| p == name || p.parse::<u32>().is_ok_and(|n| n == id)),
        }
    }
}
