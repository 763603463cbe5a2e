use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// Per-file line changes, keyed by the path in the resulting tree.
pub type PatchResult = BTreeMap<String, FileChange>;

/// What a patch did to one interesting file.
///
/// All line numbers are 1-based positions in the resulting file, sorted and
/// free of duplicates. The three sets of a `Modified` entry are disjoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// The file was created by the patch
    New,
    /// The file existed before and had lines changed
    Modified {
        added: Vec<u32>,
        deleted: Vec<u32>,
        touched: Vec<u32>,
    },
}

impl Serialize for FileChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FileChange::New => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("new", &true)?;
                map.end()
            }
            FileChange::Modified {
                added,
                deleted,
                touched,
            } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("added", added)?;
                map.serialize_entry("deleted", deleted)?;
                map.serialize_entry("touched", touched)?;
                map.serialize_entry("new", &false)?;
                map.end()
            }
        }
    }
}
