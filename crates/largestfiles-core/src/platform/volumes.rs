/// Volume roots and the sources that enumerate them.
use crate::model::path::{normalize_root, SEPARATOR};

/// A scan root plus the label shown in report headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    /// Normalized root path.
    pub root: String,
    /// Display label: `C:` for a drive root, otherwise the root itself.
    pub label: String,
}

impl Volume {
    pub fn new(root: &str) -> Self {
        let root = normalize_root(root);
        let label = display_label(&root);
        Self { root, label }
    }

    pub fn with_label(root: &str, label: impl Into<String>) -> Self {
        Self {
            root: normalize_root(root),
            label: label.into(),
        }
    }
}

/// Derive the report label for a normalized root.
fn display_label(root: &str) -> String {
    let b = root.as_bytes();
    if b.len() >= 2 && b[0].is_ascii_alphabetic() && b[1] == b':' && b.len() <= 3 {
        return root[..2].to_string();
    }
    if root.len() > 1 {
        root.trim_end_matches(SEPARATOR).to_string()
    } else {
        root.to_string()
    }
}

/// Supplies the ordered list of roots to scan.
///
/// The core never depends on how a source discovers its volumes; any
/// implementation returning readable directory roots will do.
pub trait VolumeSource {
    fn volumes(&self) -> Vec<Volume>;
}

/// Roots given explicitly, e.g. on the command line. Order is preserved.
#[derive(Debug, Clone, Default)]
pub struct ExplicitPaths(pub Vec<String>);

impl VolumeSource for ExplicitPaths {
    fn volumes(&self) -> Vec<Volume> {
        self.0.iter().map(|p| Volume::new(p)).collect()
    }
}
