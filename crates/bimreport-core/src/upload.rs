use std::path::Path;
use std::sync::Arc;

pub const ACCEPTED_EXTENSIONS: [&str; 3] = [".ifc", ".stp", ".step"];

/// A building-model file picked by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadSelection {
    name: String,
    bytes: Arc<[u8]>,
}

impl UploadSelection {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Lower-cased suffix starting at the last `.`, if the name has one.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rfind('.')
            .map(|idx| self.name[idx..].to_ascii_lowercase())
    }

    pub fn has_accepted_extension(&self) -> bool {
        self.extension()
            .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
    }
}

impl std::fmt::Debug for UploadSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSelection")
            .field("name", &self.name)
            .field("size", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_match_ignores_case() {
        assert!(UploadSelection::new("Tower.IFC", Vec::<u8>::new()).has_accepted_extension());
        assert!(UploadSelection::new("part.Step", Vec::<u8>::new()).has_accepted_extension());
        assert!(!UploadSelection::new("plan.dwg", Vec::<u8>::new()).has_accepted_extension());
        assert!(!UploadSelection::new("ifc", Vec::<u8>::new()).has_accepted_extension());
        assert!(!UploadSelection::new("model.ifc.zip", Vec::<u8>::new()).has_accepted_extension());
    }
}
