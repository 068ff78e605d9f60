//! Class label table.
//!
//! A newline-delimited list of class names, loaded once at startup. Decoded
//! class ids index into this table 0-based; an out-of-range id means the
//! model and the label file do not belong together, which is a fatal
//! configuration fault, not something to paper over.

use std::path::Path;

use anyhow::{anyhow, Context, Result};

#[derive(Clone, Debug)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    /// Load a label table from a newline-delimited file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read label file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid label file {}", path.display()))
    }

    /// Parse label text: trailing newlines trimmed, one name per line.
    /// Interior blank lines keep their slot so ids stay aligned.
    pub fn parse(raw: &str) -> Result<Self> {
        let names: Vec<String> = raw
            .trim_end_matches('\n')
            .split('\n')
            .map(|name| name.to_string())
            .collect();
        if names.iter().all(|name| name.trim().is_empty()) {
            return Err(anyhow!("label table is empty"));
        }
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    /// Label for a class id, or a fatal model/label-table mismatch error.
    pub fn require(&self, class_id: usize) -> Result<&str> {
        self.get(class_id).ok_or_else(|| {
            anyhow!(
                "class id {} is out of range for a label table of {} entries; \
                 the model and label file do not match",
                class_id,
                self.names.len()
            )
        })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_newline_delimited_names() {
        let labels = ClassLabels::parse("person\nbicycle\ncar\n").unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(0), Some("person"));
        assert_eq!(labels.get(2), Some("car"));
        assert_eq!(labels.get(3), None);
    }

    #[test]
    fn trailing_newlines_do_not_add_entries() {
        let labels = ClassLabels::parse("person\nbicycle\n\n").unwrap();
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn interior_blank_lines_keep_their_slot() {
        let labels = ClassLabels::parse("person\n\ncar").unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(1), Some(""));
        assert_eq!(labels.get(2), Some("car"));
    }

    #[test]
    fn empty_table_is_an_error() {
        assert!(ClassLabels::parse("").is_err());
        assert!(ClassLabels::parse("\n\n").is_err());
    }

    #[test]
    fn require_reports_mismatch() {
        let labels = ClassLabels::parse("person\ncar").unwrap();
        assert_eq!(labels.require(1).unwrap(), "car");
        let err = labels.require(80).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp labels");
        file.write_all(b"person\nbicycle\ncar\n").expect("write labels");
        let labels = ClassLabels::load(file.path()).unwrap();
        assert_eq!(labels.len(), 3);
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let err = ClassLabels::load("/nonexistent/coco.names").unwrap_err();
        assert!(err.to_string().contains("failed to read label file"));
    }
}
