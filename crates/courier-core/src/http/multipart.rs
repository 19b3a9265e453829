//! Multipart payload assembly
//!
//! The builder is transport-agnostic: it produces an ordered list of parts
//! that a [`crate::http::Transport`] converts into its own wire form. All file
//! parts share one field name.

use serde_json::{Map, Value};

use super::request::FileUpload;

/// Field name used for every file part unless configured otherwise
pub const DEFAULT_FILE_FIELD: &str = "files";

/// One part of a multipart payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartPart {
    Text { name: String, value: String },
    File { name: String, file: FileUpload },
}

impl MultipartPart {
    pub fn name(&self) -> &str {
        match self {
            MultipartPart::Text { name, .. } | MultipartPart::File { name, .. } => name,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, MultipartPart::File { .. })
    }
}

/// Ordered text parts followed by file parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartPayload {
    parts: Vec<MultipartPart>,
}

impl MultipartPayload {
    pub fn parts(&self) -> &[MultipartPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<MultipartPart> {
        self.parts
    }

    pub fn text_parts(&self) -> impl Iterator<Item = &MultipartPart> {
        self.parts.iter().filter(|p| !p.is_file())
    }

    pub fn file_parts(&self) -> impl Iterator<Item = &MultipartPart> {
        self.parts.iter().filter(|p| p.is_file())
    }

    /// Total bytes across all file parts
    pub fn file_bytes(&self) -> u64 {
        self.parts
            .iter()
            .map(|p| match p {
                MultipartPart::File { file, .. } => file.data.len() as u64,
                MultipartPart::Text { .. } => 0,
            })
            .sum()
    }
}

/// Builds [`MultipartPayload`]s with a fixed file field name
#[derive(Debug, Clone)]
pub struct MultipartBuilder {
    file_field: String,
}

impl Default for MultipartBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_FIELD)
    }
}

impl MultipartBuilder {
    pub fn new(file_field: impl Into<String>) -> Self {
        Self {
            file_field: file_field.into(),
        }
    }

    pub fn file_field(&self) -> &str {
        &self.file_field
    }

    /// Build a payload from text fields and files.
    ///
    /// String values are sent as-is, `null` as an empty string, and any other
    /// JSON value in its compact serialised form.
    pub fn build(&self, fields: &Map<String, Value>, files: &[FileUpload]) -> MultipartPayload {
        let text = fields.iter().map(|(name, value)| MultipartPart::Text {
            name: name.clone(),
            value: field_text(value),
        });
        let binary = files.iter().map(|file| MultipartPart::File {
            name: self.file_field.clone(),
            file: file.clone(),
        });

        MultipartPayload {
            parts: text.chain(binary).collect(),
        }
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_text_then_files_in_insertion_order() {
        let payload = MultipartBuilder::default().build(
            &fields(json!({"title": "Quarterly", "year": 2024, "draft": false})),
            &[
                FileUpload::new("a.pdf", vec![1, 2, 3]),
                FileUpload::new("b.pdf", vec![4, 5]),
            ],
        );

        let names: Vec<&str> = payload.parts().iter().map(MultipartPart::name).collect();
        assert_eq!(names, ["title", "year", "draft", "files", "files"]);
        assert_eq!(payload.file_bytes(), 5);
    }

    #[test]
    fn test_field_values_are_stringified() {
        let payload = MultipartBuilder::default().build(
            &fields(json!({"n": 3, "s": "x", "none": null, "tags": ["a", "b"]})),
            &[FileUpload::new("a.txt", vec![0])],
        );
        let values: Vec<String> = payload
            .text_parts()
            .map(|p| match p {
                MultipartPart::Text { value, .. } => value.clone(),
                MultipartPart::File { .. } => unreachable!(),
            })
            .collect();
        assert_eq!(values, ["3", "x", "", "[\"a\",\"b\"]"]);
    }

    #[test]
    fn test_custom_file_field() {
        let payload = MultipartBuilder::new("attachment")
            .build(&Map::new(), &[FileUpload::new("a.txt", vec![0])]);
        assert_eq!(payload.parts()[0].name(), "attachment");
    }

    proptest! {
        #[test]
        fn prop_part_counts_match_inputs(n in 0usize..8, m in 0usize..8) {
            let mut map = Map::new();
            for i in 0..n {
                map.insert(format!("field{}", i), json!(i));
            }
            let files: Vec<FileUpload> = (0..m)
                .map(|i| FileUpload::new(format!("f{}.bin", i), vec![i as u8]))
                .collect();

            let payload = MultipartBuilder::default().build(&map, &files);
            prop_assert_eq!(payload.text_parts().count(), n);
            prop_assert_eq!(payload.file_parts().count(), m);
            prop_assert!(payload.file_parts().all(|p| p.name() == DEFAULT_FILE_FIELD));
        }
    }
}
