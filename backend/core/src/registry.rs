//! Document type registry: the extraction prompt and field list per type.

use std::collections::HashMap;

use crate::error::DocVerifyError;
use crate::types::{DocumentType, FieldId};

const AADHAR_PROMPT: &str = "\
Extract the following from the attached Aadhaar Card and provide the details in JSON format (keep the keys exactly same as mentioned below):
- name
- dob
- gender
- aadhar (not aadhar_number)";

const PAN_PROMPT: &str = "\
Extract the following from the attached PAN Card and provide the details in JSON format (keep the keys exactly same as mentioned below):
- name
- pan (not pan_number)";

const MARKSHEET_PROMPT: &str = "\
Extract the following from the attached Marksheet and provide the details in JSON format (keep the keys exactly same as mentioned below):
- name (extract the full name of the student)
- semester
- rollNumber
- cgpa (value is written under the block named 'CGPA')
- sgpa (value is written under the block containing field as 'SGPA' and it is also possible that both cgpa and sgpa are identical)";

/// Prompt and ordered field list for one document type.
#[derive(Debug, Clone)]
pub struct DocumentSpec {
    pub prompt: String,
    pub fields: Vec<FieldId>,
}

impl DocumentSpec {
    pub fn new(prompt: impl Into<String>, fields: Vec<FieldId>) -> Self {
        Self {
            prompt: prompt.into(),
            fields,
        }
    }
}

/// Read-only table of document types, built once at startup and shared.
#[derive(Debug, Clone)]
pub struct DocumentRegistry {
    specs: HashMap<DocumentType, DocumentSpec>,
}

impl DocumentRegistry {
    /// Build a registry from explicit entries. Later entries for the same
    /// type replace earlier ones.
    pub fn new(entries: impl IntoIterator<Item = (DocumentType, DocumentSpec)>) -> Self {
        Self {
            specs: entries.into_iter().collect(),
        }
    }

    /// The three supported document types.
    pub fn builtin() -> Self {
        Self::new([
            (
                DocumentType::Aadhar,
                DocumentSpec::new(
                    AADHAR_PROMPT,
                    vec![FieldId::Name, FieldId::Dob, FieldId::Gender, FieldId::Aadhar],
                ),
            ),
            (
                DocumentType::Pan,
                DocumentSpec::new(PAN_PROMPT, vec![FieldId::Name, FieldId::Pan]),
            ),
            (
                DocumentType::Marksheet,
                DocumentSpec::new(
                    MARKSHEET_PROMPT,
                    vec![
                        FieldId::Name,
                        FieldId::Semester,
                        FieldId::RollNumber,
                        FieldId::Cgpa,
                        FieldId::Sgpa,
                    ],
                ),
            ),
        ])
    }

    pub fn spec_for(&self, doc_type: DocumentType) -> Result<&DocumentSpec, DocVerifyError> {
        self.specs
            .get(&doc_type)
            .ok_or_else(|| DocVerifyError::UnknownDocumentType(doc_type.to_string()))
    }

    pub fn prompt_for(&self, doc_type: DocumentType) -> Result<&str, DocVerifyError> {
        Ok(&self.spec_for(doc_type)?.prompt)
    }

    pub fn fields_for(&self, doc_type: DocumentType) -> Result<&[FieldId], DocVerifyError> {
        Ok(&self.spec_for(doc_type)?.fields)
    }

    /// Resolve a request's type name to a registered document type.
    pub fn resolve(&self, name: &str) -> Result<DocumentType, DocVerifyError> {
        let doc_type: DocumentType = name.parse()?;
        self.spec_for(doc_type)?;
        Ok(doc_type)
    }
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_field_lists_are_ordered() {
        let registry = DocumentRegistry::builtin();
        assert_eq!(
            registry.fields_for(DocumentType::Aadhar).unwrap(),
            &[FieldId::Name, FieldId::Dob, FieldId::Gender, FieldId::Aadhar]
        );
        assert_eq!(
            registry.fields_for(DocumentType::Pan).unwrap(),
            &[FieldId::Name, FieldId::Pan]
        );
        assert_eq!(
            registry.fields_for(DocumentType::Marksheet).unwrap(),
            &[
                FieldId::Name,
                FieldId::Semester,
                FieldId::RollNumber,
                FieldId::Cgpa,
                FieldId::Sgpa
            ]
        );
    }

    #[test]
    fn prompts_name_every_field_key() {
        let registry = DocumentRegistry::builtin();
        for doc_type in DocumentType::ALL {
            let prompt = registry.prompt_for(doc_type).unwrap();
            assert!(prompt.contains("JSON"));
            for field in registry.fields_for(doc_type).unwrap() {
                assert!(prompt.contains(field.as_str()), "{doc_type} prompt lacks {field}");
            }
        }
    }

    #[test]
    fn missing_entry_is_unknown_type() {
        let registry = DocumentRegistry::new([(
            DocumentType::Pan,
            DocumentSpec::new("pan only", vec![FieldId::Pan]),
        )]);
        assert_eq!(registry.fields_for(DocumentType::Pan).unwrap(), &[FieldId::Pan]);
        assert!(matches!(
            registry.prompt_for(DocumentType::Aadhar),
            Err(DocVerifyError::UnknownDocumentType(t)) if t == "aadhar"
        ));
        assert!(registry.resolve("marksheet").is_err());
        assert_eq!(registry.resolve("pan").unwrap(), DocumentType::Pan);
    }
}
