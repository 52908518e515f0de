//! Form definitions: the ordered field layout of each paper form.

use serde::{Deserialize, Serialize};

use super::language::Language;

/// A string with one rendering per supported language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    pub hi: String,
    pub gu: String,
}

impl LocalizedText {
    pub fn new(en: &str, hi: &str, gu: &str) -> Self {
        Self {
            en: en.to_string(),
            hi: hi.to_string(),
            gu: gu.to_string(),
        }
    }

    /// Same text in every language (proper nouns, tests).
    pub fn uniform(text: &str) -> Self {
        Self::new(text, text, text)
    }

    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::En => &self.en,
            Language::Hi => &self.hi,
            Language::Gu => &self.gu,
        }
    }
}

/// A government form: its id and the field keys in the exact order they
/// appear on the printed form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDefinition {
    pub id: String,
    pub name: LocalizedText,
    pub fields: Vec<String>,
}

impl FormDefinition {
    pub fn new(id: &str, name: LocalizedText, fields: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f == key)
    }
}

/// The schemes supported out of the box.
pub fn builtin_forms() -> Vec<FormDefinition> {
    vec![
        FormDefinition::new(
            "pm-kisan",
            LocalizedText::new(
                "PM Kisan Samman Nidhi",
                "पीएम किसान सम्मान निधि",
                "પીએમ કિસાન સન્માન નિધિ",
            ),
            &[
                "name",
                "fatherName",
                "aadhar",
                "mobile",
                "bankAccount",
                "ifsc",
                "address",
                "landArea",
            ],
        ),
        FormDefinition::new(
            "vidhva-sahay",
            LocalizedText::new("Vidhva Sahay Yojana", "विधवा सहाय योजना", "વિધવા સહાય યોજના"),
            &[
                "name",
                "aadhar",
                "mobile",
                "husbandName",
                "deathCertNo",
                "bankAccount",
                "ifsc",
                "address",
            ],
        ),
        FormDefinition::new(
            "ration-card",
            LocalizedText::new("Ration Card Application", "राशन कार्ड आवेदन", "રેશન કાર્ડ અરજી"),
            &[
                "name",
                "aadhar",
                "mobile",
                "familyMembers",
                "income",
                "address",
                "cardType",
            ],
        ),
        FormDefinition::new(
            "ayushman-bharat",
            LocalizedText::new("Ayushman Bharat", "आयुष्मान भारत", "આયુષ્માન ભારત"),
            &[
                "name",
                "aadhar",
                "mobile",
                "familyMembers",
                "income",
                "address",
                "existingDiseases",
            ],
        ),
        FormDefinition::new(
            "pm-awas",
            LocalizedText::new("PM Awas Yojana", "पीएम आवास योजना", "પીએમ આવાસ યોજના"),
            &[
                "name",
                "fatherName",
                "aadhar",
                "mobile",
                "income",
                "currentAddress",
                "plotSize",
                "category",
            ],
        ),
        FormDefinition::new(
            "ujjwala",
            LocalizedText::new("Ujjwala Yojana", "उज्ज्वला योजना", "ઉજ્જ્વલા યોજના"),
            &[
                "name",
                "aadhar",
                "mobile",
                "address",
                "bankAccount",
                "ifsc",
                "bplNumber",
            ],
        ),
        FormDefinition::new(
            "sukanya-samriddhi",
            LocalizedText::new("Sukanya Samriddhi", "सुकन्या समृद्धि", "સુકન્યા સમૃદ્ધિ"),
            &[
                "name",
                "fatherName",
                "motherName",
                "daughterName",
                "daughterDOB",
                "aadhar",
                "mobile",
                "address",
                "bankAccount",
            ],
        ),
        FormDefinition::new(
            "kisan-credit",
            LocalizedText::new("Kisan Credit Card", "किसान क्रेडिट कार्ड", "કિસાન ક્રેડિટ કાર્ડ"),
            &[
                "name",
                "fatherName",
                "aadhar",
                "mobile",
                "landArea",
                "cropType",
                "bankAccount",
                "ifsc",
                "address",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localized_text_per_language() {
        let text = LocalizedText::new("Ration", "राशन", "રેશન");
        assert_eq!(text.get(Language::En), "Ration");
        assert_eq!(text.get(Language::Hi), "राशन");
        assert_eq!(text.get(Language::Gu), "રેશન");
    }

    #[test]
    fn has_field() {
        let form = FormDefinition::new("f", LocalizedText::uniform("F"), &["name", "mobile"]);
        assert!(form.has_field("mobile"));
        assert!(!form.has_field("aadhar"));
        assert_eq!(form.field_count(), 2);
    }

    #[test]
    fn builtin_ids_are_kebab_case() {
        for form in builtin_forms() {
            assert!(
                form.id
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c == '-'),
                "{} is not kebab-case",
                form.id
            );
        }
    }
}
