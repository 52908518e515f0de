//! Field questions keyed by (field, language).

use std::collections::HashMap;

use super::language::Language;

/// Questions in `[en, hi, gu]` order.
const BUILTIN_PROMPTS: &[(&str, [&str; 3])] = &[
    (
        "name",
        [
            "What is your full name?",
            "आपका पूरा नाम क्या है?",
            "તમારું પૂરું નામ શું છે?",
        ],
    ),
    (
        "fatherName",
        [
            "What is your father's name?",
            "आपके पिता का नाम क्या है?",
            "તમારા પિતાનું નામ શું છે?",
        ],
    ),
    (
        "husbandName",
        [
            "What was your husband's name?",
            "आपके पति का नाम क्या था?",
            "તમારા પતિનું નામ શું હતું?",
        ],
    ),
    (
        "motherName",
        [
            "What is your mother's name?",
            "आपकी माता का नाम क्या है?",
            "તમારી માતાનું નામ શું છે?",
        ],
    ),
    (
        "daughterName",
        [
            "What is your daughter's name?",
            "आपकी बेटी का नाम क्या है?",
            "તમારી દીકરીનું નામ શું છે?",
        ],
    ),
    (
        "daughterDOB",
        [
            "What is your daughter's date of birth?",
            "आपकी बेटी की जन्मतिथि क्या है?",
            "તમારી દીકરીની જન્મ તારીખ શું છે?",
        ],
    ),
    (
        "aadhar",
        [
            "Please tell me your 12-digit Aadhaar number.",
            "कृपया अपना 12 अंकों का आधार नंबर बताइए।",
            "કૃપા કરીને તમારો 12 અંકનો આધાર નંબર જણાવો.",
        ],
    ),
    (
        "mobile",
        [
            "What is your 10-digit mobile number?",
            "आपका 10 अंकों का मोबाइल नंबर क्या है?",
            "તમારો 10 અંકનો મોબાઇલ નંબર શું છે?",
        ],
    ),
    (
        "bankAccount",
        [
            "What is your bank account number?",
            "आपका बैंक खाता नंबर क्या है?",
            "તમારો બેંક ખાતા નંબર શું છે?",
        ],
    ),
    (
        "ifsc",
        [
            "What is your bank's IFSC code?",
            "आपके बैंक का IFSC कोड क्या है?",
            "તમારી બેંકનો IFSC કોડ શું છે?",
        ],
    ),
    (
        "address",
        [
            "What is your full address?",
            "आपका पूरा पता क्या है?",
            "તમારું પૂરું સરનામું શું છે?",
        ],
    ),
    (
        "currentAddress",
        [
            "Where do you live at present? Please tell me your current address.",
            "आप अभी कहाँ रहते हैं? अपना वर्तमान पता बताइए।",
            "તમે હાલમાં ક્યાં રહો છો? તમારું હાલનું સરનામું જણાવો.",
        ],
    ),
    (
        "landArea",
        [
            "How much land do you have, in hectares or acres?",
            "आपके पास कितनी ज़मीन है, हेक्टेयर या एकड़ में?",
            "તમારી પાસે કેટલી જમીન છે, હેક્ટર કે એકરમાં?",
        ],
    ),
    (
        "deathCertNo",
        [
            "What is the death certificate number?",
            "मृत्यु प्रमाण पत्र का नंबर क्या है?",
            "મરણ પ્રમાણપત્રનો નંબર શું છે?",
        ],
    ),
    (
        "familyMembers",
        [
            "How many members are in your family?",
            "आपके परिवार में कितने सदस्य हैं?",
            "તમારા પરિવારમાં કેટલા સભ્યો છે?",
        ],
    ),
    (
        "income",
        [
            "What is your family's annual income in rupees?",
            "आपके परिवार की सालाना आय कितने रुपये है?",
            "તમારા પરિવારની વાર્ષિક આવક કેટલા રૂપિયા છે?",
        ],
    ),
    (
        "cardType",
        [
            "Which ration card do you need: APL, BPL or Antyodaya?",
            "आपको कौन सा राशन कार्ड चाहिए: APL, BPL या अंत्योदय?",
            "તમારે કયું રેશન કાર્ડ જોઈએ: APL, BPL કે અંત્યોદય?",
        ],
    ),
    (
        "existingDiseases",
        [
            "Please name any existing illness in the family, or say none.",
            "परिवार में किसी पुरानी बीमारी का नाम बताइए, या 'कोई नहीं' कहिए।",
            "પરિવારમાં કોઈ જૂની બીમારી હોય તો તેનું નામ કહો, અથવા 'કોઈ નહીં' કહો.",
        ],
    ),
    (
        "plotSize",
        [
            "What is the size of your plot in square metres?",
            "आपके प्लॉट का आकार कितने वर्ग मीटर है?",
            "તમારા પ્લોટનું કદ કેટલા ચોરસ મીટર છે?",
        ],
    ),
    (
        "category",
        [
            "Which category do you belong to: General, OBC, SC or ST?",
            "आप किस वर्ग से हैं: सामान्य, ओबीसी, एससी या एसटी?",
            "તમે કયા વર્ગના છો: સામાન્ય, ઓબીસી, એસસી કે એસટી?",
        ],
    ),
    (
        "bplNumber",
        [
            "What is your BPL card number?",
            "आपका बीपीएल कार्ड नंबर क्या है?",
            "તમારો બીપીએલ કાર્ડ નંબર શું છે?",
        ],
    ),
    (
        "cropType",
        [
            "Which crops do you grow?",
            "आप कौन सी फसलें उगाते हैं?",
            "તમે કયા પાક ઉગાડો છો?",
        ],
    ),
];

/// Lookup table of field questions.
#[derive(Debug, Clone, Default)]
pub struct FieldPrompts {
    prompts: HashMap<(String, Language), String>,
}

impl FieldPrompts {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in question set covering every field of the built-in forms.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (field, questions) in BUILTIN_PROMPTS {
            for (language, question) in Language::ALL.into_iter().zip(questions) {
                table.insert(field, language, question);
            }
        }
        table
    }

    pub fn insert(&mut self, field: &str, language: Language, question: &str) {
        self.prompts
            .insert((field.to_string(), language), question.to_string());
    }

    pub fn get(&self, field: &str, language: Language) -> Option<&str> {
        self.prompts
            .get(&(field.to_string(), language))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_every_language() {
        let table = FieldPrompts::builtin();
        assert_eq!(table.len(), BUILTIN_PROMPTS.len() * Language::ALL.len());
        assert_eq!(
            table.get("mobile", Language::Hi),
            Some("आपका 10 अंकों का मोबाइल नंबर क्या है?")
        );
        assert_eq!(table.get("name", Language::En), Some("What is your full name?"));
    }

    #[test]
    fn unknown_field_has_no_prompt() {
        assert!(FieldPrompts::builtin().get("shoeSize", Language::En).is_none());
    }
}
