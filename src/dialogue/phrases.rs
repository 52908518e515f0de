//! Fixed assistant phrases, per language.

use crate::catalog::Language;

pub fn greeting(language: Language, form_name: &str) -> String {
    match language {
        Language::En => format!("Namaste! Let us fill the {form_name} form together."),
        Language::Hi => format!("नमस्ते! आइए मिलकर {form_name} का फॉर्म भरते हैं।"),
        Language::Gu => format!("નમસ્તે! ચાલો સાથે મળીને {form_name} નું ફોર્મ ભરીએ."),
    }
}

pub fn triage_intro(language: Language) -> &'static str {
    match language {
        Language::En => {
            "Namaste! Tell me about your problem and I will find the right government scheme for you."
        }
        Language::Hi => "नमस्ते! अपनी समस्या बताइए, मैं आपके लिए सही सरकारी योजना ढूंढूंगा।",
        Language::Gu => "નમસ્તે! તમારી સમસ્યા જણાવો, હું તમારા માટે યોગ્ય સરકારી યોજના શોધીશ.",
    }
}

pub fn triage_retry(language: Language) -> &'static str {
    match language {
        Language::En => "Sorry, I did not understand. Please describe your problem again.",
        Language::Hi => "माफ़ कीजिए, मैं समझ नहीं पाया। कृपया अपनी समस्या फिर से बताइए।",
        Language::Gu => "માફ કરશો, હું સમજી શક્યો નહીં. કૃપા કરીને તમારી સમસ્યા ફરીથી જણાવો.",
    }
}

pub fn scheme_selected(language: Language, form_name: &str) -> String {
    match language {
        Language::En => format!("The {form_name} scheme looks right for you. Let us fill the form."),
        Language::Hi => format!("आपके लिए {form_name} योजना सही लगती है। चलिए फॉर्म भरते हैं।"),
        Language::Gu => format!("તમારા માટે {form_name} યોજના યોગ્ય લાગે છે. ચાલો ફોર્મ ભરીએ."),
    }
}

/// Acknowledge a recorded value.
pub fn ack(language: Language, value: &str) -> String {
    match language {
        Language::En => format!("Got it, {value}."),
        Language::Hi => format!("ठीक है, {value}।"),
        Language::Gu => format!("સરસ, {value}."),
    }
}

pub fn retry(language: Language) -> &'static str {
    match language {
        Language::En => "Sorry, I did not catch that.",
        Language::Hi => "माफ़ कीजिए, मैं सुन नहीं पाया।",
        Language::Gu => "માફ કરશો, હું સાંભળી શક્યો નહીં.",
    }
}

pub fn completion(language: Language, value: &str) -> String {
    match language {
        Language::En => format!(
            "Got it, {value}. All details are collected. Your form is being prepared."
        ),
        Language::Hi => {
            format!("ठीक है, {value}। सारी जानकारी मिल गई। आपका फॉर्म तैयार हो रहा है।")
        }
        Language::Gu => {
            format!("સરસ, {value}. બધી માહિતી મળી ગઈ. તમારું ફોર્મ તૈયાર થઈ રહ્યું છે.")
        }
    }
}

pub fn chat_unavailable(language: Language) -> &'static str {
    match language {
        Language::En => "Sorry, I cannot answer that right now.",
        Language::Hi => "माफ़ कीजिए, अभी मैं इसका जवाब नहीं दे सकता।",
        Language::Gu => "માફ કરશો, હમણાં હું તેનો જવાબ આપી શકતો નથી.",
    }
}

pub fn language_switched(language: Language) -> &'static str {
    match language {
        Language::En => "Okay, let us continue in English.",
        Language::Hi => "ठीक है, अब हम हिंदी में बात करेंगे।",
        Language::Gu => "સારું, હવે આપણે ગુજરાતીમાં વાત કરીશું.",
    }
}
