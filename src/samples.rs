//! Sample worksheet content for testing and demonstration.
//!
//! Each sample exercises a different branch of the layout: a short verse
//! traced in full, a long verse traced from an excerpt, and cursive tracing.

use crate::content::WorksheetContent;

/// Short verse; the supplied excerpt is ignored and the full verse traced.
pub fn john_3_16() -> WorksheetContent {
    WorksheetContent {
        reference: "John 3:16".to_string(),
        version: "esv".to_string(),
        full_text: "For God so loved the world, that he gave his only Son, that whoever \
                    believes in him should not perish but have eternal life."
            .to_string(),
        traceable_text: Some("God so loved the world".to_string()),
        handwriting_line_count: 3,
        reflection_prompt: "How can you share God’s love with someone this week?".to_string(),
        image_prompt: "A big heart wrapped around the whole world".to_string(),
        cursive: false,
    }
}

/// Long verse with a 20-word excerpt for tracing.
pub fn romans_8_38_39() -> WorksheetContent {
    WorksheetContent {
        reference: "Romans 8:38-39".to_string(),
        version: "esv".to_string(),
        full_text: "For I am sure that neither death nor life, nor angels nor rulers, nor \
                    things present nor things to come, nor powers, nor height nor depth, nor \
                    anything else in all creation, will be able to separate us from the love \
                    of God in Christ Jesus our Lord."
            .to_string(),
        traceable_text: Some(
            "Nothing in all creation will be able to separate us from the love of God in \
             Christ Jesus our Lord."
                .to_string(),
        ),
        handwriting_line_count: 3,
        reflection_prompt: "What are you worried about that God’s love is bigger than?"
            .to_string(),
        image_prompt: "A child holding hands with Jesus under a starry sky".to_string(),
        cursive: false,
    }
}

/// Cursive tracing.
pub fn psalm_23_1() -> WorksheetContent {
    WorksheetContent {
        reference: "Psalm 23:1".to_string(),
        version: "kjv".to_string(),
        full_text: "The LORD is my shepherd; I shall not want.".to_string(),
        traceable_text: None,
        handwriting_line_count: 2,
        reflection_prompt: "how does a shepherd take care of his sheep?".to_string(),
        image_prompt: "a shepherd resting with his sheep by still waters".to_string(),
        cursive: true,
    }
}

/// All samples.
pub fn all() -> Vec<(&'static str, WorksheetContent)> {
    vec![
        ("john_3_16", john_3_16()),
        ("romans_8_38_39", romans_8_38_39()),
        ("psalm_23_1", psalm_23_1()),
    ]
}
