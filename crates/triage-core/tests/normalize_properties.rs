//! Properties of the text normalizer.

use proptest::prelude::*;
use triage_core::normalize;

fn renormalize(text: &str) -> Vec<String> {
    normalize(&normalize(text).to_string()).into_tokens()
}

#[test]
fn realistic_reports_are_stable_under_renormalization() {
    let reports = [
        "Application crashes when clicking button",
        "VS Code won't start after updating to v1.85.2",
        "Terminal freezes on Ctrl+Shift+P in C:\\Users\\dev\\project",
        "Copilot suggestions are slow; error 0x80070005 in src/main.rs",
        "Node.js and C# debugging can't attach on .NET 8",
        "The editor's minimap isn't rendering the visual studio code theme",
    ];
    for report in reports {
        let first = normalize(report).into_tokens();
        assert_eq!(renormalize(report), first, "unstable for {report:?}");
    }
}

#[test]
fn negation_survives_normalization() {
    let tokens = normalize("Extension doesn't load and can't be disabled").into_tokens();
    assert_eq!(tokens.iter().filter(|t| t.as_str() == "not").count(), 2);
}

#[test]
fn blank_input_yields_no_tokens() {
    assert!(normalize("").is_empty());
    assert!(normalize("   \n\t").is_empty());
    assert!(normalize("the and of a").is_empty());
}

proptest! {
    #[test]
    fn normalization_is_idempotent(words in prop::collection::vec("[a-z]{1,12}", 0..12)) {
        let text = words.join(" ");
        let first = normalize(&text).into_tokens();
        prop_assert_eq!(renormalize(&text), first);
    }

    #[test]
    fn tokens_are_lowercase_word_characters(text in "[ -~]{0,80}") {
        for token in normalize(&text).tokens() {
            prop_assert!(token.bytes().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == b'_'));
            prop_assert!(token.len() > 1 || token.bytes().all(|c| c.is_ascii_digit()));
        }
    }
}
