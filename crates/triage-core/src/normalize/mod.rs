//! Text normalization for defect reports.
//!
//! Turns raw title/body text into a stream of canonical lemmas used both as
//! classifier input and for tag matching.
//!
//! Pipeline:
//! 1. Lower-case, expand contractions
//! 2. Fold product and language phrases (`vs code` -> `product_vscode`)
//! 3. Fold versions, hotkeys, hex literals and file paths to single tokens
//! 4. Tokenize on `[a-z0-9_]+`
//! 5. Drop stop words (domain signal words are kept), lemmatize, drop
//!    single-character non-numeric tokens
//! 6. Merge product token sequences left split by punctuation

pub mod lemma;
pub mod lexicon;

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, NoExpand, Regex};
use serde::{Deserialize, Serialize};

use lexicon::{is_stop_word, CONTRACTIONS, LANGUAGE_PHRASES, PRODUCT_PHRASES, TOKEN_PHRASES};

static RE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bv?\d+(?:\.\d+)+\b").expect("Invalid regex"));

static RE_HOTKEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:ctrl|alt|shift|cmd|meta)(?:\+[a-z0-9]+)+\b").expect("Invalid regex")
});

static RE_HEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b0x[a-f0-9]+\b").expect("Invalid regex"));

static RE_FILE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[a-z]:\\[^ \n\t]*|[a-z0-9._/-]+\.[a-z]{2,4}\b").expect("Invalid regex")
});

/// Product and language phrases, each anchored so it only matches as a whole
/// word: `vs code` folds but `tvs code` does not.
static PHRASE_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    PRODUCT_PHRASES
        .iter()
        .chain(LANGUAGE_PHRASES)
        .map(|&(phrase, folded)| {
            let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
            let lead = if phrase.starts_with(is_word) { r"\b" } else { r"\B" };
            let trail = if phrase.ends_with(is_word) { r"\b" } else { "" };
            let pattern = format!("{lead}{}{trail}", regex::escape(phrase));
            (Regex::new(&pattern).expect("Invalid regex"), folded)
        })
        .collect()
});

static RE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9_]+").expect("Invalid regex"));

/// Ordered canonical tokens produced by [`normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedText {
    tokens: Vec<String>,
}

impl NormalizedText {
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    pub fn token_set(&self) -> HashSet<&str> {
        self.tokens.iter().map(String::as_str).collect()
    }
}

/// Tokens joined by single spaces; this is the classifier input.
impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}

/// Normalize `text` into canonical lemmas.
///
/// Pure and deterministic. Normalizing the space-joined output again yields
/// the same tokens.
pub fn normalize(text: &str) -> NormalizedText {
    if text.trim().is_empty() {
        return NormalizedText::default();
    }

    let mut s = text.to_lowercase().replace('\u{2019}', "'");
    for &(from, to) in CONTRACTIONS {
        if s.contains(from) {
            s = s.replace(from, to);
        }
    }
    for (re, folded) in PHRASE_RES.iter() {
        if re.is_match(&s) {
            s = re.replace_all(&s, NoExpand(*folded)).into_owned();
        }
    }

    let s = RE_VERSION.replace_all(&s, |caps: &Captures| {
        format!("version_{}", caps[0].trim_start_matches('v').replace('.', "_"))
    });
    let s = RE_HOTKEY.replace_all(&s, |caps: &Captures| {
        format!("hotkey_{}", caps[0].replace('+', "_"))
    });
    let s = RE_HEX.replace_all(&s, "hex_code");
    let s = RE_FILE_PATH.replace_all(&s, "file_path");

    let tokens: Vec<String> = RE_TOKEN
        .find_iter(&s)
        .map(|m| m.as_str())
        .filter(|t| !is_stop_word(t))
        .map(lemma::lemmatize)
        .filter(|l| !is_stop_word(l))
        .filter(|l| l.len() > 1 || l.bytes().all(|c| c.is_ascii_digit()))
        .collect();

    NormalizedText {
        tokens: merge_phrases(tokens),
    }
}

/// Collapse known multi-token product names into their folded token.
fn merge_phrases(tokens: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    'outer: while i < tokens.len() {
        for (phrase, folded) in TOKEN_PHRASES {
            let end = i + phrase.len();
            if end <= tokens.len() && tokens[i..end].iter().zip(phrase.iter()).all(|(a, b)| a == b)
            {
                out.push(folded.to_string());
                i = end;
                continue 'outer;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        normalize(text).into_tokens()
    }

    #[test]
    fn empty_input_yields_empty_sequence() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \n\t").is_empty());
    }

    #[test]
    fn negation_is_retained() {
        assert_eq!(tokens("this is not working"), vec!["not", "work"]);
        assert!(normalize("It doesn't open").contains("not"));
        assert!(normalize("I can't save").contains("not"));
    }

    #[test]
    fn versions_fold_to_single_token() {
        assert!(normalize("upgraded to 1.10.1").contains("version_1_10_1"));
        assert!(normalize("Broken since v2.0").contains("version_2_0"));
    }

    #[test]
    fn hotkeys_fold_to_single_token() {
        assert!(normalize("press ctrl+shift+p").contains("hotkey_ctrl_shift_p"));
        assert!(normalize("Cmd+K does nothing").contains("hotkey_cmd_k"));
    }

    #[test]
    fn products_and_languages_are_protected() {
        let t = tokens("VS Code crashes with C++ and Node.js on .NET");
        assert_eq!(
            t,
            vec!["product_vscode", "crash", "lang_cpp", "tech_nodejs", "framework_dotnet"]
        );
        assert!(normalize("Visual Studio Code hangs").contains("product_vscode"));
    }

    #[test]
    fn phrases_fold_only_on_word_boundaries() {
        assert_eq!(tokens("tvs code"), vec!["tvs", "code"]);
        assert!(!normalize("vs codec").contains("product_vscode"));
        assert!(!normalize("abc++ parser").contains("lang_cpp"));
        assert!(!normalize("the .network tab").contains("framework_dotnet"));
        assert!(!normalize("migrate to node.jsx").contains("tech_nodejs"));

        assert!(normalize(".NET 8 build fails").contains("framework_dotnet"));
        assert!(normalize("(vs code) hangs").contains("product_vscode"));
        assert!(normalize("crash in c++").contains("lang_cpp"));
        assert!(normalize("c#, f# and vue.js").contains("lang_fsharp"));
    }

    #[test]
    fn hex_and_paths_fold() {
        let t = tokens("segfault at 0x1F in src/main.rs");
        assert!(t.contains(&"hex_code".to_string()));
        assert!(t.contains(&"file_path".to_string()));
        assert!(normalize(r"cannot open C:\Users\me\app.log").contains("file_path"));
    }

    #[test]
    fn inflections_collapse() {
        assert_eq!(
            tokens("Application crashes when clicking button"),
            vec!["application", "crash", "click", "button"]
        );
    }

    #[test]
    fn single_letters_dropped_digits_kept() {
        let t = tokens("x y 7 error 500");
        assert_eq!(t, vec!["7", "error", "500"]);
    }

    #[test]
    fn normalization_is_idempotent_on_samples() {
        for text in [
            "The terminal is frozen after upgrading to 1.85.0!",
            "press ctrl+shift+p and nothing happens",
            "Copilot agent failed to predict gpt models",
            "vs. code settings aren't saved in C:\\Users\\dev\\settings.json",
            "Backend API server returned 500 error on sql query",
            "Buttons are not showing; the UI is broken",
        ] {
            let once = normalize(text);
            let twice = normalize(&once.to_string());
            assert_eq!(once, twice, "not idempotent for {text:?}");
        }
    }
}
