//! Fixed vocabulary tables used by the normalizer.

/// English stop words. Tokens here are dropped unless listed in
/// [`DOMAIN_KEEP`].
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
    "just", "don", "should", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren",
    "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "ma", "mightn", "mustn",
    "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn",
];

/// Negations and defect-signal words that are never removed.
pub const DOMAIN_KEEP: &[&str] = &[
    "not", "no", "never", "none", "error", "fail", "failed", "failure", "bug", "crash",
    "issue", "exception", "slow", "lag", "freeze", "frozen",
];

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token) && !DOMAIN_KEEP.contains(&token)
}

/// Product and technology phrases, folded before tokenization so they
/// survive as single tokens. Applied in order.
pub const PRODUCT_PHRASES: &[(&str, &str)] = &[
    ("visual studio code", "product_vscode"),
    ("vs code", "product_vscode"),
    ("node.js", "tech_nodejs"),
    ("vue.js", "tech_vuejs"),
];

/// Language and framework names containing symbols the tokenizer would drop.
pub const LANGUAGE_PHRASES: &[(&str, &str)] = &[
    ("c++", "lang_cpp"),
    ("c#", "lang_csharp"),
    ("f#", "lang_fsharp"),
    (".net", "framework_dotnet"),
];

/// Token sequences that fold to a single product token after filtering.
pub const TOKEN_PHRASES: &[(&[&str], &str)] = &[
    (&["visual", "studio", "code"], "product_vscode"),
    (&["vs", "code"], "product_vscode"),
];

/// Contractions expanded before tokenization so the negation stays a token.
pub const CONTRACTIONS: &[(&str, &str)] = &[
    ("won't", "will not"),
    ("can't", "can not"),
    ("cannot", "can not"),
    ("n't", " not"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_words_are_never_stop_words() {
        for word in DOMAIN_KEEP {
            assert!(!is_stop_word(word), "{word} must be kept");
        }
        assert!(is_stop_word("the"));
        assert!(is_stop_word("is"));
    }
}
