//! Rule-based lemmatization.
//!
//! Each token is tagged with a coarse part of speech derived from its shape,
//! then reduced with suffix rules for that part of speech. Irregular forms
//! come from fixed tables. The result is always a fixed point: lemmatizing a
//! lemma returns it unchanged.

/// Coarse part of speech. Unrecognised shapes default to `Noun`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pos {
    Noun,
    Verb,
    Adjective,
    Adverb,
}

/// Words returned as-is whatever their shape.
const INVARIANT: &[&str] = &[
    "nothing", "something", "anything", "everything", "morning", "evening", "ceiling",
    "setting", "string", "thing", "embed", "hundred", "always", "perhaps", "sometimes",
    "towards", "afterwards", "besides", "whereas", "news", "series", "species", "alias",
    "canvas", "atlas", "lens", "https", "windows", "bias", "yes",
];

const IRREGULAR_VERBS: &[(&str, &str)] = &[
    ("ran", "run"),
    ("broke", "break"),
    ("broken", "break"),
    ("froze", "freeze"),
    ("frozen", "freeze"),
    ("hung", "hang"),
    ("went", "go"),
    ("gone", "go"),
    ("goes", "go"),
    ("made", "make"),
    ("got", "get"),
    ("gotten", "get"),
    ("shown", "show"),
    ("thrown", "throw"),
    ("threw", "throw"),
    ("wrote", "write"),
    ("written", "write"),
    ("took", "take"),
    ("taken", "take"),
    ("gave", "give"),
    ("given", "give"),
    ("saw", "see"),
    ("seen", "see"),
    ("built", "build"),
    ("sent", "send"),
    ("lost", "lose"),
    ("found", "find"),
    ("began", "begin"),
    ("begun", "begin"),
    ("stuck", "stick"),
    ("kept", "keep"),
    ("came", "come"),
    ("coming", "come"),
    ("became", "become"),
    ("becoming", "become"),
    ("changing", "change"),
    ("changed", "change"),
    ("creating", "create"),
    ("created", "create"),
    ("deleting", "delete"),
    ("deleted", "delete"),
    ("completing", "complete"),
    ("completed", "complete"),
    ("pasting", "paste"),
    ("pasted", "paste"),
    ("tried", "try"),
    ("died", "die"),
    ("dying", "die"),
    ("tied", "tie"),
    ("tying", "tie"),
    ("lied", "lie"),
    ("lying", "lie"),
];

const IRREGULAR_NOUNS: &[(&str, &str)] = &[
    ("children", "child"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("analyses", "analysis"),
    ("caches", "cache"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
];

/// Comparative and superlative forms and their base adjective.
const ADJECTIVE_FORMS: &[(&str, &str)] = &[
    ("better", "good"),
    ("best", "good"),
    ("worse", "bad"),
    ("worst", "bad"),
    ("faster", "fast"),
    ("fastest", "fast"),
    ("slower", "slow"),
    ("slowest", "slow"),
    ("larger", "large"),
    ("largest", "large"),
    ("bigger", "big"),
    ("biggest", "big"),
    ("smaller", "small"),
    ("smallest", "small"),
    ("higher", "high"),
    ("highest", "high"),
    ("lower", "low"),
    ("lowest", "low"),
    ("longer", "long"),
    ("newer", "new"),
    ("newest", "new"),
    ("older", "old"),
    ("easier", "easy"),
];

fn lookup(table: &[(&str, &'static str)], word: &str) -> Option<&'static str> {
    table.iter().find(|(from, _)| *from == word).map(|(_, to)| *to)
}

fn is_vowel(c: u8) -> bool {
    matches!(c, b'a' | b'e' | b'i' | b'o' | b'u')
}

fn has_vowel(s: &str) -> bool {
    s.bytes().any(|c| is_vowel(c) || c == b'y')
}

/// Part of speech from the word's shape alone.
pub fn pos_of(word: &str) -> Pos {
    if lookup(ADJECTIVE_FORMS, word).is_some() {
        Pos::Adjective
    } else if lookup(IRREGULAR_VERBS, word).is_some()
        || (word.len() > 4 && word.ends_with("ing"))
        || (word.len() > 3 && word.ends_with("ed"))
    {
        Pos::Verb
    } else if word.len() > 4 && word.ends_with("ly") {
        Pos::Adverb
    } else {
        Pos::Noun
    }
}

/// Lemmatize `word` using the part of speech derived from its shape.
///
/// Tokens containing digits or `_` are canonical already and pass through.
pub fn lemmatize(word: &str) -> String {
    if word.is_empty()
        || word.bytes().any(|c| c.is_ascii_digit() || c == b'_')
        || !word.is_ascii()
    {
        return word.to_string();
    }
    let once = reduce(word);
    if once != word && reduce(&once) != once {
        return word.to_string();
    }
    once
}

fn reduce(word: &str) -> String {
    if INVARIANT.contains(&word) {
        return word.to_string();
    }
    match pos_of(word) {
        Pos::Adjective => lookup(ADJECTIVE_FORMS, word).unwrap_or(word).to_string(),
        Pos::Verb => reduce_verb(word),
        Pos::Noun => reduce_noun(word),
        Pos::Adverb => word.to_string(),
    }
}

fn reduce_verb(word: &str) -> String {
    if let Some(base) = lookup(IRREGULAR_VERBS, word) {
        return base.to_string();
    }
    if let Some(stem) = word.strip_suffix("ing") {
        if stem.len() >= 2 && has_vowel(stem) {
            return repair_stem(stem);
        }
        return word.to_string();
    }
    if word.ends_with("eed") {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ied") {
        if stem.len() >= 2 {
            return format!("{stem}y");
        }
    }
    if let Some(stem) = word.strip_suffix("ed") {
        if stem.len() >= 2 && has_vowel(stem) {
            return repair_stem(stem);
        }
    }
    word.to_string()
}

/// Undo consonant doubling or restore a dropped final `e` on a verb stem.
fn repair_stem(stem: &str) -> String {
    let b = stem.as_bytes();
    let n = b.len();
    let last = b[n - 1];
    let prev = b[n - 2];

    if n > 3 && last == prev && !is_vowel(last) && !matches!(last, b'l' | b's' | b'z') {
        return stem[..n - 1].to_string();
    }
    if needs_final_e(stem) {
        return format!("{stem}e");
    }
    stem.to_string()
}

fn needs_final_e(stem: &str) -> bool {
    const ALWAYS: &[&str] = &[
        "iz", "ez", "us", "os", "v", "rs", "ws", "dl", "bl", "pl", "gl", "uc", "rc", "rg", "yp",
    ];
    let b = stem.as_bytes();
    let before = |k: usize| -> Option<u8> { b.len().checked_sub(k + 1).map(|i| b[i]) };
    let consonant_before = |k: usize| before(k).map(|c| !is_vowel(c)).unwrap_or(false);
    let vowel_before = |k: usize| before(k).map(is_vowel).unwrap_or(false);

    // focus, discus
    if stem.ends_with("cus") {
        return false;
    }
    // release, raise; not alias or bias
    if stem.ends_with('s') && !stem.ends_with("ias") && vowel_before(1) && vowel_before(2) {
        return true;
    }
    if ALWAYS.iter().any(|end| stem.ends_with(end)) {
        return true;
    }

    if stem.ends_with("at") {
        return !matches!(before(2), Some(b'e' | b'o' | b'a'));
    }
    if stem.ends_with("as") {
        return consonant_before(2);
    }
    if stem.ends_with("ut") {
        return !stem.ends_with("out");
    }
    if stem.ends_with("id") {
        return !stem.ends_with("oid") && !stem.ends_with("aid");
    }
    if stem.ends_with("ir") {
        return !matches!(before(2), Some(b'a' | b'e' | b'i' | b'o'));
    }
    if stem.ends_with("ak")
        || stem.ends_with("ok")
        || stem.ends_with("ar")
        || stem.ends_with("ur")
        || stem.ends_with("il")
    {
        return consonant_before(2);
    }
    false
}

fn reduce_noun(word: &str) -> String {
    if let Some(base) = lookup(IRREGULAR_NOUNS, word) {
        return base.to_string();
    }
    if word.len() > 4 {
        if let Some(stem) = word.strip_suffix("ies") {
            return format!("{stem}y");
        }
    }
    if word.ends_with("sses") {
        return word[..word.len() - 2].to_string();
    }
    for end in ["shes", "ches", "xes"] {
        if word.ends_with(end) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ses") || word.ends_with("zes") {
        return word[..word.len() - 1].to_string();
    }
    if let Some(stem) = word.strip_suffix('s') {
        let keeps_s = ["ss", "us", "is", "os"].iter().any(|end| word.ends_with(end));
        if !keeps_s && stem.len() >= 3 {
            return stem.to_string();
        }
    }
    word.to_string()
}
