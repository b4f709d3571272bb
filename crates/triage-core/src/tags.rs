//! Category tags derived from report text.
//!
//! Keyword categories match against normalized lemmas; the product category
//! matches the raw lower-cased text so it fires even when normalization
//! folded the phrase away.

use crate::normalize::normalize;

/// Emitted when no other category matches.
pub const FALLBACK_TAG: &str = "General";

/// How a category decides whether it applies.
enum Trigger {
    /// Any of these lemmas present in the normalized tokens
    Keywords(&'static [&'static str]),
    /// Any of these substrings present in the lower-cased raw text
    RawSubstring(&'static [&'static str]),
}

struct Category {
    name: &'static str,
    trigger: Trigger,
}

/// Categories in emission order.
const CATEGORIES: &[Category] = &[
    Category {
        name: "Terminal",
        trigger: Trigger::Keywords(&[
            "terminal", "shell", "bash", "zsh", "powershell", "cmd", "console", "pty", "xterm",
            "tty", "cli",
        ]),
    },
    Category {
        name: "UI/UX",
        trigger: Trigger::Keywords(&[
            "ui", "ux", "button", "layout", "theme", "icon", "menu", "sidebar", "font", "color",
            "colour", "display", "render", "css", "style", "tooltip", "panel", "dialog", "click",
            "scroll", "window", "screen",
        ]),
    },
    Category {
        name: "AI/Copilot",
        trigger: Trigger::Keywords(&[
            "copilot", "ai", "gpt", "llm", "chat", "agent", "model", "openai", "prompt",
        ]),
    },
    Category {
        name: "Performance",
        trigger: Trigger::Keywords(&[
            "slow", "lag", "freeze", "hang", "performance", "memory", "cpu", "latency", "leak",
            "perf", "unresponsive", "speed",
        ]),
    },
    Category {
        name: "Editor",
        trigger: Trigger::Keywords(&[
            "editor", "syntax", "highlight", "intellisense", "autocomplete", "suggestion",
            "cursor", "indent", "indentation", "formatter", "minimap", "bracket", "snippet",
            "refactor", "lint",
        ]),
    },
    Category {
        name: "Git/GitHub",
        trigger: Trigger::Keywords(&[
            "git", "github", "commit", "push", "pull", "merge", "branch", "rebase", "checkout",
            "clone", "diff", "repo", "repository", "stash",
        ]),
    },
    Category {
        name: "Backend/API",
        trigger: Trigger::Keywords(&[
            "api", "backend", "server", "database", "sql", "http", "endpoint", "request",
            "response", "graphql", "json", "query", "500", "404",
        ]),
    },
    Category {
        name: "VS Code",
        trigger: Trigger::RawSubstring(&["vs code", "vscode", "visual studio code"]),
    },
];

/// Category tags for `text`, in fixed category order, without duplicates.
///
/// Returns `["General"]` when nothing matches.
pub fn classify(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    let tokens = normalized.token_set();
    let raw = text.to_lowercase();

    let mut tags: Vec<String> = CATEGORIES
        .iter()
        .filter(|c| match c.trigger {
            Trigger::Keywords(words) => words.iter().any(|w| tokens.contains(w)),
            Trigger::RawSubstring(needles) => needles.iter().any(|n| raw.contains(n)),
        })
        .map(|c| c.name.to_string())
        .collect();

    if tags.is_empty() {
        tags.push(FALLBACK_TAG.to_string());
    }
    tags
}

/// All category names, in emission order, followed by the fallback.
pub fn category_names() -> Vec<&'static str> {
    CATEGORIES
        .iter()
        .map(|c| c.name)
        .chain(std::iter::once(FALLBACK_TAG))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_category_fires_on_its_keywords() {
        for (text, expected) in [
            ("Terminal issue with bash", "Terminal"),
            ("The UI is broken and buttons are not showing", "UI/UX"),
            ("Copilot agent failed to predict gpt models", "AI/Copilot"),
            ("The system is very slow and lagging", "Performance"),
            ("VS Code editor syntax highlighting is broken", "Editor"),
            ("Git push failed to github repo", "Git/GitHub"),
            ("Backend API server returned 500 error on sql query", "Backend/API"),
        ] {
            let tags = classify(text);
            assert!(
                tags.iter().any(|t| t == expected),
                "{text:?} -> {tags:?}, expected {expected}"
            );
        }
    }

    #[test]
    fn no_match_falls_back_to_general() {
        assert_eq!(classify("Random bug with no keywords"), vec!["General"]);
        assert_eq!(classify(""), vec!["General"]);
    }

    #[test]
    fn order_follows_category_list() {
        let tags = classify("git push hangs the terminal");
        assert_eq!(tags, vec!["Terminal", "Performance", "Git/GitHub"]);
    }

    #[test]
    fn product_category_uses_raw_text() {
        let tags = classify("VS Code editor syntax highlighting is broken");
        assert_eq!(tags, vec!["Editor", "VS Code"]);
        assert!(classify("vscode will not start").contains(&"VS Code".to_string()));
    }

    #[test]
    fn fallback_is_listed_last() {
        let names = category_names();
        assert_eq!(names.first(), Some(&"Terminal"));
        assert_eq!(names.last(), Some(&FALLBACK_TAG));
    }
}
