//! Decides which scripts count as "user code" versus framework/library code
//! that should be stepped over and excluded from stack traces by default.
//!
//! Two independent mechanisms cooperate: a glob-derived regex list passed to
//! `Debugger.setBlackboxPatterns` (so the runtime itself skips them during
//! stepping), and a per-script skip flag the adapter consults when deciding
//! whether a frame should be hidden or a breakpoint silently ignored.

use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;

/// One configured skip rule: either a glob over URLs/paths, or an exact
/// negation (`!pattern`) that un-skips a path otherwise covered by a
/// broader rule.
#[derive(Debug, Clone)]
struct SkipRule {
    regex: Regex,
    negated: bool,
}

#[derive(Debug, Default)]
pub struct ScriptSkipper {
    rules: Vec<SkipRule>,
    decisions: RefCell<HashMap<String, bool>>,
}

impl ScriptSkipper {
    /// `patterns` are DAP `skipFiles`-style globs, e.g. `"**/node_modules/**"`
    /// or `"!**/node_modules/my-pkg/**"` to carve out an exception.
    pub fn new(patterns: &[String]) -> Self {
        let rules = patterns
            .iter()
            .filter_map(|p| {
                let (negated, glob) = match p.strip_prefix('!') {
                    Some(rest) => (true, rest),
                    None => (false, p.as_str()),
                };
                glob_to_regex(glob).map(|regex| SkipRule { regex, negated })
            })
            .collect();
        Self {
            rules,
            decisions: RefCell::new(HashMap::new()),
        }
    }

    /// Whether `url_or_path` should be treated as non-user code. Later
    /// rules override earlier ones, matching how `.gitignore`-style
    /// negation is usually read.
    pub fn is_skipped(&self, url_or_path: &str) -> bool {
        if let Some(cached) = self.decisions.borrow().get(url_or_path) {
            return *cached;
        }
        let mut skipped = false;
        for rule in &self.rules {
            if rule.regex.is_match(url_or_path) {
                skipped = !rule.negated;
            }
        }
        self.decisions
            .borrow_mut()
            .insert(url_or_path.to_string(), skipped);
        skipped
    }

    /// The subset of configured rules suitable for
    /// `Debugger.setBlackboxPatterns`: only positive (non-negated) regexes,
    /// since CDP has no negation concept of its own.
    pub fn blackbox_patterns(&self) -> Vec<String> {
        self.rules
            .iter()
            .filter(|r| !r.negated)
            .map(|r| r.regex.as_str().to_string())
            .collect()
    }
}

fn glob_to_regex(glob: &str) -> Option<Regex> {
    let mut pattern = String::from("^");
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    pattern.push_str(".*");
                } else {
                    pattern.push_str("[^/]*");
                }
            }
            '?' => pattern.push('.'),
            '.' | '+' | '(' | ')' | '|' | '^' | '$' | '[' | ']' | '{' | '}' | '\\' => {
                pattern.push('\\');
                pattern.push(c);
            }
            other => pattern.push(other),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).ok()
}

/// Wraps `ScriptSkipper` with the patterns a thread pushes down via
/// `Debugger.setBlackboxPatterns`.
#[derive(Debug, Default)]
pub struct BlackboxManager {
    skipper: ScriptSkipper,
}

impl BlackboxManager {
    pub fn new(patterns: &[String]) -> Self {
        Self {
            skipper: ScriptSkipper::new(patterns),
        }
    }

    pub fn is_skipped(&self, url: &str) -> bool {
        self.skipper.is_skipped(url)
    }

    pub fn patterns(&self) -> Vec<String> {
        self.skipper.blackbox_patterns()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("/repo/node_modules/lodash/index.js", true ; "inside node_modules")]
    #[test_case("/repo/src/app.js", false ; "outside node_modules")]
    fn matches_double_star_glob(path: &str, expected: bool) {
        let skipper = ScriptSkipper::new(&["**/node_modules/**".to_string()]);
        assert_eq!(skipper.is_skipped(path), expected);
    }

    #[test]
    fn negation_carves_out_an_exception() {
        let skipper = ScriptSkipper::new(&[
            "**/node_modules/**".to_string(),
            "!**/node_modules/my-pkg/**".to_string(),
        ]);
        assert!(skipper.is_skipped("/repo/node_modules/lodash/index.js"));
        assert!(!skipper.is_skipped("/repo/node_modules/my-pkg/index.js"));
    }

    #[test]
    fn decisions_are_memoized() {
        let skipper = ScriptSkipper::new(&["**/node_modules/**".to_string()]);
        let path = "/repo/node_modules/a/b.js";
        assert_eq!(skipper.is_skipped(path), skipper.is_skipped(path));
    }

    #[test]
    fn blackbox_patterns_exclude_negations() {
        let manager = BlackboxManager::new(&[
            "**/node_modules/**".to_string(),
            "!**/node_modules/my-pkg/**".to_string(),
        ]);
        assert_eq!(manager.patterns().len(), 1);
    }
}
