//! Option name patterns.
//!
//! Recognizers are declared with glob-style patterns over option names:
//!
//! - `(a|b)`: alternation, captured
//! - `*`: any run of characters except `=`, captured
//! - `?`: one character except `=`
//! - `[...]`: character class, copied through
//!
//! Everything else is literal. A pattern is compiled once into an anchored
//! regex when its stage is built.

use regex::Regex;
use thiserror::Error;

/// A pattern that could not be compiled.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern '{pattern}': unbalanced '{delimiter}'")]
    Unbalanced { pattern: String, delimiter: char },

    #[error("pattern '{pattern}': {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled option-name matcher.
#[derive(Debug, Clone)]
pub struct Matcher {
    pattern: String,
    regex: Regex,
}

impl Matcher {
    /// Compile a glob-style pattern.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let source = translate(pattern)?;
        let regex = Regex::new(&source).map_err(|e| PatternError::Regex {
            pattern: pattern.to_string(),
            source: e,
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as written.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Match `name` and return the captured alternations and wildcards in order.
    pub fn captures(&self, name: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(name)?;
        Some(
            caps.iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect(),
        )
    }
}

fn translate(pattern: &str) -> Result<String, PatternError> {
    let unbalanced = |delimiter| PatternError::Unbalanced {
        pattern: pattern.to_string(),
        delimiter,
    };

    let mut out = String::from("^");
    let mut literal = String::new();
    let mut depth = 0usize;
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        let special = matches!(c, '(' | ')' | '|' | '*' | '?' | '[');
        if !special {
            literal.push(c);
            continue;
        }
        out.push_str(&regex::escape(&literal));
        literal.clear();

        match c {
            '(' => {
                depth += 1;
                out.push('(');
            }
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| unbalanced(')'))?;
                out.push(')');
            }
            '|' if depth > 0 => out.push('|'),
            '|' => out.push_str(r"\|"),
            '*' => out.push_str("([^=]*)"),
            '?' => out.push_str("[^=]"),
            '[' => {
                out.push('[');
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    if c == '\\' || c == '[' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                if !closed {
                    return Err(unbalanced('['));
                }
                out.push(']');
            }
            _ => unreachable!("non-special characters are handled above"),
        }
    }

    if depth != 0 {
        return Err(unbalanced('('));
    }
    out.push_str(&regex::escape(&literal));
    out.push('$');
    Ok(out)
}
