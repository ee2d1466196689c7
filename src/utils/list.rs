// src/utils/list.rs

//! Whitespace-separated list strings with brace grouping.
//!
//! Option values such as `-format "ppm -colorformat rgb"`, `-metadata` dicts
//! and the rows of the `default` string format all use this encoding:
//! elements are separated by whitespace, `{...}` groups an element verbatim
//! (braces nest), `"..."` groups with backslash escapes.

use crate::utils::error::{PhotoError, Result};

/// Splits a list string into its elements.
pub fn split_list(s: &str) -> Result<Vec<String>> {
    let mut items = Vec::new();
    let mut chars = s.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let Some(&first) = chars.peek() else {
            break;
        };

        let mut item = String::new();
        match first {
            '{' => {
                chars.next();
                let mut depth = 1;
                loop {
                    match chars.next() {
                        Some('{') => {
                            depth += 1;
                            item.push('{');
                        }
                        Some('}') => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            item.push('}');
                        }
                        Some('\\') => {
                            item.push('\\');
                            if let Some(c) = chars.next() {
                                item.push(c);
                            }
                        }
                        Some(c) => item.push(c),
                        None => return Err(PhotoError::bad_value("unmatched open brace in list")),
                    }
                }
                if chars.peek().is_some_and(|c| !c.is_whitespace()) {
                    return Err(PhotoError::bad_value(
                        "list element in braces followed by extra characters",
                    ));
                }
            }
            '"' => {
                chars.next();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => push_escaped(&mut item, chars.next()),
                        Some(c) => item.push(c),
                        None => return Err(PhotoError::bad_value("unmatched open quote in list")),
                    }
                }
                if chars.peek().is_some_and(|c| !c.is_whitespace()) {
                    return Err(PhotoError::bad_value(
                        "list element in quotes followed by extra characters",
                    ));
                }
            }
            _ => {
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    chars.next();
                    if c == '\\' {
                        push_escaped(&mut item, chars.next());
                    } else {
                        item.push(c);
                    }
                }
            }
        }
        items.push(item);
    }

    Ok(items)
}

fn push_escaped(out: &mut String, c: Option<char>) {
    match c {
        Some('n') => out.push('\n'),
        Some('t') => out.push('\t'),
        Some(c) => out.push(c),
        None => out.push('\\'),
    }
}

/// Joins elements into a list string, bracing elements that need it.
pub fn merge_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| quote_element(item.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_element(s: &str) -> String {
    let needs_braces = s.is_empty()
        || s
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '"' | '\\' | ';' | '$' | '['));
    if needs_braces {
        format!("{{{}}}", s)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_and_braced() {
        let items = split_list("  ppm {a b} \"c d\" {x {y} z}").unwrap();
        assert_eq!(items, vec!["ppm", "a b", "c d", "x {y} z"]);
    }

    #[test]
    fn rejects_unbalanced() {
        assert!(split_list("{a b").is_err());
        assert!(split_list("\"a b").is_err());
        assert!(split_list("{a}b").is_err());
    }

    #[test]
    fn merge_then_split_keeps_elements() {
        let items = vec!["one".to_string(), "two words".to_string(), String::new()];
        let merged = merge_list(&items);
        assert_eq!(merged, "one {two words} {}");
        assert_eq!(split_list(&merged).unwrap(), items);
    }
}
