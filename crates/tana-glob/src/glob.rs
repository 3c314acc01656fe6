//! Single-segment glob matching.
//!
//! Implements shell-style patterns against one path segment at a time:
//! - `*` matches zero or more characters
//! - `?` matches exactly one character
//! - `[abc]` / `[a-z]` matches a character set or range
//! - `[!abc]` or `[^abc]` negates the set
//! - `{a,b,c}` brace alternation (expanded before matching)
//! - `\` escapes the next character
//!
//! Segment matching never crosses `/`; multi-segment patterns are handled
//! by `VirtualGlob` in `pattern.rs`.

use std::cell::Cell;

/// Maximum recursive calls for one match, counted as total work rather than
/// stack depth. Protects against adversarial patterns like `*a*a*a*...*b`
/// whose backtracking is otherwise exponential; running past the limit
/// counts as a non-match.
const MAX_MATCH_CALLS: usize = 100_000;

/// True iff the query contains glob metacharacters (`*`, `?`, `[`, `{`).
///
/// Queries without metacharacters are plain paths and can be resolved
/// directly instead of being evaluated against the namespace.
///
/// ```
/// use tana_glob::is_dynamic;
/// assert!(is_dynamic("/app/*.css"));
/// assert!(is_dynamic("/app/{a,b}"));
/// assert!(!is_dynamic("/app/main.css"));
/// ```
pub fn is_dynamic(query: &str) -> bool {
    query.contains('*') || query.contains('?') || query.contains('[') || query.contains('{')
}

/// Match a single segment against a glob pattern.
///
/// Returns true if the pattern matches the entire input. Brace alternatives
/// are expanded first, so `*.{css,js}` matches both `main.css` and `main.js`.
pub fn glob_match(pattern: &str, input: &str) -> bool {
    let calls = Cell::new(0usize);
    let input: Vec<char> = input.chars().collect();
    for alternative in expand_braces(pattern) {
        let pattern: Vec<char> = alternative.chars().collect();
        if match_from(&pattern, 0, &input, 0, &calls) {
            return true;
        }
    }
    false
}

/// Expand `{a,b,c}` alternation into the list of plain patterns it denotes.
///
/// Nested groups are supported; a pattern without braces expands to itself.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let chars: Vec<char> = pattern.chars().collect();

    let Some((start, end)) = first_brace_group(&chars) else {
        return vec![pattern.to_string()];
    };

    let prefix: String = chars[..start].iter().collect();
    let suffix: String = chars[end + 1..].iter().collect();
    let body: String = chars[start + 1..end].iter().collect();

    let mut expanded = Vec::new();
    for alternative in split_alternatives(&body) {
        // Re-expand: the suffix (or the alternative itself) may hold more groups.
        expanded.extend(expand_braces(&format!("{prefix}{alternative}{suffix}")));
    }
    expanded
}

/// Locate the first balanced top-level `{...}` group, if any.
fn first_brace_group(chars: &[char]) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut start = None;
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| (s, i));
                }
            }
            _ => {}
        }
    }
    None
}

/// Split brace body on top-level commas, keeping nested groups intact.
fn split_alternatives(body: &str) -> Vec<String> {
    let mut alternatives = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in body.chars() {
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                alternatives.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    alternatives.push(current);
    alternatives
}

/// Recursive matcher with backtracking for `*`, charged against `calls`.
fn match_from(
    pattern: &[char],
    pi: usize,
    input: &[char],
    ii: usize,
    calls: &Cell<usize>,
) -> bool {
    let spent = calls.get() + 1;
    calls.set(spent);
    if spent > MAX_MATCH_CALLS {
        return false;
    }

    if pi >= pattern.len() {
        return ii >= input.len();
    }

    match pattern[pi] {
        '*' => {
            // Collapse runs of stars, then try every split point.
            let mut next = pi;
            while next < pattern.len() && pattern[next] == '*' {
                next += 1;
            }
            if next >= pattern.len() {
                return true;
            }
            (0..=input.len() - ii).any(|skip| match_from(pattern, next, input, ii + skip, calls))
        }
        '?' => ii < input.len() && match_from(pattern, pi + 1, input, ii + 1, calls),
        '[' => {
            if ii >= input.len() {
                return false;
            }
            let (hit, consumed) = match_char_class(&pattern[pi..], input[ii]);
            hit && match_from(pattern, pi + consumed, input, ii + 1, calls)
        }
        '\\' if pi + 1 < pattern.len() => {
            ii < input.len()
                && pattern[pi + 1] == input[ii]
                && match_from(pattern, pi + 2, input, ii + 1, calls)
        }
        literal => {
            ii < input.len()
                && literal == input[ii]
                && match_from(pattern, pi + 1, input, ii + 1, calls)
        }
    }
}

/// Evaluate a `[...]` class against one character.
///
/// Returns whether the character matched and how many pattern characters the
/// class consumed. An unterminated class degrades to a literal `[`.
fn match_char_class(pattern: &[char], ch: char) -> (bool, usize) {
    debug_assert_eq!(pattern.first(), Some(&'['));

    let mut idx = 1;
    let negated = matches!(pattern.get(idx), Some(&'!') | Some(&'^'));
    if negated {
        idx += 1;
    }

    let body_start = idx;
    let mut matched = false;
    let mut closed = false;

    while idx < pattern.len() {
        let c = pattern[idx];

        // `]` closes the class unless it is the first body character.
        if c == ']' && idx > body_start {
            idx += 1;
            closed = true;
            break;
        }

        // Range `a-z` (a trailing `-` before `]` stays literal).
        if idx + 2 < pattern.len() && pattern[idx + 1] == '-' && pattern[idx + 2] != ']' {
            if ch >= c && ch <= pattern[idx + 2] {
                matched = true;
            }
            idx += 3;
            continue;
        }

        if c == ch {
            matched = true;
        }
        idx += 1;
    }

    if !closed {
        return (ch == '[', 1);
    }

    (matched != negated, idx)
}
