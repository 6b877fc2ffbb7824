//! Glob matching with the store's `KEYS`/`SCAN MATCH` semantics.
//!
//! Supports `*`, `?`, `[abc]`, `[a-z]`, `[^a]` and backslash escapes.

/// Returns `true` when `candidate` matches `pattern`.
#[must_use]
pub fn glob_match(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();

    let (mut pi, mut ci) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    loop {
        if pi < pattern.len() && pattern[pi] == '*' {
            backtrack = Some((pi, ci));
            pi += 1;
            continue;
        }
        if ci == candidate.len() {
            break;
        }
        if pi < pattern.len() {
            if let Some(width) = match_token(&pattern[pi..], candidate[ci]) {
                pi += width;
                ci += 1;
                continue;
            }
        }
        match backtrack {
            Some((star, resume)) => {
                pi = star + 1;
                ci = resume + 1;
                backtrack = Some((star, resume + 1));
            }
            None => return false,
        }
    }

    pattern[pi..].iter().all(|c| *c == '*')
}

/// Matches the single non-star token at the start of `pattern` against `c`,
/// returning how many pattern characters it spans.
fn match_token(pattern: &[char], c: char) -> Option<usize> {
    match pattern[0] {
        '?' => Some(1),
        '\\' if pattern.len() > 1 => (pattern[1] == c).then_some(2),
        '[' => match match_class(pattern, c) {
            Some((hit, width)) => hit.then_some(width),
            None => (c == '[').then_some(1),
        },
        literal => (literal == c).then_some(1),
    }
}

/// Evaluates a `[...]` class. Returns `None` when the class is unterminated.
fn match_class(pattern: &[char], c: char) -> Option<(bool, usize)> {
    let mut i = 1;
    let negate = pattern.get(i) == Some(&'^');
    if negate {
        i += 1;
    }

    let mut hit = false;
    while i < pattern.len() {
        match pattern[i] {
            ']' => return Some((hit != negate, i + 1)),
            '\\' if i + 1 < pattern.len() => {
                hit |= pattern[i + 1] == c;
                i += 2;
            }
            low if i + 2 < pattern.len() && pattern[i + 1] == '-' && pattern[i + 2] != ']' => {
                let high = pattern[i + 2];
                let (low, high) = if low <= high { (low, high) } else { (high, low) };
                hit |= (low..=high).contains(&c);
                i += 3;
            }
            single => {
                hit |= single == c;
                i += 1;
            }
        }
    }
    None
}
