//! Canonicalizes a model-written snippet into one display sentence.

/// Steps, in order:
/// 1. trim surrounding whitespace
/// 2. upper-case the first character when it is a lowercase letter
/// 3. append `.` unless the text is empty or already ends in `.`, `!` or `?`
/// 4. collapse runs of two or more whitespace characters into one space
/// 5. turn a line break not preceded by `.`, `!` or `?` into `". "`
///
/// Idempotent: `clean(&clean(x)) == clean(x)`.
pub fn clean(text: &str) -> String {
    let trimmed = text.trim();

    let mut chars = trimmed.chars();
    let mut out = match chars.next() {
        Some(first) if first.is_lowercase() => first.to_uppercase().chain(chars).collect(),
        _ => trimmed.to_string(),
    };

    if out.chars().last().is_some_and(|c| !is_terminal(c)) {
        out.push('.');
    }

    replace_bare_newlines(&collapse_whitespace(&out))
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();
    for c in text.chars() {
        if c.is_whitespace() {
            run.push(c);
            continue;
        }
        flush_run(&mut out, &mut run);
        out.push(c);
    }
    flush_run(&mut out, &mut run);
    out
}

fn flush_run(out: &mut String, run: &mut String) {
    match run.chars().count() {
        0 => {}
        1 => out.push_str(run),
        _ => out.push(' '),
    }
    run.clear();
}

fn replace_bare_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if c == '\n' && !prev.is_some_and(is_terminal) {
            out.push_str(". ");
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// Joins the extractor's rationale and the matcher's justification:
/// rationale first, period-terminated, then a space, then the justification.
pub fn join_explanation(rationale: &str, justification: &str) -> String {
    let mut explanation = rationale.to_string();
    if !justification.is_empty() {
        if !explanation.is_empty() && !explanation.ends_with('.') {
            explanation.push('.');
        }
        if !explanation.is_empty() {
            explanation.push(' ');
        }
        explanation.push_str(justification);
    }
    explanation
}
