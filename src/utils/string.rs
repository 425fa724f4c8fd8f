/// Strips the quotes from a Java string literal and undoes the simple
/// escapes (`\"`, `\\`, `\n`, `\t`).
pub fn unquote_string(s: &str) -> String {
    let s = s.trim();
    let inner = if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        return s.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

pub fn extract_last_segment(path: &str) -> String {
    path.rsplit(['.', '$'])
        .next()
        .unwrap_or(path)
        .to_string()
}

/// Joins a root package and an optional sub-package with a dot.
pub fn join_package(root: &str, sub: &str) -> String {
    let root = root.trim_matches('.');
    let sub = sub.trim_matches('.');
    match (root.is_empty(), sub.is_empty()) {
        (true, _) => sub.to_string(),
        (false, true) => root.to_string(),
        (false, false) => format!("{root}.{sub}"),
    }
}
