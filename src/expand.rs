//! `${VAR}` placeholder expansion and secret masking for display.

/// Expand `${NAME}` placeholders using the process environment.
///
/// Placeholders whose variable is unset or empty are kept verbatim.
pub fn expand_env(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

/// Expand `${NAME}` placeholders using `lookup` to resolve names.
///
/// An unterminated `${` and an empty `${}` are copied through unchanged.
pub fn expand_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let name = &after_open[..end];
        let token = &rest[start..start + 2 + end + 1];
        match lookup(name).filter(|v| !name.is_empty() && !v.is_empty()) {
            Some(value) => out.push_str(&value),
            None => out.push_str(token),
        }
        rest = &after_open[end + 1..];
    }

    out.push_str(rest);
    out
}

/// Mask a secret for display, showing only the first and last 4 characters.
///
/// Secrets of 12 characters or fewer are hidden entirely.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
