/// Replace `${ENV_VAR}` placeholders in config string values.
///
/// Unresolvable variables are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Replace `${ENV_VAR}` placeholders using a custom lookup function.
///
/// This is the implementation used by [`substitute_env`]; the separate
/// signature makes it testable without mutating the process environment.
fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        match tail.find('}') {
            Some(end) if end > 0 => {
                let name = &tail[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        // Leave unresolved placeholder as-is.
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    },
                }
                rest = &tail[end + 1..];
            },
            // Malformed (`${` without a name or closing brace): emit literal.
            _ => {
                out.push_str("${");
                rest = tail;
            },
        }
    }

    out.push_str(rest);
    out
}
