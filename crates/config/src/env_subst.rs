/// Replace `${ENV_VAR}` and `${ENV_VAR:-default}` placeholders in config
/// string values.
///
/// Unresolvable variables without a default are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Replace placeholders using a custom lookup function, so tests don't have to
/// touch the process environment.
fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next();

        let mut inner = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '}' {
                closed = true;
                break;
            }
            inner.push(c);
        }

        if !closed || inner.is_empty() {
            result.push_str("${");
            result.push_str(&inner);
            if closed {
                result.push('}');
            }
            continue;
        }

        let (name, default) = match inner.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (inner.as_str(), None),
        };

        // `:-` also replaces variables that are set but empty.
        let value = match default {
            Some(default) => lookup(name)
                .filter(|v| !v.is_empty())
                .or_else(|| Some(default.to_string())),
            None => lookup(name),
        };

        match value {
            Some(value) => result.push_str(&value),
            None => {
                result.push_str("${");
                result.push_str(&inner);
                result.push('}');
            },
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "RELAYBOT_TEST_URL" => Some("https://assets.test".to_string()),
            "RELAYBOT_EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_env_with("url = \"${RELAYBOT_TEST_URL}/api\"", lookup),
            "url = \"https://assets.test/api\""
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_env_with("${RELAYBOT_NONEXISTENT_XYZ}", lookup),
            "${RELAYBOT_NONEXISTENT_XYZ}"
        );
    }

    #[test]
    fn falls_back_to_default() {
        assert_eq!(substitute_env_with("${RELAYBOT_MISSING:-600}", lookup), "600");
        assert_eq!(substitute_env_with("${RELAYBOT_EMPTY:-x}", lookup), "x");
        assert_eq!(
            substitute_env_with("${RELAYBOT_TEST_URL:-ignored}", lookup),
            "https://assets.test"
        );
    }

    #[test]
    fn malformed_placeholder_is_literal() {
        assert_eq!(substitute_env_with("a ${UNCLOSED", lookup), "a ${UNCLOSED");
        assert_eq!(substitute_env_with("cost: $5", lookup), "cost: $5");
        assert_eq!(substitute_env_with("${}", lookup), "${}");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
