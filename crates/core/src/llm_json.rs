use serde::de::DeserializeOwned;

/// Parses a JSON object out of a model reply.
///
/// Tolerates markdown code fences and prose around the object; anything
/// else is a parse error for the caller to recover from.
pub fn parse_object<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    let trimmed = strip_fences(raw.trim());
    match serde_json::from_str(trimmed) {
        Ok(v) => Ok(v),
        Err(err) => match (trimmed.find('{'), trimmed.rfind('}')) {
            (Some(open), Some(close)) if open < close => {
                serde_json::from_str(&trimmed[open..=close])
            }
            _ => Err(err),
        },
    }
}

fn strip_fences(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
