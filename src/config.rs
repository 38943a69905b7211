use std::env;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Candidate models probed by the key validator, in preference order.
/// Overridable via `GEMINI_CANDIDATE_MODELS` so a provider-side rename
/// does not require a rebuild.
const DEFAULT_CANDIDATE_MODELS: &[&str] = &[
    "gemini-pro",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
    "gemini-pro-vision",
];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub google_api_key: Option<String>,
    pub model: String,
    pub candidate_models: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            google_api_key: env::var("GOOGLE_API_KEY").ok().filter(|key| !key.is_empty()),
            model: env::var("GEMINI_MODEL")
                .ok()
                .filter(|model| !model.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            candidate_models: env::var("GEMINI_CANDIDATE_MODELS")
                .map(|raw| parse_candidate_models(&raw))
                .unwrap_or_else(|_| default_candidate_models()),
        }
    }
}

pub fn default_candidate_models() -> Vec<String> {
    DEFAULT_CANDIDATE_MODELS
        .iter()
        .map(|model| (*model).to_owned())
        .collect()
}

fn parse_candidate_models(raw: &str) -> Vec<String> {
    let candidates = raw
        .split(',')
        .map(str::trim)
        .filter(|model| !model.is_empty())
        .map(str::to_owned)
        .collect::<Vec<_>>();

    if candidates.is_empty() {
        default_candidate_models()
    } else {
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_MODEL, default_candidate_models, parse_candidate_models};

    #[test]
    fn parses_comma_separated_override() {
        let candidates = parse_candidate_models("gemini-2.0-flash, gemini-1.5-flash");
        assert_eq!(candidates, vec!["gemini-2.0-flash", "gemini-1.5-flash"]);
    }

    #[test]
    fn drops_empty_entries() {
        let candidates = parse_candidate_models("gemini-pro,, ,gemini-1.5-pro,");
        assert_eq!(candidates, vec!["gemini-pro", "gemini-1.5-pro"]);
    }

    #[test]
    fn blank_override_falls_back_to_defaults() {
        let candidates = parse_candidate_models("  ,  ");
        assert_eq!(candidates, default_candidate_models());
    }

    #[test]
    fn default_order_starts_with_gemini_pro() {
        let candidates = default_candidate_models();
        assert_eq!(candidates.first().map(String::as_str), Some("gemini-pro"));
        assert_eq!(candidates.len(), 4);
    }

    #[test]
    fn default_model_is_flash() {
        assert_eq!(DEFAULT_MODEL, "gemini-2.0-flash");
    }
}
