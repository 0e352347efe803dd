use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub display_name: String,
}

/// An OpenAI-compatible chat-completion endpoint offered in the settings form.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderPreset {
    pub id: String,
    pub display_name: String,
    pub base_url: String,
    pub models: Vec<ModelInfo>,
    pub allows_custom_model: bool,
}

pub fn presets() -> Vec<ProviderPreset> {
    vec![
        ProviderPreset {
            id: "openai".to_string(),
            display_name: "OpenAI".to_string(),
            base_url: "https://api.openai.com/v1/chat/completions".to_string(),
            models: vec![
                ModelInfo {
                    id: "gpt-4o-mini".to_string(),
                    display_name: "GPT-4o mini".to_string(),
                },
                ModelInfo {
                    id: "gpt-4o".to_string(),
                    display_name: "GPT-4o".to_string(),
                },
                ModelInfo {
                    id: "gpt-3.5-turbo".to_string(),
                    display_name: "GPT-3.5 Turbo".to_string(),
                },
            ],
            allows_custom_model: true,
        },
        ProviderPreset {
            id: "openrouter".to_string(),
            display_name: "OpenRouter".to_string(),
            base_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            models: vec![ModelInfo {
                id: "google/gemini-1.5-pro".to_string(),
                display_name: "Gemini 1.5 Pro".to_string(),
            }],
            allows_custom_model: true,
        },
    ]
}

/// Preset whose endpoint matches `base_url`, ignoring a trailing slash.
pub fn find_by_base_url(base_url: &str) -> Option<ProviderPreset> {
    let wanted = base_url.trim().trim_end_matches('/');
    presets()
        .into_iter()
        .find(|p| p.base_url.trim_end_matches('/') == wanted)
}
