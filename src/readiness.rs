use crate::config::AiSettings;

/// Side-effect-free check of whether the AI backend can take requests.
pub trait AiReadiness: Send + Sync {
    fn is_ai_ready(&self) -> bool;
}

/// Ready when an API key is configured, or when running against a local
/// (non-cloud) backend that needs none.
impl AiReadiness for AiSettings {
    fn is_ai_ready(&self) -> bool {
        self.api_key.as_deref().map_or(false, |key| !key.trim().is_empty()) || !self.cloud_mode
    }
}

/// Fixed answer, for hosts that track readiness elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct StaticReadiness(pub bool);

impl AiReadiness for StaticReadiness {
    fn is_ai_ready(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_readiness() {
        let mut ai = AiSettings::default();
        assert!(!ai.is_ai_ready());

        ai.api_key = Some("   ".to_string());
        assert!(!ai.is_ai_ready());

        ai.api_key = Some("sk-test".to_string());
        assert!(ai.is_ai_ready());

        let local = AiSettings {
            api_key: None,
            cloud_mode: false,
        };
        assert!(local.is_ai_ready());
    }
}
