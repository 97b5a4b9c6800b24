// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::config::AnalysisConfig;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    pub url: String,
    /// Overrides the server's configuration for this run; missing fields take defaults
    #[serde(default)]
    pub config: Option<AnalysisConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let request: AnalyzeRequest = serde_json::from_str(
            r#"{"url": "https://example.com", "config": {"min_confident_items": 3}}"#,
        )
        .unwrap();
        let config = request.config.unwrap();
        assert_eq!(config.min_confident_items, 3);
        assert_eq!(
            config,
            AnalysisConfig {
                min_confident_items: 3,
                ..AnalysisConfig::default()
            }
        );
    }

    #[test]
    fn test_config_is_optional() {
        let request: AnalyzeRequest =
            serde_json::from_str(r#"{"url": "https://example.com"}"#).unwrap();
        assert!(request.config.is_none());
    }
}
