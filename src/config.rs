//! Tunable thresholds, loaded from JSON. Any field left out keeps its default.

use serde::{Deserialize, Serialize};

use crate::consensus::ConfidenceThresholds;
use crate::contradiction::ContradictionThresholds;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub confidence: ConfidenceThresholds,
    pub contradiction: ContradictionThresholds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"contradiction": {"max_divergence_pct": 30.0}}"#).unwrap();
        assert_eq!(30.0, config.contradiction.max_divergence_pct);
        assert_eq!(0.5, config.contradiction.max_xg_deficit);
        assert_eq!(ConfidenceThresholds::default(), config.confidence);
    }

    #[test]
    fn empty_document_is_default() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(Config::default(), config);
    }
}
