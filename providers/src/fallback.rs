//! Ordered candidate plan across API versions and model identifiers.
//!
//! The remote service rejects model/version pairs it no longer serves with a
//! not-found-style error, so a single rewrite may need to walk several
//! endpoints. This module only decides the order; the orchestrator decides
//! when to advance.

use crate::{DEFAULT_MODEL, MODEL_CANDIDATES};
use tonedown_types::{ApiVersion, CandidateTarget};

/// Build the full ordered candidate list for one rewrite.
///
/// The preferred model (falling back to [`DEFAULT_MODEL`] when absent or
/// blank) leads within each version, followed by the remaining defaults in
/// their fixed relative order. Versions are outermost: every model is tried
/// on the first version before any model is tried on the second.
#[must_use]
pub fn candidate_targets(preferred: Option<&str>) -> Vec<CandidateTarget> {
    let preferred = preferred
        .map(str::trim)
        .filter(|model| !model.is_empty())
        .unwrap_or(DEFAULT_MODEL);
    plan(&ApiVersion::PRIORITY, &MODEL_CANDIDATES, preferred)
}

fn plan(versions: &[ApiVersion], defaults: &[&str], preferred: &str) -> Vec<CandidateTarget> {
    let mut targets = Vec::with_capacity(versions.len() * (defaults.len() + 1));
    for &version in versions {
        targets.push(CandidateTarget::new(version, preferred));
        for &model in defaults {
            if model != preferred {
                targets.push(CandidateTarget::new(version, model));
            }
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::{candidate_targets, plan};
    use crate::{DEFAULT_MODEL, MODEL_CANDIDATES};
    use tonedown_types::{ApiVersion, CandidateTarget};

    fn pairs(targets: &[CandidateTarget]) -> Vec<(&str, &str)> {
        targets
            .iter()
            .map(|t| (t.version.as_str(), t.model.as_str()))
            .collect()
    }

    #[test]
    fn preferred_leads_every_version_block() {
        let targets = plan(&ApiVersion::PRIORITY, &["m1", "m2", "m3"], "m2");
        assert_eq!(
            pairs(&targets),
            [
                ("v1beta", "m2"),
                ("v1beta", "m1"),
                ("v1beta", "m3"),
                ("v1", "m2"),
                ("v1", "m1"),
                ("v1", "m3"),
            ]
        );
    }

    #[test]
    fn unknown_preferred_is_prepended() {
        let targets = plan(&ApiVersion::PRIORITY, &["m1", "m2"], "custom");
        assert_eq!(
            pairs(&targets),
            [
                ("v1beta", "custom"),
                ("v1beta", "m1"),
                ("v1beta", "m2"),
                ("v1", "custom"),
                ("v1", "m1"),
                ("v1", "m2"),
            ]
        );
    }

    #[test]
    fn absent_preference_uses_default_model() {
        let targets = candidate_targets(None);
        assert_eq!(targets.len(), ApiVersion::PRIORITY.len() * MODEL_CANDIDATES.len());
        assert_eq!(targets[0].model, DEFAULT_MODEL);
        assert_eq!(targets[0].version, ApiVersion::V1Beta);
    }

    #[test]
    fn blank_preference_uses_default_model() {
        let targets = candidate_targets(Some("   "));
        assert_eq!(targets[0].model, DEFAULT_MODEL);
    }

    #[test]
    fn every_model_on_first_version_before_second() {
        let targets = candidate_targets(Some("gemini-1.5-flash"));
        let first_v1 = targets
            .iter()
            .position(|t| t.version == ApiVersion::V1)
            .unwrap();
        assert!(
            targets[..first_v1]
                .iter()
                .all(|t| t.version == ApiVersion::V1Beta)
        );
        assert_eq!(first_v1, MODEL_CANDIDATES.len());
    }
}
