//! Loading the ontology resource at the pipeline boundary.

use crate::parser::ParseDiagnostic;
use crate::ruleset::RuleSet;
use fmea_kernel::Session;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Where the active rule set came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleOrigin {
    /// No ontology path was given.
    Builtin,
    /// Parsed from this file on top of the built-in defaults.
    File { path: String },
    /// The file could not be used; built-in defaults are active.
    Fallback { path: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct LoadedRuleSet {
    pub rules: Arc<RuleSet>,
    pub origin: RuleOrigin,
    pub diagnostics: Vec<ParseDiagnostic>,
    pub ignored_sections: Vec<String>,
}

impl LoadedRuleSet {
    fn builtin(origin: RuleOrigin) -> Self {
        Self {
            rules: Arc::new(RuleSet::builtin()),
            origin,
            diagnostics: Vec::new(),
            ignored_sections: Vec::new(),
        }
    }
}

/// Load the ontology at `path`, recording the read in `session`.
///
/// Never fails: a missing or unreadable file falls back to the built-in
/// rule set with a warning, since the defaults are always available.
pub fn load_ruleset(path: Option<&Path>, session: &mut Session) -> LoadedRuleSet {
    let Some(path) = path else {
        return LoadedRuleSet::builtin(RuleOrigin::Builtin);
    };
    let path_display = path.display().to_string();

    let text = match session.try_read_document(path) {
        Ok(Some(text)) => text,
        Ok(None) => {
            tracing::warn!(path = %path_display, "ontology file not found, using built-in rules");
            return LoadedRuleSet::builtin(RuleOrigin::Fallback {
                path: path_display,
                reason: "not found".to_string(),
            });
        }
        Err(err) => {
            tracing::warn!(path = %path_display, error = %err, "ontology file unreadable, using built-in rules");
            return LoadedRuleSet::builtin(RuleOrigin::Fallback {
                path: path_display,
                reason: err.to_string(),
            });
        }
    };

    let parsed = crate::parse_with_diagnostics(&text);
    if !parsed.diagnostics.is_empty() {
        tracing::warn!(
            path = %path_display,
            skipped = parsed.diagnostics.len(),
            "ontology lines skipped"
        );
    }
    tracing::info!(path = %path_display, digest = parsed.rules.digest(), "ontology loaded");
    LoadedRuleSet {
        rules: Arc::new(parsed.rules),
        origin: RuleOrigin::File { path: path_display },
        diagnostics: parsed.diagnostics,
        ignored_sections: parsed.ignored_sections,
    }
}
