//! The typed, immutable rule tables consumed by every validator.

use crate::matcher::{Exemptions, contains_keyword, find_keywords};
use crate::parser::{Entry, ParseDiagnostic, Section, SectionKind, parse_sections, split_list};
use fmea_kernel::{LifecycleStage, Relation, Severity, sha256_hex};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Allowed and forbidden content keywords under one mode tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagRule {
    pub allowed: Vec<String>,
    pub forbidden: Vec<String>,
}

/// `left` on the source side forbids any of `right` on the target side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairRule {
    pub left: String,
    pub right: Vec<String>,
}

/// When the source side mentions any trigger, the target side must mention
/// one of the allowed keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityRule {
    pub triggers: Vec<String>,
    pub allowed: Vec<String>,
}

/// Minimums for multi-line prevention/detection controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlRequirements {
    pub min_lines: usize,
    pub min_lifecycle_tags: usize,
}

impl Default for ControlRequirements {
    fn default() -> Self {
        Self {
            min_lines: 4,
            min_lifecycle_tags: 2,
        }
    }
}

/// Compiled regexes for measurable criteria and references.
#[derive(Debug, Clone, Default)]
pub struct ValuePatterns {
    pub quantitative: Vec<Regex>,
    pub criteria: Vec<Regex>,
    pub source_reference: Vec<Regex>,
}

impl ValuePatterns {
    pub fn any_match(patterns: &[Regex], text: &str) -> bool {
        patterns.iter().any(|re| re.is_match(text))
    }
}

/// Immutable rule tables. Build once, share freely (`Arc<RuleSet>`).
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub required_tags: Vec<String>,
    /// Mode primary-line forbidden keywords per category.
    pub mode_forbidden: BTreeMap<String, Vec<String>>,
    /// Process words that belong in the mechanism column.
    pub mechanism_keywords: Vec<String>,
    pub mode_forbidden_exact: Vec<String>,
    /// Compound words exempt from substring matches, in every field.
    pub allowed_exceptions: Vec<String>,
    pub tag_keywords: BTreeMap<String, TagRule>,
    pub visible_phenomena: Vec<String>,
    pub abstract_to_visible: BTreeMap<String, Vec<String>>,
    /// Effect primary-line forbidden keywords per category.
    pub effect_forbidden: BTreeMap<String, Vec<String>>,
    pub mechanism_forbidden_exact: Vec<String>,
    pub domain_categories: BTreeMap<String, Vec<String>>,
    pub lifecycle_hints: BTreeMap<LifecycleStage, Vec<String>>,
    pub forbidden_pairs: BTreeMap<Relation, Vec<PairRule>>,
    pub compatibility: BTreeMap<Relation, Vec<CompatibilityRule>>,
    pub synonyms: BTreeMap<String, Vec<String>>,
    pub controls: ControlRequirements,
    pub value_patterns: ValuePatterns,
    pub forbidden_sources: Vec<String>,
    pub approved_sources: Vec<String>,
    pub vague_expressions: Vec<String>,
    pub abbreviations: BTreeMap<String, String>,
    pub severity_overrides: BTreeMap<String, Severity>,
    digest: String,
}

/// Result of parsing ontology text onto a base rule set.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub rules: RuleSet,
    pub diagnostics: Vec<ParseDiagnostic>,
    /// Names of sections present in the text but not understood.
    pub ignored_sections: Vec<String>,
}

impl RuleSet {
    /// Rule set with every table empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Identity of the rule content: `ont1_<sha256>`.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Parse `text` on top of `self`. Each recognized section replaces the
    /// matching table of the base; tables the text does not mention are kept.
    pub fn overlay(&self, text: &str) -> Parsed {
        let parsed = parse_sections(text);
        let mut rules = self.clone();
        let mut folder = Folder::default();
        let mut diagnostics = parsed.diagnostics;
        let mut ignored_sections = Vec::new();

        for section in &parsed.sections {
            match section {
                Section::Known { kind, entries, .. } => {
                    folder.first_visit(&mut rules, *kind);
                    for entry in entries {
                        if let Err(reason) = folder.apply(&mut rules, *kind, entry) {
                            tracing::debug!(line = entry.line, section = kind.name(), %reason, "skipping ontology entry");
                            diagnostics.push(ParseDiagnostic {
                                line: entry.line,
                                section: Some(kind.name().to_string()),
                                reason,
                            });
                        }
                    }
                }
                Section::Ignored { name, .. } => ignored_sections.push(name.clone()),
            }
        }

        diagnostics.sort_by_key(|diagnostic| diagnostic.line);
        rules.digest = if folder.touched.is_empty() {
            self.digest.clone()
        } else {
            format!(
                "ont1_{}",
                sha256_hex(format!("{}\n{text}", self.digest).as_bytes())
            )
        };
        Parsed {
            rules,
            diagnostics,
            ignored_sections,
        }
    }

    /// Declared severity of `rule_id`, falling back to its prefix
    /// (`mode.forbidden` for `mode.forbidden.mechanism`) and then `default`.
    pub fn severity_for(&self, rule_id: &str, default: Severity) -> Severity {
        if let Some(severity) = self.severity_overrides.get(rule_id) {
            return *severity;
        }
        rule_id
            .rsplit_once('.')
            .and_then(|(prefix, _)| self.severity_overrides.get(prefix))
            .copied()
            .unwrap_or(default)
    }

    /// Allow-listed spans of `text`, for exemption-aware lookups.
    pub fn exemptions(&self, text: &str) -> Exemptions {
        Exemptions::scan(text, &self.allowed_exceptions)
    }

    /// Domain categories whose keywords appear in `text`.
    pub fn classify_domains(&self, text: &str) -> BTreeSet<&str> {
        self.domain_categories
            .iter()
            .filter(|(_, keywords)| !find_keywords(text, keywords).is_empty())
            .map(|(category, _)| category.as_str())
            .collect()
    }

    /// Lifecycle stages hinted by keywords in `text`.
    pub fn hinted_stages(&self, text: &str) -> BTreeSet<LifecycleStage> {
        self.lifecycle_hints
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|kw| contains_keyword(text, kw)))
            .map(|(stage, _)| *stage)
            .collect()
    }

    /// `word` plus its synonyms, in both directions of the table.
    pub fn expand_synonyms<'a>(&'a self, word: &'a str) -> BTreeSet<&'a str> {
        let mut expanded = BTreeSet::from([word]);
        if let Some(direct) = self.synonyms.get(word) {
            expanded.extend(direct.iter().map(String::as_str));
        }
        for (key, values) in &self.synonyms {
            if values.iter().any(|value| value == word) {
                expanded.insert(key.as_str());
            }
        }
        expanded
    }

    pub fn summary(&self) -> RuleSetSummary {
        let count = |map: &BTreeMap<String, Vec<String>>| -> usize { map.values().map(Vec::len).sum() };
        RuleSetSummary {
            digest: self.digest.clone(),
            required_tags: self.required_tags.clone(),
            mode_forbidden_categories: self.mode_forbidden.keys().cloned().collect(),
            mode_forbidden_keywords: count(&self.mode_forbidden),
            mechanism_keywords: self.mechanism_keywords.len(),
            allowed_exceptions: self.allowed_exceptions.len(),
            tag_rules: self.tag_keywords.len(),
            abstract_concepts: self.abstract_to_visible.len(),
            effect_forbidden_keywords: count(&self.effect_forbidden),
            domain_categories: self.domain_categories.keys().cloned().collect(),
            lifecycle_hint_keywords: self.lifecycle_hints.values().map(Vec::len).sum(),
            forbidden_pairs: self
                .forbidden_pairs
                .iter()
                .map(|(relation, rules)| (relation.to_string(), rules.len()))
                .collect(),
            compatibility_rules: self
                .compatibility
                .iter()
                .map(|(relation, rules)| (relation.to_string(), rules.len()))
                .collect(),
            synonyms: self.synonyms.len(),
            controls: self.controls,
            value_patterns: self.value_patterns.quantitative.len()
                + self.value_patterns.criteria.len()
                + self.value_patterns.source_reference.len(),
            severity_overrides: self
                .severity_overrides
                .iter()
                .map(|(rule, severity)| (rule.clone(), *severity))
                .collect(),
        }
    }
}

/// Serializable overview of a rule set, for reporting and comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetSummary {
    pub digest: String,
    pub required_tags: Vec<String>,
    pub mode_forbidden_categories: Vec<String>,
    pub mode_forbidden_keywords: usize,
    pub mechanism_keywords: usize,
    pub allowed_exceptions: usize,
    pub tag_rules: usize,
    pub abstract_concepts: usize,
    pub effect_forbidden_keywords: usize,
    pub domain_categories: Vec<String>,
    pub lifecycle_hint_keywords: usize,
    pub forbidden_pairs: BTreeMap<String, usize>,
    pub compatibility_rules: BTreeMap<String, usize>,
    pub synonyms: usize,
    pub controls: ControlRequirements,
    pub value_patterns: usize,
    pub severity_overrides: BTreeMap<String, Severity>,
}

/// Tracks which base tables were already cleared during one overlay.
#[derive(Default)]
struct Folder {
    touched: BTreeSet<SectionKind>,
    touched_pairs: BTreeSet<Relation>,
    touched_compat: BTreeSet<Relation>,
}

impl Folder {
    /// Clear the base table of `kind` the first time the text mentions it.
    fn first_visit(&mut self, rules: &mut RuleSet, kind: SectionKind) {
        if self.touched.contains(&kind) {
            return;
        }
        self.touched.insert(kind);
        match kind {
            SectionKind::RequiredTags => rules.required_tags.clear(),
            SectionKind::ForbiddenPatterns => rules.mode_forbidden.clear(),
            SectionKind::MechanismKeywords => rules.mechanism_keywords.clear(),
            SectionKind::ForbiddenExact => rules.mode_forbidden_exact.clear(),
            SectionKind::AllowedExceptions => rules.allowed_exceptions.clear(),
            SectionKind::TagKeywordMap => rules.tag_keywords.clear(),
            SectionKind::VisiblePhenomena => rules.visible_phenomena.clear(),
            SectionKind::AbstractToVisibleMap => rules.abstract_to_visible.clear(),
            SectionKind::ForbiddenPhysicalInEffect => rules.effect_forbidden.clear(),
            SectionKind::MechanismForbiddenExact => rules.mechanism_forbidden_exact.clear(),
            SectionKind::DomainCategories => rules.domain_categories.clear(),
            SectionKind::LifecycleCauseMap => rules.lifecycle_hints.clear(),
            SectionKind::Synonyms => rules.synonyms.clear(),
            SectionKind::ControlRequirements => rules.controls = ControlRequirements::default(),
            SectionKind::RequiredValuePatterns => rules.value_patterns = ValuePatterns::default(),
            SectionKind::ForbiddenSourcePatterns => {
                rules.forbidden_sources.clear();
                rules.approved_sources.clear();
            }
            SectionKind::ForbiddenVagueExpressions => rules.vague_expressions.clear(),
            SectionKind::AbbreviationMap => rules.abbreviations.clear(),
            SectionKind::SeverityLevels => rules.severity_overrides.clear(),
            // Cleared per relation, see `relation_pairs` / `relation_compat`.
            SectionKind::InvalidCombinations
            | SectionKind::FunctionEffectKeywords
            | SectionKind::KeywordCompatibility => {}
        }
    }

    fn relation_pairs<'r>(&mut self, rules: &'r mut RuleSet, relation: Relation) -> &'r mut Vec<PairRule> {
        let table = rules.forbidden_pairs.entry(relation).or_default();
        if self.touched_pairs.insert(relation) {
            table.clear();
        }
        table
    }

    fn relation_compat<'r>(
        &mut self,
        rules: &'r mut RuleSet,
        relation: Relation,
    ) -> &'r mut Vec<CompatibilityRule> {
        let table = rules.compatibility.entry(relation).or_default();
        if self.touched_compat.insert(relation) {
            table.clear();
        }
        table
    }

    fn apply(&mut self, rules: &mut RuleSet, kind: SectionKind, entry: &Entry) -> Result<(), String> {
        let label = entry.label.as_deref().unwrap_or_default();
        let values = entry.values.clone();

        match kind {
            SectionKind::RequiredTags => rules.required_tags.extend(values),
            SectionKind::ForbiddenPatterns => rules
                .mode_forbidden
                .entry(label.to_string())
                .or_default()
                .extend(values),
            SectionKind::MechanismKeywords => rules.mechanism_keywords.extend(values),
            SectionKind::ForbiddenExact => rules.mode_forbidden_exact.extend(values),
            SectionKind::AllowedExceptions => rules.allowed_exceptions.extend(values),
            SectionKind::TagKeywordMap => {
                let tag = subkey_name(entry, "TAG")?;
                let rule = rules.tag_keywords.entry(tag.to_string()).or_default();
                match label {
                    "허용" | "allow" | "allowed" => rule.allowed.extend(values),
                    "금지" | "deny" | "forbidden" => rule.forbidden.extend(values),
                    other => return Err(format!("expected `허용:` or `금지:`, found `{other}:`")),
                }
            }
            SectionKind::VisiblePhenomena => rules.visible_phenomena.extend(values),
            SectionKind::AbstractToVisibleMap => {
                rules.abstract_to_visible.insert(label.to_string(), values);
            }
            SectionKind::ForbiddenPhysicalInEffect => rules
                .effect_forbidden
                .entry(label.to_string())
                .or_default()
                .extend(values),
            SectionKind::MechanismForbiddenExact => rules.mechanism_forbidden_exact.extend(values),
            SectionKind::DomainCategories => rules
                .domain_categories
                .entry(label.to_string())
                .or_default()
                .extend(values),
            SectionKind::LifecycleCauseMap => {
                let stage: LifecycleStage = label.parse()?;
                rules.lifecycle_hints.entry(stage).or_default().extend(values);
            }
            SectionKind::InvalidCombinations => {
                let relation: Relation = subkey_name(entry, "RELATION")?.parse()?;
                self.relation_pairs(rules, relation).push(PairRule {
                    left: label.to_string(),
                    right: values,
                });
            }
            SectionKind::FunctionEffectKeywords => {
                self.relation_compat(rules, Relation::FunctionEffect)
                    .push(CompatibilityRule {
                        triggers: split_list(label),
                        allowed: values,
                    });
            }
            SectionKind::KeywordCompatibility => {
                let relation: Relation = subkey_name(entry, "RELATION")?.parse()?;
                self.relation_compat(rules, relation).push(CompatibilityRule {
                    triggers: split_list(label),
                    allowed: values,
                });
            }
            SectionKind::Synonyms => {
                rules.synonyms.entry(label.to_string()).or_default().extend(values);
            }
            SectionKind::ControlRequirements => {
                let value = single(&values)?;
                let number: usize = value
                    .parse()
                    .map_err(|_| format!("`{label}` expects a whole number, found `{value}`"))?;
                match label {
                    "min_lines" => rules.controls.min_lines = number,
                    "min_lifecycle_tags" => rules.controls.min_lifecycle_tags = number,
                    other => return Err(format!("unknown control requirement `{other}`")),
                }
            }
            SectionKind::RequiredValuePatterns => {
                let pattern = single(&values)?;
                let re = Regex::new(pattern)
                    .map_err(|err| format!("invalid regex for `{label}`: {err}"))?;
                match label {
                    "quantitative" => rules.value_patterns.quantitative.push(re),
                    "criteria" => rules.value_patterns.criteria.push(re),
                    "source_reference" => rules.value_patterns.source_reference.push(re),
                    other => return Err(format!("unknown value pattern kind `{other}`")),
                }
            }
            SectionKind::ForbiddenSourcePatterns => match label {
                "approved" => rules.approved_sources.extend(values),
                _ => rules.forbidden_sources.extend(values),
            },
            SectionKind::ForbiddenVagueExpressions => rules.vague_expressions.extend(values),
            SectionKind::AbbreviationMap => {
                rules
                    .abbreviations
                    .insert(label.to_string(), single(&values)?.to_string());
            }
            SectionKind::SeverityLevels => {
                let severity: Severity = single(&values)?.parse()?;
                rules.severity_overrides.insert(label.to_string(), severity);
            }
        }
        Ok(())
    }
}

fn subkey_name<'e>(entry: &'e Entry, expected_kind: &str) -> Result<&'e str, String> {
    match &entry.subkey {
        Some(subkey) if subkey.kind == expected_kind => Ok(subkey.name.as_str()),
        Some(subkey) => Err(format!(
            "expected a `### {expected_kind}:` block, found `### {}:`",
            subkey.kind
        )),
        None => Err(format!("entry outside a `### {expected_kind}:` block")),
    }
}

fn single(values: &[String]) -> Result<&str, String> {
    values
        .first()
        .map(String::as_str)
        .ok_or_else(|| "missing value".to_string())
}
