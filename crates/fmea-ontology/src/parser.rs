//! Line-oriented ontology parser.
//!
//! A small state machine over lines: it tracks the open section and the open
//! `### KIND:name` block, and emits typed [`Section`]s. Unknown sections map to
//! [`Section::Ignored`]; malformed lines are recorded as [`ParseDiagnostic`]s
//! and skipped, never aborting the parse.

use serde::Serialize;

/// Known section kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionKind {
    RequiredTags,
    ForbiddenPatterns,
    MechanismKeywords,
    ForbiddenExact,
    AllowedExceptions,
    TagKeywordMap,
    VisiblePhenomena,
    AbstractToVisibleMap,
    ForbiddenPhysicalInEffect,
    MechanismForbiddenExact,
    DomainCategories,
    LifecycleCauseMap,
    InvalidCombinations,
    FunctionEffectKeywords,
    KeywordCompatibility,
    Synonyms,
    ControlRequirements,
    RequiredValuePatterns,
    ForbiddenSourcePatterns,
    ForbiddenVagueExpressions,
    AbbreviationMap,
    SeverityLevels,
}

/// Section header name -> kind.
pub const SECTION_NAMES: &[(&str, SectionKind)] = &[
    ("REQUIRED_TAGS", SectionKind::RequiredTags),
    ("FORBIDDEN_PATTERNS", SectionKind::ForbiddenPatterns),
    ("MECHANISM_KEYWORDS", SectionKind::MechanismKeywords),
    ("FORBIDDEN_EXACT", SectionKind::ForbiddenExact),
    ("ALLOWED_EXCEPTIONS", SectionKind::AllowedExceptions),
    ("TAG_KEYWORD_MAP", SectionKind::TagKeywordMap),
    ("VISIBLE_PHENOMENA", SectionKind::VisiblePhenomena),
    ("ABSTRACT_TO_VISIBLE_MAP", SectionKind::AbstractToVisibleMap),
    (
        "FORBIDDEN_PHYSICAL_IN_EFFECT",
        SectionKind::ForbiddenPhysicalInEffect,
    ),
    ("MECHANISM_FORBIDDEN_EXACT", SectionKind::MechanismForbiddenExact),
    ("DOMAIN_CATEGORIES", SectionKind::DomainCategories),
    ("LIFECYCLE_CAUSE_MAP", SectionKind::LifecycleCauseMap),
    ("INVALID_COMBINATIONS", SectionKind::InvalidCombinations),
    ("FUNCTION_EFFECT_KEYWORDS", SectionKind::FunctionEffectKeywords),
    ("KEYWORD_COMPATIBILITY", SectionKind::KeywordCompatibility),
    ("SYNONYMS", SectionKind::Synonyms),
    ("CONTROL_REQUIREMENTS", SectionKind::ControlRequirements),
    ("REQUIRED_VALUE_PATTERNS", SectionKind::RequiredValuePatterns),
    ("FORBIDDEN_SOURCE_PATTERNS", SectionKind::ForbiddenSourcePatterns),
    (
        "FORBIDDEN_VAGUE_EXPRESSIONS",
        SectionKind::ForbiddenVagueExpressions,
    ),
    ("ABBREVIATION_MAP", SectionKind::AbbreviationMap),
    ("SEVERITY_LEVELS", SectionKind::SeverityLevels),
];

/// How the body lines of a section are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShape {
    /// `label: kw1, kw2, ...`
    Labeled,
    /// `kw1, kw2, ...` (a `label:` prefix is tolerated and dropped)
    BareList,
    /// `label: <raw value>`, value kept whole
    Pattern,
}

impl SectionKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        SECTION_NAMES
            .iter()
            .find_map(|(candidate, kind)| (*candidate == name).then_some(*kind))
    }

    pub fn name(self) -> &'static str {
        SECTION_NAMES
            .iter()
            .find_map(|(name, kind)| (*kind == self).then_some(*name))
            .unwrap_or("UNKNOWN")
    }

    pub fn line_shape(self) -> LineShape {
        match self {
            Self::RequiredTags | Self::AllowedExceptions => LineShape::BareList,
            Self::ControlRequirements
            | Self::RequiredValuePatterns
            | Self::AbbreviationMap
            | Self::SeverityLevels => LineShape::Pattern,
            _ => LineShape::Labeled,
        }
    }
}

/// A `### KIND:name` block header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subkey {
    pub kind: String,
    pub name: String,
}

/// One body line of a known section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// 1-based source line.
    pub line: usize,
    pub subkey: Option<Subkey>,
    pub label: Option<String>,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Known {
        kind: SectionKind,
        line: usize,
        entries: Vec<Entry>,
    },
    /// A section this loader does not understand; kept for reporting only.
    Ignored { name: String, line: usize },
}

/// A line that was skipped because it could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseDiagnostic {
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedText {
    pub sections: Vec<Section>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

const SECTION_PREFIX: &str = "## SECTION:";
const SUBKEY_PREFIX: &str = "###";
const COMMENT_PREFIXES: &[char] = &['#', '>', '|', '-'];

enum State {
    Outside,
    InKnown {
        kind: SectionKind,
        line: usize,
        subkey: Option<Subkey>,
        entries: Vec<Entry>,
    },
    InIgnored,
}

/// Split ontology text into typed sections.
pub fn parse_sections(text: &str) -> ParsedText {
    let mut parsed = ParsedText::default();
    let mut state = State::Outside;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        if let Some(name) = line.strip_prefix(SECTION_PREFIX) {
            close(&mut state, &mut parsed);
            let name = name.trim();
            state = match SectionKind::from_name(name) {
                Some(kind) => State::InKnown {
                    kind,
                    line: line_no,
                    subkey: None,
                    entries: Vec::new(),
                },
                None => {
                    tracing::debug!(section = name, line = line_no, "ignoring unknown section");
                    parsed.sections.push(Section::Ignored {
                        name: name.to_string(),
                        line: line_no,
                    });
                    State::InIgnored
                }
            };
            continue;
        }

        if line.starts_with("---") || (line.starts_with("## ") && !line.starts_with(SUBKEY_PREFIX)) {
            close(&mut state, &mut parsed);
            continue;
        }

        let State::InKnown {
            kind,
            subkey,
            entries,
            ..
        } = &mut state
        else {
            continue;
        };

        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix(SUBKEY_PREFIX) {
            match header.trim().split_once(':') {
                Some((sub_kind, name)) if !sub_kind.trim().is_empty() && !name.trim().is_empty() => {
                    *subkey = Some(Subkey {
                        kind: sub_kind.trim().to_string(),
                        name: name.trim().to_string(),
                    });
                }
                _ => parsed.diagnostics.push(ParseDiagnostic {
                    line: line_no,
                    section: Some(kind.name().to_string()),
                    reason: format!("expected `### KIND:name`, found `{line}`"),
                }),
            }
            continue;
        }

        if line.starts_with(COMMENT_PREFIXES) {
            continue;
        }

        match read_entry(*kind, line) {
            Ok((label, values)) => entries.push(Entry {
                line: line_no,
                subkey: subkey.clone(),
                label,
                values,
            }),
            Err(reason) => {
                tracing::debug!(line = line_no, section = kind.name(), %reason, "skipping ontology line");
                parsed.diagnostics.push(ParseDiagnostic {
                    line: line_no,
                    section: Some(kind.name().to_string()),
                    reason,
                });
            }
        }
    }

    close(&mut state, &mut parsed);
    parsed
}

fn close(state: &mut State, parsed: &mut ParsedText) {
    if let State::InKnown {
        kind,
        line,
        entries,
        ..
    } = std::mem::replace(state, State::Outside)
    {
        parsed.sections.push(Section::Known {
            kind,
            line,
            entries,
        });
    }
}

type EntryBody = (Option<String>, Vec<String>);

fn read_entry(kind: SectionKind, line: &str) -> Result<EntryBody, String> {
    match kind.line_shape() {
        LineShape::BareList => {
            let values: Vec<String> = split_list(line)
                .into_iter()
                .enumerate()
                .map(|(position, item)| {
                    let unlabeled = match item.split_once(':') {
                        Some((_, rest)) if position == 0 && !rest.trim().is_empty() => {
                            Some(rest.trim().to_string())
                        }
                        _ => None,
                    };
                    unlabeled.unwrap_or(item)
                })
                .collect();
            if values.is_empty() {
                return Err("empty keyword list".to_string());
            }
            Ok((None, values))
        }
        LineShape::Labeled => {
            let (label, rest) = split_label(line)?;
            let values = split_list(rest);
            if values.is_empty() {
                return Err(format!("label `{label}` has no keywords"));
            }
            Ok((Some(label), values))
        }
        LineShape::Pattern => {
            let (label, rest) = split_label(line)?;
            let value = rest.trim();
            if value.is_empty() {
                return Err(format!("label `{label}` has no value"));
            }
            Ok((Some(label), vec![value.to_string()]))
        }
    }
}

fn split_label(line: &str) -> Result<(String, &str), String> {
    let (label, rest) = line
        .split_once(':')
        .ok_or_else(|| format!("expected `label: values`, found `{line}`"))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(format!("empty label in `{line}`"));
    }
    Ok((label.to_string(), rest))
}

/// Comma-separated list, trimmed, empties dropped.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
