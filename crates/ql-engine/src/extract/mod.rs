//! Entity extraction: pull supplier, material, factory, status, batch and
//! date values out of raw query text.
//!
//! Literal values from every active rule's entity schema are pooled into a
//! [`Lexicon`]. Matching is longest-literal-first: once a literal claims a
//! span of the query, no shorter literal may match inside that span, so
//! "电池" is never reported when the query says "电池盖".

pub mod dates;

use std::collections::BTreeMap;
use std::ops::Range;

use chrono::NaiveDate;
use regex::Regex;

use ql_protocol::{EntityMap, IntentRule};

pub use dates::DateRange;

/// Entity names filled by date-range extraction.
pub const DATE_FROM: &str = "date_from";
pub const DATE_TO: &str = "date_to";

/// A literal and every (entity, canonical value) it resolves to.
#[derive(Debug, Clone)]
struct Literal {
    /// ASCII-lowercased literal text.
    needle: String,
    chars: usize,
    targets: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct PatternEntity {
    entity: String,
    regex: Regex,
}

/// Pooled known values of every entity across a rule set.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    literals: Vec<Literal>,
    patterns: Vec<PatternEntity>,
    samples: BTreeMap<String, Vec<String>>,
}

impl Lexicon {
    /// Pool the entity schemas of `rules` (in declaration order; the first
    /// definition of a literal decides its canonical value per entity).
    pub fn build<'a>(rules: impl IntoIterator<Item = &'a IntentRule>) -> Self {
        let mut literals: Vec<Literal> = Vec::new();
        let mut patterns: Vec<PatternEntity> = Vec::new();
        let mut samples: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for rule in rules {
            for (entity, def) in &rule.entities {
                for (raw, canonical) in def.literals() {
                    if raw.is_empty() {
                        continue;
                    }
                    let needle = raw.to_ascii_lowercase();
                    let idx = match literals.iter().position(|l| l.needle == needle) {
                        Some(idx) => idx,
                        None => {
                            literals.push(Literal {
                                chars: needle.chars().count(),
                                needle,
                                targets: Vec::new(),
                            });
                            literals.len() - 1
                        }
                    };
                    let lit = &mut literals[idx];
                    if !lit.targets.iter().any(|(e, _)| e == entity) {
                        lit.targets.push((entity.clone(), canonical.to_string()));
                    }

                    let seen = samples.entry(entity.clone()).or_default();
                    if !seen.iter().any(|s| s == canonical) {
                        seen.push(canonical.to_string());
                    }
                }

                if let Some(pattern) = &def.pattern
                    && !patterns.iter().any(|p| &p.entity == entity)
                {
                    match Regex::new(pattern) {
                        Ok(regex) => patterns.push(PatternEntity {
                            entity: entity.clone(),
                            regex,
                        }),
                        Err(e) => {
                            tracing::warn!(entity = %entity, error = %e, "skipping invalid entity pattern");
                        }
                    }
                }
            }
        }

        // Longest first; ties by text so the order never depends on rule order.
        literals.sort_by(|a, b| b.chars.cmp(&a.chars).then_with(|| a.needle.cmp(&b.needle)));

        Self {
            literals,
            patterns,
            samples,
        }
    }

    /// Extract entities, resolving relative dates against today's local date.
    pub fn extract(&self, text: &str) -> EntityMap {
        self.extract_at(text, chrono::Local::now().date_naive())
    }

    /// Extract entities from `text`. Pure in `(self, text, today)`.
    pub fn extract_at(&self, text: &str, today: NaiveDate) -> EntityMap {
        let lowered = text.to_ascii_lowercase();
        let mut claimed: Vec<Range<usize>> = Vec::new();
        let mut entities = EntityMap::new();

        if let Some((range, spans)) = dates::extract_range(&lowered, today) {
            entities.insert(DATE_FROM.into(), range.from.format("%Y-%m-%d").to_string());
            entities.insert(DATE_TO.into(), range.to.format("%Y-%m-%d").to_string());
            claimed.extend(spans);
        }

        // Within one literal length, earlier occurrences in the text win.
        for group in self.literals.chunk_by(|a, b| a.chars == b.chars) {
            let mut hits: Vec<(Range<usize>, &Literal)> = group
                .iter()
                .flat_map(|lit| {
                    lowered
                        .match_indices(lit.needle.as_str())
                        .map(move |(start, m)| (start..start + m.len(), lit))
                })
                .collect();
            hits.sort_by_key(|(span, _)| span.start);

            for (span, lit) in hits {
                if claimed.iter().any(|c| overlaps(c, &span)) {
                    continue;
                }
                claimed.push(span);
                for (entity, canonical) in &lit.targets {
                    entities
                        .entry(entity.clone())
                        .or_insert_with(|| canonical.clone());
                }
            }
        }

        for p in &self.patterns {
            if entities.contains_key(&p.entity) {
                continue;
            }
            // The first capture group, when present, is the value.
            let hit = p
                .regex
                .captures_iter(&lowered)
                .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
                .find(|m| !claimed.iter().any(|c| overlaps(c, &m.range())));
            if let Some(m) = hit {
                // Lowercasing is ASCII-only, so byte offsets line up with `text`.
                entities.insert(p.entity.clone(), text[m.range()].to_string());
                claimed.push(m.range());
            }
        }

        entities
    }

    /// Names of every entity this lexicon can fill (literal or pattern).
    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .samples
            .keys()
            .map(String::as_str)
            .chain(self.patterns.iter().map(|p| p.entity.as_str()))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// One-line description of known entity categories with a few sample
    /// values each, e.g. `material(电池盖、中框), supplier(聚龙、BOE)`.
    pub fn summary(&self, max_samples: usize) -> String {
        self.samples
            .iter()
            .map(|(entity, values)| {
                let shown: Vec<&str> = values.iter().take(max_samples).map(String::as_str).collect();
                format!("{entity}({})", shown.join("、"))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty() && self.patterns.is_empty()
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}
