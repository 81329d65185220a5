use serde::{Deserialize, Serialize};

use super::word_search::{fixed_pattern_length, LengthBounds, RackMode, RackSearcher};

/// Inclusive numeric range carried by range conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub min: u32,
    pub max: u32,
}

impl Range {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn exactly(value: u32) -> Self {
        Self::new(value, value)
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn intersect(&self, other: &Range) -> Range {
        Range::new(self.min.max(other.min), self.max.min(other.max))
    }

    /// Smallest range covering both
    pub fn cover(&self, other: &Range) -> Range {
        Range::new(self.min.min(other.min), self.max.max(other.max))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    Length(Range),
    NumVowels(Range),
    NumUniqueLetters(Range),
    PointValue(Range),
    NumAnagrams(Range),
    /// Every letter of the payload appears in the word
    IncludeLetters(String),
    PatternMatch(String),
    AnagramMatch(String),
    SubanagramMatch(String),
    ConsistOf(String),
    /// Prepending the payload forms a valid word
    Prefix(String),
    /// Appending the payload forms a valid word
    Suffix(String),
    /// Membership in a named search set
    BelongToGroup(String),
    ProbabilityOrder { range: Range, lax: bool },
    LimitByProbabilityOrder { range: Range, lax: bool },
    InWordList(Vec<String>),
}

/// Discriminant of a [`Condition`], used to classify and group conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConditionKind {
    Length,
    NumVowels,
    NumUniqueLetters,
    PointValue,
    NumAnagrams,
    IncludeLetters,
    PatternMatch,
    AnagramMatch,
    SubanagramMatch,
    ConsistOf,
    Prefix,
    Suffix,
    BelongToGroup,
    ProbabilityOrder,
    LimitByProbabilityOrder,
    InWordList,
}

impl ConditionKind {
    /// Conditions answered by walking the word graph
    pub fn is_graph(&self) -> bool {
        matches!(
            self,
            Self::PatternMatch | Self::AnagramMatch | Self::SubanagramMatch | Self::ConsistOf
        )
    }

    /// Conditions answered by the statistics store
    pub fn is_store(&self) -> bool {
        matches!(
            self,
            Self::Length
                | Self::NumVowels
                | Self::NumUniqueLetters
                | Self::PointValue
                | Self::NumAnagrams
                | Self::IncludeLetters
                | Self::InWordList
                | Self::ProbabilityOrder
        )
    }

    /// Conditions checked word by word after the other passes
    pub fn is_post(&self) -> bool {
        matches!(
            self,
            Self::Prefix | Self::Suffix | Self::BelongToGroup | Self::LimitByProbabilityOrder
        )
    }
}

impl Condition {
    pub fn kind(&self) -> ConditionKind {
        match self {
            Condition::Length(_) => ConditionKind::Length,
            Condition::NumVowels(_) => ConditionKind::NumVowels,
            Condition::NumUniqueLetters(_) => ConditionKind::NumUniqueLetters,
            Condition::PointValue(_) => ConditionKind::PointValue,
            Condition::NumAnagrams(_) => ConditionKind::NumAnagrams,
            Condition::IncludeLetters(_) => ConditionKind::IncludeLetters,
            Condition::PatternMatch(_) => ConditionKind::PatternMatch,
            Condition::AnagramMatch(_) => ConditionKind::AnagramMatch,
            Condition::SubanagramMatch(_) => ConditionKind::SubanagramMatch,
            Condition::ConsistOf(_) => ConditionKind::ConsistOf,
            Condition::Prefix(_) => ConditionKind::Prefix,
            Condition::Suffix(_) => ConditionKind::Suffix,
            Condition::BelongToGroup(_) => ConditionKind::BelongToGroup,
            Condition::ProbabilityOrder { .. } => ConditionKind::ProbabilityOrder,
            Condition::LimitByProbabilityOrder { .. } => ConditionKind::LimitByProbabilityOrder,
            Condition::InWordList(_) => ConditionKind::InWordList,
        }
    }

    pub fn range(&self) -> Option<Range> {
        match self {
            Condition::Length(r)
            | Condition::NumVowels(r)
            | Condition::NumUniqueLetters(r)
            | Condition::PointValue(r)
            | Condition::NumAnagrams(r) => Some(*r),
            Condition::ProbabilityOrder { range, .. }
            | Condition::LimitByProbabilityOrder { range, .. } => Some(*range),
            _ => None,
        }
    }

    fn with_range(&self, r: Range) -> Condition {
        match self {
            Condition::Length(_) => Condition::Length(r),
            Condition::NumVowels(_) => Condition::NumVowels(r),
            Condition::NumUniqueLetters(_) => Condition::NumUniqueLetters(r),
            Condition::PointValue(_) => Condition::PointValue(r),
            Condition::NumAnagrams(_) => Condition::NumAnagrams(r),
            Condition::ProbabilityOrder { lax, .. } => Condition::ProbabilityOrder {
                range: r,
                lax: *lax,
            },
            Condition::LimitByProbabilityOrder { lax, .. } => Condition::LimitByProbabilityOrder {
                range: r,
                lax: *lax,
            },
            other => other.clone(),
        }
    }

    pub fn lax(&self) -> bool {
        match self {
            Condition::ProbabilityOrder { lax, .. }
            | Condition::LimitByProbabilityOrder { lax, .. } => *lax,
            _ => false,
        }
    }

    /// Payload upper-cased the way the graph stores words
    fn normalized(&self) -> Condition {
        match self {
            Condition::IncludeLetters(s) => Condition::IncludeLetters(s.to_uppercase()),
            Condition::PatternMatch(s) => Condition::PatternMatch(s.to_uppercase()),
            Condition::AnagramMatch(s) => Condition::AnagramMatch(s.to_uppercase()),
            Condition::SubanagramMatch(s) => Condition::SubanagramMatch(s.to_uppercase()),
            Condition::ConsistOf(s) => Condition::ConsistOf(s.to_uppercase()),
            Condition::Prefix(s) => Condition::Prefix(s.to_uppercase()),
            Condition::Suffix(s) => Condition::Suffix(s.to_uppercase()),
            Condition::InWordList(words) => {
                Condition::InWordList(words.iter().map(|w| w.to_uppercase()).collect())
            }
            other => other.clone(),
        }
    }

    /// Word length implied by a fixed-length match condition
    pub fn implied_length(&self) -> Option<u32> {
        match self {
            Condition::PatternMatch(p) => fixed_pattern_length(p),
            Condition::AnagramMatch(q) => {
                RackSearcher::new(q, RackMode::Anagram, LengthBounds::default()).fixed_length()
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCondition {
    pub condition: Condition,
    #[serde(default)]
    pub negated: bool,
    /// Older tie-break rules for probability windows
    #[serde(default)]
    pub legacy: bool,
}

impl SearchCondition {
    pub fn new(condition: Condition) -> Self {
        Self {
            condition,
            negated: false,
            legacy: false,
        }
    }

    pub fn negated(mut self) -> Self {
        self.negated = true;
        self
    }

    pub fn legacy(mut self) -> Self {
        self.legacy = true;
        self
    }

    pub fn kind(&self) -> ConditionKind {
        self.condition.kind()
    }

    /// Conditions sharing a merge key may be folded into one range.
    pub fn merge_key(&self) -> Option<(ConditionKind, bool, bool)> {
        if self.negated {
            return None;
        }
        self.condition
            .range()
            .map(|_| (self.kind(), self.legacy, self.condition.lax()))
    }
}

impl From<Condition> for SearchCondition {
    fn from(condition: Condition) -> Self {
        SearchCondition::new(condition)
    }
}

/// A declarative search: a list of conditions and how list-valued
/// conditions combine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpec {
    pub conditions: Vec<SearchCondition>,
    #[serde(default = "default_conjunction")]
    pub conjunction: bool,
}

fn default_conjunction() -> bool {
    true
}

impl Default for SearchSpec {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            conjunction: true,
        }
    }
}

impl SearchSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn any_of() -> Self {
        Self {
            conditions: Vec::new(),
            conjunction: false,
        }
    }

    pub fn with<C: Into<SearchCondition>>(mut self, condition: C) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Rewrites the spec into an equivalent one that is cheaper to run:
    /// payloads are upper-cased, fixed-length matches imply a Length
    /// condition and same-kind ranges are folded together. Applying it twice
    /// gives the same spec as applying it once.
    pub fn optimize(&self) -> SearchSpec {
        let mut conditions = self
            .conditions
            .iter()
            .map(|c| SearchCondition {
                condition: c.condition.normalized(),
                negated: c.negated,
                legacy: c.legacy,
            })
            .collect::<Vec<_>>();

        conditions.extend(self.implied_lengths(&conditions));

        let mut merged: Vec<SearchCondition> = Vec::with_capacity(conditions.len());
        for condition in conditions {
            let key = condition.merge_key();
            let slot = key.and_then(|key| merged.iter().position(|c| c.merge_key() == Some(key)));
            match (slot, condition.condition.range()) {
                (Some(i), Some(range)) => {
                    let existing = &mut merged[i];
                    // merge_key guarantees a range on both sides
                    let current = existing.condition.range().unwrap_or(range);
                    let folded = if self.conjunction {
                        current.intersect(&range)
                    } else {
                        current.cover(&range)
                    };
                    existing.condition = existing.condition.with_range(folded);
                }
                _ => merged.push(condition),
            }
        }

        SearchSpec {
            conditions: merged,
            conjunction: self.conjunction,
        }
    }

    fn implied_lengths(&self, conditions: &[SearchCondition]) -> Vec<SearchCondition> {
        let matches = conditions.iter().filter(|c| c.kind().is_graph());
        if self.conjunction {
            matches
                .filter(|c| !c.negated)
                .filter_map(|c| c.condition.implied_length())
                .map(|len| SearchCondition::new(Condition::Length(Range::exactly(len))))
                .collect()
        } else {
            // Any one match may hold, so only a range covering all of them is
            // safe. A caller Length already bounds the walk and must not be
            // widened by that cover.
            let bounded = conditions.iter().any(|c| {
                !c.negated
                    && matches!(
                        c.kind(),
                        ConditionKind::InWordList | ConditionKind::Length
                    )
            });
            if bounded {
                return Vec::new();
            }
            let mut cover: Option<Range> = None;
            for c in matches {
                if c.negated {
                    return Vec::new();
                }
                match c.condition.implied_length() {
                    Some(len) => {
                        let r = Range::exactly(len);
                        cover = Some(cover.map_or(r, |c| c.cover(&r)));
                    }
                    None => return Vec::new(),
                }
            }
            cover
                .map(|r| vec![SearchCondition::new(Condition::Length(r))])
                .unwrap_or_default()
        }
    }

    /// Intersection of every positive Length condition
    pub fn length_bounds(&self) -> LengthBounds {
        let mut bounds = LengthBounds::default();
        for c in self.conditions.iter().filter(|c| !c.negated) {
            if let Condition::Length(r) = c.condition {
                bounds = LengthBounds::new(bounds.min.max(r.min), bounds.max.min(r.max));
            }
        }
        bounds
    }
}
