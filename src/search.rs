use crate::record::CapabilityRecord;
use crate::store::StoredRecord;
use serde::{Deserialize, Serialize};

/// Record fields a text query can match against
///
/// The searchable field set is configuration, not a hard-coded list: callers
/// pass a slice of these, usually [`DEFAULT_SEARCH_FIELDS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Skill,
    Competency,
    Keywords,
    CapabilityGroup,
    Description,
}

/// Canonical searchable field set
pub const DEFAULT_SEARCH_FIELDS: [SearchField; 4] = [
    SearchField::Skill,
    SearchField::Competency,
    SearchField::Keywords,
    SearchField::CapabilityGroup,
];

/// What an empty query with no structural filters should return
///
/// The interactive flow treats "nothing typed, nothing selected" as "show
/// nothing" rather than "show everything". Kept configurable because other
/// iterations of the tool chose the opposite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyQueryPolicy {
    /// Empty query and no filters displays no results (canonical)
    #[default]
    ShowNothing,

    /// Empty query and no filters displays the full record set
    ShowAll,
}

/// One search/filter request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Free-text query; matched case-insensitively as a substring
    #[serde(default)]
    pub query: String,

    /// Domains to restrict to; empty means no domain restriction
    #[serde(default)]
    pub domains: Vec<String>,

    /// Only return records with a real global SME contact
    #[serde(default)]
    pub require_sme: bool,
}

impl SearchFilter {
    /// Whether any structural (non-text) filter is active
    pub fn has_structural_filter(&self) -> bool {
        !self.domains.is_empty() || self.require_sme
    }
}

/// Records of one domain, for grouped display
#[derive(Debug, Clone)]
pub struct DomainGroup<'a> {
    /// Domain name
    pub domain: &'a str,

    /// Matching records of the domain, in original relative order
    pub records: Vec<&'a StoredRecord>,
}

/// Filter the record set
///
/// Applies the text query and structural filters, preserving the records'
/// original relative order. Matching is a flat filter with no ranking.
///
/// An empty query with active structural filters returns everything passing
/// those filters; an empty query with no filters is decided by `policy`.
/// Filtering is idempotent: filtering an already-filtered result by the same
/// filter yields the same set.
///
/// # Arguments
/// * `records` - The full record set, in insertion order
/// * `filter` - Query text and structural filters
/// * `fields` - Which fields the text query matches against
/// * `policy` - Empty-query behavior
///
/// # Returns
/// * `Vec<&StoredRecord>` - Matching records in original relative order
pub fn filter_records<'a>(
    records: &'a [StoredRecord],
    filter: &SearchFilter,
    fields: &[SearchField],
    policy: EmptyQueryPolicy,
) -> Vec<&'a StoredRecord> {
    let query = filter.query.trim().to_lowercase();

    if query.is_empty()
        && !filter.has_structural_filter()
        && policy == EmptyQueryPolicy::ShowNothing
    {
        return Vec::new();
    }

    records
        .iter()
        .filter(|stored| {
            if !filter.domains.is_empty() && !filter.domains.contains(&stored.record.domain) {
                return false;
            }
            if filter.require_sme && !stored.record.has_global_sme() {
                return false;
            }
            query.is_empty() || matches_query(&stored.record, &query, fields)
        })
        .collect()
}

/// Whether a record matches a lowercased query on any of the given fields
///
/// A missing or blank field behaves as an empty string: it simply never
/// matches, it is never an error.
///
/// # Arguments
/// * `record` - The record to test
/// * `query` - The query, already trimmed and lowercased
/// * `fields` - Fields to match against
///
/// # Returns
/// * `bool` - True if the query is a substring of any field
pub fn matches_query(record: &CapabilityRecord, query: &str, fields: &[SearchField]) -> bool {
    fields.iter().any(|field| {
        let value = match field {
            SearchField::Skill => &record.skill,
            SearchField::Competency => &record.competency,
            SearchField::Keywords => &record.keywords,
            SearchField::CapabilityGroup => &record.capability_group,
            SearchField::Description => &record.description,
        };
        value.to_lowercase().contains(query)
    })
}

/// Group filtered records by domain for display
///
/// Groups appear in the order their domain is first encountered in the
/// filtered result; records keep their relative order inside each group.
///
/// # Arguments
/// * `records` - Filtered records, in original relative order
///
/// # Returns
/// * `Vec<DomainGroup>` - One group per domain present in the input
pub fn group_by_domain<'a>(records: &[&'a StoredRecord]) -> Vec<DomainGroup<'a>> {
    let mut groups: Vec<DomainGroup<'a>> = Vec::new();

    for stored in records.iter().copied() {
        match groups.iter().position(|g| g.domain == stored.record.domain) {
            Some(i) => groups[i].records.push(stored),
            None => groups.push(DomainGroup {
                domain: &stored.record.domain,
                records: vec![stored],
            }),
        }
    }

    groups
}
