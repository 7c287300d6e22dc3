use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Literal left behind by spreadsheet tooling when a contact cell was blank.
///
/// Cells that were empty in the source workbook frequently arrive as the
/// text "nan" rather than an empty string; the two are equivalent for every
/// purpose in this application.
pub const NULL_MARKER: &str = "nan";

/// Canonical placeholder shown for an unset contact ("to be confirmed").
pub const TBC: &str = "TBC";

/// Organizational divisions with their own SME contact column
///
/// This is a fixed, build-time set: the division list is part of the workbook
/// layout contract and is never derived from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Division {
    /// Environment division
    Environment,

    /// Energy division
    Energy,

    /// Defence & Aerospace Services
    #[serde(rename = "D&AS")]
    Das,

    /// Transport, Communications & Infrastructure
    #[serde(rename = "TC&I")]
    Tci,

    /// Asia-Pacific region
    #[serde(rename = "APAC")]
    Apac,
}

impl Division {
    /// All divisions, in the order their columns appear in the workbook
    pub const ALL: [Division; 5] = [
        Division::Environment,
        Division::Energy,
        Division::Das,
        Division::Tci,
        Division::Apac,
    ];

    /// Display label for the division (also its serialized form)
    pub fn label(&self) -> &'static str {
        match self {
            Division::Environment => "Environment",
            Division::Energy => "Energy",
            Division::Das => "D&AS",
            Division::Tci => "TC&I",
            Division::Apac => "APAC",
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single normalized capability record
///
/// One row of one domain sheet after ingestion. Every field is always
/// present; fields whose source column was missing or blank hold an empty
/// string. `domain` is the name of the sheet the row came from and is never
/// empty after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityRecord {
    /// Organizational category; equals the source sheet name
    pub domain: String,

    /// Competency label
    pub competency: String,

    /// Skill label
    pub skill: String,

    /// Free-text description
    pub description: String,

    /// First-level classification label (positionally sourced column)
    pub capability_group: String,

    /// Second-level classification label (positionally sourced column)
    pub group_capability: String,

    /// Organization-wide SME contact; raw as ingested, rendered as "TBC"
    /// by the presentation layer when blank
    pub global_sme: String,

    /// Per-division SME contacts; every division key is always present
    pub division_smes: BTreeMap<Division, String>,

    /// Free-text keywords used only for search matching, never displayed
    pub keywords: String,
}

impl CapabilityRecord {
    /// Create an empty record for the given domain
    ///
    /// All text fields are empty strings and every division key is present
    /// (mapped to an empty contact).
    ///
    /// # Arguments
    /// * `domain` - Source sheet name
    ///
    /// # Returns
    /// * `CapabilityRecord` - Record with all fields blank except `domain`
    pub fn empty(domain: &str) -> Self {
        let mut division_smes = BTreeMap::new();
        for division in Division::ALL {
            division_smes.insert(division, String::new());
        }

        CapabilityRecord {
            domain: domain.to_string(),
            competency: String::new(),
            skill: String::new(),
            description: String::new(),
            capability_group: String::new(),
            group_capability: String::new(),
            global_sme: String::new(),
            division_smes,
            keywords: String::new(),
        }
    }

    /// Whether this record has a real organization-wide SME contact
    ///
    /// True when the global SME field is non-empty after trimming and is not
    /// the null-marker literal. This is a derived value, recomputed on every
    /// call and never stored.
    pub fn has_global_sme(&self) -> bool {
        let value = self.global_sme.trim();
        !value.is_empty() && !value.eq_ignore_ascii_case(NULL_MARKER)
    }

    /// SME contact for one division, raw as ingested
    ///
    /// # Arguments
    /// * `division` - The division to look up
    ///
    /// # Returns
    /// * `&str` - The contact string, empty if unset
    pub fn division_sme(&self, division: Division) -> &str {
        self.division_smes
            .get(&division)
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

/// Render a contact field for display
///
/// Blank contacts and null-marker text both render as the "TBC"
/// placeholder; anything else is shown trimmed.
///
/// # Arguments
/// * `raw` - The contact value as ingested
///
/// # Returns
/// * `&str` - "TBC" or the trimmed contact string
pub fn display_contact(raw: &str) -> &str {
    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(NULL_MARKER) {
        TBC
    } else {
        value
    }
}
