//! Column mapping for the capability workbook.
//!
//! The source workbook does not carry stable headers for every field: the
//! classification labels and four of the five division contact columns have
//! blank headers and are only identifiable by position, and the positions
//! have shifted between workbook revisions. This module pins the expected
//! header name or column position per logical field for the current revision
//! in one explicit table. The table is resolved once per sheet, never looked
//! up ad hoc per row.
//!
//! Current revision layout (0-based column positions):
//!
//! | Logical field        | Header / position                                        |
//! |----------------------|----------------------------------------------------------|
//! | competency           | `Competency`                                             |
//! | skill                | `Skill`                                                  |
//! | description          | `Description`                                            |
//! | capability group     | blank header, column 8                                   |
//! | group capability     | blank header, column 9                                   |
//! | global SME           | any header containing `Lead Contact` but not `Division`  |
//! | keywords             | `Keywords` (absent from older revisions)                 |
//! | SME (Environment)    | `Lead Contact in Division (SME, Team Lead, Head of etc)`, column 16 |
//! | SME (Energy)         | blank header, column 17                                  |
//! | SME (D&AS)           | blank header, column 18                                  |
//! | SME (TC&I)           | blank header, column 19                                  |
//! | SME (APAC)           | blank header, column 20                                  |

use crate::record::{CapabilityRecord, Division};

/// Header name of the Environment division contact column (the only division
/// column that carries a real header in the current revision)
const ENVIRONMENT_SME_HEADER: &str = "Lead Contact in Division (SME, Team Lead, Head of etc)";

/// Logical fields of a capability record that are sourced from columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalField {
    Competency,
    Skill,
    Description,
    CapabilityGroup,
    GroupCapability,
    GlobalSme,
    Keywords,
    DivisionSme(Division),
}

/// How to locate one logical field among a sheet's headers
#[derive(Debug, Clone, Copy)]
pub enum ColumnRule {
    /// Match a header by exact (normalized) name
    Named(&'static str),

    /// Prefer the named header, fall back to a fixed position when the
    /// header is absent or blank in this revision
    NamedOrIndex(&'static str, usize),

    /// Fixed position only; the column has no usable header
    Index(usize),

    /// First header containing `needle` but not `excluding`
    Containing {
        needle: &'static str,
        excluding: &'static str,
    },
}

/// The full logical-field → column rule table for one workbook revision
#[derive(Debug, Clone)]
pub struct ColumnMap {
    entries: Vec<(LogicalField, ColumnRule)>,
}

impl ColumnMap {
    /// Column map for the current workbook revision
    ///
    /// See the module docs for the layout this encodes. Revisions that move
    /// a column change this one constructor, nothing else.
    pub fn current_revision() -> Self {
        use ColumnRule::*;
        use LogicalField::*;

        ColumnMap {
            entries: vec![
                (Competency, Named("Competency")),
                (Skill, Named("Skill")),
                (Description, Named("Description")),
                (CapabilityGroup, NamedOrIndex("Capability Group", 8)),
                (GroupCapability, NamedOrIndex("Group Capability", 9)),
                (
                    GlobalSme,
                    Containing {
                        needle: "Lead Contact",
                        excluding: "Division",
                    },
                ),
                (Keywords, Named("Keywords")),
                (
                    DivisionSme(Division::Environment),
                    NamedOrIndex(ENVIRONMENT_SME_HEADER, 16),
                ),
                (DivisionSme(Division::Energy), Index(17)),
                (DivisionSme(Division::Das), Index(18)),
                (DivisionSme(Division::Tci), Index(19)),
                (DivisionSme(Division::Apac), Index(20)),
            ],
        }
    }

    /// Resolve every logical field against one sheet's normalized headers
    ///
    /// Runs once per sheet. A field whose column cannot be located resolves
    /// to `None` and later yields empty values; a missing expected column is
    /// never an error.
    ///
    /// # Arguments
    /// * `headers` - Normalized header names, in column order
    ///
    /// # Returns
    /// * `ResolvedColumns` - Per-field column positions for this sheet
    pub fn resolve(&self, headers: &[String]) -> ResolvedColumns {
        let slots = self
            .entries
            .iter()
            .map(|(field, rule)| (*field, resolve_rule(rule, headers)))
            .collect();

        ResolvedColumns { slots }
    }
}

/// Locate one column according to its rule
fn resolve_rule(rule: &ColumnRule, headers: &[String]) -> Option<usize> {
    match rule {
        ColumnRule::Named(name) => headers.iter().position(|h| h == name),
        ColumnRule::NamedOrIndex(name, index) => headers
            .iter()
            .position(|h| h == name)
            .or(if *index < headers.len() {
                Some(*index)
            } else {
                None
            }),
        ColumnRule::Index(index) => {
            if *index < headers.len() {
                Some(*index)
            } else {
                None
            }
        }
        ColumnRule::Containing { needle, excluding } => headers
            .iter()
            .position(|h| h.contains(needle) && !h.contains(excluding)),
    }
}

/// Column positions for one sheet, produced by [`ColumnMap::resolve`]
#[derive(Debug, Clone)]
pub struct ResolvedColumns {
    slots: Vec<(LogicalField, Option<usize>)>,
}

impl ResolvedColumns {
    /// Resolved position of one logical field, if its column was found
    pub fn position(&self, field: LogicalField) -> Option<usize> {
        self.slots
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, pos)| *pos)
    }

    /// Extract one field's value from a row of cell texts
    fn value(&self, field: LogicalField, cells: &[String]) -> String {
        self.position(field)
            .and_then(|i| cells.get(i))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    /// Build a capability record from one data row
    ///
    /// Every logical field is populated (possibly with an empty string);
    /// missing columns and short rows both yield empty values.
    ///
    /// # Arguments
    /// * `domain` - Source sheet name, tagged onto the record
    /// * `cells` - Cell texts of the row, in column order
    ///
    /// # Returns
    /// * `CapabilityRecord` - The normalized record
    pub fn record_from_row(&self, domain: &str, cells: &[String]) -> CapabilityRecord {
        let mut record = CapabilityRecord::empty(domain);

        record.competency = self.value(LogicalField::Competency, cells);
        record.skill = self.value(LogicalField::Skill, cells);
        record.description = self.value(LogicalField::Description, cells);
        record.capability_group = self.value(LogicalField::CapabilityGroup, cells);
        record.group_capability = self.value(LogicalField::GroupCapability, cells);
        record.global_sme = self.value(LogicalField::GlobalSme, cells);
        record.keywords = self.value(LogicalField::Keywords, cells);

        for division in Division::ALL {
            let contact = self.value(LogicalField::DivisionSme(division), cells);
            record.division_smes.insert(division, contact);
        }

        record
    }
}
