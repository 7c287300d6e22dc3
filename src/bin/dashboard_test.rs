use capsearch::dashboard::{division_coverage, domain_counts};
use capsearch::record::{CapabilityRecord, Division};
use capsearch::store::StoredRecord;

// Record set spanning three domains, with interleaved domain order and a
// spread of blank, null-marker and real division contacts
fn fixture_records() -> Vec<StoredRecord> {
    let mut records = Vec::new();

    let mut make = |domain: &str, skill: &str, contacts: &[(Division, &str)]| {
        let mut record = CapabilityRecord::empty(domain);
        record.skill = skill.to_string();
        for (division, contact) in contacts {
            record
                .division_smes
                .insert(*division, contact.to_string());
        }
        records.push(StoredRecord {
            id: records.len() as u64 + 1,
            record,
        });
    };

    make(
        "Environment",
        "Hydrology",
        &[(Division::Environment, "Chris Wren"), (Division::Energy, "nan")],
    );
    make("Energy", "Turbine Maintenance", &[(Division::Energy, "Lee Park")]);
    // Back to a domain seen earlier: must not create a second group
    make(
        "Environment",
        "Land Remediation",
        &[(Division::Environment, "  "), (Division::Tci, "NaN")],
    );
    make("APAC Projects", "Rail Signalling", &[(Division::Apac, "Ana Cole")]);
    make("Energy", "Grid Design", &[(Division::Energy, " Dana Reed ")]);

    records
}

fn test_domain_counts() {
    println!("\n====== Testing domain counts ======");
    let records = fixture_records();

    let counts = domain_counts(&records);

    let names: Vec<&str> = counts.iter().map(|c| c.domain.as_str()).collect();
    assert_eq!(names, vec!["Environment", "Energy", "APAC Projects"]);
    println!("✓ Domains appear in first-encountered order");

    let totals: Vec<usize> = counts.iter().map(|c| c.count).collect();
    assert_eq!(totals, vec![2, 2, 1]);
    println!("✓ Interleaved records accumulate into one entry per domain");

    assert_eq!(
        counts.iter().map(|c| c.count).sum::<usize>(),
        records.len()
    );
    println!("✓ Counts sum to the record total");

    assert!(domain_counts(&[]).is_empty());
    println!("✓ An empty record set yields no entries");
}

fn test_division_coverage() {
    println!("\n====== Testing division coverage ======");
    let records = fixture_records();

    let coverage = division_coverage(&records);

    let labels: Vec<&str> = coverage.iter().map(|c| c.division.as_str()).collect();
    assert_eq!(labels, vec!["Environment", "Energy", "D&AS", "TC&I", "APAC"]);
    println!("✓ One entry per division, in workbook column order");

    assert!(coverage.iter().all(|c| c.total == records.len()));
    println!("✓ Every entry carries the full record total");

    // Environment: "Chris Wren" counts, the whitespace-only contact does not
    assert_eq!(coverage[0].with_contact, 1);
    println!("✓ Blank contacts are not covered");

    // Energy: "nan" does not count, "Lee Park" and " Dana Reed " do
    assert_eq!(coverage[1].with_contact, 2);
    // TC&I: its only contact is "NaN"
    assert_eq!(coverage[3].with_contact, 0);
    println!("✓ Null-marker contacts are excluded, case-insensitively");

    assert_eq!(coverage[2].with_contact, 0);
    assert_eq!(coverage[4].with_contact, 1);
    println!("✓ Real contacts count even with surrounding whitespace");
}

fn main() {
    test_domain_counts();
    test_division_coverage();

    println!("\nAll dashboard tests passed!");
}
