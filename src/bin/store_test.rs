use capsearch::export::{to_csv, to_xlsx};
use capsearch::record::{CapabilityRecord, Division};
use capsearch::store::{FeedbackStore, RecordPatch, RecordStore};

fn fixture_records() -> Vec<CapabilityRecord> {
    let skills = [
        ("Environment", "Hydrology"),
        ("Environment", "Land Remediation"),
        ("Energy", "Turbine Maintenance"),
        ("Energy", "Grid Design"),
        ("Energy", "Welding"),
        ("APAC Projects", "Rail Signalling"),
    ];

    skills
        .iter()
        .map(|(domain, skill)| {
            let mut record = CapabilityRecord::empty(domain);
            record.skill = skill.to_string();
            record.competency = format!("{} competency", skill);
            record
        })
        .collect()
}

fn test_replace_all(store: &RecordStore) {
    println!("\n====== Testing replace_all ======");

    let count = store.replace_all(fixture_records()).unwrap();
    assert_eq!(count, 6);

    let stored = store.read_all().unwrap();
    assert_eq!(stored.len(), 6);
    let ids: Vec<u64> = stored.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    println!("✓ Identifiers assigned 1..n in ingestion order");

    assert_eq!(stored[4].record.skill, "Welding");
    assert_eq!(stored[4].record.domain, "Energy");
    println!("✓ Records round-trip through the table file");

    // Wholesale replacement discards the old set
    let mut replacement = fixture_records();
    replacement.truncate(2);
    let count = store.replace_all(replacement).unwrap();
    assert_eq!(count, 2);
    let stored = store.read_all().unwrap();
    assert_eq!(stored.len(), 2);
    assert!(store.get(5).unwrap().is_none());
    println!("✓ replace_all discards old records, old ids are gone");

    // Restore the full fixture for the remaining tests
    store.replace_all(fixture_records()).unwrap();
}

fn test_update_by_id(store: &RecordStore) {
    println!("\n====== Testing update-by-id ======");

    let before = store.read_all().unwrap();
    assert_eq!(before[4].id, 5);
    assert_eq!(before[4].record.skill, "Welding");

    let patch = RecordPatch {
        skill: Some("Advanced Welding".to_string()),
        ..Default::default()
    };
    let updated = store.update(5, &patch).unwrap();
    assert_eq!(updated.record.skill, "Advanced Welding");

    let after = store.read_all().unwrap();
    for (old, new) in before.iter().zip(after.iter()) {
        if old.id == 5 {
            assert_eq!(new.record.skill, "Advanced Welding");
            assert_eq!(new.record.competency, old.record.competency);
        } else {
            assert_eq!(old, new);
        }
    }
    println!("✓ id 5 updated, its other fields and all other records unchanged");

    let fetched = store.get(5).unwrap().unwrap();
    assert_eq!(fetched.record.skill, "Advanced Welding");
    println!("✓ get(5) returns the updated value");

    let err = store.update(99, &patch).unwrap_err();
    assert!(err.contains("99"));
    println!("✓ Updating an unknown id is an error naming the id");
}

fn test_patch_fields(store: &RecordStore) {
    println!("\n====== Testing patch semantics ======");

    let mut smes = std::collections::BTreeMap::new();
    smes.insert(Division::Apac, "Ana Cole".to_string());

    let patch = RecordPatch {
        global_sme: Some("Dana Reed".to_string()),
        division_smes: Some(smes),
        ..Default::default()
    };
    let updated = store.update(1, &patch).unwrap();

    assert_eq!(updated.record.global_sme, "Dana Reed");
    assert_eq!(updated.record.division_sme(Division::Apac), "Ana Cole");
    assert_eq!(updated.record.division_sme(Division::Energy), "");
    assert_eq!(updated.record.skill, "Hydrology");
    println!("✓ Patch replaces only the named fields");

    assert_eq!(updated.record.domain, "Environment");
    println!("✓ Domain is not editable through a patch");
}

fn test_feedback(dir: &std::path::Path) {
    println!("\n====== Testing feedback store ======");

    let feedback = FeedbackStore::open(dir).unwrap();

    let entry = feedback
        .submit("Pat", "pat@example.org", 4, "Search is quick")
        .unwrap();
    assert_eq!(entry.id, 1);
    assert_eq!(entry.rating, 4);

    let second = feedback.submit("Ana", "ana@example.org", 5, "").unwrap();
    assert_eq!(second.id, 2);
    println!("✓ Submissions stored with increasing identifiers");

    let err = feedback.submit("Lee", "lee@example.org", 0, "too low").unwrap_err();
    assert!(err.contains("1 and 5"));
    let err = feedback.submit("Lee", "lee@example.org", 6, "too high").unwrap_err();
    assert!(err.contains("1 and 5"));
    println!("✓ Out-of-range ratings rejected with a validation message");

    let entries = feedback.read_all().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "Pat");
    assert!(entries[0].submitted_at <= entries[1].submitted_at);
    println!("✓ Rejected submissions were not stored; order preserved");
}

fn test_export(store: &RecordStore) {
    println!("\n====== Testing export ======");

    let mut stored = store.read_all().unwrap();
    stored[0].record.description = "Surface water, flooding".to_string();
    stored[1].record.description = "He said \"done\"".to_string();

    let csv = to_csv(&stored).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), stored.len() + 1);
    assert!(lines[0].starts_with("id,domain,competency,skill,description"));
    assert!(lines[0].contains("D&AS"));
    println!("✓ Header row lists every exported column");

    assert!(lines[1].contains("\"Surface water, flooding\""));
    assert!(lines[2].contains("\"He said \"\"done\"\"\""));
    println!("✓ Commas and quotes are escaped");

    let xlsx = to_xlsx(&stored).unwrap();
    assert!(!xlsx.is_empty());
    // XLSX files are zip archives
    assert_eq!(&xlsx[0..2], b"PK");
    println!("✓ XLSX export produces a workbook");
}

fn main() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = RecordStore::open(dir.path()).expect("Store should open");

    test_replace_all(&store);
    test_update_by_id(&store);
    test_patch_fields(&store);
    test_feedback(dir.path());
    test_export(&store);

    println!("\nAll store tests passed!");
}
