use capsearch::record::CapabilityRecord;
use capsearch::search::{
    DEFAULT_SEARCH_FIELDS, EmptyQueryPolicy, SearchField, SearchFilter, filter_records,
    group_by_domain,
};
use capsearch::state::{Action, Page, ViewState, reduce};
use capsearch::store::StoredRecord;

// Build a small in-memory record set spanning three domains
fn fixture_records() -> Vec<StoredRecord> {
    let mut records = Vec::new();

    let mut make = |domain: &str, skill: &str, competency: &str, keywords: &str, sme: &str| {
        let mut record = CapabilityRecord::empty(domain);
        record.skill = skill.to_string();
        record.competency = competency.to_string();
        record.keywords = keywords.to_string();
        record.global_sme = sme.to_string();
        records.push(StoredRecord {
            id: records.len() as u64 + 1,
            record,
        });
    };

    make("Environment", "Welding Inspection", "Inspection", "ndt", "Pat Smith");
    make("Environment", "Hydrology", "Water Science", "flood", "");
    make("Energy", "Turbine Maintenance", "Generation", "outage, welding", "nan");
    make("Energy", "Grid Design", "Transmission", "", "Dana Reed");
    make("D&AS Domain", "Avionics Welding", "Assembly", "", "NaN");

    records
}

fn query(q: &str) -> SearchFilter {
    SearchFilter {
        query: q.to_string(),
        domains: Vec::new(),
        require_sme: false,
    }
}

fn ids(records: &[&StoredRecord]) -> Vec<u64> {
    records.iter().map(|r| r.id).collect()
}

fn test_case_insensitive_matching() {
    println!("\n====== Testing case-insensitive matching ======");
    let records = fixture_records();
    let policy = EmptyQueryPolicy::ShowNothing;

    let upper = filter_records(&records, &query("WELD"), &DEFAULT_SEARCH_FIELDS, policy);
    let lower = filter_records(&records, &query("weld"), &DEFAULT_SEARCH_FIELDS, policy);
    assert_eq!(ids(&upper), ids(&lower));
    println!("✓ 'WELD' and 'weld' return the same records");

    // id 1 matches on skill, id 3 on keywords, id 5 on skill
    assert_eq!(ids(&upper), vec![1, 3, 5]);
    println!("✓ Matches span skill and keyword fields, insertion order kept");
}

fn test_field_configuration() {
    println!("\n====== Testing searchable field configuration ======");
    let records = fixture_records();
    let policy = EmptyQueryPolicy::ShowNothing;

    let skill_only = [SearchField::Skill];
    let matches = filter_records(&records, &query("weld"), &skill_only, policy);
    assert_eq!(ids(&matches), vec![1, 5]);
    println!("✓ Restricting to the skill field drops keyword-only matches");

    // Description is not in the default field set
    let mut records = fixture_records();
    records[1].record.description = "welding adjacent".to_string();
    let matches = filter_records(&records, &query("adjacent"), &DEFAULT_SEARCH_FIELDS, policy);
    assert!(matches.is_empty());
    let with_description = [SearchField::Description];
    let matches = filter_records(&records, &query("adjacent"), &with_description, policy);
    assert_eq!(ids(&matches), vec![2]);
    println!("✓ Description only matches when explicitly configured");
}

fn test_structural_filters() {
    println!("\n====== Testing structural filters ======");
    let records = fixture_records();
    let policy = EmptyQueryPolicy::ShowNothing;

    let filter = SearchFilter {
        query: String::new(),
        domains: vec!["Energy".to_string()],
        require_sme: false,
    };
    let matches = filter_records(&records, &filter, &DEFAULT_SEARCH_FIELDS, policy);
    assert_eq!(ids(&matches), vec![3, 4]);
    println!("✓ Empty query with a domain filter returns the whole domain");

    let filter = SearchFilter {
        query: String::new(),
        domains: Vec::new(),
        require_sme: true,
    };
    let matches = filter_records(&records, &filter, &DEFAULT_SEARCH_FIELDS, policy);
    assert_eq!(ids(&matches), vec![1, 4]);
    println!("✓ Has-SME keeps real contacts, drops blank/'nan'/'NaN' ones");

    let filter = SearchFilter {
        query: "weld".to_string(),
        domains: vec!["Energy".to_string()],
        require_sme: false,
    };
    let matches = filter_records(&records, &filter, &DEFAULT_SEARCH_FIELDS, policy);
    assert_eq!(ids(&matches), vec![3]);
    println!("✓ Query and domain filter combine");
}

fn test_empty_query_policy() {
    println!("\n====== Testing empty-query policy ======");
    let records = fixture_records();

    let matches = filter_records(
        &records,
        &query(""),
        &DEFAULT_SEARCH_FIELDS,
        EmptyQueryPolicy::ShowNothing,
    );
    assert!(matches.is_empty());
    println!("✓ ShowNothing: empty query and no filters displays nothing");

    let matches = filter_records(
        &records,
        &query("   "),
        &DEFAULT_SEARCH_FIELDS,
        EmptyQueryPolicy::ShowNothing,
    );
    assert!(matches.is_empty());
    println!("✓ Whitespace-only query counts as empty");

    let matches = filter_records(
        &records,
        &query(""),
        &DEFAULT_SEARCH_FIELDS,
        EmptyQueryPolicy::ShowAll,
    );
    assert_eq!(matches.len(), 5);
    println!("✓ ShowAll: empty query and no filters displays everything");
}

fn test_idempotence() {
    println!("\n====== Testing filter idempotence ======");
    let records = fixture_records();
    let filter = query("weld");

    let once = filter_records(&records, &filter, &DEFAULT_SEARCH_FIELDS, EmptyQueryPolicy::ShowNothing);
    let once_owned: Vec<StoredRecord> = once.iter().map(|r| (*r).clone()).collect();
    let twice = filter_records(&once_owned, &filter, &DEFAULT_SEARCH_FIELDS, EmptyQueryPolicy::ShowNothing);

    assert_eq!(ids(&once), ids(&twice));
    println!("✓ Filtering an already-filtered set by the same query is a no-op");
}

fn test_domain_grouping() {
    println!("\n====== Testing domain grouping ======");
    let records = fixture_records();

    let matches = filter_records(
        &records,
        &query("weld"),
        &DEFAULT_SEARCH_FIELDS,
        EmptyQueryPolicy::ShowNothing,
    );
    let groups = group_by_domain(&matches);

    let names: Vec<&str> = groups.iter().map(|g| g.domain).collect();
    assert_eq!(names, vec!["Environment", "Energy", "D&AS Domain"]);
    println!("✓ Groups appear in first-encountered order");

    assert_eq!(ids(&groups[0].records), vec![1]);
    assert_eq!(ids(&groups[1].records), vec![3]);
    println!("✓ Records keep their relative order inside each group");

    let empty = group_by_domain(&[]);
    assert!(empty.is_empty());
    println!("✓ No matches yields no groups");
}

fn test_view_state_reducer() {
    println!("\n====== Testing view state reducer ======");

    let initial = ViewState::initial();
    assert_eq!(initial.page, Page::Search);
    assert!(initial.query.is_empty());

    let searched = reduce(&initial, Action::SetQuery("weld".to_string()));
    assert_eq!(searched.query, "weld");
    assert!(initial.query.is_empty());
    println!("✓ Reducing returns a new state, the old one is untouched");

    let filtered = reduce(&searched, Action::SetDomains(vec!["Energy".to_string()]));
    let filtered = reduce(&filtered, Action::SetRequireSme(true));
    assert!(filtered.filter().has_structural_filter());
    assert_eq!(filtered.query, "weld");
    println!("✓ Actions compose, untouched fields carry over");

    let on_dashboard = reduce(&filtered, Action::Navigate(Page::Dashboard));
    assert_eq!(on_dashboard.page, Page::Dashboard);
    assert_eq!(on_dashboard.query, "weld");
    println!("✓ Navigation keeps the active search");

    let cleared = reduce(&on_dashboard, Action::ClearFilters);
    assert!(cleared.query.is_empty());
    assert!(cleared.domain_filter.is_empty());
    assert!(!cleared.require_sme);
    assert_eq!(cleared.page, Page::Dashboard);
    println!("✓ ClearFilters resets the search but not the page");

    let again = reduce(&on_dashboard, Action::ClearFilters);
    assert_eq!(cleared, again);
    println!("✓ Reduction is deterministic");
}

fn main() {
    test_case_insensitive_matching();
    test_field_configuration();
    test_structural_filters();
    test_empty_query_policy();
    test_idempotence();
    test_domain_grouping();
    test_view_state_reducer();

    println!("\nAll search tests passed!");
}
