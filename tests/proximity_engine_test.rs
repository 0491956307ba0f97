// ==========================================
// Proximity engine tests
// ==========================================
// Test goal: verify the radius selection contract over a seeded pool,
// including the asymmetric absent/invalid parameter handling
// ==========================================


use delivery_backoffice::engine::proximity::{
    FamilyCompatibility, ProximityEngine, RadiusSelection,
};
use delivery_backoffice::logging;
use delivery_backoffice::repository::order_repo::{OrderQuery, OrderRepository};
use delivery_backoffice::Order;
use std::collections::HashSet;
use std::sync::Arc;

// Reference drop points: São Paulo city center, a nearby square, Rio
const SAO_PAULO: (f64, f64) = (-23.5505, -46.6333);
const SAO_PAULO_NEARBY: (f64, f64) = (-23.5489, -46.6388); // ~0.6 km
const RIO_DE_JANEIRO: (f64, f64) = (-22.9068, -43.1729); // ~360 km

struct Fixture {
    _temp_file: tempfile::NamedTempFile,
    db_path: String,
    repo: Arc<OrderRepository>,
    engine: ProximityEngine,
    reference_id: i64,
    nearby_id: i64,
    far_id: i64,
}

/// Seed one reference order in São Paulo plus one near and one far candidate
fn setup() -> Fixture {
    logging::init_test();

    let (temp_file, db_path) = test_helpers::create_test_db().expect("create test db");
    let conn = test_helpers::open_test_connection(&db_path).expect("open db");
    let (_family_id, product_id) = test_helpers::seed_minimal_catalog(&conn).expect("seed catalog");

    let date = test_helpers::day(2025, 3, 10);
    let reference_id = test_helpers::insert_order_with_item(
        &conn,
        1001,
        date,
        Some(SAO_PAULO.0),
        Some(SAO_PAULO.1),
        product_id,
        1,
    )
    .expect("insert reference order");
    let nearby_id = test_helpers::insert_order_with_item(
        &conn,
        1002,
        date,
        Some(SAO_PAULO_NEARBY.0),
        Some(SAO_PAULO_NEARBY.1),
        product_id,
        2,
    )
    .expect("insert nearby order");
    let far_id = test_helpers::insert_order_with_item(
        &conn,
        1003,
        date,
        Some(RIO_DE_JANEIRO.0),
        Some(RIO_DE_JANEIRO.1),
        product_id,
        1,
    )
    .expect("insert far order");
    drop(conn);

    let repo = Arc::new(OrderRepository::new(&db_path).expect("open repo"));
    let engine = ProximityEngine::new(repo.clone());

    Fixture {
        _temp_file: temp_file,
        db_path,
        repo,
        engine,
        reference_id,
        nearby_id,
        far_id,
    }
}

fn pool_of(fixture: &Fixture) -> Vec<Order> {
    fixture
        .repo
        .list(&OrderQuery::default())
        .expect("list orders")
}

fn selected_ids(selection: RadiusSelection) -> HashSet<i64> {
    match selection {
        RadiusSelection::Selected(ids) => ids.into_iter().collect(),
        RadiusSelection::Passthrough => panic!("expected a concrete selection"),
    }
}

// ==========================================
// Core contract
// ==========================================

#[test]
fn test_reference_always_included() {
    let fixture = setup();
    let pool = pool_of(&fixture);

    for radius in [0.0, 0.1, 5.0, 1000.0] {
        let ids = selected_ids(
            fixture
                .engine
                .select_within_radius(fixture.reference_id, radius, &pool)
                .expect("selection"),
        );
        assert!(
            ids.contains(&fixture.reference_id),
            "reference missing at radius {radius}"
        );
    }
}

#[test]
fn test_candidate_kept_iff_within_radius() {
    let fixture = setup();
    let pool = pool_of(&fixture);

    let ids = selected_ids(
        fixture
            .engine
            .select_within_radius(fixture.reference_id, 5.0, &pool)
            .expect("selection"),
    );

    assert!(
        ids.contains(&fixture.nearby_id),
        "~0.6 km candidate must survive a 5 km radius"
    );
    assert!(
        !ids.contains(&fixture.far_id),
        "~360 km candidate must not survive a 5 km radius"
    );
    assert_eq!(ids.len(), 2);
}

#[test]
fn test_radius_monotonicity() {
    let fixture = setup();
    let pool = pool_of(&fixture);

    let mut previous: HashSet<i64> = HashSet::new();
    for radius in [0.0, 0.5, 1.0, 100.0, 500.0] {
        let ids = selected_ids(
            fixture
                .engine
                .select_within_radius(fixture.reference_id, radius, &pool)
                .expect("selection"),
        );
        assert!(
            previous.is_subset(&ids),
            "growing the radius to {radius} km dropped candidates"
        );
        previous = ids;
    }
}

#[test]
fn test_zero_radius_returns_only_reference() {
    let fixture = setup();
    let pool = pool_of(&fixture);

    let ids = selected_ids(
        fixture
            .engine
            .select_within_radius(fixture.reference_id, 0.0, &pool)
            .expect("selection"),
    );
    assert_eq!(ids, HashSet::from([fixture.reference_id]));
}

#[test]
fn test_empty_pool_returns_only_reference() {
    let fixture = setup();

    let ids = selected_ids(
        fixture
            .engine
            .select_within_radius(fixture.reference_id, 5.0, &[])
            .expect("selection"),
    );
    assert_eq!(ids, HashSet::from([fixture.reference_id]));
}

#[test]
fn test_reference_outside_pool_still_counted() {
    let fixture = setup();

    // A second in-radius candidate, so the pool holds 3 orders:
    // 2 within 5 km, 1 far away; the reference itself is kept out
    let conn = test_helpers::open_test_connection(&fixture.db_path).expect("open db");
    let product_id: i64 = conn
        .query_row("SELECT id FROM products LIMIT 1", [], |row| row.get(0))
        .expect("seeded product");
    let second_nearby = test_helpers::insert_order_with_item(
        &conn,
        1006,
        test_helpers::day(2025, 3, 11),
        Some(SAO_PAULO_NEARBY.0),
        Some(SAO_PAULO_NEARBY.1 + 0.001),
        product_id,
        1,
    )
    .expect("insert second nearby order");
    drop(conn);

    let pool: Vec<Order> = pool_of(&fixture)
        .into_iter()
        .filter(|order| order.id != fixture.reference_id)
        .collect();
    assert_eq!(pool.len(), 3);

    let ids = selected_ids(
        fixture
            .engine
            .select_within_radius(fixture.reference_id, 5.0, &pool)
            .expect("selection"),
    );

    assert_eq!(
        ids,
        HashSet::from([fixture.reference_id, fixture.nearby_id, second_nearby]),
        "expected the two in-radius candidates plus the reference"
    );
}

// ==========================================
// Parameter resolution (apply)
// ==========================================

#[test]
fn test_missing_parameter_is_passthrough() {
    let fixture = setup();
    let pool = pool_of(&fixture);

    let id = fixture.reference_id.to_string();
    assert_eq!(
        fixture.engine.apply(Some(&id), None, &pool).expect("apply"),
        RadiusSelection::Passthrough
    );
    assert_eq!(
        fixture.engine.apply(None, Some("5"), &pool).expect("apply"),
        RadiusSelection::Passthrough
    );
    assert_eq!(
        fixture.engine.apply(None, None, &pool).expect("apply"),
        RadiusSelection::Passthrough
    );
}

#[test]
fn test_non_numeric_parameters_select_nothing() {
    let fixture = setup();
    let pool = pool_of(&fixture);

    let id = fixture.reference_id.to_string();
    for (raw_id, raw_radius) in [("abc", "5"), (id.as_str(), "five"), ("", ""), ("12.5.1", "3")] {
        let selection = fixture
            .engine
            .apply(Some(raw_id), Some(raw_radius), &pool)
            .expect("apply");
        assert_eq!(
            selection,
            RadiusSelection::Selected(Vec::new()),
            "({raw_id}, {raw_radius}) must select nothing"
        );
    }
}

#[test]
fn test_unknown_reference_selects_nothing() {
    let fixture = setup();
    let pool = pool_of(&fixture);

    let selection = fixture
        .engine
        .select_within_radius(999_999, 5.0, &pool)
        .expect("selection");
    assert_eq!(selection, RadiusSelection::Selected(Vec::new()));
}

#[test]
fn test_numeric_strings_are_trimmed() {
    let fixture = setup();
    let pool = pool_of(&fixture);

    let id = format!(" {} ", fixture.reference_id);
    let ids = selected_ids(
        fixture
            .engine
            .apply(Some(&id), Some(" 5.0 "), &pool)
            .expect("apply"),
    );
    assert!(ids.contains(&fixture.nearby_id));
}

// ==========================================
// Degraded data
// ==========================================

#[test]
fn test_candidate_without_coordinates_is_excluded() {
    let fixture = setup();

    let conn = test_helpers::open_test_connection(&fixture.db_path).expect("open db");
    let blind_id =
        test_helpers::insert_order(&conn, 1004, None, test_helpers::day(2025, 3, 10), None, None)
            .expect("insert order without coordinates");
    drop(conn);

    let pool = pool_of(&fixture);
    let ids = selected_ids(
        fixture
            .engine
            .select_within_radius(fixture.reference_id, 1000.0, &pool)
            .expect("selection"),
    );

    assert!(
        !ids.contains(&blind_id),
        "order without coordinates must be excluded"
    );
    assert!(ids.contains(&fixture.nearby_id));
    assert!(ids.contains(&fixture.far_id));
}

#[test]
fn test_reference_without_coordinates_degenerates() {
    let fixture = setup();

    let conn = test_helpers::open_test_connection(&fixture.db_path).expect("open db");
    let blind_reference =
        test_helpers::insert_order(&conn, 1005, None, test_helpers::day(2025, 3, 10), None, None)
            .expect("insert order without coordinates");
    drop(conn);

    let pool = pool_of(&fixture);
    let ids = selected_ids(
        fixture
            .engine
            .select_within_radius(blind_reference, 1000.0, &pool)
            .expect("selection"),
    );
    assert_eq!(ids, HashSet::from([blind_reference]));
}

// ==========================================
// Family compatibility seam
// ==========================================

/// Restrictive predicate: candidates may only carry families the
/// reference order already carries
struct SameFamiliesOnly;

impl FamilyCompatibility for SameFamiliesOnly {
    fn compatible(&self, reference: &HashSet<i64>, candidate: &HashSet<i64>) -> bool {
        candidate.is_subset(reference)
    }
}

#[test]
fn test_family_compatibility_predicate_is_consulted() {
    logging::init_test();

    let (_temp_file, db_path) = test_helpers::create_test_db().expect("create test db");
    let conn = test_helpers::open_test_connection(&db_path).expect("open db");

    let food = test_helpers::insert_family(&conn, "Food").expect("family");
    let chemicals = test_helpers::insert_family(&conn, "Chemicals").expect("family");
    let bread = test_helpers::insert_product(&conn, "Bread", 1.0, food).expect("product");
    let solvent = test_helpers::insert_product(&conn, "Solvent", 5.0, chemicals).expect("product");

    let date = test_helpers::day(2025, 3, 10);
    let reference = test_helpers::insert_order_with_item(
        &conn,
        2001,
        date,
        Some(SAO_PAULO.0),
        Some(SAO_PAULO.1),
        bread,
        1,
    )
    .expect("reference");
    let compatible = test_helpers::insert_order_with_item(
        &conn,
        2002,
        date,
        Some(SAO_PAULO_NEARBY.0),
        Some(SAO_PAULO_NEARBY.1),
        bread,
        3,
    )
    .expect("compatible candidate");
    let incompatible = test_helpers::insert_order_with_item(
        &conn,
        2003,
        date,
        Some(SAO_PAULO_NEARBY.0),
        Some(SAO_PAULO_NEARBY.1),
        solvent,
        1,
    )
    .expect("incompatible candidate");
    drop(conn);

    let repo = Arc::new(OrderRepository::new(&db_path).expect("open repo"));
    let engine = ProximityEngine::with_compatibility(repo.clone(), Arc::new(SameFamiliesOnly));
    let pool = repo.list(&OrderQuery::default()).expect("list orders");

    let ids = selected_ids(
        engine
            .select_within_radius(reference, 5.0, &pool)
            .expect("selection"),
    );
    assert!(ids.contains(&compatible));
    assert!(
        !ids.contains(&incompatible),
        "family-incompatible candidate must be rejected"
    );

    // The default predicate accepts the same pool wholesale
    let permissive = ProximityEngine::new(repo.clone());
    let ids = selected_ids(
        permissive
            .select_within_radius(reference, 5.0, &pool)
            .expect("selection"),
    );
    assert!(ids.contains(&incompatible));
}
