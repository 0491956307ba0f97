// ==========================================
// Order API tests
// ==========================================
// Test goal: the composed candidate listing (predicates + proximity),
// pagination bounds, intake validation and the detail view
// ==========================================


use delivery_backoffice::api::error::ApiError;
use delivery_backoffice::api::order_api::OrderListParams;
use delivery_backoffice::app::AppState;
use delivery_backoffice::domain::order::{NewOrder, NewOrderItem};
use delivery_backoffice::domain::route::NewRoute;
use delivery_backoffice::logging;
use std::collections::HashSet;

const SAO_PAULO: (f64, f64) = (-23.5505, -46.6333);
const SAO_PAULO_NEARBY: (f64, f64) = (-23.5489, -46.6388); // ~0.6 km
const RIO_DE_JANEIRO: (f64, f64) = (-22.9068, -43.1729); // ~360 km

struct Fixture {
    _temp_file: tempfile::NamedTempFile,
    state: AppState,
    product_id: i64,
    reference_id: i64,
    nearby_id: i64,
    far_id: i64,
}

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
    .expect("reference order");
    let nearby_id = test_helpers::insert_order_with_item(
        &conn,
        1002,
        date,
        Some(SAO_PAULO_NEARBY.0),
        Some(SAO_PAULO_NEARBY.1),
        product_id,
        2,
    )
    .expect("nearby order");
    let far_id = test_helpers::insert_order_with_item(
        &conn,
        1003,
        date,
        Some(RIO_DE_JANEIRO.0),
        Some(RIO_DE_JANEIRO.1),
        product_id,
        1,
    )
    .expect("far order");
    drop(conn);

    let state = AppState::new(db_path).expect("app state");

    Fixture {
        _temp_file: temp_file,
        state,
        product_id,
        reference_id,
        nearby_id,
        far_id,
    }
}

fn radius_params(reference_id: i64, radius: &str) -> OrderListParams {
    OrderListParams {
        reference_order_id: Some(reference_id.to_string()),
        radius_km: Some(radius.to_string()),
        ..Default::default()
    }
}

// ==========================================
// Composed listing
// ==========================================

#[tokio::test]
async fn test_listing_without_radius_params_returns_pool() {
    let fixture = setup();

    let all = fixture
        .state
        .order_api
        .list_orders(OrderListParams::default())
        .await
        .expect("list");
    assert_eq!(all.len(), 3);

    // One radius parameter alone is also a passthrough
    let half = fixture
        .state
        .order_api
        .list_orders(OrderListParams {
            radius_km: Some("5".to_string()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(half.len(), 3);
}

#[tokio::test]
async fn test_listing_narrows_by_radius() {
    let fixture = setup();

    let within = fixture
        .state
        .order_api
        .list_orders(radius_params(fixture.reference_id, "5"))
        .await
        .expect("list");

    let ids: HashSet<i64> = within.iter().map(|o| o.id).collect();
    assert_eq!(ids, HashSet::from([fixture.reference_id, fixture.nearby_id]));

    // Summaries carry derived item data
    let nearby = within
        .iter()
        .find(|o| o.id == fixture.nearby_id)
        .expect("nearby summary");
    assert_eq!(nearby.item_count, 1);
    assert!((nearby.total_weight_kg - 40.0).abs() < 1e-9, "2 crates of 20 kg");
}

#[tokio::test]
async fn test_listing_with_invalid_radius_params_is_empty() {
    let fixture = setup();

    for params in [
        radius_params(fixture.reference_id, "five"),
        OrderListParams {
            reference_order_id: Some("abc".to_string()),
            radius_km: Some("5".to_string()),
            ..Default::default()
        },
        radius_params(999_999, "5"),
    ] {
        let result = fixture
            .state
            .order_api
            .list_orders(params)
            .await
            .expect("list");
        assert!(result.is_empty(), "invalid radius input must select nothing");
    }
}

#[tokio::test]
async fn test_radius_composes_with_availability() {
    let fixture = setup();

    // Put the nearby order on a route; it leaves the available pool
    fixture
        .state
        .route_api
        .create_route(
            NewRoute {
                route_date: test_helpers::day(2025, 3, 12),
                max_capacity_kg: 500.0,
            },
            vec![fixture.nearby_id],
        )
        .await
        .expect("create route");

    let mut params = radius_params(fixture.reference_id, "5");
    params.available_for_route = Some(true);

    let listed = fixture
        .state
        .order_api
        .list_orders(params)
        .await
        .expect("list");
    let ids: HashSet<i64> = listed.iter().map(|o| o.id).collect();
    assert_eq!(
        ids,
        HashSet::from([fixture.reference_id]),
        "the routed nearby order must not reappear through the radius filter"
    );
    assert!(!ids.contains(&fixture.far_id));
}

#[tokio::test]
async fn test_pagination_is_clamped_by_config() {
    let fixture = setup();

    fixture
        .state
        .config
        .set_config_value("listing_max_page_size", "2")
        .expect("set config");

    let page = fixture
        .state
        .order_api
        .list_orders(OrderListParams {
            page_size: Some(50),
            ordering: Some("nf".to_string()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(page.len(), 2, "requested page size must clamp to the maximum");
    assert_eq!(page[0].nf, 1001);

    let second_page = fixture
        .state
        .order_api
        .list_orders(OrderListParams {
            page_size: Some(50),
            page: Some(2),
            ordering: Some("nf".to_string()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(second_page.len(), 1);
    assert_eq!(second_page[0].nf, 1003);

    let bad_page = fixture
        .state
        .order_api
        .list_orders(OrderListParams {
            page: Some(0),
            ..Default::default()
        })
        .await;
    assert!(matches!(bad_page, Err(ApiError::InvalidInput(_))));
}

#[tokio::test]
async fn test_invalid_family_list_is_rejected() {
    let fixture = setup();

    let result = fixture
        .state
        .order_api
        .list_orders(OrderListParams {
            families: Some("1,abc".to_string()),
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
}

// ==========================================
// Intake and detail
// ==========================================

#[tokio::test]
async fn test_create_order_and_read_detail() {
    let fixture = setup();

    let order_id = fixture
        .state
        .order_api
        .create_order(NewOrder {
            nf: 4242,
            customer_name: Some("Carla Nunes".to_string()),
            note: Some("leave at the gate".to_string()),
            order_date: test_helpers::day(2025, 3, 15),
            latitude: Some(SAO_PAULO.0),
            longitude: Some(SAO_PAULO.1),
            items: vec![NewOrderItem {
                product_id: fixture.product_id,
                quantity: 4,
            }],
        })
        .await
        .expect("create order");

    let detail = fixture
        .state
        .order_api
        .get_order(order_id)
        .await
        .expect("detail");
    assert_eq!(detail.order.nf, 4242);
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].product_name, "Crate 20kg");
    assert_eq!(detail.items[0].family_name, "General cargo");
    assert!((detail.total_weight_kg - 80.0).abs() < 1e-9);

    let missing = fixture.state.order_api.get_order(order_id + 999).await;
    assert!(matches!(missing, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_create_order_validation() {
    let fixture = setup();
    let date = test_helpers::day(2025, 3, 15);

    let base = NewOrder {
        nf: 1,
        customer_name: None,
        note: None,
        order_date: date,
        latitude: Some(SAO_PAULO.0),
        longitude: Some(SAO_PAULO.1),
        items: vec![NewOrderItem {
            product_id: fixture.product_id,
            quantity: 1,
        }],
    };

    let mut no_items = base.clone();
    no_items.items.clear();
    assert!(matches!(
        fixture.state.order_api.create_order(no_items).await,
        Err(ApiError::InvalidInput(_))
    ));

    let mut lone_latitude = base.clone();
    lone_latitude.longitude = None;
    assert!(matches!(
        fixture.state.order_api.create_order(lone_latitude).await,
        Err(ApiError::InvalidInput(_))
    ));

    let mut bad_latitude = base.clone();
    bad_latitude.latitude = Some(123.0);
    assert!(matches!(
        fixture.state.order_api.create_order(bad_latitude).await,
        Err(ApiError::InvalidInput(_))
    ));

    let mut unknown_product = base.clone();
    unknown_product.items[0].product_id = fixture.product_id + 999;
    assert!(matches!(
        fixture.state.order_api.create_order(unknown_product).await,
        Err(ApiError::InvalidInput(_))
    ));

    // Orders without coordinates are legal intake
    let mut blind = base;
    blind.latitude = None;
    blind.longitude = None;
    let blind_id = fixture
        .state
        .order_api
        .create_order(blind)
        .await
        .expect("create order without coordinates");
    assert!(blind_id > 0);
}
