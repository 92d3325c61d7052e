use axum_restaurant_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        menu::{CheckoutCustomer, CheckoutLineRequest, PublicCheckoutRequest},
        orders::{CreateOrderRequest, OrderLineRequest, TransitionOrderRequest},
    },
    entity::{
        clients::ActiveModel as ClientActive,
        dining_tables::ActiveModel as TableActive,
        product_addons::ActiveModel as AddonActive,
        products::ActiveModel as ProductActive,
        restaurants::ActiveModel as RestaurantActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{
        OrderStatus, OrderType, PaymentMethod, PaymentStatus, PlanType, RestaurantStatus,
        TableStatus, UserRole,
    },
    services::{menu_service, order_service, table_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

// Integration flow: cashier captures a cash order at a table, the kitchen
// moves it through the lifecycle, and a stale operator gets rejected.
#[tokio::test]
async fn capture_transition_and_stale_version_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let restaurant_id = create_restaurant(&state, "Flow Burger", &unique_slug("flow-burger")).await?;
    let burger_id = create_product(&state, restaurant_id, "X-Burger", 1800).await?;
    let table_id = create_table(&state, restaurant_id, 1).await?;

    let cashier = AuthUser {
        user_id: Uuid::new_v4(),
        restaurant_id: Some(restaurant_id),
        role: UserRole::Cashier,
    };
    let kitchen = AuthUser {
        user_id: Uuid::new_v4(),
        restaurant_id: Some(restaurant_id),
        role: UserRole::Kitchen,
    };

    // Two X-Burgers, cash, 40.00 tendered.
    let capture = order_service::create_order(
        &state,
        &cashier,
        CreateOrderRequest {
            table_id: Some(table_id),
            client_id: None,
            customer_name: Some("Walk-in".into()),
            order_type: None,
            items: vec![OrderLineRequest {
                product_id: burger_id,
                quantity: 2,
                addon_ids: None,
                notes: None,
            }],
            payment_method: PaymentMethod::Cash,
            tendered: Some(4000),
            discount: None,
            delivery_fee: None,
            coupon_code: None,
            points_redeemed: None,
        },
    )
    .await?;
    let detail = capture.data.unwrap();

    assert_eq!(detail.order.order_type, OrderType::DineIn);
    assert_eq!(detail.order.status, OrderStatus::Preparing);
    assert_eq!(detail.order.subtotal, 3600);
    assert_eq!(detail.order.total, 3600);
    assert!(detail.order.printed_at.is_some(), "slip printed at capture");

    let payment = detail.payment.expect("payment recorded with the order");
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.amount, 3600);
    assert_eq!(payment.change, Some(400));

    // The table is taken for the duration of the order.
    let tables = table_service::list_tables(&state, &cashier).await?;
    let table = tables
        .data
        .unwrap()
        .items
        .into_iter()
        .find(|t| t.id == table_id)
        .unwrap();
    assert_eq!(table.status, TableStatus::Occupied);

    // Kitchen marks it ready.
    let order_id = detail.order.id;
    let ready = order_service::transition_order(
        &state,
        &kitchen,
        order_id,
        TransitionOrderRequest {
            status: OrderStatus::Ready,
            version: detail.order.version,
        },
    )
    .await?;
    let ready_order = ready.data.unwrap();
    assert_eq!(ready_order.status, OrderStatus::Ready);
    assert_eq!(ready_order.version, detail.order.version + 1);

    // A second operator still holding the old version loses the race.
    let stale = order_service::transition_order(
        &state,
        &kitchen,
        order_id,
        TransitionOrderRequest {
            status: OrderStatus::Cancelled,
            version: detail.order.version,
        },
    )
    .await;
    assert!(matches!(stale, Err(AppError::Conflict(_))));

    // Skipping straight from ready to cancelled is not a legal edge either.
    let illegal = order_service::transition_order(
        &state,
        &kitchen,
        order_id,
        TransitionOrderRequest {
            status: OrderStatus::Cancelled,
            version: ready_order.version,
        },
    )
    .await;
    assert!(matches!(illegal, Err(AppError::BadRequest(_))));

    // Delivered frees the table.
    let delivered = order_service::transition_order(
        &state,
        &cashier,
        order_id,
        TransitionOrderRequest {
            status: OrderStatus::Delivered,
            version: ready_order.version,
        },
    )
    .await?;
    assert_eq!(delivered.data.unwrap().status, OrderStatus::Delivered);

    let tables = table_service::list_tables(&state, &cashier).await?;
    let table = tables
        .data
        .unwrap()
        .items
        .into_iter()
        .find(|t| t.id == table_id)
        .unwrap();
    assert_eq!(table.status, TableStatus::Available);

    Ok(())
}

// Public checkout: the customer record is upserted by phone, the order
// starts pending, and the kitchen slip prints exactly once.
#[tokio::test]
async fn public_checkout_prints_slip_once() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let slug = unique_slug("slip-burger");
    let restaurant_id = create_restaurant(&state, "Slip Burger", &slug).await?;
    let burger_id = create_product(&state, restaurant_id, "X-Bacon", 2200).await?;
    let addon_id = create_addon(&state, burger_id, "Extra cheese", 300).await?;

    let kitchen = AuthUser {
        user_id: Uuid::new_v4(),
        restaurant_id: Some(restaurant_id),
        role: UserRole::Kitchen,
    };

    let placed = menu_service::checkout(
        &state,
        &slug,
        PublicCheckoutRequest {
            customer: CheckoutCustomer {
                name: "Maria".into(),
                phone: "+5511999990000".into(),
                email: None,
                address: Some("Rua A, 10".into()),
            },
            order_type: OrderType::Delivery,
            items: vec![CheckoutLineRequest {
                product_id: burger_id,
                quantity: 1,
                addon_ids: Some(vec![addon_id]),
                notes: None,
            }],
            payment_method: PaymentMethod::Pix,
            delivery_fee: Some(500),
        },
    )
    .await?;
    let detail = placed.data.unwrap();

    // 2200 + 300 addon, plus the delivery fee.
    assert_eq!(detail.order.subtotal, 2500);
    assert_eq!(detail.order.total, 3000);
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert!(detail.order.printed_at.is_none(), "no slip until preparing");
    assert_eq!(detail.payment.as_ref().unwrap().status, PaymentStatus::Pending);

    // Accepting the order prints the slip.
    let preparing = order_service::transition_order(
        &state,
        &kitchen,
        detail.order.id,
        TransitionOrderRequest {
            status: OrderStatus::Preparing,
            version: detail.order.version,
        },
    )
    .await?;
    let preparing_order = preparing.data.unwrap();
    let first_print = preparing_order.printed_at.expect("slip printed");

    // Later transitions carry the original timestamp unchanged.
    let ready = order_service::transition_order(
        &state,
        &kitchen,
        detail.order.id,
        TransitionOrderRequest {
            status: OrderStatus::Ready,
            version: preparing_order.version,
        },
    )
    .await?;
    let ready_order = ready.data.unwrap();
    assert_eq!(ready_order.printed_at, Some(first_print));

    let delivered = order_service::transition_order(
        &state,
        &kitchen,
        detail.order.id,
        TransitionOrderRequest {
            status: OrderStatus::Delivered,
            version: ready_order.version,
        },
    )
    .await?;
    let delivered_order = delivered.data.unwrap();
    assert_eq!(delivered_order.printed_at, Some(first_print));

    // Delivery settles the pending payment.
    let settled = order_service::get_order(&state, &kitchen, detail.order.id).await?;
    let settled_payment = settled.data.unwrap().payment.unwrap();
    assert_eq!(settled_payment.status, PaymentStatus::Completed);

    Ok(())
}

// A suspended tenant disappears from the public surface and cannot capture.
#[tokio::test]
async fn blocked_tenant_is_invisible_and_cannot_capture() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let slug = unique_slug("gone-burger");
    let restaurant_id = create_restaurant(&state, "Gone Burger", &slug).await?;
    let burger_id = create_product(&state, restaurant_id, "X-Burger", 1800).await?;

    // Block the tenant directly.
    let restaurant = axum_restaurant_api::entity::Restaurants::find_by_id(restaurant_id)
        .one(&state.orm)
        .await?
        .unwrap();
    let mut active: RestaurantActive = restaurant.into();
    active.status = Set(RestaurantStatus::Blocked);
    active.update(&state.orm).await?;

    let menu = menu_service::digital_menu(&state, &slug).await;
    assert!(matches!(menu, Err(AppError::NotFound)));

    let cashier = AuthUser {
        user_id: Uuid::new_v4(),
        restaurant_id: Some(restaurant_id),
        role: UserRole::Cashier,
    };
    let capture = order_service::create_order(
        &state,
        &cashier,
        CreateOrderRequest {
            table_id: None,
            client_id: None,
            customer_name: None,
            order_type: Some(OrderType::Takeout),
            items: vec![OrderLineRequest {
                product_id: burger_id,
                quantity: 1,
                addon_ids: None,
                notes: None,
            }],
            payment_method: PaymentMethod::Cash,
            tendered: Some(2000),
            discount: None,
            delivery_fee: None,
            coupon_code: None,
            points_redeemed: None,
        },
    )
    .await;
    assert!(matches!(capture, Err(AppError::BadRequest(_))));

    Ok(())
}

// Redemption moves points out of an existing balance; it never creates them.
// Negative amounts and redemption without a client are caller errors.
#[tokio::test]
async fn loyalty_redemption_never_mints_points() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let restaurant_id =
        create_restaurant(&state, "Points Burger", &unique_slug("points-burger")).await?;
    let burger_id = create_product(&state, restaurant_id, "X-Burger", 1800).await?;
    let client_id = create_client(&state, restaurant_id, 100).await?;

    let cashier = AuthUser {
        user_id: Uuid::new_v4(),
        restaurant_id: Some(restaurant_id),
        role: UserRole::Cashier,
    };
    let capture_request = |client_id: Option<Uuid>, points_redeemed: Option<i32>| CreateOrderRequest {
        table_id: None,
        client_id,
        customer_name: None,
        order_type: Some(OrderType::Takeout),
        items: vec![OrderLineRequest {
            product_id: burger_id,
            quantity: 1,
            addon_ids: None,
            notes: None,
        }],
        payment_method: PaymentMethod::Cash,
        tendered: Some(2000),
        discount: None,
        delivery_fee: None,
        coupon_code: None,
        points_redeemed,
    };

    // A negative redemption would credit the balance instead of debiting it.
    let negative = order_service::create_order(
        &state,
        &cashier,
        capture_request(Some(client_id), Some(-50)),
    )
    .await;
    assert!(matches!(negative, Err(AppError::BadRequest(_))));

    // Redeeming with no client leaves nobody to debit.
    let anonymous =
        order_service::create_order(&state, &cashier, capture_request(None, Some(10))).await;
    assert!(matches!(anonymous, Err(AppError::BadRequest(_))));

    // Redeeming past the balance is rejected too.
    let overdrawn = order_service::create_order(
        &state,
        &cashier,
        capture_request(Some(client_id), Some(500)),
    )
    .await;
    assert!(matches!(overdrawn, Err(AppError::BadRequest(_))));

    // Nothing above touched the balance.
    let client = axum_restaurant_api::entity::Clients::find_by_id(client_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(client.loyalty_points, 100);

    // A legitimate redemption: 100 on the books, 30 spent, 18 earned on 18.00.
    let capture = order_service::create_order(
        &state,
        &cashier,
        capture_request(Some(client_id), Some(30)),
    )
    .await?;
    let order = capture.data.unwrap().order;
    assert_eq!(order.points_redeemed, 30);
    assert_eq!(order.points_earned, 18);

    let client = axum_restaurant_api::entity::Clients::find_by_id(client_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(client.loyalty_points, 88);

    Ok(())
}

// Cancelling a paid order refunds the payment; the money trail never shows a
// completed charge on a cancelled order.
#[tokio::test]
async fn cancelling_a_paid_order_refunds_the_payment() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let restaurant_id =
        create_restaurant(&state, "Refund Burger", &unique_slug("refund-burger")).await?;
    let burger_id = create_product(&state, restaurant_id, "X-Burger", 1800).await?;

    let cashier = AuthUser {
        user_id: Uuid::new_v4(),
        restaurant_id: Some(restaurant_id),
        role: UserRole::Cashier,
    };

    // Counter capture settles the payment up front.
    let capture = order_service::create_order(
        &state,
        &cashier,
        CreateOrderRequest {
            table_id: None,
            client_id: None,
            customer_name: None,
            order_type: Some(OrderType::Takeout),
            items: vec![OrderLineRequest {
                product_id: burger_id,
                quantity: 1,
                addon_ids: None,
                notes: None,
            }],
            payment_method: PaymentMethod::Cash,
            tendered: Some(2000),
            discount: None,
            delivery_fee: None,
            coupon_code: None,
            points_redeemed: None,
        },
    )
    .await?;
    let detail = capture.data.unwrap();
    assert_eq!(detail.payment.as_ref().unwrap().status, PaymentStatus::Completed);

    let cancelled = order_service::transition_order(
        &state,
        &cashier,
        detail.order.id,
        TransitionOrderRequest {
            status: OrderStatus::Cancelled,
            version: detail.order.version,
        },
    )
    .await?;
    assert_eq!(cancelled.data.unwrap().status, OrderStatus::Cancelled);

    let refunded = order_service::get_order(&state, &cashier, detail.order.id).await?;
    let payment = refunded.data.unwrap().payment.unwrap();
    assert_eq!(payment.status, PaymentStatus::Refunded);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    Ok(AppState { pool, orm })
}

// Tests run concurrently against a shared database, so every tenant gets a
// run-unique slug instead of a global truncate.
fn unique_slug(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

async fn create_restaurant(state: &AppState, name: &str, slug: &str) -> anyhow::Result<Uuid> {
    let restaurant = RestaurantActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        slug: Set(slug.into()),
        status: Set(RestaurantStatus::Active),
        plan_type: Set(PlanType::Basic),
        plan_expires_at: Set(None),
        phone: Set(None),
        address: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(restaurant.id)
}

async fn create_product(
    state: &AppState,
    restaurant_id: Uuid,
    name: &str,
    price: i64,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        name: Set(name.into()),
        description: Set(None),
        category: Set(Some("burgers".into())),
        price: Set(price),
        available: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product.id)
}

async fn create_addon(
    state: &AppState,
    product_id: Uuid,
    name: &str,
    price: i64,
) -> anyhow::Result<Uuid> {
    let addon = AddonActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        name: Set(name.into()),
        price: Set(price),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(addon.id)
}

async fn create_client(
    state: &AppState,
    restaurant_id: Uuid,
    loyalty_points: i32,
) -> anyhow::Result<Uuid> {
    let client = ClientActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        name: Set("Regular".into()),
        phone: Set(format!("+55119{}", &Uuid::new_v4().simple().to_string()[..8])),
        email: Set(None),
        address: Set(None),
        loyalty_points: Set(loyalty_points),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(client.id)
}

async fn create_table(state: &AppState, restaurant_id: Uuid, number: i32) -> anyhow::Result<Uuid> {
    let table = TableActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        number: Set(number),
        seats: Set(4),
        status: Set(TableStatus::Available),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(table.id)
}
