use axum_restaurant_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::auth::RegisterRequest,
    entity::restaurants::ActiveModel as RestaurantActive,
    error::AppError,
    middleware::auth::AuthUser,
    models::{PlanType, RestaurantStatus, UserRole},
    services::auth_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

// Staff provisioning is privileged: an admin creates accounts for their own
// restaurant only, a master for any. Nobody mints accounts on a tenant they
// do not administer.
#[tokio::test]
async fn staff_accounts_are_provisioned_not_self_registered() -> anyhow::Result<()> {
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

    let tenant_a = create_restaurant(&state, "Tenant A").await?;
    let tenant_b = create_restaurant(&state, "Tenant B").await?;

    let admin_a = AuthUser {
        user_id: Uuid::new_v4(),
        restaurant_id: Some(tenant_a),
        role: UserRole::Admin,
    };
    let cashier_a = AuthUser {
        user_id: Uuid::new_v4(),
        restaurant_id: Some(tenant_a),
        role: UserRole::Cashier,
    };
    let master = AuthUser {
        user_id: Uuid::new_v4(),
        restaurant_id: None,
        role: UserRole::Master,
    };

    // A cashier holds a valid token but no staff-management rights; asking
    // for an admin seat on another tenant must not work.
    let takeover = auth_service::register_user(
        &state,
        &cashier_a,
        register_payload(tenant_b, Some(UserRole::Admin)),
    )
    .await;
    assert!(matches!(takeover, Err(AppError::Forbidden)));

    // An admin is scoped to their own restaurant.
    let cross_tenant = auth_service::register_user(
        &state,
        &admin_a,
        register_payload(tenant_b, Some(UserRole::Cashier)),
    )
    .await;
    assert!(matches!(cross_tenant, Err(AppError::Forbidden)));

    // Unknown restaurants are a caller error, not a constraint violation.
    let unknown = auth_service::register_user(
        &state,
        &master,
        register_payload(Uuid::new_v4(), Some(UserRole::Cashier)),
    )
    .await;
    assert!(matches!(unknown, Err(AppError::BadRequest(_))));

    // Master accounts are never created through the API.
    let mint_master = auth_service::register_user(
        &state,
        &master,
        register_payload(tenant_a, Some(UserRole::Master)),
    )
    .await;
    assert!(matches!(mint_master, Err(AppError::Forbidden)));

    // The legitimate paths: admin for own tenant, master for any.
    let own = auth_service::register_user(
        &state,
        &admin_a,
        register_payload(tenant_a, None),
    )
    .await?;
    let own = own.data.unwrap();
    assert_eq!(own.role, UserRole::Cashier);
    assert_eq!(own.restaurant_id, Some(tenant_a));

    let console = auth_service::register_user(
        &state,
        &master,
        register_payload(tenant_b, Some(UserRole::Admin)),
    )
    .await?;
    let console = console.data.unwrap();
    assert_eq!(console.role, UserRole::Admin);
    assert_eq!(console.restaurant_id, Some(tenant_b));

    Ok(())
}

fn register_payload(restaurant_id: Uuid, role: Option<UserRole>) -> RegisterRequest {
    RegisterRequest {
        name: "Staff".into(),
        email: format!("staff-{}@example.com", Uuid::new_v4().simple()),
        password: "changeme1".into(),
        restaurant_id,
        role,
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    Ok(AppState { pool, orm })
}

async fn create_restaurant(state: &AppState, name: &str) -> anyhow::Result<Uuid> {
    let slug = format!("auth-{}", Uuid::new_v4().simple());
    let restaurant = RestaurantActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        slug: Set(slug),
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
