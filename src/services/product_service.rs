use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::products::{
        CreateAddonRequest, CreateProductRequest, ProductList, ProductWithAddons,
        UpdateProductRequest,
    },
    entity::{
        product_addons::{
            ActiveModel as AddonActive, Column as AddonCol, Entity as ProductAddons,
            Model as AddonModel,
        },
        products::{
            ActiveModel as ProductActive, Column as ProdCol, Entity as Products,
            Model as ProductModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Product, ProductAddon},
    policy::{Permission, authorize, tenant_of},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    user: &AuthUser,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    authorize(user, Permission::ViewOrders)?;
    let restaurant_id = tenant_of(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all().add(ProdCol::RestaurantId.eq(restaurant_id));
    if let Some(q) = query.q.as_ref().filter(|q| !q.is_empty()) {
        condition = condition.add(ProdCol::Name.contains(q));
    }
    if let Some(category) = query.category.as_ref().filter(|c| !c.is_empty()) {
        condition = condition.add(ProdCol::Category.eq(category.clone()));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::Name);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Asc);

    let mut finder = Products::find().filter(condition);
    let column = match sort_by {
        ProductSortBy::CreatedAt => ProdCol::CreatedAt,
        ProductSortBy::Price => ProdCol::Price,
        ProductSortBy::Name => ProdCol::Name,
    };
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(column),
        SortOrder::Desc => finder.order_by_desc(column),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", ProductList { items }, Some(meta)))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    authorize(user, Permission::ManageCatalog)?;
    let restaurant_id = tenant_of(user)?;

    if payload.price < 0 {
        return Err(AppError::BadRequest("Price must not be negative".into()));
    }
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        name: Set(payload.name),
        description: Set(payload.description),
        category: Set(payload.category),
        price: Set(payload.price),
        available: Set(payload.available.unwrap_or(true)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn get_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ProductWithAddons>> {
    authorize(user, Permission::ViewOrders)?;
    let restaurant_id = tenant_of(user)?;

    let product = find_tenant_product(state, restaurant_id, id).await?;
    let addons = product
        .find_related(ProductAddons)
        .order_by_asc(AddonCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(addon_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        ProductWithAddons {
            product: product_from_entity(product),
            addons,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    authorize(user, Permission::ManageCatalog)?;
    let restaurant_id = tenant_of(user)?;

    let product = find_tenant_product(state, restaurant_id, id).await?;
    let mut active: ProductActive = product.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(category) = payload.category {
        active.category = Set(Some(category));
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("Price must not be negative".into()));
        }
        // Existing order items keep their snapshots.
        active.price = Set(price);
    }
    if let Some(available) = payload.available {
        active.available = Set(available);
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Product updated",
        product_from_entity(updated),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    authorize(user, Permission::ManageCatalog)?;
    let restaurant_id = tenant_of(user)?;

    let product = find_tenant_product(state, restaurant_id, id).await?;
    let snapshot = product_from_entity(product.clone());
    product.delete(&state.orm).await?;

    Ok(ApiResponse::success(
        "Product deleted",
        snapshot,
        Some(Meta::empty()),
    ))
}

pub async fn add_addon(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: CreateAddonRequest,
) -> AppResult<ApiResponse<ProductAddon>> {
    authorize(user, Permission::ManageCatalog)?;
    let restaurant_id = tenant_of(user)?;

    if payload.price < 0 {
        return Err(AppError::BadRequest("Price must not be negative".into()));
    }
    let product = find_tenant_product(state, restaurant_id, product_id).await?;

    let addon = AddonActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        name: Set(payload.name),
        price: Set(payload.price),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Addon created",
        addon_from_entity(addon),
        Some(Meta::empty()),
    ))
}

pub async fn remove_addon(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    addon_id: Uuid,
) -> AppResult<ApiResponse<ProductAddon>> {
    authorize(user, Permission::ManageCatalog)?;
    let restaurant_id = tenant_of(user)?;

    // Scope through the product so one tenant cannot touch another's addons.
    find_tenant_product(state, restaurant_id, product_id).await?;

    let addon = ProductAddons::find()
        .filter(
            Condition::all()
                .add(AddonCol::Id.eq(addon_id))
                .add(AddonCol::ProductId.eq(product_id)),
        )
        .one(&state.orm)
        .await?;
    let addon = match addon {
        Some(a) => a,
        None => return Err(AppError::NotFound),
    };
    let snapshot = addon_from_entity(addon.clone());
    addon.delete(&state.orm).await?;

    Ok(ApiResponse::success(
        "Addon deleted",
        snapshot,
        Some(Meta::empty()),
    ))
}

async fn find_tenant_product(
    state: &AppState,
    restaurant_id: Uuid,
    id: Uuid,
) -> AppResult<ProductModel> {
    let product = Products::find()
        .filter(
            Condition::all()
                .add(ProdCol::Id.eq(id))
                .add(ProdCol::RestaurantId.eq(restaurant_id)),
        )
        .one(&state.orm)
        .await?;
    match product {
        Some(p) => Ok(p),
        None => Err(AppError::NotFound),
    }
}

pub(crate) fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        restaurant_id: model.restaurant_id,
        name: model.name,
        description: model.description,
        category: model.category,
        price: model.price,
        available: model.available,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn addon_from_entity(model: AddonModel) -> ProductAddon {
    ProductAddon {
        id: model.id,
        product_id: model.product_id,
        name: model.name,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
