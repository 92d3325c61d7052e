use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{auth as auth_dto, campaigns as campaign_dto, clients as client_dto, menu as menu_dto, orders as order_dto, products as product_dto, restaurants as restaurant_dto, tables as table_dto, tickets as ticket_dto},
    models::{
        Campaign, Client, DiningTable, Order, OrderItem, OrderItemAddon, Payment, Product,
        ProductAddon, Restaurant, Ticket, UserProfile,
    },
    response::{ApiResponse, Meta},
    routes::{auth, campaigns, clients, health, kitchen, master, menu, orders, params, products, tables, tickets},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::change_email,
        auth::reset_password,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::transition_order,
        kitchen::queue,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product,
        products::add_addon,
        products::remove_addon,
        tables::list_tables,
        tables::create_table,
        tables::set_table_status,
        tables::delete_table,
        clients::list_clients,
        clients::create_client,
        clients::update_client,
        campaigns::list_campaigns,
        campaigns::create_campaign,
        campaigns::send_campaign,
        campaigns::delete_campaign,
        tickets::list_tickets,
        tickets::create_ticket,
        tickets::transition_ticket,
        master::list_restaurants,
        master::create_restaurant,
        master::get_restaurant,
        master::set_restaurant_status,
        master::set_plan,
        menu::digital_menu,
        menu::checkout
    ),
    components(
        schemas(
            Restaurant,
            UserProfile,
            Client,
            DiningTable,
            Product,
            ProductAddon,
            Order,
            OrderItem,
            OrderItemAddon,
            Payment,
            Ticket,
            Campaign,
            auth_dto::RegisterRequest,
            auth_dto::LoginRequest,
            auth_dto::LoginResponse,
            auth_dto::ChangeEmailRequest,
            auth_dto::ResetPasswordRequest,
            order_dto::OrderLineRequest,
            order_dto::CreateOrderRequest,
            order_dto::TransitionOrderRequest,
            order_dto::OrderDetail,
            order_dto::OrderItemDetail,
            order_dto::OrderList,
            order_dto::KitchenQueue,
            product_dto::CreateProductRequest,
            product_dto::UpdateProductRequest,
            product_dto::CreateAddonRequest,
            product_dto::ProductList,
            product_dto::ProductWithAddons,
            table_dto::CreateTableRequest,
            table_dto::UpdateTableStatusRequest,
            table_dto::TableList,
            client_dto::CreateClientRequest,
            client_dto::UpdateClientRequest,
            client_dto::ClientList,
            campaign_dto::CreateCampaignRequest,
            campaign_dto::CampaignList,
            ticket_dto::CreateTicketRequest,
            ticket_dto::TransitionTicketRequest,
            ticket_dto::TicketList,
            restaurant_dto::CreateRestaurantRequest,
            restaurant_dto::UpdateRestaurantStatusRequest,
            restaurant_dto::UpdatePlanRequest,
            restaurant_dto::RestaurantList,
            menu_dto::DigitalMenu,
            menu_dto::MenuRestaurant,
            menu_dto::CheckoutCustomer,
            menu_dto::CheckoutLineRequest,
            menu_dto::PublicCheckoutRequest,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::TicketListQuery,
            params::RestaurantListQuery,
            Meta,
            ApiResponse<Order>,
            ApiResponse<order_dto::OrderDetail>,
            ApiResponse<order_dto::OrderList>,
            ApiResponse<order_dto::KitchenQueue>,
            ApiResponse<product_dto::ProductList>,
            ApiResponse<restaurant_dto::RestaurantList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication and account endpoints"),
        (name = "Orders", description = "POS order capture and lifecycle"),
        (name = "Kitchen", description = "Kitchen display queues"),
        (name = "Products", description = "Menu and addon management"),
        (name = "Tables", description = "Dining table management"),
        (name = "Clients", description = "Customer records and loyalty"),
        (name = "Campaigns", description = "WhatsApp campaign management"),
        (name = "Tickets", description = "Support ticket lifecycle"),
        (name = "Master", description = "Cross-tenant console"),
        (name = "Public", description = "Customer-facing digital menu"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
