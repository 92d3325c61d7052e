use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "order_item_addons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub order_item_id: Uuid,
    pub addon_id: Uuid,
    pub name: String,
    pub price: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order_items::Entity",
        from = "Column::OrderItemId",
        to = "super::order_items::Column::Id"
    )]
    OrderItems,
    #[sea_orm(
        belongs_to = "super::product_addons::Entity",
        from = "Column::AddonId",
        to = "super::product_addons::Column::Id"
    )]
    ProductAddons,
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::product_addons::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductAddons.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
