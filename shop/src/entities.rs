use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

use crate::model::{Address, ModelId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[sea_orm(string_value = "ORDERED")]
    Ordered,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    #[sea_orm(string_value = "READY")]
    Ready,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
}

/// SeaORM Member Entity
pub mod member {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "member")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: ModelId,
        #[sea_orm(unique)]
        pub name: String,
        pub city: Option<String>,
        pub street: Option<String>,
        pub zipcode: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::order::Entity")]
        Orders,
    }

    impl Related<super::order::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Orders.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl Model {
        /// The embedded address, present only when every part of it is stored.
        pub fn address(&self) -> Option<Address> {
            match (&self.city, &self.street, &self.zipcode) {
                (Some(city), Some(street), Some(zipcode)) => {
                    Some(Address::new(city.clone(), street.clone(), zipcode.clone()))
                }
                _ => None,
            }
        }
    }
}

/// SeaORM Item Entity
pub mod item {
    use super::*;
    use crate::error::{ShopError, ShopResult};

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "item")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: ModelId,
        pub name: String,
        pub price: i32,
        pub stock_quantity: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::order_item::Entity")]
        OrderItems,
    }

    impl Related<super::order_item::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::OrderItems.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl Model {
        pub fn add_stock(&mut self, quantity: i32) {
            self.stock_quantity += quantity;
        }

        pub fn remove_stock(&mut self, quantity: i32) -> ShopResult<()> {
            let rest = self.stock_quantity - quantity;
            if rest < 0 {
                return Err(ShopError::NotEnoughStock {
                    item_id: self.id,
                    requested: quantity,
                    available: self.stock_quantity,
                });
            }
            self.stock_quantity = rest;
            Ok(())
        }
    }
}

/// SeaORM Delivery Entity
pub mod delivery {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "delivery")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: ModelId,
        pub city: String,
        pub street: String,
        pub zipcode: String,
        pub status: DeliveryStatus,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_one = "super::order::Entity")]
        Order,
    }

    impl Related<super::order::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Order.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl Model {
        pub fn address(&self) -> Address {
            Address::new(self.city.clone(), self.street.clone(), self.zipcode.clone())
        }
    }
}

/// SeaORM Order Entity
pub mod order {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "orders")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: ModelId,
        pub member_id: ModelId,
        #[sea_orm(unique)]
        pub delivery_id: ModelId,
        pub order_date: DateTime,
        pub status: OrderStatus,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::member::Entity",
            from = "Column::MemberId",
            to = "super::member::Column::Id"
        )]
        Member,
        #[sea_orm(
            belongs_to = "super::delivery::Entity",
            from = "Column::DeliveryId",
            to = "super::delivery::Column::Id"
        )]
        Delivery,
        #[sea_orm(has_many = "super::order_item::Entity")]
        OrderItems,
    }

    impl Related<super::member::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Member.def()
        }
    }

    impl Related<super::delivery::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Delivery.def()
        }
    }

    impl Related<super::order_item::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::OrderItems.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// SeaORM Order Item Entity
///
/// `order_price` is the item price at the time of ordering, independent of
/// later changes to the catalog entry.
pub mod order_item {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "order_item")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: ModelId,
        pub order_id: ModelId,
        pub item_id: ModelId,
        pub order_price: i32,
        pub count: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::order::Entity",
            from = "Column::OrderId",
            to = "super::order::Column::Id"
        )]
        Order,
        #[sea_orm(
            belongs_to = "super::item::Entity",
            from = "Column::ItemId",
            to = "super::item::Column::Id"
        )]
        Item,
    }

    impl Related<super::order::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Order.def()
        }
    }

    impl Related<super::item::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Item.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl Model {
        pub fn total_price(&self) -> i32 {
            self.order_price * self.count
        }
    }
}
