use sea_orm::{DbErr, SqlErr};

use crate::model::ModelId;

#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: ModelId },

    #[error("Member already exists: {0}")]
    DuplicateMember(String),

    #[error("Order listing style {style} cannot be paginated: its collection join multiplies rows")]
    PaginationConflict { style: &'static str },

    #[error("Not enough stock for item {item_id}: requested {requested}, available {available}")]
    NotEnoughStock {
        item_id: ModelId,
        requested: i32,
        available: i32,
    },

    #[error("Order {order_id} cannot be cancelled: {reason}")]
    OrderNotCancellable { order_id: ModelId, reason: &'static str },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub type ShopResult<T> = Result<T, ShopError>;

impl ShopError {
    /// Maps a failed member insert/update, turning a unique-name violation
    /// raised by the storage engine into `DuplicateMember`.
    pub fn from_member_write(err: DbErr, name: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => ShopError::DuplicateMember(name.to_string()),
            _ => ShopError::Database(err),
        }
    }
}
