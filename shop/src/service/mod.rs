use sea_orm::DatabaseConnection;

use crate::error::{ShopError, ShopResult};
use crate::model::Page;
use crate::storage::BatchFetch;

pub mod item;
pub mod member;
pub mod order;
pub mod order_query;

pub use item::ItemService;
pub use member::MemberService;
pub use order::OrderService;
pub use order_query::{OrderListing, OrderQuery, OrderQueryService, OrderQueryStyle, SimpleOrderStyle};

/// Database-backed implementation of every service trait.
///
/// Each operation opens its own [`crate::storage::Session`] and commits it on
/// success; an early return drops the session and rolls back.
#[derive(Clone)]
pub struct ProdShopService {
    db: DatabaseConnection,
    batch: BatchFetch,
    default_page_limit: u64,
}

impl ProdShopService {
    pub fn new(db: DatabaseConnection, batch_fetch_size: u64, default_page_limit: u64) -> ShopResult<Self> {
        if default_page_limit == 0 || default_page_limit > Page::MAX_BOUND {
            return Err(ShopError::InvalidArgument(format!(
                "default page limit must be between 1 and {}, got {}",
                Page::MAX_BOUND,
                default_page_limit
            )));
        }
        Ok(Self {
            db,
            batch: BatchFetch::new(batch_fetch_size)?,
            default_page_limit,
        })
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn batch(&self) -> BatchFetch {
        self.batch
    }
}
