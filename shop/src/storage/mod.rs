pub mod batch;
pub mod order_query_repository;
pub mod order_repository;
pub mod repository;
pub mod schema;
pub mod session;

pub use batch::BatchFetch;
pub use repository::{EntityRepository, ItemRepository, MemberRepository};
pub use schema::create_schema;
pub use session::Session;
