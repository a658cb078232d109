use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::dto::{group_flat_rows, OrderDto, OrderFlatDto, OrderQueryDto, SimpleOrderDto};
use crate::error::{ShopError, ShopResult};
use crate::model::{OrderGraph, OrderSearch, Page};
use crate::service::ProdShopService;
use crate::storage::{order_query_repository, order_repository, Session};

/// Order listing strategies, named after the endpoint versions that
/// introduced them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderQueryStyle {
    /// Lazy traversal exposing the entity graph.
    #[serde(rename = "v1")]
    EntityTraversal,
    /// Lazy traversal mapped to DTOs.
    #[serde(rename = "v2")]
    DtoTraversal,
    /// Single fetch-join over the item collection.
    #[serde(rename = "v3")]
    CollectionFetchJoin,
    /// To-one fetch-join, paged root, batched collections.
    #[default]
    #[serde(rename = "v3.1")]
    BatchedFetch,
    /// Projected roots, one item query per order.
    #[serde(rename = "v4")]
    ProjectionPerOrder,
    /// Projected roots, one IN query for all items.
    #[serde(rename = "v5")]
    ProjectionInClause,
    /// One flat row per order item.
    #[serde(rename = "v6")]
    FlatProjection,
}

impl OrderQueryStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderQueryStyle::EntityTraversal => "v1",
            OrderQueryStyle::DtoTraversal => "v2",
            OrderQueryStyle::CollectionFetchJoin => "v3",
            OrderQueryStyle::BatchedFetch => "v3.1",
            OrderQueryStyle::ProjectionPerOrder => "v4",
            OrderQueryStyle::ProjectionInClause => "v5",
            OrderQueryStyle::FlatProjection => "v6",
        }
    }

    /// False for the styles that join the item collection into the root
    /// query, where a row window would not be an order window.
    pub fn supports_pagination(&self) -> bool {
        !matches!(
            self,
            OrderQueryStyle::CollectionFetchJoin | OrderQueryStyle::FlatProjection
        )
    }
}

/// Order header listings that only touch to-one relations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimpleOrderStyle {
    #[serde(rename = "v2")]
    Traversal,
    #[serde(rename = "v3")]
    FetchJoin,
    #[default]
    #[serde(rename = "v4")]
    Projection,
}

impl SimpleOrderStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimpleOrderStyle::Traversal => "v2",
            SimpleOrderStyle::FetchJoin => "v3",
            SimpleOrderStyle::Projection => "v4",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderQuery {
    pub style: OrderQueryStyle,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    /// Only honoured by the traversal styles.
    pub search: OrderSearch,
    /// Regroup flat rows into orders (flat style only).
    pub grouped: bool,
}

impl OrderQuery {
    pub fn with_style(style: OrderQueryStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    pub fn paged(style: OrderQueryStyle, offset: u64, limit: u64) -> Self {
        Self {
            style,
            offset: Some(offset),
            limit: Some(limit),
            ..Self::default()
        }
    }

    fn requests_page(&self) -> bool {
        self.offset.is_some() || self.limit.is_some()
    }

    fn check_window(&self) -> ShopResult<()> {
        if self.limit == Some(0) {
            return Err(ShopError::InvalidArgument("limit must be at least 1".to_string()));
        }
        for (name, value) in [("offset", self.offset), ("limit", self.limit)] {
            if let Some(value) = value.filter(|v| *v > Page::MAX_BOUND) {
                return Err(ShopError::InvalidArgument(format!(
                    "{name} must not exceed {}, got {value}",
                    Page::MAX_BOUND
                )));
            }
        }
        Ok(())
    }
}

/// The shape of an order listing depends on the style that produced it;
/// each variant serializes as a bare JSON array.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OrderListing {
    Entities(Vec<OrderGraph>),
    Orders(Vec<OrderDto>),
    Queried(Vec<OrderQueryDto>),
    Flat(Vec<OrderFlatDto>),
}

impl OrderListing {
    pub fn len(&self) -> usize {
        match self {
            OrderListing::Entities(v) => v.len(),
            OrderListing::Orders(v) => v.len(),
            OrderListing::Queried(v) => v.len(),
            OrderListing::Flat(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
pub trait OrderQueryService: Send + Sync {
    async fn list_orders(&self, query: OrderQuery) -> ShopResult<OrderListing>;
    async fn list_simple_orders(&self, style: SimpleOrderStyle) -> ShopResult<Vec<SimpleOrderDto>>;
}

fn record_query(strategy: &'static str, started: Instant, statements: usize) {
    metrics::histogram!("shop_order_query_seconds", "strategy" => strategy)
        .record(started.elapsed().as_secs_f64());
    metrics::counter!("shop_order_query_statements_total", "strategy" => strategy)
        .increment(statements as u64);
}

impl ProdShopService {
    fn optional_page(query: &OrderQuery, default_limit: u64) -> Option<Page> {
        query.requests_page().then(|| {
            Page::new(query.offset.unwrap_or(0), query.limit.unwrap_or(default_limit))
        })
    }

    async fn run_order_query(&self, session: &Session, query: &OrderQuery) -> ShopResult<OrderListing> {
        let page = Self::optional_page(query, self.default_page_limit);
        let listing = match query.style {
            OrderQueryStyle::EntityTraversal => {
                let orders = order_repository::search(session, &query.search, page).await?;
                OrderListing::Entities(order_repository::load_graphs_one_by_one(session, orders).await?)
            }
            OrderQueryStyle::DtoTraversal => {
                let orders = order_repository::search(session, &query.search, page).await?;
                let graphs = order_repository::load_graphs_one_by_one(session, orders).await?;
                OrderListing::Orders(graphs.iter().map(OrderDto::from).collect())
            }
            OrderQueryStyle::CollectionFetchJoin => {
                let graphs = order_repository::find_all_with_item(session).await?;
                OrderListing::Orders(graphs.iter().map(OrderDto::from).collect())
            }
            OrderQueryStyle::BatchedFetch => {
                let page = Page::new(
                    query.offset.unwrap_or(0),
                    query.limit.unwrap_or(self.default_page_limit),
                );
                let graphs =
                    order_repository::find_all_with_member_delivery_batched(session, page, self.batch()).await?;
                OrderListing::Orders(graphs.iter().map(OrderDto::from).collect())
            }
            OrderQueryStyle::ProjectionPerOrder => {
                OrderListing::Queried(order_query_repository::find_order_query_dtos(session, page).await?)
            }
            OrderQueryStyle::ProjectionInClause => {
                OrderListing::Queried(order_query_repository::find_all_by_dto_optimization(session, page).await?)
            }
            OrderQueryStyle::FlatProjection => {
                let rows = order_query_repository::find_all_by_dto_flat(session).await?;
                if query.grouped {
                    OrderListing::Queried(group_flat_rows(rows))
                } else {
                    OrderListing::Flat(rows)
                }
            }
        };
        Ok(listing)
    }
}

#[async_trait]
impl OrderQueryService for ProdShopService {
    async fn list_orders(&self, query: OrderQuery) -> ShopResult<OrderListing> {
        let style = query.style;
        if query.requests_page() && !style.supports_pagination() {
            warn!(style = style.as_str(), "Rejected paginated request on a collection join");
            return Err(ShopError::PaginationConflict { style: style.as_str() });
        }
        query.check_window()?;

        let started = Instant::now();
        let session = Session::begin(self.db(), style.as_str()).await?;
        let listing = self.run_order_query(&session, &query).await?;
        let statements = session.commit().await?;

        debug!(style = style.as_str(), orders = listing.len(), statements, "Listed orders");
        record_query(style.as_str(), started, statements);
        Ok(listing)
    }

    async fn list_simple_orders(&self, style: SimpleOrderStyle) -> ShopResult<Vec<SimpleOrderDto>> {
        let started = Instant::now();
        let session = Session::begin(self.db(), style.as_str()).await?;
        let orders: Vec<SimpleOrderDto> = match style {
            SimpleOrderStyle::Traversal => {
                let orders = order_repository::search(&session, &OrderSearch::default(), None).await?;
                let graphs = order_repository::load_graphs_one_by_one(&session, orders).await?;
                graphs.iter().map(SimpleOrderDto::from).collect()
            }
            SimpleOrderStyle::FetchJoin => order_repository::find_all_with_member_delivery(&session, None)
                .await?
                .iter()
                .map(SimpleOrderDto::from)
                .collect(),
            SimpleOrderStyle::Projection => order_query_repository::find_orders(&session, None)
                .await?
                .into_iter()
                .map(SimpleOrderDto::from)
                .collect(),
        };
        let statements = session.commit().await?;

        debug!(style = style.as_str(), orders = orders.len(), statements, "Listed simple orders");
        record_query(style.as_str(), started, statements);
        Ok(orders)
    }
}
