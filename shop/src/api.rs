use std::{error::Error, sync::Arc};
use axum::{
    extract::{rejection::QueryRejection, Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use http::header;
use crate::{
    dto::{CreatedId, ItemDto, MemberDto, SimpleOrderDto},
    entities::OrderStatus,
    error::ShopError,
    model::{Address, ModelId, NewItem, NewMember, OrderLineRequest, OrderSearch},
    service::{
        ItemService, MemberService, OrderQuery, OrderQueryService, OrderQueryStyle, OrderService,
        SimpleOrderStyle,
    },
};

pub fn create_router(state: AppState, cors_origin: &str) -> Result<Router, Box<dyn Error + Send + Sync>> {
    let origin = cors_origin.parse::<header::HeaderValue>()?;
    Ok(Router::new()
        .route("/members", post(join_member).get(list_members))
        .route("/members/{id}", get(get_member).put(update_member))
        .route("/items", post(create_item).get(list_items))
        .route("/items/{id}", get(get_item).put(update_item))
        .route("/orders", post(place_order).get(list_orders))
        .route("/orders/{id}/cancel", post(cancel_order))
        .route("/orders/{id}/delivery/complete", post(complete_delivery))
        .route("/simple-orders", get(list_simple_orders))
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state))
}

#[derive(Clone)]
pub struct AppState {
    members: Arc<dyn MemberService>,
    items: Arc<dyn ItemService>,
    orders: Arc<dyn OrderService>,
    order_queries: Arc<dyn OrderQueryService>,
    metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        members: Arc<dyn MemberService>,
        items: Arc<dyn ItemService>,
        orders: Arc<dyn OrderService>,
        order_queries: Arc<dyn OrderQueryService>,
    ) -> Self {
        Self {
            members,
            items,
            orders,
            order_queries,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ShopError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            ShopError::DuplicateMember(_) => (StatusCode::CONFLICT, self.to_string()),
            ShopError::PaginationConflict { .. }
            | ShopError::NotEnoughStock { .. }
            | ShopError::OrderNotCancellable { .. }
            | ShopError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ShopError::DataIntegrity(_) | ShopError::Database(_) => {
                tracing::error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        if status.is_client_error() {
            tracing::warn!(status = status.as_u16(), error = %message, "Request rejected");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK").into_response()
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "Metrics not initialized").into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct JoinMemberRequest {
    pub name: String,
    pub city: Option<String>,
    pub street: Option<String>,
    pub zipcode: Option<String>,
}

impl From<JoinMemberRequest> for NewMember {
    fn from(request: JoinMemberRequest) -> Self {
        match (request.city, request.street, request.zipcode) {
            (Some(city), Some(street), Some(zipcode)) => {
                NewMember::with_address(request.name, Address::new(city, street, zipcode))
            }
            _ => NewMember::named(request.name),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub name: String,
}

pub async fn join_member(
    State(state): State<AppState>,
    Json(request): Json<JoinMemberRequest>,
) -> Result<Json<CreatedId>, ShopError> {
    let id = state.members.join(request.into()).await?;
    Ok(Json(CreatedId { id }))
}

pub async fn list_members(State(state): State<AppState>) -> Result<Json<Vec<MemberDto>>, ShopError> {
    let members = state.members.find_members().await?;
    Ok(Json(members.into_iter().map(MemberDto::from).collect()))
}

pub async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
) -> Result<Json<MemberDto>, ShopError> {
    Ok(Json(state.members.find_member(id).await?.into()))
}

pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
    Json(request): Json<UpdateMemberRequest>,
) -> Result<Json<MemberDto>, ShopError> {
    Ok(Json(state.members.update_member_name(id, request.name).await?.into()))
}

pub async fn create_item(
    State(state): State<AppState>,
    Json(request): Json<NewItem>,
) -> Result<Json<CreatedId>, ShopError> {
    let id = state.items.save_item(request).await?;
    Ok(Json(CreatedId { id }))
}

pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<ItemDto>>, ShopError> {
    let items = state.items.find_items().await?;
    Ok(Json(items.into_iter().map(ItemDto::from).collect()))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
) -> Result<Json<ItemDto>, ShopError> {
    Ok(Json(state.items.find_item(id).await?.into()))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
    Json(request): Json<NewItem>,
) -> Result<Json<ItemDto>, ShopError> {
    Ok(Json(state.items.update_item(id, request).await?.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub member_id: ModelId,
    pub items: Vec<OrderLineRequest>,
}

pub async fn place_order(
    State(state): State<AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<Json<CreatedId>, ShopError> {
    let id = state.orders.order(request.member_id, request.items).await?;
    Ok(Json(CreatedId { id }))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
) -> Result<StatusCode, ShopError> {
    state.orders.cancel(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn complete_delivery(
    State(state): State<AppState>,
    Path(id): Path<ModelId>,
) -> Result<StatusCode, ShopError> {
    state.orders.complete_delivery(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Query string of `GET /orders`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListParams {
    pub style: Option<OrderQueryStyle>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub member_name: Option<String>,
    pub order_status: Option<OrderStatus>,
    #[serde(default)]
    pub grouped: bool,
}

impl From<OrderListParams> for OrderQuery {
    fn from(params: OrderListParams) -> Self {
        OrderQuery {
            style: params.style.unwrap_or_default(),
            offset: params.offset,
            limit: params.limit,
            search: OrderSearch {
                member_name: params.member_name,
                order_status: params.order_status,
            },
            grouped: params.grouped,
        }
    }
}

/// Unwraps a query string, answering a malformed one in the same JSON error
/// shape as every other client error.
fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ShopError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| ShopError::InvalidArgument(rejection.body_text()))
}

pub async fn list_orders(
    State(state): State<AppState>,
    params: Result<Query<OrderListParams>, QueryRejection>,
) -> Result<Response, ShopError> {
    let query = OrderQuery::from(query_params(params)?);
    let style = query.style;
    let listing = state.order_queries.list_orders(query).await?;
    tracing::debug!(style = style.as_str(), orders = listing.len(), "Served order listing");
    Ok((StatusCode::OK, Json(listing)).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct SimpleOrderParams {
    pub style: Option<SimpleOrderStyle>,
}

pub async fn list_simple_orders(
    State(state): State<AppState>,
    params: Result<Query<SimpleOrderParams>, QueryRejection>,
) -> Result<Json<Vec<SimpleOrderDto>>, ShopError> {
    let params = query_params(params)?;
    let orders = state
        .order_queries
        .list_simple_orders(params.style.unwrap_or_default())
        .await?;
    Ok(Json(orders))
}
