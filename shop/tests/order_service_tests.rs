mod test_utils;

use common::test_helpers::TestResult;
use common::{test_assert, test_assert_eq};
use shop::entities::OrderStatus;
use shop::error::ShopError;
use shop::model::{NewItem, NewMember, OrderLineRequest, OrderSearch};
use shop::seed::seed_sample_data;
use shop::service::{
    ItemService, MemberService, OrderQuery, OrderQueryService, OrderQueryStyle, OrderService,
};
use test_utils::*;

#[tokio::test]
async fn test_order_takes_stock_and_snapshots_price() -> TestResult {
    let service = setup_service(100).await?;
    let member = join_with_address(&service, "kim", "Seoul").await?;
    let book = add_item(&service, "JPA1 BOOK", 10000, 10).await?;

    let order_id = place(&service, member, &[(book, 2)]).await?;

    test_assert_eq!(service.find_item(book).await.map_err(shop_err)?.stock_quantity, 8);

    // A later price change must not touch the ordered line.
    service
        .update_item(
            book,
            NewItem {
                name: "JPA1 BOOK".to_string(),
                price: 15000,
                stock_quantity: 8,
            },
        )
        .await
        .map_err(shop_err)?;
    let orders = service.search(OrderSearch::default()).await.map_err(shop_err)?;
    test_assert_eq!(orders.len(), 1);
    test_assert_eq!(orders[0].id, order_id);
    test_assert_eq!(orders[0].status, OrderStatus::Ordered);

    let listing = normalize(
        service
            .list_orders(OrderQuery::with_style(OrderQueryStyle::ProjectionInClause))
            .await
            .map_err(shop_err)?,
    );
    test_assert_eq!(listing[0].order_items[0].order_price, 10000);
    Ok(())
}

#[tokio::test]
async fn test_not_enough_stock_leaves_nothing_behind() -> TestResult {
    let service = setup_service(100).await?;
    let member = join_with_address(&service, "kim", "Seoul").await?;
    let plenty = add_item(&service, "SPRING1 BOOK", 20000, 50).await?;
    let scarce = add_item(&service, "SPRING2 BOOK", 40000, 1).await?;

    let result = service
        .order(
            member,
            vec![
                OrderLineRequest { item_id: plenty, count: 5 },
                OrderLineRequest { item_id: scarce, count: 3 },
            ],
        )
        .await;
    test_assert!(matches!(
        result,
        Err(ShopError::NotEnoughStock { requested: 3, available: 1, .. })
    ));

    test_assert_eq!(service.find_item(plenty).await.map_err(shop_err)?.stock_quantity, 50);
    test_assert!(service.search(OrderSearch::default()).await.map_err(shop_err)?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_cancel_restores_stock() -> TestResult {
    let service = setup_service(100).await?;
    let member = join_with_address(&service, "kim", "Seoul").await?;
    let book = add_item(&service, "JPA2 BOOK", 20000, 10).await?;
    let order_id = place(&service, member, &[(book, 4)]).await?;

    service.cancel(order_id).await.map_err(shop_err)?;

    test_assert_eq!(service.find_item(book).await.map_err(shop_err)?.stock_quantity, 10);
    let cancelled = service
        .search(OrderSearch {
            member_name: None,
            order_status: Some(OrderStatus::Cancelled),
        })
        .await
        .map_err(shop_err)?;
    test_assert_eq!(cancelled.len(), 1);

    let again = service.cancel(order_id).await;
    test_assert!(matches!(again, Err(ShopError::OrderNotCancellable { .. })));
    test_assert_eq!(service.find_item(book).await.map_err(shop_err)?.stock_quantity, 10);
    Ok(())
}

#[tokio::test]
async fn test_completed_delivery_cannot_be_cancelled() -> TestResult {
    let service = setup_service(100).await?;
    let member = join_with_address(&service, "kim", "Seoul").await?;
    let book = add_item(&service, "JPA1 BOOK", 10000, 10).await?;
    let order_id = place(&service, member, &[(book, 1)]).await?;

    service.complete_delivery(order_id).await.map_err(shop_err)?;
    let result = service.cancel(order_id).await;

    test_assert!(matches!(
        result,
        Err(ShopError::OrderNotCancellable { reason: "delivery already completed", .. })
    ));
    test_assert_eq!(service.find_item(book).await.map_err(shop_err)?.stock_quantity, 9);
    Ok(())
}

#[tokio::test]
async fn test_order_requires_member_address_and_positive_counts() -> TestResult {
    let service = setup_service(100).await?;
    let homeless = service.join(NewMember::named("nomad")).await.map_err(shop_err)?;
    let book = add_item(&service, "JPA1 BOOK", 10000, 10).await?;

    let no_address = service
        .order(homeless, vec![OrderLineRequest { item_id: book, count: 1 }])
        .await;
    test_assert!(matches!(no_address, Err(ShopError::InvalidArgument(_))));

    let member = join_with_address(&service, "kim", "Seoul").await?;
    let zero = service
        .order(member, vec![OrderLineRequest { item_id: book, count: 0 }])
        .await;
    test_assert!(matches!(zero, Err(ShopError::InvalidArgument(_))));

    let missing_item = service
        .order(member, vec![OrderLineRequest { item_id: 999, count: 1 }])
        .await;
    test_assert!(matches!(missing_item, Err(ShopError::NotFound { ref entity, .. }) if entity == "item"));
    Ok(())
}

#[tokio::test]
async fn test_search_by_member_name_substring() -> TestResult {
    let service = setup_service(100).await?;
    create_three_orders(&service).await?;

    let found = service
        .search(OrderSearch {
            member_name: Some("user".to_string()),
            order_status: Some(OrderStatus::Ordered),
        })
        .await
        .map_err(shop_err)?;
    test_assert_eq!(found.len(), 3);
    test_assert!(found.windows(2).all(|w| w[0].id < w[1].id));

    let none = service
        .search(OrderSearch {
            member_name: Some("nobody".to_string()),
            order_status: None,
        })
        .await
        .map_err(shop_err)?;
    test_assert!(none.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_sample_data_seeded_once() -> TestResult {
    let service = setup_service(100).await?;

    test_assert!(seed_sample_data(&service).await.map_err(shop_err)?);
    test_assert!(!seed_sample_data(&service).await.map_err(shop_err)?);

    test_assert_eq!(service.find_members().await.map_err(shop_err)?.len(), 2);
    test_assert_eq!(service.find_items().await.map_err(shop_err)?.len(), 4);
    let orders = service.search(OrderSearch::default()).await.map_err(shop_err)?;
    test_assert_eq!(orders.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_update_missing_item() -> TestResult {
    let service = setup_service(100).await?;
    let result = service
        .update_item(
            7,
            NewItem {
                name: "ghost".to_string(),
                price: 1,
                stock_quantity: 1,
            },
        )
        .await;
    test_assert!(matches!(result, Err(ShopError::NotFound { ref entity, id: 7 }) if entity == "item"));
    Ok(())
}
