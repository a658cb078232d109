mod test_utils;

use common::test_helpers::TestResult;
use common::{test_assert, test_assert_eq};
use sea_orm::{ActiveValue::NotSet, Set};
use shop::entities::item;
use shop::service::ItemService;
use shop::storage::{ItemRepository, Session};
use test_utils::*;

fn book(name: &str) -> item::ActiveModel {
    item::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        price: Set(10000),
        stock_quantity: Set(5),
    }
}

#[tokio::test]
async fn test_commit_persists_and_reports_statements() -> TestResult {
    let service = setup_service(100).await?;

    let session = Session::begin(service.db(), "commit").await?;
    test_assert_eq!(session.label(), "commit");
    let saved = ItemRepository::save(&session, book("JPA1 BOOK")).await.map_err(shop_err)?;
    let before = session.statement_count();
    test_assert!(before >= 1);
    ItemRepository::find_one(&session, saved.id).await.map_err(shop_err)?;
    test_assert_eq!(session.statement_count(), before + 1);
    let statements = session.commit().await?;

    test_assert_eq!(statements, before + 1);
    test_assert_eq!(service.find_items().await.map_err(shop_err)?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_dropped_session_rolls_back() -> TestResult {
    let service = setup_service(100).await?;

    {
        let session = Session::begin(service.db(), "abandoned").await?;
        ItemRepository::save(&session, book("JPA2 BOOK")).await.map_err(shop_err)?;
    }

    test_assert!(service.find_items().await.map_err(shop_err)?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_save_with_id_overwrites_every_field() -> TestResult {
    let service = setup_service(100).await?;
    let session = Session::begin(service.db(), "merge").await?;
    let saved = ItemRepository::save(&session, book("SPRING1 BOOK")).await.map_err(shop_err)?;

    let merged = ItemRepository::save(
        &session,
        item::ActiveModel {
            id: Set(saved.id),
            name: Set("SPRING2 BOOK".to_string()),
            price: Set(40000),
            stock_quantity: Set(7),
        },
    )
    .await
    .map_err(shop_err)?;
    session.commit().await?;

    test_assert_eq!(merged.id, saved.id);
    let stored = service.find_item(saved.id).await.map_err(shop_err)?;
    test_assert_eq!(stored.name, "SPRING2 BOOK");
    test_assert_eq!(stored.price, 40000);
    test_assert_eq!(stored.stock_quantity, 7);
    Ok(())
}
