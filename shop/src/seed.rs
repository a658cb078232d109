use tracing::info;

use crate::error::ShopResult;
use crate::model::{Address, NewItem, NewMember, OrderLineRequest};
use crate::service::{ItemService, MemberService, OrderService, ProdShopService};

struct SampleCustomer {
    name: &'static str,
    address: (&'static str, &'static str, &'static str),
    books: [(&'static str, i32, i32); 2],
}

const SAMPLE_CUSTOMERS: [SampleCustomer; 2] = [
    SampleCustomer {
        name: "userA",
        address: ("Seoul", "1", "1111"),
        books: [("JPA1 BOOK", 10000, 1), ("JPA2 BOOK", 20000, 2)],
    },
    SampleCustomer {
        name: "userB",
        address: ("Busan", "2", "2222"),
        books: [("SPRING1 BOOK", 20000, 3), ("SPRING2 BOOK", 40000, 4)],
    },
];

const SAMPLE_STOCK: i32 = 100;

/// Creates two members with one two-book order each, unless members already
/// exist. Returns whether anything was written.
pub async fn seed_sample_data(service: &ProdShopService) -> ShopResult<bool> {
    if !service.find_members().await?.is_empty() {
        info!("Members present, skipping sample data");
        return Ok(false);
    }

    for customer in &SAMPLE_CUSTOMERS {
        let (city, street, zipcode) = customer.address;
        let member_id = service
            .join(NewMember::with_address(customer.name, Address::new(city, street, zipcode)))
            .await?;

        let mut lines = Vec::with_capacity(customer.books.len());
        for (name, price, count) in customer.books {
            let item_id = service
                .save_item(NewItem {
                    name: name.to_string(),
                    price,
                    stock_quantity: SAMPLE_STOCK,
                })
                .await?;
            lines.push(OrderLineRequest { item_id, count });
        }

        let order_id = service.order(member_id, lines).await?;
        info!(member = customer.name, order_id, "Seeded sample order");
    }
    Ok(true)
}
