//! Catalog seeding.
//!
//! Inserts a starter set of candy products. Existing handles are left
//! alone, so the command is safe to re-run.

use sweet_delights_core::Money;
use sweet_delights_storefront::db::products::{NewProduct, ProductRepository};

use super::{CommandError, connect};

struct Seed {
    handle: &'static str,
    title: &'static str,
    description: &'static str,
    category: &'static str,
    price_kopecks: u64,
    weight_grams: i32,
}

const SEEDS: &[Seed] = &[
    Seed {
        handle: "dark-chocolate-truffles",
        title: "Dark Chocolate Truffles",
        description: "A dozen handmade 70% dark chocolate truffles.",
        category: "chocolate",
        price_kopecks: 89_900,
        weight_grams: 250,
    },
    Seed {
        handle: "salted-caramel-box",
        title: "Salted Caramel Box",
        description: "Soft caramels with sea salt, 16 pieces.",
        category: "caramel",
        price_kopecks: 64_900,
        weight_grams: 320,
    },
    Seed {
        handle: "raspberry-marshmallow",
        title: "Raspberry Marshmallow",
        description: "Airy zephyr-style marshmallow with raspberry puree.",
        category: "marshmallow",
        price_kopecks: 42_500,
        weight_grams: 400,
    },
    Seed {
        handle: "assorted-lollipops",
        title: "Assorted Lollipops",
        description: "Ten fruit lollipops in mixed flavours.",
        category: "lollipops",
        price_kopecks: 29_900,
        weight_grams: 180,
    },
    Seed {
        handle: "celebration-gift-set",
        title: "Celebration Gift Set",
        description: "Chocolate, caramel, and marshmallow in a gift box.",
        category: "gift-sets",
        price_kopecks: 189_900,
        weight_grams: 950,
    },
];

/// Insert the starter catalog.
///
/// # Errors
///
/// Returns `CommandError` if the connection or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;
    let products = ProductRepository::new(&pool);

    let mut created = 0_u32;
    for seed in SEEDS {
        if products.get_by_handle(seed.handle).await?.is_some() {
            tracing::debug!(handle = seed.handle, "already present, skipping");
            continue;
        }

        products
            .create(&NewProduct {
                handle: seed.handle.to_owned(),
                title: seed.title.to_owned(),
                description: seed.description.to_owned(),
                category: seed.category.to_owned(),
                price: Money::from_kopecks(seed.price_kopecks),
                weight_grams: seed.weight_grams,
                available: true,
            })
            .await?;
        created += 1;
        tracing::info!(handle = seed.handle, "seeded");
    }

    tracing::info!(created, total = SEEDS.len(), "seeding complete");
    Ok(())
}
