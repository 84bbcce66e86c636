use std::sync::Arc;

use view_update::mutation::RowUpdate;
use view_update::storage::BaseTable;
use view_update::storage::ViewTables;
use view_update::BaseKey;
use view_update::BaseMutation;
use view_update::BaseSchema;
use view_update::EngineConfig;
use view_update::ViewDefinition;
use view_update::ViewUpdateEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A table keyed by (k, c) with regular columns a, b, e
    let schema = Arc::new(
        BaseSchema::new("t", "k")
            .with_clustering_key("c")
            .with_regular(["a", "b", "e"]),
    );

    // A view selecting a and b, and a view keyed additionally by b
    let by_key = Arc::new(
        ViewDefinition::builder("by_key", schema.clone())
            .select(["a", "b"])
            .build()?,
    );
    let by_b = Arc::new(
        ViewDefinition::builder("by_b", schema)
            .select_all()
            .promote("b")
            .build()?,
    );

    let mut views = ViewTables::new();
    views.add(by_key.clone());
    views.add(by_b.clone());

    let engine = ViewUpdateEngine::new(BaseTable::new(), views, EngineConfig::default())
        .with_view(by_key)
        .with_view(by_b);

    let now = 1_000;
    let key = BaseKey::new("1", "1");

    // Insert a row
    let updates = engine
        .apply(
            RowUpdate::insert(key.clone(), 10)
                .set("a", "x")
                .set("b", "1")
                .build(),
            now,
        )
        .await?;
    for u in updates.iter() {
        println!("{}: {:?}", u.view, u.intents);
    }

    // Change the promoted column: `by_b` moves the row
    let updates = engine
        .apply(RowUpdate::update(key.clone(), 11).set("b", "2").build(), now)
        .await?;
    for u in updates.iter() {
        println!("{}: {:?}", u.view, u.intents);
    }

    // Delete the whole partition
    let updates = engine
        .apply(BaseMutation::delete_partition("1", 12), now)
        .await?;
    for u in updates.iter() {
        println!("{}: {:?}", u.view, u.intents);
    }

    let views = engine.writer().lock().await;
    for name in ["by_key", "by_b"] {
        if let Some(table) = views.get(name) {
            println!("{} contents: {:?}", name, table.read(now));
        }
    }

    Ok(())
}
