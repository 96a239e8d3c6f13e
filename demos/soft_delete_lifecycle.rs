//! # Soft Delete Lifecycle
//!
//! Walks one model through the full soft delete lifecycle on the in-memory
//! executor, so it runs without a database:
//!
//! - deleting stamps `deleted_at` and hides the row
//! - `with_trashed` / `only_trashed` widen or flip visibility per query
//! - restoring an instance or a whole query
//! - force deleting removes the row for good
//!
//! Run with `cargo run --example soft_delete_lifecycle --features mock`.

use softhaus::prelude::*;
use softhaus::store_object::MockExecutor;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Option<i64>,
    pub email: String,
    #[serde(flatten)]
    pub soft_delete: SoftDeleteFields,
    #[serde(skip)]
    pub state: ModelState,
}

impl Customer {
    fn new(email: &str) -> Self {
        Self {
            id: None,
            email: email.to_string(),
            soft_delete: SoftDeleteFields::default(),
            state: ModelState::default(),
        }
    }
}

impl Model for Customer {
    fn model_name() -> &'static str {
        "Customer"
    }

    fn table_name() -> &'static str {
        "customers"
    }

    fn columns() -> Vec<ColumnDefinition> {
        vec![ColumnDefinition::primary("id"), ColumnDefinition::new("email")]
    }

    fn boot(definition: &mut ModelDefinition<Self>) {
        softhaus::soft_deletes::boot(definition);
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }
}

impl SoftDeletes for Customer {
    fn soft_delete_fields(&self) -> &SoftDeleteFields {
        &self.soft_delete
    }

    fn soft_delete_fields_mut(&mut self) -> &mut SoftDeleteFields {
        &mut self.soft_delete
    }
}

fn emails(customers: &[Customer]) -> Vec<&str> {
    customers.iter().map(|c| c.email.as_str()).collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("SoftHaus soft delete lifecycle");
    println!("==============================");

    let executor = Arc::new(MockExecutor::new());
    let mut softhaus = SoftHaus::with_executor(executor.clone());
    let customers = softhaus.register::<Customer>()?;

    println!("\nStep 1: create customers");
    let mut ada = Customer::new("ada@example.com");
    let mut bob = Customer::new("bob@example.com");
    customers.save(&mut ada).await?;
    customers.save(&mut bob).await?;
    println!("  live: {:?}", emails(&customers.all().await?));

    println!("\nStep 2: soft delete bob");
    customers.delete(&mut bob).await?;
    println!("  bob.deleted_at = {:?}", bob.deleted_at());
    println!("  live:    {:?}", emails(&customers.all().await?));
    println!("  all:     {:?}", emails(&customers.with_trashed().exec().await?));
    println!("  trashed: {:?}", emails(&customers.only_trashed().exec().await?));
    println!("  rows kept in table: {}", executor.rows("customers").len());

    println!("\nStep 3: paginate");
    let page = customers.with_trashed().paginate(1, 1).await?;
    println!(
        "  page {}/{} of {} rows: {:?}",
        page.current_page(),
        page.last_page(),
        page.total(),
        emails(page.all())
    );

    println!("\nStep 4: restore bob");
    customers.restore(&mut bob).await?;
    println!("  bob trashed: {}", bob.trashed());
    println!("  live: {:?}", emails(&customers.all().await?));

    println!("\nStep 5: bulk delete and restore by query");
    customers.delete(&mut ada).await?;
    customers.delete(&mut bob).await?;
    let restored = customers
        .query()
        .filter(QueryFilter::like("customers.email", "ada%"))
        .restore()
        .await?;
    println!("  restored {} row(s), live: {:?}", restored, emails(&customers.all().await?));

    println!("\nStep 6: force delete ada");
    let mut ada = customers.find_or_fail(1).await?;
    customers.force_delete(&mut ada).await?;
    println!("  rows kept in table: {}", executor.rows("customers").len());
    match customers.restore(&mut ada).await {
        Err(err) => println!("  restore refused: {}", err),
        Ok(()) => println!("  restore unexpectedly succeeded"),
    }

    println!("\nStatements issued:");
    for statement in executor.transaction_log() {
        println!("  {}", statement.sql);
    }

    Ok(())
}
