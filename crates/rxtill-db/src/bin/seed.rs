//! # Seed Data Generator
//!
//! Populates the database with demo medicines and batches for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p rxtill-db --bin seed
//!
//! # Specify database path and tenant
//! cargo run -p rxtill-db --bin seed -- --db ./data/rxtill.db --tenant demo-pharmacy
//! ```
//!
//! Each medicine gets two or three expiry-dated batches so FEFO behavior
//! is visible from the first finalized bill, including one deliberately
//! short-dated lot for exercising the override path.

use chrono::{Duration, Utc};
use std::env;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use rxtill_core::batch::Batch;
use rxtill_core::types::{Medicine, RegulatoryClass};
use rxtill_db::{Database, DbConfig};

/// (name, generic, price cents, cost cents, prescription required, class)
const MEDICINES: &[(&str, &str, i64, i64, bool, RegulatoryClass)] = &[
    ("Paracetamol 500mg", "paracetamol", 300, 180, false, RegulatoryClass::Otc),
    ("Cetirizine 10mg", "cetirizine", 800, 500, false, RegulatoryClass::Otc),
    ("Ibuprofen 400mg", "ibuprofen", 600, 350, false, RegulatoryClass::Otc),
    ("ORS Sachet", "oral rehydration salts", 250, 120, false, RegulatoryClass::Otc),
    ("Amoxicillin 500mg", "amoxicillin", 2000, 1200, true, RegulatoryClass::PrescriptionOnly),
    ("Azithromycin 250mg", "azithromycin", 3500, 2100, true, RegulatoryClass::PrescriptionOnly),
    ("Amlodipine 5mg", "amlodipine", 1200, 700, true, RegulatoryClass::PrescriptionOnly),
    ("Metformin 500mg", "metformin", 900, 520, true, RegulatoryClass::PrescriptionOnly),
    ("Tramadol 50mg", "tramadol", 2800, 1700, true, RegulatoryClass::Controlled),
    ("Diazepam 5mg", "diazepam", 1800, 1000, true, RegulatoryClass::Controlled),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./rxtill_dev.db");
    let mut tenant_id = String::from("demo-pharmacy");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--tenant" | "-t" => {
                if i + 1 < args.len() {
                    tenant_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("RxTill Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (default: ./rxtill_dev.db)");
                println!("  -t, --tenant <ID>     Tenant id to seed (default: demo-pharmacy)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("RxTill Seed Data Generator");
    println!("==========================");
    println!("Database: {db_path}");
    println!("Tenant:   {tenant_id}");
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM medicines WHERE tenant_id = ?1")
        .bind(&tenant_id)
        .fetch_one(db.pool())
        .await?;
    if existing > 0 {
        println!("⚠ Tenant already has {existing} medicines; skipping seed.");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let mut seeded = 0;

    for (idx, (name, generic, price, cost, rx, class)) in MEDICINES.iter().enumerate() {
        let now = Utc::now();
        let mut batches = vec![
            Batch::new(
                format!("LOT-{:03}A", idx + 1),
                today + Duration::days(90 + (idx as i64 * 30) % 365),
                40 + (idx as i64 * 7) % 60,
            ),
            Batch::new(
                format!("LOT-{:03}B", idx + 1),
                today + Duration::days(400 + (idx as i64 * 45) % 300),
                100,
            ),
        ];
        // Every third medicine carries an already-expired lot so the
        // override workflow has something to trip over.
        if idx % 3 == 0 {
            batches.push(Batch::new(
                format!("LOT-{:03}X", idx + 1),
                today - Duration::days(30),
                10,
            ));
        }

        let mut medicine = Medicine {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.clone(),
            name: (*name).to_string(),
            generic_name: Some((*generic).to_string()),
            unit_price_cents: *price,
            unit_cost_cents: *cost,
            reorder_threshold: 25,
            prescription_required: *rx,
            regulatory_class: *class,
            batches,
            total_stock: 0,
            next_expiry: None,
            next_expiry_lot: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        db.medicines().create(&mut medicine).await?;
        seeded += 1;
        println!(
            "  {} ({} units, next expiry {})",
            medicine.name,
            medicine.total_stock,
            medicine
                .next_expiry
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }

    println!();
    println!("✓ Seeded {seeded} medicines for tenant {tenant_id}");

    Ok(())
}
