//! Complex random JSON object generator shared by the demo binaries.
//!
//! Grounded on `original_source/fault_tolerant_example.py`'s
//! `generate_complex_json`: a nested user/transaction/metadata/
//! analytics object with randomized fields, used to give the
//! fault-tolerant demo consumer something nontrivial to batch and
//! write out.

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

fn choice<'a, R: Rng + ?Sized>(rng: &mut R, options: &[&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap_or(options[0])
}

fn now_iso() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    // A lightweight stand-in for a full ISO-8601 timestamp; this demo
    // only needs a plausible, sortable value, not calendar accuracy.
    format!("epoch:{secs}")
}

/// Build one random nested JSON object with the same shape as the
/// original generator: `id`, `timestamp`, `user`, `transaction`,
/// `metadata`, `analytics`.
pub fn generate_complex_json() -> Value {
    let mut rng = rand::thread_rng();

    let item_count = rng.gen_range(1..=5);
    let items: Vec<Value> = (0..item_count)
        .map(|_| {
            json!({
                "product_id": format!("prod_{}", rng.gen_range(100..1000)),
                "name": choice(&mut rng, &["Widget", "Gadget", "Tool", "Device", "Accessory"]),
                "quantity": rng.gen_range(1..=10),
                "price": (rng.gen_range(500..50_000) as f64) / 100.0,
            })
        })
        .collect();

    let tag_pool = ["electronics", "fashion", "home", "sports", "books", "toys", "food"];
    let mut tags: Vec<&str> = tag_pool.to_vec();
    tags.shuffle(&mut rng);
    let tag_count = rng.gen_range(1..=4);
    let tags: Vec<&str> = tags.into_iter().take(tag_count).collect();

    json!({
        "id": rng.gen_range(1000..10_000),
        "timestamp": now_iso(),
        "user": {
            "user_id": format!("user_{}", rng.gen_range(1..10_000)),
            "name": choice(&mut rng, &["Alice", "Bob", "Charlie", "Diana", "Eve", "Frank", "Grace", "Henry"]),
            "email": format!("user{}@example.com", rng.gen_range(1..10_000)),
            "age": rng.gen_range(18..=80),
            "premium": rng.gen_bool(0.5),
            "preferences": {
                "theme": choice(&mut rng, &["dark", "light", "auto"]),
                "language": choice(&mut rng, &["en", "es", "fr", "de", "ja", "zh"]),
                "notifications": rng.gen_bool(0.5),
            }
        },
        "transaction": {
            "amount": (rng.gen_range(1000..500_000) as f64) / 100.0,
            "currency": choice(&mut rng, &["USD", "EUR", "GBP", "JPY", "CNY"]),
            "status": choice(&mut rng, &["pending", "completed", "failed", "refunded"]),
            "payment_method": choice(&mut rng, &["credit_card", "debit_card", "paypal", "crypto", "bank_transfer"]),
            "items": items,
        },
        "metadata": {
            "ip_address": format!(
                "{}.{}.{}.{}",
                rng.gen_range(1..=255),
                rng.gen_range(1..=255),
                rng.gen_range(1..=255),
                rng.gen_range(1..=255)
            ),
            "user_agent": choice(&mut rng, &[
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64)",
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)",
                "Mozilla/5.0 (X11; Linux x86_64)",
                "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X)",
            ]),
            "session_id": format!("sess_{}", rng.gen_range(100_000..1_000_000)),
            "referrer": choice(&mut rng, &["google.com", "facebook.com", "twitter.com", "direct", "email"]),
            "device_type": choice(&mut rng, &["desktop", "mobile", "tablet"]),
        },
        "analytics": {
            "page_views": rng.gen_range(1..=100),
            "time_on_site": rng.gen_range(10..=3600),
            "bounce_rate": (rng.gen_range(0..=100) as f64) / 100.0,
            "conversion": rng.gen_bool(0.5),
            "tags": tags,
        }
    })
}
