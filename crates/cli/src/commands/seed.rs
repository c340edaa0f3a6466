//! Seed the store from a YAML file.
//!
//! # Usage
//!
//! ```bash
//! fb-cli seed demos/seed.yaml
//! fb-cli seed demos/seed.yaml --replace
//! ```
//!
//! Every section is optional. Without `--replace`, entries are merged into
//! the existing documents by ID.

use std::collections::HashSet;

use foilbox_checkout::models::{Address, CatalogItem, Coupon, CreditCard};
use foilbox_checkout::store::{KeyValueStore, keys, load_list, save_list};
use foilbox_core::CouponKind;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{CliError, Context, read_file};

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub catalog: Vec<CatalogItem>,
    pub coupons: Vec<Coupon>,
    pub addresses: Vec<Address>,
    pub credit_cards: Vec<CreditCard>,
}

/// Load and apply a seed file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails
/// validation, or a document cannot be written.
pub async fn from_file(ctx: &Context, path: &str, replace: bool) -> Result<(), CliError> {
    info!(path, "Loading seed file");
    let content = read_file(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate_seed(&seed);
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CliError::InvalidSeed(errors.len()));
    }

    let store = ctx.store.as_ref();
    let items = write_section(store, keys::CARDS, seed.catalog, replace, |i| i.id.to_string()).await?;
    let coupons = write_section(store, keys::COUPONS, seed.coupons, replace, |c| c.id.to_string()).await?;
    let addresses = write_section(store, keys::CUSTOMER_ADDRESSES, seed.addresses, replace, |a| {
        a.id.to_string()
    })
    .await?;
    let cards = write_section(store, keys::CUSTOMER_CREDIT_CARDS, seed.credit_cards, replace, |c| {
        c.id.to_string()
    })
    .await?;

    info!("Seeding complete!");
    info!("  Catalog items: {items}");
    info!("  Coupons: {coupons}");
    info!("  Addresses: {addresses}");
    info!("  Credit cards: {cards}");
    Ok(())
}

/// Check a seed file for problems the checkout rules would trip over later.
#[must_use]
pub fn validate_seed(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();

    duplicate_ids(&mut errors, "catalog item", seed.catalog.iter().map(|i| i.id.as_str()));
    duplicate_ids(&mut errors, "coupon", seed.coupons.iter().map(|c| c.id.as_str()));
    duplicate_ids(&mut errors, "address", seed.addresses.iter().map(|a| a.id.as_str()));
    duplicate_ids(&mut errors, "credit card", seed.credit_cards.iter().map(|c| c.id.as_str()));

    for item in &seed.catalog {
        if item.price <= Decimal::ZERO {
            errors.push(format!("Catalog item {} must have a positive price", item.id));
        }
    }

    let mut codes = HashSet::new();
    for coupon in &seed.coupons {
        if !codes.insert(coupon.code.trim().to_ascii_lowercase()) {
            errors.push(format!("Coupon code {} is used more than once", coupon.code));
        }
        if coupon.discount <= Decimal::ZERO {
            errors.push(format!("Coupon {} must have a positive discount", coupon.code));
        }
        if coupon.kind == CouponKind::Percentage && coupon.discount > Decimal::ONE_HUNDRED {
            errors.push(format!("Coupon {} cannot discount more than 100%", coupon.code));
        }
        if coupon.is_exchange() && coupon.customer_id.is_none() {
            errors.push(format!("Exchange coupon {} needs an owning customer", coupon.code));
        }
    }

    for card in &seed.credit_cards {
        if card.last_four.len() != 4 || !card.last_four.chars().all(|c| c.is_ascii_digit()) {
            errors.push(format!("Credit card {} must store exactly four digits", card.id));
        }
        if !(1..=12).contains(&card.expiry_month) {
            errors.push(format!("Credit card {} has an invalid expiry month", card.id));
        }
    }

    errors
}

fn duplicate_ids<'a>(errors: &mut Vec<String>, kind: &str, ids: impl Iterator<Item = &'a str>) {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            errors.push(format!("A {kind} has a blank ID"));
        } else if !seen.insert(id) {
            errors.push(format!("Duplicate {kind} ID {id}"));
        }
    }
}

async fn write_section<S, T, F>(
    store: &S,
    key: &str,
    entries: Vec<T>,
    replace: bool,
    id_of: F,
) -> Result<usize, CliError>
where
    S: KeyValueStore,
    T: Serialize + DeserializeOwned + Send + Sync,
    F: Fn(&T) -> String,
{
    if entries.is_empty() {
        return Ok(0);
    }
    let count = entries.len();

    let merged = if replace {
        entries
    } else {
        let incoming: HashSet<String> = entries.iter().map(&id_of).collect();
        let mut existing: Vec<T> = load_list(store, key).await?;
        existing.retain(|e| !incoming.contains(&id_of(e)));
        existing.extend(entries);
        existing
    };

    save_list(store, key, &merged).await?;
    Ok(count)
}
