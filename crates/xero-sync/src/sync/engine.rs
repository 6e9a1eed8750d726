//! Sync engine
//!
//! Drives one full synchronization pass: fetch contacts and recent
//! invoices from the source, upsert each into the destination CRM keyed
//! by the source id, and report progress throughout. Per-entity failures
//! are counted and logged without aborting the batch; a failed fetch
//! aborts only its phase.

use chrono::{Months, NaiveDate, Utc};
use std::collections::HashMap;

use super::progress::{ProgressTracker, SyncStatus};
use crate::crm::{CrmApi, map_contact, map_invoice};
use crate::error::Result;
use crate::storage::SettingsStore;
use crate::xero::api::{Contact, Invoice};

pub(crate) mod keys {
    pub const SYNCED_CONTACTS_COUNT: &str = "xero_synced_contacts_count";
    pub const SYNCED_INVOICES_COUNT: &str = "xero_synced_invoices_count";
    pub const LAST_SYNC: &str = "xero_last_sync";
}

/// How far back invoices are synced
const INVOICE_WINDOW_MONTHS: u32 = 12;

/// Trait for the source accounting API.
///
/// Abstracting the client lets the sync engine run against an in-memory
/// fake in tests.
pub trait AccountingSource: Send + Sync {
    /// Fetch all contacts
    fn fetch_contacts(&self) -> Result<Vec<Contact>>;

    /// Fetch invoices issued within the given date range (inclusive)
    fn fetch_invoices(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Invoice>>;
}

/// Counters from a completed sync run
#[derive(Debug, Default, Clone)]
pub struct SyncOutcome {
    pub total_contacts: usize,
    pub synced_contacts: usize,
    pub total_invoices: usize,
    pub synced_invoices: usize,
    pub errors: usize,
}

/// Run one full synchronization pass.
///
/// This operation is idempotent: destination records are looked up by
/// the source id carried on each record, so re-runs update rather than
/// duplicate. On completion the persisted totals are incremented and the
/// last-sync timestamp written.
pub fn run_sync(
    source: &dyn AccountingSource,
    crm: &dyn CrmApi,
    settings: &dyn SettingsStore,
    progress: &ProgressTracker,
) -> Result<SyncOutcome> {
    progress.reset();
    let mut outcome = SyncOutcome::default();

    sync_contacts(source, crm, progress, &mut outcome);
    sync_invoices(source, crm, progress, &mut outcome);

    // Cumulative totals are added to, not replaced
    bump_counter(settings, keys::SYNCED_CONTACTS_COUNT, outcome.synced_contacts)?;
    bump_counter(settings, keys::SYNCED_INVOICES_COUNT, outcome.synced_invoices)?;
    settings.set(keys::LAST_SYNC, &Utc::now().timestamp().to_string())?;

    progress.update(SyncStatus::Completed, "Sync completed", 100);
    log::info!(
        "sync completed: {}/{} contacts, {}/{} invoices, {} errors",
        outcome.synced_contacts,
        outcome.total_contacts,
        outcome.synced_invoices,
        outcome.total_invoices,
        outcome.errors
    );
    Ok(outcome)
}

fn sync_contacts(
    source: &dyn AccountingSource,
    crm: &dyn CrmApi,
    progress: &ProgressTracker,
    outcome: &mut SyncOutcome,
) {
    progress.update(SyncStatus::FetchingContacts, "Fetching contacts", 5);

    let contacts = match source.fetch_contacts() {
        Ok(contacts) => contacts,
        Err(e) => {
            log::error!("contact fetch failed, skipping contacts phase: {}", e);
            outcome.errors += 1;
            progress.merge(|p| p.errors += 1);
            return;
        }
    };

    outcome.total_contacts = contacts.len();
    progress.merge(|p| p.total_contacts = contacts.len());

    // One destination listing builds the external-id index for the
    // whole phase; per-contact linear scans don't survive real datasets.
    let mut index = match crm.list_customers() {
        Ok(existing) => index_by_key(existing, |c| (c.xero_contact_id.clone(), c.id)),
        Err(e) => {
            log::error!("customer listing failed, skipping contacts phase: {}", e);
            outcome.errors += 1;
            progress.merge(|p| p.errors += 1);
            return;
        }
    };

    for (i, contact) in contacts.iter().enumerate() {
        let customer = map_contact(contact);
        let percent = 10 + (40 * i / outcome.total_contacts.max(1)) as u8;
        progress.update(SyncStatus::SyncingContacts, "Syncing contacts", percent);
        progress.merge(|p| {
            p.current_contact = contact.name.clone().unwrap_or_default();
        });

        let result = match index.get(&customer.xero_contact_id) {
            Some(&Some(id)) => crm.update_customer(id, &customer),
            _ => crm.create_customer(&customer),
        };

        match result {
            Ok(saved) => {
                // Track the assigned id so in-run duplicates update
                index.insert(saved.xero_contact_id.clone(), saved.id);
                outcome.synced_contacts += 1;
                progress.merge(|p| p.synced_contacts += 1);
            }
            Err(e) => {
                log::warn!(
                    "failed to sync contact {}: {}",
                    customer.xero_contact_id,
                    e
                );
                outcome.errors += 1;
                progress.merge(|p| p.errors += 1);
            }
        }
    }
}

fn sync_invoices(
    source: &dyn AccountingSource,
    crm: &dyn CrmApi,
    progress: &ProgressTracker,
    outcome: &mut SyncOutcome,
) {
    progress.update(SyncStatus::FetchingInvoices, "Fetching invoices", 50);

    let to = Utc::now().date_naive();
    let from = to
        .checked_sub_months(Months::new(INVOICE_WINDOW_MONTHS))
        .unwrap_or(to);

    let invoices = match source.fetch_invoices(from, to) {
        Ok(invoices) => invoices,
        Err(e) => {
            log::error!("invoice fetch failed, skipping invoices phase: {}", e);
            outcome.errors += 1;
            progress.merge(|p| p.errors += 1);
            return;
        }
    };

    outcome.total_invoices = invoices.len();
    progress.merge(|p| p.total_invoices = invoices.len());

    let mut index = match crm.list_transactions() {
        Ok(existing) => index_by_key(existing, |t| (t.xero_invoice_id.clone(), t.id)),
        Err(e) => {
            log::error!("transaction listing failed, skipping invoices phase: {}", e);
            outcome.errors += 1;
            progress.merge(|p| p.errors += 1);
            return;
        }
    };

    for (i, invoice) in invoices.iter().enumerate() {
        let transaction = map_invoice(invoice);
        let percent = 50 + (40 * i / outcome.total_invoices.max(1)) as u8;
        progress.update(SyncStatus::SyncingInvoices, "Syncing invoices", percent);
        progress.merge(|p| {
            p.current_invoice = invoice.invoice_number.clone().unwrap_or_default();
        });

        let result = match index.get(&transaction.xero_invoice_id) {
            Some(&Some(id)) => crm.update_transaction(id, &transaction),
            _ => crm.create_transaction(&transaction),
        };

        match result {
            Ok(saved) => {
                index.insert(saved.xero_invoice_id.clone(), saved.id);
                outcome.synced_invoices += 1;
                progress.merge(|p| p.synced_invoices += 1);
            }
            Err(e) => {
                log::warn!(
                    "failed to sync invoice {}: {}",
                    transaction.xero_invoice_id,
                    e
                );
                outcome.errors += 1;
                progress.merge(|p| p.errors += 1);
            }
        }
    }
}

/// Build an external-id index from a destination listing, skipping
/// records that carry no external id
fn index_by_key<T>(
    records: Vec<T>,
    key: impl Fn(&T) -> (String, Option<i64>),
) -> HashMap<String, Option<i64>> {
    records
        .into_iter()
        .filter_map(|record| {
            let (external_id, id) = key(&record);
            (!external_id.is_empty()).then_some((external_id, id))
        })
        .collect()
}

fn bump_counter(settings: &dyn SettingsStore, key: &str, added: usize) -> Result<()> {
    let current: usize = settings
        .get(key)?
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    settings.set(key, &(current + added).to_string())?;
    Ok(())
}
