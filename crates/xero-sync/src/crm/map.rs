//! Source-entity to CRM-record mapping
//!
//! Pure, stateless transformations. Every produced record carries the
//! source entity's identifier so re-runs resolve to updates rather than
//! duplicates.

use super::{CrmCustomer, CrmTransaction};
use crate::xero::api::{Contact, Invoice};

/// Map a source contact to a CRM customer record.
///
/// The single display name is split into first/last at the first
/// whitespace boundary; a single-token name leaves the last name empty.
pub fn map_contact(contact: &Contact) -> CrmCustomer {
    let name = contact.name.as_deref().unwrap_or("");
    let (fname, lname) = split_name(name);

    let tel = contact
        .phones
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find_map(|p| p.phone_number.as_deref().filter(|n| !n.is_empty()))
        .unwrap_or("")
        .to_string();

    let address = contact
        .addresses
        .as_deref()
        .unwrap_or_default()
        .first();

    CrmCustomer {
        id: None,
        fname,
        lname,
        email: contact.email_address.clone().unwrap_or_default(),
        tel,
        addr1: field(address.and_then(|a| a.address_line1.as_deref())),
        addr2: field(address.and_then(|a| a.address_line2.as_deref())),
        city: field(address.and_then(|a| a.city.as_deref())),
        county: field(address.and_then(|a| a.region.as_deref())),
        postcode: field(address.and_then(|a| a.postal_code.as_deref())),
        country: field(address.and_then(|a| a.country.as_deref())),
        xero_contact_id: contact.contact_id.clone(),
    }
}

/// Map a source invoice to a CRM transaction record
pub fn map_invoice(invoice: &Invoice) -> CrmTransaction {
    let number = invoice.invoice_number.as_deref().unwrap_or("");

    let desc = invoice
        .line_items
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|item| item.description.as_deref().filter(|d| !d.is_empty()))
        .collect::<Vec<_>>()
        .join(", ");

    CrmTransaction {
        id: None,
        title: format!("Invoice {}", number),
        total: invoice.total.unwrap_or(0.0),
        currency: invoice.currency_code.clone().unwrap_or_default(),
        status: invoice
            .status
            .as_deref()
            .unwrap_or("")
            .to_lowercase(),
        desc,
        date: invoice.date.clone().unwrap_or_default(),
        due_date: invoice.due_date.clone().unwrap_or_default(),
        reference: number.to_string(),
        xero_invoice_id: invoice.invoice_id.clone(),
    }
}

/// Split a display name at the first whitespace boundary
fn split_name(name: &str) -> (String, String) {
    let name = name.trim();
    match name.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim_start().to_string()),
        None => (name.to_string(), String::new()),
    }
}

fn field(value: Option<&str>) -> String {
    value.unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xero::api::{Address, LineItem, Phone};

    #[test]
    fn test_split_name_two_tokens() {
        assert_eq!(
            split_name("Acme Corp"),
            ("Acme".to_string(), "Corp".to_string())
        );
    }

    #[test]
    fn test_split_name_single_token() {
        assert_eq!(split_name("Madonna"), ("Madonna".to_string(), String::new()));
    }

    #[test]
    fn test_split_name_multiple_tokens() {
        assert_eq!(
            split_name("Acme Corp Pty Ltd"),
            ("Acme".to_string(), "Corp Pty Ltd".to_string())
        );
    }

    #[test]
    fn test_map_contact_full() {
        let contact = Contact {
            contact_id: "c-1".to_string(),
            name: Some("Acme Corp".to_string()),
            email_address: Some("billing@acme.example".to_string()),
            phones: Some(vec![
                Phone {
                    phone_type: Some("DEFAULT".to_string()),
                    phone_number: None,
                },
                Phone {
                    phone_type: Some("MOBILE".to_string()),
                    phone_number: Some("555-0100".to_string()),
                },
            ]),
            addresses: Some(vec![Address {
                address_type: Some("POBOX".to_string()),
                address_line1: Some("1 Main St".to_string()),
                address_line2: None,
                city: Some("Springfield".to_string()),
                region: Some("IL".to_string()),
                postal_code: Some("62701".to_string()),
                country: Some("US".to_string()),
            }]),
        };

        let customer = map_contact(&contact);
        assert_eq!(customer.fname, "Acme");
        assert_eq!(customer.lname, "Corp");
        assert_eq!(customer.email, "billing@acme.example");
        // First non-empty phone number wins
        assert_eq!(customer.tel, "555-0100");
        assert_eq!(customer.addr1, "1 Main St");
        assert_eq!(customer.addr2, "");
        assert_eq!(customer.city, "Springfield");
        assert_eq!(customer.county, "IL");
        assert_eq!(customer.postcode, "62701");
        assert_eq!(customer.country, "US");
        assert_eq!(customer.xero_contact_id, "c-1");
    }

    #[test]
    fn test_map_contact_minimal_yields_empty_strings() {
        let contact = Contact {
            contact_id: "c-2".to_string(),
            name: None,
            email_address: None,
            phones: None,
            addresses: None,
        };

        let customer = map_contact(&contact);
        assert_eq!(customer.fname, "");
        assert_eq!(customer.lname, "");
        assert_eq!(customer.email, "");
        assert_eq!(customer.tel, "");
        assert_eq!(customer.addr1, "");
        assert_eq!(customer.country, "");
        assert_eq!(customer.xero_contact_id, "c-2");
    }

    #[test]
    fn test_map_contact_is_deterministic() {
        let contact = Contact {
            contact_id: "c-3".to_string(),
            name: Some("Madonna".to_string()),
            ..Contact::default()
        };
        assert_eq!(map_contact(&contact), map_contact(&contact));
    }

    #[test]
    fn test_map_invoice_full() {
        let invoice = Invoice {
            invoice_id: "i-1".to_string(),
            invoice_number: Some("INV-0042".to_string()),
            total: Some(150.5),
            currency_code: Some("USD".to_string()),
            date: Some("2026-07-01".to_string()),
            due_date: Some("2026-07-31".to_string()),
            status: Some("AUTHORISED".to_string()),
            line_items: Some(vec![
                LineItem {
                    description: Some("Consulting".to_string()),
                },
                LineItem { description: None },
                LineItem {
                    description: Some("Hosting".to_string()),
                },
            ]),
        };

        let tx = map_invoice(&invoice);
        assert_eq!(tx.title, "Invoice INV-0042");
        assert_eq!(tx.total, 150.5);
        assert_eq!(tx.currency, "USD");
        assert_eq!(tx.status, "authorised");
        assert_eq!(tx.desc, "Consulting, Hosting");
        assert_eq!(tx.date, "2026-07-01");
        assert_eq!(tx.due_date, "2026-07-31");
        assert_eq!(tx.reference, "INV-0042");
        assert_eq!(tx.xero_invoice_id, "i-1");
    }

    #[test]
    fn test_map_invoice_minimal_yields_empty_strings() {
        let invoice = Invoice {
            invoice_id: "i-2".to_string(),
            ..Invoice::default()
        };

        let tx = map_invoice(&invoice);
        assert_eq!(tx.total, 0.0);
        assert_eq!(tx.currency, "");
        assert_eq!(tx.status, "");
        assert_eq!(tx.desc, "");
        assert_eq!(tx.date, "");
        assert_eq!(tx.xero_invoice_id, "i-2");
    }
}
