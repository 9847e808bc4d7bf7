//! Stream names and the gateway object tags they read from.

/// Known streams and their object tags.
pub const OBJECTS: &[(&str, &str)] = &[
    ("accounts_payable_bills", "APBILL"),
    ("accounts_payable_payments", "APPYMT"),
    ("accounts_payable_vendors", "VENDOR"),
    ("accounts_receivable_customers", "CUSTOMER"),
    ("customers", "CUSTOMER"),
    ("general_ledger_accounts", "GLACCOUNT"),
    ("general_ledger_details", "GLDETAIL"),
    ("general_ledger_journal_entries", "GLBATCH"),
    ("classes", "CLASS"),
    ("departments", "DEPARTMENT"),
    ("item", "ITEM"),
    ("locations", "LOCATION"),
    ("payment_provider_bank_accounts", "CHECKINGACCOUNT"),
    ("projects", "PROJECT"),
    ("purchase_orders", "PODOCUMENT"),
];

/// Looks up the object tag for a stream name.
///
/// ```
/// assert_eq!(intacct_link::objects::object_tag("accounts_payable_vendors"), Some("VENDOR"));
/// assert_eq!(intacct_link::objects::object_tag("unknown"), None);
/// ```
pub fn object_tag(stream: &str) -> Option<&'static str> {
    OBJECTS
        .iter()
        .find(|(name, _)| *name == stream)
        .map(|(_, tag)| *tag)
}
