//! Record-type conversion tables and reserved field ids

/// Record type used for transaction-wide searches
pub const TRANSACTION: &str = "transaction";
pub const SALES_ORDER: &str = "salesorder";
pub const PURCHASE_ORDER: &str = "purchaseorder";
pub const ITEM_FULFILLMENT: &str = "itemfulfillment";
pub const ITEM_RECEIPT: &str = "itemreceipt";

/// Sublist names handled by the line matcher
pub const ITEM_SUBLIST: &str = "item";
pub const PACKAGE_SUBLIST: &str = "package";

/// Reserved target field and column ids
pub const CREATED_FROM_FIELD: &str = "createdfrom";
pub const LINE_FIELD: &str = "line";
pub const ITEM_COLUMN: &str = "item";
pub const RECEIVE_COLUMN: &str = "itemreceive";
pub const PACKAGE_WEIGHT_COLUMN: &str = "packageweight";
pub const PACKAGE_TRACKING_COLUMN: &str = "packagetrackingnumber";
pub const STATUS_FIELD: &str = "status";

/// Error log record written when error records are persisted
pub const ERROR_LOG_NAME_FIELD: &str = "altname";
pub const ERROR_LOG_TRANSACTION_ID_FIELD: &str = "custrecord_transaction_id";
pub const ERROR_LOG_TRANSACTION_INTERNAL_ID_FIELD: &str = "custrecord_transaction_internal_id";
pub const ERROR_LOG_MESSAGE_FIELD: &str = "custrecord_error_message";

/// Source document statuses that cannot be fulfilled or received
pub const RESTRICTED_ORDER_STATUSES: [&str; 5] = [
    "pendingApproval",
    "cancelled",
    "pendingBilling",
    "billed",
    "closed",
];

const TRANSACTION_CODES: [(&str, &str); 29] = [
    ("Build", "assemblybuild"),
    ("Unbuild", "assemblyunbuild"),
    ("VendBill", "vendorbill"),
    ("VendCred", "vendorcredit"),
    ("VendPymt", "vendorpayment"),
    ("BinWksht", "binworksheet"),
    ("BinTrnfr", "bintransfer"),
    ("CashRfnd", "cashrefund"),
    ("CashSale", "cashsale"),
    ("Check", "check"),
    ("CustCred", "creditmemo"),
    ("CustDep", "customerdeposit"),
    ("CustRfnd", "customerrefund"),
    ("Deposit", "deposit"),
    ("DepAppl", "depositapplication"),
    ("ExpRept", "expensereport"),
    ("InvAdjst", "inventoryadjustment"),
    ("InvTrnfr", "inventorytransfer"),
    ("CustInvc", "invoice"),
    ("ItemShip", "itemfulfillment"),
    ("ItemRcpt", "itemreceipt"),
    ("Opprtnty", "opportunity"),
    ("CustPymt", "customerpayment"),
    ("PurchOrd", "purchaseorder"),
    ("RtnAuth", "returnauthorization"),
    ("SalesOrd", "salesorder"),
    ("VendAuth", "vendorreturnauthorization"),
    ("WorkOrd", "workorder"),
    ("Journal", "journalentry"),
];

/// Record type for an internal transaction code (`"SalesOrd"` → `"salesorder"`).
pub fn record_type_for_code(code: &str) -> Option<&'static str> {
    TRANSACTION_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, record_type)| *record_type)
}

/// Internal transaction code for a record type (`"salesorder"` → `"SalesOrd"`).
pub fn code_for_record_type(record_type: &str) -> Option<&'static str> {
    TRANSACTION_CODES
        .iter()
        .find(|(_, r)| *r == record_type)
        .map(|(code, _)| *code)
}

/// Record type for a transaction display name. Names that exist but cannot
/// be integrated ("Credit Card", "Currency Revaluation") resolve to `None`.
pub fn record_type_for_transaction_name(name: &str) -> Option<&'static str> {
    match name {
        "Bill" => Some("vendorbill"),
        "Bill Credit" => Some("vendorcredit"),
        "Bill Payment" => Some("vendorpayment"),
        "Bin Putaway Worksheet" => Some("binworksheet"),
        "Bin Transfer" => Some("bintransfer"),
        "Cash Refund" | "CCard Refund" => Some("cashrefund"),
        "Cash Sale" => Some("cashsale"),
        "Check" => Some("check"),
        "Commission" => Some("commission"),
        "Credit Memo" => Some("creditmemo"),
        "Customer Deposit" => Some("customerdeposit"),
        "Customer Refund" => Some("customerrefund"),
        "Deposit" => Some("deposit"),
        "Deposit Application" => Some("depositapplication"),
        "Expense Report" => Some("expensereport"),
        "Inventory Adjustment" => Some("inventoryadjustment"),
        "Inventory Count" => Some("inventorycount"),
        "Inventory Transfer" => Some("inventorytransfer"),
        "Inventory Worksheet" => Some("inventoryworksheet"),
        "Invoice" => Some("invoice"),
        "Item Fulfillment" => Some(ITEM_FULFILLMENT),
        "Item Receipt" => Some(ITEM_RECEIPT),
        "Journal" => Some("journalentry"),
        "Opportunity" => Some("opportunity"),
        "Payment" => Some("customerpayment"),
        "Purchase Order" => Some(PURCHASE_ORDER),
        "Quote" => Some("estimate"),
        "Return Authorization" => Some("returnauthorization"),
        "Sales Order" => Some(SALES_ORDER),
        "Transfer Order" => Some("transferorder"),
        "Vendor Return Authorization" => Some("vendorreturnauthorization"),
        _ => None,
    }
}

/// Search column used to resolve a reference held by `field_id`.
pub fn lookup_column_for(field_id: &str) -> Option<&'static str> {
    match field_id {
        "item" => Some("itemid"),
        "entity" | "partner" | "employee" => Some("entityid"),
        CREATED_FROM_FIELD => Some("numbertext"),
        _ => None,
    }
}

/// Source record type a transformation target is derived from.
pub fn transform_source_for(target_type: &str) -> Option<&'static str> {
    match target_type {
        ITEM_RECEIPT => Some(PURCHASE_ORDER),
        ITEM_FULFILLMENT => Some(SALES_ORDER),
        _ => None,
    }
}

/// Whether a source document in `status` may be fulfilled or received.
pub fn can_order_be_fulfilled(status: &str) -> bool {
    !RESTRICTED_ORDER_STATUSES.contains(&status)
}

/// Header fields written by display text instead of internal value.
pub fn is_display_text_field(field_id: &str) -> bool {
    matches!(field_id, "status" | "orderstatus")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_for_transform_sources() {
        assert_eq!(code_for_record_type(SALES_ORDER), Some("SalesOrd"));
        assert_eq!(record_type_for_code("PurchOrd"), Some(PURCHASE_ORDER));
        assert_eq!(code_for_record_type("customer"), None);
    }

    #[test]
    fn transaction_names_resolve() {
        assert_eq!(record_type_for_transaction_name("Item Fulfillment"), Some(ITEM_FULFILLMENT));
        assert_eq!(record_type_for_transaction_name("Quote"), Some("estimate"));
        assert_eq!(record_type_for_transaction_name("Credit Card"), None);
    }

    #[test]
    fn restricted_statuses_block_fulfillment() {
        assert!(!can_order_be_fulfilled("closed"));
        assert!(!can_order_be_fulfilled("pendingApproval"));
        assert!(can_order_be_fulfilled("pendingFulfillment"));
    }

    #[test]
    fn only_item_targets_are_transformed() {
        assert_eq!(transform_source_for(ITEM_FULFILLMENT), Some(SALES_ORDER));
        assert_eq!(transform_source_for(ITEM_RECEIPT), Some(PURCHASE_ORDER));
        assert_eq!(transform_source_for("invoice"), None);
    }
}
