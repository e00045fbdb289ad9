mod amounts;
mod client;
mod company;
mod document;
mod kind;
mod line_item;
mod payment_line;
mod project;
mod status;

pub use amounts::Totals;
pub use client::Client;
pub use company::Company;
pub use document::{DEFAULT_TVA, Document, LATE_AFTER_DAYS};
pub use kind::{
    CancelInvoiceData, DocumentKind, DocumentType, EstimationData, InvoiceData, ManualInvoiceData,
    PaymentDisplay, PaymentMode,
};
pub use line_item::LineItem;
pub use payment_line::PaymentLine;
pub use project::{DEFAULT_PHASE_NAME, Phase, Project};
pub use status::{Status, StatusChange, StatusInfo, StatusRecord};
