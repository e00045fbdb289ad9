use crate::models::{Document, DocumentKind};

/// Computed totals of a document, all in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub total_ht: i64,
    pub tva_amount: i64,
    pub expenses: i64,
    pub total_ttc: i64,
}

impl Document {
    pub fn lines_total(&self) -> i64 {
        self.lines.iter().map(|line| line.total()).sum()
    }

    pub fn total_ht(&self) -> i64 {
        match &self.kind {
            DocumentKind::ManualInvoice(data) => data.amount_ht,
            _ => self.lines_total() - self.discount_ht,
        }
    }

    pub fn totals(&self) -> Totals {
        let total_ht = self.total_ht();
        let tva_amount = (total_ht as f64 * self.tva as f64 / 10_000.0).round() as i64;
        Totals {
            total_ht,
            tva_amount,
            expenses: self.expenses,
            total_ttc: total_ht + tva_amount + self.expenses,
        }
    }
}
