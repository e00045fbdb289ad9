use chrono::NaiveDate;

/// A scheduled payment of an estimation (deposit, intermediate, balance).
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct PaymentLine {
    pub id: i32,
    pub document_id: i32,
    pub row_index: i32,
    pub description: String,
    /// Amount in cents.
    pub amount: i64,
    pub payment_date: Option<NaiveDate>,
}

impl PaymentLine {
    /// Copy of this payment line, rescheduled to `today`.
    pub fn duplicate(&self, today: NaiveDate) -> Self {
        Self {
            id: 0,
            document_id: 0,
            payment_date: Some(today),
            ..self.clone()
        }
    }
}
