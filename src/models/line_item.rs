use crate::error::{Error, Result};

/// A priced row of a document.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct LineItem {
    pub id: i32,
    pub document_id: i32,
    pub row_index: i32,
    pub description: String,
    /// Unit cost in cents.
    pub cost: i64,
    pub quantity: f64,
    pub unity: Option<String>,
}

impl LineItem {
    pub fn new(
        row_index: i32,
        description: &str,
        cost: i64,
        quantity: f64,
        unity: Option<&str>,
    ) -> Self {
        Self {
            id: 0,
            document_id: 0,
            row_index,
            description: description.to_string(),
            cost,
            quantity,
            unity: unity.map(str::to_string),
        }
    }

    /// Copy of this line, detached from any document.
    pub fn duplicate(&self) -> Self {
        Self {
            id: 0,
            document_id: 0,
            ..self.clone()
        }
    }

    /// Copy of this line with its cost sign flipped, for credit notes.
    pub fn negated(&self) -> Result<Self> {
        let cost = self.cost.checked_neg().ok_or(Error::AmountOverflow(self.cost))?;
        Ok(Self {
            cost,
            ..self.duplicate()
        })
    }

    /// cost × quantity, rounded to the cent.
    pub fn total(&self) -> i64 {
        (self.cost as f64 * self.quantity).round() as i64
    }

    pub fn unit_label(&self, pretty: bool) -> &'static str {
        let default = if pretty { "" } else { "-" };
        match self.unity.as_deref() {
            Some("HOUR") => "hour(s)",
            Some("DAY") => "day(s)",
            Some("WEEK") => "week(s)",
            Some("MONTH") => "month(s)",
            Some("FEUIL") => "sheet(s)",
            Some("PACK") => "flat rate",
            _ => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negated_line_keeps_everything_but_the_cost_sign() {
        let mut line = LineItem::new(2, "Training day", 45_000, 1.5, Some("DAY"));
        line.id = 12;
        line.document_id = 4;

        let negated = line.negated().unwrap();
        assert_eq!(negated.cost, -45_000);
        assert_eq!(negated.id, 0);
        assert_eq!(negated.document_id, 0);
        assert_eq!(negated.row_index, 2);
        assert_eq!(negated.description, "Training day");
        assert_eq!(negated.quantity, 1.5);
        assert_eq!(negated.unity.as_deref(), Some("DAY"));
    }

    #[test]
    fn most_negative_cost_overflows() {
        let line = LineItem::new(0, "broken", i64::MIN, 1.0, None);
        assert!(matches!(line.negated(), Err(Error::AmountOverflow(i64::MIN))));
    }

    #[test]
    fn unknown_unity_falls_back_to_default_label() {
        let line = LineItem::new(0, "x", 100, 1.0, Some("YEAR"));
        assert_eq!(line.unit_label(false), "-");
        assert_eq!(line.unit_label(true), "");
        let line = LineItem::new(0, "x", 100, 3.0, Some("HOUR"));
        assert_eq!(line.unit_label(true), "hour(s)");
        assert_eq!(line.total(), 300);
    }
}
