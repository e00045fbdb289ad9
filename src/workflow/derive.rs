//! Documents derived from other documents.

use chrono::{Datelike, NaiveDate};

use crate::error::{Error, Result};
use crate::models::{
    CancelInvoiceData, Document, DocumentKind, DocumentType, EstimationData, Status, StatusInfo,
};

fn expect_kind(document: &Document, expected: DocumentType) -> Result<()> {
    let actual = document.doc_type();
    if actual == expected {
        Ok(())
    } else {
        Err(Error::WrongKind {
            id: document.id,
            expected,
            actual,
        })
    }
}

/// New estimation carrying the business content of `estimation`.
///
/// Identity, number, status and date are not copied: the copy is unsaved,
/// has no status yet and is dated `today`.
pub fn duplicate(estimation: &Document, today: NaiveDate) -> Result<Document> {
    expect_kind(estimation, DocumentType::Estimation)?;

    let kind = match &estimation.kind {
        DocumentKind::Estimation(data) => DocumentKind::Estimation(EstimationData {
            payment_lines: data
                .payment_lines
                .iter()
                .map(|line| line.duplicate(today))
                .collect(),
            ..data.clone()
        }),
        other => other.clone(),
    };

    Ok(Document {
        id: 0,
        status: None,
        status_info: StatusInfo::default(),
        task_date: today,
        sequence_number: None,
        number: None,
        lines: estimation.lines.iter().map(|line| line.duplicate()).collect(),
        kind,
        ..estimation.clone()
    })
}

/// Draft credit note reversing `invoice`: every line cost and the expenses are negated.
pub fn generate_cancel_invoice(invoice: &Document, today: NaiveDate) -> Result<Document> {
    expect_kind(invoice, DocumentType::Invoice)?;

    let lines = invoice
        .lines
        .iter()
        .map(|line| line.negated())
        .collect::<Result<Vec<_>>>()?;
    let expenses = invoice
        .expenses
        .checked_neg()
        .ok_or(Error::AmountOverflow(invoice.expenses))?;

    Ok(Document {
        id: 0,
        project_id: invoice.project_id,
        phase_id: invoice.phase_id,
        owner_id: invoice.owner_id,
        name: String::new(),
        description: invoice.description.clone(),
        status: Some(Status::Draft),
        status_info: StatusInfo::default(),
        task_date: today,
        tva: invoice.tva,
        expenses,
        discount_ht: 0,
        displayed_units: invoice.displayed_units,
        sequence_number: None,
        number: None,
        lines,
        kind: DocumentKind::CancelInvoice(CancelInvoiceData {
            invoice_id: Some(invoice.id),
            invoice_date: Some(invoice.task_date),
            invoice_number: invoice.official_number(),
            ..CancelInvoiceData::default()
        }),
    })
}

/// Highest official number used by `kind` documents dated in `year`.
///
/// Callers increment it to number the next document.
pub fn max_official_number<'a>(
    documents: impl IntoIterator<Item = &'a Document>,
    kind: DocumentType,
    year: i32,
) -> Option<i32> {
    documents
        .into_iter()
        .filter(|document| document.doc_type() == kind && document.task_date.year() == year)
        .filter_map(Document::official_number)
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceData, LineItem, ManualInvoiceData, PaymentDisplay, PaymentLine};
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_estimation() -> Document {
        let mut estimation = Document::estimation(3, "Brand book", day(2023, 11, 2));
        estimation.id = 41;
        estimation.phase_id = Some(5);
        estimation.owner_id = Some(8);
        estimation.description = Some("Logo and charter".to_string());
        estimation.status = Some(Status::Sent);
        estimation.tva = 2000;
        estimation.expenses = 3_000;
        estimation.discount_ht = 500;
        estimation.displayed_units = true;
        estimation.number = Some("D-2023-12".to_string());
        estimation.lines = vec![LineItem::new(0, "Logo", 80_000, 1.0, Some("PACK"))];
        estimation.kind = DocumentKind::Estimation(EstimationData {
            deposit: 30,
            payment_conditions: Some("30 days".to_string()),
            exclusions: Some("Printing".to_string()),
            manual_deliverables: true,
            course: false,
            payment_display: PaymentDisplay::All,
            payment_lines: vec![PaymentLine {
                id: 2,
                document_id: 41,
                row_index: 0,
                description: "Deposit".to_string(),
                amount: 24_000,
                payment_date: Some(day(2023, 11, 15)),
            }],
        });
        estimation
    }

    #[test]
    fn duplicate_copies_business_fields_and_resets_the_rest() {
        let source = sample_estimation();
        let today = day(2024, 2, 1);
        let copy = duplicate(&source, today).unwrap();

        assert_eq!(copy.id, 0);
        assert_eq!(copy.status, None);
        assert_eq!(copy.status_info, StatusInfo::default());
        assert_eq!(copy.task_date, today);
        assert_eq!(copy.number, None);

        assert_eq!(copy.project_id, source.project_id);
        assert_eq!(copy.phase_id, source.phase_id);
        assert_eq!(copy.owner_id, source.owner_id);
        assert_eq!(copy.description, source.description);
        assert_eq!(copy.tva, source.tva);
        assert_eq!(copy.expenses, source.expenses);
        assert_eq!(copy.discount_ht, source.discount_ht);
        assert_eq!(copy.displayed_units, source.displayed_units);
        assert_eq!(copy.lines.len(), 1);
        assert_eq!(copy.lines[0].id, 0);
        assert_eq!(copy.lines[0].cost, 80_000);

        let (DocumentKind::Estimation(copied), DocumentKind::Estimation(original)) =
            (&copy.kind, &source.kind)
        else {
            panic!("expected estimations");
        };
        assert_eq!(copied.deposit, original.deposit);
        assert_eq!(copied.payment_conditions, original.payment_conditions);
        assert_eq!(copied.exclusions, original.exclusions);
        assert_eq!(copied.manual_deliverables, original.manual_deliverables);
        assert_eq!(copied.payment_display, original.payment_display);
        assert_eq!(copied.payment_lines[0].payment_date, Some(today));
        assert_eq!(copied.payment_lines[0].amount, 24_000);
    }

    #[test]
    fn only_estimations_can_be_duplicated() {
        let invoice = Document::invoice(1, "x", day(2024, 1, 1));
        assert!(matches!(
            duplicate(&invoice, day(2024, 1, 2)),
            Err(Error::WrongKind {
                expected: DocumentType::Estimation,
                actual: DocumentType::Invoice,
                ..
            })
        ));
    }

    #[test]
    fn cancel_invoice_references_its_invoice() {
        let mut invoice = Document::invoice(3, "Brand book", day(2024, 3, 10));
        invoice.id = 77;
        invoice.expenses = 1_200;
        invoice.tva = 550;
        invoice.lines = vec![
            LineItem::new(0, "Logo", 80_000, 1.0, Some("PACK")),
            LineItem::new(1, "Workshop", 40_000, 0.5, Some("DAY")),
        ];
        invoice.kind = DocumentKind::Invoice(InvoiceData {
            official_number: Some(112),
            ..InvoiceData::default()
        });

        let today = day(2024, 4, 1);
        let cancel = generate_cancel_invoice(&invoice, today).unwrap();

        assert_eq!(cancel.doc_type(), DocumentType::CancelInvoice);
        assert_eq!(cancel.status, Some(Status::Draft));
        assert_eq!(cancel.task_date, today);
        assert_eq!(cancel.project_id, Some(3));
        assert_eq!(cancel.tva, 550);
        assert_eq!(cancel.expenses, -1_200);
        assert_eq!(cancel.lines[1].cost, -40_000);
        assert_eq!(cancel.lines[1].quantity, 0.5);
        assert_eq!(cancel.lines[1].description, "Workshop");
        match cancel.kind {
            DocumentKind::CancelInvoice(data) => {
                assert_eq!(data.invoice_id, Some(77));
                assert_eq!(data.invoice_date, Some(day(2024, 3, 10)));
                assert_eq!(data.invoice_number, Some(112));
                assert_eq!(data.official_number, None);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn official_numbers_are_scoped_to_kind_and_year() {
        let numbered = |kind: DocumentKind, date: NaiveDate| {
            let mut document = Document::invoice(1, "x", date);
            document.kind = kind;
            document
        };
        let invoice = |n| {
            DocumentKind::Invoice(InvoiceData {
                official_number: Some(n),
                ..InvoiceData::default()
            })
        };
        let manual = DocumentKind::ManualInvoice(ManualInvoiceData {
            official_number: Some(99),
            ..ManualInvoiceData::default()
        });
        let documents = vec![
            numbered(invoice(4), day(2024, 1, 1)),
            numbered(invoice(9), day(2024, 12, 31)),
            numbered(invoice(30), day(2023, 12, 31)),
            numbered(invoice(50), day(2025, 1, 1)),
            numbered(manual, day(2024, 6, 1)),
            numbered(DocumentKind::Invoice(InvoiceData::default()), day(2024, 6, 1)),
        ];

        assert_eq!(max_official_number(&documents, DocumentType::Invoice, 2024), Some(9));
        assert_eq!(max_official_number(&documents, DocumentType::ManualInvoice, 2024), Some(99));
        assert_eq!(max_official_number(&documents, DocumentType::Invoice, 2022), None);
        assert_eq!(max_official_number(&documents, DocumentType::CancelInvoice, 2024), None);
    }

    proptest! {
        #[test]
        fn cancel_invoice_flips_every_sign_exactly(
            costs in prop::collection::vec(-1_000_000_000i64..1_000_000_000, 0..8),
            expenses in -1_000_000i64..1_000_000,
        ) {
            let mut invoice = Document::invoice(1, "x", day(2024, 1, 1));
            invoice.expenses = expenses;
            invoice.lines = costs
                .iter()
                .enumerate()
                .map(|(i, cost)| LineItem::new(i as i32, "line", *cost, 1.0, None))
                .collect();

            let cancel = generate_cancel_invoice(&invoice, day(2024, 2, 1)).unwrap();
            prop_assert_eq!(cancel.expenses, -expenses);
            prop_assert_eq!(cancel.lines.len(), costs.len());
            for (line, cost) in cancel.lines.iter().zip(&costs) {
                prop_assert_eq!(line.cost, -cost);
            }
        }
    }
}
