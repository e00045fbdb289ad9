//! Status transition guard.
//!
//! Every status write goes through [`check_transition`], and a document saved
//! for the first time with a status goes through [`check_initial_status`].
//! The allowed origins only depend on the requested status, except for
//! `valid` which a cancel invoice reaches straight from `draft` while other
//! documents must be submitted (`wait`) first. Manual invoices only record
//! their payment.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{DocumentType, Status};

/// Statuses from which `requested` may be assigned. `None` stands for a
/// document that never had a status.
fn allowed_origins(kind: DocumentType, requested: Status) -> &'static [Option<Status>] {
    use Status::*;

    if kind == DocumentType::ManualInvoice {
        return match requested {
            Paid => &[Some(Valid)],
            _ => &[],
        };
    }

    match requested {
        Draft | Wait => &[None, Some(Draft), Some(Invalid)],
        Valid if kind == DocumentType::CancelInvoice => &[Some(Draft)],
        Valid => &[Some(Wait)],
        Invalid => &[Some(Wait)],
        Aboest => &[Some(Valid), Some(Sent), Some(Invalid), Some(Wait)],
        Geninv => &[Some(Valid), Some(Sent)],
        Sent => &[Some(Valid), Some(Recinv)],
        Paid => &[Some(Valid), Some(Sent), Some(Recinv)],
        Aboinv | Abort => &[Some(Valid), Some(Sent), Some(Recinv), Some(Invalid), Some(Wait)],
        Recinv => &[Some(Valid), Some(Sent), Some(Recinv)],
    }
}

pub fn is_allowed(kind: DocumentType, current: Option<Status>, requested: Status) -> bool {
    allowed_origins(kind, requested).contains(&current)
}

/// Fails with [`Error::InvalidTransition`] unless `current -> requested` is legal for `kind`.
pub fn check_transition(
    kind: DocumentType,
    current: Option<Status>,
    requested: Status,
) -> Result<()> {
    debug!(%kind, from = ?current, to = %requested, "checking status change");

    if is_allowed(kind, current, requested) {
        Ok(())
    } else {
        warn!(%kind, from = ?current, to = %requested, "status change refused");
        Err(Error::InvalidTransition {
            kind,
            from: current,
            to: requested,
        })
    }
}

/// Status a manual invoice is recorded with: it is entered already issued.
pub const MANUAL_INVOICE_INITIAL_STATUS: Status = Status::Valid;

/// Guard for a document inserted with a status already set.
///
/// Behaves as a transition from "no status", except that manual invoices are
/// only ever created in [`MANUAL_INVOICE_INITIAL_STATUS`].
pub fn check_initial_status(kind: DocumentType, status: Status) -> Result<()> {
    match kind {
        DocumentType::ManualInvoice if status == MANUAL_INVOICE_INITIAL_STATUS => Ok(()),
        DocumentType::ManualInvoice => {
            warn!(%kind, to = %status, "initial status refused");
            Err(Error::InvalidTransition {
                kind,
                from: None,
                to: status,
            })
        }
        _ => check_transition(kind, None, status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use proptest::sample::select;
    use Status::*;

    /// Legal (from, to) pairs for every kind but cancel invoices' `valid`.
    const LEGAL: &[(Option<Status>, Status)] = &[
        (None, Draft),
        (Some(Draft), Draft),
        (Some(Invalid), Draft),
        (None, Wait),
        (Some(Draft), Wait),
        (Some(Invalid), Wait),
        (Some(Wait), Invalid),
        (Some(Valid), Aboest),
        (Some(Sent), Aboest),
        (Some(Invalid), Aboest),
        (Some(Wait), Aboest),
        (Some(Valid), Geninv),
        (Some(Sent), Geninv),
        (Some(Valid), Sent),
        (Some(Recinv), Sent),
        (Some(Valid), Paid),
        (Some(Sent), Paid),
        (Some(Recinv), Paid),
        (Some(Valid), Aboinv),
        (Some(Sent), Aboinv),
        (Some(Recinv), Aboinv),
        (Some(Invalid), Aboinv),
        (Some(Wait), Aboinv),
        (Some(Valid), Abort),
        (Some(Sent), Abort),
        (Some(Recinv), Abort),
        (Some(Invalid), Abort),
        (Some(Wait), Abort),
        (Some(Valid), Recinv),
        (Some(Sent), Recinv),
        (Some(Recinv), Recinv),
    ];

    fn listed(kind: DocumentType, from: Option<Status>, to: Status) -> bool {
        if kind == DocumentType::ManualInvoice {
            return (from, to) == (Some(Valid), Paid);
        }
        if to == Valid {
            let origin = if kind == DocumentType::CancelInvoice { Draft } else { Wait };
            return from == Some(origin);
        }
        LEGAL.contains(&(from, to))
    }

    fn any_origin() -> impl Strategy<Value = Option<Status>> {
        prop_oneof![Just(None), select(Status::ALL.to_vec()).prop_map(Some)]
    }

    #[test]
    fn every_pair_matches_the_table() {
        let origins = std::iter::once(None).chain(Status::ALL.into_iter().map(Some));
        for kind in DocumentType::ALL {
            for from in origins.clone() {
                for to in Status::ALL {
                    assert_eq!(
                        check_transition(kind, from, to).is_ok(),
                        listed(kind, from, to),
                        "{kind}: {from:?} -> {to}"
                    );
                }
            }
        }
    }

    proptest! {
        #[test]
        fn refusals_are_invalid_transitions(
            kind in select(DocumentType::ALL.to_vec()),
            from in any_origin(),
            to in select(Status::ALL.to_vec()),
        ) {
            match check_transition(kind, from, to) {
                Ok(()) => prop_assert!(listed(kind, from, to)),
                Err(Error::InvalidTransition { kind: k, from: f, to: t }) => {
                    prop_assert!(!listed(kind, from, to));
                    prop_assert_eq!((k, f, t), (kind, from, to));
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
        }
    }

    #[test]
    fn cancel_invoice_is_validated_straight_from_draft() {
        assert!(check_transition(DocumentType::CancelInvoice, Some(Draft), Valid).is_ok());
        assert!(check_transition(DocumentType::CancelInvoice, Some(Wait), Valid).is_err());
    }

    #[test]
    fn estimation_must_be_submitted_before_validation() {
        let err = check_transition(DocumentType::Estimation, Some(Draft), Valid).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                kind: DocumentType::Estimation,
                from: Some(Draft),
                to: Valid,
            }
        ));
        assert!(check_transition(DocumentType::Estimation, Some(Wait), Valid).is_ok());
    }

    #[test]
    fn paid_is_terminal() {
        for to in Status::ALL {
            assert!(!is_allowed(DocumentType::Invoice, Some(Paid), to), "paid -> {to}");
        }
    }

    #[test]
    fn manual_invoice_only_records_payment() {
        let kind = DocumentType::ManualInvoice;
        assert!(check_transition(kind, Some(Valid), Paid).is_ok());
        for to in [Geninv, Sent, Aboest, Aboinv, Recinv, Draft] {
            assert!(check_transition(kind, Some(Valid), to).is_err(), "valid -> {to}");
        }
    }

    #[test]
    fn initial_status_follows_the_table_from_no_status() {
        assert!(check_initial_status(DocumentType::Invoice, Draft).is_ok());
        assert!(check_initial_status(DocumentType::CancelInvoice, Draft).is_ok());
        assert!(check_initial_status(DocumentType::Estimation, Wait).is_ok());
        assert!(matches!(
            check_initial_status(DocumentType::Invoice, Paid),
            Err(Error::InvalidTransition { from: None, to: Paid, .. })
        ));
        assert!(check_initial_status(DocumentType::CancelInvoice, Valid).is_err());
    }

    #[test]
    fn manual_invoice_is_created_valid_only() {
        assert!(check_initial_status(DocumentType::ManualInvoice, Valid).is_ok());
        assert!(check_initial_status(DocumentType::ManualInvoice, Draft).is_err());
        assert!(check_initial_status(DocumentType::ManualInvoice, Paid).is_err());
    }
}
