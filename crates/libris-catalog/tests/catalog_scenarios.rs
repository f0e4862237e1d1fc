//! End-to-end circulation scenarios against the public catalog API.

use libris_catalog::{BorrowOutcome, Catalog, CatalogConfig, RemoveOutcome, ReturnOutcome};
use libris_types::{BookId, PatronId, Priority};
use proptest::prelude::*;

fn book(raw: i64) -> BookId {
    BookId::new(raw)
}

fn patron(raw: i64) -> PatronId {
    PatronId::new(raw)
}

fn prio(raw: i64) -> Priority {
    Priority::new(raw)
}

// ===========================================================================
// 1. BORROW / RETURN
// ===========================================================================

#[test]
fn return_reallocates_to_waiting_patron() {
    let mut catalog = Catalog::new();
    assert!(catalog.insert_book(book(100), "Book100", "Author100", true));

    assert_eq!(
        catalog.borrow(patron(1), book(100), prio(5)),
        BorrowOutcome::Granted {
            book: book(100),
            patron: patron(1)
        }
    );
    assert_eq!(
        catalog.borrow(patron(2), book(100), prio(1)),
        BorrowOutcome::Waitlisted {
            book: book(100),
            patron: patron(2)
        }
    );
    assert_eq!(
        catalog.return_book(patron(1), book(100)),
        ReturnOutcome::ReturnedAndReallocated {
            book: book(100),
            patron: patron(1),
            new_holder: patron(2)
        }
    );

    let report = catalog.book(book(100)).expect("book 100 present");
    assert_eq!(report.borrowed_by, Some(patron(2)));
    assert!(!report.available);
    assert!(report.reservations.is_empty());
}

#[test]
fn waiting_patrons_served_by_priority_then_arrival() {
    let mut catalog = Catalog::new();
    catalog.insert_book(book(1), "T", "A", true);
    catalog.borrow(patron(10), book(1), prio(1));
    for (p, pr) in [(20, 3), (21, 1), (22, 1), (23, 2)] {
        catalog.borrow(patron(p), book(1), prio(pr));
    }
    let waiting = catalog.book(book(1)).unwrap().reservations;
    assert_eq!(waiting, vec![patron(21), patron(22), patron(23), patron(20)]);

    let mut holders = Vec::new();
    let mut holder = patron(10);
    while let ReturnOutcome::ReturnedAndReallocated { new_holder, .. } =
        catalog.return_book(holder, book(1))
    {
        holders.push(new_holder);
        holder = new_holder;
    }
    assert_eq!(holders, vec![patron(21), patron(22), patron(23), patron(20)]);
    assert!(catalog.book(book(1)).unwrap().available);
}

// ===========================================================================
// 2. WAITLIST CAPACITY
// ===========================================================================

#[test]
fn twenty_first_reservation_is_rejected() {
    let mut catalog = Catalog::new();
    catalog.insert_book(book(100), "Book100", "Author100", true);
    catalog.borrow(patron(999), book(100), prio(1));

    for p in 0..20 {
        assert!(matches!(
            catalog.borrow(patron(p), book(100), prio((p * 7) % 5)),
            BorrowOutcome::Waitlisted { .. }
        ));
    }
    let before = catalog.book(book(100)).unwrap().reservations;
    assert_eq!(before.len(), 20);

    assert_eq!(
        catalog.borrow(patron(500), book(100), prio(0)),
        BorrowOutcome::WaitlistFull {
            book: book(100),
            patron: patron(500)
        }
    );
    let after = catalog.book(book(100)).unwrap().reservations;
    assert_eq!(after, before);
    assert!(!after.contains(&patron(500)));
}

#[test]
fn custom_capacity_is_honored() {
    let mut catalog = Catalog::with_config(CatalogConfig::new(2).unwrap());
    catalog.insert_book(book(1), "T", "A", false);
    assert!(matches!(
        catalog.borrow(patron(1), book(1), prio(1)),
        BorrowOutcome::Waitlisted { .. }
    ));
    assert!(matches!(
        catalog.borrow(patron(2), book(1), prio(1)),
        BorrowOutcome::Waitlisted { .. }
    ));
    assert!(matches!(
        catalog.borrow(patron(3), book(1), prio(1)),
        BorrowOutcome::WaitlistFull { .. }
    ));
}

// ===========================================================================
// 3. REMOVAL
// ===========================================================================

#[test]
fn remove_cancels_reservations_in_service_order() {
    let mut catalog = Catalog::new();
    catalog.insert_book(book(7), "T", "A", true);
    catalog.borrow(patron(1), book(7), prio(1));
    catalog.borrow(patron(30), book(7), prio(4));
    catalog.borrow(patron(10), book(7), prio(2));
    catalog.borrow(patron(20), book(7), prio(2));

    assert_eq!(
        catalog.remove(book(7)),
        RemoveOutcome::Removed {
            book: book(7),
            cancelled: vec![patron(10), patron(20), patron(30)]
        }
    );
    assert!(catalog.book(book(7)).is_none());
    assert_eq!(
        catalog.borrow(patron(1), book(7), prio(1)),
        BorrowOutcome::NotFound {
            book: book(7),
            patron: patron(1)
        }
    );
}

// ===========================================================================
// 4. QUERIES
// ===========================================================================

#[test]
fn range_on_empty_catalog() {
    let catalog = Catalog::new();
    assert!(catalog.books_in_range(book(0), book(1000)).is_empty());
    assert!(catalog.closest_books(book(5)).is_empty());
}

#[test]
fn closest_books_exact_and_equidistant() {
    let mut catalog = Catalog::new();
    for id in [10, 20, 40] {
        catalog.insert_book(book(id), format!("T{id}"), "A", true);
    }
    let exact: Vec<BookId> = catalog.closest_books(book(20)).iter().map(|r| r.id).collect();
    assert_eq!(exact, vec![book(20)]);
    let both: Vec<BookId> = catalog.closest_books(book(30)).iter().map(|r| r.id).collect();
    assert_eq!(both, vec![book(20), book(40)]);
    let one: Vec<BookId> = catalog.closest_books(book(12)).iter().map(|r| r.id).collect();
    assert_eq!(one, vec![book(10)]);
}

#[test]
fn color_flips_accumulate_across_catalog_operations() {
    let mut catalog = Catalog::new();
    let mut last = 0;
    for id in [5, 10, 15, 20, 25, 30, 1, 2, 3] {
        catalog.insert_book(book(id), "T", "A", true);
        assert!(catalog.color_flip_count() >= last);
        last = catalog.color_flip_count();
    }
    for id in [10, 25, 1] {
        catalog.remove(book(id));
        assert!(catalog.color_flip_count() >= last);
        last = catalog.color_flip_count();
    }
    assert!(last > 0);
    catalog.index().validate().unwrap();
}

proptest! {
    #[test]
    fn prop_holder_and_availability_stay_consistent(
        ops in prop::collection::vec((0_u8..3, 0_i64..6, 0_i64..8, 0_i64..4), 1..150)
    ) {
        let mut catalog = Catalog::with_config(CatalogConfig::new(3).unwrap());
        for id in 0..6 {
            catalog.insert_book(book(id), "T", "A", id % 2 == 0);
        }
        for (kind, b, p, pr) in ops {
            match kind {
                0 => {
                    catalog.borrow(patron(p), book(b), prio(pr));
                }
                1 => {
                    catalog.return_book(patron(p), book(b));
                }
                _ => {
                    catalog.remove(book(b));
                }
            }
            for report in catalog.books_in_range(book(0), book(5)) {
                if report.borrowed_by.is_some() {
                    prop_assert!(!report.available);
                }
                prop_assert!(report.reservations.len() <= 3);
            }
            prop_assert!(catalog.index().validate().is_ok());
        }
    }
}
