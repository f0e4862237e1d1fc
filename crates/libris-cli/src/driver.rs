//! Executes parsed commands against a [`Catalog`].

use libris_catalog::{BookReport, BorrowOutcome, Catalog, RemoveOutcome, ReturnOutcome};
use libris_types::BookId;
use serde::Serialize;

use crate::command::Command;

/// Result of one command, handed to a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", content = "result", rename_all = "snake_case")]
pub enum CommandResult {
    InsertBook { id: BookId, inserted: bool },
    PrintBook { id: BookId, book: Option<BookReport> },
    PrintBooks { books: Vec<BookReport> },
    FindClosestBook { books: Vec<BookReport> },
    BorrowBook(BorrowOutcome),
    ReturnBook(ReturnOutcome),
    DeleteBook(RemoveOutcome),
    ColorFlipCount { count: u64 },
    Quit,
}

impl CommandResult {
    pub const fn is_quit(&self) -> bool {
        matches!(self, Self::Quit)
    }
}

pub fn execute(catalog: &mut Catalog, command: Command) -> CommandResult {
    match command {
        Command::InsertBook {
            id,
            title,
            author,
            available,
        } => CommandResult::InsertBook {
            id,
            inserted: catalog.insert_book(id, title, author, available),
        },
        Command::PrintBook { id } => CommandResult::PrintBook {
            id,
            book: catalog.book(id),
        },
        Command::PrintBooks { lo, hi } => CommandResult::PrintBooks {
            books: catalog.books_in_range(lo, hi),
        },
        Command::FindClosestBook { target } => CommandResult::FindClosestBook {
            books: catalog.closest_books(target),
        },
        Command::BorrowBook {
            patron,
            book,
            priority,
        } => CommandResult::BorrowBook(catalog.borrow(patron, book, priority)),
        Command::ReturnBook { patron, book } => {
            CommandResult::ReturnBook(catalog.return_book(patron, book))
        }
        Command::DeleteBook { book } => CommandResult::DeleteBook(catalog.remove(book)),
        Command::ColorFlipCount => CommandResult::ColorFlipCount {
            count: catalog.color_flip_count(),
        },
        Command::Quit => CommandResult::Quit,
    }
}
