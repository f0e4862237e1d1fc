//! Text and JSON renderers for [`CommandResult`]s.

use std::fmt::Write as _;

use libris_catalog::{BookReport, BorrowOutcome, RemoveOutcome, ReturnOutcome};
use libris_error::{LibrisError, Result};

use crate::driver::CommandResult;

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Append the rendering of `result` to `out`. Results with nothing to say
/// append nothing.
pub fn render(format: OutputFormat, result: &CommandResult, out: &mut String) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if let Some(text) = render_text(result) {
                out.push_str(&text);
                out.push_str("\n\n");
            }
        }
        OutputFormat::Json => {
            let line = serde_json::to_string(result)
                .map_err(|e| LibrisError::Internal(format!("json encoding failed: {e}")))?;
            out.push_str(&line);
            out.push('\n');
        }
    }
    Ok(())
}

/// Text form of one result, without the trailing blank line.
pub fn render_text(result: &CommandResult) -> Option<String> {
    match result {
        CommandResult::InsertBook { .. } => None,
        CommandResult::PrintBook { id, book } => Some(match book {
            Some(report) => book_details(report),
            None => format!("Book {id} not found in the library."),
        }),
        CommandResult::PrintBooks { books } | CommandResult::FindClosestBook { books } => {
            if books.is_empty() {
                None
            } else {
                let blocks: Vec<String> = books.iter().map(book_details).collect();
                Some(blocks.join("\n\n"))
            }
        }
        CommandResult::BorrowBook(outcome) => Some(borrow_text(outcome)),
        CommandResult::ReturnBook(outcome) => Some(return_text(outcome)),
        CommandResult::DeleteBook(outcome) => Some(remove_text(outcome)),
        CommandResult::ColorFlipCount { count } => Some(format!("Colour Flip Count: {count}")),
        CommandResult::Quit => Some("Program Terminated!!".to_owned()),
    }
}

fn book_details(report: &BookReport) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "BookID = {}", report.id);
    let _ = writeln!(text, "Title = \"{}\"", report.title);
    let _ = writeln!(text, "Author = \"{}\"", report.author);
    let availability = if report.available { "Yes" } else { "No" };
    let _ = writeln!(text, "Availability = \"{availability}\"");
    match report.borrowed_by {
        Some(patron) => {
            let _ = writeln!(text, "BorrowedBy = {patron}");
        }
        None => text.push_str("BorrowedBy = None\n"),
    }
    let _ = write!(text, "Reservations = [{}]", join_ids(&report.reservations));
    text
}

fn borrow_text(outcome: &BorrowOutcome) -> String {
    match outcome {
        BorrowOutcome::Granted { book, patron } => {
            format!("Book {book} Borrowed by Patron {patron}")
        }
        BorrowOutcome::Waitlisted { book, patron } => {
            format!("Book {book} Reserved by Patron {patron}")
        }
        BorrowOutcome::WaitlistFull { book, patron } => {
            format!("Waitlist for Book {book} is full. Cannot add reservation for Patron {patron}")
        }
        BorrowOutcome::NotFound { book, .. } => {
            format!("Book {book} is not available for borrowing.")
        }
    }
}

fn return_text(outcome: &ReturnOutcome) -> String {
    match outcome {
        ReturnOutcome::Returned { book, patron } => {
            format!("Book {book} Returned by Patron {patron}")
        }
        ReturnOutcome::ReturnedAndReallocated {
            book,
            patron,
            new_holder,
        } => format!(
            "Book {book} Returned by Patron {patron}\n\nBook {book} Allotted to Patron {new_holder}"
        ),
        ReturnOutcome::Rejected { book, patron } => {
            format!("Book {book} cannot be returned by Patron {patron}.")
        }
    }
}

fn remove_text(outcome: &RemoveOutcome) -> String {
    match outcome {
        RemoveOutcome::Removed { book, cancelled } if cancelled.is_empty() => {
            format!("Book {book} is no longer available.")
        }
        RemoveOutcome::Removed { book, cancelled } => format!(
            "Book {book} is no longer available. Reservations made by Patrons {} have been cancelled!",
            join_ids(cancelled)
        ),
        RemoveOutcome::NotFound { book } => format!("Book {book} not found."),
    }
}

fn join_ids<T: std::fmt::Display>(ids: &[T]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
