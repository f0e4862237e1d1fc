//! Line-oriented command language.
//!
//! One command per line in the form `Name(arg, arg, ...)`. String arguments
//! are double-quoted and may contain commas. Blank lines are skipped.

use libris_error::{LibrisError, Result};
use libris_types::{BookId, PatronId, Priority};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    InsertBook {
        id: BookId,
        title: String,
        author: String,
        available: bool,
    },
    PrintBook {
        id: BookId,
    },
    PrintBooks {
        lo: BookId,
        hi: BookId,
    },
    FindClosestBook {
        target: BookId,
    },
    BorrowBook {
        patron: PatronId,
        book: BookId,
        priority: Priority,
    },
    ReturnBook {
        patron: PatronId,
        book: BookId,
    },
    DeleteBook {
        book: BookId,
    },
    ColorFlipCount,
    Quit,
}

/// Parse one input line. `line_no` is 1-based and only used for errors.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (name, args) = split_call(line_no, line)?;
    let command = match name {
        "InsertBook" => {
            expect_arity(line_no, name, &args, 4)?;
            Command::InsertBook {
                id: BookId::new(parse_int(line_no, "book id", &args[0])?),
                title: unquote(&args[1]).to_owned(),
                author: unquote(&args[2]).to_owned(),
                available: parse_availability(line_no, &args[3])?,
            }
        }
        "PrintBook" => {
            expect_arity(line_no, name, &args, 1)?;
            Command::PrintBook {
                id: BookId::new(parse_int(line_no, "book id", &args[0])?),
            }
        }
        "PrintBooks" => {
            expect_arity(line_no, name, &args, 2)?;
            Command::PrintBooks {
                lo: BookId::new(parse_int(line_no, "lower book id", &args[0])?),
                hi: BookId::new(parse_int(line_no, "upper book id", &args[1])?),
            }
        }
        "FindClosestBook" => {
            expect_arity(line_no, name, &args, 1)?;
            Command::FindClosestBook {
                target: BookId::new(parse_int(line_no, "target book id", &args[0])?),
            }
        }
        "BorrowBook" => {
            expect_arity(line_no, name, &args, 3)?;
            Command::BorrowBook {
                patron: PatronId::new(parse_int(line_no, "patron id", &args[0])?),
                book: BookId::new(parse_int(line_no, "book id", &args[1])?),
                priority: Priority::new(parse_int(line_no, "priority", &args[2])?),
            }
        }
        "ReturnBook" => {
            expect_arity(line_no, name, &args, 2)?;
            Command::ReturnBook {
                patron: PatronId::new(parse_int(line_no, "patron id", &args[0])?),
                book: BookId::new(parse_int(line_no, "book id", &args[1])?),
            }
        }
        "DeleteBook" => {
            expect_arity(line_no, name, &args, 1)?;
            Command::DeleteBook {
                book: BookId::new(parse_int(line_no, "book id", &args[0])?),
            }
        }
        "ColorFlipCount" => {
            expect_arity(line_no, name, &args, 0)?;
            Command::ColorFlipCount
        }
        "Quit" => {
            expect_arity(line_no, name, &args, 0)?;
            Command::Quit
        }
        other => {
            return Err(LibrisError::UnknownCommand {
                line: line_no,
                name: other.to_owned(),
            });
        }
    };
    Ok(Some(command))
}

/// Split `Name(a, b, ...)` into the name and its trimmed arguments.
fn split_call(line_no: usize, line: &str) -> Result<(&str, Vec<String>)> {
    let Some(open) = line.find('(') else {
        return Err(LibrisError::parse(line_no, "expected `(` after command name"));
    };
    let Some(body) = line[open + 1..].strip_suffix(')') else {
        return Err(LibrisError::parse(line_no, "expected `)` at end of line"));
    };
    let name = line[..open].trim();
    if name.is_empty() {
        return Err(LibrisError::parse(line_no, "missing command name"));
    }

    let mut args = Vec::new();
    if body.trim().is_empty() {
        return Ok((name, args));
    }
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in body.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ',' if !in_quotes => {
                args.push(current.trim().to_owned());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if in_quotes {
        return Err(LibrisError::parse(line_no, "unterminated string argument"));
    }
    args.push(current.trim().to_owned());
    Ok((name, args))
}

fn expect_arity(line_no: usize, name: &str, args: &[String], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(LibrisError::parse(
            line_no,
            format!("{name} expects {expected} argument(s), got {}", args.len()),
        ))
    }
}

fn parse_int(line_no: usize, what: &str, arg: &str) -> Result<i64> {
    arg.parse::<i64>()
        .map_err(|_| LibrisError::parse(line_no, format!("invalid {what}: `{arg}`")))
}

fn parse_availability(line_no: usize, arg: &str) -> Result<bool> {
    match unquote(arg) {
        "Yes" | "yes" => Ok(true),
        "No" | "no" => Ok(false),
        other => Err(LibrisError::parse(
            line_no,
            format!("availability must be \"Yes\" or \"No\", got `{other}`"),
        )),
    }
}

fn unquote(arg: &str) -> &str {
    arg.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(arg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        parse_line(1, line).unwrap().unwrap()
    }

    #[test]
    fn insert_book_with_quoted_strings() {
        assert_eq!(
            parse(r#"InsertBook(4, "The Hobbit, Revised", "J. R. R. Tolkien", "Yes")"#),
            Command::InsertBook {
                id: BookId::new(4),
                title: "The Hobbit, Revised".to_owned(),
                author: "J. R. R. Tolkien".to_owned(),
                available: true,
            }
        );
    }

    #[test]
    fn numeric_commands() {
        assert_eq!(
            parse("BorrowBook(11, 4, 2)"),
            Command::BorrowBook {
                patron: PatronId::new(11),
                book: BookId::new(4),
                priority: Priority::new(2),
            }
        );
        assert_eq!(
            parse("  PrintBooks( 1 ,  9 )  "),
            Command::PrintBooks {
                lo: BookId::new(1),
                hi: BookId::new(9),
            }
        );
        assert_eq!(parse("ColorFlipCount()"), Command::ColorFlipCount);
        assert_eq!(parse("Quit()"), Command::Quit);
    }

    #[test]
    fn blank_line_is_skipped() {
        assert_eq!(parse_line(3, "   ").unwrap(), None);
    }

    #[test]
    fn unknown_command_reports_line() {
        let err = parse_line(12, "LendBook(1)").unwrap_err();
        assert!(matches!(err, LibrisError::UnknownCommand { line: 12, .. }));
    }

    #[test]
    fn wrong_arity_is_parse_error() {
        let err = parse_line(2, "ReturnBook(1)").unwrap_err();
        assert_eq!(err.to_string(), "line 2: ReturnBook expects 2 argument(s), got 1");
    }

    #[test]
    fn malformed_lines() {
        assert!(parse_line(1, "PrintBook 5").is_err());
        assert!(parse_line(1, "PrintBook(5").is_err());
        assert!(parse_line(1, "PrintBook(five)").is_err());
        assert!(parse_line(1, r#"InsertBook(1, "open, "A", "Yes")"#).is_err());
        assert!(parse_line(1, r#"InsertBook(1, "T", "A", "Maybe")"#).is_err());
    }
}
