mod command;
mod driver;
mod render;

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use libris_catalog::{Catalog, CatalogConfig, DEFAULT_WAITLIST_CAPACITY};
use libris_error::Result;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::command::parse_line;
use crate::driver::execute;
use crate::render::{OutputFormat, render};

const OUTPUT_SUFFIX: &str = "_output_file.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    format: OutputFormat,
    waitlist_capacity: usize,
    show_help: bool,
}

fn main() {
    init_tracing();

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let exit_code = run(std::env::args_os(), &mut stdout, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run<I, W, E>(args: I, out: &mut W, err: &mut E) -> i32
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let options = match parse_args(args) {
        Ok(options) => options,
        Err(message) => {
            let _ = writeln!(err, "error: {message}");
            let _ = write_usage(err);
            return 2;
        }
    };

    if options.show_help {
        if write_usage(out).is_err() {
            return 1;
        }
        return 0;
    }

    let Some(input) = options.input.as_deref() else {
        let _ = writeln!(err, "error: missing input file");
        let _ = write_usage(err);
        return 2;
    };
    let config = match CatalogConfig::new(options.waitlist_capacity) {
        Ok(config) => config,
        Err(error) => {
            let _ = writeln!(err, "error: {error}");
            return error.exit_code();
        }
    };
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input));

    match run_file(input, &output, config, options.format) {
        Ok(()) => {
            let _ = writeln!(out, "Output written to {}", output.display());
            0
        }
        Err(error) => {
            let _ = writeln!(err, "error: {error}");
            if let Some(hint) = error.suggestion() {
                let _ = writeln!(err, "hint: {hint}");
            }
            error.exit_code()
        }
    }
}

/// Process `input` and write the rendered results to `output`. Nothing is
/// written if any line fails to parse.
fn run_file(input: &Path, output: &Path, config: CatalogConfig, format: OutputFormat) -> Result<()> {
    let source = std::fs::read_to_string(input)?;
    let rendered = process(&source, config, format)?;
    std::fs::write(output, rendered)?;
    Ok(())
}

fn process(source: &str, config: CatalogConfig, format: OutputFormat) -> Result<String> {
    let mut catalog = Catalog::with_config(config);
    let mut rendered = String::new();
    let mut executed = 0_usize;

    for (index, line) in source.lines().enumerate() {
        let Some(command) = parse_line(index + 1, line)? else {
            continue;
        };
        debug!(line = index + 1, ?command, "executing");
        let result = execute(&mut catalog, command);
        render(format, &result, &mut rendered)?;
        executed += 1;
        if result.is_quit() {
            break;
        }
    }

    info!(
        commands = executed,
        books = catalog.len(),
        color_flips = catalog.color_flip_count(),
        "command file processed"
    );
    Ok(rendered)
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "libris".into(), |stem| stem.to_string_lossy());
    input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}"))
}

fn parse_args<I>(args: I) -> std::result::Result<CliOptions, String>
where
    I: IntoIterator<Item = OsString>,
{
    let mut iter = args.into_iter();
    let _argv0 = iter.next();

    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut format = OutputFormat::Text;
    let mut waitlist_capacity = DEFAULT_WAITLIST_CAPACITY;
    let mut show_help = false;

    while let Some(argument) = iter.next() {
        let arg = argument.to_string_lossy();
        let arg_str = arg.as_ref();

        match arg_str {
            "-h" | "--help" => {
                show_help = true;
            }
            "--json" => {
                format = OutputFormat::Json;
            }
            "-o" | "--output" => {
                if output.is_some() {
                    return Err(String::from("`-o/--output` may only be provided once"));
                }
                let next = iter
                    .next()
                    .ok_or_else(|| String::from("missing path argument for `-o/--output`"))?;
                output = Some(PathBuf::from(next));
            }
            "--waitlist-capacity" => {
                let next = iter.next().ok_or_else(|| {
                    String::from("missing integer argument for `--waitlist-capacity`")
                })?;
                waitlist_capacity =
                    parse_usize_option(next.to_string_lossy().as_ref(), "--waitlist-capacity")?;
            }
            _ => {
                if let Some(value) = arg_str.strip_prefix("--output=") {
                    if output.is_some() {
                        return Err(String::from("`-o/--output` may only be provided once"));
                    }
                    output = Some(PathBuf::from(value));
                    continue;
                }

                if let Some(value) = arg_str.strip_prefix("--waitlist-capacity=") {
                    waitlist_capacity = parse_usize_option(value, "--waitlist-capacity")?;
                    continue;
                }

                if arg_str.starts_with('-') {
                    return Err(format!("unknown option `{arg_str}`"));
                }

                if input.is_some() {
                    return Err(String::from(
                        "too many positional arguments; expected one input file",
                    ));
                }
                input = Some(PathBuf::from(argument));
            }
        }
    }

    Ok(CliOptions {
        input,
        output,
        format,
        waitlist_capacity,
        show_help,
    })
}

fn parse_usize_option(value: &str, flag: &str) -> std::result::Result<usize, String> {
    value
        .parse::<usize>()
        .map_err(|_| format!("invalid integer for `{flag}`: `{value}`"))
}

fn write_usage<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Usage: libris <INPUT> [OPTIONS]")?;
    writeln!(out)?;
    writeln!(out, "Runs a library command file and writes the results.")?;
    writeln!(out)?;
    writeln!(out, "Options:")?;
    writeln!(
        out,
        "  -o, --output <PATH>          Output file (default: <input stem>{OUTPUT_SUFFIX})"
    )?;
    writeln!(out, "      --json                   One JSON object per result")?;
    writeln!(
        out,
        "      --waitlist-capacity <N>  Reservations allowed per book (default: {DEFAULT_WAITLIST_CAPACITY})"
    )?;
    writeln!(out, "  -h, --help                   Show this help")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::path::Path;

    use super::{CliOptions, OutputFormat, default_output_path, parse_args, run};

    const SESSION: &str = r#"InsertBook(1, "Book1", "Author1", "Yes")
InsertBook(2, "Book2", "Author2", "Yes")
BorrowBook(101, 1, 1)
BorrowBook(102, 1, 2)
BorrowBook(103, 1, 1)

PrintBook(1)
ReturnBook(101, 1)
DeleteBook(1)
PrintBook(1)
ColorFlipCount()
Quit()
PrintBook(2)
"#;

    const EXPECTED: &str = r#"Book 1 Borrowed by Patron 101

Book 1 Reserved by Patron 102

Book 1 Reserved by Patron 103

BookID = 1
Title = "Book1"
Author = "Author1"
Availability = "No"
BorrowedBy = 101
Reservations = [103, 102]

Book 1 Returned by Patron 101

Book 1 Allotted to Patron 103

Book 1 is no longer available. Reservations made by Patrons 102 have been cancelled!

Book 1 not found in the library.

Colour Flip Count: 1

Program Terminated!!

"#;

    fn parse_from(args: &[&str]) -> Result<CliOptions, String> {
        let os_args: Vec<OsString> = args.iter().map(OsString::from).collect();
        parse_args(os_args)
    }

    fn run_with(args: &[&str]) -> (i32, String, String) {
        let os_args: Vec<OsString> = args.iter().map(OsString::from).collect();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = run(os_args, &mut out, &mut err);
        (
            code,
            String::from_utf8(out).expect("stdout should be utf-8"),
            String::from_utf8(err).expect("stderr should be utf-8"),
        )
    }

    #[test]
    fn test_parse_defaults() {
        let options = parse_from(&["libris", "input.txt"]).expect("args should parse");
        assert_eq!(options.input.as_deref(), Some(Path::new("input.txt")));
        assert_eq!(options.output, None);
        assert_eq!(options.format, OutputFormat::Text);
        assert_eq!(options.waitlist_capacity, 20);
        assert!(!options.show_help);
    }

    #[test]
    fn test_parse_all_options() {
        let options = parse_from(&[
            "libris",
            "--json",
            "--waitlist-capacity=3",
            "in.txt",
            "-o",
            "out.jsonl",
        ])
        .expect("args should parse");
        assert_eq!(options.format, OutputFormat::Json);
        assert_eq!(options.waitlist_capacity, 3);
        assert_eq!(options.output.as_deref(), Some(Path::new("out.jsonl")));
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        assert!(parse_from(&["libris", "a.txt", "b.txt"]).is_err());
        assert!(parse_from(&["libris", "--frobnicate"]).is_err());
        assert!(parse_from(&["libris", "a.txt", "--waitlist-capacity", "many"]).is_err());
        assert!(parse_from(&["libris", "a.txt", "-o"]).is_err());
    }

    #[test]
    fn test_default_output_path_sits_next_to_input() {
        assert_eq!(
            default_output_path(Path::new("/tmp/runs/test1.txt")),
            Path::new("/tmp/runs/test1_output_file.txt")
        );
    }

    #[test]
    fn test_help_exits_zero() {
        let (code, out, _) = run_with(&["libris", "--help"]);
        assert_eq!(code, 0);
        assert!(out.starts_with("Usage: libris"));
    }

    #[test]
    fn test_usage_errors_exit_two() {
        let (code, _, err) = run_with(&["libris"]);
        assert_eq!(code, 2);
        assert!(err.contains("missing input file"));

        let (code, _, _) = run_with(&["libris", "x.txt", "--bogus"]);
        assert_eq!(code, 2);

        let (code, _, err) = run_with(&["libris", "x.txt", "--waitlist-capacity", "0"]);
        assert_eq!(code, 2);
        assert!(err.contains("waitlist_capacity"));
    }

    #[test]
    fn test_session_writes_default_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("session.txt");
        std::fs::write(&input, SESSION).expect("write input");

        let (code, out, err) = run_with(&["libris", input.to_str().expect("utf-8 path")]);
        assert_eq!(code, 0, "stderr: {err}");
        assert!(out.contains("session_output_file.txt"));

        let written =
            std::fs::read_to_string(dir.path().join("session_output_file.txt")).expect("output");
        assert_eq!(written, EXPECTED);
    }

    #[test]
    fn test_json_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.jsonl");
        std::fs::write(&input, "InsertBook(5, \"T\", \"A\", \"No\")\nBorrowBook(1, 5, 2)\n")
            .expect("write input");

        let (code, _, _) = run_with(&[
            "libris",
            input.to_str().expect("utf-8 path"),
            "--json",
            "--output",
            output.to_str().expect("utf-8 path"),
        ]);
        assert_eq!(code, 0);

        let written = std::fs::read_to_string(&output).expect("output");
        let lines: Vec<serde_json::Value> = written
            .lines()
            .map(|line| serde_json::from_str(line).expect("valid json"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["command"], "insert_book");
        assert_eq!(lines[0]["result"]["inserted"], true);
        assert_eq!(lines[1]["result"]["outcome"], "waitlisted");
    }

    #[test]
    fn test_parse_error_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("bad.txt");
        std::fs::write(&input, "InsertBook(1, \"T\", \"A\", \"Yes\")\nLendBook(1)\n")
            .expect("write input");

        let (code, _, err) = run_with(&["libris", input.to_str().expect("utf-8 path")]);
        assert_eq!(code, 1);
        assert!(err.contains("line 2"));
        assert!(!dir.path().join("bad_output_file.txt").exists());
    }

    #[test]
    fn test_missing_input_is_runtime_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("absent.txt");
        let (code, _, _) = run_with(&["libris", input.to_str().expect("utf-8 path")]);
        assert_eq!(code, 1);
    }
}
