//! Shell command parsing and execution.
//!
//! Commands:
//! - `open <id> <path> [mode]` - Open a file and register it under `id`
//! - `openmany <ids> <paths> <modes>` - Open several files, comma separated
//! - `read <id> [--len N] [--lines] [--at OFFSET]` - Read from a file
//! - `write <id> <text> [--no-flush]` - Write text (`\n`, `\t` escapes allowed)
//! - `writeb <id> <base64> [--no-flush]` - Write raw bytes
//! - `writemany <ids> <texts>` - Write one text to each file, comma separated
//! - `flush`, `seek`, `tell`, `mode`, `rename`, `clear`, `encoding`, `close`, `info`
//! - `handles` - List open files
//! - `help` - Show help
//! - `exit` - Exit the shell
//!
//! Identifiers are parsed through [`Registry::parse_identifier`], so a shell
//! running with numeric identifiers rejects `open notes ...` before the
//! filesystem is touched.

use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use nu_ansi_term::{Color, Style};
use serde_json::Value as JsonValue;

use modefile_core::{
    Content, Error as FileError, Mode, ReadOptions, Registry, RegistryKey, TextEncoding,
    WriteOptions, WriteReport,
};

const OPEN_USAGE: &str = "open <id> <path> [mode]";
const OPEN_MANY_USAGE: &str = "openmany <id,id,...> <path,path,...> <mode,mode,...>";
const READ_USAGE: &str = "read <id> [--len N] [--lines] [--at OFFSET]";
const WRITE_USAGE: &str = "write <id> <text> [--no-flush]";
const WRITEB_USAGE: &str = "writeb <id> <base64> [--no-flush]";
const WRITE_MANY_USAGE: &str = "writemany <id,id,...> <text,text,...>";
const SEEK_USAGE: &str = "seek <id> <offset>";
const MODE_USAGE: &str = "mode <id> <mode>";
const RENAME_USAGE: &str = "rename <id> <path> [--create]";
const ENCODING_USAGE: &str = "encoding <id> <utf-8|ascii|latin-1>";

/// Command names and aliases with a one-line description.
pub const COMMAND_NAMES: &[(&str, &str)] = &[
    ("open", "Open a file under an identifier"),
    ("openmany", "Open several files at once"),
    ("read", "Read from a file"),
    ("r", "Read from a file"),
    ("write", "Write text"),
    ("w", "Write text"),
    ("writeb", "Write base64-encoded bytes"),
    ("writemany", "Write one text per file"),
    ("flush", "Flush buffered writes"),
    ("seek", "Move the cursor"),
    ("tell", "Show the cursor position"),
    ("mode", "Reopen under another mode"),
    ("rename", "Point the handle at another file"),
    ("clear", "Empty the file"),
    ("encoding", "Set the text encoding"),
    ("close", "Close and unregister a file"),
    ("info", "Show handle details"),
    ("handles", "List open files"),
    ("ls", "List open files"),
    ("help", "Show help"),
    ("exit", "Exit the shell"),
    ("quit", "Exit the shell"),
    ("q", "Exit the shell"),
];

/// Result of executing a command
#[derive(Debug)]
pub enum CommandResult {
    /// Command succeeded, optionally with output and non-fatal warnings
    Ok {
        display: Option<String>,
        warnings: Vec<String>,
    },
    /// Command failed with an error message
    Error(String),
    /// User requested to exit
    Exit,
    /// Show help
    Help,
}

impl CommandResult {
    fn ok_display(display: impl Into<String>) -> Self {
        CommandResult::Ok {
            display: Some(display.into()),
            warnings: Vec::new(),
        }
    }

    fn ok_none() -> Self {
        CommandResult::Ok {
            display: None,
            warnings: Vec::new(),
        }
    }

    fn written(display: impl Into<String>, reports: &[WriteReport]) -> Self {
        CommandResult::Ok {
            display: Some(display.into()),
            warnings: reports
                .iter()
                .flat_map(|r| r.warnings.iter().map(ToString::to_string))
                .collect(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown command: {0}. Type 'help' for available commands.")]
    Unknown(String),

    #[error("Invalid number {0:?}")]
    InvalidNumber(String),

    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Could not format output: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    File(#[from] FileError),
}

type Outcome = Result<CommandResult, CommandError>;

/// Parse and execute a command against `registry`.
pub fn execute<K: RegistryKey>(input: &str, registry: &mut Registry<K>) -> CommandResult {
    let input = input.trim();

    if input.is_empty() {
        return CommandResult::ok_none();
    }

    let (command, args) = split_word(input);

    let outcome = match command.to_lowercase().as_str() {
        "help" | "?" => Ok(CommandResult::Help),
        "exit" | "quit" | "q" => Ok(CommandResult::Exit),
        "open" => cmd_open(args, registry),
        "openmany" => cmd_open_many(args, registry),
        "read" | "r" => cmd_read(args, registry),
        "write" | "w" => cmd_write(args, registry, false),
        "writeb" => cmd_write(args, registry, true),
        "writemany" => cmd_write_many(args, registry),
        "flush" => cmd_flush(args, registry),
        "seek" => cmd_seek(args, registry),
        "tell" => cmd_tell(args, registry),
        "mode" => cmd_mode(args, registry),
        "rename" => cmd_rename(args, registry),
        "clear" => cmd_clear(args, registry),
        "encoding" => cmd_encoding(args, registry),
        "close" => cmd_close(args, registry),
        "info" => cmd_info(args, registry),
        "handles" | "ls" => Ok(cmd_handles(registry)),
        other => Err(CommandError::Unknown(other.to_string())),
    };

    outcome.unwrap_or_else(|e| CommandResult::Error(e.to_string()))
}

fn cmd_open<K: RegistryKey>(args: &str, registry: &mut Registry<K>) -> Outcome {
    let words: Vec<&str> = args.split_whitespace().collect();
    let (raw_id, location, mode) = match words.as_slice() {
        [id, location] => (*id, *location, Mode::READ),
        [id, location, mode] => (*id, *location, mode.parse()?),
        _ => return Err(CommandError::Usage(OPEN_USAGE)),
    };

    let id = registry.parse_identifier(raw_id)?;
    let handle = registry.add(id.clone(), location, mode)?;

    Ok(CommandResult::ok_display(format!(
        "{} {} {} {}",
        Color::Green.paint("opened"),
        Color::Magenta.paint(id.to_string()),
        handle.location().display(),
        Color::DarkGray.paint(format!("({})", handle.mode()))
    )))
}

fn cmd_open_many<K: RegistryKey>(args: &str, registry: &mut Registry<K>) -> Outcome {
    let words: Vec<&str> = args.split_whitespace().collect();
    let &[ids, locations, modes] = words.as_slice() else {
        return Err(CommandError::Usage(OPEN_MANY_USAGE));
    };

    let ids = comma_list(ids)
        .map(|raw| registry.parse_identifier(raw))
        .collect::<Result<Vec<K>, _>>()?;
    let locations: Vec<&str> = comma_list(locations).collect();
    let modes = comma_list(modes)
        .map(Mode::from_str)
        .collect::<Result<Vec<_>, _>>()?;

    registry.open_many(&locations, &modes, &ids)?;

    Ok(CommandResult::ok_display(format!(
        "{} {} files",
        Color::Green.paint("opened"),
        ids.len()
    )))
}

fn cmd_read<K: RegistryKey>(args: &str, registry: &mut Registry<K>) -> Outcome {
    let mut words = args.split_whitespace();
    let raw_id = words.next().ok_or(CommandError::Usage(READ_USAGE))?;

    let mut options = ReadOptions::all();
    while let Some(word) = words.next() {
        options = match word {
            "--len" | "-n" => options.amount(parse_number(words.next(), READ_USAGE)?),
            "--lines" | "-l" => options.lines(),
            "--at" => options.at(parse_number(words.next(), READ_USAGE)?),
            _ => return Err(CommandError::Usage(READ_USAGE)),
        };
    }

    let id = registry.parse_identifier(raw_id)?;
    let content = registry.read_from(&id, options)?;
    Ok(CommandResult::ok_display(format_content(&content)))
}

fn cmd_write<K: RegistryKey>(args: &str, registry: &mut Registry<K>, binary: bool) -> Outcome {
    let usage = if binary { WRITEB_USAGE } else { WRITE_USAGE };
    let (raw_id, rest) = split_word(args);
    let (payload, options) = split_flush_flag(rest);
    if raw_id.is_empty() || payload.is_empty() {
        return Err(CommandError::Usage(usage));
    }

    let content = if binary {
        Content::Bytes(BASE64.decode(payload.trim())?)
    } else {
        Content::Text(unescape(payload))
    };

    let id = registry.parse_identifier(raw_id)?;
    let report = registry.write_to(&id, content, options)?;

    let verb = if options.flush { "wrote" } else { "buffered" };
    Ok(CommandResult::written(
        format!(
            "{} {} bytes to {}",
            Color::Green.paint(verb),
            report.bytes_written,
            Color::Magenta.paint(id.to_string())
        ),
        std::slice::from_ref(&report),
    ))
}

fn cmd_write_many<K: RegistryKey>(args: &str, registry: &mut Registry<K>) -> Outcome {
    let (ids, texts) = split_word(args);
    if ids.is_empty() || texts.is_empty() {
        return Err(CommandError::Usage(WRITE_MANY_USAGE));
    }

    let ids = comma_list(ids)
        .map(|raw| registry.parse_identifier(raw))
        .collect::<Result<Vec<K>, _>>()?;
    let contents: Vec<Content> = texts
        .split(',')
        .map(|text| Content::Text(unescape(text.trim())))
        .collect();

    let reports = registry.write_many(&ids, contents, WriteOptions::default())?;
    let total: usize = reports.iter().map(|r| r.bytes_written).sum();

    Ok(CommandResult::written(
        format!(
            "{} {} bytes to {} files",
            Color::Green.paint("wrote"),
            total,
            reports.len()
        ),
        &reports,
    ))
}

fn cmd_flush<K: RegistryKey>(args: &str, registry: &mut Registry<K>) -> Outcome {
    let id = single_identifier(args, "flush <id>", registry)?;
    handle_mut(registry, &id)?.flush()?;
    Ok(CommandResult::ok_none())
}

fn cmd_seek<K: RegistryKey>(args: &str, registry: &mut Registry<K>) -> Outcome {
    let mut words = args.split_whitespace();
    let raw_id = words.next().ok_or(CommandError::Usage(SEEK_USAGE))?;
    let offset: u64 = parse_number(words.next(), SEEK_USAGE)?;
    if words.next().is_some() {
        return Err(CommandError::Usage(SEEK_USAGE));
    }

    let id = registry.parse_identifier(raw_id)?;
    let position = registry.seek_in(&id, offset)?;
    Ok(CommandResult::ok_display(position.to_string()))
}

fn cmd_tell<K: RegistryKey>(args: &str, registry: &mut Registry<K>) -> Outcome {
    let id = single_identifier(args, "tell <id>", registry)?;
    Ok(CommandResult::ok_display(registry.offset_of(&id)?.to_string()))
}

fn cmd_mode<K: RegistryKey>(args: &str, registry: &mut Registry<K>) -> Outcome {
    let words: Vec<&str> = args.split_whitespace().collect();
    let &[raw_id, token] = words.as_slice() else {
        return Err(CommandError::Usage(MODE_USAGE));
    };

    let id = registry.parse_identifier(raw_id)?;
    let mode: Mode = token.parse()?;
    registry.change_mode_of(&id, mode)?;
    Ok(CommandResult::ok_none())
}

fn cmd_rename<K: RegistryKey>(args: &str, registry: &mut Registry<K>) -> Outcome {
    let words: Vec<&str> = args.split_whitespace().collect();
    let (raw_id, location, create) = match words.as_slice() {
        [id, location] => (*id, *location, false),
        [id, location, "--create"] => (*id, *location, true),
        _ => return Err(CommandError::Usage(RENAME_USAGE)),
    };

    let id = registry.parse_identifier(raw_id)?;
    registry.rename_of(&id, location, create)?;
    Ok(CommandResult::ok_none())
}

fn cmd_clear<K: RegistryKey>(args: &str, registry: &mut Registry<K>) -> Outcome {
    let id = single_identifier(args, "clear <id>", registry)?;
    registry.clear(&id)?;
    Ok(CommandResult::ok_none())
}

fn cmd_encoding<K: RegistryKey>(args: &str, registry: &mut Registry<K>) -> Outcome {
    let words: Vec<&str> = args.split_whitespace().collect();
    let &[raw_id, name] = words.as_slice() else {
        return Err(CommandError::Usage(ENCODING_USAGE));
    };

    let id = registry.parse_identifier(raw_id)?;
    let encoding: TextEncoding = name.parse()?;
    handle_mut(registry, &id)?.set_encoding(encoding);
    Ok(CommandResult::ok_none())
}

fn cmd_close<K: RegistryKey>(args: &str, registry: &mut Registry<K>) -> Outcome {
    let id = single_identifier(args, "close <id>", registry)?;
    if registry.remove(&id)? {
        Ok(CommandResult::ok_display(format!(
            "{} {}",
            Color::Green.paint("closed"),
            Color::Magenta.paint(id.to_string())
        )))
    } else {
        Ok(CommandResult::ok_display(
            Color::Yellow
                .paint(format!("Nothing registered under {}", id))
                .to_string(),
        ))
    }
}

fn cmd_info<K: RegistryKey>(args: &str, registry: &mut Registry<K>) -> Outcome {
    let id = single_identifier(args, "info <id>", registry)?;
    let handle = registry
        .get(&id)
        .ok_or_else(|| unknown_identifier(&id))?;
    let value = serde_json::to_value(handle.info())?;
    Ok(CommandResult::ok_display(format_json(&value)?))
}

fn cmd_handles<K: RegistryKey>(registry: &Registry<K>) -> CommandResult {
    if registry.is_empty() {
        return CommandResult::ok_display(
            Color::Yellow
                .paint("No open files. Use 'open <id> <path> [mode]' to open one.")
                .to_string(),
        );
    }

    let mut output = String::new();
    for (id, handle) in registry.iter() {
        output.push_str(&format!(
            "  {:<10} {:<4} {}{}\n",
            Color::Magenta.paint(id.to_string()),
            Color::Cyan.paint(handle.mode().to_string()),
            handle.location().display(),
            if handle.is_closed() {
                Color::DarkGray.paint(" (closed)").to_string()
            } else {
                String::new()
            }
        ));
    }
    CommandResult::ok_display(output.trim_end().to_string())
}

/// Generate help text
pub fn format_help() -> String {
    let cmd_style = Style::new().bold().fg(Color::Cyan);
    let arg_style = Style::new().fg(Color::Yellow);
    let desc_style = Style::new().fg(Color::White);

    let mut help = String::new();
    help.push_str(&format!(
        "{}\n\n",
        Style::new().bold().paint("modefile Commands")
    ));

    let commands = [
        ("open", "<id> <path> [mode]", "Open a file (mode defaults to r)"),
        ("openmany", "<ids> <paths> <modes>", "Open several files (comma separated)"),
        ("read", "<id> [--len N] [--lines] [--at OFF]", "Read from a file (alias: r)"),
        ("write", "<id> <text> [--no-flush]", "Write text (alias: w)"),
        ("writeb", "<id> <base64> [--no-flush]", "Write raw bytes"),
        ("writemany", "<ids> <texts>", "Write one text per file (comma separated)"),
        ("flush", "<id>", "Flush buffered writes"),
        ("seek", "<id> <offset>", "Move the cursor"),
        ("tell", "<id>", "Show the cursor position"),
        ("mode", "<id> <mode>", "Reopen under another mode"),
        ("rename", "<id> <path> [--create]", "Point the handle at another file"),
        ("clear", "<id>", "Empty the file"),
        ("encoding", "<id> <name>", "Set the text encoding"),
        ("close", "<id>", "Close and unregister a file"),
        ("info", "<id>", "Show handle details"),
        ("handles", "", "List open files (alias: ls)"),
        ("", "", ""),
        ("help", "", "Show this help message"),
        ("exit", "", "Exit the shell (alias: quit, q)"),
    ];

    for (cmd, args, desc) in commands {
        if cmd.is_empty() {
            help.push('\n');
        } else {
            help.push_str(&format!(
                "  {:<10} {:<36} {}\n",
                cmd_style.paint(cmd),
                arg_style.paint(args),
                desc_style.paint(desc)
            ));
        }
    }

    help.push_str(&format!("\n{}\n", Style::new().bold().paint("Modes")));
    help.push_str(&format!(
        "  {} read, {} write (truncates), {} append, {} create new\n",
        arg_style.paint("r"),
        arg_style.paint("w"),
        arg_style.paint("a"),
        arg_style.paint("x")
    ));
    help.push_str(&format!(
        "  Add {} for bytes and {} for read/write, e.g. {}\n",
        arg_style.paint("b"),
        arg_style.paint("+"),
        arg_style.paint("rb+")
    ));

    help
}

/// Split off the first whitespace-delimited word.
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(i) => (&input[..i], input[i..].trim_start()),
        None => (input, ""),
    }
}

/// Strip a trailing `--no-flush` from a write payload.
fn split_flush_flag(payload: &str) -> (&str, WriteOptions) {
    let trimmed = payload.trim_end();
    match trimmed.strip_suffix("--no-flush") {
        Some(rest) if rest.is_empty() || rest.ends_with(char::is_whitespace) => {
            (rest.trim_end(), WriteOptions::buffered())
        }
        _ => (trimmed, WriteOptions::default()),
    }
}

fn comma_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Expand `\n`, `\t`, `\r` and `\\`. Other escapes are kept as typed.
fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}

fn parse_number<T: FromStr>(word: Option<&str>, usage: &'static str) -> Result<T, CommandError> {
    let word = word.ok_or(CommandError::Usage(usage))?;
    word.parse()
        .map_err(|_| CommandError::InvalidNumber(word.to_string()))
}

fn single_identifier<K: RegistryKey>(
    args: &str,
    usage: &'static str,
    registry: &Registry<K>,
) -> Result<K, CommandError> {
    let words: Vec<&str> = args.split_whitespace().collect();
    let &[raw_id] = words.as_slice() else {
        return Err(CommandError::Usage(usage));
    };
    Ok(registry.parse_identifier(raw_id)?)
}

fn handle_mut<'a, K: RegistryKey>(
    registry: &'a mut Registry<K>,
    id: &K,
) -> Result<&'a mut modefile_core::FileHandle, FileError> {
    registry.get_mut(id).ok_or_else(|| unknown_identifier(id))
}

fn unknown_identifier<K: RegistryKey>(id: &K) -> FileError {
    FileError::UnknownIdentifier {
        identifier: id.to_string(),
    }
}

/// Render read results. Bytes are shown as base64.
fn format_content(content: &Content) -> String {
    match content {
        Content::Text(text) if text.is_empty() => Color::DarkGray.paint("(empty)").to_string(),
        Content::Text(text) => text.clone(),
        Content::Bytes(bytes) => format!(
            "{} {}",
            BASE64.encode(bytes),
            Color::DarkGray.paint(format!("({} bytes, base64)", bytes.len()))
        ),
        Content::Lines(lines) => JsonValue::from(lines.clone()).to_string(),
        Content::ByteLines(lines) => {
            JsonValue::from(lines.iter().map(|l| BASE64.encode(l)).collect::<Vec<_>>())
                .to_string()
        }
    }
}

fn format_json(value: &JsonValue) -> Result<String, CommandError> {
    let pretty = serde_json::to_string_pretty(value)?;
    Ok(pretty
        .lines()
        .map(|line| match line.split_once(": ") {
            Some((key, rest)) => format!("{}: {}", Color::Cyan.paint(key), rest),
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n"))
}
