/// Interactive ATR console application

use atrmanager::*;
use log::{LevelFilter, Metadata, Record};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::str::FromStr;

/// ANSI color codes for log output
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BRIGHT_RED: &str = "\x1b[91m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
    pub const BRIGHT_WHITE: &str = "\x1b[97m";
    pub const DARK_WHITE: &str = "\x1b[37m";
    pub const DIM: &str = "\x1b[2m";
}

/// Environment variable selecting the initial log level
const LOG_ENV: &str = "ATR_LOG";

/// Logger writing library diagnostics to stderr
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let (tag, color) = match record.level() {
            log::Level::Error => ("[E]", colors::BRIGHT_RED),
            log::Level::Warn => ("[!]", colors::BRIGHT_YELLOW),
            log::Level::Info => ("[+]", colors::BRIGHT_WHITE),
            log::Level::Debug => ("[D]", colors::DARK_WHITE),
            log::Level::Trace => ("[T]", colors::DIM),
        };
        eprintln!("{}{} {}{}", color, tag, record.args(), colors::RESET);
    }

    fn flush(&self) {}
}

fn init_logger() {
    static LOGGER: ConsoleLogger = ConsoleLogger;
    if log::set_logger(&LOGGER).is_err() {
        return;
    }

    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| LevelFilter::from_str(&v).ok())
        .unwrap_or(LevelFilter::Warn);
    log::set_max_level(level);
}

/// Commands offered by tab completion
const COMMANDS: &[&str] = &[
    "cat",
    "dir",
    "exit",
    "export",
    "help",
    "info",
    "load",
    "log",
    "ls",
    "open",
    "quit",
    "read",
    "read-sector",
    "tree",
];

/// Completes the command word of a console line
struct CommandCompleter;

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let word = &line[..pos];
        if word.contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }

        let word = word.to_lowercase();
        let candidates = COMMANDS
            .iter()
            .filter(|command| command.starts_with(word.as_str()))
            .map(|command| Pair {
                display: command.to_string(),
                replacement: format!("{} ", command),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}
impl Validator for CommandCompleter {}
impl Helper for CommandCompleter {}

/// Get the path to the history file
fn history_path() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(".atrmanager_history");
        p
    })
}

fn main() {
    init_logger();

    println!("=== ATRManager ===");
    println!("Interactive console for exploring Atari 8-bit ATR disk images.");
    println!("Type 'help' for available commands\n");

    let mut rl = Editor::new().expect("Failed to create editor");
    rl.set_helper(Some(CommandCompleter));

    if let Some(history_path) = history_path() {
        let _ = rl.load_history(&history_path);
    }

    let mut image: Option<(String, AtrImage<FileSource>)> = None;

    loop {
        let readline = rl.readline("> ");
        let input = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                if let Some(history_path) = history_path() {
                    let _ = rl.save_history(&history_path);
                }
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let _ = rl.add_history_entry(input);

        let parts = parse_command_line(input);
        if parts.is_empty() {
            continue;
        }
        let command = parts[0].to_lowercase();

        match command.as_str() {
            "help" => {
                print_help();
            }
            "quit" | "exit" => {
                if let Some(history_path) = history_path() {
                    let _ = rl.save_history(&history_path);
                }
                println!("Goodbye!");
                break;
            }
            "open" | "load" => {
                if parts.len() < 2 {
                    println!("Usage: open <path>[#inner/path]");
                    continue;
                }
                // "disk.atr#DIR/FILE" opens the image and dumps one file
                let (image_path, inner_path) = match split_inner_path(&parts[1]) {
                    Some((image_path, inner)) => (image_path, Some(inner)),
                    None => (parts[1].as_str(), None),
                };
                match AtrImage::open(image_path) {
                    Ok(img) => {
                        println!("Opened: {}", image_path);
                        if let Some(inner) = inner_path {
                            dump_file(&img, inner);
                        }
                        image = Some((image_path.to_string(), img));
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "info" => {
                if let Some((ref name, ref img)) = image {
                    print_info(name, img);
                } else {
                    println!("No image loaded. Use 'open <path>' first.");
                }
            }
            "ls" | "dir" => {
                if let Some((_, ref img)) = image {
                    let path = parts.get(1).map(String::as_str).unwrap_or("");
                    match img.read_dir(path) {
                        Ok(entries) => print_entries(&entries),
                        Err(e) => println!("Error: {}", e),
                    }
                } else {
                    println!("No image loaded.");
                }
            }
            "tree" => {
                if let Some((_, ref img)) = image {
                    list_tree(img);
                } else {
                    println!("No image loaded.");
                }
            }
            "read" | "cat" => {
                if let Some((_, ref img)) = image {
                    if parts.len() < 2 {
                        println!("Usage: read <path>");
                        continue;
                    }
                    dump_file(img, &parts[1]);
                } else {
                    println!("No image loaded.");
                }
            }
            "export" => {
                if let Some((_, ref img)) = image {
                    if parts.len() < 2 {
                        println!("Usage: export <path> [output_path]");
                        println!("  output_path defaults to the file's name without directories.");
                        continue;
                    }
                    let src_path = &parts[1];
                    let output_path = parts.get(2).cloned().unwrap_or_else(|| {
                        src_path.rsplit('/').next().unwrap_or(src_path).to_string()
                    });

                    match img.read_file(src_path) {
                        Ok(data) => match std::fs::write(&output_path, &data) {
                            Ok(_) => println!(
                                "Exported {} ({} bytes) to {}",
                                src_path,
                                data.len(),
                                output_path
                            ),
                            Err(e) => println!("Error writing file: {}", e),
                        },
                        Err(e) => println!("Error reading file: {}", e),
                    }
                } else {
                    println!("No image loaded.");
                }
            }
            "read-sector" => {
                if let Some((_, ref img)) = image {
                    let sector = match parts.get(1).and_then(|s| parse_hex_or_dec(s)) {
                        Some(sector) => sector,
                        None => {
                            println!("Usage: read-sector <sector>");
                            continue;
                        }
                    };
                    let length = if sector <= 3 { 128 } else { img.bytes_per_sector() };
                    let mut data = vec![0u8; length];
                    match img
                        .sector_offset(sector, length)
                        .and_then(|offset| img.read_sector(sector, &mut data).map(|_| offset))
                    {
                        Ok(offset) => {
                            println!(
                                "Sector {} ({} bytes at image offset 0x{:X}):",
                                sector,
                                data.len(),
                                offset
                            );
                            print_hex_dump(&data, length);
                        }
                        Err(e) => println!("Error: {}", e),
                    }
                } else {
                    println!("No image loaded.");
                }
            }
            "log" => {
                if parts.len() < 2 {
                    println!("Log level: {}", log::max_level());
                    println!("Options: off, error, warn, info, debug, trace");
                } else {
                    match LevelFilter::from_str(&parts[1]) {
                        Ok(level) => {
                            log::set_max_level(level);
                            println!("Log level set to: {}", level);
                        }
                        Err(_) => {
                            println!("Unknown log level: {}", parts[1]);
                            println!("Options: off, error, warn, info, debug, trace");
                        }
                    }
                }
            }
            _ => {
                println!("Unknown command: {}. Type 'help' for available commands.", command);
            }
        }
    }
}

/// Split a console line into words
///
/// Text between double quotes is one word, so Atari paths next to host paths
/// with spaces can be given as `export "MUSIC/A.SAP" "my songs/a.sap"`.
fn parse_command_line(input: &str) -> Vec<String> {
    input
        .split('"')
        .enumerate()
        .flat_map(|(i, part)| {
            if i % 2 == 1 {
                vec![part.to_string()]
            } else {
                part.split_whitespace().map(str::to_string).collect()
            }
        })
        .collect()
}

fn print_help() {
    println!("Available commands:");
    println!("  open <path>[#inner/path]  - Open an ATR image, optionally dumping a file inside it");
    println!("  info                      - Show image information");
    println!("  ls [dir]                  - List a directory (root by default) (dir)");
    println!("  tree                      - List every file, including subdirectories");
    println!("  read <path>               - Read and hex dump a file (cat)");
    println!("  export <path> [output]    - Export a file to the host filesystem");
    println!("  read-sector <n>           - Read and display a logical sector");
    println!("  log [level]               - Show or set the log level (also via ATR_LOG)");
    println!("  help                      - Show this help");
    println!("  quit, exit                - Exit");
}

fn print_info(name: &str, image: &AtrImage<FileSource>) {
    let header = image.header();
    println!("Filename: {}", name);
    println!("Density: {}", header.density.name());
    println!("Image size: {} bytes", image.source().len());
    println!(
        "Boot sectors: {}",
        if header.has_padded_boot_sectors() { "padded to 256 bytes" } else { "128 bytes" }
    );
    println!("Sector 4 offset: {}", image.sector4_offset());
    println!("Files: {}", image.list_files().len());
}

fn print_entries(entries: &[DirEntry]) {
    if entries.is_empty() {
        println!("No files found.");
        return;
    }

    println!(
        "{:<13} {:<5} {:>6} {:>5} {:>7} {:<6} {:>3}",
        "Name", "Type", "Status", "Start", "Sectors", "Format", "Att"
    );
    println!("{}", "-".repeat(52));

    for entry in entries {
        println!(
            "{:<13} {:<5} {:>6} {:>5} {:>7} {:<6} {:>3}",
            entry.name,
            if entry.is_directory() { "Dir" } else { "File" },
            format!("0x{:02X}", entry.status),
            entry.first_sector,
            entry.sector_count,
            if entry.is_directory() { "" } else { entry.file_type().name() },
            if entry.locked { "L" } else { "-" }
        );
    }
}

fn list_tree(image: &AtrImage<FileSource>) {
    let mut lister = image.files();
    let mut count = 0;

    while let Some(path) = lister.next_file() {
        let path = path.to_string();
        let mut stream = FileStream::open(lister.directory());
        match stream.length() {
            Ok(length) => println!("{:<40} {:>8}", path, length),
            Err(e) if e.is_format_error() => println!("{:<40} {:>8}  {}", path, "corrupt", e),
            Err(e) => println!("{:<40} {:>8}  {}", path, "error", e),
        }
        count += 1;
    }

    if count == 0 {
        println!("No files found.");
    } else {
        println!("\n{} files.", count);
    }
}

fn dump_file(image: &AtrImage<FileSource>, path: &str) {
    match image.read_file(path) {
        Ok(data) => {
            println!("File: {} ({} bytes)", path, data.len());
            print_hex_dump(&data, 256);
        }
        Err(e) => println!("Error: {}", e),
    }
}

/// ATASCII end-of-line byte
const ATASCII_EOL: u8 = 0x9B;

/// Display form of an ATASCII byte
///
/// Inverse video (bit 7) shows as the normal character. Graphics and
/// control characters show as `.`.
fn atascii_char(byte: u8) -> char {
    if byte == ATASCII_EOL {
        return '\u{b6}';
    }
    match byte & 0x7F {
        c @ (0x20..=0x5F | 0x61..=0x7A | 0x7C) => c as char,
        _ => '.',
    }
}

/// Hex dump with an ATASCII column, at most `max_bytes` bytes
fn print_hex_dump(data: &[u8], max_bytes: usize) {
    let shown = &data[..data.len().min(max_bytes)];

    for (row, chunk) in shown.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02X}", b)).collect();
        let (left, right) = hex.split_at(hex.len().min(8));
        let text: String = chunk.iter().map(|&b| atascii_char(b)).collect();
        println!(
            "{:03X}: {:<23}  {:<23} |{}|",
            row * 16,
            left.join(" "),
            right.join(" "),
            text
        );
    }

    if data.len() > shown.len() {
        println!("... ({} more bytes)", data.len() - shown.len());
    }
}

fn parse_hex_or_dec(s: &str) -> Option<u32> {
    if s.starts_with("0x") || s.starts_with("0X") {
        u32::from_str_radix(&s[2..], 16).ok()
    } else {
        s.parse().ok()
    }
}
