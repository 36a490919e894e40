use std::io::{self, BufRead, Write};

use MemBase::catalog::TableManager;
use MemBase::dispatch::Dispatcher;
use MemBase::result::{status_line, Reply, ResultSet};

/// The shell shows at most this many rows; the underlying result stays
/// complete.
const DISPLAY_ROW_CAP: usize = 50;

fn main() -> io::Result<()> {
    env_logger::init();

    let directory = std::env::args().nth(1).unwrap_or_else(|| "Tables".to_string());
    let manager = match TableManager::open(&directory) {
        Ok(manager) => manager,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };
    let mut shell = Dispatcher::new(manager);

    println!(
        "MemBase shell (tables in '{}'). Type commands, 'exit' to leave.",
        directory
    );
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("membase> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line == "exit" || line == "quit" {
            break;
        }
        print_reply(shell.execute(line));
    }
    Ok(())
}

fn print_reply(reply: Reply) {
    match reply {
        Reply::Status(text) => {
            if !text.is_empty() {
                println!("{}", text);
            }
        }
        Reply::Rows { set, elapsed } => {
            print_table(&set);
            println!("{}", status_line(set.len(), elapsed));
        }
    }
}

/// Column-aligned plain rendering, capped at the first 50 rows.
fn print_table(set: &ResultSet) {
    let mut widths: Vec<usize> = set.header().iter().map(String::len).collect();
    for row in set.rows().iter().take(DISPLAY_ROW_CAP) {
        for (i, cell) in row.iter().enumerate() {
            if cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }
    print_row(set.header(), &widths);
    for row in set.rows().iter().take(DISPLAY_ROW_CAP) {
        print_row(row, &widths);
    }
    if set.len() > DISPLAY_ROW_CAP {
        println!("... ({} rows total)", set.len());
    }
}

fn print_row(cells: &[String], widths: &[usize]) {
    let rendered: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    println!("{}", rendered.join("  "));
}
