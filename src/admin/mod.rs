//! Admin command surface (C8): a line-oriented REPL over stdin, dispatched
//! through a command table the same way the teacher's `src/shell` wires a
//! `HashMap<&str, ShellCommand>` — except here it's blocking `stdin` rather
//! than an async console reader, and the command set matches
//! `examples/original_source/src/cli/cli_mgr.c` instead of a kernel shell's.

mod commands;

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::control::GatewayControl;

/// One entry in the dispatch table: a help string plus the handler.
pub struct AdminCommand {
    pub help: &'static str,
    pub func: fn(&GatewayControl, &[&str]) -> String,
}

/// Builds the fixed command table for this session. Re-created per call
/// rather than held `static` since handlers close over nothing but their
/// arguments.
fn command_table() -> HashMap<&'static str, AdminCommand> {
    let mut table = HashMap::new();
    table.insert(
        "uart_status",
        AdminCommand {
            help: "uart_status <idx> — show one UART's counters",
            func: commands::uart_status,
        },
    );
    table.insert(
        "net_status",
        AdminCommand {
            help: "net_status — list connected TCP clients",
            func: commands::net_status,
        },
    );
    table.insert(
        "log_level",
        AdminCommand {
            help: "log_level <off|error|warn|info|debug|trace> — change the running filter",
            func: commands::log_level,
        },
    );
    table.insert(
        "help",
        AdminCommand {
            help: "help — list commands",
            func: commands::help,
        },
    );
    table.insert(
        "exit",
        AdminCommand {
            help: "exit — shut the gateway down",
            func: commands::exit,
        },
    );
    table
}

/// Runs the REPL on the calling thread until `exit` is issued or stdin
/// closes. Only ever touches `control` through [`GatewayControl`]'s public
/// surface and the `get_status`/`status` snapshots C2/C3 expose — never a
/// private field, and never across a sleep/poll boundary.
pub fn run(control: Arc<GatewayControl>) {
    let table = command_table();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("gateway> ");
        let _ = io::stdout().flush();

        let Some(Ok(line)) = lines.next() else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else { continue };
        let args: Vec<&str> = parts.collect();

        match table.get(cmd) {
            Some(entry) => {
                let output = (entry.func)(&control, &args);
                println!("{output}");
                if cmd == "exit" {
                    break;
                }
            }
            None => println!("unknown command {cmd:?}; try 'help'"),
        }

        if !control.is_running() {
            break;
        }
    }
}

pub(crate) fn help_text(table: &HashMap<&'static str, AdminCommand>) -> String {
    let mut lines: Vec<&str> = table.values().map(|c| c.help).collect();
    lines.sort_unstable();
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_contains_the_full_command_set() {
        let table = command_table();
        for name in ["uart_status", "net_status", "log_level", "help", "exit"] {
            assert!(table.contains_key(name), "missing command {name}");
        }
    }
}
