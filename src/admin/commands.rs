//! Handler functions for the admin command table.

use crate::control::GatewayControl;

pub fn uart_status(control: &GatewayControl, args: &[&str]) -> String {
    let Some(idx_str) = args.first() else {
        return "usage: uart_status <idx>".to_string();
    };
    let Ok(idx) = idx_str.parse::<usize>() else {
        return format!("not a valid uart index: {idx_str:?}");
    };

    match control.uart_mgr.get_status(idx) {
        Some(status) => format!(
            "uart {idx} ({}): modbus_enable={} rx_bytes={} tx_bytes={} err_count={}",
            status.dev_path, status.modbus_enable, status.rx_bytes, status.tx_bytes, status.err_count
        ),
        None => format!("uart {idx} is not open"),
    }
}

pub fn net_status(control: &GatewayControl, _args: &[&str]) -> String {
    let clients = control.net_mgr.status();
    if clients.is_empty() {
        return "no connected clients".to_string();
    }
    clients
        .iter()
        .map(|c| {
            format!(
                "slot {}: {} rx_bytes={} tx_bytes={} idle_for={:.1}s",
                c.idx,
                c.addr,
                c.rx_bytes,
                c.tx_bytes,
                c.idle_for.as_secs_f32()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn log_level(_control: &GatewayControl, args: &[&str]) -> String {
    let Some(level_str) = args.first() else {
        return "usage: log_level <off|error|warn|info|debug|trace>".to_string();
    };
    match crate::logging::parse_level(level_str) {
        Some(level) => {
            crate::logging::set_level(level);
            format!("log level set to {level}")
        }
        None => format!("unrecognized log level: {level_str:?}"),
    }
}

pub fn help(_control: &GatewayControl, _args: &[&str]) -> String {
    super::help_text(&super::command_table())
}

pub fn exit(control: &GatewayControl, _args: &[&str]) -> String {
    control.stop();
    "shutting down".to_string()
}
