//! Output of the affected servers.
//!
//! This module handles everything written for humans:
//! - [`outbox`] - Queued notification messages
//! - [`terminal`] - Tables and summary on the terminal

mod outbox;
mod terminal;

pub use outbox::{
    build_messages, parse_start_time, read_outbox, write_outbox, Notice, OutageWindow,
    OutboxMessage,
};
pub use terminal::{format_field, print_affected, server_rows};
