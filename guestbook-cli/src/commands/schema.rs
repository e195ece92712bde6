//! Print the schema bootstrap DDL.

use anyhow::Result;
use clap::Parser;

use guestbook_server::db::bootstrap_sql;
use guestbook_server::GuestbookConfig;

/// Arguments for the schema command
#[derive(Parser, Debug)]
pub struct SchemaArgs {}

pub fn run_schema(_args: SchemaArgs, config: &GuestbookConfig) -> Result<()> {
    println!("{}", bootstrap_sql(&config.database));
    Ok(())
}
