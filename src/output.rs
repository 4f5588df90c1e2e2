use std::io::{self, Write};

use serde::Serialize;

use crate::harvest::HarvestOutcome;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_outcome(outcome: &HarvestOutcome) -> io::Result<()> {
        Self::print_json(outcome)
    }

    pub fn print_count(action: &str, count: usize) -> io::Result<()> {
        Self::print_json(&serde_json::json!({ "action": action, "count": count }))
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
