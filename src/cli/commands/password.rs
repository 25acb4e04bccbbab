use std::io::{self, BufRead};

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::PASSWORD_COST_RANGE;
use crate::services::hash_password;

#[derive(Subcommand)]
pub enum PasswordCommands {
    #[command(about = "Print the password_hash value for a credential file entry")]
    Hash {
        #[arg(help = "Password (read from stdin if not provided)")]
        password: Option<String>,
        #[arg(long, default_value_t = bcrypt::DEFAULT_COST, help = "bcrypt work factor (4-31)")]
        cost: u32,
    },
}

pub async fn handle(cmd: PasswordCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        PasswordCommands::Hash { password, cost } => {
            let password = match password {
                Some(password) => password,
                None => read_password_line()?,
            };
            if password.is_empty() {
                anyhow::bail!("password must not be empty");
            }
            if !PASSWORD_COST_RANGE.contains(&cost) {
                anyhow::bail!("cost must be between 4 and 31, got {}", cost);
            }

            output_success(
                output_format,
                "Password hash",
                Some(json!({ "password_hash": hash_password(&password, cost)? })),
            )
        }
    }
}

fn read_password_line() -> anyhow::Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
