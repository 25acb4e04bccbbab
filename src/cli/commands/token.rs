use anyhow::Context;
use chrono::{TimeZone, Utc};
use clap::Subcommand;
use serde_json::json;

use crate::auth::{inspect_unverified, Claims, Principal, TokenAuthority, VerifyError};
use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::{AppConfig, SecurityConfig};

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a signed token for a principal")]
    Issue {
        #[arg(long, help = "Subject id of the principal")]
        subject: String,
        #[arg(long, help = "Role of the principal")]
        role: String,
        #[arg(long, allow_negative_numbers = true, help = "Override token lifetime in seconds")]
        expiry_secs: Option<i64>,
    },

    #[command(about = "Verify a token against the configured secret and issuer")]
    Verify {
        #[arg(help = "Token to verify")]
        token: String,
    },

    #[command(about = "Decode a token's header and claims WITHOUT verifying it")]
    Inspect {
        #[arg(help = "Token to decode")]
        token: String,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue { subject, role, expiry_secs } => {
            let mut security = load_security()?;
            if let Some(secs) = expiry_secs {
                security = security.with_expiry_secs(secs);
            }
            let authority = TokenAuthority::new(&security)?;

            let principal = Principal::new(subject, role);
            let token = authority.issue(&principal)?;

            output_success(
                output_format,
                "Token issued",
                Some(json!({
                    "token": token,
                    "subject_id": principal.subject_id,
                    "role": principal.role,
                    "expires_in": authority.lifetime().num_seconds(),
                })),
            )
        }
        TokenCommands::Verify { token } => {
            let authority = TokenAuthority::new(&load_security()?)?;

            match authority.verify(token.trim()) {
                Ok(claims) => output_success(
                    output_format,
                    "Token is valid",
                    Some(verified_json(&claims, Utc::now().timestamp())),
                ),
                Err(e) => {
                    output_error(output_format, &e.to_string(), Some(error_code(e)))?;
                    anyhow::bail!("token rejected: {}", e)
                }
            }
        }
        TokenCommands::Inspect { token } => {
            let (header, claims) = inspect_unverified(token.trim())
                .map_err(|e| anyhow::anyhow!("cannot decode token: {}", e))?;

            let mut data = claims_json(&claims);
            data["alg"] = json!(format!("{:?}", header.alg));
            output_success(output_format, "Token decoded (signature NOT verified)", Some(data))
        }
    }
}

fn load_security() -> anyhow::Result<SecurityConfig> {
    let config = AppConfig::from_env().context("invalid token configuration")?;
    Ok(config.security)
}

fn claims_json(claims: &Claims) -> serde_json::Value {
    let timestamp = |secs: i64| {
        Utc.timestamp_opt(secs, 0)
            .single()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| secs.to_string())
    };

    json!({
        "subject_id": claims.subject_id,
        "role": claims.role,
        "issuer": claims.issuer,
        "issued_at": timestamp(claims.issued_at),
        "expires_at": timestamp(claims.expires_at),
    })
}

/// Claims plus the seconds left before the token stops verifying.
fn verified_json(claims: &Claims, now: i64) -> serde_json::Value {
    let mut data = claims_json(claims);
    data["expires_in"] = json!(claims.remaining_secs(now));
    data
}

fn error_code(err: VerifyError) -> &'static str {
    match err {
        VerifyError::Malformed => "MALFORMED",
        VerifyError::InvalidSignature => "INVALID_SIGNATURE",
        VerifyError::WrongIssuer => "WRONG_ISSUER",
        VerifyError::Expired => "EXPIRED",
    }
}
