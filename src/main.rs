//! MediQueue CLI
//!
//! Command-line client for a running MediQueue API server:
//! - Log in and out
//! - Show current hospital resources
//! - Update resource counts
//! - Generate config files and password hashes

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use mediqueue::config::generate_default_config;
use mediqueue::model::{BloodType, ResourceField, ResourceForm};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mediqueue")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Hospital resource dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8085", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and remember the session
    Login {
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// End the remembered session
    Logout,

    /// Show current hospital resources
    Status,

    /// Update resource counts; unspecified counts keep their current value
    Update {
        /// Blood units as TYPE=COUNT, e.g. A+=5 (repeatable)
        #[arg(short, long)]
        blood: Vec<String>,
        #[arg(long)]
        oxygen: Option<String>,
        #[arg(long)]
        icu: Option<String>,
        #[arg(long)]
        general: Option<String>,
        #[arg(long)]
        doctors: Option<String>,
        /// Overwrite even if someone else updated in the meantime
        #[arg(long)]
        force: bool,
    },

    /// Print the SHA-256 hash of a password for `[[auth.staff]]`
    HashPassword { password: String },

    /// Generate default config file
    InitConfig {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Session remembered between invocations
#[derive(Debug, Serialize, Deserialize)]
struct SavedSession {
    api_url: String,
    token: String,
    email: String,
}

fn session_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mediqueue")
        .join("session.json")
}

fn load_session() -> Result<SavedSession> {
    let path = session_path();
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Not logged in (no session at {:?})", path))?;
    serde_json::from_str(&text).context("Corrupt session file, log in again")
}

fn save_session(session: &SavedSession) -> Result<()> {
    let path = session_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_string_pretty(session)?)?;
    Ok(())
}

/// Parse `A+=5` into a blood type and raw count
fn parse_blood_arg(arg: &str) -> Result<(BloodType, String)> {
    let (kind, count) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected TYPE=COUNT, got {:?}", arg))?;
    let blood_type = kind
        .parse()
        .map_err(|_| anyhow!("Unknown blood type {:?}", kind))?;
    Ok((blood_type, count.to_string()))
}

/// Apply command-line edits to a hydrated form, coercing like the web form
fn apply_updates(
    form: ResourceForm,
    blood: &[String],
    fields: &[(ResourceField, Option<&String>)],
) -> Result<ResourceForm> {
    let mut form = form;
    for arg in blood {
        let (blood_type, count) = parse_blood_arg(arg)?;
        form = form.with_input(ResourceField::BloodUnits(blood_type), &count);
    }
    for (field, value) in fields {
        if let Some(value) = value {
            form = form.with_input(*field, value);
        }
    }
    Ok(form)
}

async fn error_text(response: reqwest::Response) -> String {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or_default();
    let message = body["error"]["message"]
        .as_str()
        .or_else(|| body["notification"]["description"].as_str())
        .unwrap_or("request failed");
    format!("{} ({})", message, status)
}

fn print_status(data: &Value) {
    let metrics = &data["metrics"];
    let number = |v: &Value| v.as_i64().unwrap_or(0);

    println!("Hospital Resources (version {})", data["version"]);
    println!();
    println!("  Blood units:       {:>6}", number(&metrics["total_blood_units"]));
    if let Some(breakdown) = metrics["blood_units"].as_array() {
        for entry in breakdown {
            println!(
                "    {:<4}             {:>6}",
                entry["blood_type"].as_str().unwrap_or("?"),
                number(&entry["units"])
            );
        }
    }
    println!("  Oxygen cylinders:  {:>6}", number(&metrics["oxygen_cylinders"]));
    println!("  Beds:              {:>6}", number(&metrics["total_beds"]));
    println!("    ICU              {:>6}", number(&metrics["icu_beds"]));
    println!("    General          {:>6}", number(&metrics["general_beds"]));
    println!("  Doctors available: {:>6}", number(&metrics["doctors_available"]));
    println!();
    println!(
        "Last updated: {}",
        metrics["last_updated"].as_str().unwrap_or("Never")
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediqueue=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Login { email, password } => {
            let response = client
                .post(format!("{}/api/v1/auth/login", cli.api_url))
                .json(&serde_json::json!({ "email": email, "password": password }))
                .send()
                .await?;

            if !response.status().is_success() {
                bail!("Login failed: {}", error_text(response).await);
            }

            let body: Value = response.json().await?;
            let token = body["token"]
                .as_str()
                .ok_or_else(|| anyhow!("Login response missing token"))?;

            save_session(&SavedSession {
                api_url: cli.api_url.clone(),
                token: token.to_string(),
                email: email.clone(),
            })?;
            println!(
                "Welcome back, {}",
                body["user"]["display_name"].as_str().unwrap_or(&email)
            );
        }

        Commands::Logout => {
            let session = load_session()?;
            let response = client
                .post(format!("{}/api/v1/auth/logout", session.api_url))
                .bearer_auth(&session.token)
                .send()
                .await?;

            let ok = response.status().is_success();
            let body: Value = response.json().await.unwrap_or_default();
            let description = body["notification"]["description"]
                .as_str()
                .unwrap_or("Failed to log out");

            if !ok {
                bail!("{}", description);
            }
            std::fs::remove_file(session_path())?;
            println!("{}", description);
        }

        Commands::Status => {
            let session = load_session()?;
            let response = client
                .get(format!("{}/api/v1/status", session.api_url))
                .bearer_auth(&session.token)
                .send()
                .await?;

            if !response.status().is_success() {
                bail!("Failed to fetch status: {}", error_text(response).await);
            }

            let data: Value = response.json().await?;
            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&data)?),
                _ => print_status(&data),
            }
        }

        Commands::Update {
            blood,
            oxygen,
            icu,
            general,
            doctors,
            force,
        } => {
            let session = load_session()?;

            // Hydrate from the current document like the web form does
            let response = client
                .get(format!("{}/api/v1/status", session.api_url))
                .bearer_auth(&session.token)
                .send()
                .await?;
            if !response.status().is_success() {
                bail!("Failed to fetch status: {}", error_text(response).await);
            }
            let current: Value = response.json().await?;
            let form = ResourceForm::default().hydrate(&current["status"])?;

            let form = apply_updates(
                form,
                &blood,
                &[
                    (ResourceField::OxygenCylinders, oxygen.as_ref()),
                    (ResourceField::IcuBeds, icu.as_ref()),
                    (ResourceField::GeneralBeds, general.as_ref()),
                    (ResourceField::DoctorsAvailable, doctors.as_ref()),
                ],
            )?;

            let mut body = serde_json::to_value(&form)?;
            if !force {
                body["ifVersion"] = current["version"].clone();
            }

            let response = client
                .put(format!("{}/api/v1/status", session.api_url))
                .bearer_auth(&session.token)
                .json(&body)
                .send()
                .await?;

            let ok = response.status().is_success();
            let result: Value = response.json().await.unwrap_or_default();
            let notification = &result["notification"];
            let description = notification["description"]
                .as_str()
                .unwrap_or("Failed to update resources");

            if !ok {
                bail!("{}", description);
            }
            println!(
                "{}: {}",
                notification["title"].as_str().unwrap_or("Success"),
                description
            );
        }

        Commands::HashPassword { password } => {
            println!("{}", mediqueue::auth::hash_password(&password));
        }

        Commands::InitConfig { output } => {
            let config = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, config)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", config),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blood_arg() {
        let (t, count) = parse_blood_arg("AB-=12").unwrap();
        assert_eq!(t, BloodType::AbNegative);
        assert_eq!(count, "12");

        assert!(parse_blood_arg("A+").is_err());
        assert!(parse_blood_arg("C+=3").is_err());
    }

    #[test]
    fn test_apply_updates_coerces() {
        let form = ResourceForm::default().with_input(ResourceField::IcuBeds, "4");
        let oxygen = "x".to_string();
        let general = "9".to_string();

        let form = apply_updates(
            form,
            &["O+=7".to_string()],
            &[
                (ResourceField::OxygenCylinders, Some(&oxygen)),
                (ResourceField::GeneralBeds, Some(&general)),
                (ResourceField::DoctorsAvailable, None),
            ],
        )
        .unwrap();

        assert_eq!(form.blood_units.get(BloodType::OPositive), 7);
        assert_eq!(form.oxygen_cylinders, 0);
        assert_eq!(form.general_beds, 9);
        assert_eq!(form.icu_beds, 4);
    }

    #[test]
    fn test_cli_parses_update() {
        let cli = Cli::try_parse_from([
            "mediqueue", "update", "--blood", "A+=5", "--blood", "O-=1", "--icu", "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Update { blood, icu, force, .. } => {
                assert_eq!(blood, vec!["A+=5", "O-=1"]);
                assert_eq!(icu.as_deref(), Some("3"));
                assert!(!force);
            }
            _ => panic!("Expected Update"),
        }
    }
}
