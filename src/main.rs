// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin Provisioner CLI
//!
//! Ensures the application's administrator account exists in Firebase Auth
//! and that its Firestore profile carries the admin role and VIP tier.

use admin_provisioner::{
    config::{self, Config, TargetConfig},
    db::{FirestoreDb, ProfileStore},
    error::AppError,
    models::{Profile, Role, SubscriptionTier},
    services::{
        credentials::MIN_PASSWORD_LENGTH, CredentialResolver, Credentials, IdentityToolkitClient,
        ReconcileMode, ReconcileOptions, ReconcileReport, UNASSIGNED_UID,
    },
    AppReconciler,
};
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "admin-provisioner", version, about)]
struct Cli {
    #[command(flatten)]
    target: TargetArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Email of the admin account
    #[arg(long, env = "ADMIN_EMAIL", global = true)]
    email: Option<String>,

    /// Password of the admin account
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Display name for the account and profile
    #[arg(long, env = "ADMIN_DISPLAY_NAME", default_value = "Admin", global = true)]
    display_name: String,

    /// Desired profile role
    #[arg(long, env = "ADMIN_ROLE", default_value = "admin", global = true)]
    role: Role,

    /// Desired subscription tier
    #[arg(long, env = "ADMIN_TIER", default_value = "vip", global = true)]
    tier: SubscriptionTier,

    /// Length of generated passwords
    #[arg(
        long,
        env = "ADMIN_PASSWORD_LENGTH",
        default_value_t = MIN_PASSWORD_LENGTH,
        global = true
    )]
    password_length: usize,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or repair the admin account and profile
    Ensure {
        /// Generate a random email and password instead of using fixed ones
        #[arg(long)]
        generate: bool,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// Set the configured password on an existing account
        #[arg(long)]
        reset_password: bool,
    },

    /// Show the account and profile for the admin email
    Show,

    /// List all profiles
    List,

    /// Delete the admin profile and account
    Delete {
        /// Account uid to delete instead of looking up the email
        #[arg(long)]
        uid: Option<String>,
    },

    /// Sign in with the admin credentials
    VerifySignIn,

    /// Print a generated set of credentials
    GenerateCredentials,
}

impl TargetArgs {
    fn resolver(&self, config: &Config, generate: bool) -> Result<CredentialResolver, AppError> {
        if generate {
            return Ok(CredentialResolver::Generated {
                domain: config.admin_email_domain.clone(),
                password_length: self.password_length,
            });
        }

        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Ok(CredentialResolver::Fixed(Credentials {
                email: email.clone(),
                password: password.clone(),
                display_name: self.display_name.clone(),
            })),
            _ => Err(AppError::Validation(
                "ADMIN_EMAIL and ADMIN_PASSWORD are required unless --generate is set".to_string(),
            )),
        }
    }

    fn target(&self, config: &Config, generate: bool) -> Result<TargetConfig, AppError> {
        let credentials = self.resolver(config, generate)?.resolve();
        TargetConfig::new(credentials, self.role, self.tier)
    }

    fn email(&self) -> Result<&str, AppError> {
        self.email
            .as_deref()
            .ok_or_else(|| AppError::Validation("ADMIN_EMAIL (or --email) is required".to_string()))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before clap reads env fallbacks
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::GenerateCredentials => {
            let credentials = CredentialResolver::Generated {
                domain: config::admin_email_domain(),
                password_length: cli.target.password_length,
            }
            .resolve();
            print_credentials(&credentials.email, &credentials.password);
        }
        Command::Ensure {
            generate,
            dry_run,
            reset_password,
        } => {
            let config = Config::from_env()?;
            let target = cli.target.target(&config, generate)?;
            let reconciler = connect(&config).await?;
            let options = ReconcileOptions {
                mode: if dry_run {
                    ReconcileMode::DryRun
                } else {
                    ReconcileMode::Apply
                },
                reset_password,
            };
            let report = reconciler.run(&target, options).await?;
            print_report(&report);
            if generate && report.account_created && !dry_run {
                print_credentials(&target.email, &target.password);
            }
        }
        Command::Show => {
            let config = Config::from_env()?;
            let reconciler = connect(&config).await?;
            let (account, profile) = reconciler.inspect(cli.target.email()?).await?;
            println!("Account:");
            println!("  uid:            {}", account.uid);
            println!("  email:          {}", account.email);
            println!(
                "  display name:   {}",
                account.display_name.as_deref().unwrap_or("-")
            );
            println!("  email verified: {}", account.email_verified);
            match profile {
                Some(profile) => print_profile(&account.uid, &profile),
                None => println!("Profile: <missing>"),
            }
        }
        Command::List => {
            let config = Config::from_env()?;
            let reconciler = connect(&config).await?;
            let profiles = reconciler.store().list_profiles().await?;
            println!("{:<30} {:<40} {:<6} {:<8}", "UID", "EMAIL", "ROLE", "TIER");
            for profile in &profiles {
                println!(
                    "{:<30} {:<40} {:<6} {:<8}",
                    profile.uid,
                    profile.email,
                    display_or_unset(profile.role),
                    display_or_unset(profile.subscription_tier)
                );
            }
            println!("{} profile(s)", profiles.len());
        }
        Command::Delete { uid } => {
            let config = Config::from_env()?;
            let reconciler = connect(&config).await?;
            match uid {
                Some(uid) => {
                    reconciler.teardown(&uid).await?;
                    println!("Deleted account and profile {}", uid);
                }
                None => {
                    let email = cli.target.email()?;
                    if reconciler.teardown_by_email(email).await? {
                        println!("Deleted account and profile for {}", email);
                    } else {
                        println!("No account registered for {}", email);
                    }
                }
            }
        }
        Command::VerifySignIn => {
            let config = Config::from_env()?;
            let target = cli.target.target(&config, false)?;
            let reconciler = connect(&config).await?;
            let account = reconciler.verify_sign_in(&target).await?;
            println!("Signed in as {} ({})", account.email, account.uid);
        }
    }

    Ok(())
}

/// Connect to Firestore and the Identity Toolkit API.
async fn connect(config: &Config) -> Result<AppReconciler, AppError> {
    tracing::info!(project = %config.gcp_project_id, "Connecting to Firebase project");

    let db = FirestoreDb::new(&config.gcp_project_id).await?;
    let identity =
        IdentityToolkitClient::new(&config.gcp_project_id, config.firebase_api_key.clone())
            .await?;
    Ok(AppReconciler::new(identity, db))
}

fn print_report(report: &ReconcileReport) {
    let states: Vec<String> = report.states.iter().map(|s| s.to_string()).collect();
    let verb = match report.mode {
        ReconcileMode::Apply => "performed",
        ReconcileMode::DryRun => "planned",
    };

    println!("States: {}", states.join(" -> "));
    match &report.account {
        Some(account) => println!(
            "Account: {} ({}){}",
            account.email,
            account.uid,
            if report.account_created { " [created]" } else { "" }
        ),
        None => println!("Account: <would be created>"),
    }
    if report.password_reset {
        println!("Password: reset");
    }
    print_profile(report.uid().unwrap_or(UNASSIGNED_UID), &report.profile);
    if report.is_noop() {
        println!("Already up to date, no writes {}", verb);
    } else {
        println!("{} write(s) {}", report.writes, verb);
    }
}

fn print_profile(uid: &str, profile: &Profile) {
    println!("Profile:");
    println!("  uid:          {}", uid);
    println!("  display name: {}", profile.display_name);
    println!("  role:         {}", display_or_unset(profile.role));
    println!("  tier:         {}", display_or_unset(profile.subscription_tier));
    println!("  created at:   {}", profile.created_at);
    println!("  streak days:  {}", profile.streak_days);
}

/// Stored enum value, or `-` when missing or unrecognized.
fn display_or_unset<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn print_credentials(email: &str, password: &str) {
    println!("Generated credentials (store these now, the password is not shown again):");
    println!("  email:    {}", email);
    println!("  password: {}", password);
}

/// Print the error, its source chain and any remediation hint.
fn report_error(err: &AppError) {
    tracing::error!(error = %err, "Admin provisioner failed");

    eprintln!("ERROR: {}", err);
    let mut source = std::error::Error::source(err);
    if source.is_some() {
        eprintln!("\nError details:");
        while let Some(cause) = source {
            eprintln!("  - {}", cause);
            source = cause.source();
        }
    }
    if let Some(hint) = err.remediation_hint() {
        eprintln!("\nHint: {}", hint);
    }
}

/// Initialize logging on stderr: human-readable by default, JSON with LOG_FORMAT=json.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("admin_provisioner=debug,info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        let format = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_current_span(true)
            .flatten_event(true);
        tracing_subscriber::registry().with(filter).with(format).init();
    } else {
        let format = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);
        tracing_subscriber::registry().with(filter).with(format).init();
    }
}
