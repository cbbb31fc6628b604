// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Paychannel - USSD mobile-money payments for pay channels.
//!
//! This is the binary entry point: `serve` runs the USSD callback and payment
//! API, the remaining subcommands administer channels and payments directly
//! against the database.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod admin;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use paychannel_config::PaychannelConfig;
use paychannel_core::types::PaymentStatus;
use rust_decimal::Decimal;

/// Paychannel - USSD mobile-money payments for pay channels.
#[derive(Parser, Debug)]
#[command(name = "paychannel", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the USSD callback and payment API server.
    Serve,
    /// Manage pay channels.
    Channel {
        #[command(subcommand)]
        action: ChannelCommands,
    },
    /// Inspect and reconcile payment attempts.
    Payment {
        #[command(subcommand)]
        action: PaymentCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ChannelCommands {
    /// Create a channel and assign it the next USSD code.
    Add {
        #[arg(long)]
        name: String,
        /// Fixed amount charged per payment, in major units.
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = "GHS")]
        currency: String,
        /// Create the channel with USSD access switched off.
        #[arg(long)]
        ussd_disabled: bool,
    },
    /// List channels with their collected totals.
    List,
    /// Allow payments to a channel over USSD.
    Enable { code: String },
    /// Stop accepting USSD payments for a channel.
    Disable { code: String },
}

#[derive(Subcommand, Debug)]
enum PaymentCommands {
    /// Show recent payment attempts, newest first.
    List {
        #[arg(long)]
        status: Option<PaymentStatus>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show one payment attempt.
    Show { reference: String },
    /// Ask the money gateway for the final status of a payment.
    Verify { reference: String },
}

fn load_config(path: Option<&std::path::Path>) -> PaychannelConfig {
    let loaded = match path {
        Some(path) => paychannel_config::load_and_validate_path(path),
        None => paychannel_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            paychannel_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Channel { action }) => match action {
            ChannelCommands::Add {
                name,
                amount,
                currency,
                ussd_disabled,
            } => admin::add_channel(&config, name, amount, currency, !ussd_disabled).await,
            ChannelCommands::List => admin::list_channels(&config).await,
            ChannelCommands::Enable { code } => admin::set_ussd(&config, &code, true).await,
            ChannelCommands::Disable { code } => admin::set_ussd(&config, &code, false).await,
        },
        Some(Commands::Payment { action }) => match action {
            PaymentCommands::List { status, limit } => {
                admin::list_payments(&config, status, limit).await
            }
            PaymentCommands::Show { reference } => admin::show_payment(&config, &reference).await,
            PaymentCommands::Verify { reference } => {
                admin::verify_payment(&config, &reference).await
            }
        },
        None => {
            println!("paychannel: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("paychannel: {e}");
        std::process::exit(1);
    }
}
