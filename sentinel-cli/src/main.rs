//! sentinel - developer CLI for the dead man's switch vault
//!
//! Drives a local registry persisted as a JSON file. Every invocation is one
//! transaction: load the state, run one operation, save the state and print
//! the result as JSON. `--now-ms` pins the ledger clock so a whole heartbeat
//! timeline can be replayed from a shell script.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use eyre::{eyre, Result};
use sentinel_core::{
    AccountId, Amount, Clock, ManualClock, MemoryVaultStore, Sentinel, SystemClock,
    TransferOutbox,
};
use serde_json::{json, Value};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod state;

use state::{default_state_path, State};

/// sentinel - dead man's switch vault
#[derive(Parser, Debug)]
#[command(name = "sentinel")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the state file [default: <data_dir>/sentinel/state.json]
    #[arg(long, global = true, env = "SENTINEL_STATE")]
    state: Option<PathBuf>,

    /// Account making the call
    #[arg(long, global = true, env = "SENTINEL_CALLER")]
    caller: Option<String>,

    /// Pin the ledger clock to this many milliseconds since the epoch
    #[arg(long, global = true)]
    now_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Configure the registry (creates the state file if needed)
    Init {
        /// Account allowed to relay heartbeats; omit to remove the agent
        #[arg(long)]
        agent: Option<String>,
    },

    // === Owner operations (require --caller) ===
    /// Create a vault owned by the caller
    SetupVault {
        /// Beneficiary account
        beneficiary: String,

        /// Heartbeat interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Grace period in milliseconds
        #[arg(long)]
        grace_period_ms: Option<u64>,
    },

    /// Prove the caller is alive
    Ping,

    /// Deposit into the caller's vault
    Deposit {
        /// Amount in the smallest unit, decimal
        amount: String,
    },

    /// Withdraw from the caller's vault (everything if no amount is given)
    Withdraw {
        /// Amount in the smallest unit, decimal
        amount: Option<String>,
    },

    /// Change the beneficiary
    UpdateBeneficiary {
        /// New beneficiary account
        beneficiary: String,
    },

    /// Change the heartbeat interval
    UpdateInterval {
        /// New interval in milliseconds
        interval_ms: u64,
    },

    /// Change the grace period
    UpdateGracePeriod {
        /// New grace period in milliseconds
        grace_period_ms: u64,
    },

    /// Delete the caller's vault and refund the balance
    ResetVault,

    // === Trigger protocol (any caller) ===
    /// Raise the inactivity warning for an account
    RaiseWarning {
        /// Vault owner
        account_id: String,
    },

    /// Start the yield once the grace period is over
    PulseCheck {
        /// Vault owner
        account_id: String,
    },

    /// End the yield: revive the vault or release it to the beneficiary
    ResumePulse {
        /// Vault owner
        account_id: String,

        /// Confirm death and release the balance
        #[arg(long)]
        confirm_death: bool,
    },

    /// Refresh an owner's heartbeat as the configured agent (requires --caller)
    AgentPing {
        /// Vault owner
        account_id: String,
    },

    // === Queries ===
    /// Show one vault
    GetVault {
        /// Vault owner
        account_id: String,
    },

    /// List vault owners
    #[command(alias = "ls")]
    GetAllVaults {
        /// Skip this many owners
        #[arg(long)]
        from_index: Option<usize>,

        /// Return at most this many owners
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Count vaults
    GetVaultCount,

    /// Show transfers awaiting settlement
    Outbox {
        /// Remove them from the outbox
        #[arg(long)]
        drain: bool,
    },
}

impl Command {
    const fn is_query(&self) -> bool {
        matches!(
            self,
            Self::GetVault { .. }
                | Self::GetAllVaults { .. }
                | Self::GetVaultCount
                | Self::Outbox { drain: false }
        )
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let output = run(cli)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run(cli: Cli) -> Result<Value> {
    let path = cli
        .state
        .or_else(default_state_path)
        .ok_or_else(|| eyre!("no data directory on this platform; pass --state"))?;
    let mut state = State::load(&path)?;

    let clock: Arc<dyn Clock> = match cli.now_ms {
        Some(millis) => Arc::new(ManualClock::at_millis(millis)),
        None => Arc::new(SystemClock::new()),
    };
    let outbox = Arc::new(TransferOutbox::with_pending(std::mem::take(&mut state.outbox)));
    let store = MemoryVaultStore::from_vaults(std::mem::take(&mut state.vaults))?;
    let mut sentinel =
        Sentinel::new(store, clock, outbox.clone()).with_agent(state.agent.clone());

    let caller = cli.caller.map(AccountId::new).transpose()?;
    let read_only = cli.command.is_query();
    let output = match cli.command {
        Command::Init { agent } => {
            state.agent = agent.map(AccountId::new).transpose()?;
            tracing::info!(path = %path.display(), "registry initialized");
            json!({ "state": path.display().to_string(), "agent": state.agent })
        }
        Command::Outbox { drain } => {
            let transfers = if drain {
                outbox.drain()?
            } else {
                outbox.pending()?
            };
            serde_json::to_value(transfers)?
        }
        command => execute(&mut sentinel, caller.as_ref(), command)?,
    };

    if !read_only {
        state.vaults = sentinel.into_store().to_vaults();
        state.outbox = outbox.pending()?;
        state.save(&path)?;
    }
    Ok(output)
}

/// Runs one vault operation and renders its result.
fn execute(
    sentinel: &mut Sentinel,
    caller: Option<&AccountId>,
    command: Command,
) -> Result<Value> {
    let caller = || caller.ok_or_else(|| eyre!("this command needs --caller (or SENTINEL_CALLER)"));

    let output = match command {
        Command::SetupVault {
            beneficiary,
            interval_ms,
            grace_period_ms,
        } => serde_json::to_value(sentinel.setup_vault(
            caller()?,
            &beneficiary,
            interval_ms,
            grace_period_ms,
        )?)?,
        Command::Ping => {
            sentinel.ping(caller()?)?;
            json!({})
        }
        Command::Deposit { amount } => {
            let amount = Amount::try_from_decimal_string(&amount)?;
            serde_json::to_value(sentinel.deposit(caller()?, amount)?)?
        }
        Command::Withdraw { amount } => {
            let amount = amount
                .map(|amount| Amount::try_from_decimal_string(&amount))
                .transpose()?;
            serde_json::to_value(sentinel.withdraw(caller()?, amount)?)?
        }
        Command::UpdateBeneficiary { beneficiary } => {
            sentinel.update_beneficiary(caller()?, &beneficiary)?;
            json!({})
        }
        Command::UpdateInterval { interval_ms } => {
            sentinel.update_interval(caller()?, interval_ms)?;
            json!({})
        }
        Command::UpdateGracePeriod { grace_period_ms } => {
            sentinel.update_grace_period(caller()?, grace_period_ms)?;
            json!({})
        }
        Command::ResetVault => serde_json::to_value(sentinel.reset_vault(caller()?)?)?,
        Command::RaiseWarning { account_id } => {
            serde_json::to_value(sentinel.raise_warning(&AccountId::new(account_id)?)?)?
        }
        Command::PulseCheck { account_id } => {
            serde_json::to_value(sentinel.pulse_check(&AccountId::new(account_id)?)?)?
        }
        Command::ResumePulse {
            account_id,
            confirm_death,
        } => serde_json::to_value(sentinel.resume_pulse(&AccountId::new(account_id)?, confirm_death)?)?,
        Command::AgentPing { account_id } => {
            sentinel.agent_ping(caller()?, &AccountId::new(account_id)?)?;
            json!({})
        }
        Command::GetVault { account_id } => {
            serde_json::to_value(sentinel.get_vault(&AccountId::new(account_id)?)?)?
        }
        Command::GetAllVaults { from_index, limit } => {
            serde_json::to_value(sentinel.get_all_vaults(from_index, limit)?)?
        }
        Command::GetVaultCount => {
            let count = sentinel.get_vault_count()?;
            json!({ "count": count })
        }
        Command::Init { .. } | Command::Outbox { .. } => {
            return Err(eyre!("registry command dispatched as a vault operation"));
        }
    };
    Ok(output)
}
