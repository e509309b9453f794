mod config;
mod fee_cmd;
mod simulate_cmd;
mod tree_cmd;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use rootgate_core::collaborators::RegistryConfig;
use rootgate_store::Address;

#[derive(Parser)]
#[command(name = "rootgate", about = "Merkle-committed task pre-authorization toolkit")]
struct Cli {
    /// Config file path (overrides ROOTGATE_CONFIG env var)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter config file
    Init {
        /// Account owner address
        #[arg(long)]
        owner: Address,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Build the Merkle tree for a task manifest and print root, leaves and proofs
    Tree {
        /// Path to the task TOML file
        file: PathBuf,
    },
    /// Check a leaf against a root with a sibling proof
    Verify {
        /// Merkle root (0x-prefixed hex)
        #[arg(long)]
        root: String,
        /// Leaf hash (0x-prefixed hex)
        #[arg(long)]
        leaf: String,
        /// Comma-separated sibling hashes, leaf to root
        #[arg(long, value_delimiter = ',')]
        proof: Vec<String>,
    },
    /// Compact fee encoding
    Fee {
        #[command(subcommand)]
        command: FeeCommands,
    },
    /// Register a task manifest in an in-process engine and replay its steps
    Simulate {
        /// Path to the task TOML file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum FeeCommands {
    /// Compress a decimal amount
    Encode {
        /// Amount in the token's smallest unit
        amount: String,
        /// Round up instead of truncating (used for maximum fees)
        #[arg(long)]
        round_up: bool,
    },
    /// Decode a raw 48-bit value (decimal or 0x hex)
    Decode { raw: String },
}

/// Execute the `rootgate init` command: write config file.
fn cmd_init(cli_path: Option<&Path>, owner: Address, force: bool) -> anyhow::Result<()> {
    let path = config::config_path(cli_path);

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        account: config::AccountSection { owner },
        registry: RegistryConfig::default(),
    };
    config::save_config(&path, &cfg)?;

    println!("Config written to {}", path.display());
    println!("  account.owner = {owner}");
    println!();
    println!("Next: add executors and fee tokens under [registry] before simulating.");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { owner, force } => {
            cmd_init(config_path, owner, force)?;
        }
        Commands::Tree { file } => {
            tree_cmd::run_tree(&file)?;
        }
        Commands::Verify { root, leaf, proof } => {
            tree_cmd::run_verify(&root, &leaf, &proof)?;
        }
        Commands::Fee { command } => {
            let report = match command {
                FeeCommands::Encode { amount, round_up } => fee_cmd::encode(&amount, round_up)?,
                FeeCommands::Decode { raw } => fee_cmd::decode(&raw)?,
            };
            fee_cmd::print(&report)?;
        }
        Commands::Simulate { file } => {
            simulate_cmd::run_simulate(config_path, &file).await?;
        }
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verify_accepts_comma_separated_proof() {
        let cli = Cli::parse_from([
            "rootgate", "verify", "--root", "0x01", "--leaf", "0x02", "--proof", "0x03,0x04",
        ]);
        match cli.command {
            Commands::Verify { proof, .. } => assert_eq!(proof, vec!["0x03", "0x04"]),
            _ => panic!("expected verify"),
        }
    }

    #[test]
    fn init_writes_config_and_refuses_overwrite() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        let owner = Address::from_low_u8(7);

        cmd_init(Some(&path), owner, false).unwrap();
        assert_eq!(config::load_config(&path).unwrap().account.owner, owner);

        let err = cmd_init(Some(&path), owner, false).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        cmd_init(Some(&path), Address::from_low_u8(8), true).unwrap();
        assert_eq!(
            config::load_config(&path).unwrap().account.owner,
            Address::from_low_u8(8)
        );
    }

    #[test]
    fn init_rejects_malformed_owner() {
        assert!(Cli::try_parse_from(["rootgate", "init", "--owner", "0x12"]).is_err());
    }
}
