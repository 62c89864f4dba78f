//! Offline helper for the XRP codec library
//!
//! Reads its configuration from the environment (or `.env`):
//!
//! - `XRPL_SEED`: family seed, required
//! - `XRPL_DESTINATION`: when set, a Payment to this address is signed
//! - `XRPL_AMOUNT_DROPS`: payment amount, required with a destination
//! - `XRPL_FEE_DROPS`: fee, default 12
//! - `XRPL_SEQUENCE`: account sequence, required with a destination
//! - `XRPL_LAST_LEDGER_SEQUENCE`: optional
//!
//! Nothing is submitted; the signed blob is printed for use with any client.

use std::env;
use std::str::FromStr;

use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use xrp_codec::{AccountId, KeyPair, Payment, Seed, Transaction, XrpAmount, XrpError};

const DEFAULT_FEE_DROPS: i64 = 12;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let seed: Seed = required_var("XRPL_SEED")?;
    let key_pair = seed.key_pair()?;
    println!("Key type:   {}", key_pair.key_type());
    println!("Public key: {}", key_pair.public_key_hex());
    println!("Address:    {}", key_pair.account_id());

    if env::var("XRPL_DESTINATION").is_ok() {
        sign_payment(&key_pair)?;
    } else {
        info!("XRPL_DESTINATION not set, skipping payment signing");
    }
    Ok(())
}

fn sign_payment(key_pair: &KeyPair) -> Result<(), Box<dyn std::error::Error>> {
    let destination: AccountId = required_var("XRPL_DESTINATION")?;
    let amount = XrpAmount::from_drops(required_var("XRPL_AMOUNT_DROPS")?)?;
    let fee = XrpAmount::from_drops(optional_var("XRPL_FEE_DROPS")?.unwrap_or(DEFAULT_FEE_DROPS))?;

    let mut tx = Transaction::new(key_pair.account_id(), Payment::new(destination, amount.into()));
    tx.common.fee = Some(fee);
    tx.common.sequence = Some(required_var("XRPL_SEQUENCE")?);
    tx.common.last_ledger_sequence = optional_var("XRPL_LAST_LEDGER_SEQUENCE")?;

    info!("signing payment of {} to {}", amount, destination);
    let signed = tx.sign(key_pair)?;

    println!("Hash:       {}", signed.hash);
    println!("Blob:       {}", signed.blob_hex());
    println!("{}", serde_json::to_string_pretty(&tx.to_json())?);
    Ok(())
}

fn optional_var<T>(name: &str) -> Result<Option<T>, XrpError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(text) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| XrpError::Format(format!("{}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

fn required_var<T>(name: &str) -> Result<T, XrpError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_var(name)?.ok_or_else(|| XrpError::Format(format!("{} must be set", name)))
}
