//! Validate command implementation

use anyhow::Result;
use canonset::ErrorKind;

use crate::utils::parse_hex;

/// Run the validate command. Fails when the input is not a canonical encoding.
pub fn run(hex: String) -> Result<()> {
    let bytes = parse_hex(&hex)?;
    match canonset::validate_encoding(&bytes) {
        Ok(()) => {
            println!("valid");
            Ok(())
        }
        Err(e) => {
            let kind = match e.kind() {
                ErrorKind::Malformed { .. } => "malformed",
                ErrorKind::CanonViolation { .. } => "canon violation",
                ErrorKind::UnsupportedFormat { .. } => "unsupported format",
                ErrorKind::Capacity { .. } => "capacity",
                _ => "invalid",
            };
            println!("{kind}: {e}");
            anyhow::bail!("Rejected encoding ({kind})")
        }
    }
}
