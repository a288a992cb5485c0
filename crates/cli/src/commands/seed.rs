//! Seed accounts, customers and product models.
//!
//! The YAML file mirrors [`SeedFile`]:
//!
//! ```yaml
//! users:
//!   - username: kho
//!     fullName: Thủ Kho
//!     role: prod
//!     password: doi-mat-khau
//! customers:
//!   - name: LA CAMIE
//!     code: LC
//!     debtDays: 45
//! models:
//!   - itemCode: B0200
//!     gender: Nữ
//! ```
//!
//! Entries that already exist are skipped, so the command can be re-run.

use std::path::Path;

use secrecy::ExposeSecret;
use tracing::info;

use binh_vuong_admin::services::{SeedFile, seed};

use super::open_state;

/// Seed from `file`, the built-in defaults, or both.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the database is
/// unreachable, or a seed entry is rejected.
pub async fn run(file: Option<&str>, defaults: bool) -> Result<(), Box<dyn std::error::Error>> {
    if file.is_none() && !defaults {
        return Err("nothing to seed: pass a file, --defaults, or both".into());
    }

    // Parse before connecting so a bad file fails fast
    let parsed = match file {
        Some(file_path) => {
            let path = Path::new(file_path);
            if !path.exists() {
                return Err(format!("File not found: {file_path}").into());
            }
            info!(path = %file_path, "Loading seed file");
            let content = tokio::fs::read_to_string(path).await?;
            Some(SeedFile::from_yaml(&content)?)
        }
        None => None,
    };

    let state = open_state().await?;

    if defaults {
        let password = state.config().seed_password.expose_secret().to_string();
        let report = seed(&state, SeedFile::defaults(&password)).await?;
        info!(?report, "Default data seeded");
    }
    if let Some(parsed) = parsed {
        let report = seed(&state, parsed).await?;
        info!(?report, "Seed file applied");
    }
    Ok(())
}
