use crate::types::Result;
use dialoguer::Confirm;

/// Ask before a destructive action. `assume_yes` answers for the user.
pub fn confirm_action(action: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let confirmed = Confirm::new()
        .with_prompt(format!("{action}?"))
        .default(false)
        .show_default(true)
        .interact()?;
    if !confirmed {
        tracing::info!("declined: {action}");
    }
    Ok(confirmed)
}
