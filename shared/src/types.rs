/// Workspace-wide result type for outer layers (startup, CLI, config).
pub type Result<T> = anyhow::Result<T>;
