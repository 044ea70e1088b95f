use sqlmigrate_config::MigrateConfig;
use sqlmigrate_db::MigrationStatus;

const WIDTH: usize = 64;

/// Print the ledger summary and the pending scripts.
pub fn print_status(status: &MigrationStatus, config: &MigrateConfig) {
    for line in render_status(status, config) {
        println!("{line}");
    }
}

pub fn render_status(status: &MigrationStatus, config: &MigrateConfig) -> Vec<String> {
    let inner = WIDTH - 4;
    let row = |text: &str| format!("│ {:<inner$} │", truncate(text, inner));

    let title = " Migration status ";
    let top = format!("╭─{title}{}╮", "─".repeat(WIDTH - 3 - title.chars().count()));
    let bottom = format!("╰{}╯", "─".repeat(WIDTH - 2));

    let current = match &status.current {
        Some(record) => format!(
            "{} (applied {})",
            record.version,
            record.applied_at.format("%Y-%m-%d %H:%M:%S")
        ),
        None => "none".to_string(),
    };

    let mut lines = vec![
        top,
        row(&format!("Database    {}", config.dsn.as_deref().unwrap_or("-"))),
        row(&format!("Directory   {}", config.dir.display())),
        row(&format!("Ledger      {}", config.table)),
        row(&format!("Current     {current}")),
        row(&format!("Applied     {}", status.applied.len())),
        row(&format!("Pending     {}", status.pending.len())),
    ];

    if let Some(version) = status.dirty {
        lines.push(row(""));
        lines.push(row(&format!("DIRTY       version {version} failed to apply")));
        lines.push(row(&format!(
            "            fix it, then `sqlmigrate clear-dirty {version}`"
        )));
    }

    if !status.pending.is_empty() {
        lines.push(row(""));
        for script in &status.pending {
            lines.push(row(&format!("  pending   {}", script.file_name)));
        }
    }

    lines.push(bottom);
    lines
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
