use crate::{Config, config::ProviderStatus};
use std::fmt::Write;

pub fn handle_check_config(config: &Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let report = if json {
        serde_json::to_string_pretty(&config.status())?
    } else {
        render_report(config)?
    };
    println!("{report}");
    Ok(())
}

fn render_report(config: &Config) -> Result<String, std::fmt::Error> {
    let status = config.status();
    let mut out = String::new();

    writeln!(out, "Configuration status")?;
    render_provider(&mut out, "GitHub OAuth", &status.github_oauth)?;
    render_provider(&mut out, "Google OAuth", &status.google_oauth)?;
    writeln!(out, "  SMTP delivery:  {}", yes_no(status.email.smtp_configured))?;
    writeln!(out, "  Admin login:    {}", yes_no(status.admin_enabled))?;
    writeln!(out, "  Metrics:        {}", yes_no(status.metrics_enabled))?;
    writeln!(out, "  Content file:   {}", config.content.path.display())?;
    write!(out, "  Uploads dir:    {}", config.content.uploads_dir.display())?;
    Ok(out)
}

fn render_provider(out: &mut String, label: &str, provider: &ProviderStatus) -> std::fmt::Result {
    writeln!(
        out,
        "  {label}: client_id {}, client_secret {}, redirect_uri {}",
        yes_no(provider.client_id_configured),
        yes_no(provider.client_secret_configured),
        provider.redirect_uri.as_deref().unwrap_or("(unset)")
    )
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
