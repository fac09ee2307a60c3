use crate::error::Result;
use crate::settings::{load_settings, log_path, save_settings};

pub fn run(
    api_url: Option<String>,
    export_dir: Option<String>,
    timeout: Option<u64>,
) -> Result<()> {
    let mut settings = load_settings();
    let changed = api_url.is_some() || export_dir.is_some() || timeout.is_some();

    if let Some(url) = api_url {
        settings.api_url = url;
    }
    if let Some(dir) = export_dir {
        settings.export_dir = dir;
    }
    if let Some(secs) = timeout {
        settings.timeout_secs = secs;
    }
    if changed {
        save_settings(&settings)?;
        println!("Settings saved.");
    }

    println!("API URL:     {}", settings.api_url);
    println!("Export dir:  {}", settings.export_path().display());
    println!("Timeout:     {}s", settings.timeout().as_secs());
    println!("Log file:    {}", log_path().display());
    Ok(())
}
