use clap::Subcommand;
use eyebreak_core::storage::SettingsStore;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print all settings as JSON
    Show,
    /// Print a single settings value
    Get { key: String },
    /// Set a settings value (work_minutes, rest_seconds, auto_start, theme)
    Set { key: String, value: String },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = SettingsStore::open()?;
    let mut settings = store.load()?;

    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigAction::Get { key } => {
            let value = settings
                .get(&key)
                .ok_or_else(|| format!("unknown settings key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            settings.set(&key, &value)?;
            store.save(&settings)?;
            println!("{key} = {value}");
        }
    }

    Ok(())
}
