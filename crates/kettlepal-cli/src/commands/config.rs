use clap::Subcommand;
use kettlepal_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting by its dotted key
    Get {
        /// Dotted key such as "api.endpoint" or "composer.default_weight_unit"
        key: String,
    },
    /// Change one setting and write config.toml ("none" unsets optional keys)
    Set {
        /// Dotted key
        key: String,
        /// Value, parsed as the key's type
        value: String,
    },
    /// Dump every setting as JSON
    List,
    /// Overwrite config.toml with the built-in defaults
    Reset,
    /// Show where config.toml lives
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            Config::load()?.set(&key, &value)?;
            tracing::debug!(%key, %value, "setting updated");
            println!("ok");
        }
        ConfigAction::List => {
            println!("{}", serde_json::to_string_pretty(&Config::load()?)?);
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("settings restored to defaults");
        }
        ConfigAction::Path => println!("{}", Config::path()?.display()),
    }
    Ok(())
}
