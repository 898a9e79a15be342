use crm_core::config::Config;

/// Run the `config` subcommand: print the effective configuration.
pub fn run(config: &Config) -> anyhow::Result<()> {
    let text = config
        .to_toml()
        .map_err(|e| anyhow::anyhow!("could not render config: {e}"))?;
    print!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_renders() {
        assert!(run(&Config::default()).is_ok());
    }

    #[test]
    fn invalid_config_is_reported() {
        let mut config = Config::default();
        config.records.page_size = 0;
        let err = run(&config).unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }
}
