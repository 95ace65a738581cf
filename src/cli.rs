use std::path::PathBuf;

use clap::Parser;

use crate::resource::ResolveConfig;

/// Dynamic Ansible inventory generated from Terraform state.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output the full inventory as a single JSON object
    #[arg(long)]
    pub list: bool,

    /// Output the attributes of the host with this address
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Output an INI-style inventory
    #[arg(long)]
    pub inventory: bool,

    /// Attribute key to resolve addresses from, bypassing the built-in list
    #[arg(long, env = "TF_KEY_NAME")]
    pub address_key: Option<String>,

    /// Attribute key to use as the inventory hostname instead of the address
    #[arg(long, env = "TF_HOSTNAME_KEY_NAME")]
    pub hostname_key: Option<String>,

    /// Path to a state file, or a directory to run `terraform state pull` in
    pub path: Option<PathBuf>,
}

impl Cli {
    /// Resolution overrides with empty strings treated as unset, so an empty
    /// environment variable falls back to default behavior.
    pub fn resolve_config(&self) -> ResolveConfig {
        ResolveConfig {
            address_key: self.address_key.clone().filter(|key| !key.is_empty()),
            hostname_key: self.hostname_key.clone().filter(|key| !key.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_list_mode_flag() {
        let cli = Cli::parse_from(["tfinv", "--list", "terraform.tfstate"]);
        assert!(cli.list);
        assert!(!cli.inventory);
        assert_eq!(cli.host, None);
        assert_eq!(cli.path, Some(PathBuf::from("terraform.tfstate")));
    }

    #[test]
    fn test_host_mode_flag() {
        let cli = Cli::parse_from(["tfinv", "--host=10.0.0.1"]);
        assert_eq!(cli.host, Some("10.0.0.1".to_string()));
        assert_eq!(cli.path, None);
    }

    #[test]
    fn test_inventory_mode_flag() {
        let cli = Cli::parse_from(["tfinv", "--inventory"]);
        assert!(cli.inventory);
    }

    #[test]
    fn test_override_flags() {
        let cli = Cli::parse_from([
            "tfinv",
            "--list",
            "--address-key=ansible_ip",
            "--hostname-key=name",
        ]);
        let config = cli.resolve_config();
        assert_eq!(config.address_key, Some("ansible_ip".to_string()));
        assert_eq!(config.hostname_key, Some("name".to_string()));
    }

    #[test]
    fn test_empty_override_treated_as_unset() {
        let cli = Cli::parse_from(["tfinv", "--list", "--address-key=", "--hostname-key="]);
        let config = cli.resolve_config();
        assert_eq!(config.address_key, None);
        assert_eq!(config.hostname_key, None);
    }

    #[test]
    #[serial]
    fn test_address_key_from_env() {
        let backup = std::env::var("TF_KEY_NAME").ok();
        unsafe {
            std::env::set_var("TF_KEY_NAME", "env_key");
        }

        let cli = Cli::parse_from(["tfinv", "--list"]);

        unsafe {
            match backup {
                Some(value) => std::env::set_var("TF_KEY_NAME", value),
                None => std::env::remove_var("TF_KEY_NAME"),
            }
        }

        assert_eq!(cli.address_key, Some("env_key".to_string()));
    }

    #[test]
    #[serial]
    fn test_cli_flag_takes_precedence_over_env() {
        let backup = std::env::var("TF_HOSTNAME_KEY_NAME").ok();
        unsafe {
            std::env::set_var("TF_HOSTNAME_KEY_NAME", "env_name");
        }

        let cli = Cli::parse_from(["tfinv", "--list", "--hostname-key=cli_name"]);

        unsafe {
            match backup {
                Some(value) => std::env::set_var("TF_HOSTNAME_KEY_NAME", value),
                None => std::env::remove_var("TF_HOSTNAME_KEY_NAME"),
            }
        }

        assert_eq!(cli.hostname_key, Some("cli_name".to_string()));
    }
}
