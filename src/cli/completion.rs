//! Shell completion generation for wpcsv
//!
//! Generates completion scripts for bash, zsh, fish, and PowerShell, with
//! dynamic completion of content type names fetched from the configured site.

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::cli::CliArgs;
use crate::error::{ConfigError, ExportError, Result};

const BIN_NAME: &str = "wpcsv";

/// Generate shell completion script and print it to stdout
///
/// # Arguments
/// * `shell_name` - Shell type (bash, zsh, fish, powershell)
///
/// # Returns
/// * `Result<()>` - Success or error
pub fn generate_completion(shell_name: &str) -> Result<()> {
    let shell = parse_shell(shell_name)?;
    print!("{}", completion_script(shell));
    Ok(())
}

/// Build the completion script for `shell`
pub fn completion_script(shell: Shell) -> String {
    let mut cmd = CliArgs::command();
    let mut buffer = Vec::new();
    generate(shell, &mut cmd, BIN_NAME, &mut buffer);
    let basic = String::from_utf8_lossy(&buffer).into_owned();

    match shell {
        Shell::Bash => format!("{}{}", basic, BASH_CONTENT_TYPES),
        Shell::Fish => format!("{}{}", basic, FISH_CONTENT_TYPES),
        _ => basic,
    }
}

/// Parse shell name string to Shell enum
fn parse_shell(shell_name: &str) -> Result<Shell> {
    match shell_name.to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        "powershell" | "pwsh" => Ok(Shell::PowerShell),
        _ => Err(ExportError::Config(ConfigError::InvalidValue {
            field: "shell".to_string(),
            value: format!(
                "{} (supported shells: bash, zsh, fish, powershell)",
                shell_name
            ),
        })),
    }
}

const BASH_CONTENT_TYPES: &str = r#"
# Complete content type names for `fields` and `export`
_wpcsv_content_types() {
    wpcsv -q types 2>/dev/null | awk 'NR>3 && $2 != "" {print $2}'
}

_wpcsv_enhanced() {
    local cur prev words cword
    _init_completion || return

    if [[ "${words[1]}" == "fields" || "${words[1]}" == "export" ]] && [[ $cword -eq 2 ]]; then
        COMPREPLY=($(compgen -W "$(_wpcsv_content_types)" -- "$cur"))
        return 0
    fi

    _wpcsv "$@"
}

complete -F _wpcsv_enhanced wpcsv
"#;

const FISH_CONTENT_TYPES: &str = r#"
# Complete content type names for `fields` and `export`
function __wpcsv_content_types
    wpcsv -q types 2>/dev/null | awk 'NR>3 && $2 != "" {print $2}'
end

complete -c wpcsv -n "__fish_seen_subcommand_from fields export" -f -a "(__wpcsv_content_types)"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shell() {
        assert!(matches!(parse_shell("bash"), Ok(Shell::Bash)));
        assert!(matches!(parse_shell("zsh"), Ok(Shell::Zsh)));
        assert!(matches!(parse_shell("fish"), Ok(Shell::Fish)));
        assert!(matches!(parse_shell("powershell"), Ok(Shell::PowerShell)));
        assert!(parse_shell("invalid").is_err());
    }

    #[test]
    fn test_parse_shell_case_insensitive() {
        assert!(matches!(parse_shell("BASH"), Ok(Shell::Bash)));
        assert!(matches!(parse_shell("Zsh"), Ok(Shell::Zsh)));
        assert!(matches!(parse_shell("FiSh"), Ok(Shell::Fish)));
    }

    #[test]
    fn test_completion_script_mentions_subcommands() {
        let script = completion_script(Shell::Bash);
        assert!(script.contains("wpcsv"));
        assert!(script.contains("export"));
        assert!(script.contains("_wpcsv_content_types"));

        let zsh = completion_script(Shell::Zsh);
        assert!(zsh.contains("preview"));
    }
}
