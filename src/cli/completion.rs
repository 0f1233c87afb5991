//! Shell completion generation for mongotask
//!
//! Generates completion scripts for bash, zsh and fish, with the supported
//! tool names offered for `mongotask probe`.

use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io::{self, Write};

use crate::cli::CliArgs;
use crate::error::{ConfigError, MongoTaskError, Result};
use crate::task::MongoTool;

/// Generate shell completion script on stdout
pub fn generate_completion(shell_name: &str) -> Result<()> {
    let shell = parse_shell(shell_name)?;
    write_completion(shell, &mut io::stdout())
}

/// Parse shell name string to Shell enum
fn parse_shell(shell_name: &str) -> Result<Shell> {
    match shell_name.to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        _ => Err(MongoTaskError::Config(ConfigError::Generic(format!(
            "Unsupported shell: {}. Supported shells: bash, zsh, fish",
            shell_name
        )))),
    }
}

/// Write the completion script for `shell` into `out`
pub fn write_completion<W: Write>(shell: Shell, out: &mut W) -> Result<()> {
    let mut cmd = CliArgs::command();
    generate(shell, &mut cmd, "mongotask", out);

    let tools = MongoTool::ALL.map(|t| t.name()).join(" ");
    let extra = match shell {
        Shell::Bash => format!(
            r#"
# Tool names for `mongotask probe`
_mongotask_probe_tools() {{
    if [[ "${{COMP_WORDS[1]}}" == "probe" && $COMP_CWORD -eq 2 ]]; then
        COMPREPLY=($(compgen -W "{tools}" -- "${{COMP_WORDS[COMP_CWORD]}}"))
        return 0
    fi
    _mongotask "$@"
}}
complete -F _mongotask_probe_tools -o bashdefault -o default mongotask
"#
        ),
        Shell::Fish => format!(
            "\n# Tool names for `mongotask probe`\ncomplete -c mongotask -n '__fish_seen_subcommand_from probe' -f -a '{tools}'\n"
        ),
        _ => String::new(),
    };

    out.write_all(extra.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shell() {
        assert_eq!(parse_shell("BASH").unwrap(), Shell::Bash);
        assert_eq!(parse_shell("fish").unwrap(), Shell::Fish);
        assert!(parse_shell("tcsh").is_err());
    }

    #[test]
    fn test_bash_completion_lists_subcommands_and_tools() {
        let mut buffer = Vec::new();
        write_completion(Shell::Bash, &mut buffer).unwrap();
        let script = String::from_utf8(buffer).unwrap();
        assert!(script.contains("mongotask"));
        assert!(script.contains("export"));
        assert!(script.contains("mongorestore"));
    }

    #[test]
    fn test_zsh_completion_has_no_extra_block() {
        let mut buffer = Vec::new();
        write_completion(Shell::Zsh, &mut buffer).unwrap();
        let script = String::from_utf8(buffer).unwrap();
        assert!(script.contains("#compdef mongotask"));
        assert!(!script.contains("_mongotask_probe_tools"));
    }
}
