//! Rendering invocations for an external launcher.

use std::borrow::Cow;

use crate::args::Invocation;
use crate::cli::Format;

pub fn render(invocations: &[Invocation], format: Format) -> Result<String, serde_json::Error> {
    match format {
        Format::Shell => Ok(shell(invocations)),
        Format::Json => serde_json::to_string_pretty(invocations),
    }
}

/// One shell-quoted command line per invocation, main target first.
pub fn shell(invocations: &[Invocation]) -> String {
    invocations
        .iter()
        .map(|inv| {
            inv.command_line()
                .into_iter()
                .map(|arg| shell_escape::escape(Cow::Owned(arg)).into_owned())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation() -> Invocation {
        Invocation {
            target: "network".into(),
            container: "sn-node".into(),
            program: "docker".into(),
            args: vec![
                "run".into(),
                "--name".into(),
                "sn-node".into(),
                "--env".into(),
                "MOTD=hello world".into(),
                "sn-node".into(),
            ],
            directives: Vec::new(),
        }
    }

    #[test]
    fn shell_quotes_only_what_needs_it() {
        assert_eq!(
            shell(&[invocation()]),
            "docker run --name sn-node --env 'MOTD=hello world' sn-node"
        );
    }

    #[test]
    fn json_carries_program_and_args() {
        let json = render(&[invocation()], Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["target"], "network");
        assert_eq!(value[0]["program"], "docker");
        assert_eq!(value[0]["args"][0], "run");
        assert!(value[0].get("directives").is_none());
    }
}
