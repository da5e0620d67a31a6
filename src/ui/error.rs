use stackup::StackupError;

use crate::ui::primitives::icon::Icon;
use crate::ui::primitives::text::ColoredText;

/// Suggested next step for a fatal error, when there is an obvious one.
fn fix_for(err: &StackupError) -> Option<String> {
    match err {
        StackupError::MissingTools { tools } => {
            Some(format!("Install {} and re-run stackup.", tools.join(" and ")))
        }
        StackupError::ComposeMissing { runtime, .. } if runtime == "podman" => {
            Some("Install it with `pip3 install --user podman-compose`.".to_string())
        }
        StackupError::ComposeMissing { .. } => {
            Some("Install the compose plugin, or set COMPOSE_CMD.".to_string())
        }
        StackupError::CredentialFileMissing { .. } => Some(
            "Pass an existing key with --service-account-key, or omit it to choose interactively."
                .to_string(),
        ),
        StackupError::MissingIdentifiers { .. } => Some(
            "Pass --project, --instance and --database, or set SPANNER_PROJECT_ID, \
             SPANNER_INSTANCE_ID and SPANNER_DATABASE_ID."
                .to_string(),
        ),
        StackupError::InvalidIdentifier { .. } => {
            Some("Use the ID exactly as the Cloud console shows it.".to_string())
        }
        StackupError::ComposeFailed { .. } => {
            Some("Inspect the output above; `stackup logs <service>` shows container logs.".into())
        }
        StackupError::BuildFailed(_) => {
            Some("Re-run with --skip-build to reuse the last image.".to_string())
        }
        _ => None,
    }
}

pub fn format_error_with(err: &anyhow::Error, supports_color: bool, supports_unicode: bool) -> String {
    let mut out = format!(
        "{} {}\n",
        Icon::Error.colored(supports_color, supports_unicode),
        err
    );
    if let Some(fix) = err.downcast_ref::<StackupError>().and_then(fix_for) {
        out.push_str(&format!(
            "  {} {}\n",
            Icon::Arrow.colored(supports_color, supports_unicode),
            ColoredText::dim(&fix).render(supports_color)
        ));
    }
    out
}

pub fn print_error(err: &anyhow::Error, supports_color: bool, supports_unicode: bool) {
    eprint!("{}", format_error_with(err, supports_color, supports_unicode));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tools_names_each_tool_with_fix() {
        let err = anyhow::Error::new(StackupError::MissingTools {
            tools: vec!["git".into(), "curl".into()],
        });

        let out = format_error_with(&err, false, false);

        assert!(out.starts_with("[ERROR] missing required tools: git, curl"), "{out}");
        assert!(out.contains("Install git and curl"));
    }

    #[test]
    fn invalid_identifier_points_at_console() {
        let err = anyhow::Error::new(StackupError::InvalidIdentifier {
            name: "database",
            value: "$(id)".into(),
            allowed: "lowercase letters, digits and '-', '_'".into(),
        });

        let out = format_error_with(&err, false, false);

        assert!(out.contains("invalid database ID '$(id)'"), "{out}");
        assert!(out.contains("Cloud console"));
    }

    #[test]
    fn plain_errors_have_no_fix_line() {
        let err = anyhow::anyhow!("boom");

        assert_eq!(format_error_with(&err, false, false), "[ERROR] boom\n");
    }
}
