//! Library integration tests.

use vmdesk::VmdeskError;

#[test]
fn error_types_are_public() {
    let err = VmdeskError::NotFound {
        message: "no host matching 'desktop'".into(),
    };
    assert!(err.to_string().contains("desktop"));
    assert!(err.is_fatal());
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> vmdesk::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use clap::Parser;
    use vmdesk::cli::{Cli, Commands};

    let cli = Cli::parse_from(["vmdesk", "doctor", "--fix", "--only", "ssh"]);
    let Some(Commands::Doctor(args)) = cli.command else {
        panic!("expected doctor");
    };
    assert!(args.fix);
    assert_eq!(args.only, vec!["ssh"]);
}

#[test]
fn ui_types_are_public() {
    use vmdesk::ui::{MockUI, OutputMode, UserInterface};

    let mut ui = MockUI::with_mode(OutputMode::Quiet);
    ui.warning("xrdp-service missing");
    assert!(ui.has_warning("xrdp-service"));
}

#[test]
fn templates_are_embedded() {
    use vmdesk::capabilities::templates;

    let paths = templates::template_paths();
    assert!(paths.iter().any(|p| p.ends_with("startwm.sh")));
    assert!(templates::source(templates::VNC_XSTARTUP).is_ok());
}
