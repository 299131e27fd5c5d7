//! Execution environment detection.

/// Check if running in a CI environment.
///
/// Used to force non-interactive output in `main()`.
/// Checks common CI environment variables: `CI`, `GITHUB_ACTIONS`,
/// `GITLAB_CI`, `CIRCLECI`, `TRAVIS`, `JENKINS_URL`.
pub fn is_ci() -> bool {
    is_ci_with(|key| std::env::var_os(key).is_some())
}

/// CI detection against an arbitrary variable lookup.
pub fn is_ci_with<F>(has_var: F) -> bool
where
    F: Fn(&str) -> bool,
{
    const CI_VARS: &[&str] = &[
        "CI",
        "GITHUB_ACTIONS",
        "GITLAB_CI",
        "CIRCLECI",
        "TRAVIS",
        "JENKINS_URL",
    ];
    CI_VARS.iter().any(|key| has_var(key))
}
