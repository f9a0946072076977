use std::str::FromStr;

use artikey_core::{AppError, AppResult, ValidationErrors};
use serde::{Deserialize, Serialize};

/// Operations a permission grant may authorize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Read artifacts or build info.
    #[serde(rename = "read")]
    Read,
    /// Deploy or cache artifacts.
    #[serde(rename = "write")]
    Write,
    /// Annotate artifacts with properties.
    #[serde(rename = "annotate")]
    Annotate,
    /// Delete or overwrite artifacts.
    #[serde(rename = "delete")]
    Delete,
    /// Manage the permission target itself.
    #[serde(rename = "manage")]
    Manage,
    /// Manage Xray metadata.
    #[serde(rename = "managedXrayMeta")]
    ManagedXrayMeta,
    /// Distribute release bundles.
    #[serde(rename = "distribute")]
    Distribute,
}

impl Operation {
    /// Returns the wire value for this operation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Annotate => "annotate",
            Self::Delete => "delete",
            Self::Manage => "manage",
            Self::ManagedXrayMeta => "managedXrayMeta",
            Self::Distribute => "distribute",
        }
    }

    /// Returns every allowed operation.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Operation] = &[
            Operation::Read,
            Operation::Write,
            Operation::Annotate,
            Operation::Delete,
            Operation::Manage,
            Operation::ManagedXrayMeta,
            Operation::Distribute,
        ];

        ALL
    }
}

impl FromStr for Operation {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|operation| operation.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("operation '{value}' is not allowed")))
    }
}

/// One `repo` or `build` section of a permission target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionBlock {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    include_patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    exclude_patterns: Vec<String>,
    repositories: Vec<String>,
    operations: Vec<Operation>,
}

impl PermissionBlock {
    /// Returns include glob patterns.
    #[must_use]
    pub fn include_patterns(&self) -> &[String] {
        self.include_patterns.as_slice()
    }

    /// Returns exclude glob patterns.
    #[must_use]
    pub fn exclude_patterns(&self) -> &[String] {
        self.exclude_patterns.as_slice()
    }

    /// Returns the repositories the block applies to.
    #[must_use]
    pub fn repositories(&self) -> &[String] {
        self.repositories.as_slice()
    }

    /// Returns the granted operations.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        self.operations.as_slice()
    }
}

/// Validated permission target. Its position in the role's list is part of
/// the external grant name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionTargetSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repo: Option<PermissionBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    build: Option<PermissionBlock>,
}

impl PermissionTargetSpec {
    /// Returns the repository section.
    #[must_use]
    pub fn repo(&self) -> Option<&PermissionBlock> {
        self.repo.as_ref()
    }

    /// Returns the build section.
    #[must_use]
    pub fn build(&self) -> Option<&PermissionBlock> {
        self.build.as_ref()
    }
}

#[derive(Debug, Deserialize)]
struct RawPermissionBlock {
    #[serde(default)]
    include_patterns: Vec<String>,
    #[serde(default)]
    exclude_patterns: Vec<String>,
    #[serde(default)]
    repositories: Vec<String>,
    #[serde(default)]
    operations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawPermissionTarget {
    repo: Option<RawPermissionBlock>,
    build: Option<RawPermissionBlock>,
}

/// Parses the client-supplied JSON list of permission targets.
///
/// Every target is validated and all failures are returned together, prefixed
/// with the target position.
pub fn parse_permission_targets(raw: &str) -> AppResult<Vec<PermissionTargetSpec>> {
    if raw.trim().is_empty() {
        return Err(AppError::Validation("permission targets are empty".to_owned()));
    }

    let parsed: Vec<RawPermissionTarget> = serde_json::from_str(raw).map_err(|error| {
        AppError::Validation(format!(
            "error unmarshalling permission targets, expecting a list of permission targets: {error}"
        ))
    })?;

    if parsed.is_empty() {
        return Err(AppError::Validation(
            "failed to parse any permission targets from the given JSON".to_owned(),
        ));
    }

    let mut errors = ValidationErrors::new();
    let mut targets = Vec::with_capacity(parsed.len());

    for (index, raw_target) in parsed.into_iter().enumerate() {
        let mut target_errors = ValidationErrors::new();
        let target = validate_target(raw_target, &mut target_errors);

        if target_errors.is_empty() {
            targets.push(target);
        } else {
            errors.extend_with_prefix(&format!("permission_targets[{index}]"), target_errors);
        }
    }

    errors.into_result()?;
    Ok(targets)
}

fn validate_target(
    raw: RawPermissionTarget,
    errors: &mut ValidationErrors,
) -> PermissionTargetSpec {
    if raw.repo.is_none() && raw.build.is_none() {
        errors.push("at least one of 'repo' or 'build' must be supplied");
    }

    PermissionTargetSpec {
        repo: raw.repo.map(|block| validate_block("repo", block, errors)),
        build: raw.build.map(|block| validate_block("build", block, errors)),
    }
}

fn validate_block(
    section: &str,
    raw: RawPermissionBlock,
    errors: &mut ValidationErrors,
) -> PermissionBlock {
    let repositories = dedup(raw.repositories);
    if repositories.is_empty() {
        errors.push(format!("'{section}.repositories' field must be supplied"));
    }

    let mut operations = Vec::new();
    if raw.operations.is_empty() {
        errors.push(format!("'{section}.operations' field must be supplied"));
    }
    for value in dedup(raw.operations) {
        match Operation::from_str(value.as_str()) {
            Ok(operation) => operations.push(operation),
            Err(error) => errors.push_error(error),
        }
    }

    PermissionBlock {
        include_patterns: raw.include_patterns,
        exclude_patterns: raw.exclude_patterns,
        repositories,
        operations,
    }
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use artikey_core::AppError;

    use super::{Operation, parse_permission_targets};

    fn validation_message(raw: &str) -> String {
        match parse_permission_targets(raw) {
            Err(AppError::Validation(message)) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn every_operation_roundtrips_through_its_wire_value() {
        for operation in Operation::all() {
            assert_eq!(Operation::from_str(operation.as_str()).ok(), Some(*operation));
        }
    }

    #[test]
    fn parses_repo_and_build_blocks() {
        let raw = r#"
        [
            {
                "repo": {
                    "include_patterns": ["/mytest/**"],
                    "exclude_patterns": [""],
                    "repositories": ["repoA", "repoA"],
                    "operations": ["read", "write", "annotate"]
                },
                "build": {
                    "repositories": ["artifactory-build-info"],
                    "operations": ["manage", "read"]
                }
            }
        ]"#;

        let targets = parse_permission_targets(raw).unwrap_or_else(|_| unreachable!());
        assert_eq!(targets.len(), 1);

        let repo = targets[0].repo().unwrap_or_else(|| unreachable!());
        assert_eq!(repo.repositories(), ["repoA".to_owned()]);
        assert_eq!(
            repo.operations(),
            [Operation::Read, Operation::Write, Operation::Annotate]
        );
        assert_eq!(repo.include_patterns(), ["/mytest/**".to_owned()]);

        let build = targets[0].build().unwrap_or_else(|| unreachable!());
        assert_eq!(build.operations(), [Operation::Manage, Operation::Read]);
    }

    #[test]
    fn missing_repositories_and_operations_are_reported() {
        let message = validation_message(r#"[{"repo": {}}]"#);
        assert!(message.contains("'repo.repositories' field must be supplied"));
        assert!(message.contains("'repo.operations' field must be supplied"));
    }

    #[test]
    fn unknown_operations_are_aggregated_across_targets() {
        let message = validation_message(
            r#"[
                {"repo": {"repositories": ["a"], "operations": ["hello", "world", "read"]}},
                {"build": {"repositories": ["b"], "operations": ["publish"]}}
            ]"#,
        );

        assert!(message.starts_with("3 errors occurred"));
        assert!(message.contains("permission_targets[0]: operation 'hello' is not allowed"));
        assert!(message.contains("permission_targets[0]: operation 'world' is not allowed"));
        assert!(message.contains("permission_targets[1]: operation 'publish' is not allowed"));
    }

    #[test]
    fn target_without_sections_is_rejected() {
        let message = validation_message("[{}]");
        assert!(message.contains("at least one of 'repo' or 'build' must be supplied"));
    }

    #[test]
    fn empty_and_malformed_input_is_rejected() {
        assert!(validation_message("").contains("permission targets are empty"));
        assert!(validation_message("[]").contains("failed to parse any permission targets"));
        assert!(validation_message("{\"repo\": {}}").contains("expecting a list"));
    }

    #[test]
    fn stored_form_uses_wire_operation_names() {
        let targets = parse_permission_targets(
            r#"[{"repo": {"repositories": ["x"], "operations": ["managedXrayMeta"]}}]"#,
        )
        .unwrap_or_else(|_| unreachable!());

        let encoded = serde_json::to_string(&targets).unwrap_or_default();
        assert_eq!(
            encoded,
            r#"[{"repo":{"repositories":["x"],"operations":["managedXrayMeta"]}}]"#
        );
    }
}
