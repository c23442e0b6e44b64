//! Hierarchical configuration discovery, precedence-aware merging,
//! schema-driven validation, and security enforcement for CLI tools.
//!
//! The crate is organised around four cooperating subsystems:
//!
//! - [`discovery`]: walks upward from a starting directory to find
//!   configuration directories, and loads whichever file each one contains.
//! - [`merge`]: combines an ordered list of documents into one, with
//!   per-path control over how colliding arrays are combined.
//! - [`schema`]: flattens a host-supplied schema into a key universe and
//!   runs the `validate()` state machine against a merged document.
//! - [`security`] and [`resolver`]: enforce field-level security rules and
//!   arbitrate between an MCP runtime payload and filesystem discovery to
//!   produce a single, explainable [`resolver::ResolvedConfig`].
//!
//! Every external effect (reading files, parsing text, walking a host's
//! schema, logging) happens behind a trait in [`fs`], [`parser`], [`schema`],
//! or [`logger`], so the core itself never touches `std::fs` outside of
//! [`fs::StdFilesystem`] and never parses configuration text outside of the
//! optional [`builtin_parsers`].

pub mod builtin_parsers;
pub mod discovery;
pub mod error;
pub mod fs;
pub mod logger;
pub mod merge;
pub mod parser;
pub mod path_utils;
pub mod resolver;
pub mod schema;
pub mod security;
pub mod value;

use std::sync::Arc;

use discovery::WalkOptions;
use error::{CoreResult, ConfigError};
use fs::{Filesystem, StdFilesystem};
use logger::{Logger, TracingLogger};
use merge::OverlapRules;
use parser::{ConfigFormat, Parser};
use resolver::{CheckReport, InvocationContext, ResolvedConfig, ResolverConfig, check_config, resolve_config};
use schema::SchemaTraversal;
use security::{AuditLog, EventSource, FieldRules, Profile, SecurityValidator};
use value::Document;

/// Host-supplied collaborators and policy an [`Instance`] is built from.
///
/// Every field has a sensible default via [`CreateOptions::new`]; hosts
/// override only the collaborators their integration actually needs to
/// replace (most commonly `schema` and `field_rules`).
pub struct CreateOptions {
    /// Name of the configuration directory to search for, e.g. `.myapp`.
    pub config_dir_name: String,
    /// Base filename (without extension) of the configuration file each
    /// discovered directory may contain.
    pub config_file_name: String,
    /// An explicit format override bypassing format-priority probing.
    pub explicit_format: Option<ConfigFormat>,
    /// Options controlling the upward discovery walk.
    pub walk_options: WalkOptions,
    /// Per-path array-overlap rules applied during merging.
    pub overlap_rules: OverlapRules,
    /// Field-level security rules enforced after merging.
    pub field_rules: FieldRules,
    /// Which security posture to enforce.
    pub security_profile: Profile,
    /// Filesystem collaborator; override for tests or sandboxed hosts.
    pub fs: Arc<dyn Filesystem>,
    /// Text-to-[`value::Value`] parser; override to add formats.
    pub parser: Arc<dyn Parser>,
    /// Logging sink; override to route into a host's own telemetry.
    pub logger: Arc<dyn Logger>,
}

impl CreateOptions {
    /// Creates options for a configuration directory named `config_dir_name`,
    /// with every other field at its default: JSON/YAML parsing via
    /// [`builtin_parsers::BuiltinParser`], [`StdFilesystem`], a
    /// [`TracingLogger`], no array-overlap rules, no field rules, and the
    /// `Development` security profile.
    #[must_use]
    pub fn new(config_dir_name: impl Into<String>) -> Self {
        let config_dir_name = config_dir_name.into();
        Self {
            walk_options: WalkOptions::new(config_dir_name.clone()),
            config_dir_name,
            config_file_name: "config".to_string(),
            explicit_format: None,
            overlap_rules: OverlapRules::new(),
            field_rules: FieldRules::new(),
            security_profile: Profile::Development,
            fs: Arc::new(StdFilesystem),
            parser: Arc::new(builtin_parsers::BuiltinParser),
            logger: Arc::new(TracingLogger),
        }
    }
}

/// An instance of the configuration core, bound to one host's schema and
/// policy.
///
/// Created with [`create`], then driven through [`Instance::configure`] (to
/// bind a schema and an invocation context), [`Instance::read`] (to produce a
/// [`ResolvedConfig`]), and [`Instance::validate`] (to run the schema and
/// security checks against it).
pub struct Instance {
    options: CreateOptions,
    audit_log: AuditLog,
    schema: Option<Arc<dyn SchemaTraversal>>,
    context: InvocationContext,
}

/// Constructs an [`Instance`] from `options`.
#[must_use]
pub fn create(options: CreateOptions) -> Instance {
    Instance {
        options,
        audit_log: AuditLog::new(security::Severity::Info, false),
        schema: None,
        context: InvocationContext::default(),
    }
}

impl Instance {
    /// Binds the host's schema and invocation context. Must be called
    /// before [`Instance::validate`]; [`Instance::read`] works without it.
    pub fn configure(&mut self, schema: Arc<dyn SchemaTraversal>, context: InvocationContext) {
        self.schema = Some(schema);
        self.context = context;
    }

    /// Resolves configuration for the bound [`InvocationContext`], arbitrating
    /// between the MCP payload and filesystem discovery.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingContext`] if neither an MCP payload nor
    /// a working directory was supplied via [`Instance::configure`].
    pub fn read(&self) -> Result<ResolvedConfig, ConfigError> {
        let resolver_config = ResolverConfig {
            config_file_name: self.options.config_file_name.clone(),
            explicit_format: self.options.explicit_format,
            walk_options: self.options.walk_options.clone(),
            overlap_rules: self.options.overlap_rules.clone(),
        };
        resolve_config(
            &self.context,
            &resolver_config,
            self.options.fs.as_ref(),
            self.options.parser.as_ref(),
            self.options.logger.as_ref(),
        )
    }

    /// Runs schema validation and field-level security checks against
    /// `resolved`, aggregating any failures into a single
    /// [`ConfigError::Aggregate`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingResolver`] if [`Instance::configure`] was
    /// never called, or an aggregate of [`ConfigError::Validation`],
    /// [`ConfigError::ExtraKeys`], or [`ConfigError::InvalidArgument`] (one
    /// per rejected field) otherwise.
    pub fn validate(&self, resolved: &ResolvedConfig) -> CoreResult<()> {
        let schema = self.schema.as_ref().ok_or(ConfigError::MissingResolver)?;

        let mut errors: Vec<Arc<ConfigError>> = Vec::new();
        if let Err(err) = schema::validate(&resolved.value, schema.as_ref(), self.options.fs.as_ref()) {
            errors.push(Arc::new(err));
        }

        let validator = SecurityValidator::new(
            self.options.security_profile,
            self.options.field_rules.clone(),
            &self.audit_log,
        );
        let rejected = validator.validate(&resolved.value, EventSource::Merged);
        for field in rejected {
            errors.push(Arc::new(ConfigError::InvalidArgument {
                message: format!("field {field} failed a security rule"),
            }));
        }

        // When an MCP/CLI payload took precedence over filesystem discovery,
        // still resolve the filesystem view for comparison so a CLI value
        // silently shadowing a file-configured one is recorded.
        if let Some(cli) = &self.context.mcp_payload {
            let resolver_config = ResolverConfig {
                config_file_name: self.options.config_file_name.clone(),
                explicit_format: self.options.explicit_format,
                walk_options: self.options.walk_options.clone(),
                overlap_rules: self.options.overlap_rules.clone(),
            };
            if let Some(file_config) = resolver::resolve_file_only(
                &self.context,
                &resolver_config,
                self.options.fs.as_ref(),
                self.options.parser.as_ref(),
                self.options.logger.as_ref(),
            ) {
                validator.record_cross_source_overrides(cli, &file_config);
            }
        }

        match ConfigError::try_aggregate(errors.into_iter()) {
            Some(err) => Err(Arc::new(err)),
            None => Ok(()),
        }
    }

    /// Produces a redacted, human-facing diagnostic view of `resolved`.
    #[must_use]
    pub fn check(&self, resolved: &ResolvedConfig) -> CheckReport {
        check_config(resolved)
    }

    /// The audit log accumulated by security checks run via
    /// [`Instance::validate`].
    #[must_use]
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit_log
    }
}
