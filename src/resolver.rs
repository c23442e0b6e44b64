//! Invocation resolver: arbitrates between an MCP runtime payload and
//! filesystem discovery, and exposes a `check_config` diagnostic view over
//! the result.

use std::path::{Path, PathBuf};

use crate::discovery::{DiscoveredConfigDir, LoadedConfig, WalkOptions, load_config_dir, walk};
use crate::error::ConfigError;
use crate::fs::Filesystem;
use crate::logger::Logger;
use crate::merge::{OverlapRules, merge_all};
use crate::parser::{ConfigFormat, Parser};
use crate::value::{Document, Value};

/// Field names whose value is redacted in [`CheckReport`] regardless of
/// case, matched anywhere in the field's dot-path (so `dbPasswordHash` is
/// redacted along with `password`).
pub const SENSITIVE_FIELD_MARKERS: [&str; 11] = [
    "password",
    "secret",
    "token",
    "apikey",
    "api_key",
    "auth",
    "credential",
    "privatekey",
    "private_key",
    "accesskey",
    "access_key",
];

/// The number of hierarchical levels above which [`check_config`] emits a
/// warning, since a very deep stack usually indicates an unintended
/// discovery boundary rather than a deliberate one.
pub const DEEP_HIERARCHY_WARNING_THRESHOLD: usize = 4;

/// What an invoking host supplies to [`resolve_config`]: either an MCP
/// runtime payload, a filesystem starting point, or both.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    /// A configuration document supplied directly by an MCP runtime, taking
    /// precedence over filesystem discovery when present.
    pub mcp_payload: Option<Document>,
    /// The directory to start upward filesystem discovery from, used when
    /// `mcp_payload` is absent and `target_file` is absent or yields nothing.
    pub working_dir: Option<PathBuf>,
    /// A specific file the host is operating on (for example, the file open
    /// in an editor). When present, its parent directory is tried first;
    /// `working_dir` is the fallback starting point if that yields no
    /// loadable configuration.
    pub target_file: Option<PathBuf>,
}

/// Settings governing filesystem-backed resolution.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Base filename searched for in each discovered directory (without
    /// extension), e.g. `"config"`.
    pub config_file_name: String,
    /// An explicit format override, bypassing format-priority probing.
    pub explicit_format: Option<ConfigFormat>,
    /// Options controlling the upward walk.
    pub walk_options: WalkOptions,
    /// Array-overlap rules applied while merging discovered directories.
    pub overlap_rules: OverlapRules,
}

/// Which side of the arbitration produced a [`ResolvedConfig`].
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// The MCP runtime payload was used verbatim; filesystem discovery was
    /// not attempted.
    Mcp,
    /// The result of merging configuration directories discovered on disk,
    /// nearest first.
    File {
        /// The directories that contributed to the merge, nearest first.
        parents: Vec<DiscoveredConfigDir>,
    },
}

/// The outcome of [`resolve_config`]: the merged document, which source
/// produced it, and a human-readable trail explaining how it got there.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Which arbitration path was taken.
    pub source: ConfigSource,
    /// The resolved configuration document.
    pub value: Document,
    /// Every directory discovered during filesystem resolution, nearest
    /// first; empty when `source` is [`ConfigSource::Mcp`].
    pub hierarchical: Vec<DiscoveredConfigDir>,
    /// A short, ordered explanation of how `value` was produced, suitable
    /// for display in a diagnostic tool.
    pub resolution_explanation: String,
}

/// Resolves configuration for one invocation.
///
/// Arbitration follows a fixed order: an MCP payload always wins outright
/// (step 1); otherwise a starting directory is required (step 2, else
/// [`ConfigError::MissingContext`]) — when `target_file` is present its
/// parent directory is tried first, falling back to `working_dir` if that
/// yields no loadable file; the chosen directory is walked upward (step 3);
/// every directory that yielded a loadable file is merged nearest-to-root,
/// so the nearest directory has the highest precedence (step 4).
///
/// # Errors
///
/// Returns [`ConfigError::MissingContext`] if neither an MCP payload, a
/// `target_file`, nor a working directory is supplied.
pub fn resolve_config(
    context: &InvocationContext,
    resolver_config: &ResolverConfig,
    fs: &dyn Filesystem,
    parser: &dyn Parser,
    logger: &dyn Logger,
) -> Result<ResolvedConfig, ConfigError> {
    if let Some(payload) = &context.mcp_payload {
        return Ok(ResolvedConfig {
            source: ConfigSource::Mcp,
            value: payload.clone(),
            hierarchical: Vec::new(),
            resolution_explanation: "resolved from the MCP runtime payload".to_string(),
        });
    }

    let Some((discovered, loaded)) =
        discover_from_context(context, resolver_config, fs, parser, logger)
    else {
        return Err(ConfigError::MissingContext);
    };

    // Nearest-first discovery order must become root-first merge order, so
    // the nearest directory (highest precedence) is applied last.
    let documents: Vec<Document> = loaded
        .iter()
        .rev()
        .filter_map(|(_, config)| config.value.as_document().cloned())
        .collect();
    let merged = merge_all(&documents, &resolver_config.overlap_rules);

    let explanation = if loaded.is_empty() {
        format!(
            "no configuration file found across {} discovered director{}",
            discovered.len(),
            if discovered.len() == 1 { "y" } else { "ies" }
        )
    } else {
        let trail: Vec<String> = loaded
            .iter()
            .map(|(dir, config)| format!("{} (level {})", config.path.display(), dir.level))
            .collect();
        format!(
            "merged {} configuration file(s), nearest first: {}",
            loaded.len(),
            trail.join(", ")
        )
    };

    Ok(ResolvedConfig {
        source: ConfigSource::File {
            parents: discovered.clone(),
        },
        value: merged,
        hierarchical: discovered,
        resolution_explanation: explanation,
    })
}

/// Picks the filesystem starting point out of `context` — `target_file`'s
/// directory first, falling back to `working_dir` if that yields nothing —
/// and walks and loads it. Returns `None` if neither is present.
fn discover_from_context(
    context: &InvocationContext,
    resolver_config: &ResolverConfig,
    fs: &dyn Filesystem,
    parser: &dyn Parser,
    logger: &dyn Logger,
) -> Option<(Vec<DiscoveredConfigDir>, Vec<(DiscoveredConfigDir, LoadedConfig)>)> {
    let target_file_dir = context
        .target_file
        .as_ref()
        .and_then(|path| path.parent())
        .map(Path::to_path_buf);

    if target_file_dir.is_none() && context.working_dir.is_none() {
        return None;
    }

    Some(if let Some(starting_dir) = &target_file_dir {
        let (discovered, loaded) = walk_and_load(starting_dir, resolver_config, fs, parser, logger);
        if loaded.is_empty() {
            if let Some(working_dir) = &context.working_dir {
                walk_and_load(working_dir, resolver_config, fs, parser, logger)
            } else {
                (discovered, loaded)
            }
        } else {
            (discovered, loaded)
        }
    } else {
        let working_dir = context
            .working_dir
            .as_ref()
            .expect("checked above: at least one starting point is present");
        walk_and_load(working_dir, resolver_config, fs, parser, logger)
    })
}

/// Resolves the filesystem-only view of `context`, ignoring any MCP payload.
///
/// Used to compare a CLI/MCP-sourced document against what the filesystem
/// alone would have produced, even when the MCP payload took precedence for
/// the authoritative [`ResolvedConfig::value`] — see
/// [`crate::security::SecurityValidator::record_cross_source_overrides`].
#[must_use]
pub fn resolve_file_only(
    context: &InvocationContext,
    resolver_config: &ResolverConfig,
    fs: &dyn Filesystem,
    parser: &dyn Parser,
    logger: &dyn Logger,
) -> Option<Document> {
    let (_, loaded) = discover_from_context(context, resolver_config, fs, parser, logger)?;
    if loaded.is_empty() {
        return None;
    }
    let documents: Vec<Document> = loaded
        .iter()
        .rev()
        .filter_map(|(_, config)| config.value.as_document().cloned())
        .collect();
    Some(merge_all(&documents, &resolver_config.overlap_rules))
}

/// Walks upward from `starting_dir` and loads every directory that yields a
/// parseable configuration file.
fn walk_and_load(
    starting_dir: &Path,
    resolver_config: &ResolverConfig,
    fs: &dyn Filesystem,
    parser: &dyn Parser,
    logger: &dyn Logger,
) -> (Vec<DiscoveredConfigDir>, Vec<(DiscoveredConfigDir, LoadedConfig)>) {
    let discovered = walk(starting_dir, fs, &resolver_config.walk_options, logger);
    let mut loaded = Vec::new();
    for dir in &discovered {
        if let Some(config) = load_config_dir(
            &dir.path,
            &resolver_config.config_file_name,
            resolver_config.explicit_format,
            fs,
            parser,
            logger,
            None,
        ) {
            loaded.push((dir.clone(), config));
        }
    }
    (discovered, loaded)
}

/// A sanitized, human-facing view of a [`ResolvedConfig`], suitable for
/// printing from a `check_config` diagnostic command.
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Mirrors [`ResolvedConfig::resolution_explanation`].
    pub resolution_explanation: String,
    /// Number of directories discovered during filesystem resolution.
    pub discovered_dir_count: usize,
    /// The resolved document with sensitive fields redacted.
    pub redacted_value: Document,
    /// Non-fatal observations about the resolution (for example, an
    /// unusually deep hierarchy).
    pub warnings: Vec<String>,
}

/// Builds a [`CheckReport`] from `resolved`, redacting sensitive field
/// values and flagging an unusually deep hierarchical stack.
#[must_use]
pub fn check_config(resolved: &ResolvedConfig) -> CheckReport {
    let mut warnings = Vec::new();
    if resolved.hierarchical.len() > DEEP_HIERARCHY_WARNING_THRESHOLD {
        warnings.push(format!(
            "hierarchical resolution spans {} levels, more than the usual {}; verify this is intentional",
            resolved.hierarchical.len(),
            DEEP_HIERARCHY_WARNING_THRESHOLD
        ));
    }

    CheckReport {
        resolution_explanation: resolved.resolution_explanation.clone(),
        discovered_dir_count: resolved.hierarchical.len(),
        redacted_value: redact_sensitive(&resolved.value, ""),
        warnings,
    }
}

fn redact_sensitive(document: &Document, prefix: &str) -> Document {
    let mut out = Document::new();
    for (key, value) in document.iter() {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        let redacted = if is_sensitive_field(&path) {
            Value::String("***".to_string())
        } else {
            match value {
                Value::Document(nested) => Value::Document(redact_sensitive(nested, &path)),
                other => other.clone(),
            }
        };
        out.insert(key.clone(), redacted);
    }
    out
}

fn is_sensitive_field(path: &str) -> bool {
    let lower = path.to_lowercase();
    SENSITIVE_FIELD_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}
