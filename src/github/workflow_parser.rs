use serde::Deserialize;
use tracing::debug;

// =============================================================================
// 1. Parse result
// =============================================================================

/// Audit fields read from one GitHub Actions workflow.
///
/// Each field is `None` when the workflow does not declare it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowMetadata {
    /// `env.INTEGRATION_SUITE`, rendered as text
    pub integration_suite: Option<String>,

    /// `concurrency.group` (or a bare `concurrency: <group>`)
    pub concurrency_rule: Option<String>,

    /// "Yes" when a step with the configured name exists
    pub mend: Option<String>,
}

pub const INTEGRATION_SUITE_KEY: &str = "INTEGRATION_SUITE";
pub const DEFAULT_MEND_STEP: &str = "Mend";

// =============================================================================
// 2. YAML shape (serde)
// =============================================================================

#[derive(Debug, Deserialize, Default)]
struct GitHubWorkflow {
    /// A mapping, or an expression string such as `${{ fromJSON(...) }}`
    #[serde(default)]
    env: Option<serde_yaml::Value>,

    #[serde(default)]
    concurrency: Option<Concurrency>,

    #[serde(default)]
    steps: Vec<Step>,

    /// Raw mapping so jobs are visited in document order
    #[serde(default)]
    jobs: serde_yaml::Mapping,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Concurrency {
    Group(String),
    Object {
        #[serde(default)]
        group: Option<serde_yaml::Value>,
    },
}

#[derive(Debug, Deserialize, Default)]
struct Job {
    #[serde(default)]
    env: Option<serde_yaml::Value>,

    #[serde(default)]
    concurrency: Option<Concurrency>,

    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Step {
    #[serde(default)]
    name: Option<String>,
}

// =============================================================================
// 3. Parser
// =============================================================================

pub struct WorkflowParser;

impl WorkflowParser {
    /// Parse workflow YAML and pick out the audit fields.
    ///
    /// Top-level declarations win; job-level ones are used when the top level
    /// has none (first job in document order). Missing keys are `None`, only
    /// malformed YAML is an error.
    pub fn parse(content: &str, mend_step: &str) -> Result<WorkflowMetadata, String> {
        let workflow: GitHubWorkflow = match serde_yaml::from_str(content) {
            Ok(workflow) => workflow,
            // An empty document deserializes as unit, not a mapping
            Err(_) if content.trim().is_empty() => GitHubWorkflow::default(),
            Err(e) => return Err(format!("Failed to parse workflow YAML: {}", e)),
        };

        let jobs = Self::jobs(&workflow.jobs);

        let integration_suite = Self::integration_suite(workflow.env.as_ref())
            .or_else(|| jobs.iter().find_map(|job| Self::integration_suite(job.env.as_ref())));

        let concurrency_rule = Self::concurrency_group(workflow.concurrency.as_ref())
            .or_else(|| jobs.iter().find_map(|job| Self::concurrency_group(job.concurrency.as_ref())));

        let has_mend_step = Self::has_step(&workflow.steps, mend_step)
            || jobs.iter().any(|job| Self::has_step(&job.steps, mend_step));

        Ok(WorkflowMetadata {
            integration_suite,
            concurrency_rule,
            mend: has_mend_step.then(|| "Yes".to_string()),
        })
    }

    pub fn parse_bytes(content: &[u8], mend_step: &str) -> Result<WorkflowMetadata, String> {
        let text = std::str::from_utf8(content)
            .map_err(|e| format!("Workflow is not valid UTF-8: {}", e))?;
        Self::parse(text, mend_step)
    }

    // =========================================================================
    // Private helpers
    // =========================================================================

    /// Jobs in document order; a job of unexpected shape contributes nothing
    fn jobs(jobs: &serde_yaml::Mapping) -> Vec<Job> {
        jobs.iter()
            .filter_map(|(name, job)| match serde_yaml::from_value::<Job>(job.clone()) {
                Ok(job) => Some(job),
                Err(e) => {
                    debug!(job = ?name, error = %e, "Skipping job of unexpected shape");
                    None
                }
            })
            .collect()
    }

    /// Only a literal `env` mapping carries the key; expression strings yield `None`
    fn integration_suite(env: Option<&serde_yaml::Value>) -> Option<String> {
        env?.get(INTEGRATION_SUITE_KEY).and_then(Self::scalar_to_string)
    }

    fn concurrency_group(concurrency: Option<&Concurrency>) -> Option<String> {
        match concurrency? {
            Concurrency::Group(group) => Some(group.clone()),
            Concurrency::Object { group } => group.as_ref().and_then(Self::scalar_to_string),
        }
    }

    fn has_step(steps: &[Step], wanted: &str) -> bool {
        let wanted = wanted.trim();
        steps.iter().any(|step| {
            step.name
                .as_deref()
                .map(|name| name.trim().eq_ignore_ascii_case(wanted))
                .unwrap_or(false)
        })
    }

    fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
        match value {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
