//! Formation template rendering
//!
//! Loads `{name}{suffix}` from the template directory, executes it with Tera
//! and normalizes the result into canonical JSON. Built-in templates compiled
//! into the binary answer names the directory does not have.

use crate::error::{Result, TemplateError};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tera::{Context, Tera, Value};
use tracing::debug;

/// Suffix appended to template names when no other suffix is configured
pub const DEFAULT_SUFFIX: &str = ".tmpl";

/// A helper function callable from templates, e.g. `{{ resource(name="Bucket") }}`
pub type Helper = Arc<dyn tera::Function>;

/// Renders named templates into canonical JSON documents
#[derive(Clone)]
pub struct TemplateRenderer {
    dir: Option<PathBuf>,
    suffix: String,
    helpers: BTreeMap<String, Helper>,
    builtins: BTreeMap<String, &'static str>,
}

impl TemplateRenderer {
    /// Create a renderer for `dir` with the built-in helper set
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_dir(Some(dir.as_ref().to_path_buf()))
    }

    /// Renderer serving only built-in templates
    pub fn embedded() -> Self {
        Self::with_dir(None)
    }

    fn with_dir(dir: Option<PathBuf>) -> Self {
        let mut renderer = Self {
            dir,
            suffix: DEFAULT_SUFFIX.to_string(),
            helpers: BTreeMap::new(),
            builtins: BTreeMap::new(),
        };
        renderer.register_helper("resource", resource_helper);
        renderer
    }

    /// Serve `source` for `name` when the directory has no such template
    pub fn add_builtin(&mut self, name: impl Into<String>, source: &'static str) {
        self.builtins.insert(name.into(), source);
    }

    pub fn with_builtin(mut self, name: impl Into<String>, source: &'static str) -> Self {
        self.add_builtin(name, source);
        self
    }

    /// Use a different file suffix (e.g. `.json.tmpl`)
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Register a helper, replacing any existing helper with the same name
    pub fn register_helper<F>(&mut self, name: impl Into<String>, helper: F)
    where
        F: tera::Function + 'static,
    {
        self.helpers.insert(name.into(), Arc::new(helper));
    }

    pub fn helper_names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(String::as_str)
    }

    /// File name of the template source for `name`
    fn file_name(&self, name: &str) -> String {
        format!("{}{}", name, self.suffix)
    }

    /// Path of the template source for `name` in the template directory
    pub fn template_path(&self, name: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(self.file_name(name)))
    }

    /// Template source: the directory first, then the built-ins
    fn load(&self, name: &str) -> Result<Cow<'_, str>> {
        validate_name(name)?;

        let missing = match self.template_path(name) {
            Some(path) => match std::fs::read_to_string(&path) {
                Ok(source) => return Ok(Cow::Owned(source)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => (path, e),
                Err(source) => {
                    return Err(TemplateError::NotFound {
                        name: name.to_string(),
                        path,
                        source,
                    });
                }
            },
            None => (
                PathBuf::from(self.file_name(name)),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no built-in template"),
            ),
        };

        match self.builtins.get(name) {
            Some(source) => {
                debug!(template = %name, "Using built-in template");
                Ok(Cow::Borrowed(source))
            }
            None => Err(TemplateError::NotFound {
                name: name.to_string(),
                path: missing.0,
                source: missing.1,
            }),
        }
    }

    /// Render `name` with `data` and return the canonical JSON document
    #[tracing::instrument(skip(self, data))]
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        let source = self.load(name)?;

        let context =
            Context::from_serialize(data).map_err(|e| TemplateError::InvalidData(e.to_string()))?;

        let rendered = self.execute(name, &source, &context)?;
        debug!(bytes = rendered.len(), "Template executed");

        let document: serde_json::Value =
            serde_json::from_str(&rendered).map_err(|source| TemplateError::InvalidOutput {
                name: name.to_string(),
                source,
            })?;

        serde_json::to_string_pretty(&canonicalize(document)).map_err(|source| {
            TemplateError::InvalidOutput {
                name: name.to_string(),
                source,
            }
        })
    }

    /// Tera instance scoped to a single render
    fn execute(&self, name: &str, source: &str, context: &Context) -> Result<String> {
        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());

        for (helper_name, helper) in &self.helpers {
            let helper = Arc::clone(helper);
            tera.register_function(helper_name, move |args: &HashMap<String, Value>| {
                helper.call(args)
            });
        }

        let render_err = |e: tera::Error| TemplateError::Render {
            name: name.to_string(),
            message: extract_tera_error_detail(&e),
        };

        tera.add_raw_template(name, source).map_err(render_err)?;
        tera.render(name, context).map_err(render_err)
    }
}

/// Names are relative to the template directory and may not leave it
fn validate_name(name: &str) -> Result<()> {
    let escapes = name.starts_with('/')
        || name.contains('\\')
        || name.contains('\0')
        || name.split('/').any(|segment| segment.is_empty() || segment == "..");
    if escapes {
        return Err(TemplateError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// `resource(name=...)` substitutes the logical resource name
fn resource_helper(args: &HashMap<String, Value>) -> tera::Result<Value> {
    match args.get("name") {
        Some(Value::String(name)) => {
            debug!(resource = %name, "resource helper");
            Ok(Value::String(name.clone()))
        }
        Some(other) => Err(tera::Error::msg(format!(
            "resource() expects a string `name`, got {other}"
        ))),
        None => Err(tera::Error::msg("resource() requires a `name` argument")),
    }
}

/// Rebuild objects with keys inserted in sorted order
fn canonicalize(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect(),
            )
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(canonicalize).collect())
        }
        other => other,
    }
}

/// Collect the Tera error chain into one message
fn extract_tera_error_detail(e: &tera::Error) -> String {
    use std::error::Error;

    let mut details = vec![e.to_string()];
    let mut source = e.source();
    while let Some(err) = source {
        details.push(err.to_string());
        source = err.source();
    }

    let full_error = details.join(" | ");

    if full_error.contains("not found in context")
        && let Some(start) = full_error.find("Variable `")
        && let Some(end) = full_error[start..].find("` not found")
    {
        let var_name = &full_error[start + 10..start + end];
        return format!("undefined variable: `{var_name}`");
    }

    full_error
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn renderer_with(templates: &[(&str, &str)]) -> (TempDir, TemplateRenderer) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in templates {
            std::fs::write(dir.path().join(format!("{name}.tmpl")), body).unwrap();
        }
        let renderer = TemplateRenderer::new(dir.path());
        (dir, renderer)
    }

    #[test]
    fn test_render_normalizes_json() {
        let (_dir, renderer) = renderer_with(&[(
            "bucket",
            r#"{"Resources": {"{{ resource(name="Bucket") }}": {"Type": "AWS::S3::Bucket"} }, "AWSTemplateFormatVersion": "2010-09-09", "Outputs": {"Name": {"Value": "{{ app }}"} } }"#,
        )]);

        let out = renderer.render("bucket", &json!({ "app": "web" })).unwrap();

        let expected = r#"{
  "AWSTemplateFormatVersion": "2010-09-09",
  "Outputs": {
    "Name": {
      "Value": "web"
    }
  },
  "Resources": {
    "Bucket": {
      "Type": "AWS::S3::Bucket"
    }
  }
}"#;
        assert_eq!(out, expected);
    }

    #[test]
    fn test_render_is_deterministic() {
        let (_dir, renderer) = renderer_with(&[(
            "services",
            r#"{ "Resources": { {% for s in services %}"{{ s | title }}Service": {"Type": "AWS::ECS::Service", "Properties": {"Count": {{ loop.index }} } }{% if not loop.last %},{% endif %}{% endfor %} } }"#,
        )]);

        let data = json!({ "services": ["web", "worker", "cron"] });
        let first = renderer.render("services", &data).unwrap();
        let second = renderer.render("services", &data).unwrap();

        assert_eq!(first.as_bytes(), second.as_bytes());
        assert!(first.contains("\"WorkerService\""));
    }

    #[test]
    fn test_unknown_template() {
        let (_dir, renderer) = renderer_with(&[]);
        let err = renderer.render("missing", &json!({})).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound { ref name, .. } if name == "missing"));
    }

    #[test]
    fn test_truncated_output_is_invalid() {
        let (_dir, renderer) = renderer_with(&[("broken", r#"{"Resources": {"A": {{ n }}"#)]);
        let err = renderer.render("broken", &json!({ "n": 1 })).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidOutput { .. }));
    }

    #[test]
    fn test_undefined_variable_is_render_error() {
        let (_dir, renderer) = renderer_with(&[("vars", r#"{"a": "{{ nope }}"}"#)]);
        let err = renderer.render("vars", &json!({})).unwrap_err();
        match err {
            TemplateError::Render { message, .. } => assert!(message.contains("nope")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_object_data_is_rejected() {
        let (_dir, renderer) = renderer_with(&[("plain", "{}")]);
        let err = renderer.render("plain", &json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidData(_)));
    }

    #[test]
    fn test_registered_helper() {
        let (_dir, mut renderer) = renderer_with(&[(
            "named",
            r#"{"Name": "{{ stack(app=app) }}"}"#,
        )]);
        renderer.register_helper("stack", |args: &HashMap<String, Value>| {
            let app = args.get("app").and_then(Value::as_str).unwrap_or_default();
            Ok(Value::String(format!("dev-{app}")))
        });

        let out = renderer.render("named", &json!({ "app": "api" })).unwrap();
        assert!(out.contains("\"dev-api\""));
        assert!(renderer.helper_names().any(|n| n == "resource"));
    }

    #[test]
    fn test_resource_helper_requires_name() {
        let (_dir, renderer) = renderer_with(&[("bad", r#"{"a": "{{ resource() }}"}"#)]);
        let err = renderer.render("bad", &json!({})).unwrap_err();
        assert!(matches!(err, TemplateError::Render { .. }));
    }

    #[test]
    fn test_names_cannot_leave_the_directory() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("secret.tmpl"), r#"{"leaked": true}"#).unwrap();
        let templates = root.path().join("templates");
        std::fs::create_dir_all(&templates).unwrap();
        let renderer = TemplateRenderer::new(&templates);

        for name in ["../secret", "a/../../secret", "/etc/passwd", "", "a//b", "..\\secret"] {
            let err = renderer.render(name, &json!({})).unwrap_err();
            assert!(
                matches!(err, TemplateError::InvalidName(_)),
                "{name:?}: {err}"
            );
        }
    }

    #[test]
    fn test_builtin_templates() {
        let renderer = TemplateRenderer::embedded()
            .with_builtin("rack", r#"{"Rack": "{{ rack }}", "Kind": "builtin"}"#);
        assert!(renderer.dir().is_none());

        let out = renderer.render("rack", &json!({ "rack": "prod" })).unwrap();
        assert!(out.contains("\"builtin\""));

        let err = renderer.render("app", &json!({})).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound { ref name, .. } if name == "app"));
    }

    #[test]
    fn test_directory_overrides_builtin() {
        let (_dir, renderer) = renderer_with(&[("rack", r#"{"Kind": "file"}"#)]);
        let renderer = renderer
            .with_builtin("rack", r#"{"Kind": "builtin"}"#)
            .with_builtin("app", r#"{"Kind": "builtin"}"#);

        assert!(renderer.render("rack", &json!({})).unwrap().contains("\"file\""));
        assert!(renderer.render("app", &json!({})).unwrap().contains("\"builtin\""));
    }

    #[test]
    fn test_custom_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rack.json.tmpl"), r#"{"rack": "{{ rack }}"}"#).unwrap();

        let renderer = TemplateRenderer::new(dir.path()).with_suffix(".json.tmpl");
        let out = renderer.render("rack", &json!({ "rack": "prod" })).unwrap();
        assert_eq!(out, "{\n  \"rack\": \"prod\"\n}");
    }
}
