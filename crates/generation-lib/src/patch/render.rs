//! Rendering of accumulated edit operations into patch templates

use super::filter::PatchFilter;
use crate::error::{GenerationError, Result};
use crate::models::{PatchTemplate, PatchType, ResourceReference};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

/// Edit operations collected for one target resource
#[derive(Default)]
struct TargetPatch {
    patch_type: Option<PatchType>,
    filters: Vec<Box<dyn PatchFilter>>,
}

/// Accumulates edit operations per target resource
///
/// Targets are kept in reference order (kind, namespace, name) so the rendered
/// patch list never depends on map iteration order.
#[derive(Default)]
pub struct PatchRenderer {
    targets: BTreeMap<ResourceReference, TargetPatch>,
}

impl PatchRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an edit operation to the target's list
    pub fn add(
        &mut self,
        target: ResourceReference,
        patch_type: Option<PatchType>,
        filter: Box<dyn PatchFilter>,
    ) -> Result<()> {
        let label = target.to_string();
        let entry = self.targets.entry(target).or_default();
        if let Some(requested) = patch_type {
            match entry.patch_type {
                Some(existing) if existing != requested => {
                    return Err(GenerationError::PatchTypeConflict {
                        target: label,
                        existing,
                        requested,
                    });
                }
                _ => entry.patch_type = Some(requested),
            }
        }
        entry.filters.push(filter);
        Ok(())
    }

    /// Render one patch template per target, in reference order
    pub fn render(self) -> Result<Vec<PatchTemplate>> {
        let mut patches = Vec::with_capacity(self.targets.len());
        for (target, target_patch) in self.targets {
            let patch = render_patch(&target_patch.filters)?;
            debug!(target = %target, edits = target_patch.filters.len(), "Rendered patch");
            patches.push(PatchTemplate {
                patch_type: target_patch.patch_type,
                patch,
                target_ref: Some(target),
            });
        }
        Ok(patches)
    }
}

/// Run the filters over an empty document and render the result as template text
pub fn render_patch(filters: &[Box<dyn PatchFilter>]) -> Result<String> {
    let mut document = Value::Mapping(Mapping::new());
    for filter in filters {
        filter.apply(&mut document)?;
    }

    let text = serde_yaml::to_string(&document)?;
    Ok(strip_int_tags(&text))
}

fn int_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!!?int '(.*)'").expect("integer tag pattern is valid"))
}

/// Remove explicit integer tags so template expressions appear unquoted
///
/// The result is a template rather than valid YAML: `replicas: !!int '{{ .Values.replicas }}'`
/// becomes `replicas: {{ .Values.replicas }}`.
pub fn strip_int_tags(text: &str) -> String {
    int_tag().replace_all(text, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::filter::{int_placeholder, SetField};

    fn set(path: &[&str], value: Value) -> Box<dyn PatchFilter> {
        let path: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        Box::new(SetField::new(&path, value).unwrap())
    }

    fn deployment(name: &str) -> ResourceReference {
        ResourceReference::new("apps/v1", "Deployment", name)
    }

    #[test]
    fn test_strip_int_tags() {
        assert_eq!(
            strip_int_tags("replicas: !!int '{{ .Values.replicas }}'\n"),
            "replicas: {{ .Values.replicas }}\n"
        );
        assert_eq!(
            strip_int_tags("replicas: !int '{{ .Values.replicas }}'\n"),
            "replicas: {{ .Values.replicas }}\n"
        );
        assert_eq!(strip_int_tags("cpu: '{{ .Values.cpu }}m'\n"), "cpu: '{{ .Values.cpu }}m'\n");
    }

    #[test]
    fn test_int_placeholder_rendered_bare() {
        let patch = render_patch(&[set(
            &["spec", "replicas"],
            int_placeholder("{{ .Values.replicas }}"),
        )])
        .unwrap();

        assert!(patch.contains("replicas: {{ .Values.replicas }}"), "{patch}");
        assert!(!patch.contains("int"), "{patch}");
    }

    #[test]
    fn test_edits_for_same_target_are_combined() {
        let mut renderer = PatchRenderer::new();
        renderer
            .add(deployment("web"), None, set(&["spec", "a"], Value::from(1)))
            .unwrap();
        renderer
            .add(deployment("web"), None, set(&["spec", "b"], Value::from(2)))
            .unwrap();

        let patches = renderer.render().unwrap();
        assert_eq!(patches.len(), 1);
        let doc: Value = serde_yaml::from_str(&patches[0].patch).unwrap();
        assert_eq!(doc["spec"]["a"], Value::from(1));
        assert_eq!(doc["spec"]["b"], Value::from(2));
        assert!(patches[0].patch.find("a: 1") < patches[0].patch.find("b: 2"));
    }

    #[test]
    fn test_targets_render_in_reference_order() {
        let mut renderer = PatchRenderer::new();
        for name in ["zeta", "alpha", "mid"] {
            renderer
                .add(deployment(name), None, set(&["x"], Value::from(0)))
                .unwrap();
        }
        renderer
            .add(
                ResourceReference::new("v1", "ConfigMap", "zzz"),
                None,
                set(&["x"], Value::from(0)),
            )
            .unwrap();

        let names: Vec<String> = renderer
            .render()
            .unwrap()
            .into_iter()
            .map(|p| p.target_ref.unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["ConfigMap/zzz", "Deployment/alpha", "Deployment/mid", "Deployment/zeta"]
        );
    }

    #[test]
    fn test_patch_type_is_kept_and_conflicts_fail() {
        let mut renderer = PatchRenderer::new();
        renderer
            .add(deployment("web"), Some(PatchType::Merge), set(&["a"], Value::from(1)))
            .unwrap();
        renderer
            .add(deployment("web"), None, set(&["b"], Value::from(1)))
            .unwrap();
        let err = renderer
            .add(deployment("web"), Some(PatchType::Json), set(&["c"], Value::from(1)))
            .unwrap_err();
        assert!(matches!(err, GenerationError::PatchTypeConflict { .. }));

        let patches = renderer.render().unwrap();
        assert_eq!(patches[0].patch_type, Some(PatchType::Merge));
    }

    #[test]
    fn test_failing_edit_fails_render() {
        let mut renderer = PatchRenderer::new();
        renderer
            .add(deployment("ok"), None, set(&["a"], Value::from(1)))
            .unwrap();
        renderer
            .add(
                deployment("bad"),
                None,
                Box::new(|_: &mut Value| -> Result<()> {
                    Err(GenerationError::Selection("boom".to_string()))
                }),
            )
            .unwrap();
        assert!(renderer.render().is_err());
    }
}
