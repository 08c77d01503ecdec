use std::collections::{BTreeMap, BTreeSet};

use dlg_core::DialogueError;
use dlg_parser::{parse_xml_document, XmlDocument, XmlElementNode};
use tracing::debug;

use crate::xml_utils::{get_optional_attr, get_required_attr};

pub const DEFAULT_MANAGER: &str = "cm";
pub const FEATURE_DEFINITION_TAG: &str = "featureDefinition";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureKind {
    Plain,
    Switch { left: String },
}

/// A named code template. `$.` expands to the manager reference and
/// `$x`/`$y`/`$z` to positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    name: String,
    template: String,
    dependency: Option<String>,
    kind: FeatureKind,
}

#[derive(Debug, Clone)]
pub struct EmitContext {
    manager: String,
    dependencies: BTreeSet<String>,
}

impl EmitContext {
    pub fn new(manager: impl Into<String>) -> Self {
        Self {
            manager: manager.into(),
            dependencies: BTreeSet::new(),
        }
    }

    pub fn manager(&self) -> &str {
        &self.manager
    }

    pub fn record_dependency(&mut self, dependency: &str) {
        if self.dependencies.insert(dependency.to_string()) {
            debug!(dependency, "recorded feature dependency");
        }
    }

    pub fn dependencies(&self) -> Vec<String> {
        self.dependencies.iter().cloned().collect()
    }
}

impl Feature {
    pub fn plain(
        name: impl Into<String>,
        template: impl Into<String>,
        dependency: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            dependency,
            kind: FeatureKind::Plain,
        }
    }

    pub fn switch(
        name: impl Into<String>,
        right: impl Into<String>,
        dependency: Option<String>,
        left: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            template: right.into(),
            dependency,
            kind: FeatureKind::Switch { left: left.into() },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_switch(&self) -> bool {
        matches!(self.kind, FeatureKind::Switch { .. })
    }

    pub fn compile(
        &self,
        ctx: &mut EmitContext,
        x: Option<&str>,
        y: Option<&str>,
        z: Option<&str>,
    ) -> String {
        self.record_dependency(ctx);
        let right = substitute_args(&substitute_manager(&self.template, ctx.manager()), x, y, z);
        match &self.kind {
            FeatureKind::Plain => right,
            FeatureKind::Switch { left } => {
                format!("{} == {}", substitute_manager(left, ctx.manager()), right)
            }
        }
    }

    /// Left-hand side of a switch feature, used when a case supplies its own
    /// boolean expression.
    pub fn left_only(&self, ctx: &mut EmitContext) -> Result<String, DialogueError> {
        let FeatureKind::Switch { left } = &self.kind else {
            return Err(switch_expected(&self.name));
        };
        self.record_dependency(ctx);
        Ok(substitute_manager(left, ctx.manager()))
    }

    fn record_dependency(&self, ctx: &mut EmitContext) {
        if let Some(dependency) = &self.dependency {
            ctx.record_dependency(dependency);
        }
    }
}

fn substitute_manager(template: &str, manager: &str) -> String {
    if template.contains("$.") {
        template.replace("$.", &format!("{}.", manager))
    } else {
        template.to_string()
    }
}

// Applied in x, y, z order, so an argument may itself carry a later placeholder.
fn substitute_args(template: &str, x: Option<&str>, y: Option<&str>, z: Option<&str>) -> String {
    let mut out = template.to_string();
    // Only placeholders written in the template are replaced; argument text is left alone.
    for (placeholder, value) in [("$x", x), ("$y", y), ("$z", z)] {
        if template.contains(placeholder) {
            out = out.replace(placeholder, value.unwrap_or_default());
        }
    }
    out
}

fn switch_expected(name: &str) -> DialogueError {
    DialogueError::new(
        "SWITCH_FEATURE_EXPECTED",
        format!("Feature \"{}\" is not a switch feature.", name),
    )
}

#[derive(Debug, Clone)]
pub struct FeatureRegistry {
    manager: String,
    features: BTreeMap<String, Feature>,
}

impl Default for FeatureRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MANAGER)
    }
}

impl FeatureRegistry {
    pub fn new(manager: impl Into<String>) -> Self {
        Self {
            manager: manager.into(),
            features: BTreeMap::new(),
        }
    }

    pub fn from_config_source(source: &str) -> Result<Self, DialogueError> {
        let document = parse_xml_document(source).map_err(|error| {
            DialogueError::new(
                "CONFIG_MALFORMED",
                format!("Configuration has no usable root element ({}).", error.message),
            )
        })?;
        Self::from_config_document(&document)
    }

    pub fn from_config_document(document: &XmlDocument) -> Result<Self, DialogueError> {
        let root = &document.root;
        let manager = root.attr("manager").unwrap_or(DEFAULT_MANAGER);
        let mut registry = Self::new(manager);

        for definition in root
            .descendants()
            .into_iter()
            .filter(|element| element.name == FEATURE_DEFINITION_TAG)
        {
            registry.register_definition(definition)?;
        }

        debug!(
            features = registry.len(),
            manager = registry.manager.as_str(),
            "loaded feature configuration"
        );
        Ok(registry)
    }

    fn register_definition(&mut self, definition: &XmlElementNode) -> Result<(), DialogueError> {
        let name = get_required_attr(definition, "name")?;
        let dependency = get_optional_attr(definition, "dependsOn");
        match get_optional_attr(definition, "js") {
            Some(js) => self.register(&name, js, dependency),
            None => {
                let right = get_required_attr(definition, "right")?;
                let left = get_required_attr(definition, "left")?;
                self.register_switch(&name, right, dependency, left)
            }
        }
        .map_err(|error| DialogueError {
            span: Some(definition.location.clone()),
            ..error
        })
    }

    pub fn manager(&self) -> &str {
        &self.manager
    }

    pub fn register(
        &mut self,
        name: &str,
        template: impl Into<String>,
        dependency: Option<String>,
    ) -> Result<(), DialogueError> {
        self.insert(Feature::plain(name, template, dependency))
    }

    pub fn register_switch(
        &mut self,
        name: &str,
        right: impl Into<String>,
        dependency: Option<String>,
        left: impl Into<String>,
    ) -> Result<(), DialogueError> {
        self.insert(Feature::switch(name, right, dependency, left))
    }

    fn insert(&mut self, feature: Feature) -> Result<(), DialogueError> {
        if self.features.contains_key(feature.name()) {
            return Err(DialogueError::new(
                "FEATURE_DUPLICATE",
                format!("Feature \"{}\" is defined more than once.", feature.name()),
            ));
        }
        self.features.insert(feature.name().to_string(), feature);
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&Feature, DialogueError> {
        self.features.get(name).ok_or_else(|| {
            DialogueError::new(
                "FEATURE_UNKNOWN",
                format!("Unknown feature \"{}\".", name),
            )
        })
    }

    pub fn get_switch(&self, name: &str) -> Result<&Feature, DialogueError> {
        let feature = self.get(name)?;
        if !feature.is_switch() {
            return Err(switch_expected(name));
        }
        Ok(feature)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
