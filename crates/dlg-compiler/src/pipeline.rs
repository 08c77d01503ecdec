use dlg_core::{CompiledScene, DialogueError};
use dlg_parser::{parse_xml_document, XmlDocument, XmlElementNode};
use tracing::debug;

use crate::builder::SceneBuilder;
use crate::codegen::CodeGenerator;
use crate::context::assign_status_contexts;
use crate::features::FeatureRegistry;
use crate::resources::{ResourceTable, RESOURCES_TAG};
use crate::xml_utils::element_error;

pub const HEADER_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub header_date: Option<String>,
}

impl CompileOptions {
    pub fn with_header_date(date: impl Into<String>) -> Self {
        Self {
            header_date: Some(date.into()),
        }
    }

    fn resolved_header_date(&self) -> String {
        self.header_date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format(HEADER_DATE_FORMAT).to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DialogueCompiler {
    registry: FeatureRegistry,
}

impl DialogueCompiler {
    pub fn new(registry: FeatureRegistry) -> Self {
        Self { registry }
    }

    pub fn from_config_source(source: &str) -> Result<Self, DialogueError> {
        Ok(Self::new(FeatureRegistry::from_config_source(source)?))
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    pub fn compile_source(
        &self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<CompiledScene, DialogueError> {
        let document = parse_xml_document(source)?;
        self.compile_document(&document, options)
    }

    // Wrapper root: optional leading <resources>, then exactly one content element.
    pub fn compile_document(
        &self,
        document: &XmlDocument,
        options: &CompileOptions,
    ) -> Result<CompiledScene, DialogueError> {
        let root = &document.root;
        let mut children = root.element_children().peekable();

        let resources = match children.peek() {
            Some(first) if first.name == RESOURCES_TAG => {
                let table = ResourceTable::from_element(first)?;
                children.next();
                table
            }
            _ => ResourceTable::default(),
        };

        let contents = children.collect::<Vec<_>>();
        let [content] = contents.as_slice() else {
            return Err(element_error(
                "SCENE_CONTENT_INVALID",
                format!(
                    "Scene root must hold exactly one content element after <{}>, found {}",
                    RESOURCES_TAG,
                    contents.len()
                ),
                root,
            ));
        };

        self.compile_content(content, &resources, options)
    }

    pub fn compile_content(
        &self,
        content: &XmlElementNode,
        resources: &ResourceTable,
        options: &CompileOptions,
    ) -> Result<CompiledScene, DialogueError> {
        let mut builder = SceneBuilder::new(&self.registry, resources);
        let mut scene = builder.build(content)?;
        let status_count = builder.status_count();
        assign_status_contexts(&mut scene);

        let mut generator = CodeGenerator::new(&self.registry);
        generator.generate(&scene, None)?;
        debug!(
            statuses = status_count,
            groups = generator.group_count(),
            resources = resources.len(),
            "generated dispatch routine"
        );
        Ok(generator.finish(&options.resolved_header_date(), status_count))
    }
}
