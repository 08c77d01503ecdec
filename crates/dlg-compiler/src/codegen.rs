use std::collections::BTreeMap;

use dlg_core::{CompiledScene, DialogueError, StatusContext, StatusId, START_STATUS};
use tracing::debug;

use crate::expander::expand_feature_calls;
use crate::features::{EmitContext, Feature, FeatureRegistry};
use crate::node::{CaseTest, MessageStyle, NodeKind, SceneNode};
use crate::writer::IndentedWriter;

pub const GENERATOR_NAME: &str = "dlgc";
pub const END_FEATURE: &str = "special_End";
pub const OPTIONS_FEATURE: &str = "dlg_Options";

/// Emits the dispatch routine for an annotated scene graph.
///
/// Statements are grouped by the status context of the node that produced
/// them; each group becomes one guarded block of `action`, in the order the
/// groups were first written to.
pub struct CodeGenerator<'a> {
    registry: &'a FeatureRegistry,
    emit: EmitContext,
    buffers: Vec<(StatusContext, IndentedWriter)>,
    index: BTreeMap<StatusContext, usize>,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(registry: &'a FeatureRegistry) -> Self {
        Self {
            registry,
            emit: EmitContext::new(registry.manager()),
            buffers: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    pub fn group_count(&self) -> usize {
        self.buffers.len()
    }

    fn buffer_for(&mut self, context: &StatusContext) -> usize {
        if let Some(position) = self.index.get(context) {
            return *position;
        }
        let position = self.buffers.len();
        debug!(context = %context, position, "opened status group");
        self.buffers.push((context.clone(), IndentedWriter::new()));
        self.index.insert(context.clone(), position);
        position
    }

    fn writer(&mut self, position: usize) -> &mut IndentedWriter {
        &mut self.buffers[position].1
    }

    fn feature(&self, name: &str) -> Result<&'a Feature, DialogueError> {
        self.registry.get(name)
    }

    pub fn generate(
        &mut self,
        node: &SceneNode,
        parent: Option<&SceneNode>,
    ) -> Result<(), DialogueError> {
        let position = self.buffer_for(&node.context);
        match &node.kind {
            NodeKind::Switch { feature } => {
                for (arm, case) in node.children.iter().enumerate() {
                    let NodeKind::Case { test } = &case.kind else {
                        return Err(internal(format!(
                            "switch child {} is a {}, not a case",
                            arm,
                            case.kind_name()
                        )));
                    };
                    if let Some(header) = self.case_header(feature, test, arm)? {
                        self.writer(position).line(&header);
                    }
                    self.writer(position).enter();
                    self.generate(case, Some(node))?;
                    self.writer(position).leave();
                }
            }
            NodeKind::Block | NodeKind::Case { .. } | NodeKind::Option { .. } => {
                for child in &node.children {
                    self.generate(child, Some(node))?;
                }
            }
            NodeKind::Command { feature, args } => {
                let line = feature.compile(
                    &mut self.emit,
                    args.x.as_deref(),
                    args.y.as_deref(),
                    args.z.as_deref(),
                );
                self.writer(position).line(&terminated(line));
            }
            NodeKind::Message {
                status,
                style,
                text,
            } => {
                let send = self.feature(style.feature_name())?;
                self.suspend(position, *status, send, &quote(text));
                if matches!(style, MessageStyle::Ok) {
                    let end = self.call(END_FEATURE, None)?;
                    self.writer(position).line(&end);
                }
                self.writer(position).line("return;");

                let continuation = self.buffer_for(&StatusContext::singleton(*status));
                match style {
                    MessageStyle::PrevNext => {
                        let previous = previous_message_status(node, parent)?;
                        let writer = self.writer(continuation);
                        writer.line("if (mode == 0)");
                        writer.enter();
                        writer.line(&format!("status = {};", previous));
                        writer.line("action(1, 0, 0);");
                        writer.line("return;");
                        writer.leave();
                    }
                    MessageStyle::YesNo { no_text } => {
                        let refusal = self.call(
                            MessageStyle::Ok.feature_name(),
                            Some(quote(no_text).as_str()),
                        )?;
                        let end = self.call(END_FEATURE, None)?;
                        let writer = self.writer(continuation);
                        writer.line("if (mode == 0)");
                        writer.enter();
                        writer.line(&refusal);
                        writer.line(&end);
                        writer.line("return;");
                        writer.leave();
                    }
                    MessageStyle::Next | MessageStyle::Ok => {}
                }
            }
            NodeKind::Options { status, text } => {
                let send = self.feature(OPTIONS_FEATURE)?;
                self.suspend(position, *status, send, &quote(&options_prompt(text, node)));
                self.writer(position).line("return;");

                let selection = self.buffer_for(&StatusContext::singleton(*status));
                for (index, option) in node.children.iter().enumerate() {
                    let keyword = if index == 0 { "if" } else { "else if" };
                    self.writer(selection)
                        .line(&format!("{} (selection == {})", keyword, index));
                    self.writer(selection).enter();
                    self.generate(option, Some(node))?;
                    self.writer(selection).leave();
                }
            }
        }
        Ok(())
    }

    fn suspend(
        &mut self,
        position: usize,
        status: StatusId,
        send: &Feature,
        argument: &str,
    ) {
        let call = terminated(send.compile(&mut self.emit, Some(argument), None, None));
        let writer = self.writer(position);
        writer.line(&format!("status = {};", status));
        writer.line(&call);
    }

    fn call(&mut self, name: &str, argument: Option<&str>) -> Result<String, DialogueError> {
        let feature = self.feature(name)?;
        Ok(terminated(feature.compile(&mut self.emit, argument, None, None)))
    }

    fn case_header(
        &mut self,
        feature: &Feature,
        test: &CaseTest,
        arm: usize,
    ) -> Result<Option<String>, DialogueError> {
        let keyword = if arm == 0 { "if" } else { "else if" };
        let condition = match test {
            CaseTest::Default if arm == 0 => return Ok(None),
            CaseTest::Default => return Ok(Some("else".to_string())),
            CaseTest::Condition(expression) => {
                expression.replace("$x", &feature.left_only(&mut self.emit)?)
            }
            CaseTest::Values(values) => values
                .iter()
                .map(|value| {
                    feature.compile(&mut self.emit, Some(value.as_str()), None, None)
                })
                .collect::<Vec<_>>()
                .join(" || "),
        };
        Ok(Some(format!("{} ({})", keyword, condition)))
    }

    /// Assembles the complete script. The dispatch body is macro-expanded
    /// first so that dependencies of expanded calls are imported too.
    pub fn finish(mut self, header_date: &str, status_count: usize) -> CompiledScene {
        let mut body = String::new();
        for (context, writer) in &self.buffers {
            let guard = context
                .iter()
                .map(|status| format!("status == {}", status))
                .collect::<Vec<_>>()
                .join(" || ");
            body.push_str(&format!("        if ({})\n", guard));
            body.push_str("        {\n");
            body.push_str(writer.as_str());
            body.push_str("        }\n");
        }
        let body = expand_feature_calls(&body, self.registry, &mut self.emit);
        let dependencies = self.emit.dependencies();

        let mut source = format!(
            "/* This script was automatically generated by {} on {} */\n",
            GENERATOR_NAME, header_date
        );
        for dependency in &dependencies {
            source.push_str(&format!("importPackage({});\n", dependency));
        }
        source.push_str("var status = 0;\n");
        source.push_str("function start() {\n");
        source.push_str(&format!("    status = {};\n", START_STATUS));
        source.push_str("    action(1, 0, 0);\n");
        source.push_str("}\n");
        source.push_str("function action(mode, type, selection) {\n");
        source.push_str("    if (mode == -1) {\n");
        source.push_str(&format!("        {}.dispose();\n", self.emit.manager()));
        source.push_str("    } else {\n");
        source.push_str(&body);
        source.push_str("    }\n");
        source.push_str("}\n");

        CompiledScene {
            source,
            dependencies,
            status_groups: self.buffers.into_iter().map(|(context, _)| context).collect(),
            status_count,
        }
    }
}

fn internal(message: String) -> DialogueError {
    DialogueError::new("INTERNAL_CONSISTENCY", message)
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\\\""))
}

// Feature templates may already end their statement.
fn terminated(line: String) -> String {
    let trimmed = line.trim_end();
    if trimmed.is_empty() || trimmed.ends_with(';') || trimmed.ends_with('}') {
        line
    } else {
        format!("{};", trimmed)
    }
}

fn options_prompt(text: &str, options: &SceneNode) -> String {
    let mut prompt = format!("{}#b", text);
    for (index, option) in options.children.iter().enumerate() {
        if let NodeKind::Option { label } = &option.kind {
            prompt.push_str(&format!("\\r\\n#L{}#{}#l", index, label));
        }
    }
    prompt.push_str("#k");
    prompt
}

fn previous_message_status(
    node: &SceneNode,
    parent: Option<&SceneNode>,
) -> Result<StatusId, DialogueError> {
    let parent = parent.ok_or_else(|| internal("message has no parent".to_string()))?;
    let mut previous: Option<&SceneNode> = None;
    for sibling in parent.children.iter().filter(|child| child.is_suspend_point()) {
        if std::ptr::eq(sibling, node) {
            return Ok(previous
                .and_then(|message| message.context.first())
                .unwrap_or(START_STATUS));
        }
        previous = Some(sibling);
    }
    Err(internal(format!(
        "message is not a child of the enclosing <{}>",
        parent.kind_name()
    )))
}
