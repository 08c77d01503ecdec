use dlg_core::{DialogueError, StatusId};
use dlg_parser::XmlElementNode;
use tracing::debug;

use crate::features::{Feature, FeatureRegistry};
use crate::node::{CaseTest, CommandArgs, MessageStyle, NodeKind, SceneNode};
use crate::resources::ResourceTable;
use crate::xml_utils::{attach_element, element_error, get_optional_attr, get_required_attr};

const SWITCH_FEATURE_PREFIX: &str = "switch_";

/// Turns a parsed scene element into the typed node graph.
///
/// Owns the status counter for one compilation: every suspend point gets the
/// next id in construction order, starting at 0.
pub struct SceneBuilder<'a> {
    registry: &'a FeatureRegistry,
    resources: &'a ResourceTable,
    next_status: StatusId,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(registry: &'a FeatureRegistry, resources: &'a ResourceTable) -> Self {
        Self {
            registry,
            resources,
            next_status: 0,
        }
    }

    pub fn status_count(&self) -> usize {
        self.next_status as usize
    }

    pub fn build(&mut self, content: &XmlElementNode) -> Result<SceneNode, DialogueError> {
        let children = self.build_sequence(vec![content])?;
        Ok(SceneNode::new(NodeKind::Block, children))
    }

    fn allocate_status(&mut self) -> StatusId {
        let status = self.next_status;
        self.next_status += 1;
        status
    }

    // Inlines `ifdef`/`ifndef` bodies whose condition holds and drops the rest.
    fn splice_conditionals<'e>(
        &self,
        elements: Vec<&'e XmlElementNode>,
    ) -> Result<Vec<&'e XmlElementNode>, DialogueError> {
        let mut out = Vec::with_capacity(elements.len());
        for element in elements {
            let include = match element.name.as_str() {
                "ifdef" => self.registry.has(&get_required_attr(element, "name")?),
                "ifndef" => !self.registry.has(&get_required_attr(element, "name")?),
                _ => {
                    out.push(element);
                    continue;
                }
            };
            if include {
                out.extend(self.splice_conditionals(element.element_children().collect())?);
            }
        }
        Ok(out)
    }

    fn build_sequence(
        &mut self,
        elements: Vec<&XmlElementNode>,
    ) -> Result<Vec<SceneNode>, DialogueError> {
        let flat = self.splice_conditionals(elements)?;
        let mut out = Vec::with_capacity(flat.len());
        for (index, element) in flat.iter().enumerate() {
            if element.name == "assert" {
                // Everything after the assertion only runs when it holds.
                out.push(self.build_assert(element, flat[index + 1..].to_vec())?);
                break;
            }
            out.push(self.build_element(element)?);
        }
        Ok(out)
    }

    fn build_element(&mut self, element: &XmlElementNode) -> Result<SceneNode, DialogueError> {
        match element.name.as_str() {
            "switch" => self.build_switch(element),
            "message" => self.build_message(element),
            "options" => self.build_options(element),
            "assert" => self.build_assert(element, Vec::new()),
            "case" | "default" => Err(element_error(
                "CASE_OUTSIDE_SWITCH",
                format!("<{}> must be a direct child of <switch>", element.name),
                element,
            )),
            "option" => Err(element_error(
                "OPTION_OUTSIDE_OPTIONS",
                "<option> must be a direct child of <options>",
                element,
            )),
            _ => self.build_command(element),
        }
    }

    fn switch_feature(
        &self,
        element: &XmlElementNode,
        switch_type: &str,
    ) -> Result<Feature, DialogueError> {
        self.registry
            .get_switch(&format!("{}{}", SWITCH_FEATURE_PREFIX, switch_type))
            .cloned()
            .map_err(|error| attach_element(error, element))
    }

    fn build_switch(&mut self, element: &XmlElementNode) -> Result<SceneNode, DialogueError> {
        let switch_type = get_required_attr(element, "type")?;
        let feature = self.switch_feature(element, &switch_type)?;

        let arms = self.splice_conditionals(element.element_children().collect())?;
        let mut cases = Vec::with_capacity(arms.len());
        for (index, arm) in arms.iter().enumerate() {
            let test = match arm.name.as_str() {
                "case" => case_test(arm)?,
                "default" if index + 1 == arms.len() => CaseTest::Default,
                "default" => {
                    return Err(element_error(
                        "SWITCH_DEFAULT_NOT_LAST",
                        "<default> must be the last child of <switch>",
                        arm,
                    ))
                }
                other => {
                    return Err(element_error(
                        "SWITCH_CHILD_INVALID",
                        format!("Unsupported child <{}> under <switch>", other),
                        arm,
                    ))
                }
            };
            let children = self.build_sequence(arm.element_children().collect())?;
            cases.push(SceneNode::new(NodeKind::Case { test }, children));
        }

        Ok(SceneNode::new(NodeKind::Switch { feature }, cases))
    }

    fn build_message(&mut self, element: &XmlElementNode) -> Result<SceneNode, DialogueError> {
        let text = self.message_text(element)?;
        let style_attr = get_optional_attr(element, "style").unwrap_or_default();
        let style = match style_attr.as_str() {
            "n" => MessageStyle::Next,
            "pn" => MessageStyle::PrevNext,
            "yn" => MessageStyle::YesNo {
                no_text: self
                    .resources
                    .resolve_or_literal(&get_optional_attr(element, "no").unwrap_or_default()),
            },
            "ok" => MessageStyle::Ok,
            other => {
                return Err(element_error(
                    "MESSAGE_STYLE_UNKNOWN",
                    format!("Unknown message style \"{}\"", other),
                    element,
                ))
            }
        };

        let status = self.allocate_status();
        debug!(status, style = style.feature_name(), "allocated message status");
        Ok(SceneNode::leaf(NodeKind::Message {
            status,
            style,
            text,
        }))
    }

    fn build_options(&mut self, element: &XmlElementNode) -> Result<SceneNode, DialogueError> {
        let text = self.message_text(element)?;
        let status = self.allocate_status();
        debug!(status, "allocated options status");

        let entries = self.splice_conditionals(element.element_children().collect())?;
        if entries.is_empty() {
            return Err(element_error(
                "OPTIONS_EMPTY",
                "<options> requires at least one <option>",
                element,
            ));
        }

        let mut options = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.name != "option" {
                return Err(element_error(
                    "OPTIONS_CHILD_INVALID",
                    format!("Unsupported child <{}> under <options>", entry.name),
                    entry,
                ));
            }
            let label = self.message_text(entry)?;
            let children = self.build_sequence(entry.element_children().collect())?;
            options.push(SceneNode::new(NodeKind::Option { label }, children));
        }

        Ok(SceneNode::new(NodeKind::Options { status, text }, options))
    }

    fn build_assert(
        &mut self,
        element: &XmlElementNode,
        rest: Vec<&XmlElementNode>,
    ) -> Result<SceneNode, DialogueError> {
        let switch_type = get_required_attr(element, "type")?;
        let condition = get_required_attr(element, "cond")?;
        let on_fail = self
            .resources
            .resolve_or_literal(&get_required_attr(element, "onFail")?);
        let feature = self.switch_feature(element, &switch_type)?;

        let status = self.allocate_status();
        debug!(status, "allocated assertion failure status");
        let failure = SceneNode::leaf(NodeKind::Message {
            status,
            style: MessageStyle::Ok,
            text: on_fail,
        });

        let holds = SceneNode::new(
            NodeKind::Case {
                test: CaseTest::Condition(condition),
            },
            self.build_sequence(rest)?,
        );
        let fails = SceneNode::new(
            NodeKind::Case {
                test: CaseTest::Default,
            },
            vec![failure],
        );
        Ok(SceneNode::new(NodeKind::Switch { feature }, vec![holds, fails]))
    }

    fn build_command(&self, element: &XmlElementNode) -> Result<SceneNode, DialogueError> {
        if !self.registry.has(&element.name) {
            return Err(element_error(
                "TAG_UNKNOWN",
                format!("Unknown tag type \"{}\"", element.name),
                element,
            ));
        }
        let feature = self
            .registry
            .get(&element.name)
            .cloned()
            .map_err(|error| attach_element(error, element))?;
        Ok(SceneNode::leaf(NodeKind::Command {
            feature,
            args: CommandArgs {
                x: get_optional_attr(element, "x"),
                y: get_optional_attr(element, "y"),
                z: get_optional_attr(element, "z"),
            },
        }))
    }

    fn message_text(&self, element: &XmlElementNode) -> Result<String, DialogueError> {
        if let Some(text) = get_optional_attr(element, "text") {
            return Ok(text);
        }
        let Some(name) = get_optional_attr(element, "rsrc") else {
            return Err(element_error(
                "XML_MISSING_ATTR",
                format!("<{}> requires a \"text\" or \"rsrc\" attribute", element.name),
                element,
            ));
        };
        match self.resources.resolve(&name) {
            Some(text) => Ok(text.to_string()),
            None => Err(element_error(
                "RESOURCE_UNKNOWN",
                format!("Unknown resource \"{}\"", name),
                element,
            )),
        }
    }
}

fn case_test(arm: &XmlElementNode) -> Result<CaseTest, DialogueError> {
    if let Some(condition) = get_optional_attr(arm, "cond") {
        return Ok(CaseTest::Condition(condition));
    }
    let values = get_required_attr(arm, "val")?
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    if values.is_empty() {
        return Err(element_error(
            "CASE_VALUE_EMPTY",
            "<case> requires at least one value in \"val\"",
            arm,
        ));
    }
    Ok(CaseTest::Values(values))
}

#[cfg(test)]
mod builder_tests {
    use super::*;
    use crate::compiler_test_support::*;

    fn build(scene: &str) -> Result<(SceneNode, usize), DialogueError> {
        build_with(&standard_registry(), &ResourceTable::default(), scene)
    }

    fn build_with(
        registry: &FeatureRegistry,
        resources: &ResourceTable,
        scene: &str,
    ) -> Result<(SceneNode, usize), DialogueError> {
        let document = dlg_parser::parse_xml_document(scene).expect("scene xml");
        let mut builder = SceneBuilder::new(registry, resources);
        let root = builder.build(&document.root)?;
        Ok((root, builder.status_count()))
    }

    fn kinds(nodes: &[SceneNode]) -> Vec<&'static str> {
        nodes.iter().map(SceneNode::kind_name).collect()
    }

    #[test]
    fn builds_messages_with_sequential_statuses() {
        let (root, count) = build(
            r#"<options text="Pick">
                 <option text="A"><message style="n" text="a1"/><message style="ok" text="a2"/></option>
                 <option text="B"><message style="yn" text="b1" no="nope"/></option>
               </options>"#,
        )
        .expect("scene builds");

        assert_eq!(count, 4);
        assert_eq!(root.statuses(), vec![0, 1, 2, 3]);
        let options = &root.children[0];
        assert_eq!(options.status(), Some(0));
        assert_eq!(kinds(&options.children), vec!["option", "option"]);
        assert!(matches!(
            &options.children[1].children[0].kind,
            NodeKind::Message { status: 3, style: MessageStyle::YesNo { no_text }, .. } if no_text == "nope"
        ));
    }

    #[test]
    fn switch_cases_parse_values_conditions_and_default() {
        let (root, _) = build(
            r#"<switch type="job">
                 <case val="100, 200,"><give x="1"/></case>
                 <case cond="$x &gt; 500"/>
                 <default><message style="ok" text="no"/></default>
               </switch>"#,
        )
        .expect("scene builds");

        let switch = &root.children[0];
        assert!(matches!(&switch.kind, NodeKind::Switch { feature } if feature.name() == "switch_job"));
        let tests = switch
            .children
            .iter()
            .map(|case| match &case.kind {
                NodeKind::Case { test } => test.clone(),
                _ => unreachable!("switch children are cases"),
            })
            .collect::<Vec<_>>();
        assert_eq!(
            tests,
            vec![
                CaseTest::Values(vec!["100".to_string(), "200".to_string()]),
                CaseTest::Condition("$x > 500".to_string()),
                CaseTest::Default,
            ]
        );
    }

    #[test]
    fn ifdef_and_ifndef_splice_into_the_parent() {
        let (root, count) = build(
            r#"<options text="q">
                 <option text="only">
                   <ifndef name="not_registered">
                     <message style="n" text="shown"/>
                     <ifdef name="give"><give x="7"/></ifdef>
                   </ifndef>
                   <ifdef name="not_registered"><message style="ok" text="hidden"/></ifdef>
                   <message style="ok" text="after"/>
                 </option>
               </options>"#,
        )
        .expect("scene builds");

        let option = &root.children[0].children[0];
        assert_eq!(kinds(&option.children), vec!["message", "command", "message"]);
        // options=0, shown=1, after=2: the dropped branch consumed nothing.
        assert_eq!(count, 3);
    }

    #[test]
    fn assert_wraps_remaining_siblings_in_the_holding_case() {
        let mut resources = ResourceTable::default();
        resources.insert("need_item", "You need the item.");
        let (root, count) = build_with(
            &standard_registry(),
            &resources,
            r#"<options text="Go?">
                 <option text="yes">
                   <give x="1"/>
                   <ifdef name="give">
                     <assert type="job" cond="$x == 100" onFail="need_item"/>
                     <give x="2"/>
                   </ifdef>
                   <message style="ok" text="done"/>
                 </option>
               </options>"#,
        )
        .expect("scene builds");

        let option = &root.children[0].children[0];
        assert_eq!(kinds(&option.children), vec!["command", "switch"]);
        let assertion = &option.children[1];
        let holds = &assertion.children[0];
        let fails = &assertion.children[1];
        assert_eq!(kinds(&holds.children), vec!["command", "message"]);
        assert!(matches!(
            &fails.children[0].kind,
            NodeKind::Message { status: 1, style: MessageStyle::Ok, text } if text == "You need the item."
        ));
        // The failure message is allocated before the guarded "done" message.
        assert_eq!(holds.children[1].status(), Some(2));
        assert_eq!(count, 3);
    }

    #[test]
    fn message_text_resolves_resources() {
        let mut resources = ResourceTable::default();
        resources.insert("hello", "Hello there");
        let (root, _) = build_with(
            &standard_registry(),
            &resources,
            r#"<message style="ok" rsrc="hello"/>"#,
        )
        .expect("scene builds");
        assert!(matches!(
            &root.children[0].kind,
            NodeKind::Message { text, .. } if text == "Hello there"
        ));

        let error = build(r#"<message style="ok" rsrc="missing"/>"#).expect_err("unknown rsrc");
        assert_eq!(error.code, "RESOURCE_UNKNOWN");
        let error = build(r#"<message style="ok"/>"#).expect_err("no text");
        assert_eq!(error.code, "XML_MISSING_ATTR");
    }

    #[test]
    fn rejects_unknown_tags_and_styles_with_snippets() {
        let error = build(r#"<teleport map="1"><x/></teleport>"#).expect_err("unknown tag");
        assert_eq!(error.code, "TAG_UNKNOWN");
        assert!(error.message.contains("\"teleport\""));
        assert!(error.message.contains(r#"<teleport map="1">"#));

        let error = build(r#"<message style="zz" text="a"/>"#).expect_err("unknown style");
        assert_eq!(error.code, "MESSAGE_STYLE_UNKNOWN");
        assert!(error.message.contains("\"zz\""));

        let error = build(r#"<switch type="nope"/>"#).expect_err("unknown switch");
        assert_eq!(error.code, "FEATURE_UNKNOWN");
        assert!(error.message.contains("switch_nope"));

        let error = build(r#"<switch type="plain"><default/></switch>"#).expect_err("plain feature");
        assert_eq!(error.code, "SWITCH_FEATURE_EXPECTED");
    }

    #[test]
    fn validates_structure_of_switches_and_options() {
        let cases = [
            (
                r#"<switch type="job"><default/><case val="1"/></switch>"#,
                "SWITCH_DEFAULT_NOT_LAST",
            ),
            (
                r#"<switch type="job"><give x="1"/></switch>"#,
                "SWITCH_CHILD_INVALID",
            ),
            (r#"<switch type="job"><case val=" , "/></switch>"#, "CASE_VALUE_EMPTY"),
            (r#"<options text="x"/>"#, "OPTIONS_EMPTY"),
            (
                r#"<options text="x"><message style="ok" text="a"/></options>"#,
                "OPTIONS_CHILD_INVALID",
            ),
            (r#"<case val="1"/>"#, "CASE_OUTSIDE_SWITCH"),
            (r#"<option text="a"/>"#, "OPTION_OUTSIDE_OPTIONS"),
            (r#"<ifdef><give/></ifdef>"#, "XML_MISSING_ATTR"),
        ];
        for (scene, code) in cases {
            let error = build(scene).expect_err(scene);
            assert_eq!(error.code, code, "{}", scene);
        }
    }

    #[test]
    fn commands_carry_their_arguments() {
        let (root, count) = build(r#"<give x="4000000" y="-1"/>"#).expect("scene builds");
        assert_eq!(count, 0);
        assert!(matches!(
            &root.children[0].kind,
            NodeKind::Command { feature, args }
                if feature.name() == "give"
                    && args.x.as_deref() == Some("4000000")
                    && args.y.as_deref() == Some("-1")
                    && args.z.is_none()
        ));
    }
}
