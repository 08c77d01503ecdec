use dlg_core::DialogueError;
use dlg_parser::XmlElementNode;

pub(crate) fn get_optional_attr(node: &XmlElementNode, name: &str) -> Option<String> {
    node.attributes.get(name).cloned()
}

pub(crate) fn get_required_attr(
    node: &XmlElementNode,
    name: &str,
) -> Result<String, DialogueError> {
    node.attributes.get(name).cloned().ok_or_else(|| {
        DialogueError::with_span(
            "XML_MISSING_ATTR",
            format!(
                "Missing required attribute \"{}\" on <{}> in the element \"{}\".",
                name, node.name, node.opening_tag
            ),
            node.location.clone(),
        )
    })
}

pub(crate) fn element_error(
    code: &str,
    message: impl Into<String>,
    node: &XmlElementNode,
) -> DialogueError {
    DialogueError::with_span(
        code,
        format!("{} in the element \"{}\"", message.into(), node.opening_tag),
        node.location.clone(),
    )
}

pub(crate) fn attach_element(error: DialogueError, node: &XmlElementNode) -> DialogueError {
    DialogueError::with_span(
        error.code,
        format!(
            "{} in the element \"{}\"",
            error.message.trim_end_matches('.'),
            node.opening_tag
        ),
        node.location.clone(),
    )
}
