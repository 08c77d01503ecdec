use dlg_core::DialogueError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> DialogueError {
    DialogueError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: DialogueError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
    );
    1
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> DialogueError {
    map_error("CLI_SOURCE_PATH", error)
}
