pub const INDENT_UNIT: &str = "    ";
pub const BASE_DEPTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentedWriter {
    out: String,
    depth: usize,
}

impl Default for IndentedWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl IndentedWriter {
    pub fn new() -> Self {
        Self::with_depth(BASE_DEPTH)
    }

    pub fn with_depth(depth: usize) -> Self {
        Self {
            out: String::new(),
            depth,
        }
    }

    pub fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT_UNIT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn enter(&mut self) {
        self.line("{");
        self.depth += 1;
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }
}
